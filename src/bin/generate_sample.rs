use anyhow::{Context, Result};
use chrono::{Duration, NaiveDate};

/// Minimal deterministic PRNG (xoshiro256**)
struct SimpleRng {
    state: [u64; 4],
}

impl SimpleRng {
    fn new(seed: u64) -> Self {
        let mut s = [0u64; 4];
        let mut x = seed;
        for slot in &mut s {
            x = x.wrapping_mul(6364136223846793005).wrapping_add(1);
            *slot = x;
        }
        SimpleRng { state: s }
    }

    fn next_u64(&mut self) -> u64 {
        let result = (self.state[1].wrapping_mul(5))
            .rotate_left(7)
            .wrapping_mul(9);
        let t = self.state[1] << 17;
        self.state[2] ^= self.state[0];
        self.state[3] ^= self.state[1];
        self.state[1] ^= self.state[2];
        self.state[0] ^= self.state[3];
        self.state[2] ^= t;
        self.state[3] = self.state[3].rotate_left(45);
        result
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }

    fn below(&mut self, n: usize) -> usize {
        (self.next_f64() * n as f64) as usize % n
    }

    fn pick<'a>(&mut self, items: &[&'a str]) -> &'a str {
        items[self.below(items.len())]
    }
}

const REGIONS: [&str; 4] = ["Central", "East", "South", "West"];
const SEGMENTS: [&str; 3] = ["Consumer", "Corporate", "Home Office"];
const SHIP_MODES: [&str; 4] = ["First Class", "Same Day", "Second Class", "Standard Class"];
const CITIES: [&str; 6] = ["Henderson", "Los Angeles", "Fort Lauderdale", "Seattle", "Houston", "Chicago"];

/// (category, sub-category, products)
const CATALOGUE: [(&str, &str, &[&str]); 6] = [
    ("Furniture", "Bookcases", &["Bush Somerset Collection Bookcase", "Sauder Camden County Barrister Bookcase, Planked Cherry Finish"]),
    ("Furniture", "Chairs", &["Hon Deluxe Fabric Upholstered Stacking Chairs, Rounded Back", "Global Deluxe Stacking Chair, Gray"]),
    ("Office Supplies", "Labels", &["Self-Adhesive Address Labels for Typewriters by Universal", "Avery 508"]),
    ("Office Supplies", "Paper", &["Xerox 1967", "Easy-staple paper"]),
    ("Technology", "Phones", &["Mitel 5320 IP Phone VoIP phone", "Apple iPhone 5", "Konftel 250 Conference phone - Charcoal black"]),
    ("Technology", "Copiers", &["Canon imageCLASS 2200 Advanced Copier", "Hewlett Packard LaserJet 3310 Copier"]),
];

fn main() -> Result<()> {
    let mut rng = SimpleRng::new(42);
    let output_path = "store.csv";
    let mut writer = csv::Writer::from_path(output_path)
        .with_context(|| format!("creating {output_path}"))?;

    writer.write_record([
        "Row ID", "Order ID", "Order Date", "Ship Mode", "Customer Name", "Segment", "City",
        "Region", "Category", "Sub-Category", "Product Name", "Sales", "Quantity", "Profit",
        "returns",
    ])?;

    let first_day = NaiveDate::from_ymd_opt(2014, 1, 1).context("valid start date")?;
    let n_orders = 1200;
    let mut row_id = 0;

    for order in 0..n_orders {
        let order_id = format!("CA-{}-{:06}", 2014 + order % 4, 100000 + order * 37);
        let date = first_day + Duration::days(rng.below(4 * 365) as i64);
        // A handful of malformed dates exercise the loader's null handling.
        let order_date = if order % 97 == 0 {
            "unknown".to_string()
        } else {
            date.format("%d/%m/%Y").to_string()
        };
        let region = rng.pick(&REGIONS);
        let segment = rng.pick(&SEGMENTS);
        let ship_mode = rng.pick(&SHIP_MODES);
        let city = rng.pick(&CITIES);
        let returned = rng.next_f64() < 0.08;

        let lines = 1 + rng.below(4);
        for _ in 0..lines {
            let (category, sub_category, products) = CATALOGUE[rng.below(CATALOGUE.len())];
            let product = rng.pick(products);
            let quantity = 1 + rng.below(9);
            let unit_price = 5.0 + rng.next_f64() * 400.0;
            let sales = unit_price * quantity as f64;
            let margin = rng.next_f64() * 0.6 - 0.2;

            row_id += 1;
            writer.write_record([
                row_id.to_string(),
                order_id.clone(),
                order_date.clone(),
                ship_mode.to_string(),
                format!("Customer {}", order % 300),
                segment.to_string(),
                city.to_string(),
                region.to_string(),
                category.to_string(),
                sub_category.to_string(),
                product.to_string(),
                format!("{sales:.4}"),
                quantity.to_string(),
                format!("{:.4}", sales * margin),
                if returned { "Yes" } else { "No" }.to_string(),
            ])?;
        }
    }

    writer.flush().context("flushing CSV")?;
    println!("Wrote {row_id} order lines ({n_orders} orders) to {output_path}");
    Ok(())
}
