use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use arrow::array::{Float64Array, Int32Array, StringArray};
use arrow::datatypes::{DataType, Field, Schema};
use arrow::record_batch::RecordBatch;
use arrow::util::pretty::pretty_format_batches;
use parquet::arrow::ArrowWriter;
use serde::Serialize;
use serde_json::json;

const FIRST_YEAR: i32 = 1960;
const LAST_YEAR: i32 = 2019;

/// (name, code, emissions in 1960 in kt, yearly growth, grid cell)
const COUNTRIES: [(&str, &str, f64, f64, (i32, i32)); 8] = [
    ("Aruba", "ABW", 11_000.0, 0.004, (0, 0)),
    ("Belgium", "BEL", 90_000.0, 0.006, (1, 0)),
    ("Denmark", "DNK", 30_000.0, 0.008, (2, 0)),
    ("Chile", "CHL", 10_000.0, 0.035, (3, 0)),
    ("Kenya", "KEN", 2_000.0, 0.045, (0, 1)),
    ("Norway", "NOR", 12_000.0, 0.015, (1, 1)),
    ("Vietnam", "VNM", 4_000.0, 0.060, (2, 1)),
    ("Peru", "PER", 6_000.0, 0.030, (3, 1)),
];

#[derive(Serialize)]
struct Row<'a> {
    country_name: &'a str,
    country_code: &'a str,
    year: i32,
    value: f64,
}

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
}

fn generate_rows(rng: &mut SimpleRng) -> Vec<Row<'static>> {
    let mut rows = Vec::new();
    for &(name, code, base, growth, _) in &COUNTRIES {
        let mut value = base;
        for year in FIRST_YEAR..=LAST_YEAR {
            rows.push(Row {
                country_name: name,
                country_code: code,
                year,
                value: (value * 1000.0).round() / 1000.0,
            });
            // ±5% year-on-year jitter around the trend.
            value *= 1.0 + growth + (rng.next_f64() - 0.5) * 0.1;
        }
    }
    rows
}

fn write_csv(rows: &[Row], path: &Path) -> Result<()> {
    let mut writer = csv::Writer::from_path(path).context("creating CSV")?;
    for row in rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

fn to_batch(rows: &[Row]) -> Result<RecordBatch> {
    let schema = Arc::new(Schema::new(vec![
        Field::new("country_name", DataType::Utf8, false),
        Field::new("country_code", DataType::Utf8, false),
        Field::new("year", DataType::Int32, false),
        Field::new("value", DataType::Float64, true),
    ]));
    let batch = RecordBatch::try_new(
        schema,
        vec![
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.country_name))),
            Arc::new(StringArray::from_iter_values(rows.iter().map(|r| r.country_code))),
            Arc::new(Int32Array::from_iter_values(rows.iter().map(|r| r.year))),
            Arc::new(Float64Array::from_iter_values(rows.iter().map(|r| r.value))),
        ],
    )?;
    Ok(batch)
}

fn write_parquet(batch: &RecordBatch, path: &Path) -> Result<()> {
    let file = std::fs::File::create(path).context("creating parquet file")?;
    let mut writer = ArrowWriter::try_new(file, batch.schema(), None)?;
    writer.write(batch)?;
    writer.close()?;
    Ok(())
}

/// One 40°×40° square per country, laid out on a grid around the equator.
fn write_geojson(path: &Path) -> Result<()> {
    let features: Vec<_> = COUNTRIES
        .iter()
        .map(|&(name, code, _, _, (col, row))| {
            let x0 = -160.0 + col as f64 * 80.0;
            let y0 = 40.0 - row as f64 * 80.0;
            let ring = [[x0, y0], [x0 + 40.0, y0], [x0 + 40.0, y0 - 40.0], [x0, y0 - 40.0], [x0, y0]];
            json!({
                "type": "Feature",
                "id": code,
                "properties": { "name": name },
                "geometry": { "type": "Polygon", "coordinates": [ring] }
            })
        })
        .collect();
    let collection = json!({ "type": "FeatureCollection", "features": features });
    std::fs::write(path, serde_json::to_string_pretty(&collection)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data"));
    std::fs::create_dir_all(&out_dir)
        .with_context(|| format!("creating {}", out_dir.display()))?;

    let mut rng = SimpleRng::new(42);
    let rows = generate_rows(&mut rng);

    let csv_path = out_dir.join("sample_emissions.csv");
    write_csv(&rows, &csv_path)?;

    let batch = to_batch(&rows)?;
    let parquet_path = out_dir.join("sample_emissions.parquet");
    write_parquet(&batch, &parquet_path)?;

    let geo_path = out_dir.join("sample_countries.geojson");
    write_geojson(&geo_path)?;

    println!("{}", pretty_format_batches(&[batch.slice(0, 5)])?);
    println!(
        "Wrote {} records ({} countries, {FIRST_YEAR}–{LAST_YEAR}) to {} and {}, outlines to {}",
        rows.len(),
        COUNTRIES.len(),
        csv_path.display(),
        parquet_path.display(),
        geo_path.display()
    );
    println!(
        "Run: cargo run -- {} {}",
        csv_path.display(),
        geo_path.display()
    );
    Ok(())
}
