use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use arrow::array::{
    Array, AsArray, Float32Array, Float64Array, Int32Array, Int64Array, StringArray,
};
use arrow::datatypes::DataType;
use arrow::record_batch::RecordBatch;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use serde::Deserialize;
use serde_json::Value as JsonValue;

use super::model::{EmissionRecord, EmissionTable};

/// Columns every input format must provide.
pub const REQUIRED_COLUMNS: [&str; 4] = ["country_name", "country_code", "year", "value"];

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// Load an emission table from a file.  Dispatch by extension.
///
/// Supported formats:
/// * `.csv`     – header row with `country_name,country_code,year,value` (any order)
/// * `.parquet` – the same four columns
/// * `.json`    – `[{ "country_name": ..., "country_code": ..., "year": ..., "value": ... }, ...]`
pub fn load_file(path: &Path) -> Result<EmissionTable> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let table = match ext.as_str() {
        "csv" => {
            let file = std::fs::File::open(path)
                .with_context(|| format!("opening CSV {}", path.display()))?;
            load_csv(file)
        }
        "parquet" | "pq" => load_parquet(path),
        "json" => {
            let text = std::fs::read_to_string(path)
                .with_context(|| format!("reading JSON {}", path.display()))?;
            load_json(&text)
        }
        other => bail!("Unsupported file extension: .{other}"),
    }?;

    log::info!(
        "Loaded {} records for {} countries from {}",
        table.len(),
        table.country_names().len(),
        path.display()
    );
    Ok(table)
}

/// One input row before validation; `value` may be blank in exported data.
#[derive(Debug, Deserialize)]
struct RawRow {
    country_name: String,
    country_code: String,
    year: i32,
    value: Option<f64>,
}

/// Collects rows, dropping those without a value and logging how many.
#[derive(Default)]
struct RecordSink {
    records: Vec<EmissionRecord>,
    skipped: usize,
}

impl RecordSink {
    fn push(&mut self, row: RawRow) {
        match row.value {
            Some(value) => self.records.push(EmissionRecord {
                country_name: row.country_name,
                country_code: row.country_code,
                year: row.year,
                value,
            }),
            None => self.skipped += 1,
        }
    }

    fn finish(self) -> EmissionTable {
        if self.skipped > 0 {
            log::warn!("Skipped {} rows without an emission value", self.skipped);
        }
        EmissionTable::from_records(self.records)
    }
}

// ---------------------------------------------------------------------------
// CSV loader
// ---------------------------------------------------------------------------

/// CSV layout: header row naming at least the four required columns.
/// Extra columns are ignored.
pub fn load_csv<R: Read>(input: R) -> Result<EmissionTable> {
    let mut reader = csv::Reader::from_reader(input);
    let headers = reader.headers().context("reading CSV headers")?.clone();
    for col in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == col) {
            bail!("CSV missing '{col}' column");
        }
    }

    let mut sink = RecordSink::default();
    for (row_no, result) in reader.deserialize::<RawRow>().enumerate() {
        // Line numbers are 1-based and the header is line 1.
        let row = result.with_context(|| format!("CSV line {}", row_no + 2))?;
        sink.push(row);
    }
    Ok(sink.finish())
}

// ---------------------------------------------------------------------------
// JSON loader
// ---------------------------------------------------------------------------

/// Records-oriented JSON, the default `df.to_json(orient='records')`.
pub fn load_json(text: &str) -> Result<EmissionTable> {
    let root: JsonValue = serde_json::from_str(text).context("parsing JSON")?;
    let rows = root
        .as_array()
        .context("Expected top-level JSON array")?;

    let mut sink = RecordSink::default();
    for (i, row) in rows.iter().enumerate() {
        let row: RawRow = serde_json::from_value(row.clone())
            .with_context(|| format!("JSON row {i}"))?;
        sink.push(row);
    }
    Ok(sink.finish())
}

// ---------------------------------------------------------------------------
// Parquet loader
// ---------------------------------------------------------------------------

/// Load a Parquet file with the four required columns.
///
/// Works with files written by both **Pandas** (`df.to_parquet()`) and
/// **Polars** (`df.write_parquet()`); integer and float widths are widened.
fn load_parquet(path: &Path) -> Result<EmissionTable> {
    let file = std::fs::File::open(path).context("opening parquet file")?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context("reading parquet metadata")?;
    let reader = builder.build().context("building parquet reader")?;

    let mut sink = RecordSink::default();
    let mut offset = 0;

    for batch_result in reader {
        let batch = batch_result.context("reading parquet record batch")?;

        let names = column(&batch, "country_name")?;
        let codes = column(&batch, "country_code")?;
        let years = column(&batch, "year")?;
        let values = column(&batch, "value")?;

        for row in 0..batch.num_rows() {
            let ctx = || format!("Parquet row {}", offset + row);
            let raw = RawRow {
                country_name: extract_string(names, row).with_context(ctx)?,
                country_code: extract_string(codes, row).with_context(ctx)?,
                year: extract_year(years, row).with_context(ctx)?,
                value: extract_value(values, row).with_context(ctx)?,
            };
            sink.push(raw);
        }
        offset += batch.num_rows();
    }

    Ok(sink.finish())
}

// -- Arrow helpers --

fn column<'a>(batch: &'a RecordBatch, name: &str) -> Result<&'a Arc<dyn Array>> {
    let idx = batch
        .schema()
        .index_of(name)
        .map_err(|_| anyhow::anyhow!("Parquet file missing '{name}' column"))?;
    Ok(batch.column(idx))
}

fn extract_string(col: &Arc<dyn Array>, row: usize) -> Result<String> {
    if col.is_null(row) {
        bail!("null value in string column");
    }
    match col.data_type() {
        DataType::Utf8 => {
            let arr = col
                .as_any()
                .downcast_ref::<StringArray>()
                .context("expected StringArray")?;
            Ok(arr.value(row).to_string())
        }
        DataType::LargeUtf8 => Ok(col.as_string::<i64>().value(row).to_string()),
        other => bail!("Expected Utf8 column, got {other:?}"),
    }
}

fn extract_year(col: &Arc<dyn Array>, row: usize) -> Result<i32> {
    if col.is_null(row) {
        bail!("null year");
    }
    match col.data_type() {
        DataType::Int32 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int32Array>()
                .context("expected Int32Array")?;
            Ok(arr.value(row))
        }
        DataType::Int64 => {
            let arr = col
                .as_any()
                .downcast_ref::<Int64Array>()
                .context("expected Int64Array")?;
            i32::try_from(arr.value(row)).context("year out of range")
        }
        other => bail!("Expected integer year column, got {other:?}"),
    }
}

fn extract_value(col: &Arc<dyn Array>, row: usize) -> Result<Option<f64>> {
    if col.is_null(row) {
        return Ok(None);
    }
    let value = match col.data_type() {
        DataType::Float64 => col
            .as_any()
            .downcast_ref::<Float64Array>()
            .context("expected Float64Array")?
            .value(row),
        DataType::Float32 => col
            .as_any()
            .downcast_ref::<Float32Array>()
            .context("expected Float32Array")?
            .value(row) as f64,
        DataType::Int64 => col
            .as_any()
            .downcast_ref::<Int64Array>()
            .context("expected Int64Array")?
            .value(row) as f64,
        DataType::Int32 => col
            .as_any()
            .downcast_ref::<Int32Array>()
            .context("expected Int32Array")?
            .value(row) as f64,
        other => bail!("Expected numeric value column, got {other:?}"),
    };
    Ok(Some(value))
}

#[cfg(test)]
mod tests {
    use arrow::datatypes::{Field, Schema};
    use parquet::arrow::ArrowWriter;

    use super::*;

    /// Writes `batch` to a per-test Parquet file in the temp directory.
    fn write_parquet(name: &str, batch: &RecordBatch) -> std::path::PathBuf {
        let path = std::env::temp_dir()
            .join(format!("co2_loader_{}_{name}.parquet", std::process::id()));
        let file = std::fs::File::create(&path).unwrap();
        let mut writer = ArrowWriter::try_new(file, batch.schema(), None).unwrap();
        writer.write(batch).unwrap();
        writer.close().unwrap();
        path
    }

    fn load_parquet_batch(name: &str, batch: &RecordBatch) -> Result<EmissionTable> {
        let path = write_parquet(name, batch);
        let result = load_file(&path);
        std::fs::remove_file(&path).ok();
        result
    }

    #[test]
    fn csv_with_columns_in_any_order() {
        let data = "\
year,value,country_code,country_name,extra
1960,11092.675,ABW,Aruba,x
1961,11576.719,ABW,Aruba,y
1960,25.0,AFE,\"Africa Eastern and Southern\",z
";
        let table = load_csv(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 3);
        assert_eq!(table.records()[0].country_name, "Aruba");
        assert_eq!(table.records()[1].year, 1961);
        assert_eq!(table.records()[1].value, 11576.719);
        assert_eq!(table.country_code("Africa Eastern and Southern"), Some("AFE"));
    }

    #[test]
    fn csv_missing_column_is_an_error() {
        let data = "country_name,country_code,year\nAruba,ABW,1960\n";
        let err = load_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("'value'"));
    }

    #[test]
    fn csv_bad_year_reports_file_line() {
        let data = "country_name,country_code,year,value\nAruba,ABW,1960,1.0\nAruba,ABW,nineteen,2.0\n";
        let err = load_csv(data.as_bytes()).unwrap_err();
        assert!(format!("{err:#}").contains("CSV line 3"));
    }

    #[test]
    fn csv_blank_values_are_skipped() {
        let data = "country_name,country_code,year,value\nAruba,ABW,1960,\nAruba,ABW,1961,3.5\n";
        let table = load_csv(data.as_bytes()).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].year, 1961);
    }

    #[test]
    fn json_records() {
        let text = r#"[
            {"country_name": "Belgium", "country_code": "BEL", "year": 2010, "value": 106.5},
            {"country_name": "Denmark", "country_code": "DNK", "year": 2010, "value": null}
        ]"#;
        let table = load_json(text).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.records()[0].country_code, "BEL");
    }

    #[test]
    fn json_must_be_an_array() {
        let err = load_json(r#"{"country_name": "Belgium"}"#).unwrap_err();
        assert!(err.to_string().contains("array"));
    }

    #[test]
    fn unsupported_extension() {
        let err = load_file(Path::new("emissions.xlsx")).unwrap_err();
        assert!(err.to_string().contains(".xlsx"));
    }

    #[test]
    fn parquet_widens_int64_years_and_float32_values() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("country_name", DataType::Utf8, false),
            Field::new("country_code", DataType::Utf8, false),
            Field::new("year", DataType::Int64, false),
            Field::new("value", DataType::Float32, true),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Belgium", "Belgium", "Denmark"])),
                Arc::new(StringArray::from(vec!["BEL", "BEL", "DNK"])),
                Arc::new(Int64Array::from(vec![2009, 2010, 2010])),
                Arc::new(Float32Array::from(vec![Some(104.5), None, Some(48.25)])),
            ],
        )
        .unwrap();

        let table = load_parquet_batch("widen", &batch).unwrap();
        assert_eq!(table.len(), 2);
        let first = &table.records()[0];
        assert_eq!((first.country_code.as_str(), first.year, first.value), ("BEL", 2009, 104.5));
        let second = &table.records()[1];
        assert_eq!((second.country_name.as_str(), second.year, second.value), ("Denmark", 2010, 48.25));
    }

    #[test]
    fn parquet_missing_column_is_an_error() {
        let schema = Arc::new(Schema::new(vec![
            Field::new("country_name", DataType::Utf8, false),
            Field::new("country_code", DataType::Utf8, false),
            Field::new("year", DataType::Int32, false),
        ]));
        let batch = RecordBatch::try_new(
            schema,
            vec![
                Arc::new(StringArray::from(vec!["Aruba"])),
                Arc::new(StringArray::from(vec!["ABW"])),
                Arc::new(Int32Array::from(vec![1960])),
            ],
        )
        .unwrap();

        let err = load_parquet_batch("missing", &batch).unwrap_err();
        assert!(format!("{err:#}").contains("'value'"));
    }
}
