use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// First year offered by the year selectors.
pub const YEAR_MIN: i32 = 1960;
/// Last year offered by the year selectors.
pub const YEAR_MAX: i32 = 2019;

/// Country pre-selected for the Line and Bar views when present.
pub const DEFAULT_COUNTRY: &str = "Aruba";

// ---------------------------------------------------------------------------
// EmissionRecord – one row of the table
// ---------------------------------------------------------------------------

/// One observation: a country's emissions for a single year, in kilotons.
#[derive(Debug, Clone, PartialEq)]
pub struct EmissionRecord {
    pub country_name: String,
    pub country_code: String,
    pub year: i32,
    pub value: f64,
}

// ---------------------------------------------------------------------------
// EmissionTable – the complete loaded dataset
// ---------------------------------------------------------------------------

/// The full immutable table with pre-computed indices.
///
/// Built once by the loader and shared behind an `Arc` for the lifetime of
/// the dataset; there is no write path.
#[derive(Debug, Clone, Default)]
pub struct EmissionTable {
    records: Vec<EmissionRecord>,
    /// Sorted distinct country names (choices for the multi-select).
    country_names: BTreeSet<String>,
    /// country_name → country_code.
    country_codes: BTreeMap<String, String>,
    /// Observed (min, max) year, `None` for an empty table.
    year_bounds: Option<(i32, i32)>,
}

impl EmissionTable {
    /// Build column indices from the loaded records.
    pub fn from_records(records: Vec<EmissionRecord>) -> Self {
        let mut country_names = BTreeSet::new();
        let mut country_codes = BTreeMap::new();
        let mut year_bounds: Option<(i32, i32)> = None;

        for rec in &records {
            country_names.insert(rec.country_name.clone());
            country_codes
                .entry(rec.country_name.clone())
                .or_insert_with(|| rec.country_code.clone());
            year_bounds = Some(match year_bounds {
                Some((lo, hi)) => (lo.min(rec.year), hi.max(rec.year)),
                None => (rec.year, rec.year),
            });
        }

        EmissionTable {
            records,
            country_names,
            country_codes,
            year_bounds,
        }
    }

    pub fn records(&self) -> &[EmissionRecord] {
        &self.records
    }

    pub fn country_names(&self) -> &BTreeSet<String> {
        &self.country_names
    }

    /// ISO code for a country name, shown next to the name in the selector.
    pub fn country_code(&self, country_name: &str) -> Option<&str> {
        self.country_codes.get(country_name).map(String::as_str)
    }

    /// Observed (first, last) year, for the status line.
    pub fn year_bounds(&self) -> Option<(i32, i32)> {
        self.year_bounds
    }

    /// Years offered by the year selectors: 1960–2019, widened to cover the
    /// table if it reaches outside that range.
    pub fn year_choices(&self) -> std::ops::RangeInclusive<i32> {
        match self.year_bounds {
            Some((lo, hi)) => lo.min(YEAR_MIN)..=hi.max(YEAR_MAX),
            None => YEAR_MIN..=YEAR_MAX,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the table is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

// ---------------------------------------------------------------------------
// Selection – what the sidebar controls currently say
// ---------------------------------------------------------------------------

/// Visualization type; decides which filters apply and which renderer runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub enum ChartMode {
    #[default]
    Line,
    Bar,
    Map,
}

impl ChartMode {
    pub const ALL: [ChartMode; 3] = [ChartMode::Line, ChartMode::Bar, ChartMode::Map];

    /// Line and Bar restrict rows to the selected countries; Map shows the world.
    pub fn uses_countries(self) -> bool {
        matches!(self, ChartMode::Line | ChartMode::Bar)
    }

    pub fn uses_year_range(self) -> bool {
        self == ChartMode::Line
    }

    pub fn uses_single_year(self) -> bool {
        matches!(self, ChartMode::Bar | ChartMode::Map)
    }
}

impl fmt::Display for ChartMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChartMode::Line => write!(f, "Line"),
            ChartMode::Bar => write!(f, "Bar"),
            ChartMode::Map => write!(f, "Map"),
        }
    }
}

/// Current values of every sidebar control.
///
/// Fields irrelevant to the active mode are kept so switching modes back and
/// forth preserves what the user picked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub chart_mode: ChartMode,
    pub countries: BTreeSet<String>,
    /// `(start_year, end_year)`; an inverted pair is allowed and matches nothing.
    pub year_range: (i32, i32),
    pub single_year: i32,
}

impl Default for Selection {
    fn default() -> Self {
        Self {
            chart_mode: ChartMode::Line,
            countries: BTreeSet::from([DEFAULT_COUNTRY.to_string()]),
            year_range: (YEAR_MIN, YEAR_MAX),
            single_year: YEAR_MIN,
        }
    }
}

impl Selection {
    /// Startup selection for a freshly loaded table.
    ///
    /// Pre-selects Aruba when the table has it, otherwise the first country.
    pub fn defaults_for(table: &EmissionTable) -> Self {
        let mut selection = Selection::default();
        if !table.country_names().contains(DEFAULT_COUNTRY) {
            selection.countries = table.country_names().iter().take(1).cloned().collect();
        }
        selection
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn record(name: &str, code: &str, year: i32, value: f64) -> EmissionRecord {
        EmissionRecord {
            country_name: name.to_string(),
            country_code: code.to_string(),
            year,
            value,
        }
    }

    /// Belgium and Denmark, 1990–2015, plus Aruba for 2010 only.
    pub(crate) fn sample_table() -> EmissionTable {
        let mut records = Vec::new();
        for year in 1990..=2015 {
            records.push(record("Belgium", "BEL", year, 100_000.0 + year as f64));
            records.push(record("Denmark", "DNK", year, 50_000.0 + year as f64));
        }
        records.push(record("Aruba", "ABW", 2010, 2_500.0));
        EmissionTable::from_records(records)
    }

    #[test]
    fn table_indexes_countries_codes_and_years() {
        let table = sample_table();
        assert_eq!(table.len(), 53);
        let names: Vec<&str> = table.country_names().iter().map(String::as_str).collect();
        assert_eq!(names, ["Aruba", "Belgium", "Denmark"]);
        assert_eq!(table.country_code("Denmark"), Some("DNK"));
        assert_eq!(table.country_code("Narnia"), None);
        assert_eq!(table.year_bounds(), Some((1990, 2015)));
        assert!(!table.is_empty());
        assert!(EmissionTable::default().is_empty());
        assert_eq!(EmissionTable::default().year_bounds(), None);
        assert_eq!(table.year_choices(), YEAR_MIN..=YEAR_MAX);
    }

    #[test]
    fn year_choices_widen_to_cover_table() {
        let table = EmissionTable::from_records(vec![record("X", "XXX", 2021, 1.0)]);
        assert_eq!(table.year_choices(), YEAR_MIN..=2021);
        assert_eq!(EmissionTable::default().year_choices(), YEAR_MIN..=YEAR_MAX);
    }

    #[test]
    fn defaults_prefer_aruba() {
        let selection = Selection::defaults_for(&sample_table());
        assert_eq!(selection.chart_mode, ChartMode::Line);
        assert_eq!(selection.countries, BTreeSet::from(["Aruba".to_string()]));
        assert_eq!(selection.year_range, (1960, 2019));
        assert_eq!(selection.single_year, 1960);
    }

    #[test]
    fn defaults_fall_back_to_first_country() {
        let table = EmissionTable::from_records(vec![
            record("Chile", "CHL", 2000, 1.0),
            record("Brazil", "BRA", 2000, 2.0),
        ]);
        let selection = Selection::defaults_for(&table);
        assert_eq!(selection.countries, BTreeSet::from(["Brazil".to_string()]));

        let empty = Selection::defaults_for(&EmissionTable::default());
        assert!(empty.countries.is_empty());
    }

    #[test]
    fn mode_gates() {
        assert!(ChartMode::Line.uses_countries() && ChartMode::Bar.uses_countries());
        assert!(!ChartMode::Map.uses_countries());
        assert!(ChartMode::Line.uses_year_range());
        assert!(!ChartMode::Line.uses_single_year());
        assert!(ChartMode::Map.uses_single_year());
        assert_eq!(ChartMode::Bar.to_string(), "Bar");
    }
}
