use std::collections::{BTreeSet, HashMap, VecDeque};
use std::sync::Arc;

use super::model::{ChartMode, EmissionRecord, EmissionTable, Selection};

/// Maximum number of distinct selections remembered by [`FilterCache`].
pub const CACHE_CAPACITY: usize = 64;

// ---------------------------------------------------------------------------
// FilterKey: the inputs that matter for a given chart mode
// ---------------------------------------------------------------------------

/// The part of a [`Selection`] the active mode actually reads.
///
/// Two selections that differ only in fields the mode ignores produce the
/// same key, so e.g. changing the start year while in Map mode is a cache hit.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FilterKey {
    Line {
        countries: BTreeSet<String>,
        start_year: i32,
        end_year: i32,
    },
    Bar {
        countries: BTreeSet<String>,
        year: i32,
    },
    Map {
        year: i32,
    },
}

impl FilterKey {
    pub fn from_selection(selection: &Selection) -> Self {
        match selection.chart_mode {
            ChartMode::Line => FilterKey::Line {
                countries: selection.countries.clone(),
                start_year: selection.year_range.0,
                end_year: selection.year_range.1,
            },
            ChartMode::Bar => FilterKey::Bar {
                countries: selection.countries.clone(),
                year: selection.single_year,
            },
            ChartMode::Map => FilterKey::Map {
                year: selection.single_year,
            },
        }
    }

    /// Whether a record passes every mask this key implies.
    ///
    /// * Line / Bar → `country_name` must be in the selected set
    /// * Line       → `start_year <= year <= end_year` (inverted range fails everything)
    /// * Bar / Map  → `year == single_year`
    fn matches(&self, rec: &EmissionRecord) -> bool {
        match self {
            FilterKey::Line {
                countries,
                start_year,
                end_year,
            } => {
                countries.contains(&rec.country_name)
                    && *start_year <= rec.year
                    && rec.year <= *end_year
            }
            FilterKey::Bar { countries, year } => {
                countries.contains(&rec.country_name) && rec.year == *year
            }
            FilterKey::Map { year } => rec.year == *year,
        }
    }
}

// ---------------------------------------------------------------------------
// FilteredTable: row subset of the shared table
// ---------------------------------------------------------------------------

/// Rows of an [`EmissionTable`] selected by a filter, in table order.
#[derive(Debug, Clone)]
pub struct FilteredTable {
    table: Arc<EmissionTable>,
    indices: Vec<usize>,
}

impl FilteredTable {
    pub fn iter(&self) -> impl Iterator<Item = &EmissionRecord> + '_ {
        let records = self.table.records();
        self.indices.iter().map(move |&i| &records[i])
    }

    pub fn len(&self) -> usize {
        self.indices.len()
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

/// Apply the mode's masks to `table`. Total: bad combinations give an empty result.
pub fn filter_table(table: &Arc<EmissionTable>, selection: &Selection) -> FilteredTable {
    filter_by_key(table, &FilterKey::from_selection(selection))
}

fn filter_by_key(table: &Arc<EmissionTable>, key: &FilterKey) -> FilteredTable {
    let indices = table
        .records()
        .iter()
        .enumerate()
        .filter(|(_, rec)| key.matches(rec))
        .map(|(i, _)| i)
        .collect();
    FilteredTable {
        table: Arc::clone(table),
        indices,
    }
}

// ---------------------------------------------------------------------------
// FilterCache: memoised results per distinct key
// ---------------------------------------------------------------------------

/// Memoises [`filter_table`] per [`FilterKey`], evicting the oldest entry
/// once [`CACHE_CAPACITY`] keys are stored.
///
/// Results are only valid for the table they were computed from; call
/// [`FilterCache::clear`] when the table is replaced.
#[derive(Debug, Default)]
pub struct FilterCache {
    entries: HashMap<FilterKey, Arc<FilteredTable>>,
    order: VecDeque<FilterKey>,
}

impl FilterCache {
    pub fn get_or_compute(
        &mut self,
        table: &Arc<EmissionTable>,
        selection: &Selection,
    ) -> Arc<FilteredTable> {
        let key = FilterKey::from_selection(selection);
        if let Some(hit) = self.entries.get(&key) {
            log::debug!("filter cache hit for {key:?}");
            return Arc::clone(hit);
        }

        let result = Arc::new(filter_by_key(table, &key));
        log::debug!("filter cache miss for {key:?}: {} rows", result.len());

        if self.order.len() >= CACHE_CAPACITY {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.order.push_back(key.clone());
        self.entries.insert(key, Arc::clone(&result));
        log::trace!("filter cache holds {} keys", self.len());
        result
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::tests::sample_table;

    fn selection(mode: ChartMode, countries: &[&str], range: (i32, i32), year: i32) -> Selection {
        Selection {
            chart_mode: mode,
            countries: countries.iter().map(|c| c.to_string()).collect(),
            year_range: range,
            single_year: year,
        }
    }

    fn rows(filtered: &FilteredTable) -> Vec<(String, i32)> {
        filtered
            .iter()
            .map(|r| (r.country_name.clone(), r.year))
            .collect()
    }

    #[test]
    fn line_keeps_selected_countries_within_range() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Line, &["Belgium", "Denmark"], (1997, 2010), 1960);
        let filtered = filter_table(&table, &sel);

        assert_eq!(filtered.len(), 2 * 14);
        for rec in filtered.iter() {
            assert!(sel.countries.contains(&rec.country_name));
            assert!((1997..=2010).contains(&rec.year));
        }
        let names: BTreeSet<&str> = filtered.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, BTreeSet::from(["Belgium", "Denmark"]));
    }

    #[test]
    fn bar_keeps_one_row_per_selected_country() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Bar, &["Belgium", "Denmark"], (1960, 2019), 2010);
        let filtered = filter_table(&table, &sel);

        assert_eq!(
            rows(&filtered),
            vec![("Belgium".to_string(), 2010), ("Denmark".to_string(), 2010)]
        );
    }

    #[test]
    fn map_ignores_country_selection() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Map, &["Belgium"], (1960, 2019), 2010);
        let filtered = filter_table(&table, &sel);

        let names: Vec<&str> = filtered.iter().map(|r| r.country_name.as_str()).collect();
        assert_eq!(names, ["Belgium", "Denmark", "Aruba"]);
        assert!(filtered.iter().all(|r| r.year == 2010));

        let none_selected = selection(ChartMode::Map, &[], (1960, 2019), 2010);
        assert_eq!(filter_table(&table, &none_selected).len(), 3);
    }

    #[test]
    fn inverted_range_is_empty_not_an_error() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Line, &["Belgium"], (2010, 1997), 1960);
        assert!(filter_table(&table, &sel).is_empty());
    }

    #[test]
    fn empty_country_set_is_empty() {
        let table = Arc::new(sample_table());
        assert!(filter_table(&table, &selection(ChartMode::Line, &[], (1960, 2019), 2000)).is_empty());
        assert!(filter_table(&table, &selection(ChartMode::Bar, &[], (1960, 2019), 2000)).is_empty());
    }

    #[test]
    fn year_without_data_is_empty() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Map, &[], (1960, 2019), 1961);
        assert!(filter_table(&table, &sel).is_empty());
    }

    #[test]
    fn filtering_is_idempotent_and_keeps_table_order() {
        let table = Arc::new(sample_table());
        let sel = selection(ChartMode::Line, &["Denmark", "Belgium"], (1990, 2015), 1960);
        let first: Vec<_> = filter_table(&table, &sel).iter().cloned().collect();
        let second: Vec<_> = filter_table(&table, &sel).iter().cloned().collect();
        assert_eq!(first, second);

        let in_table_order: Vec<_> = table
            .records()
            .iter()
            .filter(|r| r.country_name != "Aruba" && (1990..=2015).contains(&r.year))
            .cloned()
            .collect();
        assert_eq!(first, in_table_order);
    }

    #[test]
    fn key_ignores_fields_the_mode_does_not_read() {
        let a = selection(ChartMode::Map, &["Belgium"], (1960, 2019), 2010);
        let b = selection(ChartMode::Map, &["Denmark"], (1999, 2001), 2010);
        assert_eq!(FilterKey::from_selection(&a), FilterKey::from_selection(&b));

        let c = selection(ChartMode::Bar, &["Belgium"], (1960, 2019), 2010);
        let d = selection(ChartMode::Bar, &["Belgium"], (1999, 2001), 2010);
        assert_eq!(FilterKey::from_selection(&c), FilterKey::from_selection(&d));

        let e = selection(ChartMode::Line, &["Belgium"], (1960, 2019), 2010);
        let f = selection(ChartMode::Line, &["Belgium"], (1960, 2019), 1999);
        assert_eq!(FilterKey::from_selection(&e), FilterKey::from_selection(&f));
    }

    #[test]
    fn cache_reuses_results_for_identical_keys() {
        let table = Arc::new(sample_table());
        let mut cache = FilterCache::default();
        let sel = selection(ChartMode::Bar, &["Belgium"], (1960, 2019), 2000);

        let first = cache.get_or_compute(&table, &sel);
        let second = cache.get_or_compute(&table, &sel);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);

        let other = selection(ChartMode::Bar, &["Belgium"], (1960, 2019), 2001);
        let third = cache.get_or_compute(&table, &other);
        assert!(!Arc::ptr_eq(&first, &third));
        assert_eq!(cache.len(), 2);

        cache.clear();
        assert_eq!(cache.len(), 0);
    }

    #[test]
    fn cache_evicts_oldest_past_capacity() {
        let table = Arc::new(sample_table());
        let mut cache = FilterCache::default();
        let first_sel = selection(ChartMode::Map, &[], (1960, 2019), 0);
        let first = cache.get_or_compute(&table, &first_sel);

        for year in 1..=CACHE_CAPACITY as i32 {
            cache.get_or_compute(&table, &selection(ChartMode::Map, &[], (1960, 2019), year));
        }
        assert_eq!(cache.len(), CACHE_CAPACITY);

        let again = cache.get_or_compute(&table, &first_sel);
        assert!(!Arc::ptr_eq(&first, &again));
    }
}
