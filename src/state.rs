use std::path::PathBuf;
use std::sync::Arc;

use crate::chart::{Chart, build_chart};
use crate::color::ColorMap;
use crate::data::filter::{FilterCache, FilteredTable};
use crate::data::geo::WorldMap;
use crate::data::loader;
use crate::data::model::{EmissionTable, Selection};
use crate::event::{Tab, UiEvent};

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded table, shared read-only with every filtered result.
    pub table: Arc<EmissionTable>,

    /// Country outlines for the Map view (None if no geometry was found).
    pub world: Option<Arc<WorldMap>>,

    /// Current sidebar control values.
    pub selection: Selection,

    /// Memoised filter results for `table`.
    cache: FilterCache,

    /// Rows relevant to the current selection.
    pub filtered: Arc<FilteredTable>,

    /// Chart built from `filtered`.
    pub chart: Chart,

    /// Series colours for the selected countries.
    pub colors: ColorMap,

    /// Text typed into the country search box.
    pub country_search: String,

    pub tab: Tab,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// PNG destination waiting for the next screenshot.
    pub pending_export: Option<PathBuf>,
}

impl AppState {
    pub fn new(table: Arc<EmissionTable>, world: Option<WorldMap>) -> Self {
        let selection = Selection::defaults_for(&table);
        let mut cache = FilterCache::default();
        let filtered = cache.get_or_compute(&table, &selection);
        let colors = ColorMap::new(&selection.countries);
        let chart = build_chart(&filtered, selection.chart_mode, &colors);
        Self {
            table,
            world: world.map(Arc::new),
            selection,
            cache,
            filtered,
            chart,
            colors,
            country_search: String::new(),
            tab: Tab::default(),
            status_message: None,
            pending_export: None,
        }
    }

    /// Apply a frame's worth of events, then recompute at most once.
    pub fn dispatch(&mut self, events: impl IntoIterator<Item = UiEvent>) {
        let before = self.selection.clone();
        let mut table_changed = false;

        for event in events {
            log::debug!("event: {event:?}");
            match event {
                UiEvent::SetMode(mode) => self.selection.chart_mode = mode,
                UiEvent::ToggleCountry(country) => {
                    if !self.selection.countries.remove(&country) {
                        self.selection.countries.insert(country);
                    }
                }
                UiEvent::SelectAllCountries => {
                    self.selection.countries = self.table.country_names().clone();
                }
                UiEvent::ClearCountries => self.selection.countries.clear(),
                UiEvent::SetStartYear(year) => self.selection.year_range.0 = year,
                UiEvent::SetEndYear(year) => self.selection.year_range.1 = year,
                UiEvent::SetYear(year) => self.selection.single_year = year,
                UiEvent::SelectTab(tab) => self.tab = tab,
                UiEvent::OpenDataset(path) => match loader::load_file(&path) {
                    Ok(table) => {
                        self.set_table(Arc::new(table));
                        table_changed = true;
                        self.status_message = None;
                    }
                    Err(e) => {
                        log::error!("Failed to load file: {e:#}");
                        self.status_message = Some(format!("Error: {e:#}"));
                    }
                },
                UiEvent::ExportChart(path) => self.pending_export = Some(path),
            }
        }

        if table_changed || self.selection != before {
            self.recompute();
        }
    }

    /// Replace the table; selection goes back to its defaults.
    fn set_table(&mut self, table: Arc<EmissionTable>) {
        self.cache.clear();
        self.selection = Selection::defaults_for(&table);
        self.table = table;
    }

    fn recompute(&mut self) {
        self.filtered = self.cache.get_or_compute(&self.table, &self.selection);
        self.colors = ColorMap::new(&self.selection.countries);
        self.chart = build_chart(&self.filtered, self.selection.chart_mode, &self.colors);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::ChartMode;
    use crate::data::model::tests::sample_table;

    fn state() -> AppState {
        AppState::new(Arc::new(sample_table()), None)
    }

    #[test]
    fn starts_with_aruba_line_chart() {
        let state = state();
        assert_eq!(state.selection.chart_mode, ChartMode::Line);
        // Aruba only has a 2010 row, which is inside 1960–2019.
        assert_eq!(state.filtered.len(), 1);
        assert!(matches!(&state.chart, Chart::Line { series } if series.len() == 1));
    }

    #[test]
    fn events_recompute_the_chart() {
        let mut state = state();
        state.dispatch([
            UiEvent::ToggleCountry("Aruba".into()),
            UiEvent::ToggleCountry("Belgium".into()),
            UiEvent::ToggleCountry("Denmark".into()),
            UiEvent::SetStartYear(1997),
            UiEvent::SetEndYear(2010),
        ]);
        assert_eq!(state.filtered.len(), 28);

        state.dispatch([UiEvent::SetMode(ChartMode::Bar), UiEvent::SetYear(2010)]);
        assert!(matches!(&state.chart, Chart::Bar { bars } if bars.len() == 2));

        state.dispatch([UiEvent::SetMode(ChartMode::Map)]);
        assert_eq!(state.filtered.len(), 3);
        assert!(matches!(&state.chart, Chart::Map { .. }));
    }

    #[test]
    fn clear_and_select_all() {
        let mut state = state();
        state.dispatch([UiEvent::ClearCountries]);
        assert!(state.filtered.is_empty());
        assert!(state.chart.is_empty());

        state.dispatch([UiEvent::SelectAllCountries]);
        assert_eq!(state.selection.countries.len(), 3);
        assert_eq!(state.filtered.len(), state.table.len());
    }

    #[test]
    fn inverted_range_renders_empty_chart() {
        let mut state = state();
        state.dispatch([UiEvent::SetStartYear(2015), UiEvent::SetEndYear(1990)]);
        assert!(state.filtered.is_empty());
        assert!(state.chart.is_empty());
    }

    #[test]
    fn unchanged_selection_reuses_result() {
        let mut state = state();
        let before = Arc::clone(&state.filtered);
        state.dispatch([UiEvent::SelectTab(Tab::About)]);
        assert_eq!(state.tab, Tab::About);
        assert!(Arc::ptr_eq(&before, &state.filtered));

        // Back to a previously seen selection: served from the cache.
        state.dispatch([UiEvent::SetMode(ChartMode::Map)]);
        state.dispatch([UiEvent::SetMode(ChartMode::Line)]);
        assert!(Arc::ptr_eq(&before, &state.filtered));
    }

    #[test]
    fn failed_load_keeps_table_and_reports() {
        let mut state = state();
        state.dispatch([UiEvent::OpenDataset(PathBuf::from("/no/such/file.csv"))]);
        assert_eq!(state.table.len(), 53);
        assert!(state.status_message.as_deref().unwrap_or("").starts_with("Error:"));
    }

    #[test]
    fn export_request_is_queued() {
        let mut state = state();
        state.dispatch([UiEvent::ExportChart(PathBuf::from("chart.png"))]);
        assert_eq!(state.pending_export, Some(PathBuf::from("chart.png")));
    }
}
