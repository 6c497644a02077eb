use std::path::PathBuf;

use crate::data::model::ChartMode;

/// Content region tabs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Tab {
    #[default]
    Historical,
    About,
}

/// A user action emitted by a widget.
///
/// Widgets never touch the selection directly; they push events which
/// [`crate::state::AppState::dispatch`] applies once per frame.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    SetMode(ChartMode),
    ToggleCountry(String),
    SelectAllCountries,
    ClearCountries,
    SetStartYear(i32),
    SetEndYear(i32),
    SetYear(i32),
    SelectTab(Tab),
    OpenDataset(PathBuf),
    ExportChart(PathBuf),
}
