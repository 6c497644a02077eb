use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, RichText, ScrollArea, Ui};

use crate::data::model::ChartMode;
use crate::event::{Tab, UiEvent};
use crate::state::AppState;

pub const APP_TITLE: &str = "CO2 Emission by Country";

// ---------------------------------------------------------------------------
// Left side panel – filter widgets
// ---------------------------------------------------------------------------

/// Render the left filter panel. Widgets only emit events; the selection is
/// updated by the dispatcher.
pub fn side_panel(ui: &mut Ui, state: &mut AppState, events: &mut Vec<UiEvent>) {
    let mode = state.selection.chart_mode;

    ui.strong("Graph");
    egui::ComboBox::from_id_salt("graph")
        .selected_text(mode.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for candidate in ChartMode::ALL {
                if ui
                    .selectable_label(mode == candidate, candidate.to_string())
                    .clicked()
                    && mode != candidate
                {
                    events.push(UiEvent::SetMode(candidate));
                }
            }
        });
    ui.separator();

    let years = state.table.year_choices();

    if mode.uses_year_range() {
        let (start, end) = state.selection.year_range;
        if let Some(year) = year_select(ui, "start_year", "Start Year", start, years.clone()) {
            events.push(UiEvent::SetStartYear(year));
        }
        if let Some(year) = year_select(ui, "end_year", "End Year", end, years.clone()) {
            events.push(UiEvent::SetEndYear(year));
        }
        if start > end {
            ui.label(RichText::new("Start year is after end year.").color(Color32::YELLOW));
        }
        ui.separator();
    }

    if mode.uses_single_year() {
        let year = state.selection.single_year;
        if let Some(year) = year_select(ui, "year", "Year", year, years) {
            events.push(UiEvent::SetYear(year));
        }
        ui.separator();
    }

    if mode.uses_countries() {
        country_select(ui, state, events);
    }
}

fn year_select(
    ui: &mut Ui,
    id: &str,
    label: &str,
    current: i32,
    years: RangeInclusive<i32>,
) -> Option<i32> {
    let mut picked = None;
    ui.strong(label);
    egui::ComboBox::from_id_salt(id)
        .selected_text(current.to_string())
        .show_ui(ui, |ui: &mut Ui| {
            for year in years {
                if ui
                    .selectable_label(year == current, year.to_string())
                    .clicked()
                    && year != current
                {
                    picked = Some(year);
                }
            }
        });
    picked
}

/// Multi-select: chips for the current picks, a search box, and a checkbox list.
fn country_select(ui: &mut Ui, state: &mut AppState, events: &mut Vec<UiEvent>) {
    let n_selected = state.selection.countries.len();
    let n_total = state.table.country_names().len();
    ui.strong(format!("Country / Region  ({n_selected}/{n_total})"));

    ui.horizontal_wrapped(|ui: &mut Ui| {
        for country in &state.selection.countries {
            let chip = RichText::new(format!("{country} ✕")).color(state.colors.color_for(country));
            if ui.small_button(chip).clicked() {
                events.push(UiEvent::ToggleCountry(country.clone()));
            }
        }
    });

    ui.horizontal(|ui: &mut Ui| {
        if ui.small_button("All").clicked() {
            events.push(UiEvent::SelectAllCountries);
        }
        if ui.small_button("None").clicked() {
            events.push(UiEvent::ClearCountries);
        }
    });

    ui.add(
        egui::TextEdit::singleline(&mut state.country_search)
            .hint_text("Search…")
            .desired_width(f32::INFINITY),
    );
    let needle = state.country_search.to_lowercase();

    ScrollArea::vertical()
        .id_salt("country_list")
        .auto_shrink([false, false])
        .show(ui, |ui: &mut Ui| {
            for country in state.table.country_names() {
                if !needle.is_empty() && !country.to_lowercase().contains(&needle) {
                    continue;
                }
                let mut checked = state.selection.countries.contains(country);
                let mut response = ui.checkbox(&mut checked, country.as_str());
                if let Some(code) = state.table.country_code(country) {
                    response = response.on_hover_text(code);
                }
                if response.changed() {
                    events.push(UiEvent::ToggleCountry(country.clone()));
                }
            }
        });
}

// ---------------------------------------------------------------------------
// Top bar
// ---------------------------------------------------------------------------

/// Render the top menu, title, tabs and status line.
pub fn top_bar(ui: &mut Ui, state: &AppState, events: &mut Vec<UiEvent>) {
    egui::menu::bar(ui, |ui: &mut Ui| {
        ui.menu_button("File", |ui: &mut Ui| {
            if ui.button("Open dataset…").clicked() {
                if let Some(path) = open_file_dialog() {
                    events.push(UiEvent::OpenDataset(path));
                }
                ui.close_menu();
            }
            let can_export = state.tab == Tab::Historical && state.pending_export.is_none();
            if ui
                .add_enabled(can_export, egui::Button::new("Save chart as PNG…"))
                .clicked()
            {
                if let Some(path) = save_file_dialog() {
                    events.push(UiEvent::ExportChart(path));
                }
                ui.close_menu();
            }
        });

        ui.separator();
        ui.strong(APP_TITLE);
        ui.separator();

        for (tab, label) in [(Tab::Historical, "Historical"), (Tab::About, "About")] {
            if ui.selectable_label(state.tab == tab, label).clicked() && state.tab != tab {
                events.push(UiEvent::SelectTab(tab));
            }
        }

        ui.separator();
        let span = match state.table.year_bounds() {
            Some((first, last)) => format!(" ({first}–{last})"),
            None => String::new(),
        };
        ui.label(format!(
            "{} records loaded{span}, {} shown",
            state.table.len(),
            state.filtered.len()
        ));

        if let Some(msg) = &state.status_message {
            ui.separator();
            ui.label(RichText::new(msg).color(Color32::RED));
        }
    });
}

// ---------------------------------------------------------------------------
// File dialogs
// ---------------------------------------------------------------------------

fn open_file_dialog() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Open emission data")
        .add_filter("Supported files", &["csv", "parquet", "pq", "json"])
        .add_filter("CSV", &["csv"])
        .add_filter("Parquet", &["parquet", "pq"])
        .add_filter("JSON", &["json"])
        .pick_file()
}

fn save_file_dialog() -> Option<std::path::PathBuf> {
    rfd::FileDialog::new()
        .set_title("Save chart")
        .set_file_name("co2_chart.png")
        .add_filter("PNG", &["png"])
        .save_file()
}
