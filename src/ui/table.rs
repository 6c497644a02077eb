use eframe::egui::{self, Ui};
use egui_extras::{Column, TableBuilder};

use crate::chart::COUNTRY_LABEL;
use crate::data::filter::FilteredTable;
use crate::data::model::EmissionRecord;

const ROW_HEIGHT: f32 = 18.0;

/// Filtered rows as a scrollable table.
pub fn data_table(ui: &mut Ui, filtered: &FilteredTable) {
    if filtered.is_empty() {
        ui.weak("No rows match the current selection.");
        return;
    }
    let rows: Vec<&EmissionRecord> = filtered.iter().collect();

    TableBuilder::new(ui)
        .striped(true)
        .resizable(true)
        .cell_layout(egui::Layout::left_to_right(egui::Align::Center))
        .column(Column::initial(220.0).at_least(80.0))
        .column(Column::auto())
        .column(Column::auto())
        .column(Column::remainder())
        .header(20.0, |mut header| {
            header.col(|ui| {
                ui.strong(COUNTRY_LABEL);
            });
            header.col(|ui| {
                ui.strong("Code");
            });
            header.col(|ui| {
                ui.strong("Year");
            });
            header.col(|ui| {
                ui.strong("Value (kt)");
            });
        })
        .body(|body| {
            body.rows(ROW_HEIGHT, rows.len(), |mut row| {
                let rec = rows[row.index()];
                row.col(|ui| {
                    ui.label(&rec.country_name);
                });
                row.col(|ui| {
                    ui.label(&rec.country_code);
                });
                row.col(|ui| {
                    ui.label(rec.year.to_string());
                });
                row.col(|ui| {
                    ui.label(format!("{:.2}", rec.value));
                });
            });
        });
}
