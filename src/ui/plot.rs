use std::ops::RangeInclusive;

use eframe::egui::{self, Color32, Rect, RichText, Ui};
use egui_plot::{Bar, BarChart, GridMark, Line, Plot, PlotPoints, uniform_grid_spacer};

use crate::chart::{BarEntry, COUNTRY_LABEL, Chart, EMISSIONS_LABEL, LineSeries, YEAR_LABEL};
use crate::state::AppState;
use crate::ui::map;

const LEGEND_WIDTH: f32 = 180.0;

/// Drawn over the chart when the selection matches no rows.
const NO_DATA_MESSAGE: &str = "No data for the current selection";

// ---------------------------------------------------------------------------
// Chart area (central panel)
// ---------------------------------------------------------------------------

/// Render the current chart and return the screen rect it occupies.
pub fn chart_view(ui: &mut Ui, state: &AppState) -> Rect {
    let rect = ui.available_rect_before_wrap();
    match &state.chart {
        Chart::Line { series } => line_chart(ui, series, state.selection.year_range),
        Chart::Bar { bars } => bar_chart(ui, bars),
        Chart::Map { regions, scale } => {
            map::choropleth(ui, state.world.as_deref(), regions, *scale)
        }
    }
    if state.chart.is_empty() {
        ui.painter().text(
            rect.center(),
            egui::Align2::CENTER_CENTER,
            NO_DATA_MESSAGE,
            egui::FontId::proportional(18.0),
            ui.visuals().weak_text_color(),
        );
    }
    rect
}

fn line_chart(ui: &mut Ui, series: &[LineSeries], (start, end): (i32, i32)) {
    ui.with_layout(egui::Layout::left_to_right(egui::Align::TOP), |ui: &mut Ui| {
        let size = ui.available_size();
        let mut plot = Plot::new("line_chart")
            .width((size.x - LEGEND_WIDTH).max(200.0))
            .height(size.y)
            .x_axis_label(YEAR_LABEL)
            .y_axis_label(EMISSIONS_LABEL)
            .x_axis_formatter(|mark: GridMark, _range: &RangeInclusive<f64>| {
                format!("{:.0}", mark.value)
            })
            .show_grid(true)
            .allow_boxed_zoom(true)
            .allow_drag(true)
            .allow_scroll(true)
            .allow_zoom(true);
        // Keep the axes meaningful even when nothing matches.
        if series.is_empty() && start <= end {
            plot = plot.include_x(start as f64).include_x(end as f64).include_y(0.0);
        }

        plot.show(ui, |plot_ui| {
            for s in series {
                let points: PlotPoints = s.points.clone().into();
                plot_ui.line(
                    Line::new(points)
                        .name(&s.country)
                        .color(s.color)
                        .width(1.5),
                );
            }
        });

        ui.vertical(|ui: &mut Ui| {
            legend(ui, series.iter().map(|s| (s.country.as_str(), s.color)));
        });
    });
}

/// Titled legend with a colour swatch per entry.
fn legend<'a>(ui: &mut Ui, entries: impl Iterator<Item = (&'a str, Color32)>) {
    ui.strong(COUNTRY_LABEL);
    ui.separator();
    egui::ScrollArea::vertical()
        .id_salt("legend")
        .show(ui, |ui: &mut Ui| {
            for (name, color) in entries {
                ui.horizontal(|ui: &mut Ui| {
                    let (swatch, _) =
                        ui.allocate_exact_size(egui::vec2(14.0, 4.0), egui::Sense::hover());
                    ui.painter().rect_filled(swatch, 1.0, color);
                    ui.label(RichText::new(name).color(color));
                });
            }
        });
}

fn bar_chart(ui: &mut Ui, bars: &[BarEntry]) {
    let n = bars.len();
    let names: Vec<String> = bars.iter().map(|b| b.country.clone()).collect();

    // First country at the top.
    let plot_bars: Vec<Bar> = bars
        .iter()
        .enumerate()
        .map(|(i, b)| {
            Bar::new((n - 1 - i) as f64, b.value)
                .name(&b.country)
                .fill(b.color)
                .width(0.7)
        })
        .collect();

    Plot::new("bar_chart")
        .x_axis_label(EMISSIONS_LABEL)
        .y_axis_label(COUNTRY_LABEL)
        .y_axis_formatter(move |mark: GridMark, _range: &RangeInclusive<f64>| {
            country_tick(&names, mark.value)
        })
        .y_grid_spacer(uniform_grid_spacer(|_| [1.0, 5.0, 10.0]))
        .include_x(0.0)
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            plot_ui.bar_chart(BarChart::new(plot_bars).horizontal());
        });
}

/// Axis label for a bar position: the country at that slot, blank between slots.
fn country_tick(names: &[String], value: f64) -> String {
    let slot = value.round();
    if (value - slot).abs() > 1e-6 || slot < 0.0 || slot >= names.len() as f64 {
        return String::new();
    }
    names[names.len() - 1 - slot as usize].clone()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ticks_map_slots_to_countries_top_down() {
        let names = vec!["Belgium".to_string(), "Denmark".to_string()];
        assert_eq!(country_tick(&names, 1.0), "Belgium");
        assert_eq!(country_tick(&names, 0.0), "Denmark");
        assert_eq!(country_tick(&names, 0.5), "");
        assert_eq!(country_tick(&names, 2.0), "");
        assert_eq!(country_tick(&names, -1.0), "");
        assert_eq!(country_tick(&[], 0.0), "");
    }
}
