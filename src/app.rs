use std::sync::Arc;

use eframe::egui::{self, ColorImage, Rect};

use crate::event::{Tab, UiEvent};
use crate::export;
use crate::state::AppState;
use crate::ui::{about, panels, plot, table};

// ---------------------------------------------------------------------------
// eframe App implementation
// ---------------------------------------------------------------------------

pub struct EmissionsApp {
    pub state: AppState,
    /// Events emitted by widgets during the current frame.
    events: Vec<UiEvent>,
    /// Where the chart was drawn this frame.
    chart_rect: Option<Rect>,
    /// Chart rect of the frame the pending screenshot was requested in.
    export_rect: Option<Rect>,
}

impl EmissionsApp {
    pub fn new(state: AppState) -> Self {
        Self {
            state,
            events: Vec::new(),
            chart_rect: None,
            export_rect: None,
        }
    }

    /// Request a screenshot of the frame just drawn for a queued export.
    fn request_screenshot(&mut self, ctx: &egui::Context) {
        if self.state.pending_export.is_none() || self.export_rect.is_some() {
            return;
        }
        self.export_rect = Some(self.chart_rect.unwrap_or_else(|| ctx.screen_rect()));
        ctx.send_viewport_cmd(egui::ViewportCommand::Screenshot(Default::default()));
    }

    /// Write the queued export once its screenshot arrives.
    fn finish_export(&mut self, ctx: &egui::Context) {
        let Some(rect) = self.export_rect else {
            return;
        };
        let screenshot: Option<Arc<ColorImage>> = ctx.input(|i| {
            i.raw.events.iter().find_map(|e| match e {
                egui::Event::Screenshot { image, .. } => Some(Arc::clone(image)),
                _ => None,
            })
        });
        let Some(image) = screenshot else {
            return;
        };

        self.export_rect = None;
        let Some(path) = self.state.pending_export.take() else {
            return;
        };
        match export::save_region(&image, rect, ctx.pixels_per_point(), &path) {
            Ok(()) => {
                self.state.status_message = Some(format!("Saved {}", path.display()));
            }
            Err(e) => {
                log::error!("Failed to save chart: {e:#}");
                self.state.status_message = Some(format!("Error: {e:#}"));
            }
        }
    }
}

impl eframe::App for EmissionsApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.finish_export(ctx);

        // ---- Top panel: menu, title, tabs ----
        egui::TopBottomPanel::top("top_bar").show(ctx, |ui| {
            panels::top_bar(ui, &self.state, &mut self.events);
        });

        // ---- Left side panel: filters ----
        egui::SidePanel::left("filter_panel")
            .default_width(350.0)
            .resizable(true)
            .show(ctx, |ui| {
                panels::side_panel(ui, &mut self.state, &mut self.events);
            });

        match self.state.tab {
            Tab::Historical => {
                // ---- Bottom panel: filtered rows ----
                egui::TopBottomPanel::bottom("data_panel")
                    .resizable(true)
                    .show(ctx, |ui| {
                        egui::CollapsingHeader::new("Data")
                            .default_open(false)
                            .show(ui, |ui| table::data_table(ui, &self.state.filtered));
                    });

                // ---- Central panel: chart ----
                egui::CentralPanel::default().show(ctx, |ui| {
                    self.chart_rect = Some(plot::chart_view(ui, &self.state));
                });
            }
            Tab::About => {
                egui::CentralPanel::default().show(ctx, |ui| about::about_page(ui));
            }
        }

        self.request_screenshot(ctx);

        if !self.events.is_empty() {
            self.state.dispatch(self.events.drain(..));
            ctx.request_repaint();
        }
        if self.state.pending_export.is_some() {
            ctx.request_repaint();
        }
    }
}
