use std::collections::BTreeMap;

use eframe::egui::{self, Color32, Mesh, Pos2, Rect, RichText, Sense, Shape, Stroke, Ui};

use crate::chart::{EMISSIONS_LABEL, MapRegion};
use crate::color::{ColorScale, NO_DATA, reds};
use crate::data::geo::{CountryShape, WorldMap};

const COLORBAR_WIDTH: f32 = 110.0;
const COLORBAR_STEPS: usize = 64;

/// Equirectangular projection of lon/lat onto a screen rect, aspect kept.
#[derive(Debug, Clone, Copy)]
struct Projection {
    origin: Pos2,
    scale: f32,
}

impl Projection {
    /// Fit the whole globe (−180..180, −90..90) into `rect`.
    fn fit(rect: Rect) -> Self {
        let scale = (rect.width() / 360.0).min(rect.height() / 180.0);
        let used = egui::vec2(360.0 * scale, 180.0 * scale);
        let origin = rect.center() - used / 2.0;
        Self { origin, scale }
    }

    fn to_screen(self, [lon, lat]: [f64; 2]) -> Pos2 {
        Pos2::new(
            self.origin.x + (lon as f32 + 180.0) * self.scale,
            self.origin.y + (90.0 - lat as f32) * self.scale,
        )
    }

    fn to_lon_lat(self, pos: Pos2) -> [f64; 2] {
        [
            ((pos.x - self.origin.x) / self.scale - 180.0) as f64,
            (90.0 - (pos.y - self.origin.y) / self.scale) as f64,
        ]
    }
}

// ---------------------------------------------------------------------------
// Choropleth
// ---------------------------------------------------------------------------

/// Countries filled by emission value, with a hover tooltip and a colorbar.
///
/// Countries without a row for the selected year stay uncolored.
pub fn choropleth(
    ui: &mut Ui,
    world: Option<&WorldMap>,
    regions: &BTreeMap<String, MapRegion>,
    scale: Option<ColorScale>,
) {
    let Some(world) = world else {
        ui.centered_and_justified(|ui: &mut Ui| {
            ui.heading("No country geometry loaded; run with a GeoJSON file (see --help).");
        });
        return;
    };

    ui.with_layout(egui::Layout::left_to_right(egui::Align::TOP), |ui: &mut Ui| {
        let size = ui.available_size();
        let map_size = egui::vec2((size.x - COLORBAR_WIDTH).max(100.0), size.y);
        let (rect, response) = ui.allocate_exact_size(map_size, Sense::hover());
        let painter = ui.painter_at(rect);
        let projection = Projection::fit(rect);

        painter.rect_filled(rect, 0.0, ui.visuals().extreme_bg_color);

        // Shapes with holes first, so whatever sits inside them paints on top.
        let (holed, plain): (Vec<&CountryShape>, Vec<&CountryShape>) = world
            .shapes()
            .iter()
            .partition(|s| s.polygons.iter().any(|p| !p.holes.is_empty()));

        for shape in holed.into_iter().chain(plain) {
            let fill = match (regions.get(&shape.code), scale) {
                (Some(region), Some(scale)) => scale.color_for(region.value),
                _ => NO_DATA,
            };
            paint_shape(&painter, projection, shape, fill, Stroke::new(0.5, Color32::WHITE));
        }

        if let Some(pos) = response.hover_pos() {
            if let Some(shape) = world.shape_at(projection.to_lon_lat(pos)) {
                paint_outline(&painter, projection, shape, Stroke::new(1.5, Color32::BLACK));
                hover_tooltip(response, shape, regions.get(&shape.code));
            }
        }

        ui.vertical(|ui: &mut Ui| colorbar(ui, scale));
    });
}

/// Country name and value, falling back to the outline's own name or code.
fn hover_tooltip(response: egui::Response, shape: &CountryShape, region: Option<&MapRegion>) {
    let name = region
        .map(|r| r.country_name.clone())
        .or_else(|| shape.name.clone())
        .unwrap_or_else(|| shape.code.clone());
    response.on_hover_ui_at_pointer(|ui: &mut Ui| {
        ui.strong(name);
        match region {
            Some(r) => ui.label(format!("value = {:.2}", r.value)),
            None => ui.label("No data"),
        };
    });
}

fn paint_shape(
    painter: &egui::Painter,
    projection: Projection,
    shape: &CountryShape,
    fill: Color32,
    stroke: Stroke,
) {
    let mut mesh = Mesh::default();
    for polygon in &shape.polygons {
        let base = mesh.vertices.len() as u32;
        for &pt in &polygon.exterior {
            mesh.colored_vertex(projection.to_screen(pt), fill);
        }
        for &[a, b, c] in &polygon.triangles {
            mesh.add_triangle(base + a, base + b, base + c);
        }
    }
    painter.add(Shape::mesh(mesh));
    paint_outline(painter, projection, shape, stroke);
}

fn paint_outline(
    painter: &egui::Painter,
    projection: Projection,
    shape: &CountryShape,
    stroke: Stroke,
) {
    for polygon in &shape.polygons {
        let points: Vec<Pos2> = polygon
            .exterior
            .iter()
            .map(|&pt| projection.to_screen(pt))
            .collect();
        painter.add(Shape::closed_line(points, stroke));
    }
}

/// Vertical gradient from light (bottom) to saturated red (top).
fn colorbar(ui: &mut Ui, scale: Option<ColorScale>) {
    ui.label(RichText::new(EMISSIONS_LABEL).small().strong());

    let bar_height = (ui.available_height() * 0.6).max(60.0);
    ui.horizontal(|ui: &mut Ui| {
        let (bar, _) = ui.allocate_exact_size(egui::vec2(18.0, bar_height), Sense::hover());
        let mut mesh = Mesh::default();
        for step in 0..COLORBAR_STEPS {
            let t0 = step as f32 / COLORBAR_STEPS as f32;
            let t1 = (step + 1) as f32 / COLORBAR_STEPS as f32;
            let y0 = bar.bottom() - t0 * bar.height();
            let y1 = bar.bottom() - t1 * bar.height();
            let band = Rect::from_x_y_ranges(bar.x_range(), y1..=y0);
            mesh.add_colored_rect(band, reds((t0 + t1) / 2.0));
        }
        ui.painter().add(Shape::mesh(mesh));

        ui.vertical(|ui: &mut Ui| {
            let Some(scale) = scale else {
                ui.label("no data");
                return;
            };
            let row = ui.text_style_height(&egui::TextStyle::Body);
            let gap = ((bar_height - 3.0 * row) / 2.0).max(0.0);
            ui.label(format!("{:.0}", scale.max));
            ui.add_space(gap);
            ui.label(format!("{:.0}", (scale.min + scale.max) / 2.0));
            ui.add_space(gap);
            ui.label(format!("{:.0}", scale.min));
        });
    });
}
