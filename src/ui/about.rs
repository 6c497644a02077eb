use eframe::egui::{ScrollArea, Ui};

const DATASET_URL: &str = "https://www.kaggle.com/datasets/ulrikthygepedersen/co2-emissions-by-country";
const LICENSE_URL: &str = "https://creativecommons.org/licenses/by/4.0/";

/// Citation, context and usage notes.
pub fn about_page(ui: &mut Ui) {
    ScrollArea::vertical().show(ui, |ui: &mut Ui| {
        ui.separator();
        ui.heading("Citation & Acknowledgement");
        ui.separator();

        ui.strong("Data");
        ui.horizontal_wrapped(|ui: &mut Ui| {
            ui.label("Data was obtained from the Kaggle dataset");
            ui.hyperlink_to("CO2 Emissions", DATASET_URL);
            ui.label(".");
        });
        ui.add_space(4.0);
        ui.strong("License");
        ui.hyperlink_to("Attribution 4.0 International (CC BY 4.0 DEED)", LICENSE_URL);

        ui.add_space(12.0);
        ui.separator();
        ui.heading("Context");
        ui.separator();
        ui.label(
            "Yearly carbon dioxide emissions in kilotons for every country and \
             regional aggregate reported by the World Bank, 1960 to 2019.",
        );

        ui.add_space(12.0);
        ui.separator();
        ui.heading("Instructions");
        ui.separator();
        ui.label("• Graph picks the view: Line (trend), Bar (one year) or Map (whole world).");
        ui.label("• Line and Bar: tick countries in the sidebar; search narrows the list.");
        ui.label("• Line: Start Year and End Year bound the x axis.");
        ui.label("• Bar and Map: Year picks the single year shown.");
        ui.label("• Hover a country on the map for its value.");
        ui.label("• File → Save chart as PNG… exports the current chart.");
    });
}
