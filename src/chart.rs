use std::collections::BTreeMap;

use eframe::egui::Color32;

use crate::color::{ColorMap, ColorScale};
use crate::data::filter::FilteredTable;
use crate::data::model::ChartMode;

pub const YEAR_LABEL: &str = "Year";
pub const EMISSIONS_LABEL: &str = "CO2 Emissions in Kiloton (kt)";
pub const COUNTRY_LABEL: &str = "Country / Region";

// ---------------------------------------------------------------------------
// Chart description
// ---------------------------------------------------------------------------

/// One country's emissions over time, points sorted by year.
#[derive(Debug, Clone, PartialEq)]
pub struct LineSeries {
    pub country: String,
    pub color: Color32,
    pub points: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct BarEntry {
    pub country: String,
    pub color: Color32,
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MapRegion {
    pub country_name: String,
    pub value: f64,
}

/// What to draw, independent of egui.
#[derive(Debug, Clone, PartialEq)]
pub enum Chart {
    Line {
        series: Vec<LineSeries>,
    },
    /// Bars ordered by country name, top to bottom.
    Bar {
        bars: Vec<BarEntry>,
    },
    /// Regions keyed by country code; `scale` is `None` when there is no data.
    Map {
        regions: BTreeMap<String, MapRegion>,
        scale: Option<ColorScale>,
    },
}

impl Chart {
    pub fn is_empty(&self) -> bool {
        match self {
            Chart::Line { series } => series.is_empty(),
            Chart::Bar { bars } => bars.is_empty(),
            Chart::Map { regions, .. } => regions.is_empty(),
        }
    }
}

/// Turn filtered rows into a chart for `mode`.
///
/// Rows are grouped by country name. A Bar chart takes the mean when a
/// country has more than one row for the year.
pub fn build_chart(filtered: &FilteredTable, mode: ChartMode, colors: &ColorMap) -> Chart {
    match mode {
        ChartMode::Line => {
            let mut by_country: BTreeMap<&str, Vec<[f64; 2]>> = BTreeMap::new();
            for rec in filtered.iter() {
                by_country
                    .entry(&rec.country_name)
                    .or_default()
                    .push([rec.year as f64, rec.value]);
            }
            let series = by_country
                .into_iter()
                .map(|(country, mut points)| {
                    points.sort_by(|a, b| a[0].total_cmp(&b[0]));
                    LineSeries {
                        country: country.to_string(),
                        color: colors.color_for(country),
                        points,
                    }
                })
                .collect();
            Chart::Line { series }
        }
        ChartMode::Bar => {
            let mut sums: BTreeMap<&str, (f64, usize)> = BTreeMap::new();
            for rec in filtered.iter() {
                let entry = sums.entry(&rec.country_name).or_insert((0.0, 0));
                entry.0 += rec.value;
                entry.1 += 1;
            }
            let bars = sums
                .into_iter()
                .map(|(country, (sum, n))| BarEntry {
                    country: country.to_string(),
                    color: colors.color_for(country),
                    value: sum / n as f64,
                })
                .collect();
            Chart::Bar { bars }
        }
        ChartMode::Map => {
            let regions: BTreeMap<String, MapRegion> = filtered
                .iter()
                .map(|rec| {
                    (
                        rec.country_code.clone(),
                        MapRegion {
                            country_name: rec.country_name.clone(),
                            value: rec.value,
                        },
                    )
                })
                .collect();
            let scale = ColorScale::from_values(regions.values().map(|r| r.value));
            Chart::Map { regions, scale }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeSet;
    use std::sync::Arc;

    use super::*;
    use crate::data::filter::filter_table;
    use crate::data::model::tests::sample_table;
    use crate::data::model::Selection;

    fn chart_for(selection: &Selection) -> Chart {
        let table = Arc::new(sample_table());
        let filtered = filter_table(&table, selection);
        build_chart(&filtered, selection.chart_mode, &ColorMap::new(&selection.countries))
    }

    fn selection(mode: ChartMode, countries: &[&str]) -> Selection {
        Selection {
            chart_mode: mode,
            countries: countries.iter().map(|c| c.to_string()).collect(),
            year_range: (1997, 2010),
            single_year: 2010,
        }
    }

    #[test]
    fn line_has_one_sorted_series_per_country() {
        let Chart::Line { series } = chart_for(&selection(ChartMode::Line, &["Denmark", "Belgium"]))
        else {
            panic!("expected a line chart");
        };
        let names: Vec<&str> = series.iter().map(|s| s.country.as_str()).collect();
        assert_eq!(names, ["Belgium", "Denmark"]);
        for s in &series {
            assert_eq!(s.points.len(), 14);
            assert_eq!(s.points.first().map(|p| p[0]), Some(1997.0));
            assert_eq!(s.points.last().map(|p| p[0]), Some(2010.0));
        }
        assert_ne!(series[0].color, series[1].color);
    }

    #[test]
    fn bar_has_one_entry_per_country() {
        let Chart::Bar { bars } = chart_for(&selection(ChartMode::Bar, &["Belgium", "Denmark"]))
        else {
            panic!("expected a bar chart");
        };
        assert_eq!(bars.len(), 2);
        assert_eq!(bars[0].country, "Belgium");
        assert_eq!(bars[0].value, 102_010.0);
        assert_eq!(bars[1].value, 52_010.0);
    }

    #[test]
    fn map_keys_regions_by_code_and_scales_values() {
        let Chart::Map { regions, scale } = chart_for(&selection(ChartMode::Map, &[])) else {
            panic!("expected a map");
        };
        let codes: BTreeSet<&str> = regions.keys().map(String::as_str).collect();
        assert_eq!(codes, BTreeSet::from(["ABW", "BEL", "DNK"]));
        assert_eq!(regions["DNK"].country_name, "Denmark");
        let scale = scale.unwrap();
        assert_eq!(scale.min, 2_500.0);
        assert_eq!(scale.max, 102_010.0);
    }

    #[test]
    fn empty_selection_gives_empty_charts() {
        assert!(chart_for(&selection(ChartMode::Line, &[])).is_empty());
        assert!(chart_for(&selection(ChartMode::Bar, &[])).is_empty());

        let mut no_data_year = selection(ChartMode::Map, &[]);
        no_data_year.single_year = 1960;
        let chart = chart_for(&no_data_year);
        assert!(chart.is_empty());
        assert!(matches!(chart, Chart::Map { scale: None, .. }));
    }
}
