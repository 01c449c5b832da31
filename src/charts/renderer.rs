//! Static Chart Renderer
//! Draws the five report charts to PNG files with plotters.
//!
//! Charts:
//! 1. Population vs total doses scatter, marker size/colour by doses per head
//! 2. Doses received per head, one bar per country in supply order
//! 3. Heatmap of doses (millions) per vaccine type and country
//! 4. Faceted bars: one panel per dose stage, bars per vaccine
//! 5. Faceted bars: one panel per vaccine, bars per dose stage

use super::series::{self, Bar, Facet, RolloutPoint};
use super::ChartError;
use crate::aggregate::{AggregateViews, VaccineMatrix};
use log::info;
use plotters::coord::ranged1d::SegmentValue;
use plotters::prelude::*;
use plotters::style::FontTransform;
use std::error::Error;
use std::path::{Path, PathBuf};

pub const ROLLOUT_SCATTER: &str = "rollout_scatter.png";
pub const RECEIVED_BARS: &str = "received_per_pop.png";
pub const VACCINE_HEATMAP: &str = "vaccine_heatmap.png";
pub const DOSE_FACETS: &str = "dose_stage_by_dose.png";
pub const VACCINE_FACETS: &str = "dose_stage_by_vaccine.png";

const FONT: &str = "sans-serif";
const FACET_COLUMNS: usize = 4;

// Heatmap / scatter gradient endpoints
const LOW: RGBColor = RGBColor(253, 231, 214);
const HIGH: RGBColor = RGBColor(120, 28, 109);

const BAR_BLUE: RGBColor = RGBColor(52, 101, 164);

pub const PALETTE: [RGBColor; 10] = [
    RGBColor(231, 76, 60),  // Red
    RGBColor(46, 204, 113), // Green
    RGBColor(155, 89, 182), // Purple
    RGBColor(243, 156, 18), // Orange
    RGBColor(26, 188, 156), // Teal
    RGBColor(233, 30, 99),  // Pink
    RGBColor(0, 188, 212),  // Cyan
    RGBColor(255, 87, 34),  // Deep Orange
    RGBColor(121, 85, 72),  // Brown
    RGBColor(96, 125, 139), // Blue Grey
];

type DrawResult = Result<(), Box<dyn Error>>;

/// Position of `value` within `[min, max]`, clamped to `[0, 1]`.
/// A degenerate range maps everything to the middle.
pub fn normalize(value: f64, min: f64, max: f64) -> f64 {
    if !(max > min) {
        return 0.5;
    }
    ((value - min) / (max - min)).clamp(0.0, 1.0)
}

/// Linear blend between the two gradient endpoints.
pub fn gradient(t: f64) -> RGBColor {
    let t = t.clamp(0.0, 1.0);
    let mix = |a: u8, b: u8| (a as f64 + (b as f64 - a as f64) * t).round() as u8;
    RGBColor(mix(LOW.0, HIGH.0), mix(LOW.1, HIGH.1), mix(LOW.2, HIGH.2))
}

/// Scatter marker radius in pixels.
pub fn marker_radius(t: f64) -> u32 {
    (4.0 + t.clamp(0.0, 1.0) * 10.0).round() as u32
}

/// Upper axis bound with 10% headroom; 1.0 when there is nothing positive.
pub fn padded_max(values: impl IntoIterator<Item = f64>) -> f64 {
    let max = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    if max > 0.0 {
        max * 1.1
    } else {
        1.0
    }
}

/// (rows, columns) of a facet grid with at most `max_columns` per row.
pub fn facet_grid(panels: usize, max_columns: usize) -> (usize, usize) {
    let columns = panels.clamp(1, max_columns.max(1));
    let rows = panels.div_ceil(columns).max(1);
    (rows, columns)
}

fn segment_label(labels: &[String], value: &SegmentValue<u32>) -> String {
    match value {
        SegmentValue::CenterOf(i) => labels.get(*i as usize).cloned().unwrap_or_default(),
        _ => String::new(),
    }
}

fn bar(i: usize, value: f64, color: RGBColor) -> Rectangle<(SegmentValue<u32>, f64)> {
    let mut rect = Rectangle::new(
        [
            (SegmentValue::Exact(i as u32), 0.0),
            (SegmentValue::Exact(i as u32 + 1), value),
        ],
        color.filled(),
    );
    rect.set_margin(0, 0, 3, 3);
    rect
}

/// Renders the report charts at a fixed image size.
pub struct StaticChartRenderer {
    width: u32,
    height: u32,
}

impl StaticChartRenderer {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Draw all five charts into `output_dir`, returning the written paths.
    pub fn render_all(
        &self,
        views: &AggregateViews,
        output_dir: &Path,
    ) -> Result<Vec<PathBuf>, ChartError> {
        std::fs::create_dir_all(output_dir)?;

        let points = RolloutPoint::from_view(&views.rollout)?;
        let received = series::received_bars(&views.supply)?;
        let by_dose = series::facets_by_dose(&views.dose_stages)?;
        let by_vaccine = series::facets_by_vaccine(&views.dose_stages)?;

        let path = output_dir.join(ROLLOUT_SCATTER);
        render(&path, self.draw_rollout_scatter(&points, &path))?;
        let mut written = vec![path];

        let path = output_dir.join(RECEIVED_BARS);
        render(&path, self.draw_received_bars(&received, &path))?;
        written.push(path);

        let path = output_dir.join(VACCINE_HEATMAP);
        render(&path, self.draw_heatmap(&views.breakdown, &path))?;
        written.push(path);

        let path = output_dir.join(DOSE_FACETS);
        render(
            &path,
            self.draw_facets(
                "Breakdown of Vaccine Types per Administered Dose - EU",
                &by_dose,
                &path,
            ),
        )?;
        written.push(path);

        let path = output_dir.join(VACCINE_FACETS);
        render(
            &path,
            self.draw_facets("Breakdown of Dose Type per Vaccine - EU", &by_vaccine, &path),
        )?;
        written.push(path);

        info!("Rendered {} charts to {}", written.len(), output_dir.display());
        Ok(written)
    }

    fn draw_rollout_scatter(&self, points: &[RolloutPoint], path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let x_max = padded_max(points.iter().map(|p| p.population_m));
        let y_max = padded_max(points.iter().map(|p| p.total_dose_m));
        let (r_min, r_max) = points.iter().fold((f64::INFINITY, f64::NEG_INFINITY), |acc, p| {
            (acc.0.min(p.vacc_per_pop), acc.1.max(p.vacc_per_pop))
        });

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "EU Countries Population vs. COVID-19 Vaccine Rollout",
                (FONT, 26),
            )
            .margin(20)
            .x_label_area_size(50)
            .y_label_area_size(70)
            .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

        chart
            .configure_mesh()
            .x_desc("Population (Millions)")
            .y_desc("Total Doses of Vaccine Administered (Millions)")
            .draw()?;

        chart.draw_series(points.iter().map(|p| {
            let t = normalize(p.vacc_per_pop, r_min, r_max);
            Circle::new(
                (p.population_m, p.total_dose_m),
                marker_radius(t),
                gradient(t).filled(),
            )
        }))?;
        chart.draw_series(points.iter().map(|p| {
            Text::new(
                p.country.clone(),
                (p.population_m, p.total_dose_m),
                (FONT, 11).into_font(),
            )
        }))?;

        root.present()?;
        Ok(())
    }

    fn draw_received_bars(&self, bars: &[Bar], path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let labels: Vec<String> = bars.iter().map(|b| b.label.clone()).collect();
        let n = bars.len() as u32;
        let y_max = padded_max(bars.iter().map(|b| b.value));

        let mut chart = ChartBuilder::on(&root)
            .caption("Vaccines Received per EU Country by Population", (FONT, 26))
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(70)
            .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)?;

        chart
            .configure_mesh()
            .disable_x_mesh()
            .x_labels(labels.len() + 1)
            .x_label_formatter(&|v| segment_label(&labels, v))
            .x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90))
            .x_desc("Country")
            .y_desc("# Vaccines Received Per Population")
            .draw()?;

        chart.draw_series(
            bars.iter()
                .enumerate()
                .map(|(i, b)| bar(i, b.value, BAR_BLUE)),
        )?;

        root.present()?;
        Ok(())
    }

    fn draw_heatmap(&self, matrix: &VaccineMatrix, path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;

        let countries = matrix.countries.clone();
        let vaccines = matrix.vaccines.clone();
        let max = matrix.max_value().unwrap_or(0.0);

        let mut chart = ChartBuilder::on(&root)
            .caption(
                "Heatmap of administered vaccine dose type per EU Country",
                (FONT, 26),
            )
            .margin(20)
            .x_label_area_size(140)
            .y_label_area_size(80)
            .build_cartesian_2d(
                (0u32..countries.len() as u32).into_segmented(),
                (0u32..vaccines.len() as u32).into_segmented(),
            )?;

        chart
            .configure_mesh()
            .disable_mesh()
            .x_labels(countries.len() + 1)
            .y_labels(vaccines.len() + 1)
            .x_label_formatter(&|v| segment_label(&countries, v))
            .y_label_formatter(&|v| segment_label(&vaccines, v))
            .x_label_style((FONT, 12).into_font().transform(FontTransform::Rotate90))
            .y_desc("Vaccines Administered (millions)")
            .draw()?;

        let cells = matrix.values.iter().enumerate().flat_map(|(i, row)| {
            row.iter().enumerate().filter_map(move |(j, cell)| {
                let value = (*cell)?;
                Some(Rectangle::new(
                    [
                        (SegmentValue::Exact(j as u32), SegmentValue::Exact(i as u32)),
                        (
                            SegmentValue::Exact(j as u32 + 1),
                            SegmentValue::Exact(i as u32 + 1),
                        ),
                    ],
                    gradient(normalize(value, 0.0, max)).filled(),
                ))
            })
        });
        chart.draw_series(cells)?;

        root.present()?;
        Ok(())
    }

    fn draw_facets(&self, title: &str, facets: &[Facet], path: &Path) -> DrawResult {
        let root = BitMapBackend::new(path, (self.width, self.height)).into_drawing_area();
        root.fill(&WHITE)?;
        let root = root.titled(title, (FONT, 26))?;

        let (rows, columns) = facet_grid(facets.len(), FACET_COLUMNS);
        let panels = root.split_evenly((rows, columns));
        let y_max = padded_max(facets.iter().flat_map(|f| f.bars.iter().map(|b| b.value)));

        for (facet, area) in facets.iter().zip(panels.iter()) {
            let labels: Vec<String> = facet.bars.iter().map(|b| b.label.clone()).collect();
            let n = labels.len() as u32;

            let mut chart = ChartBuilder::on(area)
                .caption(&facet.title, (FONT, 16))
                .margin(8)
                .x_label_area_size(90)
                .y_label_area_size(60)
                .build_cartesian_2d((0u32..n).into_segmented(), 0f64..y_max)?;

            chart
                .configure_mesh()
                .disable_x_mesh()
                .x_labels(labels.len() + 1)
                .x_label_formatter(&|v| segment_label(&labels, v))
                .x_label_style((FONT, 10).into_font().transform(FontTransform::Rotate90))
                .y_desc("# Administered Doses")
                .draw()?;

            chart.draw_series(
                facet
                    .bars
                    .iter()
                    .enumerate()
                    .map(|(i, b)| bar(i, b.value, PALETTE[i % PALETTE.len()])),
            )?;
        }

        root.present()?;
        Ok(())
    }
}

fn render(path: &Path, result: DrawResult) -> Result<(), ChartError> {
    result.map_err(|e| ChartError::Render {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::test_fixtures::joined;

    #[test]
    fn normalize_clamps_and_handles_flat_ranges() {
        assert_eq!(normalize(5.0, 0.0, 10.0), 0.5);
        assert_eq!(normalize(-1.0, 0.0, 10.0), 0.0);
        assert_eq!(normalize(11.0, 0.0, 10.0), 1.0);
        assert_eq!(normalize(3.0, 3.0, 3.0), 0.5);
        assert_eq!(normalize(3.0, f64::INFINITY, f64::NEG_INFINITY), 0.5);
    }

    #[test]
    fn gradient_hits_both_ends() {
        assert_eq!(gradient(0.0), LOW);
        assert_eq!(gradient(1.0), HIGH);
        assert_eq!(gradient(7.0), HIGH);
    }

    #[test]
    fn marker_radius_grows_with_ratio() {
        assert_eq!(marker_radius(0.0), 4);
        assert_eq!(marker_radius(1.0), 14);
        assert!(marker_radius(0.3) < marker_radius(0.6));
    }

    #[test]
    fn padded_max_leaves_headroom() {
        assert!((padded_max([1.0, 10.0, f64::NAN]) - 11.0).abs() < 1e-9);
        assert_eq!(padded_max(Vec::<f64>::new()), 1.0);
        assert_eq!(padded_max([0.0, -2.0]), 1.0);
    }

    #[test]
    fn facet_grid_wraps_rows() {
        assert_eq!(facet_grid(4, 4), (1, 4));
        assert_eq!(facet_grid(7, 4), (2, 4));
        assert_eq!(facet_grid(2, 4), (1, 2));
        assert_eq!(facet_grid(0, 4), (1, 1));
    }

    #[test]
    #[ignore = "needs system fonts"]
    fn renders_all_five_charts() {
        let views = AggregateViews::build(&joined()).unwrap();
        let dir = tempfile::tempdir().unwrap();

        let written = StaticChartRenderer::new(640, 480)
            .render_all(&views, dir.path())
            .unwrap();

        assert_eq!(written.len(), 5);
        for path in written {
            let img = image::open(&path).unwrap();
            assert_eq!((img.width(), img.height()), (640, 480));
        }
    }
}
