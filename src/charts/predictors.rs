use anyhow::Result;
use plotters::coord::Shift;
use plotters::prelude::*;
use std::path::Path;

use super::{item_style, padded_range};
use crate::analyzers::types::{CategoryReport, Regression};
use crate::config::ChartConfig;

type Area<'a> = DrawingArea<BitMapBackend<'a>, Shift>;

const DASHES: usize = 24;

/// Renders one scatter panel per property: item means with confidence error
/// bars, the fitted regression line and its p-value, and a legend of items
/// below the panels. Panels share the score axis.
pub fn render_predictors(path: &Path, report: &CategoryReport, options: &ChartConfig) -> Result<()> {
    let root = BitMapBackend::new(path, options.predictors_size).into_drawing_area();
    root.fill(&WHITE)?;
    let root = root.titled(&report.category, ("sans-serif", options.title_font_size))?;

    let columns = options.legend_columns.max(1);
    let legend_rows = report.items.len().div_ceil(columns) as i32;
    let row_height = (options.label_font_size * 1.6) as i32;
    let legend_height = legend_rows * row_height + 20;
    let (_, height) = root.dim_in_pixel();
    let (plots, legend) = root.split_vertically(height as i32 - legend_height);

    let z = options.confidence_z;
    let y_range = padded_range(
        report.items.iter().flat_map(|item| {
            let half = item.score.half_width(z);
            [item.score.mean - half, item.score.mean + half]
        }),
        0.05,
    );

    let panels = plots.split_evenly((1, report.property_names.len().max(1)));
    for (idx, (panel, fit)) in panels.iter().zip(&report.regressions).enumerate() {
        draw_panel(panel, idx, report, &fit.regression, y_range, options)?;
    }

    draw_legend(&legend, report, options)?;

    root.present()?;
    Ok(())
}

fn draw_panel(
    panel: &Area<'_>,
    idx: usize,
    report: &CategoryReport,
    fit: &Regression,
    (y_lo, y_hi): (f64, f64),
    options: &ChartConfig,
) -> Result<()> {
    let z = options.confidence_z;
    let (x_lo, x_hi) = padded_range(
        report.items.iter().flat_map(|item| {
            let prop = &item.properties[idx];
            let half = prop.half_width(z);
            [prop.mean - half, prop.mean + half]
        }),
        0.05,
    );

    let mut chart = ChartBuilder::on(panel)
        .margin(10)
        .x_label_area_size(50)
        .y_label_area_size(if idx == 0 { 60 } else { 40 })
        .build_cartesian_2d(x_lo..x_hi, y_lo..y_hi)?;

    let font = ("sans-serif", options.label_font_size);
    let blank = |_: &f64| String::new();
    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .x_desc(report.property_names[idx].as_str())
        .label_style(font)
        .axis_desc_style(font);
    if idx == 0 {
        mesh.y_desc(report.score_name.as_str());
    } else {
        mesh.y_label_formatter(&blank);
    }
    mesh.draw()?;

    for (item_idx, item) in report.items.iter().enumerate() {
        let (marker, color) = item_style(item_idx);
        let prop = &item.properties[idx];
        let (x, y) = (prop.mean, item.score.mean);
        let x_half = prop.half_width(z);
        let y_half = item.score.half_width(z);

        chart.draw_series(std::iter::once(ErrorBar::new_vertical(
            x,
            y - y_half,
            y,
            y + y_half,
            color.stroke_width(1),
            options.cap_width,
        )))?;
        chart.draw_series(std::iter::once(ErrorBar::new_horizontal(
            y,
            x - x_half,
            x,
            x + x_half,
            color.stroke_width(1),
            options.cap_width,
        )))?;
        chart.draw_series(std::iter::once(
            EmptyElement::at((x, y))
                + Polygon::new(marker.vertices(options.marker_size), color.filled()),
        ))?;
    }

    // dashed fit line over the span of the item means
    let (x_min, x_max) = padded_range(report.items.iter().map(|i| i.properties[idx].mean), 0.0);
    let step = (x_max - x_min) / (2 * DASHES - 1) as f64;
    chart.draw_series((0..DASHES).map(|k| {
        let from = x_min + step * (2 * k) as f64;
        let to = from + step;
        PathElement::new(
            vec![(from, fit.predict(from)), (to, fit.predict(to))],
            BLACK.stroke_width(1),
        )
    }))?;

    chart.draw_series(std::iter::once(Text::new(
        format!("p = {:.2}", fit.pvalue),
        (x_lo + 0.05 * (x_hi - x_lo), y_hi - 0.02 * (y_hi - y_lo)),
        font,
    )))?;

    Ok(())
}

fn draw_legend(area: &Area<'_>, report: &CategoryReport, options: &ChartConfig) -> Result<()> {
    let columns = options.legend_columns.max(1);
    let (width, _) = area.dim_in_pixel();
    let column_width = (width as usize / columns) as i32;
    let row_height = (options.label_font_size * 1.6) as i32;
    let size = options.marker_size;

    for (item_idx, item) in report.items.iter().enumerate() {
        let (marker, color) = item_style(item_idx);
        let x = 40 + (item_idx % columns) as i32 * column_width;
        let y = 10 + (item_idx / columns) as i32 * row_height + row_height / 2;

        area.draw(
            &(EmptyElement::at((x, y))
                + Polygon::new(marker.vertices(size), color.filled())
                + Text::new(
                    item.label.clone(),
                    (2 * size + 6, -(options.label_font_size as i32) / 2),
                    ("sans-serif", options.label_font_size).into_font(),
                )),
        )?;
    }

    Ok(())
}
