use anyhow::Result;
use plotters::prelude::*;
use std::path::Path;

use super::TAB10;
use crate::analyzers::types::ResponseCount;
use crate::config::ChartConfig;

/// Renders a horizontal bar chart of non-missing values per item, one bar per
/// variable and a legend of variables.
///
/// `counts` is drawn bottom-up, so a descending list puts the lowest code at
/// the top. Within an item the first variable is the topmost bar.
pub fn render_counts(
    path: &Path,
    category: &str,
    variables: &[String],
    counts: &[ResponseCount],
    options: &ChartConfig,
) -> Result<()> {
    let root = BitMapBackend::new(path, options.counts_size).into_drawing_area();
    root.fill(&WHITE)?;

    let title_font = ("sans-serif", options.title_font_size);
    let root = root.titled(&options.counts_title, title_font)?;
    let root = root.titled(category, title_font)?;

    let group = variables.len() + 1;
    let slots = counts.len() * group;
    let max_count = counts
        .iter()
        .flat_map(ResponseCount::variable_counts)
        .max()
        .unwrap_or(0);
    let x_max = max_count + (max_count * 2 / 5).max(1);
    let longest_label = counts
        .iter()
        .map(|c| c.label.chars().count())
        .max()
        .unwrap_or(0);
    let label_area = (longest_label as f64 * options.label_font_size * 0.6) as u32 + 20;
    let labels: Vec<&str> = counts.iter().map(|c| c.label.as_str()).collect();
    let label_slot = 1 + variables.len() / 2;

    let mut chart = ChartBuilder::on(&root)
        .margin(20)
        .x_label_area_size(60)
        .y_label_area_size(label_area)
        .build_cartesian_2d(0usize..x_max, (0usize..slots.max(1)).into_segmented())?;

    chart
        .configure_mesh()
        .disable_y_mesh()
        .y_labels(slots.max(1))
        .y_label_formatter(&|v: &SegmentValue<usize>| match v {
            SegmentValue::CenterOf(idx) if idx % group == label_slot => labels
                .get(idx / group)
                .map(|l| l.to_string())
                .unwrap_or_default(),
            _ => String::new(),
        })
        .x_desc(options.counts_axis_label.as_str())
        .label_style(("sans-serif", options.label_font_size))
        .axis_desc_style(("sans-serif", options.label_font_size))
        .draw()?;

    for (v, name) in variables.iter().enumerate() {
        let color = TAB10[v % TAB10.len()];
        chart
            .draw_series(
                Histogram::horizontal(&chart)
                    .style(color.filled())
                    .margin(1)
                    .data(counts.iter().enumerate().map(|(idx, c)| {
                        let value = c.variable_counts().get(v).copied().unwrap_or(0);
                        (bar_slot(idx, v, variables.len()), value)
                    })),
            )?
            .label(name.as_str())
            .legend(move |(x, y)| Rectangle::new([(x, y - 6), (x + 16, y + 6)], color.filled()));
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .label_font(("sans-serif", options.label_font_size))
        .background_style(&WHITE.mix(0.9))
        .border_style(&BLACK)
        .draw()?;

    root.present()?;
    Ok(())
}

/// Segment of the bar for `variable` of the `item`-th entry. Every item owns
/// `variables + 1` segments, the lowest one left empty as a gap.
fn bar_slot(item: usize, variable: usize, variables: usize) -> usize {
    item * (variables + 1) + variables - variable
}
