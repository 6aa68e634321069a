//! PNG rendering of response counts and score predictors.

mod counts;
mod predictors;

pub use counts::render_counts;
pub use predictors::render_predictors;

use plotters::style::RGBColor;
use std::path::{Path, PathBuf};

/// Matplotlib's `tab10` qualitative palette.
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

/// Marker shapes cycled through per item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Marker {
    TriangleDown,
    Square,
    Diamond,
    Pentagon,
    Circle,
    TriangleRight,
}

const MARKERS: [Marker; 6] = [
    Marker::TriangleDown,
    Marker::Square,
    Marker::Diamond,
    Marker::Pentagon,
    Marker::Circle,
    Marker::TriangleRight,
];

impl Marker {
    /// Polygon outline around the origin in pixel offsets.
    pub fn vertices(self, size: i32) -> Vec<(i32, i32)> {
        let s = size;
        match self {
            Marker::TriangleDown => vec![(-s, -s), (s, -s), (0, s)],
            Marker::Square => vec![(-s, -s), (s, -s), (s, s), (-s, s)],
            Marker::Diamond => vec![(0, -s), (s, 0), (0, s), (-s, 0)],
            Marker::TriangleRight => vec![(-s, -s), (s, 0), (-s, s)],
            Marker::Pentagon => regular_polygon(5, s),
            Marker::Circle => regular_polygon(16, s),
        }
    }
}

fn regular_polygon(sides: usize, radius: i32) -> Vec<(i32, i32)> {
    (0..sides)
        .map(|k| {
            let angle = -std::f64::consts::FRAC_PI_2
                + 2.0 * std::f64::consts::PI * k as f64 / sides as f64;
            let r = radius as f64;
            (
                (r * angle.cos()).round() as i32,
                (r * angle.sin()).round() as i32,
            )
        })
        .collect()
}

/// Marker and colour of the `index`-th item of a chart.
pub fn item_style(index: usize) -> (Marker, RGBColor) {
    (MARKERS[index % MARKERS.len()], TAB10[index % TAB10.len()])
}

/// `<dir>/<kind>-<category>.png`, with path separators in the category
/// replaced.
pub fn chart_path(output_dir: &Path, kind: &str, category: &str) -> PathBuf {
    output_dir.join(format!("{kind}-{}.png", file_safe(category)))
}

pub(crate) fn file_safe(category: &str) -> String {
    category
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '\0' => '_',
            c => c,
        })
        .collect()
}

/// Lower and upper bound of `values` widened by `pad` of the span on each side.
pub(crate) fn padded_range(values: impl IntoIterator<Item = f64>, pad: f64) -> (f64, f64) {
    let (lo, hi) = values
        .into_iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() {
        return (0.0, 1.0);
    }
    let span = if hi > lo { hi - lo } else { 1.0 };
    (lo - span * pad, hi + span * pad)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_chart_path() {
        let path = chart_path(Path::new("figs"), "counts", "Jordnöt");
        assert_eq!(path, Path::new("figs").join("counts-Jordnöt.png"));

        let path = chart_path(Path::new("figs"), "predictors", "Salt/Sött");
        assert_eq!(path, Path::new("figs").join("predictors-Salt_Sött.png"));
    }

    #[test]
    fn test_item_style_cycles() {
        assert_eq!(item_style(0).0, Marker::TriangleDown);
        assert_eq!(item_style(6).0, Marker::TriangleDown);
        assert_eq!(item_style(6).1, TAB10[6]);
        assert_eq!(item_style(10).1, TAB10[0]);
    }

    #[test]
    fn test_marker_vertices() {
        assert_eq!(Marker::Square.vertices(2).len(), 4);
        assert_eq!(Marker::Pentagon.vertices(5)[0], (0, -5));
        assert_eq!(Marker::Circle.vertices(5).len(), 16);
    }

    #[test]
    fn test_padded_range() {
        assert_eq!(padded_range([1.0, 3.0], 0.5), (0.0, 4.0));
        assert_eq!(padded_range([2.0], 0.5), (1.5, 2.5));
        assert_eq!(padded_range(std::iter::empty(), 0.1), (0.0, 1.0));
    }
}
