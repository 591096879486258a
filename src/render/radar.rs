// src/render/radar.rs
//! Five-axis radar chart over the personality scores, rendered to SVG

use svg::node::element::{Line, Polygon, Text};
use svg::Document;

use crate::types::{PersonalityScores, MAX_SCORE};

const GRID_STROKE: &str = "#e2e8f0";
const LABEL_FILL: &str = "#64748b";
const SERIES_COLOR: &str = "#f472b6";

#[derive(Debug, Clone, PartialEq)]
pub struct RadarAxis {
    pub label: &'static str,
    pub value: u8,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RadarChart {
    pub axes: Vec<RadarAxis>,
    /// Inclusive domain of every axis
    pub domain: (u8, u8),
}

impl RadarChart {
    pub fn from_scores(scores: &PersonalityScores) -> Self {
        let labels = ["社交性", "論理性", "知的好奇心", "協調性", "行動力"];
        let axes = labels
            .into_iter()
            .zip(scores.as_array())
            .map(|(label, value)| RadarAxis {
                label,
                value: value.min(MAX_SCORE),
            })
            .collect();

        Self {
            axes,
            domain: (0, MAX_SCORE),
        }
    }

    /// Angle of axis `index`, first axis pointing straight up
    fn angle(&self, index: usize) -> f64 {
        let step = std::f64::consts::TAU / self.axes.len() as f64;
        -std::f64::consts::FRAC_PI_2 + step * index as f64
    }

    fn point(&self, index: usize, fraction: f64, center: f64, radius: f64) -> (f64, f64) {
        let angle = self.angle(index);
        (
            center + radius * fraction * angle.cos(),
            center + radius * fraction * angle.sin(),
        )
    }

    /// Polygon vertices of the score series
    pub fn vertices(&self, center: f64, radius: f64) -> Vec<(f64, f64)> {
        let max = f64::from(self.domain.1);
        (0..self.axes.len())
            .map(|i| self.point(i, f64::from(self.axes[i].value) / max, center, radius))
            .collect()
    }

    pub fn to_svg(&self, size: u32) -> String {
        let size_f = f64::from(size);
        let center = size_f / 2.0;
        let radius = size_f * 0.325;
        let max = self.domain.1;

        let mut document = Document::new()
            .set("xmlns", "http://www.w3.org/2000/svg")
            .set("viewBox", (0, 0, size, size))
            .set("width", size)
            .set("height", size);

        for level in 1..=max {
            let fraction = f64::from(level) / f64::from(max);
            let ring: Vec<(f64, f64)> = (0..self.axes.len())
                .map(|i| self.point(i, fraction, center, radius))
                .collect();
            document = document.add(
                Polygon::new()
                    .set("points", format_points(&ring))
                    .set("fill", "none")
                    .set("stroke", GRID_STROKE),
            );
        }

        for (i, axis) in self.axes.iter().enumerate() {
            let (x, y) = self.point(i, 1.0, center, radius);
            document = document.add(
                Line::new()
                    .set("x1", center)
                    .set("y1", center)
                    .set("x2", x)
                    .set("y2", y)
                    .set("stroke", GRID_STROKE),
            );

            let (lx, ly) = self.point(i, 1.22, center, radius);
            document = document.add(
                Text::new(axis.label)
                    .set("x", lx)
                    .set("y", ly)
                    .set("text-anchor", "middle")
                    .set("dominant-baseline", "middle")
                    .set("font-size", 10)
                    .set("font-weight", 900)
                    .set("fill", LABEL_FILL),
            );
        }

        document = document.add(
            Polygon::new()
                .set("points", format_points(&self.vertices(center, radius)))
                .set("fill", SERIES_COLOR)
                .set("fill-opacity", 0.3)
                .set("stroke", SERIES_COLOR)
                .set("stroke-width", 3),
        );

        document.to_string()
    }
}

fn format_points(points: &[(f64, f64)]) -> String {
    points
        .iter()
        .map(|(x, y)| format!("{:.2},{:.2}", x, y))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores(values: [u8; 5]) -> PersonalityScores {
        PersonalityScores {
            sociability: values[0],
            logic: values[1],
            curiosity: values[2],
            cooperation: values[3],
            action: values[4],
        }
    }

    #[test]
    fn test_five_axes_bounded_zero_to_five() {
        let chart = RadarChart::from_scores(&scores([3, 5, 4, 3, 4]));
        assert_eq!(chart.axes.len(), 5);
        assert_eq!(chart.domain, (0, 5));
        let values: Vec<u8> = chart.axes.iter().map(|a| a.value).collect();
        assert_eq!(values, vec![3, 5, 4, 3, 4]);
        assert_eq!(chart.axes[0].label, "社交性");
        assert_eq!(chart.axes[4].label, "行動力");
    }

    #[test]
    fn test_vertices_stay_inside_radius() {
        let chart = RadarChart::from_scores(&scores([5, 0, 5, 1, 2]));
        let (center, radius) = (100.0, 50.0);
        let vertices = chart.vertices(center, radius);
        for (x, y) in &vertices {
            let distance = ((x - center).powi(2) + (y - center).powi(2)).sqrt();
            assert!(distance <= radius + 1e-9);
        }
        // full score on the first axis points straight up
        assert!((vertices[0].0 - center).abs() < 1e-9);
        assert!((vertices[0].1 - (center - radius)).abs() < 1e-9);
        // zero collapses to the center
        assert!((vertices[1].0 - center).abs() < 1e-9);
    }

    #[test]
    fn test_svg_contains_grid_and_labels() {
        let svg = RadarChart::from_scores(&scores([1, 2, 3, 4, 5])).to_svg(300);
        assert!(svg.starts_with("<svg"));
        assert_eq!(svg.matches("<polygon").count(), 6);
        assert_eq!(svg.matches("<line").count(), 5);
        assert!(svg.contains("知的好奇心"));
    }
}
