use std::ops::Range;
use std::str::FromStr;

use anyhow::{bail, Result};
use plotters::prelude::*;

use crate::process::Dataset;
use crate::render::format::{format_grouped, format_value};
use crate::stats::{Average, MetricKind};

const WIDTH: u32 = 960;
const HEIGHT: u32 = 400;
const MAX_X_LABELS: usize = 40;
const SERIES: RGBColor = RGBColor(0x88, 0x84, 0xd8);
const REFERENCE: RGBColor = RGBColor(0xff, 0x73, 0x00);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartType {
    #[default]
    Line,
    Bar,
}

impl ChartType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChartType::Line => "line",
            ChartType::Bar => "bar",
        }
    }

    /// Label shown in the chart-type selector.
    pub fn label(&self) -> &'static str {
        match self {
            ChartType::Line => "折れ線グラフ",
            ChartType::Bar => "棒グラフ",
        }
    }
}

impl FromStr for ChartType {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "line" => Ok(ChartType::Line),
            "bar" => Ok(ChartType::Bar),
            other => bail!("unknown chart type `{}` (expected line or bar)", other),
        }
    }
}

/// Draw the selected metric as an SVG document.
///
/// Records are placed at x = 0, 1, 2, … and labelled with their raw date.
/// Null values leave gaps. Percentage metrics use a fixed 0–100 axis and are
/// clamped into it; other metrics autoscale. The average, if any, is drawn
/// as a dashed reference line.
pub fn render_chart_svg(
    dataset: &Dataset,
    metric: &str,
    chart_type: ChartType,
    average: Option<Average>,
) -> Result<String> {
    if dataset.is_empty() {
        bail!("no records to chart");
    }
    let kind = MetricKind::of(metric);
    let dates: Vec<&str> = dataset.records.iter().map(|r| r.date.as_str()).collect();
    let values: Vec<Option<f64>> = dataset.series(metric).map(|(_, v)| v).collect();

    let y_range = y_domain(kind, &values, average);
    let x_range = -0.5..(dates.len() as f64 - 0.5);
    let fit = |v: f64| v.clamp(y_range.start, y_range.end);

    let mut svg = String::new();
    {
        let root = SVGBackend::with_string(&mut svg, (WIDTH, HEIGHT)).into_drawing_area();
        root.fill(&WHITE)?;

        let mut chart = ChartBuilder::on(&root)
            .margin_top(20)
            .margin_right(30)
            .margin_left(20)
            .x_label_area_size(80)
            .y_label_area_size(70)
            .build_cartesian_2d(x_range.clone(), y_range.clone())?;

        chart
            .configure_mesh()
            .x_labels(dates.len().min(MAX_X_LABELS))
            .x_label_formatter(&|x: &f64| date_label(&dates, *x))
            .x_label_style(
                ("sans-serif", 11)
                    .into_font()
                    .transform(FontTransform::Rotate90),
            )
            .y_label_formatter(&|y: &f64| axis_label(*y, kind))
            .draw()?;

        match chart_type {
            ChartType::Line => {
                let mut labelled = false;
                for run in runs(&values) {
                    let series = chart.draw_series(LineSeries::new(
                        run.into_iter().map(|(x, y)| (x, fit(y))),
                        SERIES.stroke_width(2),
                    ))?;
                    if !labelled {
                        series.label(metric).legend(|(x, y)| {
                            PathElement::new(vec![(x, y), (x + 20, y)], SERIES.stroke_width(2))
                        });
                        labelled = true;
                    }
                }
                chart.draw_series(values.iter().enumerate().filter_map(|(i, v)| {
                    v.map(|v| Circle::new((i as f64, fit(v)), 3, SERIES.filled()))
                }))?;
            }
            ChartType::Bar => {
                let base = fit(0.0);
                chart
                    .draw_series(values.iter().enumerate().filter_map(|(i, v)| {
                        v.map(|v| {
                            let x = i as f64;
                            Rectangle::new([(x - 0.35, base), (x + 0.35, fit(v))], SERIES.filled())
                        })
                    }))?
                    .label(metric)
                    .legend(|(x, y)| Rectangle::new([(x, y - 5), (x + 12, y + 5)], SERIES.filled()));
            }
        }

        if let Some(avg) = average {
            let y = fit(avg.value);
            chart
                .draw_series(DashedLineSeries::new(
                    vec![(x_range.start, y), (x_range.end, y)],
                    6,
                    4,
                    REFERENCE.stroke_width(1),
                ))?
                .label(format!("平均: {}", format_value(avg.value, kind)))
                .legend(|(x, y)| PathElement::new(vec![(x, y), (x + 20, y)], REFERENCE));
        }

        chart
            .configure_series_labels()
            .background_style(&WHITE.mix(0.8))
            .border_style(&BLACK.mix(0.3))
            .position(SeriesLabelPosition::UpperRight)
            .draw()?;

        root.present()?;
    }
    Ok(svg)
}

/// Value axis bounds: fixed for percentages, padded around the data otherwise.
fn y_domain(kind: MetricKind, values: &[Option<f64>], average: Option<Average>) -> Range<f64> {
    if kind == MetricKind::Percentage {
        return 0.0..100.0;
    }
    let (lo, hi) = values
        .iter()
        .flatten()
        .copied()
        .chain(average.map(|a| a.value))
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
            (lo.min(v), hi.max(v))
        });
    if !lo.is_finite() || !hi.is_finite() {
        return 0.0..1.0;
    }
    let span = hi - lo;
    let pad = if span > 0.0 {
        span * 0.1
    } else {
        (hi.abs() * 0.1).max(1.0)
    };
    (lo - pad)..(hi + pad)
}

/// Contiguous stretches of non-null values, so nulls break the line.
fn runs(values: &[Option<f64>]) -> Vec<Vec<(f64, f64)>> {
    let mut out = Vec::new();
    let mut current = Vec::new();
    for (i, v) in values.iter().enumerate() {
        match v {
            Some(v) => current.push((i as f64, *v)),
            None if !current.is_empty() => out.push(std::mem::take(&mut current)),
            None => {}
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn date_label(dates: &[&str], x: f64) -> String {
    let idx = x.round();
    if (x - idx).abs() > 1e-6 || idx < 0.0 {
        return String::new();
    }
    dates.get(idx as usize).map(|d| d.to_string()).unwrap_or_default()
}

fn axis_label(y: f64, kind: MetricKind) -> String {
    match kind {
        MetricKind::Percentage => format!("{}%", format_grouped(y)),
        MetricKind::Plain => format_grouped(y),
    }
}
