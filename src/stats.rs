// src/stats.rs

use chrono::{Local, NaiveDate};

use crate::process::date_parser::parse_sheet_date;
use crate::process::Dataset;

/// How a metric's values are displayed and scaled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    /// Name contains `%`: 0–100 axis, values shown as `12.34%`.
    Percentage,
    Plain,
}

impl MetricKind {
    pub fn of(metric: &str) -> Self {
        if metric.contains('%') {
            MetricKind::Percentage
        } else {
            MetricKind::Plain
        }
    }
}

/// Deviation of one point from the average.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Deviation {
    pub deviation: f64,
    /// `None` when the average is zero.
    pub deviation_percent: Option<f64>,
}

/// Average of `metric` up to and including `today`, together with the
/// number of points it was taken over.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Average {
    pub value: f64,
    pub samples: usize,
}

impl Average {
    pub fn deviation_of(&self, v: f64) -> Deviation {
        let deviation = v - self.value;
        let deviation_percent = if self.value == 0.0 {
            None
        } else {
            Some(deviation / self.value * 100.0)
        };
        Deviation {
            deviation,
            deviation_percent,
        }
    }
}

/// Local wall-clock date; time of day is dropped.
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Mean of the non-null `metric` values on records dated on or before
/// `today`. Records with unparseable dates never count. `None` when nothing
/// qualifies.
pub fn average_to_date(dataset: &Dataset, metric: &str, today: NaiveDate) -> Option<Average> {
    let (sum, samples) = dataset
        .series(metric)
        .filter(|(date, _)| parse_sheet_date(date).is_some_and(|d| d <= today))
        .filter_map(|(_, v)| v)
        .fold((0.0, 0usize), |(sum, n), v| (sum + v, n + 1));

    if samples == 0 {
        None
    } else {
        Some(Average {
            value: sum / samples as f64,
            samples,
        })
    }
}
