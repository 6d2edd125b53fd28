//! The in-memory time-series model shared by both push flows (§3).
//!
//! v1 and v2 bodies are both snappy-compressed protobuf `WriteRequest`s on
//! the wire; once decoded, C6's validator and C7's transform chain only
//! ever see this model, not the protobuf types directly.

use crate::{ProtoLabel, ProtoSample, ProtoTimeSeries, WriteRequest};

/// A single label name/value pair on a time series.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Label {
    pub name: String,
    pub value: String,
}

impl Label {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

/// A single sample: a float value at a millisecond Unix timestamp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sample {
    pub value: f64,
    pub timestamp_ms: i64,
}

/// One metric series: a set of labels and the samples recorded for it.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TimeSeries {
    pub labels: Vec<Label>,
    pub samples: Vec<Sample>,
}

impl TimeSeries {
    /// Value of the named label, if present.
    pub fn label_value(&self, name: &str) -> Option<&str> {
        self.labels
            .iter()
            .find(|l| l.name == name)
            .map(|l| l.value.as_str())
    }

    /// Sets a label, overwriting any existing value for `name`.
    pub fn set_label(&mut self, name: &str, value: &str) {
        if let Some(existing) = self.labels.iter_mut().find(|l| l.name == name) {
            existing.value = value.to_string();
        } else {
            self.labels.push(Label::new(name, value));
        }
    }

    /// Removes every label whose name is in `names`.
    pub fn remove_labels(&mut self, names: &std::collections::HashSet<String>) {
        self.labels.retain(|l| !names.contains(&l.name));
    }

    /// Sorts labels by name and checks for duplicate names.
    ///
    /// Returns `false` (batch rejected, per REDESIGN FLAGS §2) if two
    /// labels share a name after sorting.
    pub fn normalize(&mut self) -> bool {
        self.labels.sort_by(|a, b| a.name.cmp(&b.name));
        self.labels.windows(2).all(|w| w[0].name != w[1].name)
    }
}

/// A batch of time series, the unit C7 operates on and C9 forwards.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MetricBatch {
    pub series: Vec<TimeSeries>,
}

impl From<WriteRequest> for MetricBatch {
    fn from(req: WriteRequest) -> Self {
        MetricBatch {
            series: req.timeseries.into_iter().map(TimeSeries::from).collect(),
        }
    }
}

impl From<MetricBatch> for WriteRequest {
    fn from(batch: MetricBatch) -> Self {
        WriteRequest {
            timeseries: batch.series.into_iter().map(ProtoTimeSeries::from).collect(),
        }
    }
}

impl From<ProtoTimeSeries> for TimeSeries {
    fn from(ts: ProtoTimeSeries) -> Self {
        TimeSeries {
            labels: ts
                .labels
                .into_iter()
                .map(|l| Label::new(l.name, l.value))
                .collect(),
            samples: ts
                .samples
                .into_iter()
                .map(|s| Sample {
                    value: s.value,
                    timestamp_ms: s.timestamp,
                })
                .collect(),
        }
    }
}

impl From<TimeSeries> for ProtoTimeSeries {
    fn from(ts: TimeSeries) -> Self {
        ProtoTimeSeries {
            labels: ts
                .labels
                .into_iter()
                .map(|l| ProtoLabel {
                    name: l.name,
                    value: l.value,
                })
                .collect(),
            samples: ts
                .samples
                .into_iter()
                .map(|s| ProtoSample {
                    value: s.value,
                    timestamp: s.timestamp_ms,
                })
                .collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_label_overwrites_existing() {
        let mut ts = TimeSeries {
            labels: vec![Label::new("region", "eu")],
            samples: vec![],
        };
        ts.set_label("region", "us");
        assert_eq!(ts.label_value("region"), Some("us"));
        assert_eq!(ts.labels.len(), 1);
    }

    #[test]
    fn normalize_sorts_and_detects_duplicates() {
        let mut ts = TimeSeries {
            labels: vec![Label::new("b", "1"), Label::new("a", "2")],
            samples: vec![],
        };
        assert!(ts.normalize());
        assert_eq!(ts.labels[0].name, "a");
        assert_eq!(ts.labels[1].name, "b");

        let mut dup = TimeSeries {
            labels: vec![Label::new("a", "1"), Label::new("a", "2")],
            samples: vec![],
        };
        assert!(!dup.normalize());
    }
}
