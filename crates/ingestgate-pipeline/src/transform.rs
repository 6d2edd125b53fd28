//! The v1 metric-family transform chain (C7, §4.7): allow-list filter,
//! label injection, label elision, normalization — applied in order,
//! preserving series order so downstream deduplication sees a stable
//! stream.

use std::collections::{HashMap, HashSet};

use ingestgate_types::model::MetricBatch;

use crate::error::TransformError;

/// One allow-list rule: a series matches iff it carries every (name,
/// value) pair in the rule. A batch series matches the allow-list overall
/// iff it matches at least one configured rule.
///
/// Rules are configured as `name1=value1,name2=value2` — every comma-
/// separated `k=v` pair must match literally. This is the simplest
/// selector shape that can express "match this metric family" and
/// "match this metric family for this tenant", the two cases the allow
/// list exists for.
#[derive(Debug, Clone)]
pub struct AllowListRule {
    matchers: Vec<(String, String)>,
}

impl AllowListRule {
    pub fn parse(rule: &str) -> Option<Self> {
        let matchers = rule
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|pair| {
                let (k, v) = pair.split_once('=')?;
                Some((k.trim().to_string(), v.trim().to_string()))
            })
            .collect::<Option<Vec<_>>>()?;
        if matchers.is_empty() {
            None
        } else {
            Some(Self { matchers })
        }
    }

    fn matches(&self, series: &ingestgate_types::model::TimeSeries) -> bool {
        self.matchers
            .iter()
            .all(|(name, value)| series.label_value(name) == Some(value.as_str()))
    }
}

/// The configured transform behavior: what to keep, add, strip.
#[derive(Debug, Clone, Default)]
pub struct TransformConfig {
    pub allow_list: Vec<AllowListRule>,
    pub added_labels: HashMap<String, String>,
    pub elide_labels: HashSet<String>,
}

/// Runs the full C7 chain over `batch` in place, returning an error if
/// normalization finds duplicate label names in any series (REDESIGN
/// FLAGS §2: the whole batch fails, not just that series).
pub fn apply(config: &TransformConfig, batch: &mut MetricBatch) -> Result<(), TransformError> {
    // 1. Allow-list filter: non-matching series are dropped, not an error.
    if !config.allow_list.is_empty() {
        batch
            .series
            .retain(|series| config.allow_list.iter().any(|rule| rule.matches(series)));
    }

    // 2. Label injection.
    for series in &mut batch.series {
        for (name, value) in &config.added_labels {
            series.set_label(name, value);
        }
    }

    // 3. Label elision.
    if !config.elide_labels.is_empty() {
        for series in &mut batch.series {
            series.remove_labels(&config.elide_labels);
        }
    }

    // 4. Normalization: sort by name, reject duplicates.
    for series in &mut batch.series {
        if !series.normalize() {
            let dup = series
                .labels
                .windows(2)
                .find(|w| w[0].name == w[1].name)
                .map(|w| w[0].name.clone())
                .unwrap_or_default();
            return Err(TransformError::DuplicateLabel(dup));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestgate_types::model::{Label, TimeSeries};

    fn series(labels: &[(&str, &str)]) -> TimeSeries {
        TimeSeries {
            labels: labels
                .iter()
                .map(|(k, v)| Label::new(*k, *v))
                .collect(),
            samples: vec![],
        }
    }

    #[test]
    fn allow_list_drops_non_matching_series_without_erroring() {
        let config = TransformConfig {
            allow_list: vec![AllowListRule::parse("__name__=up").unwrap()],
            ..Default::default()
        };
        let mut batch = MetricBatch {
            series: vec![series(&[("__name__", "up")]), series(&[("__name__", "down")])],
        };
        apply(&config, &mut batch).unwrap();
        assert_eq!(batch.series.len(), 1);
        assert_eq!(batch.series[0].label_value("__name__"), Some("up"));
    }

    #[test]
    fn injects_and_elides_labels() {
        let mut added = HashMap::new();
        added.insert("region".to_string(), "us".to_string());
        let mut elide = HashSet::new();
        elide.insert("internal".to_string());
        let config = TransformConfig {
            allow_list: vec![],
            added_labels: added,
            elide_labels: elide,
        };
        let mut batch = MetricBatch {
            series: vec![series(&[("__name__", "up"), ("internal", "secret")])],
        };
        apply(&config, &mut batch).unwrap();
        let out = &batch.series[0];
        assert_eq!(out.label_value("region"), Some("us"));
        assert_eq!(out.label_value("internal"), None);
    }

    #[test]
    fn normalization_sorts_labels_and_rejects_duplicates() {
        let config = TransformConfig::default();
        let mut ok = MetricBatch {
            series: vec![series(&[("b", "1"), ("a", "2")])],
        };
        apply(&config, &mut ok).unwrap();
        assert_eq!(ok.series[0].labels[0].name, "a");

        let mut with_dup = MetricBatch {
            series: vec![TimeSeries {
                labels: vec![Label::new("a", "1"), Label::new("a", "2")],
                samples: vec![],
            }],
        };
        assert!(apply(&config, &mut with_dup).is_err());
    }

    #[test]
    fn preserves_series_order() {
        let config = TransformConfig::default();
        let mut batch = MetricBatch {
            series: vec![
                series(&[("__name__", "a")]),
                series(&[("__name__", "b")]),
                series(&[("__name__", "c")]),
            ],
        };
        apply(&config, &mut batch).unwrap();
        let names: Vec<_> = batch
            .series
            .iter()
            .map(|s| s.label_value("__name__").unwrap())
            .collect();
        assert_eq!(names, vec!["a", "b", "c"]);
    }
}
