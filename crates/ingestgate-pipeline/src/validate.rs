//! Structural label validation shared by the v1 and v2 paths (C6, §4.6,
//! REDESIGN FLAGS §1).

use ingestgate_types::model::MetricBatch;

use crate::error::TransformError;

/// Asserts that every series in `batch` carries all of `required_names`.
/// A single missing required label on any series fails the whole batch
/// (§4.6: "A single missing required label on any series fails the whole
/// request with 400"). Only presence of the name is checked here — unlike
/// C4's literal value check on `/authorize`, §4.6 asserts names only.
pub fn require_labels<S: AsRef<str>>(
    batch: &MetricBatch,
    required_names: impl IntoIterator<Item = S> + Clone,
) -> Result<(), TransformError> {
    for series in &batch.series {
        for name in required_names.clone() {
            let name = name.as_ref();
            if series.label_value(name).is_none() {
                return Err(TransformError::MissingRequiredLabel(name.to_string()));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ingestgate_types::model::{Label, TimeSeries};

    #[test]
    fn passes_when_every_series_has_every_required_label() {
        let batch = MetricBatch {
            series: vec![TimeSeries {
                labels: vec![Label::new("__name__", "up"), Label::new("_id", "cluster-a")],
                samples: vec![],
            }],
        };
        assert!(require_labels(&batch, ["__name__", "_id"]).is_ok());
    }

    #[test]
    fn fails_the_whole_batch_on_one_missing_label() {
        let batch = MetricBatch {
            series: vec![
                TimeSeries {
                    labels: vec![Label::new("__name__", "up"), Label::new("_id", "cluster-a")],
                    samples: vec![],
                },
                TimeSeries {
                    labels: vec![Label::new("__name__", "up")],
                    samples: vec![],
                },
            ],
        };
        assert!(matches!(
            require_labels(&batch, ["__name__", "_id"]),
            Err(TransformError::MissingRequiredLabel(name)) if name == "_id"
        ));
    }
}
