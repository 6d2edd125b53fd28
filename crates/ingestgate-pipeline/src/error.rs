use thiserror::Error;

/// Errors from the metric transform chain and structural label validator
/// (C6, C7, §4.6, §4.7).
#[derive(Debug, Error)]
pub enum TransformError {
    #[error("series is missing required label {0:?}")]
    MissingRequiredLabel(String),
    #[error("series has duplicate label name {0:?}")]
    DuplicateLabel(String),
}

/// Errors from the remote-write forwarder (C9, §4.9).
#[derive(Debug, Error)]
pub enum ForwardError {
    #[error("connecting to the upstream remote-write receiver timed out or failed: {0}")]
    Transient(#[source] reqwest::Error),
}
