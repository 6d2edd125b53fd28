//! Snappy-framed protobuf codec for remote-write push bodies.
//!
//! Both the v1 legacy push body and the v2 `WriteRequest` share this wire
//! shape (§3, §6), so one codec serves both flows.

use crate::model::MetricBatch;
use crate::WriteRequest;
use prost::Message;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("snappy decompression failed: {0}")]
    Decompress(#[from] snap::Error),
    #[error("protobuf decoding failed: {0}")]
    Decode(#[from] prost::DecodeError),
}

/// Decodes a snappy-compressed protobuf `WriteRequest` body into the
/// in-memory batch model.
pub fn decode_batch(compressed: &[u8]) -> Result<MetricBatch, WireError> {
    let mut decoder = snap::raw::Decoder::new();
    let raw = decoder.decompress_vec(compressed)?;
    let write_request = WriteRequest::decode(raw.as_slice())?;
    Ok(MetricBatch::from(write_request))
}

/// Encodes a batch back into a snappy-compressed protobuf `WriteRequest`,
/// the form C9 forwards upstream.
pub fn encode_batch(batch: MetricBatch) -> Vec<u8> {
    let write_request: WriteRequest = batch.into();
    let raw = write_request.encode_to_vec();
    let mut encoder = snap::raw::Encoder::new();
    encoder
        .compress_vec(&raw)
        .expect("snappy compression of an in-memory buffer cannot fail")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Label, Sample, TimeSeries};

    #[test]
    fn round_trips_a_batch() {
        let batch = MetricBatch {
            series: vec![TimeSeries {
                labels: vec![Label::new("__name__", "up"), Label::new("_id", "cluster-a")],
                samples: vec![Sample {
                    value: 1.0,
                    timestamp_ms: 1_700_000_000_000,
                }],
            }],
        };
        let encoded = encode_batch(batch.clone());
        let decoded = decode_batch(&encoded).unwrap();
        assert_eq!(decoded, batch);
    }

    #[test]
    fn rejects_garbage_bytes() {
        assert!(decode_batch(b"not snappy at all, this should fail to decompress").is_err());
    }
}
