//! Per-stream decoding of raw bus payloads into normalized samples.
//!
//! Payloads are MessagePack-encoded reading structs; which struct applies
//! is decided by the record's stream tag. Schema conformance is the only
//! validation performed here; physically implausible but well-formed
//! values pass through untouched.

use crate::types::{NormalizedSample, RawRecord, StreamTag};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Conversion factor from metres per second to knots used by the upstream
/// producers. Kept at the truncated 1.944 for parity with them.
pub const MPS_TO_KNOTS: f64 = 1.944;

/// A payload that does not conform to the schema of its stream.
#[derive(Debug, Error)]
#[error("failed to decode a {tag} record")]
pub struct DecodeError {
    /// The stream the record arrived on.
    pub tag: StreamTag,
    /// The underlying deserialization failure.
    #[source]
    pub source: rmp_serde::decode::Error,
}

/// Wire schema of one position reading, decimal degrees.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PositionReading {
    pub latitude: f64,
    pub longitude: f64,
}

/// Wire schema of one heading reading, radians from true north.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeadingReading {
    pub north_heading: f32,
}

/// Wire schema of one ground-speed reading, metres per second.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GroundSpeedReading {
    pub ground_speed: f32,
}

/// Decode one raw record into a unit-normalized sample.
pub fn decode(record: &RawRecord) -> Result<NormalizedSample, DecodeError> {
    let sample = match record.tag {
        StreamTag::Position => {
            let reading: PositionReading = read(record)?;
            NormalizedSample::Position {
                latitude: reading.latitude,
                longitude: reading.longitude,
            }
        }
        StreamTag::Heading => {
            let reading: HeadingReading = read(record)?;
            NormalizedSample::Heading {
                degrees: f64::from(reading.north_heading).to_degrees(),
            }
        }
        StreamTag::SpeedOverGround => {
            let reading: GroundSpeedReading = read(record)?;
            NormalizedSample::SpeedOverGround {
                knots: f64::from(reading.ground_speed) * MPS_TO_KNOTS,
            }
        }
    };
    Ok(sample)
}

fn read<'a, T>(record: &'a RawRecord) -> Result<T, DecodeError>
where
    T: Deserialize<'a>,
{
    rmp_serde::from_slice(&record.payload).map_err(|source| DecodeError {
        tag: record.tag,
        source,
    })
}
