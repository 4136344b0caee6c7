//! Message types shared across the pipeline stages.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

/// Identifies which physical bus source a raw record originated from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamTag {
    Position,
    Heading,
    SpeedOverGround,
}

impl StreamTag {
    /// All tags, in the order the pipeline conventionally wires them.
    pub const ALL: [StreamTag; 3] = [
        StreamTag::Position,
        StreamTag::Heading,
        StreamTag::SpeedOverGround,
    ];
}

impl fmt::Display for StreamTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StreamTag::Position => "position",
            StreamTag::Heading => "heading",
            StreamTag::SpeedOverGround => "speed-over-ground",
        };
        f.write_str(name)
    }
}

/// One raw record as delivered by the transport layer.
///
/// Consumed immediately by the decoder; never retained.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// The source stream this record arrived on.
    pub tag: StreamTag,
    /// Undecoded payload bytes.
    pub payload: Vec<u8>,
}

impl RawRecord {
    pub fn new(tag: StreamTag, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }
}

/// A decoded, unit-normalized sample from one of the input streams.
///
/// The variants carry disjoint fields; the [`Combiner`](crate::Combiner)
/// dispatches on the variant alone.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NormalizedSample {
    /// WGS84 position in decimal degrees.
    Position { latitude: f64, longitude: f64 },
    /// Heading relative to true north, in degrees.
    Heading { degrees: f64 },
    /// Speed over ground, in knots.
    SpeedOverGround { knots: f64 },
}

impl NormalizedSample {
    /// The stream this sample was decoded from.
    pub fn tag(&self) -> StreamTag {
        match self {
            NormalizedSample::Position { .. } => StreamTag::Position,
            NormalizedSample::Heading { .. } => StreamTag::Heading,
            NormalizedSample::SpeedOverGround { .. } => StreamTag::SpeedOverGround,
        }
    }
}

/// A complete navigation fix, produced when the position stream updates.
///
/// `heading_degrees` and `sog_knots` are whatever the latches held at that
/// instant and may be older than the triggering position sample.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CombinedFix {
    pub latitude: f64,
    pub longitude: f64,
    pub heading_degrees: f64,
    pub sog_knots: f64,
    /// Instant the triggering position sample was combined.
    pub observed_at: DateTime<Utc>,
}

/// The published wrapper: a send timestamp plus the fix payload.
#[derive(Debug, Clone, Serialize)]
pub struct OutputEnvelope {
    #[serde(with = "iso8601_micros")]
    pub sent_at: DateTime<Utc>,
    pub message: FixPayload,
}

/// Wire shape of one fix; field names are fixed by the output schema.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct FixPayload {
    pub latitude: f64,
    pub longitude: f64,
    pub heading: f64,
    pub sog: f64,
}

/// `sent_at` wire format: ISO-8601 UTC with microsecond precision and an
/// explicit offset, e.g. `2023-04-18T11:23:43.965988+00:00`.
mod iso8601_micros {
    use chrono::{DateTime, Utc};
    use serde::Serializer;

    const FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.6f%:z";

    pub fn serialize<S>(stamp: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&stamp.format(FORMAT).to_string())
    }
}
