use navfix_core::decode::{GroundSpeedReading, HeadingReading, PositionReading};
use navfix_core::{OutputEnvelope, RawRecord, StreamTag, pipeline};
use serde::Serialize;

fn wire<T: Serialize>(tag: StreamTag, reading: &T) -> RawRecord {
    RawRecord::new(tag, rmp_serde::to_vec_named(reading).unwrap())
}

pub fn position_record(latitude: f64, longitude: f64) -> RawRecord {
    wire(
        StreamTag::Position,
        &PositionReading {
            latitude,
            longitude,
        },
    )
}

pub fn heading_record(north_heading: f32) -> RawRecord {
    wire(StreamTag::Heading, &HeadingReading { north_heading })
}

pub fn ground_speed_record(ground_speed: f32) -> RawRecord {
    wire(
        StreamTag::SpeedOverGround,
        &GroundSpeedReading { ground_speed },
    )
}

/// A payload no reading schema accepts.
#[allow(dead_code)]
pub fn corrupt_record(tag: StreamTag) -> RawRecord {
    RawRecord::new(tag, b"garbage".to_vec())
}

/// Heading conversion as the decoder performs it: the f32 wire value
/// widened to f64, then radians to degrees.
#[allow(dead_code)]
pub fn heading_degrees(north_heading: f32) -> f64 {
    f64::from(north_heading).to_degrees()
}

/// Speed conversion as the decoder performs it.
#[allow(dead_code)]
pub fn sog_knots(ground_speed: f32) -> f64 {
    f64::from(ground_speed) * navfix_core::MPS_TO_KNOTS
}

/// Run the pipeline over one scripted arrival sequence and collect every
/// emitted envelope.
///
/// All records go through a single input channel so the scripted order is
/// exactly the arrival order the combiner observes.
pub async fn run_scripted(records: Vec<RawRecord>) -> Vec<OutputEnvelope> {
    let (record_tx, record_rx) = flume::bounded(records.len().max(1));
    let (envelope_tx, envelope_rx) = flume::unbounded();

    for record in records {
        record_tx.send(record).unwrap();
    }
    drop(record_tx);

    pipeline::run(vec![record_rx], envelope_tx).await.unwrap();
    envelope_rx.drain().collect()
}
