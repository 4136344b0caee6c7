use navfix_core::decode::{GroundSpeedReading, HeadingReading, PositionReading};
use navfix_core::{RawRecord, StreamTag, pipeline};
use serde::Serialize;

fn record<T: Serialize>(tag: StreamTag, reading: &T) -> eyre::Result<RawRecord> {
    Ok(RawRecord::new(tag, rmp_serde::to_vec_named(reading)?))
}

#[tokio::main]
async fn main() -> eyre::Result<()> {
    // A single input channel keeps the scripted arrival order.
    let (record_tx, record_rx) = flume::bounded(16);
    let (envelope_tx, envelope_rx) = flume::unbounded();

    let pipeline = tokio::spawn(pipeline::run(vec![record_rx], envelope_tx));

    let records = [
        record(
            StreamTag::Position,
            &PositionReading {
                latitude: 58.141195,
                longitude: 12.125421,
            },
        )?,
        record(
            StreamTag::Heading,
            &HeadingReading {
                north_heading: 3.474,
            },
        )?,
        record(
            StreamTag::SpeedOverGround,
            &GroundSpeedReading {
                ground_speed: 0.756,
            },
        )?,
        record(
            StreamTag::Position,
            &PositionReading {
                latitude: 58.141200,
                longitude: 12.125430,
            },
        )?,
    ];
    for record in records {
        record_tx.send_async(record).await?;
    }
    drop(record_tx);

    pipeline.await??;

    for envelope in envelope_rx.drain() {
        println!("{}", serde_json::to_string_pretty(&envelope)?);
    }

    Ok(())
}
