mod common;

use common::*;
use navfix_core::{StreamTag, pipeline};
use std::time::Duration;

#[tokio::test]
async fn test_corrupt_record_does_not_stall_the_stream() {
    // A corrupt heading record between two valid positions: both positions
    // still produce fixes using the last-known-good heading.
    let envelopes = run_scripted(vec![
        heading_record(3.474),
        ground_speed_record(0.756),
        position_record(58.1, 12.1),
        corrupt_record(StreamTag::Heading),
        position_record(58.2, 12.2),
    ])
    .await;

    assert_eq!(envelopes.len(), 2);
    for envelope in &envelopes {
        assert_eq!(envelope.message.heading, heading_degrees(3.474));
    }
}

#[tokio::test]
async fn test_corrupt_records_on_every_stream_are_isolated() {
    let envelopes = run_scripted(vec![
        corrupt_record(StreamTag::Position),
        corrupt_record(StreamTag::Heading),
        corrupt_record(StreamTag::SpeedOverGround),
        heading_record(1.0),
        ground_speed_record(0.5),
        position_record(58.1, 12.1),
    ])
    .await;

    assert_eq!(envelopes.len(), 1);
    assert_eq!(envelopes[0].message.latitude, 58.1);
}

#[tokio::test]
async fn test_streams_on_separate_channels() {
    // The production wiring: one channel per physical source, one decode
    // task each, all feeding the shared combiner.
    let (position_tx, position_rx) = flume::bounded(8);
    let (heading_tx, heading_rx) = flume::bounded(8);
    let (speed_tx, speed_rx) = flume::bounded(8);
    let (envelope_tx, envelope_rx) = flume::unbounded();

    let pipeline = tokio::spawn(pipeline::run(
        vec![position_rx, heading_rx, speed_rx],
        envelope_tx,
    ));

    heading_tx.send_async(heading_record(3.474)).await.unwrap();
    speed_tx
        .send_async(ground_speed_record(0.756))
        .await
        .unwrap();

    // Give the secondaries time to reach the latches before the positions
    // race them through a different decode task.
    tokio::time::sleep(Duration::from_millis(50)).await;

    position_tx
        .send_async(position_record(58.141195, 12.125421))
        .await
        .unwrap();
    position_tx
        .send_async(position_record(58.141200, 12.125430))
        .await
        .unwrap();

    drop(position_tx);
    drop(heading_tx);
    drop(speed_tx);
    pipeline.await.unwrap().unwrap();

    let envelopes: Vec<_> = envelope_rx.drain().collect();
    assert_eq!(envelopes.len(), 2);
    assert_eq!(envelopes[0].message.latitude, 58.141195);
    assert_eq!(envelopes[1].message.latitude, 58.141200);
    for envelope in &envelopes {
        assert_eq!(envelope.message.sog, sog_knots(0.756));
    }
}

#[tokio::test]
async fn test_pipeline_stops_when_sink_goes_away() {
    let (record_tx, record_rx) = flume::bounded(8);
    let (envelope_tx, envelope_rx) = flume::bounded(1);

    let pipeline = tokio::spawn(pipeline::run(vec![record_rx], envelope_tx));

    record_tx.send_async(heading_record(3.474)).await.unwrap();
    record_tx
        .send_async(ground_speed_record(0.756))
        .await
        .unwrap();
    record_tx
        .send_async(position_record(58.1, 12.1))
        .await
        .unwrap();

    let first = envelope_rx.recv_async().await.unwrap();
    assert_eq!(first.message.latitude, 58.1);

    // Sink disappears; the next emission must end the pipeline even though
    // the record sender stays open.
    drop(envelope_rx);
    record_tx
        .send_async(position_record(58.2, 12.2))
        .await
        .unwrap();

    pipeline.await.unwrap().unwrap();
}

#[tokio::test]
async fn test_emission_follows_primary_arrival_order() {
    let mut records = vec![heading_record(1.0), ground_speed_record(1.0)];
    for i in 0..50 {
        records.push(position_record(58.0 + f64::from(i) * 0.001, 12.0));
    }

    let envelopes = run_scripted(records).await;

    assert_eq!(envelopes.len(), 50);
    for (i, envelope) in envelopes.iter().enumerate() {
        assert_eq!(envelope.message.latitude, 58.0 + (i as f64) * 0.001);
    }
}
