//! navfix node entry point.

use eyre::Result;
use navfix_core::pipeline;
use navfix_node::{Config, bus, mqtt};
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

/// Capacity of each raw-record stream channel and of the envelope queue.
/// Arrivals beyond this backpressure the bus reader; the kernel then
/// drops excess datagrams, matching the bus's own at-most-once delivery.
const CHANNEL_CAPACITY: usize = 64;

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env()?;

    // RUST_LOG wins over the configured LOG_LEVEL.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .init();

    info!(
        broker_host = %config.mqtt_broker_host,
        broker_port = config.mqtt_broker_port,
        topic = %config.mqtt_base_topic,
        bus_cid = config.bus_cid,
        "starting the navfix bridge"
    );

    // Startup resource acquisition; failures here are the only fatal ones.
    let socket = bus::bind(config.bus_cid).await?;
    let (client, event_loop) = mqtt::connect(&config)?;

    let (position_tx, position_rx) = flume::bounded(CHANNEL_CAPACITY);
    let (heading_tx, heading_rx) = flume::bounded(CHANNEL_CAPACITY);
    let (speed_tx, speed_rx) = flume::bounded(CHANNEL_CAPACITY);
    let (envelope_tx, envelope_rx) = flume::bounded(CHANNEL_CAPACITY);

    let routes = bus::Routes {
        position_id: config.bus_position_id,
        heading_id: config.bus_heading_id,
        ground_speed_id: config.bus_ground_speed_id,
    };
    let senders = bus::StreamSenders {
        position: position_tx,
        heading: heading_tx,
        speed_over_ground: speed_tx,
    };

    let event_task = tokio::spawn(mqtt::drive(event_loop));
    let publish_task = tokio::spawn(mqtt::publish_envelopes(
        client.clone(),
        config.mqtt_base_topic.clone(),
        envelope_rx,
    ));
    let pipeline_task = tokio::spawn(async move {
        if let Err(err) = pipeline::run(vec![position_rx, heading_rx, speed_rx], envelope_tx).await
        {
            error!(cause = %err, "pipeline failed");
        }
    });
    let mut bus_task = tokio::spawn(bus::run(socket, routes, senders));

    info!("all setup done, processing bus messages");

    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!("shutdown signal received"),
        res = &mut bus_task => match res {
            Ok(Ok(())) => info!("bus reader stopped"),
            Ok(Err(err)) => error!(cause = %err, "bus reader failed"),
            Err(err) => error!(cause = %err, "bus reader panicked"),
        },
    }

    // Stop consuming from the bus; the closed stream channels then drain
    // the pipeline and the publisher in order.
    bus_task.abort();
    let _ = pipeline_task.await;
    let _ = publish_task.await;

    client.disconnect().await.ok();
    event_task.abort();

    info!("navfix bridge stopped");
    Ok(())
}
