//! navfix-node: bus navigation telemetry to MQTT bridge.
//!
//! The node joins a UDP-multicast telemetry bus, routes position, heading
//! and ground-speed records into the `navfix-core` pipeline, and publishes
//! every combined fix as a JSON envelope on a single MQTT topic.
//!
//! Configuration is read from environment variables; see [`config::Config`]
//! for the recognized keys and their defaults. Delivery to the broker is
//! at-most-once: a rejected publish is logged and dropped.

pub mod bus;
pub mod config;
pub mod mqtt;

pub use config::Config;
