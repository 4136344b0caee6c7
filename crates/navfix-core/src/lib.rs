//! Combine-latest fusion of raw navigation telemetry into fix envelopes.
//!
//! Three bus streams (position, heading and speed over ground) arrive
//! independently and at different rates. The [`Combiner`] latches the
//! latest value of each and emits a [`CombinedFix`] every time the
//! position stream updates, pairing it with the most recent heading and
//! speed even when those are older than the position itself. The
//! [`pipeline`] module wires the decode, combine and encode stages over
//! channels so each raw record is processed start-to-finish without one
//! bad message ever stopping the flow.
//!
//! ```rust
//! use navfix_core::{Combiner, NormalizedSample};
//!
//! let mut combiner = Combiner::new();
//!
//! // Heading and speed only latch.
//! assert!(combiner.update(NormalizedSample::Heading { degrees: 199.0 }).is_none());
//! assert!(combiner.update(NormalizedSample::SpeedOverGround { knots: 1.47 }).is_none());
//!
//! // A position update emits, carrying the latched values.
//! let fix = combiner
//!     .update(NormalizedSample::Position { latitude: 58.14, longitude: 12.12 })
//!     .expect("all three streams have reported");
//! assert_eq!(fix.heading_degrees, 199.0);
//! assert_eq!(fix.sog_knots, 1.47);
//! ```

pub mod combine;
pub mod decode;
pub mod encode;
pub mod pipeline;
mod types;

pub use combine::Combiner;
pub use decode::{DecodeError, MPS_TO_KNOTS, decode};
pub use encode::encode;
pub use types::{CombinedFix, FixPayload, NormalizedSample, OutputEnvelope, RawRecord, StreamTag};
