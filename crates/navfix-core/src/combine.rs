//! The combine-latest synchronization engine.
//!
//! Three independently-rated streams feed one [`Combiner`]. Heading and
//! speed-over-ground samples only replace their latch; a position sample
//! additionally emits a [`CombinedFix`] pairing the new position with
//! whatever heading and speed are latched at that instant. This trades
//! staleness of the secondary fields for never waiting and never
//! buffering, and the asymmetry (only position triggers) is deliberate.

use crate::types::{CombinedFix, NormalizedSample};
use chrono::Utc;

/// Latches the latest sample per stream and emits on position updates.
///
/// One instance lives for the whole process; the latches are never reset.
/// Until every slot has seen a value, position updates latch without
/// emitting, so the output stream starts with a fully-populated fix and
/// carries no placeholder values.
#[derive(Debug, Clone, Default)]
pub struct Combiner {
    position: Option<(f64, f64)>,
    heading_degrees: Option<f64>,
    sog_knots: Option<f64>,
}

impl Combiner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one decoded sample.
    ///
    /// Returns a fix when the sample is a position and all three latches
    /// hold a value. Heading and speed samples never emit.
    pub fn update(&mut self, sample: NormalizedSample) -> Option<CombinedFix> {
        match sample {
            NormalizedSample::Position {
                latitude,
                longitude,
            } => {
                self.position = Some((latitude, longitude));
                self.fix()
            }
            NormalizedSample::Heading { degrees } => {
                self.heading_degrees = Some(degrees);
                None
            }
            NormalizedSample::SpeedOverGround { knots } => {
                self.sog_knots = Some(knots);
                None
            }
        }
    }

    /// Whether every latch has seen at least one sample.
    pub fn is_populated(&self) -> bool {
        self.position.is_some() && self.heading_degrees.is_some() && self.sog_knots.is_some()
    }

    fn fix(&self) -> Option<CombinedFix> {
        let (latitude, longitude) = self.position?;
        Some(CombinedFix {
            latitude,
            longitude,
            heading_degrees: self.heading_degrees?,
            sog_knots: self.sog_knots?,
            observed_at: Utc::now(),
        })
    }
}
