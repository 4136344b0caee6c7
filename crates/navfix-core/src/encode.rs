//! Envelope assembly for the publish sink.

use crate::types::{CombinedFix, FixPayload, OutputEnvelope};
use chrono::Utc;

/// Wrap a fix for publishing.
///
/// `sent_at` is the wall clock at encode time, not the instant the fix was
/// combined; apart from that clock read this is a pure field mapping.
pub fn encode(fix: &CombinedFix) -> OutputEnvelope {
    OutputEnvelope {
        sent_at: Utc::now(),
        message: FixPayload {
            latitude: fix.latitude,
            longitude: fix.longitude,
            heading: fix.heading_degrees,
            sog: fix.sog_knots,
        },
    }
}
