//! Streaming event types.
//!
//! Updates are serializable so consumers can forward them as JSON lines
//! instead of consuming them in-process.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifies one assistant turn across chunks, passes, and updates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for TurnId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TurnId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// One render pass delivered to the sink.
///
/// The sink (DOM owner, printer, test harness) replaces the turn's displayed
/// content with `html`. Updates for a turn arrive in non-decreasing
/// buffer-length order; exactly one update has `is_final` set, and it covers
/// the complete buffer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderUpdate {
    pub turn_id: TurnId,
    pub html: String,
    pub is_final: bool,
}
