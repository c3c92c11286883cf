//! Deck Session Module
//!
//! The [`Deck`] owns everything a running tape machine needs: the engine
//! clock, the tape collection, the optional live input and the active
//! recording. Front ends drive it with tape ids and poll it for positions.

mod deck;

use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::engine::TransportState;
use crate::error::ReelError;

pub use deck::{Deck, ProgressCallback, RecordingEvent};

/// Stable identifier of a tape within a deck
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TapeId(pub u64);

impl fmt::Display for TapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tape-{}", self.0)
    }
}

/// Snapshot of one tape's position for the UI poll
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PositionReport {
    pub id: TapeId,
    /// Position as a fraction of the duration, in [0, 1)
    pub fraction: f64,
    pub position_secs: f64,
    pub duration_secs: f64,
    /// `"{position} / {duration}"`
    pub label: String,
    pub state: TransportState,
}

/// Outcome of [`Deck::preload`]
///
/// Failed files do not stop the remaining loads.
#[derive(Debug, Default)]
pub struct PreloadReport {
    pub loaded: Vec<TapeId>,
    pub failed: Vec<(PathBuf, ReelError)>,
}

impl PreloadReport {
    /// Check whether every file loaded
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}
