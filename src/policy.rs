//! When does a change reach the strip?
//!
//! Two independent switches decide:
//! - `UpdateMode::Auto` refreshes after every mutation, `Manual` waits for an
//!   explicit flush so a burst of changes shows up as one frame.
//! - The suppression flag turns every flush into a no-op, manual ones
//!   included. It models another subsystem (Bluetooth on the original board)
//!   borrowing the data pin.

use serde::{Deserialize, Serialize};

#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, utoipa::ToSchema,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    Manual,
    #[default]
    Auto,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct UpdatePolicy {
    mode: UpdateMode,
    suppressed: bool,
}

impl UpdatePolicy {
    pub fn new(mode: UpdateMode, suppressed: bool) -> Self {
        Self { mode, suppressed }
    }

    pub fn mode(&self) -> UpdateMode {
        self.mode
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppressed
    }

    pub fn set_mode(&mut self, mode: UpdateMode) {
        self.mode = mode;
    }

    pub fn set_suppressed(&mut self, suppressed: bool) {
        self.suppressed = suppressed;
    }

    /// Should the strip be refreshed now that the buffer changed?
    pub fn should_flush_after_mutation(&self) -> bool {
        self.mode == UpdateMode::Auto && !self.suppressed
    }

    /// May an explicit flush go through?
    pub fn may_flush(&self) -> bool {
        !self.suppressed
    }
}
