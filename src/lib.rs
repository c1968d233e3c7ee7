//! Controller for a single-pin addressable LED band.
//!
//! This module provides the pieces every front end shares:
//! - The `Color` type and packing helpers
//! - Signal handling for clean shutdown
//!
//! The band itself lives in the submodules:
//! - `pixels`: the fixed-length pixel buffer and its transforms
//! - `band`: pin/count/brightness binding plus the lazy registry
//! - `policy`: when a mutation becomes visible on the strip
//! - `sink`: the device driver seam and the in-tree drivers
//! - `controller`: the caller-facing API tying it all together
//!
//! It also re-exports the server and render modules used by the main
//! binary (HTTP API server).

pub mod band;
pub mod config;
pub mod controller;
pub mod error;
pub mod pixels;
pub mod policy;
pub mod render;
pub mod server;
pub mod sink;

pub use band::{Band, BandRegistry, Pin};
pub use config::ControllerConfig;
pub use controller::BandController;
pub use error::{BandError, ConfigError, DeviceError};
pub use pixels::PixelBuffer;
pub use policy::{UpdateMode, UpdatePolicy};
pub use sink::{DeviceSink, LogSink, MemorySink, TerminalSink};

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

// ── Color ──────────────────────────────────────────────────────────

/// One pixel: 8 bits per channel.
///
/// On the wire (and in the caller-facing API) a color travels as a packed
/// 24-bit integer `0xRRGGBB`. Inside the buffer we keep the three channels
/// apart so brightness scaling never has to unpack anything.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const BLACK: Self = Self::new(0, 0, 0);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Unpack a `0xRRGGBB` value. Bits above 24 are ignored.
    pub const fn from_packed(packed: u32) -> Self {
        Self {
            r: ((packed >> 16) & 0xFF) as u8,
            g: ((packed >> 8) & 0xFF) as u8,
            b: (packed & 0xFF) as u8,
        }
    }

    /// Pack back into `0xRRGGBB`.
    pub const fn packed(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }

    /// Create a color from a hue value (0-360), with full saturation and brightness.
    /// Used by the rainbow fill.
    ///
    /// # Rust concept: match expressions
    /// Rust's `match` is exhaustive — the compiler ensures we handle all cases.
    pub fn from_hue(hue: u16) -> Self {
        let hue = hue % 360;
        let sector = hue / 60;
        let fraction = ((hue % 60) as f32) / 60.0;
        let rising = (fraction * 255.0) as u8;
        let falling = ((1.0 - fraction) * 255.0) as u8;

        match sector {
            0 => Self::new(255, rising, 0),  // Red → Yellow
            1 => Self::new(falling, 255, 0), // Yellow → Green
            2 => Self::new(0, 255, rising),  // Green → Cyan
            3 => Self::new(0, falling, 255), // Cyan → Blue
            4 => Self::new(rising, 0, 255),  // Blue → Magenta
            _ => Self::new(255, 0, falling), // Magenta → Red
        }
    }

    /// Scale every channel by `brightness / 255`, rounding down.
    ///
    /// 255 is the identity, 0 is black.
    pub fn apply_brightness(self, brightness: u8) -> Self {
        if brightness == u8::MAX {
            return self;
        }
        let scale = |c: u8| ((c as u16 * brightness as u16) / 255) as u8;
        Self {
            r: scale(self.r),
            g: scale(self.g),
            b: scale(self.b),
        }
    }
}

impl From<u32> for Color {
    fn from(packed: u32) -> Self {
        Self::from_packed(packed)
    }
}

/// Pack three channels into `0xRRGGBB`.
///
/// Each input is masked to its low 8 bits first, so out-of-range values
/// truncate silently instead of bleeding into the neighbouring channel.
pub fn pack_rgb(r: i32, g: i32, b: i32) -> u32 {
    (((r & 0xFF) as u32) << 16) | (((g & 0xFF) as u32) << 8) | (b & 0xFF) as u32
}

// ── Shutdown ───────────────────────────────────────────────────────

/// Set up a Ctrl+C handler that sets `running` to false.
///
/// # Rust concept: Arc and AtomicBool
/// We need to share the `running` flag between the main loop and the
/// signal handler. `Arc` lets multiple owners share data. `AtomicBool` is a
/// thread-safe boolean — no mutex needed for a single bool.
pub fn setup_signal_handler() -> Result<Arc<AtomicBool>, ctrlc::Error> {
    let running = Arc::new(AtomicBool::new(true));
    let r = running.clone();

    ctrlc::set_handler(move || {
        r.store(false, Ordering::SeqCst);
    })?;

    Ok(running)
}

/// Check if the main loop should keep running.
pub fn is_running(running: &AtomicBool) -> bool {
    running.load(Ordering::SeqCst)
}

// ── Tests ──────────────────────────────────────────────────────────
