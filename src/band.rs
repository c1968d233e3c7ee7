//! The band: one pixel buffer bound to a data pin.
//!
//! A `Band` knows its pin, its pixel count and its brightness. It mutates its
//! buffer on request but never decides when the strip gets refreshed; that is
//! the controller's job (see `policy`).
//!
//! `BandRegistry` is the lazy binder. The first request fixes pin and count
//! for the lifetime of the registry; later requests get the same band back.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Color;
use crate::error::BandError;
use crate::pixels::PixelBuffer;

/// Pixel count used when a band is touched before anyone bound it.
pub const DEFAULT_PIXEL_COUNT: usize = 50;

/// Longest band the controller will allocate a buffer for.
pub const MAX_PIXEL_COUNT: usize = 4096;

/// Brightness of a freshly bound band: full, so colors show as set.
pub const DEFAULT_BRIGHTNESS: u8 = 255;

/// Identifier of the data pin the strip hangs off.
///
/// # Rust concept: newtype
/// Wrapping the raw number in its own type means a pixel index can never be
/// passed where a pin is expected, at zero runtime cost.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize, utoipa::ToSchema,
)]
#[serde(transparent)]
pub struct Pin(pub u8);

impl fmt::Display for Pin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Band {
    pin: Pin,
    buffer: PixelBuffer,
    brightness: u8,
}

impl Band {
    pub fn new(pin: Pin, count: usize) -> Self {
        Self {
            pin,
            buffer: PixelBuffer::new(count),
            brightness: DEFAULT_BRIGHTNESS,
        }
    }

    pub fn pin(&self) -> Pin {
        self.pin
    }

    pub fn count(&self) -> usize {
        self.buffer.len()
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn buffer(&self) -> &PixelBuffer {
        &self.buffer
    }

    /// Store a new brightness, clamped into 0-255.
    pub fn set_brightness(&mut self, brightness: i32) {
        self.brightness = brightness.clamp(0, u8::MAX as i32) as u8;
    }

    pub fn set_all(&mut self, color: Color) {
        self.buffer.fill(color);
    }

    pub fn set_pixel(&mut self, index: usize, color: Color) -> Result<(), BandError> {
        self.buffer.set_pixel(index, color)
    }

    pub fn clear(&mut self) {
        self.buffer.fill(Color::BLACK);
    }

    pub fn rainbow(&mut self) {
        self.buffer.rainbow();
    }

    pub fn shift(&mut self, offset: i32) {
        self.buffer.shift(offset);
    }

    pub fn rotate(&mut self, offset: i32) {
        self.buffer.rotate(offset);
    }

    /// What the strip should show right now: the buffer at current brightness.
    pub fn frame(&self) -> Vec<Color> {
        self.buffer.scaled(self.brightness)
    }
}

/// Holds at most one band, created on first request.
///
/// # Rust concept: Option as a write-once slot
/// `get_or_insert_with` runs the closure only while the slot is empty, which
/// is precisely "first call wins". Nothing ever sets the slot back to `None`.
#[derive(Debug, Default)]
pub struct BandRegistry {
    slot: Option<Band>,
}

impl BandRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self) -> Option<&Band> {
        self.slot.as_ref()
    }

    /// Return the band, binding it to `pin`/`count` if this is the first request.
    ///
    /// The second element is `true` when this call performed the binding.
    /// A later request with different parameters is dropped, not merged.
    /// Binding more than `MAX_PIXEL_COUNT` pixels fails and leaves the
    /// registry unbound.
    pub fn create_or_bind(
        &mut self,
        pin: Pin,
        count: usize,
    ) -> Result<(&mut Band, bool), BandError> {
        let created = self.slot.is_none();
        if created && count > MAX_PIXEL_COUNT {
            return Err(BandError::TooManyPixels {
                count,
                max: MAX_PIXEL_COUNT,
            });
        }
        let band = self.slot.get_or_insert_with(|| Band::new(pin, count));

        if created {
            tracing::info!("Band bound to pin {} with {} pixels", pin, count);
        } else if band.pin() != pin || band.count() != count {
            tracing::debug!(
                "Ignoring band request for pin {} with {} pixels; already bound to pin {} with {}",
                pin,
                count,
                band.pin(),
                band.count()
            );
        }

        Ok((band, created))
    }
}
