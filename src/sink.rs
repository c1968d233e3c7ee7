//! The device seam: anything that can push a frame of colors to a strip.
//!
//! The controller never talks to hardware directly. It hands a finished,
//! brightness-scaled frame to a `DeviceSink` and reports whatever error comes
//! back. Three sinks ship with the crate:
//! - `MemorySink` keeps every frame (tests, headless server)
//! - `TerminalSink` paints each frame as a row of truecolor blocks
//! - `LogSink` writes each frame to the log as hex

use std::io::Write;

use crate::Color;
use crate::band::Pin;
use crate::error::DeviceError;

/// Driver for one physical strip.
///
/// # Rust concept: trait default methods
/// `attach` has a default body, so a sink that doesn't care which pin it
/// serves only has to implement `write`.
pub trait DeviceSink {
    /// Called once, when the band is bound to its pin and length.
    fn attach(&mut self, _pin: Pin, _count: usize) {}

    /// Transmit one frame. Runs to completion or fails; no partial frames.
    fn write(&mut self, pixels: &[Color]) -> Result<(), DeviceError>;
}

impl<S: DeviceSink + ?Sized> DeviceSink for Box<S> {
    fn attach(&mut self, pin: Pin, count: usize) {
        (**self).attach(pin, count);
    }

    fn write(&mut self, pixels: &[Color]) -> Result<(), DeviceError> {
        (**self).write(pixels)
    }
}

// ── Memory ─────────────────────────────────────────────────────────

/// Records frames instead of sending them anywhere.
#[derive(Debug, Default)]
pub struct MemorySink {
    attached: Option<(Pin, usize)>,
    frames: Vec<Vec<Color>>,
    pending_failure: Option<String>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pin and length the sink was attached with, if any.
    pub fn attached(&self) -> Option<(Pin, usize)> {
        self.attached
    }

    /// Every frame written so far, oldest first.
    pub fn frames(&self) -> &[Vec<Color>] {
        &self.frames
    }

    pub fn last_frame(&self) -> Option<&[Color]> {
        self.frames.last().map(Vec::as_slice)
    }

    /// Make the next `write` fail with a transport error.
    pub fn fail_next_write(&mut self, message: impl Into<String>) {
        self.pending_failure = Some(message.into());
    }
}

impl DeviceSink for MemorySink {
    fn attach(&mut self, pin: Pin, count: usize) {
        self.attached = Some((pin, count));
    }

    fn write(&mut self, pixels: &[Color]) -> Result<(), DeviceError> {
        if let Some(message) = self.pending_failure.take() {
            return Err(DeviceError::Transport(message));
        }
        self.frames.push(pixels.to_vec());
        Ok(())
    }
}

// ── Terminal ───────────────────────────────────────────────────────

/// Paints each frame as one line of ANSI truecolor blocks.
///
/// Generic over `Write` so tests can render into a `Vec<u8>`.
pub struct TerminalSink<W: Write> {
    out: W,
}

impl<W: Write> TerminalSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

impl TerminalSink<std::io::Stdout> {
    pub fn stdout() -> Self {
        Self::new(std::io::stdout())
    }
}

impl<W: Write> DeviceSink for TerminalSink<W> {
    fn write(&mut self, pixels: &[Color]) -> Result<(), DeviceError> {
        // Carriage return rather than newline: each frame overwrites the last
        write!(self.out, "\r")?;
        for c in pixels {
            write!(self.out, "\x1b[48;2;{};{};{}m  ", c.r, c.g, c.b)?;
        }
        write!(self.out, "\x1b[0m")?;
        self.out.flush()?;
        Ok(())
    }
}

// ── Log ────────────────────────────────────────────────────────────

/// Logs every frame at INFO as a list of `#RRGGBB` values.
#[derive(Debug, Default)]
pub struct LogSink {
    pin: Option<Pin>,
}

impl DeviceSink for LogSink {
    fn attach(&mut self, pin: Pin, count: usize) {
        tracing::info!("Log sink attached to pin {} ({} pixels)", pin, count);
        self.pin = Some(pin);
    }

    fn write(&mut self, pixels: &[Color]) -> Result<(), DeviceError> {
        let hex: Vec<String> = pixels
            .iter()
            .map(|c| format!("#{:06X}", c.packed()))
            .collect();
        let pin = self.pin.unwrap_or_default();
        tracing::info!("Frame on pin {}: [{}]", pin, hex.join(" "));
        Ok(())
    }
}
