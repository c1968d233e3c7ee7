//! Render thread: owns the band controller and processes commands via a channel.
//!
//! The controller is single-threaded by design, so all band operations happen
//! on one dedicated thread. The async HTTP server communicates with this
//! thread by sending `BandRequest` values through an `mpsc` channel, and each
//! request carries a oneshot sender for its result.
//!
//! Because a command (mutation plus any flush it triggers) runs to completion
//! before the next one is read, no other caller can ever observe or flush a
//! half-updated buffer.
//!
//! ## Rust concepts
//! - `std::sync::mpsc` channels for thread communication
//! - `tokio::sync::oneshot` to hand a result back to an async caller
//! - `enum` with data variants (tagged unions)
//! - `Arc<Mutex<T>>` for shared mutable state

use crate::band::Pin;
use crate::controller::BandController;
use crate::error::BandError;
use crate::policy::UpdateMode;
use crate::sink::DeviceSink;
use serde::Serialize;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use tokio::sync::oneshot;

// ── Commands ─────────────────────────────────────────────────────────

/// Operations the render thread performs on the band.
///
/// Colors travel packed as `0xRRGGBB`, exactly like the controller API.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BandCommand {
    /// Bind the band (first request wins)
    Bind { pin: Pin, count: usize },
    /// Set every pixel
    SetAll(u32),
    /// All pixels off
    Clear,
    /// Set one pixel
    SetPixel { index: u32, color: u32 },
    /// Hue gradient across the band
    Rainbow,
    /// Move colors toward higher indices, dropping overflow
    Shift(i32),
    /// Move colors toward higher indices, wrapping around
    Rotate(i32),
    /// Brightness, clamped to 0-255
    SetBrightness(i32),
    /// Switch between automatic and batched refresh
    SetMode(UpdateMode),
    /// Push the current frame to the strip now
    Flush,
    /// Bluetooth on suppresses all strip output
    SetBluetooth(bool),
}

/// A command plus the channel its result goes back on.
pub struct BandRequest {
    pub command: BandCommand,
    pub reply: oneshot::Sender<Result<(), BandError>>,
}

impl BandRequest {
    pub fn new(command: BandCommand) -> (Self, oneshot::Receiver<Result<(), BandError>>) {
        let (reply, rx) = oneshot::channel();
        (Self { command, reply }, rx)
    }
}

// ── Status ───────────────────────────────────────────────────────────

/// Snapshot of the controller that the HTTP server can read without
/// talking to the render thread.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, utoipa::ToSchema)]
pub struct BandStatus {
    /// Pin the band is bound to (null until first use)
    pub pin: Option<Pin>,
    /// Number of pixels (null until first use)
    pub count: Option<usize>,
    /// Current brightness (0-255, null until first use)
    pub brightness: Option<u8>,
    /// Current update mode
    pub mode: UpdateMode,
    /// Whether strip output is suppressed (Bluetooth on)
    pub suppressed: bool,
    /// Frames written to the device so far
    pub flushes: u64,
    /// Server version
    pub version: String,
}

impl BandStatus {
    pub fn new() -> Self {
        Self {
            pin: None,
            count: None,
            brightness: None,
            mode: UpdateMode::default(),
            suppressed: false,
            flushes: 0,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// Refresh every field from the controller.
    pub fn update_from<S: DeviceSink>(&mut self, controller: &BandController<S>) {
        let band = controller.band();
        self.pin = band.map(|b| b.pin());
        self.count = band.map(|b| b.count());
        self.brightness = band.map(|b| b.brightness());
        self.mode = controller.mode();
        self.suppressed = controller.is_suppressed();
        self.flushes = controller.flush_count();
    }
}

// ── Command dispatch ─────────────────────────────────────────────────

/// Run one command against the controller.
pub fn apply_command<S: DeviceSink>(
    controller: &mut BandController<S>,
    command: BandCommand,
) -> Result<(), BandError> {
    match command {
        BandCommand::Bind { pin, count } => {
            controller.create_or_bind_band(pin, count)?;
            Ok(())
        }
        BandCommand::SetAll(color) => controller.set_all(color),
        BandCommand::Clear => controller.clear(),
        BandCommand::SetPixel { index, color } => controller.set_pixel(index, color),
        BandCommand::Rainbow => controller.rainbow(),
        BandCommand::Shift(offset) => controller.shift(offset),
        BandCommand::Rotate(offset) => controller.rotate(offset),
        BandCommand::SetBrightness(value) => controller.set_brightness(value),
        BandCommand::SetMode(mode) => {
            controller.set_update_mode(mode);
            Ok(())
        }
        BandCommand::Flush => controller.flush_now(),
        BandCommand::SetBluetooth(enabled) => {
            controller.set_bluetooth_suppression(enabled);
            Ok(())
        }
    }
}

// ── Render loop ──────────────────────────────────────────────────────

/// Main render loop — runs on a dedicated thread, owns the controller.
///
/// Returns the controller once every sender has been dropped, so callers
/// that join the thread can inspect the final state.
pub fn render_loop<S: DeviceSink>(
    rx: Receiver<BandRequest>,
    status: Arc<Mutex<BandStatus>>,
    mut controller: BandController<S>,
) -> BandController<S> {
    tracing::info!("Render thread started, waiting for commands...");
    status.lock().unwrap().update_from(&controller);

    while let Ok(BandRequest { command, reply }) = rx.recv() {
        tracing::debug!("Render thread: {:?}", command);
        let result = apply_command(&mut controller, command);

        if let Err(e) = &result {
            tracing::error!("Band command failed: {}", e);
        }

        status.lock().unwrap().update_from(&controller);

        // The requester may have given up waiting; that's fine
        if reply.send(result).is_err() {
            tracing::debug!("Render thread: requester dropped before reply");
        }
    }

    tracing::info!("Render thread: channel closed, shutting down.");
    controller
}

/// Start the render thread for `controller`.
///
/// Returns the command sender, the shared status and the thread handle.
pub fn spawn_render_thread<S>(
    controller: BandController<S>,
) -> (
    Sender<BandRequest>,
    Arc<Mutex<BandStatus>>,
    JoinHandle<BandController<S>>,
)
where
    S: DeviceSink + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    let status = Arc::new(Mutex::new(BandStatus::new()));
    let render_status = status.clone();
    let handle = thread::spawn(move || render_loop(rx, render_status, controller));
    (tx, status, handle)
}
