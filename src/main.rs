//! LED Band controller binary
//!
//! Two ways to drive the band:
//! - `serve` runs an HTTP API; any device on the LAN can set colors,
//!   batch changes in manual mode and flush them.
//! - `demo` animates a rotating rainbow in the terminal until Ctrl+C.
//!
//! ## Architecture (serve)
//! - **Render thread** (std::thread): owns the band controller, processes commands
//! - **HTTP server** (tokio/axum): accepts API requests, sends commands via channel
//!
//! ## Usage
//! ```sh
//! led-band serve --config band.json --port 8080 --sink log
//! led-band demo --count 30
//! ```

use clap::{Parser, Subcommand, ValueEnum};
use led_band::render::spawn_render_thread;
use led_band::server::{self, AppState};
use led_band::{
    BandController, ControllerConfig, DeviceSink, LogSink, MemorySink, Pin, TerminalSink,
    UpdateMode, is_running, setup_signal_handler,
};
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

/// LED Band controller
#[derive(Parser)]
#[command(name = "led-band")]
#[command(about = "Controller and HTTP API for a single-pin addressable LED band")]
#[command(version)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Serve the HTTP API
    Serve {
        /// Port to listen on
        #[arg(long, default_value = "8080")]
        port: u16,

        #[command(flatten)]
        band: BandArgs,

        /// Where frames go
        #[arg(long, value_enum, default_value = "log")]
        sink: SinkKind,
    },
    /// Rotate a rainbow around the band in the terminal
    Demo {
        #[command(flatten)]
        band: BandArgs,

        /// Frames per second
        #[arg(long, default_value = "20")]
        fps: u32,
    },
}

/// Band settings shared by every subcommand; flags override the config file.
#[derive(clap::Args)]
struct BandArgs {
    /// JSON config file (pin, count, brightness, mode, bluetooth)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Data pin number
    #[arg(long)]
    pin: Option<u8>,

    /// Number of pixels on the strip
    #[arg(long)]
    count: Option<usize>,

    /// Starting brightness (0-255)
    #[arg(long)]
    brightness: Option<u8>,

    /// Starting update mode
    #[arg(long, value_enum)]
    mode: Option<UpdateMode>,
}

impl BandArgs {
    fn resolve(&self) -> Result<ControllerConfig, Box<dyn std::error::Error>> {
        let mut config = match &self.config {
            Some(path) => ControllerConfig::load(path)?,
            None => ControllerConfig::default(),
        };
        if let Some(pin) = self.pin {
            config.pin = Pin(pin);
        }
        if let Some(count) = self.count {
            config.count = count;
        }
        if let Some(brightness) = self.brightness {
            config.brightness = brightness;
        }
        if let Some(mode) = self.mode {
            config.mode = mode;
        }
        config.validate()?;
        Ok(config)
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum SinkKind {
    /// Log each frame as hex
    Log,
    /// Paint each frame as colored blocks on stdout
    Terminal,
    /// Keep frames in memory only
    Memory,
}

impl SinkKind {
    fn build(self) -> Box<dyn DeviceSink + Send> {
        match self {
            SinkKind::Log => Box::new(LogSink::default()),
            SinkKind::Terminal => Box::new(TerminalSink::stdout()),
            SinkKind::Memory => Box::new(MemorySink::new()),
        }
    }
}

fn main() {
    // Initialize tracing subscriber; RUST_LOG overrides the default level
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false) // Disable ANSI color codes for systemd/journald
        .compact()
        .init();

    let args = Args::parse();

    let result = match args.command {
        Command::Serve { port, band, sink } => {
            band.resolve().and_then(|config| serve(port, config, sink))
        }
        Command::Demo { band, fps } => demo(&band, fps),
    };

    if let Err(e) = result {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

#[tokio::main(flavor = "current_thread")]
async fn serve(
    port: u16,
    config: ControllerConfig,
    sink: SinkKind,
) -> Result<(), Box<dyn std::error::Error>> {
    tracing::info!("LED Band HTTP Server v{}", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        "Default band: pin {}, {} pixels, brightness {}, {:?} mode",
        config.pin,
        config.count,
        config.brightness,
        config.mode
    );
    tracing::info!("Port: {}", port);

    let controller = BandController::with_config(sink.build(), &config);
    let (command_tx, status, render_handle) = spawn_render_thread(controller);

    let app = server::create_router(AppState { command_tx, status });

    let addr = format!("0.0.0.0:{}", port);
    tracing::info!("Listening on http://{}", addr);
    tracing::info!("API Documentation: http://localhost:{}/docs", port);
    tracing::info!("Try: curl http://localhost:{}/api/v1/status", port);

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Run the server — this blocks until the process is killed
    axum::serve(listener, app).await?;

    drop(render_handle);
    Ok(())
}

fn demo(band: &BandArgs, fps: u32) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = band.resolve()?;
    // One frame per tick, not one per mutation
    config.mode = UpdateMode::Manual;

    let running = setup_signal_handler()?;
    let mut controller = BandController::with_config(TerminalSink::stdout(), &config);
    let frame_delay = Duration::from_millis(1000 / fps.max(1) as u64);

    controller.rainbow()?;
    while is_running(&running) {
        controller.flush_now()?;
        controller.rotate(1)?;
        thread::sleep(frame_delay);
    }

    controller.clear()?;
    controller.flush_now()?;
    println!("\nShutting down cleanly.");
    Ok(())
}
