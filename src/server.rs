//! HTTP API server: axum router and request handlers.
//!
//! The server runs on the tokio async runtime while the render thread
//! runs on a plain `std::thread`. Commands go over `std::sync::mpsc`; each
//! one carries a `oneshot` sender so the handler can await the outcome and
//! turn band errors into HTTP status codes.
//!
//! ## Rust concepts
//! - `async fn` and `.await` for non-blocking I/O
//! - axum extractors: `State`, `Json`
//! - Serde `Deserialize` with field defaults for JSON request bodies
//! - `tower-http` middleware for CORS and request tracing

use crate::band::Pin;
use crate::error::BandError;
use crate::policy::UpdateMode;
use crate::render::{BandCommand, BandRequest, BandStatus};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use serde::Deserialize;
use std::sync::mpsc::Sender;
use std::sync::{Arc, Mutex};
use tower_http::cors::CorsLayer;
use tower_http::trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer};
use tracing::Level;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

// ── App State ────────────────────────────────────────────────────────

/// Shared application state, passed to every handler via axum's `State` extractor.
///
/// Rust concept: CLONE for Arc
/// axum clones the state for each request handler, so everything inside
/// must be cheaply cloneable. `Sender` and `Arc` both are.
#[derive(Clone)]
pub struct AppState {
    /// Channel to send commands to the render thread
    pub command_tx: Sender<BandRequest>,
    /// Shared band status (render thread writes, handlers read)
    pub status: Arc<Mutex<BandStatus>>,
}

// ── OpenAPI Documentation ────────────────────────────────────────────

#[derive(OpenApi)]
#[openapi(
    paths(
        get_status,
        post_band,
        post_color,
        post_clear,
        post_pixel,
        post_rainbow,
        post_shift,
        post_rotate,
        post_brightness,
        post_mode,
        post_flush,
        post_bluetooth,
    ),
    components(schemas(
        BandStatus,
        UpdateMode,
        BindRequest,
        ColorRequest,
        PixelRequest,
        OffsetRequest,
        BrightnessRequest,
        ModeRequest,
        BluetoothRequest,
    )),
    tags(
        (name = "band", description = "Pixel and brightness control"),
        (name = "update", description = "Refresh policy and flushing"),
        (name = "system", description = "System status endpoints"),
    ),
    info(
        title = "LED Band API",
        version = env!("CARGO_PKG_VERSION"),
        description = "HTTP API for controlling a single-pin addressable LED band"
    )
)]
pub struct ApiDoc;

// ── Request types ────────────────────────────────────────────────────

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BindRequest {
    /// Data pin the strip is connected to
    #[schema(value_type = u8, example = 0)]
    pin: Pin,
    /// Number of pixels on the strip
    #[schema(example = 50)]
    count: usize,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ColorRequest {
    /// Packed 24-bit color 0xRRGGBB as an integer.
    /// Examples: 16711680 = red, 65280 = green, 255 = blue
    #[schema(example = 16711680)]
    color: u32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct PixelRequest {
    /// Pixel index, 0-based. Must be below the band's pixel count
    #[schema(example = 0)]
    index: u32,
    /// Packed 24-bit color 0xRRGGBB
    #[schema(example = 65280)]
    color: u32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct OffsetRequest {
    /// Number of positions to move. Negative moves toward pixel 0
    #[serde(default = "default_offset")]
    #[schema(example = 1, default = 1)]
    offset: i32,
}

fn default_offset() -> i32 {
    1
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BrightnessRequest {
    /// Brightness level (0-255). Out-of-range values are clamped
    #[schema(example = 128, minimum = 0, maximum = 255)]
    value: i32,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct ModeRequest {
    /// "auto" refreshes after every change, "manual" waits for POST /api/v1/flush
    mode: UpdateMode,
}

#[derive(Deserialize, utoipa::ToSchema)]
pub struct BluetoothRequest {
    /// true suppresses all strip output while Bluetooth holds the pin
    enabled: bool,
}

// ── Router ───────────────────────────────────────────────────────────

/// Build the axum router with all API endpoints.
pub fn create_router(state: AppState) -> Router {
    let swagger_config =
        utoipa_swagger_ui::Config::new(["/api-docs/openapi.json"]).validator_url("none");
    Router::new()
        .merge(
            SwaggerUi::new("/docs")
                .url("/api-docs/openapi.json", ApiDoc::openapi())
                .config(swagger_config),
        )
        .route("/api/v1/status", get(get_status))
        .route("/api/v1/band", post(post_band))
        .route("/api/v1/band/color", post(post_color))
        .route("/api/v1/band/clear", post(post_clear))
        .route("/api/v1/band/pixel", post(post_pixel))
        .route("/api/v1/band/rainbow", post(post_rainbow))
        .route("/api/v1/band/shift", post(post_shift))
        .route("/api/v1/band/rotate", post(post_rotate))
        .route("/api/v1/brightness", post(post_brightness))
        .route("/api/v1/mode", post(post_mode))
        .route("/api/v1/flush", post(post_flush))
        .route("/api/v1/bluetooth", post(post_bluetooth))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
        .layer(CorsLayer::permissive())
        .with_state(state)
}

// ── Dispatch ─────────────────────────────────────────────────────────

/// Map a band error to the HTTP response the client sees.
fn band_error_response(err: BandError) -> (StatusCode, String) {
    match err {
        BandError::IndexOutOfRange { .. } | BandError::TooManyPixels { .. } => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        BandError::Device(_) => (StatusCode::BAD_GATEWAY, err.to_string()),
    }
}

fn render_thread_gone() -> (StatusCode, String) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        "Render thread gone".to_string(),
    )
}

/// Send a command to the render thread and wait for its result.
async fn dispatch(
    state: &AppState,
    command: BandCommand,
) -> Result<StatusCode, (StatusCode, String)> {
    let (request, reply) = BandRequest::new(command);
    state
        .command_tx
        .send(request)
        .map_err(|_| render_thread_gone())?;

    reply
        .await
        .map_err(|_| render_thread_gone())?
        .map_err(band_error_response)?;

    Ok(StatusCode::OK)
}

// ── Handlers ─────────────────────────────────────────────────────────

/// GET /api/v1/status — return current band state
#[utoipa::path(
    get,
    path = "/api/v1/status",
    tag = "system",
    responses(
        (status = 200, description = "Current band status", body = BandStatus)
    )
)]
async fn get_status(State(state): State<AppState>) -> Json<BandStatus> {
    let status = state.status.lock().unwrap().clone();
    Json(status)
}

/// POST /api/v1/band — bind the band to a pin and length (first call wins)
#[utoipa::path(
    post,
    path = "/api/v1/band",
    tag = "band",
    request_body = BindRequest,
    responses(
        (status = 200, description = "Band bound, or already bound and left unchanged"),
        (status = 400, description = "Pixel count over the limit and no band bound yet"),
    )
)]
async fn post_band(
    State(state): State<AppState>,
    Json(req): Json<BindRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(
        &state,
        BandCommand::Bind {
            pin: req.pin,
            count: req.count,
        },
    )
    .await
}

/// POST /api/v1/band/color — set every pixel to one color
#[utoipa::path(
    post,
    path = "/api/v1/band/color",
    tag = "band",
    request_body = ColorRequest,
    responses(
        (status = 200, description = "Color set"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_color(
    State(state): State<AppState>,
    Json(req): Json<ColorRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::SetAll(req.color)).await
}

/// POST /api/v1/band/clear — turn every pixel off
#[utoipa::path(
    post,
    path = "/api/v1/band/clear",
    tag = "band",
    responses(
        (status = 200, description = "Band cleared"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_clear(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::Clear).await
}

/// POST /api/v1/band/pixel — set a single pixel
#[utoipa::path(
    post,
    path = "/api/v1/band/pixel",
    tag = "band",
    request_body = PixelRequest,
    responses(
        (status = 200, description = "Pixel set"),
        (status = 400, description = "Index out of range"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_pixel(
    State(state): State<AppState>,
    Json(req): Json<PixelRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(
        &state,
        BandCommand::SetPixel {
            index: req.index,
            color: req.color,
        },
    )
    .await
}

/// POST /api/v1/band/rainbow — spread the hue wheel across the band
#[utoipa::path(
    post,
    path = "/api/v1/band/rainbow",
    tag = "band",
    responses(
        (status = 200, description = "Rainbow drawn"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_rainbow(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::Rainbow).await
}

/// POST /api/v1/band/shift — move pixels, dropping those that fall off
#[utoipa::path(
    post,
    path = "/api/v1/band/shift",
    tag = "band",
    request_body = OffsetRequest,
    responses(
        (status = 200, description = "Band shifted"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_shift(
    State(state): State<AppState>,
    Json(req): Json<OffsetRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::Shift(req.offset)).await
}

/// POST /api/v1/band/rotate — move pixels, wrapping around the ends
#[utoipa::path(
    post,
    path = "/api/v1/band/rotate",
    tag = "band",
    request_body = OffsetRequest,
    responses(
        (status = 200, description = "Band rotated"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_rotate(
    State(state): State<AppState>,
    Json(req): Json<OffsetRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::Rotate(req.offset)).await
}

/// POST /api/v1/brightness — set band brightness (0-255)
#[utoipa::path(
    post,
    path = "/api/v1/brightness",
    tag = "band",
    request_body = BrightnessRequest,
    responses(
        (status = 200, description = "Brightness updated"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_brightness(
    State(state): State<AppState>,
    Json(req): Json<BrightnessRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::SetBrightness(req.value)).await
}

/// POST /api/v1/mode — choose automatic or manual refresh
#[utoipa::path(
    post,
    path = "/api/v1/mode",
    tag = "update",
    request_body = ModeRequest,
    responses(
        (status = 200, description = "Mode updated"),
    )
)]
async fn post_mode(
    State(state): State<AppState>,
    Json(req): Json<ModeRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::SetMode(req.mode)).await
}

/// POST /api/v1/flush — push the current frame to the strip
#[utoipa::path(
    post,
    path = "/api/v1/flush",
    tag = "update",
    responses(
        (status = 200, description = "Frame written, or skipped while suppressed"),
        (status = 502, description = "Device write failed")
    )
)]
async fn post_flush(State(state): State<AppState>) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::Flush).await
}

/// POST /api/v1/bluetooth — enable or disable Bluetooth (suppresses strip output)
#[utoipa::path(
    post,
    path = "/api/v1/bluetooth",
    tag = "update",
    request_body = BluetoothRequest,
    responses(
        (status = 200, description = "Suppression updated"),
    )
)]
async fn post_bluetooth(
    State(state): State<AppState>,
    Json(req): Json<BluetoothRequest>,
) -> Result<StatusCode, (StatusCode, String)> {
    dispatch(&state, BandCommand::SetBluetooth(req.enabled)).await
}
