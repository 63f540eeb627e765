//! # Web server
//!
//! HTTP boundary of the rover. Serves the control page, the camera stream,
//! drive commands and the latest GPS fix.
//!
//! The server runs its own actix system on a dedicated thread so that none of
//! the control loops depend on the async runtime. Each video viewer gets a
//! capture thread of its own which feeds the response through a channel.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use actix_web::{
    error::InternalError,
    http::StatusCode,
    web::{self, Bytes},
    App, HttpResponse, HttpServer,
};
use async_stream::stream;
use log::{debug, error, info};
use serde::Deserialize;
use std::net::{SocketAddr, TcpListener};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tokio::sync::{mpsc, oneshot};

// Internal
use crate::cam::{CamSource, MULTIPART_CONTENT_TYPE};
use crate::drive_ctrl::{DriveCtrl, DriveCtrlError};
use crate::gps::GpsStore;
use comms_if::tc::{CommandRequest, CommandResponse};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const INDEX_HTML: &str = include_str!("../static/index.html");

/// Number of encoded frames buffered per viewer.
const VIEWER_QUEUE_LEN: usize = 2;

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct WebParams {
    pub host: String,
    pub port: u16,

    /// Number of HTTP worker threads
    pub workers: usize,

    /// Time given to open connections when the server stops.
    ///
    /// Units: seconds
    pub shutdown_timeout_s: u64,
}

/// State shared by all request handlers.
pub struct WebState {
    drive: Arc<DriveCtrl>,
    gps: Arc<GpsStore>,
    cam: Option<Arc<CamSource>>,

    /// Viewer threads exit once this is cleared
    running: Arc<AtomicBool>,

    num_viewers: AtomicUsize,
}

/// Handle to the server thread.
pub struct WebServer {
    addr: SocketAddr,
    shutdown: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum WebServerError {
    #[error("Could not bind to {0}:{1}: {2}")]
    Bind(String, u16, std::io::Error),

    #[error("Could not start the server thread: {0}")]
    Spawn(std::io::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Default for WebParams {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".into(),
            port: 5000,
            workers: 2,
            shutdown_timeout_s: 1,
        }
    }
}

impl WebState {
    pub fn new(
        drive: Arc<DriveCtrl>,
        gps: Arc<GpsStore>,
        cam: Option<Arc<CamSource>>,
        running: Arc<AtomicBool>,
    ) -> Self {
        Self {
            drive,
            gps,
            cam,
            running,
            num_viewers: AtomicUsize::new(0),
        }
    }
}

impl WebServer {
    /// Address the server is listening on.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Signal the server to stop and block until its thread exits. Later calls
    /// have no effect.
    pub fn stop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                error!("Web server thread panicked");
            }
            info!("Web server stopped");
        }
    }
}

// ---------------------------------------------------------------------------
// PUBLIC FUNCTIONS
// ---------------------------------------------------------------------------

/// Bind the listening socket and start serving on a new thread.
///
/// Binding happens before this returns so that an unavailable port is reported
/// to the caller.
pub fn spawn_web_server(params: &WebParams, state: WebState) -> Result<WebServer, WebServerError> {
    let listener = TcpListener::bind((params.host.as_str(), params.port))
        .map_err(|e| WebServerError::Bind(params.host.clone(), params.port, e))?;
    let addr = listener
        .local_addr()
        .map_err(|e| WebServerError::Bind(params.host.clone(), params.port, e))?;

    let data = web::Data::new(state);
    let workers = params.workers.max(1);
    let shutdown_timeout = params.shutdown_timeout_s;
    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let handle = thread::Builder::new()
        .name("web-server".into())
        .spawn(move || {
            let result = actix_web::rt::System::new().block_on(async move {
                let server = HttpServer::new(move || {
                    App::new().app_data(data.clone()).configure(routes)
                })
                .workers(workers)
                .shutdown_timeout(shutdown_timeout)
                .disable_signals()
                .listen(listener)?
                .run();

                let srv_handle = server.handle();
                actix_web::rt::spawn(async move {
                    let _ = shutdown_rx.await;
                    srv_handle.stop(true).await;
                });

                server.await
            });

            if let Err(e) = result {
                error!("HTTP server error: {}", e);
            }
        })
        .map_err(WebServerError::Spawn)?;

    info!("Web server listening on http://{}", addr);

    Ok(WebServer {
        addr,
        shutdown: Some(shutdown_tx),
        handle: Some(handle),
    })
}

/// Register all routes. Handlers expect a `web::Data<WebState>` in the app.
pub fn routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .route("/", web::get().to(index))
        .route("/video_feed", web::get().to(video_feed))
        .route("/send_command", web::post().to(send_command))
        .route("/gps_data", web::get().to(gps_data));
}

// ---------------------------------------------------------------------------
// HANDLERS
// ---------------------------------------------------------------------------

async fn index() -> HttpResponse {
    HttpResponse::Ok()
        .content_type("text/html; charset=utf-8")
        .body(INDEX_HTML)
}

/// Stream the camera as a multipart JPEG response.
async fn video_feed(state: web::Data<WebState>) -> HttpResponse {
    let cam = match &state.cam {
        Some(c) => c.clone(),
        None => {
            return HttpResponse::ServiceUnavailable()
                .json(CommandResponse::error("camera is disabled"))
        }
    };

    let viewer = state.num_viewers.fetch_add(1, Ordering::Relaxed);
    let running = state.running.clone();
    let (tx, mut rx) = mpsc::channel::<Vec<u8>>(VIEWER_QUEUE_LEN);

    let spawned = thread::Builder::new()
        .name(format!("cam-stream-{}", viewer))
        .spawn(move || {
            debug!("Viewer {} connected", viewer);

            // Ends with the client even while the camera is unavailable
            let sender = tx.clone();
            let frames =
                cam.frames_until(move || !running.load(Ordering::Relaxed) || sender.is_closed());

            for part in frames {
                if tx.blocking_send(part).is_err() {
                    break;
                }
            }

            debug!("Viewer {} disconnected", viewer);
        });

    if let Err(e) = spawned {
        error!("Could not start stream thread: {}", e);
        return HttpResponse::InternalServerError().json(CommandResponse::error(e));
    }

    let body = stream! {
        while let Some(part) = rx.recv().await {
            yield Ok::<Bytes, actix_web::Error>(Bytes::from(part));
        }
    };

    HttpResponse::Ok()
        .append_header(("Cache-Control", "no-cache"))
        .content_type(MULTIPART_CONTENT_TYPE)
        .streaming(body)
}

async fn send_command(
    state: web::Data<WebState>,
    request: web::Json<CommandRequest>,
) -> HttpResponse {
    let drive = state.drive.clone();
    let raw = request.command_str().to_string();

    // Commands may wait for an avoidance maneuver to finish
    match web::block(move || drive.set_command(&raw)).await {
        Ok(Ok(cmd)) => {
            info!("Received command: {}", cmd);
            HttpResponse::Ok().json(CommandResponse::success(cmd))
        }
        Ok(Err(e)) => {
            error!("Command rejected: {}", e);
            HttpResponse::build(command_error_status(&e)).json(CommandResponse::error(e))
        }
        Err(e) => {
            error!("Command handling failed: {}", e);
            HttpResponse::InternalServerError().json(CommandResponse::error(e))
        }
    }
}

async fn gps_data(state: web::Data<WebState>) -> HttpResponse {
    HttpResponse::Ok().json(state.gps.latest())
}

// ---------------------------------------------------------------------------
// PRIVATE FUNCTIONS
// ---------------------------------------------------------------------------

fn command_error_status(e: &DriveCtrlError) -> StatusCode {
    match e {
        DriveCtrlError::Parse(_) => StatusCode::BAD_REQUEST,
        DriveCtrlError::Actuation(_) | DriveCtrlError::Released => StatusCode::SERVICE_UNAVAILABLE,
    }
}

/// Unparsable bodies get the same error shape as rejected commands.
fn json_config() -> web::JsonConfig {
    web::JsonConfig::default()
        .content_type_required(false)
        .error_handler(|err, _req| {
            let response = HttpResponse::BadRequest()
                .json(CommandResponse::error(format!("invalid request body: {}", err)));
            InternalError::from_response(err, response).into()
        })
}

// ---------------------------------------------------------------------------
// TESTS
// ---------------------------------------------------------------------------
