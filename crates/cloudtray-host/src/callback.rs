//! OAuth redirect listener on the loopback interface
//!
//! Binds an ephemeral port on 127.0.0.1, serves HTTP/1 until the browser
//! delivers the redirect, and publishes the full redirect URL on the
//! `oauth_callback` topic. The consent flow itself (and parsing the code out
//! of the URL) belongs to the core.

use std::convert::Infallible;
use std::net::{Ipv4Addr, SocketAddr};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use cloudtray_core::events::{BusEvent, EventBus};
use cloudtray_core::usecases::authenticate::extract_authorization_code;
use http_body_util::Full;
use hyper::body::{Bytes, Incoming};
use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpListener;
use tokio::sync::Notify;
use tracing::{debug, info, warn};

use crate::Result;

/// Starts one-shot redirect listeners
#[derive(Debug, Clone)]
pub struct LoopbackListener {
    bus: Arc<EventBus>,
    timeout: Duration,
}

/// State shared by the connections of one listener
struct Capture {
    bus: Arc<EventBus>,
    port: u16,
    published: AtomicBool,
    done: Notify,
}

impl LoopbackListener {
    /// # Arguments
    ///
    /// * `bus` - Bus receiving the `oauth_callback` event
    /// * `timeout` - How long a started listener waits for the redirect
    pub fn new(bus: Arc<EventBus>, timeout: Duration) -> Self {
        Self { bus, timeout }
    }

    /// Binds a fresh listener and serves it in the background
    ///
    /// Returns the ephemeral port. The listener closes after the first
    /// redirect or when the timeout elapses.
    pub async fn start(&self) -> Result<u16> {
        let listener = TcpListener::bind(SocketAddr::from((Ipv4Addr::LOCALHOST, 0))).await?;
        let port = listener.local_addr()?.port();
        info!(port, "OAuth callback listener started");

        let capture = Arc::new(Capture {
            bus: Arc::clone(&self.bus),
            port,
            published: AtomicBool::new(false),
            done: Notify::new(),
        });
        tokio::spawn(serve(listener, capture, self.timeout));
        Ok(port)
    }
}

async fn serve(listener: TcpListener, capture: Arc<Capture>, timeout: Duration) {
    let deadline = tokio::time::sleep(timeout);
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            accepted = listener.accept() => match accepted {
                Ok((stream, peer)) => {
                    debug!(%peer, "Callback connection accepted");
                    tokio::spawn(serve_connection(stream, Arc::clone(&capture)));
                }
                Err(e) => warn!(error = %e, "Failed to accept callback connection"),
            },
            _ = capture.done.notified() => {
                info!(port = capture.port, "OAuth redirect captured, listener closed");
                break;
            }
            _ = &mut deadline => {
                warn!(port = capture.port, "No OAuth redirect before timeout, listener closed");
                break;
            }
        }
    }
}

async fn serve_connection(stream: tokio::net::TcpStream, capture: Arc<Capture>) {
    let io = TokioIo::new(stream);
    let service = service_fn(move |req: Request<Incoming>| {
        let capture = Arc::clone(&capture);
        async move { Ok::<_, Infallible>(capture.handle(&req)) }
    });
    if let Err(e) = http1::Builder::new().serve_connection(io, service).await {
        warn!(error = %e, "Callback server connection error");
    }
}

impl Capture {
    fn handle(&self, req: &Request<Incoming>) -> Response<Full<Bytes>> {
        if req.uri().path() == "/favicon.ico" {
            return html(StatusCode::NOT_FOUND, String::new());
        }

        let path = req
            .uri()
            .path_and_query()
            .map_or("/", |pq| pq.as_str());
        let redirect = format!("http://localhost:{}{}", self.port, path);
        debug!(uri = %req.uri(), "Callback server received request");

        if self.published.swap(true, Ordering::SeqCst) {
            return html(
                StatusCode::GONE,
                error_html("This sign-in request was already handled"),
            );
        }

        let has_code = extract_authorization_code(&redirect).is_some();
        self.bus.publish(BusEvent::oauth_callback(redirect));
        self.done.notify_one();

        if has_code {
            html(StatusCode::OK, success_html())
        } else {
            html(
                StatusCode::BAD_REQUEST,
                error_html("Missing authorization code in callback"),
            )
        }
    }
}

fn html(status: StatusCode, body: String) -> Response<Full<Bytes>> {
    let mut response = Response::new(Full::new(Bytes::from(body)));
    *response.status_mut() = status;
    response.headers_mut().insert(
        CONTENT_TYPE,
        HeaderValue::from_static("text/html; charset=utf-8"),
    );
    response
}

/// Returns the HTML for a successful sign-in page
fn success_html() -> String {
    r#"<!DOCTYPE html>
<html>
<head><title>CloudTray - Signed In</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Signed In</h1>
    <p>CloudTray is now connected to your Google Drive.</p>
    <p>You can close this window.</p>
    <script>setTimeout(function() { window.close(); }, 3000);</script>
</body>
</html>"#
        .to_string()
}

/// Returns the HTML for a sign-in error page
fn error_html(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html>
<head><title>CloudTray - Sign-in Error</title></head>
<body style="font-family: sans-serif; text-align: center; padding-top: 50px;">
    <h1>Sign-in Error</h1>
    <p>{}</p>
    <p>Please close this window and try again from the tray.</p>
</body>
</html>"#,
        message
    )
}
