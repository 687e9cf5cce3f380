//! Local HTTP listener for the OAuth redirect
//!
//! Binds the host, port and path of the configured redirect URI and hands
//! each redirect to the waiting login as a [`PendingRedirect`]. The browser
//! request is held open until the login reports its outcome, so the page
//! the user sees reflects the real result of the token exchange.

use crate::error::{CliError, Result};
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    routing::get,
    Router,
};
use omniout_sdk::RedirectParams;
use std::net::SocketAddr;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;
use url::Url;

/// A redirect waiting for the login to finish
#[derive(Debug)]
pub struct PendingRedirect {
    pub params: RedirectParams,
    reply: oneshot::Sender<std::result::Result<(), String>>,
}

impl PendingRedirect {
    /// Report the login outcome back to the browser
    pub fn respond(self, outcome: std::result::Result<(), String>) {
        // The browser may already have gone away
        let _ = self.reply.send(outcome);
    }
}

/// How long [`CallbackServer::shutdown`] waits for in-flight responses
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Listener for the OAuth redirect
pub struct CallbackServer {
    addr: SocketAddr,
    receiver: mpsc::Receiver<PendingRedirect>,
    shutdown: Option<oneshot::Sender<()>>,
    server_handle: JoinHandle<()>,
}

impl CallbackServer {
    /// Start listening on the redirect URI's host, port and path
    pub async fn start(redirect_uri: &str) -> Result<Self> {
        let uri = Url::parse(redirect_uri).map_err(|e| {
            CliError::InvalidInput(format!("Invalid redirect URI {redirect_uri}: {e}"))
        })?;
        let host = uri.host_str().unwrap_or("127.0.0.1");
        let host = if host == "localhost" { "127.0.0.1" } else { host };
        let port = uri.port_or_known_default().unwrap_or(80);
        let path = match uri.path() {
            "" => "/".to_string(),
            path => path.to_string(),
        };

        let listener = TcpListener::bind((host, port)).await.map_err(|e| {
            CliError::internal(format!("Failed to listen on {host}:{port}: {e}"))
        })?;
        let addr = listener.local_addr()?;

        let (sender, receiver) = mpsc::channel(1);
        let app = Router::new()
            .route(&path, get(handle_callback))
            .with_state(sender);

        tracing::info!("OAuth callback server listening on http://{}{}", addr, path);

        let (shutdown, stop) = oneshot::channel::<()>();
        let server_handle = tokio::spawn(async move {
            let result = axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = stop.await;
                })
                .await;
            if let Err(e) = result {
                tracing::error!("Callback server error: {}", e);
            }
        });

        Ok(Self {
            addr,
            receiver,
            shutdown: Some(shutdown),
            server_handle,
        })
    }

    /// Address actually bound
    pub fn local_addr(&self) -> SocketAddr {
        self.addr
    }

    /// Wait for the next redirect; there is no timeout
    pub async fn next_redirect(&mut self) -> Result<PendingRedirect> {
        self.receiver
            .recv()
            .await
            .ok_or_else(|| CliError::internal("Callback server stopped unexpectedly"))
    }

    /// Stop accepting connections and let responses already in flight finish
    ///
    /// Dropping the server instead aborts it, which can cut off the page the
    /// browser is waiting for.
    pub async fn shutdown(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if tokio::time::timeout(SHUTDOWN_GRACE, &mut self.server_handle)
            .await
            .is_err()
        {
            tracing::warn!("Callback server did not stop within {:?}", SHUTDOWN_GRACE);
        }
    }
}

impl Drop for CallbackServer {
    fn drop(&mut self) {
        self.server_handle.abort();
    }
}

async fn handle_callback(
    State(sender): State<mpsc::Sender<PendingRedirect>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let params = RedirectParams::from_query(query.as_deref().unwrap_or_default());
    let (reply, outcome) = oneshot::channel();

    let page = if sender.send(PendingRedirect { params, reply }).await.is_err() {
        error_page("No login is waiting for this redirect.")
    } else {
        match outcome.await {
            Ok(Ok(())) => success_page(),
            Ok(Err(message)) => error_page(&message),
            Err(_) => error_page("The login was abandoned."),
        }
    };

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Html(page),
    )
}

fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

const PAGE_STYLE: &str = r#"
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            margin: 0;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            background: #f4f6f9;
            color: #181818;
        }
        .container {
            text-align: center;
            background: white;
            padding: 3rem;
            border-radius: 12px;
            box-shadow: 0 8px 24px rgba(0, 0, 0, 0.08);
            max-width: 500px;
        }
        .icon { font-size: 3rem; margin-bottom: 1rem; }
        .details {
            background: #fdecea;
            padding: 1rem;
            border-radius: 8px;
            font-family: monospace;
            word-break: break-word;
        }
        .hint { margin-top: 2rem; font-size: 0.9rem; opacity: 0.7; }
"#;

fn success_page() -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Login Successful</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
    <div class="container">
        <div class="icon" style="color: #2e844a">✓</div>
        <h1>Login Successful</h1>
        <p>OmniOut is now connected to your CRM org.</p>
        <p class="hint">You can close this window and return to the terminal.</p>
    </div>
</body>
</html>"#
    )
}

fn error_page(message: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>Login Failed</title>
    <style>{PAGE_STYLE}</style>
</head>
<body>
    <div class="container">
        <div class="icon" style="color: #ba0517">✗</div>
        <h1>Login Failed</h1>
        <div class="details">{}</div>
        <p class="hint">Close this window and try again from the terminal.</p>
    </div>
</body>
</html>"#,
        escape_html(message)
    )
}
