//! Local HTTP callback server for the OAuth authorization code flow
//!
//! The server is bound before the browser is launched so that the redirect
//! URI is guaranteed to be reachable, then serves exactly one callback and
//! shuts down. Dropping a [`CallbackServer`] without waiting releases the
//! port as well.

use super::types::{AuthError, AuthResult, CallbackData};
use axum::{
    extract::{RawQuery, State},
    http::{header, StatusCode},
    response::{Html, IntoResponse},
    Router,
};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tracing::{debug, info, warn};

/// Port pre-registered as the redirect URI with each provider
pub const DEFAULT_CALLBACK_PORT: u16 = 6502;

/// How long to wait for the user to finish in the browser
pub const DEFAULT_CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);

/// Upper bound on draining the confirmation response during shutdown
const SHUTDOWN_GRACE: Duration = Duration::from_secs(2);

/// Shared state for callback handling
struct CallbackState {
    sender: Mutex<Option<oneshot::Sender<CallbackData>>>,
}

/// Loopback listener reserved for one authorization attempt
#[derive(Debug)]
pub struct CallbackServer {
    listener: TcpListener,
    local_addr: SocketAddr,
}

impl CallbackServer {
    /// Reserve the loopback port. Port 0 picks any free port.
    pub async fn bind(port: u16) -> AuthResult<Self> {
        let addr = SocketAddr::from(([127, 0, 0, 1], port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| AuthError::CallbackBind {
                addr,
                reason: e.to_string(),
            })?;
        let local_addr = listener.local_addr()?;

        info!("OAuth callback server listening on http://{}", local_addr);
        Ok(Self {
            listener,
            local_addr,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Redirect URI to register with the provider for this listener
    pub fn redirect_uri(&self) -> String {
        format!("http://localhost:{}/", self.local_addr.port())
    }

    /// Serve until the first callback request arrives, then stop.
    ///
    /// The listener is torn down on every path, including timeout.
    pub async fn wait_for_callback(self, timeout: Duration) -> AuthResult<CallbackData> {
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(CallbackState {
            sender: Mutex::new(Some(tx)),
        });

        // Any path: the redirect URI is the listener root
        let app = Router::new().fallback(handle_callback).with_state(state);

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let listener = self.listener;
        let mut server_handle = tokio::spawn(async move {
            axum::serve(listener, app)
                .with_graceful_shutdown(async {
                    let _ = shutdown_rx.await;
                })
                .await
        });

        let result = match tokio::time::timeout(timeout, rx).await {
            Ok(Ok(data)) => Ok(data),
            Ok(Err(_)) => Err(AuthError::CallbackServer(
                "Server stopped before a callback arrived".to_string(),
            )),
            Err(_) => {
                warn!("No OAuth callback within {:?}", timeout);
                Err(AuthError::Timeout)
            }
        };

        let _ = shutdown_tx.send(());
        match tokio::time::timeout(SHUTDOWN_GRACE, &mut server_handle).await {
            Ok(Ok(Ok(()))) => debug!("HTTP server stopped"),
            Ok(Ok(Err(e))) => warn!("Callback server error during shutdown: {}", e),
            Ok(Err(e)) => warn!("Callback server task failed: {}", e),
            Err(_) => {
                server_handle.abort();
                let _ = server_handle.await;
                debug!("HTTP server aborted after grace period");
            }
        }

        result
    }

    /// Confirmation page shown after the redirect
    pub fn generate_success_page() -> String {
        PAGE_TEMPLATE
            .replace("{title}", "Authorization Successful")
            .replace(
                "{message}",
                "Application has been authorized. You may close this window or tab.",
            )
    }

    /// Page shown when the provider reported an error
    pub fn generate_error_page(error: &str) -> String {
        let escaped = error
            .replace('&', "&amp;")
            .replace('<', "&lt;")
            .replace('>', "&gt;")
            .replace('"', "&quot;");
        PAGE_TEMPLATE
            .replace("{title}", "Authorization Failed")
            .replace(
                "{message}",
                &format!("{}<br>You may close this window or tab.", escaped),
            )
    }
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <title>{title}</title>
    <style>
        body {
            font-family: -apple-system, BlinkMacSystemFont, 'Segoe UI', Roboto, sans-serif;
            display: flex;
            justify-content: center;
            align-items: center;
            min-height: 100vh;
            margin: 0;
        }
        .container { text-align: center; max-width: 480px; }
    </style>
</head>
<body>
    <div class="container">
        <h1>{title}</h1>
        <p>{message}</p>
    </div>
</body>
</html>
"#;

/// Pull the callback parameters out of a raw query string
pub(crate) fn parse_callback_query(query: &str) -> CallbackData {
    let mut data = CallbackData::default();
    for (key, value) in url::form_urlencoded::parse(query.as_bytes()) {
        let slot = match key.as_ref() {
            "code" => &mut data.code,
            "error" => &mut data.error,
            "error_description" => &mut data.error_description,
            _ => continue,
        };
        if slot.is_none() {
            *slot = Some(value.into_owned());
        }
    }
    data
}

/// Axum handler for OAuth callback
async fn handle_callback(
    State(state): State<Arc<CallbackState>>,
    RawQuery(query): RawQuery,
) -> impl IntoResponse {
    let data = parse_callback_query(query.as_deref().unwrap_or_default());

    let response_html = match &data.error {
        Some(error) => {
            CallbackServer::generate_error_page(data.error_description.as_deref().unwrap_or(error))
        }
        None => CallbackServer::generate_success_page(),
    };

    let sender = state.sender.lock().ok().and_then(|mut guard| guard.take());
    match sender {
        Some(sender) => {
            let _ = sender.send(data);
        }
        None => debug!("Ignoring additional request on callback server"),
    }

    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
        Html(response_html),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_callback_query() {
        let data = parse_callback_query("code=ABC123&session_state=x&code=ignored");
        assert_eq!(data.code.as_deref(), Some("ABC123"));
        assert_eq!(data.error, None);

        let data = parse_callback_query(
            "error=access_denied&error_description=The+user+said+%22no%22",
        );
        assert_eq!(data.code, None);
        assert_eq!(data.error.as_deref(), Some("access_denied"));
        assert_eq!(
            data.error_description.as_deref(),
            Some("The user said \"no\"")
        );

        assert_eq!(parse_callback_query(""), CallbackData::default());
    }

    #[test]
    fn test_error_page_is_escaped() {
        let page = CallbackServer::generate_error_page("<script>alert('x')</script>");
        assert!(!page.contains("<script>"));
        assert!(page.contains("&lt;script&gt;"));
        assert!(CallbackServer::generate_success_page().contains("Application has been authorized"));
    }

    #[tokio::test]
    async fn test_redirect_uri_uses_bound_port() {
        let server = CallbackServer::bind(0).await.unwrap();
        let port = server.local_addr().port();
        assert_ne!(port, 0);
        assert_eq!(server.redirect_uri(), format!("http://localhost:{}/", port));
    }

    #[tokio::test]
    async fn test_receives_single_callback_and_releases_port() {
        let server = CallbackServer::bind(0).await.unwrap();
        let addr = server.local_addr();

        let browser = tokio::spawn(async move {
            reqwest::get(format!("http://{}/?code=ABC123", addr))
                .await
                .unwrap()
                .text()
                .await
                .unwrap()
        });

        let data = server
            .wait_for_callback(Duration::from_secs(10))
            .await
            .unwrap();
        assert_eq!(data.code.as_deref(), Some("ABC123"));

        let page = browser.await.unwrap();
        assert!(page.contains("Application has been authorized"));

        assert!(std::net::TcpListener::bind(addr).is_ok());
    }

    #[tokio::test]
    async fn test_timeout_releases_port() {
        let server = CallbackServer::bind(0).await.unwrap();
        let addr = server.local_addr();

        let err = server
            .wait_for_callback(Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Timeout));

        assert!(std::net::TcpListener::bind(addr).is_ok());
    }

    #[tokio::test]
    async fn test_bind_conflict_is_reported() {
        let occupied = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = occupied.local_addr().unwrap().port();

        let err = CallbackServer::bind(port).await.unwrap_err();
        assert!(matches!(err, AuthError::CallbackBind { .. }));
        assert!(err.to_string().contains(&port.to_string()));
    }
}
