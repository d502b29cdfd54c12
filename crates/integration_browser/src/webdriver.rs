//! Minimal W3C WebDriver client
//!
//! Covers the handful of commands the controller needs: sessions, navigation,
//! element lookup, script execution and page source.

use std::path::Path;
use std::time::Duration;

use reqwest::{Client, Method};
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::runtime::Handle;
use tracing::{debug, warn};

use crate::config::BrowserConfig;
use crate::error::BrowserError;

/// Key under which W3C drivers return element references
const ELEMENT_KEY: &str = "element-6066-11e4-a52e-4f735466cecf";

#[derive(Debug, Deserialize)]
struct WireResponse {
    #[serde(default)]
    value: Value,
}

#[derive(Debug, Deserialize)]
struct WireError {
    error: String,
    #[serde(default)]
    message: String,
}

/// HTTP client bound to one WebDriver endpoint
#[derive(Debug, Clone)]
pub(crate) struct WebDriverClient {
    http: Client,
    base_url: String,
}

impl WebDriverClient {
    pub(crate) fn new(base_url: &str, timeout: Duration) -> Result<Self, BrowserError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub(crate) fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether the endpoint reports itself ready for new sessions
    pub(crate) async fn is_ready(&self) -> bool {
        match self.send(Method::GET, "/status", None).await {
            Ok(value) => value
                .get("ready")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            Err(e) => {
                debug!(error = %e, "WebDriver status check failed");
                false
            },
        }
    }

    /// Open a new browser session
    pub(crate) async fn new_session(&self, capabilities: Value) -> Result<Session, BrowserError> {
        let value = self
            .send(Method::POST, "/session", Some(capabilities))
            .await
            .map_err(|e| match e {
                BrowserError::Command { error, message } => {
                    BrowserError::SessionNotCreated(format!("{error}: {message}"))
                },
                other => other,
            })?;

        let id = value
            .get("sessionId")
            .and_then(Value::as_str)
            .ok_or_else(|| BrowserError::ParseError("response has no sessionId".to_string()))?
            .to_string();

        debug!(session = %id, "WebDriver session opened");
        Ok(Session {
            client: self.clone(),
            id,
            closed: false,
        })
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Value, BrowserError> {
        let url = format!("{}{path}", self.base_url);
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(&body);
        }

        let response = request
            .send()
            .await
            .map_err(|e| BrowserError::ConnectionFailed(e.to_string()))?;
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| BrowserError::ParseError(e.to_string()))?;

        let wire: WireResponse = serde_json::from_str(&body)
            .map_err(|e| BrowserError::ParseError(format!("HTTP {status}: {e}")))?;

        if status.is_success() {
            return Ok(wire.value);
        }

        match serde_json::from_value::<WireError>(wire.value) {
            Ok(err) => Err(BrowserError::Command {
                error: err.error,
                message: err.message,
            }),
            Err(_) => Err(BrowserError::Command {
                error: "unknown error".to_string(),
                message: format!("HTTP {status}"),
            }),
        }
    }
}

/// An open browser session
///
/// Dropping a session that was not closed schedules its deletion on the
/// current runtime, so an aborted fetch still releases the browser.
#[derive(Debug)]
pub(crate) struct Session {
    client: WebDriverClient,
    id: String,
    closed: bool,
}

impl Session {
    pub(crate) fn id(&self) -> &str {
        &self.id
    }

    fn path(&self, command: &str) -> String {
        format!("/session/{}{command}", self.id)
    }

    pub(crate) async fn navigate(&self, url: &str) -> Result<(), BrowserError> {
        self.client
            .send(Method::POST, &self.path("/url"), Some(json!({ "url": url })))
            .await
            .map(|_| ())
    }

    /// First element matching `css`, or `None` when nothing matches yet
    pub(crate) async fn find(&self, css: &str) -> Result<Option<String>, BrowserError> {
        let body = json!({ "using": "css selector", "value": css });
        match self
            .client
            .send(Method::POST, &self.path("/element"), Some(body))
            .await
        {
            Ok(value) => value
                .get(ELEMENT_KEY)
                .and_then(Value::as_str)
                .map(|id| Some(id.to_string()))
                .ok_or_else(|| BrowserError::ParseError("element reference missing".to_string())),
            Err(BrowserError::Command { error, .. }) if error == "no such element" => Ok(None),
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn is_displayed(&self, element: &str) -> Result<bool, BrowserError> {
        let value = self
            .client
            .send(
                Method::GET,
                &self.path(&format!("/element/{element}/displayed")),
                None,
            )
            .await?;
        Ok(value.as_bool().unwrap_or(false))
    }

    /// Run a synchronous script; `arguments[i]` in the script are `args[i]`
    pub(crate) async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, BrowserError> {
        let body = json!({ "script": script, "args": args });
        self.client
            .send(Method::POST, &self.path("/execute/sync"), Some(body))
            .await
    }

    pub(crate) async fn source(&self) -> Result<String, BrowserError> {
        let value = self.client.send(Method::GET, &self.path("/source"), None).await?;
        match value {
            Value::String(html) => Ok(html),
            other => Err(BrowserError::ParseError(format!(
                "page source is not a string: {other}"
            ))),
        }
    }

    /// Delete the session
    pub(crate) async fn close(mut self) -> Result<(), BrowserError> {
        self.closed = true;
        let path = self.path("");
        self.client.send(Method::DELETE, &path, None).await?;
        debug!(session = %self.id, "WebDriver session closed");
        Ok(())
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if self.closed {
            return;
        }
        let client = self.client.clone();
        let path = self.path("");
        let id = self.id.clone();
        match Handle::try_current() {
            Ok(handle) => {
                handle.spawn(async move {
                    if let Err(e) = client.send(Method::DELETE, &path, None).await {
                        warn!(session = %id, error = %e, "Failed to delete abandoned session");
                    }
                });
            },
            Err(_) => warn!(session = %id, "No runtime to delete abandoned session"),
        }
    }
}

/// New-session payload for Chrome/Chromium
pub(crate) fn capabilities(config: &BrowserConfig, browser_binary: Option<&Path>) -> Value {
    let mut args = vec![
        "--no-sandbox".to_string(),
        "--disable-gpu".to_string(),
        "--disable-dev-shm-usage".to_string(),
        "--window-size=1280,2000".to_string(),
        format!("--user-agent={}", config.user_agent),
    ];
    if config.headless {
        args.push("--headless=new".to_string());
    }

    let mut chrome = json!({ "args": args });
    if let Some(binary) = browser_binary {
        chrome["binary"] = json!(binary.display().to_string());
    }

    json!({
        "capabilities": {
            "alwaysMatch": {
                "browserName": "chrome",
                "pageLoadStrategy": "normal",
                "goog:chromeOptions": chrome,
            }
        }
    })
}
