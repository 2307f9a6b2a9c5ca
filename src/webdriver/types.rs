//! Wire types for the W3C WebDriver endpoints the client talks to.
//!
//! Every response body is wrapped in a `{ "value": ... }` envelope, modeled
//! here as [`DriverResponse`].

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope shared by all WebDriver endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct DriverResponse<T> {
    pub value: T,
}

/// Body for `POST /session`.
#[derive(Debug, Clone, Serialize)]
pub struct NewSessionRequest {
    pub capabilities: Value,
}

impl NewSessionRequest {
    /// Headless Chrome capabilities, the configuration the harness runs under
    /// in CI.
    pub fn headless_chrome() -> Self {
        Self {
            capabilities: serde_json::json!({
                "alwaysMatch": {
                    "browserName": "chrome",
                    "goog:chromeOptions": {
                        "args": ["--headless=new", "--window-size=360,640"]
                    }
                }
            }),
        }
    }
}

/// Payload of a successful `POST /session` response.
#[derive(Debug, Clone, Deserialize)]
pub struct NewSessionValue {
    #[serde(rename = "sessionId")]
    pub session_id: String,
}

/// Body for `POST /session/{id}/url`.
#[derive(Debug, Clone, Serialize)]
pub struct NavigateRequest {
    pub url: String,
}

/// Body for `POST /session/{id}/execute/sync`.
#[derive(Debug, Clone, Serialize)]
pub struct ExecuteRequest {
    pub script: String,
    pub args: Vec<Value>,
}
