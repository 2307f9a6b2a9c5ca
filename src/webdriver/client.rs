use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use super::PageDriver;
use super::error::WebDriverError;
use super::types::{
    DriverResponse, ExecuteRequest, NavigateRequest, NewSessionRequest, NewSessionValue,
};

/// HTTP client for a W3C WebDriver endpoint (chromedriver, geckodriver,
/// selenium-standalone).
pub struct WebDriverClient {
    client: Client,
    base_url: String,
    session_id: String,
}

impl WebDriverClient {
    /// Open a new headless-Chrome session against the driver at `base_url`.
    pub async fn new_session(base_url: &str) -> Result<Self, WebDriverError> {
        Self::new_session_with_capabilities(base_url, NewSessionRequest::headless_chrome()).await
    }

    /// Open a session with explicit capabilities (useful for testing and for
    /// non-Chrome drivers).
    pub async fn new_session_with_capabilities(
        base_url: &str,
        capabilities: NewSessionRequest,
    ) -> Result<Self, WebDriverError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(Duration::from_secs(120))
            .build()
            .expect("failed to build HTTP client");

        let base_url = base_url.trim_end_matches('/').to_string();
        let response = client
            .post(format!("{base_url}/session"))
            .json(&capabilities)
            .send()
            .await?;
        let value: NewSessionValue = Self::unwrap_response(response).await?;
        debug!(session_id = %value.session_id, "webdriver session created");

        Ok(Self {
            client,
            base_url,
            session_id: value.session_id,
        })
    }

    /// The driver-assigned session identifier.
    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Navigate the session to `url` and wait for the document to load.
    pub async fn navigate(&self, url: &str) -> Result<(), WebDriverError> {
        let response = self
            .client
            .post(self.endpoint("url"))
            .json(&NavigateRequest { url: url.into() })
            .send()
            .await?;
        Self::unwrap_response::<Value>(response).await?;
        Ok(())
    }

    /// End the session. The browser is closed by the driver.
    pub async fn quit(&self) -> Result<(), WebDriverError> {
        let response = self
            .client
            .delete(format!("{}/session/{}", self.base_url, self.session_id))
            .send()
            .await?;
        Self::unwrap_response::<Value>(response).await?;
        Ok(())
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/session/{}/{path}", self.base_url, self.session_id)
    }

    /// Check the HTTP status and peel the `{ "value": ... }` envelope.
    async fn unwrap_response<T: DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WebDriverError> {
        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "unknown error".to_string());
            return Err(WebDriverError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: DriverResponse<T> = serde_json::from_slice(&response.bytes().await?)?;
        Ok(body.value)
    }
}

impl PageDriver for WebDriverClient {
    async fn execute_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> Result<Value, WebDriverError> {
        debug!(script, "executing script in page");
        let response = self
            .client
            .post(self.endpoint("execute/sync"))
            .json(&ExecuteRequest {
                script: script.into(),
                args,
            })
            .send()
            .await?;
        Self::unwrap_response(response).await
    }

    async fn take_screenshot(&self) -> Result<Vec<u8>, WebDriverError> {
        let response = self
            .client
            .get(self.endpoint("screenshot"))
            .send()
            .await?;
        let encoded: String = Self::unwrap_response(response).await?;
        Ok(BASE64.decode(encoded.as_bytes())?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn session_against(server: &MockServer) -> WebDriverClient {
        Mock::given(method("POST"))
            .and(path("/session"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": { "sessionId": "sess-1", "capabilities": {} }
            })))
            .mount(server)
            .await;
        WebDriverClient::new_session(&server.uri()).await.unwrap()
    }

    #[tokio::test]
    async fn new_session_extracts_session_id() {
        let server = MockServer::start().await;
        let client = session_against(&server).await;
        assert_eq!(client.session_id(), "sess-1");
    }

    #[tokio::test]
    async fn execute_script_posts_script_and_returns_value() {
        let server = MockServer::start().await;
        let client = session_against(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/sess-1/execute/sync"))
            .and(body_partial_json(serde_json::json!({
                "script": "return !!window.WebChat"
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": true })),
            )
            .mount(&server)
            .await;

        let value = client
            .execute_script("return !!window.WebChat", vec![])
            .await
            .unwrap();
        assert_eq!(value, serde_json::json!(true));
    }

    #[tokio::test]
    async fn take_screenshot_decodes_base64_png() {
        let server = MockServer::start().await;
        let client = session_against(&server).await;

        let png = vec![0x89u8, b'P', b'N', b'G'];
        Mock::given(method("GET"))
            .and(path("/session/sess-1/screenshot"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "value": BASE64.encode(&png)
            })))
            .mount(&server)
            .await;

        assert_eq!(client.take_screenshot().await.unwrap(), png);
    }

    #[tokio::test]
    async fn non_success_status_surfaces_as_error() {
        let server = MockServer::start().await;
        let client = session_against(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/sess-1/execute/sync"))
            .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
            .mount(&server)
            .await;

        let err = client.execute_script("return 1", vec![]).await.unwrap_err();
        match err {
            WebDriverError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "boom");
            }
            other => panic!("expected status error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn navigate_posts_url() {
        let server = MockServer::start().await;
        let client = session_against(&server).await;

        Mock::given(method("POST"))
            .and(path("/session/sess-1/url"))
            .and(body_partial_json(
                serde_json::json!({ "url": "http://localhost:5000/index.html" }),
            ))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({ "value": null })),
            )
            .expect(1)
            .mount(&server)
            .await;

        client
            .navigate("http://localhost:5000/index.html")
            .await
            .unwrap();
    }
}
