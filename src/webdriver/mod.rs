pub mod client;
pub mod error;
pub mod types;

use std::future::Future;

use serde_json::Value;

pub use client::WebDriverClient;
pub use error::WebDriverError;

/// The two browser capabilities the harness needs from a driver.
///
/// `WebDriverClient` is the real implementation; tests substitute scripted
/// mocks. Futures are `Send` so generic callers can run handlers on spawned
/// tasks.
pub trait PageDriver: Send + Sync {
    /// Run `script` in the page context with the given arguments and return
    /// its result as a JSON value.
    fn execute_script(
        &self,
        script: &str,
        args: Vec<Value>,
    ) -> impl Future<Output = Result<Value, WebDriverError>> + Send;

    /// Capture a screenshot of the current viewport as PNG bytes.
    fn take_screenshot(&self) -> impl Future<Output = Result<Vec<u8>, WebDriverError>> + Send;
}
