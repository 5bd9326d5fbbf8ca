// crates/mesh-procedures-api/src/notifier.rs
// ============================================================================
// Module: Webhook Notifier
// Description: Posts run summaries to a chat webhook.
// Purpose: Deliver the plain-text report to the team channel after a run.
// Dependencies: mesh-procedures-core, reqwest, serde_json, url
// ============================================================================

//! ## Overview
//! The notifier sends `{"text": <summary>, "target": <group>}` as JSON. A
//! notifier without a URL is a no-op so runs without a webhook behave the
//! same as runs with delivery disabled.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::time::Duration;

use mesh_procedures_core::NotifyError;
use mesh_procedures_core::RunNotifier;
use mesh_procedures_core::RunReport;
use reqwest::blocking::Client;
use reqwest::redirect::Policy;
use serde_json::json;
use url::Url;

// ============================================================================
// SECTION: Notifier
// ============================================================================

/// Chat webhook notifier.
#[derive(Debug, Clone)]
pub struct WebhookNotifier {
    /// HTTP client.
    client: Client,
    /// Webhook URL; `None` disables delivery.
    url: Option<Url>,
    /// Group or channel identifier.
    target: Option<String>,
}

impl WebhookNotifier {
    /// Builds a notifier.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the URL does not parse or the client
    /// cannot be constructed.
    pub fn new(url: Option<&str>, target: Option<String>) -> Result<Self, NotifyError> {
        let url = url
            .map(|raw| {
                Url::parse(raw).map_err(|err| NotifyError::Delivery(format!("invalid url: {err}")))
            })
            .transpose()?;
        let client = Client::builder()
            .redirect(Policy::none())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;
        Ok(Self {
            client,
            url,
            target,
        })
    }

    /// Returns a notifier that never sends.
    ///
    /// # Errors
    ///
    /// Returns [`NotifyError`] when the client cannot be constructed.
    pub fn disabled() -> Result<Self, NotifyError> {
        Self::new(None, None)
    }

    /// Returns true when a webhook URL is configured.
    #[must_use]
    pub const fn is_enabled(&self) -> bool {
        self.url.is_some()
    }
}

impl RunNotifier for WebhookNotifier {
    fn notify(&self, report: &RunReport) -> Result<(), NotifyError> {
        let Some(url) = &self.url else {
            return Ok(());
        };
        let payload = json!({
            "text": report.summary_text(),
            "target": self.target,
        });
        let response = self
            .client
            .post(url.clone())
            .json(&payload)
            .send()
            .map_err(|err| NotifyError::Delivery(err.to_string()))?;
        if response.status().is_success() {
            Ok(())
        } else {
            Err(NotifyError::Delivery(format!("webhook returned {}", response.status().as_u16())))
        }
    }
}
