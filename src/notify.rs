use tokio::task::JoinHandle;
use tracing::warn;
use url::Url;

use crate::{consts::LINE_NOTIFY_URL, errors::SdkError};

/// LINE Notify client. Posts `message` as a form, authenticated with a bearer token.
#[derive(Debug, Clone)]
pub struct Notifier {
    client: reqwest::Client,
    endpoint: Url,
    token: String,
}

impl Notifier {
    pub fn new(token: impl Into<String>) -> Result<Self, SdkError> {
        Self::with_endpoint(token, LINE_NOTIFY_URL)
    }

    pub fn with_endpoint(token: impl Into<String>, endpoint: &str) -> Result<Self, SdkError> {
        Ok(Self {
            client: reqwest::Client::new(),
            endpoint: endpoint.parse()?,
            token: token.into(),
        })
    }

    /// Sends `message`. The response body is discarded.
    pub async fn send(&self, message: &str) -> Result<(), SdkError> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .bearer_auth(&self.token)
            .form(&[("message", message)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(SdkError::NotifyRejected(status.as_u16()));
        }

        Ok(())
    }

    /// Sends `message` in the background, logging failures instead of returning them.
    ///
    /// Must be called from within a tokio runtime.
    pub fn send_detached(&self, message: impl Into<String>) -> JoinHandle<()> {
        let notifier = self.clone();
        let message = message.into();

        tokio::spawn(async move {
            if let Err(err) = notifier.send(&message).await {
                warn!(target = "defi_sdk::notify", error = %err, "Notification failed");
            }
        })
    }
}
