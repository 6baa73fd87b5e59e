use std::sync::Arc;

use log::{debug, info};
use tokio::sync::Mutex;

use crate::conversation::Transcript;
use crate::error::RelayError;
use crate::model::CompletionClient;

/// Owns the conversation and the upstream client.
///
/// The transcript lock is held for the whole exchange, upstream call
/// included, so chat requests are served strictly one at a time.
pub struct Relay {
    transcript: Mutex<Transcript>,
    upstream: Arc<dyn CompletionClient>,
}

impl Relay {
    pub fn new(transcript: Transcript, upstream: Arc<dyn CompletionClient>) -> Self {
        Self {
            transcript: Mutex::new(transcript),
            upstream,
        }
    }

    pub async fn chat(&self, message: &str) -> Result<String, RelayError> {
        if message.is_empty() {
            return Err(RelayError::EmptyMessage);
        }

        let mut transcript = self.transcript.lock().await;
        transcript.push_user(message);
        debug!("Transcript now holds {} turns", transcript.len());

        let reply = self.upstream.complete(transcript.messages()).await?;

        transcript.push_assistant(reply.clone());
        info!("Exchange complete, transcript holds {} turns", transcript.len());
        Ok(reply)
    }

    #[cfg(test)]
    pub async fn history(&self) -> Vec<crate::web::models::Message> {
        self.transcript.lock().await.messages().to_vec()
    }
}
