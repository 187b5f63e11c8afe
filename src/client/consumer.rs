use crate::client::session::{ChatSession, Message, Turn};
use crate::core::{ClientConfig, FragmentPayload, RelayError};
use crate::eventsource::EventSourceExt;
use futures::StreamExt;
use log::{debug, error, warn};
use reqwest::{Client, Response};
use serde_json::json;

/// Terminal state of one submitted turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    /// Input was blank or another turn was in flight; nothing changed
    Rejected,
    Completed,
    Failed,
}

/// Consumer side of the relay: sends prompts to the chat endpoint and folds
/// the streamed events into a [`ChatSession`].
pub struct RelayClient {
    client: Client,
    endpoint: String,
    error_message: String,
}

impl RelayClient {
    pub fn new(endpoint: impl Into<String>, error_message: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
            error_message: error_message.into(),
        }
    }

    pub fn from_config(config: &ClientConfig) -> Self {
        Self::new(config.endpoint.clone(), config.error_message.clone())
    }

    /// Issues the chat request and returns the response once its status is
    /// known to be a success.
    pub async fn open(&self, prompt: &str) -> Result<Response, RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&json!({ "message": prompt }))
            .send()
            .await
            .map_err(|e| RelayError::Transport(format!("Request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(RelayError::Transport(format!(
                "Failed to get response ({status}): {error_text}"
            )));
        }

        Ok(response)
    }

    /// Runs one full turn for `input`.
    ///
    /// `on_update` sees every message the turn creates or changes: the user
    /// message, the placeholder, each text extension, the completed reply, or
    /// the error message that replaces the placeholder.
    pub async fn run_turn<F>(
        &self,
        session: &mut ChatSession,
        input: &str,
        mut on_update: F,
    ) -> TurnOutcome
    where
        F: FnMut(&Message),
    {
        let Some(turn) = session.begin_turn(input) else {
            return TurnOutcome::Rejected;
        };
        for message in &session.messages()[session.messages().len() - 2..] {
            on_update(message);
        }

        match self.stream_reply(session, &turn, input, &mut on_update).await {
            Ok(()) => {
                if let Some(message) = session.complete_turn(&turn) {
                    on_update(message);
                }
                TurnOutcome::Completed
            }
            Err(e) => {
                error!("Error sending message: {e}");
                on_update(session.fail_turn(&turn, &self.error_message));
                TurnOutcome::Failed
            }
        }
    }

    async fn stream_reply<F>(
        &self,
        session: &mut ChatSession,
        turn: &Turn,
        prompt: &str,
        on_update: &mut F,
    ) -> Result<(), RelayError>
    where
        F: FnMut(&Message),
    {
        let mut events = self.open(prompt).await?.events();
        let mut accumulated = String::new();

        while let Some(event) = events.next().await {
            let event = event.map_err(|e| RelayError::Transport(format!("Read failed: {e}")))?;

            for line in FragmentPayload::texts_from_event(&event) {
                match line {
                    Ok(Some(text)) => {
                        accumulated.push_str(&text);
                        if let Some(message) = session.update_text(turn, &accumulated) {
                            on_update(message);
                        }
                    }
                    Ok(None) => {}
                    Err(e) => warn!("Error parsing chunk: {e}"),
                }
            }
        }

        debug!("[Consumer] stream ended with {} bytes", accumulated.len());
        Ok(())
    }
}
