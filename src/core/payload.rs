use serde::{Deserialize, Serialize};

use crate::core::RelayError;
use crate::eventsource::Event;

/// JSON body of one relay event: `{"text": "<fragment>"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FragmentPayload {
    #[serde(default)]
    pub text: Option<String>,
}

impl FragmentPayload {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
        }
    }

    /// Decodes one `data:` line. `Ok(None)` means the payload was well-formed
    /// but carried no text worth appending.
    pub fn text_from_line(line: &str) -> Result<Option<String>, RelayError> {
        let payload: Self = serde_json::from_str(line).map_err(|e| {
            RelayError::Parse(format!("Failed to parse relay line: {line}. Error: {e}"))
        })?;
        Ok(payload.text.filter(|text| !text.is_empty()))
    }

    /// Decodes every `data:` line of an event on its own, so one malformed
    /// line never hides its neighbours.
    pub fn texts_from_event(
        event: &Event,
    ) -> impl Iterator<Item = Result<Option<String>, RelayError>> + '_ {
        event.data.split('\n').map(Self::text_from_line)
    }
}
