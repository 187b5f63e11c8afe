use crate::providers::UpstreamClient;
use async_stream::stream;
use futures::{Stream, StreamExt};
use log::{debug, error};
use std::sync::Arc;

/// Relays one prompt's upstream fragments, in arrival order, as they arrive.
///
/// Empty fragments are dropped. If the upstream call cannot be opened, or its
/// sequence fails partway, `fallback` is yielded once and the stream ends;
/// the failure itself is only logged.
pub fn relay(
    upstream: Arc<dyn UpstreamClient>,
    prompt: String,
    fallback: Arc<str>,
) -> impl Stream<Item = String> + Send + 'static {
    stream! {
        let mut fragments = match upstream.stream_generate(&prompt).await {
            Ok(fragments) => fragments,
            Err(e) => {
                error!("Upstream call failed: {e}");
                yield fallback.to_string();
                return;
            }
        };

        let mut relayed = 0usize;
        while let Some(fragment) = fragments.next().await {
            match fragment {
                Ok(text) if text.is_empty() => continue,
                Ok(text) => {
                    relayed += 1;
                    yield text;
                }
                Err(e) => {
                    error!("Upstream stream failed after {relayed} fragments: {e}");
                    yield fallback.to_string();
                    return;
                }
            }
        }

        debug!("[Relay] upstream finished after {relayed} fragments");
    }
}
