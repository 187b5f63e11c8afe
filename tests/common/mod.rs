#![allow(dead_code)]

use async_trait::async_trait;
use futures::{stream, StreamExt};
use neko_relay::providers::{FragmentStream, UpstreamClient};
use neko_relay::server::{router, AppState};
use neko_relay::RelayError;
use std::sync::Arc;
use tokio::net::TcpListener;

pub const FALLBACK: &str = "I'm having trouble connecting to my knowledge base right now.";
pub const ERROR_MESSAGE: &str = "Sorry, there was an error processing your request.";

/// Upstream stand-in that replays a fixed script.
pub enum ScriptedUpstream {
    Fragments(Vec<Result<&'static str, &'static str>>),
    FailToOpen,
}

#[async_trait]
impl UpstreamClient for ScriptedUpstream {
    async fn stream_generate(&self, _prompt: &str) -> Result<FragmentStream, RelayError> {
        match self {
            Self::FailToOpen => Err(RelayError::Upstream("service unavailable".to_string())),
            Self::Fragments(items) => {
                let items: Vec<_> = items
                    .iter()
                    .map(|item| {
                        item.map(str::to_string)
                            .map_err(|e| RelayError::StreamError(e.to_string()))
                    })
                    .collect();
                Ok(stream::iter(items).boxed())
            }
        }
    }
}

pub fn state(upstream: impl UpstreamClient + 'static) -> AppState {
    AppState::new(Arc::new(upstream), FALLBACK)
}

/// Serves the relay on an ephemeral loopback port and returns its chat URL.
pub async fn spawn_relay(upstream: impl UpstreamClient + 'static) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = router(state(upstream));
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}/api/chat")
}

/// A loopback URL nothing is listening on.
pub async fn refused_endpoint() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/api/chat")
}
