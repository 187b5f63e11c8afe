mod common;

use common::{refused_endpoint, spawn_relay, ScriptedUpstream, ERROR_MESSAGE, FALLBACK};
use neko_relay::client::{ChatSession, Message, RelayClient, Sender, TurnOutcome};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Runs one turn and records every bot-message snapshot as `(text, streaming)`.
async fn run_recorded(
    client: &RelayClient,
    session: &mut ChatSession,
    input: &str,
) -> (TurnOutcome, Vec<(String, bool)>) {
    let mut snapshots = Vec::new();
    let outcome = client
        .run_turn(session, input, |message: &Message| {
            if message.sender == Sender::Bot {
                snapshots.push((message.text.clone(), message.streaming));
            }
        })
        .await;
    (outcome, snapshots)
}

fn bot_messages(session: &ChatSession) -> Vec<&Message> {
    session
        .messages()
        .iter()
        .filter(|m| m.sender == Sender::Bot)
        .collect()
}

#[tokio::test]
async fn test_fragments_accumulate_in_order() {
    let endpoint = spawn_relay(ScriptedUpstream::Fragments(vec![
        Ok("The "),
        Ok("best "),
        Ok("RPG "),
        Ok("is..."),
    ]))
    .await;
    let client = RelayClient::new(endpoint, ERROR_MESSAGE);
    let mut session = ChatSession::new();

    let (outcome, snapshots) = run_recorded(&client, &mut session, "best RPGs").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    let streaming_texts: Vec<_> = snapshots
        .iter()
        .filter(|(_, streaming)| *streaming)
        .map(|(text, _)| text.as_str())
        .collect();
    assert_eq!(
        streaming_texts,
        ["", "The ", "The best ", "The best RPG ", "The best RPG is..."]
    );
    assert_eq!(
        snapshots.last(),
        Some(&("The best RPG is...".to_string(), false))
    );

    // Every snapshot extends the previous one
    for pair in snapshots.windows(2) {
        assert!(pair[1].0.starts_with(&pair[0].0));
    }

    let bots = bot_messages(&session);
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].text, "The best RPG is...");
    assert!(!bots[0].streaming);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_upstream_failure_yields_fallback_message() {
    let endpoint = spawn_relay(ScriptedUpstream::FailToOpen).await;
    let client = RelayClient::new(endpoint, ERROR_MESSAGE);
    let mut session = ChatSession::new();

    let (outcome, _) = run_recorded(&client, &mut session, "anything").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    let bots = bot_messages(&session);
    assert_eq!(bots.len(), 1);
    assert_eq!(bots[0].text, FALLBACK);
    assert!(!bots[0].streaming);
}

#[tokio::test]
async fn test_connection_refused_leaves_single_error_message() {
    let client = RelayClient::new(refused_endpoint().await, ERROR_MESSAGE);
    let mut session = ChatSession::new();

    let (outcome, snapshots) = run_recorded(&client, &mut session, "hello?").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(snapshots.last(), Some(&(ERROR_MESSAGE.to_string(), false)));

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].sender, Sender::User);
    assert_eq!(messages[1].text, ERROR_MESSAGE);
    assert!(messages.iter().all(|m| !m.streaming && !m.text.is_empty()));
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_error_status_fails_turn() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(ResponseTemplate::new(502).set_body_string("bad gateway"))
        .mount(&server)
        .await;

    let client = RelayClient::new(format!("{}/api/chat", server.uri()), ERROR_MESSAGE);
    let mut session = ChatSession::new();
    let (outcome, _) = run_recorded(&client, &mut session, "hi").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    assert_eq!(bot_messages(&session)[0].text, ERROR_MESSAGE);
}

#[tokio::test]
async fn test_malformed_events_are_skipped() {
    let server = MockServer::start().await;
    let body = concat!(
        "data: {\"text\":\"Zelda \"}\n\n",
        "data: {broken\n\n",
        ": comment\n\n",
        "data: {\"text\":\"rules\"}\n\n",
    );
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;

    let client = RelayClient::new(format!("{}/api/chat", server.uri()), ERROR_MESSAGE);
    let mut session = ChatSession::new();
    let (outcome, snapshots) = run_recorded(&client, &mut session, "hi").await;

    assert_eq!(outcome, TurnOutcome::Completed);
    let texts: Vec<_> = snapshots.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(texts, ["", "Zelda ", "Zelda rules", "Zelda rules"]);
}

async fn mock_sse_body(body: &'static str) -> (MockServer, RelayClient) {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/api/chat"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("content-type", "text/event-stream")
                .set_body_string(body),
        )
        .mount(&server)
        .await;
    let client = RelayClient::new(format!("{}/api/chat", server.uri()), ERROR_MESSAGE);
    (server, client)
}

#[tokio::test]
async fn test_each_data_line_is_its_own_payload() {
    let cases = [
        ("data: {\"text\":\"a\"}\ndata: {\"text\":\"b\"}\n\n", "ab"),
        ("data: {broken\ndata: {\"text\":\"ok\"}\n\n", "ok"),
        ("retry: soon\ndata: {\"text\":\"kept\"}\n\n", "kept"),
    ];

    for (body, expected) in cases {
        let (_server, client) = mock_sse_body(body).await;
        let mut session = ChatSession::new();
        let (outcome, _) = run_recorded(&client, &mut session, "hi").await;

        assert_eq!(outcome, TurnOutcome::Completed);
        assert_eq!(bot_messages(&session)[0].text, expected, "body {body:?}");
    }
}

/// Accepts one request, answers with a single chunked event, then hangs up
/// without finishing the body.
async fn spawn_truncating_server() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.unwrap();

        let mut request = Vec::new();
        let mut buf = [0u8; 1024];
        loop {
            let n = socket.read(&mut buf).await.unwrap();
            request.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&request);
            if let Some((head, body)) = text.split_once("\r\n\r\n") {
                let length = head
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())?
                    })
                    .unwrap_or(0);
                if body.len() >= length {
                    break;
                }
            }
            if n == 0 {
                break;
            }
        }

        let event = "data: {\"text\":\"partial\"}\n\n";
        let response = format!(
            "HTTP/1.1 200 OK\r\ncontent-type: text/event-stream\r\ntransfer-encoding: chunked\r\n\r\n{:x}\r\n{event}\r\n",
            event.len()
        );
        socket.write_all(response.as_bytes()).await.unwrap();
        socket.flush().await.unwrap();
    });
    format!("http://{addr}/api/chat")
}

#[tokio::test]
async fn test_read_failure_after_partial_text_fails_turn() {
    let client = RelayClient::new(spawn_truncating_server().await, ERROR_MESSAGE);
    let mut session = ChatSession::new();

    let (outcome, snapshots) = run_recorded(&client, &mut session, "hi").await;

    assert_eq!(outcome, TurnOutcome::Failed);
    let texts: Vec<_> = snapshots.iter().map(|(text, _)| text.as_str()).collect();
    assert_eq!(texts, ["", "partial", ERROR_MESSAGE]);

    let messages = session.messages();
    assert_eq!(messages.len(), 2);
    assert_eq!(messages[0].text, "hi");
    assert_eq!(messages[1].text, ERROR_MESSAGE);
    assert!(!messages[1].streaming);
    assert_eq!(bot_messages(&session).len(), 1);
    assert!(!session.is_loading());
}

#[tokio::test]
async fn test_failed_turn_does_not_touch_previous_turn() {
    let endpoint = spawn_relay(ScriptedUpstream::Fragments(vec![Ok("first answer")])).await;
    let healthy = RelayClient::new(endpoint, ERROR_MESSAGE);
    let broken = RelayClient::new(refused_endpoint().await, ERROR_MESSAGE);
    let mut session = ChatSession::with_greeting("Hello!");

    let (first, _) = run_recorded(&healthy, &mut session, "one").await;
    assert_eq!(first, TurnOutcome::Completed);
    let completed = session.messages()[2].clone();

    let (second, _) = run_recorded(&broken, &mut session, "two").await;
    assert_eq!(second, TurnOutcome::Failed);

    assert_eq!(session.messages()[2], completed);
    assert_eq!(session.messages()[0].text, "Hello!");
    assert_eq!(session.messages().last().unwrap().text, ERROR_MESSAGE);
}

#[tokio::test]
async fn test_blank_input_is_rejected_without_request() {
    let client = RelayClient::new(refused_endpoint().await, ERROR_MESSAGE);
    let mut session = ChatSession::new();

    let (outcome, snapshots) = run_recorded(&client, &mut session, "   ").await;

    assert_eq!(outcome, TurnOutcome::Rejected);
    assert!(snapshots.is_empty());
    assert!(session.messages().is_empty());
}
