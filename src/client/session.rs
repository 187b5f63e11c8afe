use chrono::{DateTime, Local};
use log::debug;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sender {
    User,
    Bot,
}

/// One entry of the chat transcript.
#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub id: Uuid,
    pub sender: Sender,
    pub text: String,
    /// True while the bot reply is still being streamed in
    pub streaming: bool,
    pub timestamp: DateTime<Local>,
}

impl Message {
    fn new(sender: Sender, text: impl Into<String>, streaming: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            sender,
            text: text.into(),
            streaming,
            timestamp: Local::now(),
        }
    }

    pub fn user(text: impl Into<String>) -> Self {
        Self::new(Sender::User, text, false)
    }

    pub fn bot(text: impl Into<String>) -> Self {
        Self::new(Sender::Bot, text, false)
    }

    fn placeholder() -> Self {
        Self::new(Sender::Bot, String::new(), true)
    }
}

/// Handle to the turn currently in flight, naming its bot placeholder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Turn {
    bot_id: Uuid,
}

impl Turn {
    pub const fn bot_id(&self) -> Uuid {
        self.bot_id
    }
}

/// Client-side transcript state.
///
/// All mutation goes through `&mut self`, so one owner drives every turn.
/// The `loading` flag is raised by [`ChatSession::begin_turn`] and cleared
/// only when that turn completes or fails.
#[derive(Debug, Default)]
pub struct ChatSession {
    messages: Vec<Message>,
    loading: bool,
}

impl ChatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_greeting(greeting: impl Into<String>) -> Self {
        Self {
            messages: vec![Message::bot(greeting)],
            loading: false,
        }
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub const fn is_loading(&self) -> bool {
        self.loading
    }

    pub fn message(&self, id: Uuid) -> Option<&Message> {
        self.messages.iter().find(|m| m.id == id)
    }

    /// Starts a turn: appends the user message and an empty streaming bot
    /// placeholder. Returns `None` (and changes nothing) when the input is
    /// blank or another turn is still loading.
    pub fn begin_turn(&mut self, input: &str) -> Option<Turn> {
        if input.trim().is_empty() || self.loading {
            debug!("[Session] submit ignored (loading: {})", self.loading);
            return None;
        }

        self.messages.push(Message::user(input));
        let placeholder = Message::placeholder();
        let turn = Turn {
            bot_id: placeholder.id,
        };
        self.messages.push(placeholder);
        self.loading = true;

        Some(turn)
    }

    /// Replaces the placeholder's text with the full accumulated reply.
    ///
    /// The new text must extend the current one; anything else is ignored so
    /// readers never see text shrink or change underneath them.
    pub fn update_text(&mut self, turn: &Turn, accumulated: &str) -> Option<&Message> {
        let message = self.streaming_message_mut(turn)?;
        if !accumulated.starts_with(message.text.as_str()) {
            debug!("[Session] rejected non-monotonic update for {}", turn.bot_id);
            return None;
        }
        message.text.clear();
        message.text.push_str(accumulated);
        Some(&*message)
    }

    /// Marks the placeholder as finished, keeping its text.
    pub fn complete_turn(&mut self, turn: &Turn) -> Option<&Message> {
        self.loading = false;
        let message = self.streaming_message_mut(turn)?;
        message.streaming = false;
        Some(&*message)
    }

    /// Drops the placeholder, partial text included, and appends one static
    /// error message in its place.
    pub fn fail_turn(&mut self, turn: &Turn, error_text: &str) -> &Message {
        self.loading = false;
        self.messages.retain(|m| m.id != turn.bot_id);
        self.messages.push(Message::bot(error_text));
        &self.messages[self.messages.len() - 1]
    }

    fn streaming_message_mut(&mut self, turn: &Turn) -> Option<&mut Message> {
        self.messages
            .iter_mut()
            .find(|m| m.id == turn.bot_id && m.streaming)
    }
}
