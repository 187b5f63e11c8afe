use crate::core::RelayError;
use log::{debug, error};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};

const DEFAULT_QUESTIONS: [(&str, &str); 5] = [
    ("1", "What are the best games of 2025?"),
    ("2", "Tell me about the latest gaming news"),
    ("3", "What are the most anticipated upcoming games?"),
    ("4", "Compare different gaming consoles"),
    ("5", "What are the best indie games?"),
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: String,
    pub text: String,
}

/// Quick questions: the built-ins followed by user-added entries.
///
/// Only the user-added entries are written to disk.
#[derive(Debug)]
pub struct QuestionList {
    path: PathBuf,
    custom: Vec<Question>,
}

impl QuestionList {
    /// Loads custom questions from `path`. A missing file means none; an
    /// unreadable or corrupt one is logged and treated the same way.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let custom = match fs::read_to_string(&path) {
            Ok(contents) => serde_json::from_str(&contents).unwrap_or_else(|e| {
                error!("Error loading custom questions: {e}");
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                error!("Error loading custom questions: {e}");
                Vec::new()
            }
        };
        Self { path, custom }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn all(&self) -> Vec<Question> {
        DEFAULT_QUESTIONS
            .iter()
            .map(|(id, text)| Question {
                id: (*id).to_string(),
                text: (*text).to_string(),
            })
            .chain(self.custom.iter().cloned())
            .collect()
    }

    pub fn is_default(id: &str) -> bool {
        DEFAULT_QUESTIONS.iter().any(|(default_id, _)| *default_id == id)
    }

    /// Question text by 1-based position in [`QuestionList::all`].
    pub fn get(&self, position: usize) -> Option<String> {
        position
            .checked_sub(1)
            .and_then(|index| self.all().into_iter().nth(index))
            .map(|question| question.text)
    }

    /// Appends a trimmed question and persists the custom list.
    pub fn add(&mut self, text: &str) -> Result<Question, RelayError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(RelayError::InvalidInput(
                "Question text must not be empty".to_string(),
            ));
        }

        let question = Question {
            id: self.next_id(),
            text: text.to_string(),
        };
        self.custom.push(question.clone());
        self.save()?;
        Ok(question)
    }

    /// Removes a user-added question. Built-ins and unknown ids return `false`.
    pub fn remove(&mut self, id: &str) -> Result<bool, RelayError> {
        if Self::is_default(id) {
            debug!("[Questions] refusing to delete built-in question {id}");
            return Ok(false);
        }

        let before = self.custom.len();
        self.custom.retain(|question| question.id != id);
        if self.custom.len() == before {
            return Ok(false);
        }

        self.save()?;
        Ok(true)
    }

    fn save(&self) -> Result<(), RelayError> {
        let json = serde_json::to_string(&self.custom)?;
        fs::write(&self.path, json)?;
        Ok(())
    }

    /// Millisecond timestamp ids, bumped past any collision.
    fn next_id(&self) -> String {
        let mut id = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis())
            .unwrap_or_default();
        while self.custom.iter().any(|q| q.id == id.to_string()) || Self::is_default(&id.to_string())
        {
            id += 1;
        }
        id.to_string()
    }
}
