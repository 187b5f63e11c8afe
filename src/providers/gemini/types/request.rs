use serde::Serialize;
use std::borrow::Cow;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest<'a> {
    pub contents: Vec<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub system_instruction: Option<Content<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
pub struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<&'a str>,
    pub parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
pub struct Part<'a> {
    pub text: Cow<'a, str>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub thinking_config: Option<ThinkingConfig>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThinkingConfig {
    /// Zero disables the model's deliberation phase
    pub thinking_budget: i32,
}

impl<'a> Content<'a> {
    pub fn user(text: &'a str) -> Self {
        Self {
            role: Some("user"),
            parts: vec![Part {
                text: Cow::Borrowed(text),
            }],
        }
    }

    pub fn system(text: &'a str) -> Self {
        Self {
            role: None,
            parts: vec![Part {
                text: Cow::Borrowed(text),
            }],
        }
    }
}

impl<'a> GenerateContentRequest<'a> {
    pub fn new(prompt: &'a str) -> Self {
        Self {
            contents: vec![Content::user(prompt)],
            system_instruction: None,
            generation_config: None,
        }
    }

    pub fn with_system_instruction(mut self, instruction: &'a str) -> Self {
        self.system_instruction = Some(Content::system(instruction));
        self
    }

    pub fn with_thinking_budget(mut self, budget: i32) -> Self {
        self.generation_config = Some(GenerationConfig {
            thinking_config: Some(ThinkingConfig {
                thinking_budget: budget,
            }),
        });
        self
    }
}
