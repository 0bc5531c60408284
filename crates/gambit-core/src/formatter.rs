//! Turns conversation history into a chat request payload.

use crate::error::FormatError;
use gambit_memory::{MessageEnvelope, Role, content_to_string};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;

/// Title of the merged history block.
pub const HISTORY_HEADER: &str = "## Dialogue History";

/// One role-tagged block of a model request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PromptBlock {
    pub role: Role,
    pub content: String,
}

impl PromptBlock {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
        }
    }
}

/// A single argument to [`ConversationFormatter::format`].
#[derive(Debug, Clone, Copy)]
pub enum PromptInput<'a> {
    /// Placeholder that contributes nothing.
    Skip,
    /// One record.
    One(&'a MessageEnvelope),
    /// An ordered run of records.
    Many(&'a [MessageEnvelope]),
    /// Untyped structured value: null, a record object, or a list of record objects.
    Raw(&'a Value),
}

impl<'a> From<&'a MessageEnvelope> for PromptInput<'a> {
    fn from(message: &'a MessageEnvelope) -> Self {
        Self::One(message)
    }
}

impl<'a> From<Option<&'a MessageEnvelope>> for PromptInput<'a> {
    fn from(message: Option<&'a MessageEnvelope>) -> Self {
        message.map_or(Self::Skip, Self::One)
    }
}

impl<'a> From<&'a [MessageEnvelope]> for PromptInput<'a> {
    fn from(messages: &'a [MessageEnvelope]) -> Self {
        Self::Many(messages)
    }
}

impl<'a> From<&'a Vec<MessageEnvelope>> for PromptInput<'a> {
    fn from(messages: &'a Vec<MessageEnvelope>) -> Self {
        Self::Many(messages)
    }
}

impl<'a> From<&'a Value> for PromptInput<'a> {
    fn from(value: &'a Value) -> Self {
        Self::Raw(value)
    }
}

/// Builds a system block plus one merged history block from records.
///
/// Only the very first record may become the system block, and only when its
/// role is `system`. Every other record, whatever its role, is rendered as
/// `"{name}: {content}"` into the history block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationFormatter {
    history_header: String,
}

impl Default for ConversationFormatter {
    fn default() -> Self {
        Self {
            history_header: HISTORY_HEADER.to_string(),
        }
    }
}

impl ConversationFormatter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a different title for the history block.
    pub fn with_history_header(mut self, header: impl Into<String>) -> Self {
        self.history_header = header.into();
        self
    }

    /// Flatten the inputs in order and build the request payload.
    ///
    /// Always returns one or two blocks. Pure: no input is mutated.
    pub fn format<'a, I>(&self, inputs: I) -> Result<Vec<PromptBlock>, FormatError>
    where
        I: IntoIterator<Item = PromptInput<'a>>,
    {
        let records = flatten(inputs)?;

        let mut blocks = Vec::with_capacity(2);
        let mut dialogue = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            if index == 0 && record.role() == Role::System {
                blocks.push(PromptBlock::new(
                    Role::System,
                    content_to_string(record.content()),
                ));
            } else {
                dialogue.push(record.render_as_text());
            }
        }

        blocks.push(PromptBlock::new(
            Role::User,
            format!("{}\n{}", self.history_header, dialogue.join("\n")),
        ));
        Ok(blocks)
    }
}

fn flatten<'a, I>(inputs: I) -> Result<Vec<Cow<'a, MessageEnvelope>>, FormatError>
where
    I: IntoIterator<Item = PromptInput<'a>>,
{
    let mut records = Vec::new();
    for (position, input) in inputs.into_iter().enumerate() {
        match input {
            PromptInput::Skip => {}
            PromptInput::One(message) => records.push(Cow::Borrowed(message)),
            PromptInput::Many(messages) => records.extend(messages.iter().map(Cow::Borrowed)),
            PromptInput::Raw(Value::Null) => {}
            PromptInput::Raw(Value::Array(items)) => {
                let decoded = items
                    .iter()
                    .map(decode_record)
                    .collect::<Option<Vec<_>>>()
                    .ok_or(FormatError::UnsupportedInput {
                        position,
                        kind: "list with non-message items",
                    })?;
                records.extend(decoded.into_iter().map(Cow::Owned));
            }
            PromptInput::Raw(value) => {
                let message = decode_record(value).ok_or(FormatError::UnsupportedInput {
                    position,
                    kind: value_kind(value),
                })?;
                records.push(Cow::Owned(message));
            }
        }
    }
    Ok(records)
}

fn decode_record(value: &Value) -> Option<MessageEnvelope> {
    if !value.is_object() {
        return None;
    }
    serde_json::from_value(value.clone()).ok()
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "list",
        Value::Object(_) => "object without message fields",
    }
}
