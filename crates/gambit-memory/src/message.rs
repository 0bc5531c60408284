//! Message envelope exchanged between participants and stored in memory.

use crate::error::MemoryError;
use chrono::Local;
use log::warn;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Timestamp layout used for envelopes created in-process.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
/// Speaker name used by thought records.
const THOUGHT_NAME: &str = "thought";

/// Serialized field names that extra attributes may not shadow.
const RESERVED_KEYS: [&str; 8] = [
    "__type",
    "id",
    "name",
    "content",
    "role",
    "url",
    "timestamp",
    "embedding",
];

/// Speaker role for a message. Governs prompt placement only.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// System-generated message.
    System,
    /// User-authored message.
    User,
    /// Assistant-authored message.
    #[default]
    Assistant,
}

impl Role {
    /// Return the role as a lowercase string.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = MemoryError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "system" => Ok(Role::System),
            "user" => Ok(Role::User),
            "assistant" => Ok(Role::Assistant),
            other => Err(MemoryError::InvalidRole(other.to_string())),
        }
    }
}

/// Concrete envelope variant, persisted under the `__type` tag.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum MessageKind {
    /// Regular message visible to other participants.
    #[default]
    #[serde(rename = "Msg")]
    Message,
    /// Private reasoning that is never shown to other participants.
    #[serde(rename = "Tht")]
    Thought,
}

/// One utterance in a conversation.
///
/// Identity, speaker, role and timestamp are fixed at construction. Content may
/// be replaced (and an embedding attached) without changing identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MessageEnvelope {
    #[serde(rename = "__type", default)]
    kind: MessageKind,
    #[serde(default = "new_id")]
    id: String,
    name: String,
    #[serde(default)]
    content: Value,
    #[serde(default = "default_role")]
    role: Role,
    #[serde(
        default,
        deserialize_with = "deserialize_url",
        skip_serializing_if = "Option::is_none"
    )]
    url: Option<Vec<String>>,
    #[serde(default = "now_timestamp")]
    timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    embedding: Option<Vec<f32>>,
    #[serde(flatten)]
    extra: Map<String, Value>,
}

impl MessageEnvelope {
    /// Create a message. A missing role falls back to `assistant` with a warning.
    pub fn new(
        name: impl Into<String>,
        content: impl Into<Value>,
        role: impl Into<Option<Role>>,
    ) -> Self {
        let role = role.into().unwrap_or_else(default_role);
        Self {
            kind: MessageKind::Message,
            id: new_id(),
            name: name.into(),
            content: content.into(),
            role,
            url: None,
            timestamp: now_timestamp(),
            embedding: None,
            extra: Map::new(),
        }
    }

    /// Create a private thought record.
    pub fn thought(content: impl Into<Value>) -> Self {
        Self {
            kind: MessageKind::Thought,
            ..Self::new(THOUGHT_NAME, content, Role::Assistant)
        }
    }

    /// Attach external resource locators (files, images, urls).
    pub fn with_url<I, S>(mut self, urls: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let urls: Vec<String> = urls.into_iter().map(Into::into).collect();
        self.url = if urls.is_empty() { None } else { Some(urls) };
        self
    }

    /// Override the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: impl Into<String>) -> Self {
        self.timestamp = timestamp.into();
        self
    }

    /// Add an extra attribute carried alongside the standard fields.
    ///
    /// Keys naming a standard field are ignored.
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        let key = key.into();
        if RESERVED_KEYS.contains(&key.as_str()) {
            warn!("ignoring extra attribute with reserved key (key={key})");
            return self;
        }
        self.extra.insert(key, value.into());
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn content(&self) -> &Value {
        &self.content
    }

    /// Replace the content; identity is unchanged.
    pub fn set_content(&mut self, content: impl Into<Value>) {
        self.content = content.into();
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn kind(&self) -> MessageKind {
        self.kind
    }

    pub fn timestamp(&self) -> &str {
        &self.timestamp
    }

    pub fn url(&self) -> Option<&[String]> {
        self.url.as_deref()
    }

    pub fn embedding(&self) -> Option<&[f32]> {
        self.embedding.as_deref()
    }

    pub(crate) fn set_embedding(&mut self, embedding: Vec<f32>) {
        self.embedding = Some(embedding);
    }

    /// Extra attributes that are not part of the standard field set.
    pub fn extra(&self) -> &Map<String, Value> {
        &self.extra
    }

    /// Render as a single history line.
    pub fn render_as_text(&self) -> String {
        let content = content_to_string(&self.content);
        match self.kind {
            MessageKind::Message => format!("{}: {content}", self.name),
            MessageKind::Thought => format!("{} thought: {content}", self.name),
        }
    }

    /// Structured representation tagged with the variant, used for persistence.
    pub fn serialize(&self) -> Result<Value, MemoryError> {
        Ok(serde_json::to_value(self)?)
    }
}

impl fmt::Display for MessageEnvelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render_as_text())
    }
}

/// Render content for prompts: strings verbatim, everything else as compact JSON.
pub fn content_to_string(content: &Value) -> String {
    match content {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

fn new_id() -> String {
    Uuid::new_v4().simple().to_string()
}

fn now_timestamp() -> String {
    Local::now().format(TIMESTAMP_FORMAT).to_string()
}

fn default_role() -> Role {
    warn!("message created without a role; defaulting to \"assistant\"");
    Role::Assistant
}

#[derive(Deserialize)]
#[serde(untagged)]
enum UrlField {
    One(String),
    Many(Vec<String>),
}

/// Accept `url` as a single locator, a list, or null.
fn deserialize_url<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    let field = Option::<UrlField>::deserialize(deserializer)?;
    Ok(field
        .map(|field| match field {
            UrlField::One(url) => vec![url],
            UrlField::Many(urls) => urls,
        })
        .filter(|urls| !urls.is_empty()))
}

#[cfg(test)]
mod tests {
    use super::{MessageEnvelope, MessageKind, Role};
    use pretty_assertions::assert_eq;
    use serde_json::json;

    #[test]
    fn missing_role_defaults_to_assistant() {
        let message = MessageEnvelope::new("bob", "hi", None);
        assert_eq!(message.role(), Role::Assistant);
        assert_eq!(message.kind(), MessageKind::Message);
    }

    #[test]
    fn ids_are_unique() {
        let first = MessageEnvelope::new("a", "x", Role::User);
        let second = MessageEnvelope::new("a", "x", Role::User);
        assert!(first.id() != second.id());
    }

    #[test]
    fn render_uses_plain_strings_and_json_for_structures() {
        let text = MessageEnvelope::new("A", "hi", Role::User);
        assert_eq!(text.render_as_text(), "A: hi");

        let coords = MessageEnvelope::new("B", json!([3, 3]), Role::Assistant);
        assert_eq!(coords.render_as_text(), "B: [3,3]");
        assert_eq!(coords.to_string(), "B: [3,3]");
    }

    #[test]
    fn thought_renders_with_marker() {
        let thought = MessageEnvelope::thought("I should block the row");
        assert_eq!(thought.name(), "thought");
        assert_eq!(thought.role(), Role::Assistant);
        assert_eq!(
            thought.render_as_text(),
            "thought thought: I should block the row"
        );
    }

    #[test]
    fn serialize_tags_variant_and_fields() {
        let message =
            MessageEnvelope::new("A", "hi", Role::User).with_timestamp("2024-01-01 00:00:00");
        let value = message.serialize().expect("serialize");
        assert_eq!(value["__type"], json!("Msg"));
        assert_eq!(value["name"], json!("A"));
        assert_eq!(value["content"], json!("hi"));
        assert_eq!(value["role"], json!("user"));
        assert_eq!(value["timestamp"], json!("2024-01-01 00:00:00"));
        assert_eq!(value["id"], json!(message.id()));

        let thought = MessageEnvelope::thought("hmm").serialize().expect("serialize");
        assert_eq!(thought["__type"], json!("Tht"));
    }

    #[test]
    fn deserialize_accepts_legacy_records() {
        let value = json!({
            "id": "abc",
            "name": "A",
            "content": [1, 2],
            "role": "user",
            "timestamp": "2024-01-01 10:00:00",
            "url": "https://example.com/board.png",
            "turn": 3
        });
        let message: MessageEnvelope = serde_json::from_value(value).expect("decode");
        assert_eq!(message.id(), "abc");
        assert_eq!(message.kind(), MessageKind::Message);
        assert_eq!(
            message.url(),
            Some(&["https://example.com/board.png".to_string()][..])
        );
        assert_eq!(message.extra().get("turn"), Some(&json!(3)));

        let round_trip = message.serialize().expect("serialize");
        assert_eq!(round_trip["turn"], json!(3));
        assert_eq!(round_trip["url"], json!(["https://example.com/board.png"]));
    }

    #[test]
    fn deserialize_rejects_unknown_role() {
        let value = json!({ "name": "A", "content": "x", "role": "tool" });
        let result = serde_json::from_value::<MessageEnvelope>(value);
        assert!(result.is_err());
    }

    #[test]
    fn set_content_keeps_identity() {
        let mut message = MessageEnvelope::new("A", "draft", Role::Assistant);
        let id = message.id().to_string();
        message.set_content(json!([0, 1]));
        assert_eq!(message.id(), id);
        assert_eq!(message.content(), &json!([0, 1]));
    }

    #[test]
    fn role_parses_known_values_only() {
        assert_eq!("system".parse::<Role>().expect("role"), Role::System);
        assert_eq!(Role::User.as_str(), "user");
        assert!("tool".parse::<Role>().is_err());
    }

    #[test]
    fn extra_cannot_shadow_standard_fields() {
        let message = MessageEnvelope::new("A", "x", Role::User)
            .with_extra("id", "forged")
            .with_extra("role", "system")
            .with_extra("turn", 2);
        assert_eq!(message.extra().len(), 1);

        let value = message.serialize().expect("serialize");
        assert_eq!(value["id"], json!(message.id()));
        assert_eq!(value["role"], json!("user"));
        assert_eq!(value["turn"], json!(2));
    }
}
