use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// A tool call requested by the model, in the chat-completions wire shape.
///
/// `arguments` is kept as the raw JSON-encoded string the model produced so
/// stored history round-trips byte for byte.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    #[serde(rename = "type", default = "d_function")]
    pub kind: String,
    pub function: FunctionCall,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    pub name: String,
    #[serde(default)]
    pub arguments: String,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: &Value) -> Self {
        Self {
            id: id.into(),
            kind: d_function(),
            function: FunctionCall {
                name: name.into(),
                arguments: arguments.to_string(),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }

    /// Decode the argument string. An empty string decodes as `{}`.
    pub fn parsed_arguments(&self) -> serde_json::Result<Value> {
        if self.function.arguments.trim().is_empty() {
            return Ok(Value::Object(Default::default()));
        }
        serde_json::from_str(&self.function.arguments)
    }
}

fn d_function() -> String {
    "function".into()
}

/// Tool definition exposed to the LLM.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    /// JSON Schema for the tool's parameters.
    pub parameters: Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
    Assistant,
    Tool,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::System => "system",
            Role::User => "user",
            Role::Assistant => "assistant",
            Role::Tool => "tool",
        }
    }
}

/// One message in a conversation.
///
/// Serializes to the same JSON the completion API accepts, which is also the
/// shape persisted in the `messages` column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub content: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "lenient_tool_calls"
    )]
    pub tool_calls: Option<Vec<ToolCall>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tool_call_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

// ── Convenience constructors ───────────────────────────────────────

impl Turn {
    fn plain(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            content: text.into(),
            tool_calls: None,
            tool_call_id: None,
            name: None,
        }
    }

    pub fn system(text: impl Into<String>) -> Self {
        Self::plain(Role::System, text)
    }
    pub fn user(text: impl Into<String>) -> Self {
        Self::plain(Role::User, text)
    }
    pub fn assistant(text: impl Into<String>) -> Self {
        Self::plain(Role::Assistant, text)
    }
    pub fn assistant_with_tools(text: impl Into<String>, calls: Vec<ToolCall>) -> Self {
        Self {
            tool_calls: Some(calls),
            ..Self::plain(Role::Assistant, text)
        }
    }
    pub fn tool_result(
        tool_call_id: impl Into<String>,
        name: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            tool_call_id: Some(tool_call_id.into()),
            name: Some(name.into()),
            ..Self::plain(Role::Tool, content)
        }
    }

    /// True for the two roles that make up a human-readable transcript.
    pub fn is_dialogue(&self) -> bool {
        matches!(self.role, Role::User | Role::Assistant)
    }
}

// ── serde helpers ──────────────────────────────────────────────────

fn null_as_empty<'de, D>(de: D) -> std::result::Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(de)?.unwrap_or_default())
}

/// Stored history may carry `tool_calls: {}` or `tool_calls: null`; anything
/// that is not a list reads as absent and malformed entries are skipped.
fn lenient_tool_calls<'de, D>(de: D) -> std::result::Result<Option<Vec<ToolCall>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<Value>::deserialize(de)?;
    Ok(match raw {
        Some(Value::Array(items)) => Some(
            items
                .into_iter()
                .filter_map(|v| serde_json::from_value::<ToolCall>(v).ok())
                .collect(),
        ),
        _ => None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn null_content_reads_as_empty() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "assistant",
            "content": null,
            "tool_calls": [{
                "id": "call_1",
                "type": "function",
                "function": { "name": "show_food_image", "arguments": "{\"dish_name\":\"Wagyu Steak\"}" }
            }]
        }))
        .unwrap();
        assert_eq!(turn.content, "");
        let calls = turn.tool_calls.unwrap();
        assert_eq!(calls[0].name(), "show_food_image");
        assert_eq!(calls[0].parsed_arguments().unwrap()["dish_name"], "Wagyu Steak");
    }

    #[test]
    fn non_list_tool_calls_read_as_absent() {
        let turn: Turn = serde_json::from_value(json!({
            "role": "assistant",
            "content": "hi",
            "tool_calls": { "oops": true }
        }))
        .unwrap();
        assert!(turn.tool_calls.is_none());
    }

    #[test]
    fn plain_turn_serializes_without_optional_fields() {
        let v = serde_json::to_value(Turn::user("hello")).unwrap();
        assert_eq!(v, json!({ "role": "user", "content": "hello" }));
    }

    #[test]
    fn tool_result_carries_link_fields() {
        let v = serde_json::to_value(Turn::tool_result("call_9", "get_menu", "{}")).unwrap();
        assert_eq!(v["role"], "tool");
        assert_eq!(v["tool_call_id"], "call_9");
        assert_eq!(v["name"], "get_menu");
    }

    #[test]
    fn empty_arguments_parse_as_empty_object() {
        let call = ToolCall {
            id: "c".into(),
            kind: "function".into(),
            function: FunctionCall {
                name: "get_menu".into(),
                arguments: String::new(),
            },
        };
        assert_eq!(call.parsed_arguments().unwrap(), json!({}));
    }
}
