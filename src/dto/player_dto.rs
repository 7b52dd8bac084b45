use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A drafted player as sent by the client.
///
/// Only `position` is interpreted by the coordinator. Every other field
/// (`id`, `name`, `team`, ...) is kept exactly as received, nulls included.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub position: String,

    #[serde(flatten)]
    pub fields: Map<String, Value>,
}

impl Player {
    pub fn name(&self) -> Option<&str> {
        self.fields.get("name").and_then(Value::as_str)
    }
}
