use serde::Deserialize;
use serde_json::{Map, Value};

use crate::remote::RemoteError;

/// Decoded request envelope. The command name comes from the URL path, not the body.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct CommandRequest {
    #[serde(default)]
    pub authorization: Option<String>,
    /// Left raw: only commands that take arguments look inside it.
    #[serde(default)]
    pub params: Option<Value>,
}

/// Command arguments. Values are scalars; `time` may arrive as a number or a numeric string.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct Params {
    #[serde(default)]
    pub time: Option<Value>,
    #[serde(default)]
    pub unit: Option<Value>,
    #[serde(default)]
    pub mode: Option<Value>,
}

impl CommandRequest {
    /// Decode a JSON body. Anything other than a JSON object is an invalid request.
    pub fn from_json(body: &[u8]) -> Result<Self, RemoteError> {
        let value: Value = serde_json::from_slice(body)
            .map_err(|e| RemoteError::InvalidRequest(format!("malformed JSON body: {e}")))?;
        if !value.is_object() {
            return Err(RemoteError::InvalidRequest(
                "request body must be a JSON object".to_string(),
            ));
        }
        serde_json::from_value(value)
            .map_err(|e| RemoteError::InvalidRequest(format!("malformed request envelope: {e}")))
    }

    pub fn authorization(&self) -> Result<&str, RemoteError> {
        self.authorization
            .as_deref()
            .ok_or(RemoteError::MissingField("authorization"))
    }
}

/// Query-string shape of the older GET interface: `?__authorization=..&__time=..`.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct LegacyQuery {
    #[serde(rename = "__authorization")]
    pub authorization: Option<String>,
    #[serde(rename = "__time")]
    pub time: Option<String>,
    #[serde(rename = "__unit")]
    pub unit: Option<String>,
    #[serde(rename = "__mode")]
    pub mode: Option<String>,
}

impl From<LegacyQuery> for CommandRequest {
    fn from(query: LegacyQuery) -> Self {
        let mut params = Map::new();
        for (field, value) in [("time", query.time), ("unit", query.unit), ("mode", query.mode)] {
            if let Some(value) = value {
                params.insert(field.to_string(), Value::String(value));
            }
        }
        CommandRequest {
            authorization: query.authorization,
            params: (!params.is_empty()).then_some(Value::Object(params)),
        }
    }
}

impl Params {
    /// Read the `params` block. Anything other than a JSON object counts as
    /// missing, like an absent block.
    pub fn from_value(value: Option<&Value>) -> Result<Self, RemoteError> {
        match value {
            Some(value @ Value::Object(_)) => {
                Params::deserialize(value).map_err(|_| RemoteError::MissingField("params"))
            }
            _ => Err(RemoteError::MissingField("params")),
        }
    }

    /// Non-negative, finite number of time units.
    pub fn time(&self) -> Result<f64, RemoteError> {
        let value = present(&self.time, "time")?;
        let parsed = match value {
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        };
        match parsed {
            Some(t) if t.is_finite() && t >= 0.0 => Ok(t),
            _ => Err(RemoteError::InvalidParameter {
                field: "time",
                value: value.to_string(),
            }),
        }
    }

    pub fn unit(&self) -> Result<String, RemoteError> {
        text(present(&self.unit, "unit")?, "unit")
    }

    pub fn mode(&self) -> Result<String, RemoteError> {
        text(present(&self.mode, "mode")?, "mode")
    }
}

fn present<'a>(value: &'a Option<Value>, field: &'static str) -> Result<&'a Value, RemoteError> {
    match value {
        None | Some(Value::Null) => Err(RemoteError::MissingField(field)),
        Some(v) => Ok(v),
    }
}

// Scalars compare by their plain text form; arrays and objects are malformed.
fn text(value: &Value, field: &'static str) -> Result<String, RemoteError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(RemoteError::MissingField(field)),
    }
}
