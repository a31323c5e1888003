//! Conversion between configuration documents and their JSON or YAML text.
//!
//! Parsing always yields a recoverable [`ParseError`]; serialization never fails for a
//! document that only holds JSON-representable values.

use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{ConfigDocument, ConfigFormat};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Invalid {} syntax: {message}", .format.label())]
    Syntax {
        format: ConfigFormat,
        message: String,
    },
    #[error("{} configuration must be a mapping, found {found}", .format.label())]
    NotAMapping {
        format: ConfigFormat,
        found: &'static str,
    },
}

impl ParseError {
    pub fn format(&self) -> ConfigFormat {
        match self {
            ParseError::Syntax { format, .. } | ParseError::NotAMapping { format, .. } => *format,
        }
    }
}

/// Render a document as pretty-printed text in `format`.
pub fn serialize(config: &ConfigDocument, format: ConfigFormat) -> String {
    serialize_value(&Value::Object(config.clone()), format)
}

pub(crate) fn serialize_value(value: &Value, format: ConfigFormat) -> String {
    let json = || serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
    match format {
        ConfigFormat::Json => json(),
        // JSON is a subset of YAML, so the fallback still parses under the YAML format.
        ConfigFormat::Yaml => serde_yaml::to_string(value).unwrap_or_else(|err| {
            tracing::warn!(error = %err, "yaml emitter failed, falling back to json text");
            json()
        }),
    }
}

/// Decode `text` as `format`, requiring the top level to be a mapping.
pub fn parse(text: &str, format: ConfigFormat) -> Result<ConfigDocument, ParseError> {
    let value = match format {
        ConfigFormat::Json => serde_json::from_str::<Value>(text).map_err(|err| err.to_string()),
        ConfigFormat::Yaml => serde_yaml::from_str::<Value>(text).map_err(|err| err.to_string()),
    }
    .map_err(|message| ParseError::Syntax { format, message })?;

    match value {
        Value::Object(map) => Ok(map),
        other => Err(ParseError::NotAMapping {
            format,
            found: value_kind(&other),
        }),
    }
}

/// Parse `text` as `from` and re-render it as `to`.
///
/// Blank input yields the example configuration rendered as `to`.
pub fn convert(text: &str, from: ConfigFormat, to: ConfigFormat) -> Result<String, ParseError> {
    if text.trim().is_empty() {
        return Ok(serialize(&example_config(), to));
    }
    let config = parse(text, from)?;
    Ok(serialize(&config, to))
}

pub fn example_config() -> ConfigDocument {
    let value = json!({
        "algorithm": "PPO",
        "environment": "CartPole-v1",
        "parameters": {
            "learningRate": 0.0003,
            "batchSize": 64,
            "episodes": 1000,
            "network": {
                "type": "mlp",
                "hidden_sizes": [64, 64],
                "activation": "tanh"
            },
            "optimizer": {
                "type": "adam",
                "epsilon": 1e-5,
                "learning_rate_schedule": "linear"
            },
            "ppo_specific": {
                "clip_range": 0.2,
                "vf_coef": 0.5,
                "ent_coef": 0.01
            }
        }
    });
    match value {
        Value::Object(map) => map,
        _ => ConfigDocument::new(),
    }
}

pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
