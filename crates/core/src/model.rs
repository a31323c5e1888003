use std::fmt;
use std::str::FromStr;

use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ulid::Ulid;

/// Open-ended, insertion-ordered parameter mapping attached to a task.
pub type Parameters = Map<String, Value>;

/// Structured configuration object handled by the codec.
pub type ConfigDocument = Map<String, Value>;

pub const ALGORITHM_CHOICES: [&str; 3] = ["PPO", "DQN", "SAC"];
pub const ENVIRONMENT_CHOICES: [&str; 3] = ["CartPole-v1", "LunarLander-v2", "Pendulum-v1"];

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "pending",
            TaskStatus::Running => "running",
            TaskStatus::Completed => "completed",
            TaskStatus::Failed => "failed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "pending" => Ok(TaskStatus::Pending),
            "running" => Ok(TaskStatus::Running),
            "completed" | "complete" | "done" => Ok(TaskStatus::Completed),
            "failed" => Ok(TaskStatus::Failed),
            other => Err(anyhow!(
                "Unknown status '{}': expected pending|running|completed|failed",
                other
            )),
        }
    }
}

impl ValueEnum for TaskStatus {
    fn value_variants<'a>() -> &'a [Self] {
        const VARIANTS: [TaskStatus; 4] = [
            TaskStatus::Pending,
            TaskStatus::Running,
            TaskStatus::Completed,
            TaskStatus::Failed,
        ];
        &VARIANTS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

/// Textual representation used for configuration documents.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ConfigFormat {
    #[default]
    Json,
    Yaml,
}

impl ConfigFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "json",
            ConfigFormat::Yaml => "yaml",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ConfigFormat::Json => "JSON",
            ConfigFormat::Yaml => "YAML",
        }
    }

    pub fn toggled(self) -> Self {
        match self {
            ConfigFormat::Json => ConfigFormat::Yaml,
            ConfigFormat::Yaml => ConfigFormat::Json,
        }
    }
}

impl fmt::Display for ConfigFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ConfigFormat {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            other => Err(anyhow!("Unknown format '{}': expected json|yaml", other)),
        }
    }
}

impl ValueEnum for ConfigFormat {
    fn value_variants<'a>() -> &'a [Self] {
        &[ConfigFormat::Json, ConfigFormat::Yaml]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Submitter {
    pub name: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub name: String,
    pub status: TaskStatus,
    pub algorithm: String,
    pub environment: String,
    pub parameters: Parameters,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub submitter: Submitter,
}

impl Task {
    /// The `{algorithm, environment, parameters}` document shown in the configuration view.
    pub fn config_document(&self) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.insert("algorithm".into(), Value::String(self.algorithm.clone()));
        doc.insert("environment".into(), Value::String(self.environment.clone()));
        doc.insert("parameters".into(), Value::Object(self.parameters.clone()));
        doc
    }
}

/// Task-creation payload accepted by a [`crate::store::TaskBackend`].
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct NewTask {
    pub name: String,
    pub algorithm: String,
    pub environment: String,
    pub parameters: Parameters,
}

impl NewTask {
    pub fn into_task(self, submitter: &Submitter, now: DateTime<Utc>) -> Task {
        Task {
            id: Ulid::new().to_string(),
            name: self.name,
            status: TaskStatus::Pending,
            algorithm: self.algorithm,
            environment: self.environment,
            parameters: self.parameters,
            created_at: now,
            updated_at: now,
            submitter: submitter.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Warning,
    Error,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Info => "info",
            LogLevel::Warning => "warning",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct ResourceMetrics {
    pub cpu_usage: f64,
    pub memory_usage: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gpu_usage: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn submitter() -> Submitter {
        Submitter {
            name: "Ada".into(),
            avatar_url: "https://example.com/ada.png".into(),
        }
    }

    #[test]
    fn new_task_starts_pending_with_matching_timestamps() {
        let now = Utc::now();
        let task = NewTask {
            name: "Run".into(),
            algorithm: "SAC".into(),
            environment: "Pendulum-v1".into(),
            parameters: Parameters::new(),
        }
        .into_task(&submitter(), now);

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.created_at, now);
        assert_eq!(task.updated_at, now);
        assert_eq!(task.submitter.name, "Ada");
        assert!(!task.id.is_empty());
    }

    #[test]
    fn task_serializes_with_camel_case_fields() {
        let now = Utc::now();
        let task = NewTask {
            name: "Run".into(),
            algorithm: "PPO".into(),
            environment: "CartPole-v1".into(),
            parameters: Parameters::new(),
        }
        .into_task(&submitter(), now);

        let value = serde_json::to_value(&task).unwrap();
        assert!(value.get("createdAt").is_some());
        assert_eq!(
            value["submitter"],
            json!({"name": "Ada", "avatarUrl": "https://example.com/ada.png"})
        );
        assert_eq!(value["status"], json!("pending"));
    }

    #[test]
    fn status_and_format_parse_case_insensitively() {
        assert_eq!("Running".parse::<TaskStatus>().unwrap(), TaskStatus::Running);
        assert!("paused".parse::<TaskStatus>().is_err());
        assert_eq!("YML".parse::<ConfigFormat>().unwrap(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::Json.toggled(), ConfigFormat::Yaml);
        assert_eq!(ConfigFormat::Yaml.toggled().label(), "JSON");
    }
}
