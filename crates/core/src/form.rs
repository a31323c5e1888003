use chrono::Utc;
use serde_json::{json, Value};
use thiserror::Error;

use crate::codec::{self, ParseError};
use crate::model::{ConfigDocument, ConfigFormat, NewTask, Parameters, Submitter, Task};
use crate::store::TaskBackend;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FormMode {
    #[default]
    Simple,
    Advanced,
}

impl FormMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            FormMode::Simple => "simple",
            FormMode::Advanced => "advanced",
        }
    }
}

/// Typed fields edited in simple mode.
#[derive(Debug, Clone, PartialEq)]
pub struct SimpleDraft {
    pub algorithm: String,
    pub environment: String,
    pub learning_rate: f64,
    pub batch_size: u32,
    pub episodes: u32,
}

impl Default for SimpleDraft {
    fn default() -> Self {
        Self {
            algorithm: String::from("PPO"),
            environment: String::from("CartPole-v1"),
            learning_rate: 0.0003,
            batch_size: 64,
            episodes: 1000,
        }
    }
}

impl SimpleDraft {
    pub fn parameters(&self) -> Parameters {
        let mut params = Parameters::new();
        params.insert("learningRate".into(), json!(self.learning_rate));
        params.insert("batchSize".into(), json!(self.batch_size));
        params.insert("episodes".into(), json!(self.episodes));
        params
    }

    /// Snapshot used when switching into advanced mode.
    pub fn to_document(&self) -> ConfigDocument {
        let mut doc = ConfigDocument::new();
        doc.insert("algorithm".into(), Value::String(self.algorithm.clone()));
        doc.insert("environment".into(), Value::String(self.environment.clone()));
        doc.insert("parameters".into(), Value::Object(self.parameters()));
        doc
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimpleField {
    Algorithm,
    Environment,
    LearningRate,
    BatchSize,
    Episodes,
}

impl SimpleField {
    pub const ALL: [SimpleField; 5] = [
        SimpleField::Algorithm,
        SimpleField::Environment,
        SimpleField::LearningRate,
        SimpleField::BatchSize,
        SimpleField::Episodes,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            SimpleField::Algorithm => "Algorithm",
            SimpleField::Environment => "Environment",
            SimpleField::LearningRate => "Learning Rate",
            SimpleField::BatchSize => "Batch Size",
            SimpleField::Episodes => "Episodes",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Task name cannot be empty")]
    EmptyName,
    #[error("{field} expects a number, got '{input}'")]
    InvalidNumber { field: &'static str, input: String },
    #[error("{field} must be a finite, non-negative number, got '{input}'")]
    OutOfRange { field: &'static str, input: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormatToggleError {
    #[error("Switch to advanced mode to change the format")]
    SimpleMode,
    #[error(transparent)]
    Parse(#[from] ParseError),
}

#[derive(Debug, Error)]
pub enum SubmitError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("Backend rejected the task: {0}")]
    Backend(anyhow::Error),
}

/// Draft state behind the task submission form.
#[derive(Debug, Clone)]
pub struct FormController {
    name: String,
    mode: FormMode,
    format: ConfigFormat,
    initial_format: ConfigFormat,
    simple: SimpleDraft,
    raw_text: String,
    parse_error: Option<String>,
}

impl Default for FormController {
    fn default() -> Self {
        Self::new(ConfigFormat::Json)
    }
}

impl FormController {
    pub fn new(format: ConfigFormat) -> Self {
        Self {
            name: String::new(),
            mode: FormMode::Simple,
            format,
            initial_format: format,
            simple: SimpleDraft::default(),
            raw_text: String::new(),
            parse_error: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn mode(&self) -> FormMode {
        self.mode
    }

    pub fn format(&self) -> ConfigFormat {
        self.format
    }

    pub fn simple(&self) -> &SimpleDraft {
        &self.simple
    }

    pub fn raw_text(&self) -> &str {
        &self.raw_text
    }

    pub fn parse_error(&self) -> Option<&str> {
        self.parse_error.as_deref()
    }

    pub fn set_name<T: Into<String>>(&mut self, name: T) {
        self.name = name.into();
    }

    pub fn set_algorithm<T: Into<String>>(&mut self, algorithm: T) {
        self.simple.algorithm = algorithm.into();
    }

    pub fn set_environment<T: Into<String>>(&mut self, environment: T) {
        self.simple.environment = environment.into();
    }

    /// Rates must be finite and non-negative; a rejected value leaves the field as it was.
    pub fn set_learning_rate(&mut self, value: f64) -> Result<(), ValidationError> {
        if !value.is_finite() || value < 0.0 {
            return Err(ValidationError::OutOfRange {
                field: SimpleField::LearningRate.label(),
                input: value.to_string(),
            });
        }
        self.simple.learning_rate = value;
        Ok(())
    }

    pub fn set_batch_size(&mut self, value: u32) {
        self.simple.batch_size = value;
    }

    pub fn set_episodes(&mut self, value: u32) {
        self.simple.episodes = value;
    }

    /// Replace the advanced buffer. Any stale parse error is dropped.
    pub fn set_raw_text<T: Into<String>>(&mut self, text: T) {
        self.raw_text = text.into();
        self.parse_error = None;
    }

    /// Apply text typed into a simple field, keeping the old value when it does not parse.
    pub fn apply_field_input(
        &mut self,
        field: SimpleField,
        input: &str,
    ) -> Result<(), ValidationError> {
        let trimmed = input.trim();
        let invalid = || ValidationError::InvalidNumber {
            field: field.label(),
            input: input.to_string(),
        };
        match field {
            SimpleField::Algorithm => self.set_algorithm(trimmed),
            SimpleField::Environment => self.set_environment(trimmed),
            SimpleField::LearningRate => {
                let value: f64 = trimmed.parse().map_err(|_| invalid())?;
                self.set_learning_rate(value)?;
            }
            SimpleField::BatchSize => {
                let value = trimmed.parse().map_err(|_| invalid())?;
                self.set_batch_size(value);
            }
            SimpleField::Episodes => {
                let value = trimmed.parse().map_err(|_| invalid())?;
                self.set_episodes(value);
            }
        }
        Ok(())
    }

    pub fn field_value(&self, field: SimpleField) -> String {
        match field {
            SimpleField::Algorithm => self.simple.algorithm.clone(),
            SimpleField::Environment => self.simple.environment.clone(),
            SimpleField::LearningRate => self.simple.learning_rate.to_string(),
            SimpleField::BatchSize => self.simple.batch_size.to_string(),
            SimpleField::Episodes => self.simple.episodes.to_string(),
        }
    }

    /// Switch between simple and advanced editing.
    ///
    /// Entering advanced mode snapshots the simple fields into the raw buffer at the
    /// current format. Leaving it does not pull advanced edits back into the fields.
    pub fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            FormMode::Simple => {
                self.raw_text = codec::serialize(&self.simple.to_document(), self.format);
                FormMode::Advanced
            }
            FormMode::Advanced => FormMode::Simple,
        };
        self.parse_error = None;
        tracing::debug!(mode = self.mode.as_str(), "form mode toggled");
    }

    /// Re-render the advanced buffer in the other format.
    ///
    /// Only valid in advanced mode. On a parse failure the text and format are left
    /// untouched and the error is kept for display.
    pub fn toggle_format(&mut self) -> Result<(), FormatToggleError> {
        if self.mode == FormMode::Simple {
            return Err(FormatToggleError::SimpleMode);
        }
        let next = self.format.toggled();
        if self.raw_text.trim().is_empty() {
            self.raw_text = codec::serialize(&codec::example_config(), next);
        } else {
            match codec::parse(&self.raw_text, self.format) {
                Ok(doc) => self.raw_text = codec::serialize(&doc, next),
                Err(err) => {
                    tracing::warn!(error = %err, "format toggle rejected");
                    self.parse_error = Some(err.to_string());
                    return Err(err.into());
                }
            }
        }
        self.format = next;
        self.parse_error = None;
        tracing::debug!(format = next.as_str(), "config format toggled");
        Ok(())
    }

    pub fn load_example(&mut self) {
        self.raw_text = codec::serialize(&codec::example_config(), self.format);
        self.parse_error = None;
    }

    /// Assemble the creation payload without touching any store.
    pub fn build_payload(&mut self) -> Result<NewTask, SubmitError> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(ValidationError::EmptyName.into());
        }
        let name = name.to_string();

        match self.mode {
            FormMode::Simple => Ok(NewTask {
                name,
                algorithm: self.simple.algorithm.clone(),
                environment: self.simple.environment.clone(),
                parameters: self.simple.parameters(),
            }),
            FormMode::Advanced => {
                let doc = match codec::parse(&self.raw_text, self.format) {
                    Ok(doc) => doc,
                    Err(err) => {
                        tracing::warn!(error = %err, "advanced configuration rejected");
                        self.parse_error = Some(err.to_string());
                        return Err(err.into());
                    }
                };
                match self.merge_document(name, doc) {
                    Ok(payload) => {
                        self.parse_error = None;
                        Ok(payload)
                    }
                    Err(err) => {
                        self.parse_error = Some(err.to_string());
                        Err(err.into())
                    }
                }
            }
        }
    }

    /// Validate, assemble and hand the task to `backend`.
    ///
    /// The backend is only called once the payload is complete, so a failed submit
    /// leaves it untouched. The draft is reset after a successful create.
    pub fn submit(
        &mut self,
        backend: &mut dyn TaskBackend,
        submitter: &Submitter,
    ) -> Result<Task, SubmitError> {
        let payload = self.build_payload()?;
        let task = backend
            .create(payload, submitter, Utc::now())
            .map_err(SubmitError::Backend)?;
        tracing::info!(task_id = task.id.as_str(), mode = self.mode.as_str(), "task submitted");
        self.reset();
        Ok(task)
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.initial_format);
    }

    fn merge_document(&self, name: String, mut doc: ConfigDocument) -> Result<NewTask, ParseError> {
        let algorithm = doc
            .remove("algorithm")
            .and_then(|value| scalar_text("algorithm", value))
            .unwrap_or_else(|| self.simple.algorithm.clone());
        let environment = doc
            .remove("environment")
            .and_then(|value| scalar_text("environment", value))
            .unwrap_or_else(|| self.simple.environment.clone());
        let parameters = match doc.remove("parameters") {
            None | Some(Value::Null) => Parameters::new(),
            Some(Value::Object(map)) => map,
            Some(other) => {
                return Err(ParseError::NotAMapping {
                    format: self.format,
                    found: codec::value_kind(&other),
                })
            }
        };
        doc.remove("name");
        if !doc.is_empty() {
            let dropped: Vec<&str> = doc.keys().map(String::as_str).collect();
            tracing::debug!(?dropped, "ignoring unknown top-level configuration keys");
        }

        Ok(NewTask {
            name,
            algorithm,
            environment,
            parameters,
        })
    }
}

/// Text form of a top-level scalar. Null and nested values count as absent.
fn scalar_text(key: &str, value: Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        Value::Bool(flag) => Some(flag.to_string()),
        Value::Null => None,
        other => {
            tracing::debug!(key, found = codec::value_kind(&other), "ignoring non-scalar value");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::TaskStatus;
    use crate::store::MemoryStore;
    use pretty_assertions::assert_eq;
    use rstest::rstest;

    fn submitter() -> Submitter {
        Submitter {
            name: "Current User".into(),
            avatar_url: "https://example.com/me.png".into(),
        }
    }

    #[test]
    fn simple_submit_stores_pending_task_first() {
        let mut store = MemoryStore::with_sample_tasks();
        let mut form = FormController::default();
        form.set_name("CartPole Run");
        form.set_algorithm("PPO");
        form.set_environment("CartPole-v1");
        form.set_learning_rate(0.0003).unwrap();
        form.set_batch_size(64);
        form.set_episodes(1000);

        let task = form.submit(&mut store, &submitter()).unwrap();

        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(
            Value::Object(task.parameters.clone()),
            json!({"learningRate": 0.0003, "batchSize": 64, "episodes": 1000})
        );
        assert!(store.tasks().iter().filter(|t| t.id == task.id).count() == 1);
        assert_eq!(store.list()[0].id, task.id);
        assert_eq!(store.list()[0].name, "CartPole Run");
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn submit_assigns_fresh_ids() {
        let mut store = MemoryStore::new();
        let mut ids = Vec::new();
        for name in ["one", "two", "three"] {
            let mut form = FormController::default();
            form.set_name(name);
            ids.push(form.submit(&mut store, &submitter()).unwrap().id);
        }
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), 3);
    }

    #[test]
    fn truncated_json_blocks_submission() {
        let mut store = MemoryStore::with_sample_tasks();
        let before = store.len();
        let mut form = FormController::default();
        form.set_name("DQN run");
        form.toggle_mode();
        form.set_raw_text("{\"algorithm\":\"DQN\"");

        let err = form.submit(&mut store, &submitter()).unwrap_err();

        assert!(matches!(err, SubmitError::Parse(ParseError::Syntax { .. })));
        assert_eq!(store.len(), before);
        assert_eq!(form.raw_text(), "{\"algorithm\":\"DQN\"");
        assert!(form.parse_error().is_some());
    }

    #[rstest]
    #[case(FormMode::Simple)]
    #[case(FormMode::Advanced)]
    fn empty_name_is_rejected_before_parsing(#[case] mode: FormMode) {
        let mut store = MemoryStore::new();
        let mut form = FormController::default();
        form.set_name("   ");
        if mode == FormMode::Advanced {
            form.toggle_mode();
            form.set_raw_text("{not valid");
        }

        let err = form.submit(&mut store, &submitter()).unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Validation(ValidationError::EmptyName)
        ));
        assert!(form.parse_error().is_none());
        assert!(store.is_empty());
    }

    #[test]
    fn advanced_submit_merges_top_level_fields() {
        let mut store = MemoryStore::new();
        let mut form = FormController::new(ConfigFormat::Yaml);
        form.set_name("Lander");
        form.toggle_mode();
        form.set_raw_text(
            "name: ignored\nalgorithm: DQN\nenvironment: LunarLander-v2\nparameters:\n  gamma: 0.99\n  layers: [128, 128]\nextra: 1\n",
        );

        let task = form.submit(&mut store, &submitter()).unwrap();

        assert_eq!(task.name, "Lander");
        assert_eq!(task.algorithm, "DQN");
        assert_eq!(task.environment, "LunarLander-v2");
        assert_eq!(
            Value::Object(task.parameters),
            json!({"gamma": 0.99, "layers": [128, 128]})
        );
    }

    #[test]
    fn advanced_submit_falls_back_to_simple_fields() {
        let mut store = MemoryStore::new();
        let mut form = FormController::default();
        form.set_name("Partial");
        form.set_algorithm("SAC");
        form.toggle_mode();
        form.set_raw_text("{\"parameters\": {\"tau\": 0.005}}");

        let task = form.submit(&mut store, &submitter()).unwrap();

        assert_eq!(task.algorithm, "SAC");
        assert_eq!(task.environment, "CartPole-v1");
    }

    #[test]
    fn scalar_parameters_are_rejected() {
        let mut store = MemoryStore::new();
        let mut form = FormController::default();
        form.set_name("Bad params");
        form.toggle_mode();
        form.set_raw_text("{\"parameters\": 3}");

        let err = form.submit(&mut store, &submitter()).unwrap_err();

        assert!(matches!(
            err,
            SubmitError::Parse(ParseError::NotAMapping { found: "a number", .. })
        ));
        assert!(store.is_empty());
    }

    #[test]
    fn entering_advanced_mode_snapshots_fields() {
        let mut form = FormController::default();
        form.set_algorithm("DQN");
        form.set_batch_size(128);
        form.toggle_mode();

        assert_eq!(form.mode(), FormMode::Advanced);
        let doc = codec::parse(form.raw_text(), ConfigFormat::Json).unwrap();
        assert_eq!(doc["algorithm"], json!("DQN"));
        assert_eq!(doc["parameters"]["batchSize"], json!(128));
    }

    #[test]
    fn snapshot_uses_current_format() {
        let mut form = FormController::new(ConfigFormat::Yaml);
        form.toggle_mode();
        assert!(form.raw_text().starts_with("algorithm: PPO"));
    }

    #[test]
    fn leaving_advanced_mode_keeps_simple_fields() {
        let mut form = FormController::default();
        form.toggle_mode();
        form.set_raw_text("{\"algorithm\": \"SAC\"}");
        form.toggle_mode();

        assert_eq!(form.mode(), FormMode::Simple);
        assert_eq!(form.simple().algorithm, "PPO");
    }

    #[test]
    fn format_toggle_round_trips_structure() {
        let mut form = FormController::default();
        form.toggle_mode();
        form.load_example();
        let before = codec::parse(form.raw_text(), ConfigFormat::Json).unwrap();

        form.toggle_format().unwrap();
        assert_eq!(form.format(), ConfigFormat::Yaml);
        form.toggle_format().unwrap();
        assert_eq!(form.format(), ConfigFormat::Json);

        let after = codec::parse(form.raw_text(), ConfigFormat::Json).unwrap();
        assert_eq!(before, after);
    }

    #[test]
    fn format_toggle_failure_preserves_text() {
        let mut form = FormController::default();
        form.toggle_mode();
        form.set_raw_text("{\"algorithm\": ");

        assert!(form.toggle_format().is_err());
        assert_eq!(form.raw_text(), "{\"algorithm\": ");
        assert_eq!(form.format(), ConfigFormat::Json);
        assert!(form.parse_error().unwrap().starts_with("Invalid JSON"));

        form.set_raw_text("{}");
        assert!(form.parse_error().is_none());
    }

    #[test]
    fn format_toggle_on_empty_buffer_loads_example() {
        let mut form = FormController::default();
        form.toggle_mode();
        form.set_raw_text("");

        form.toggle_format().unwrap();

        assert_eq!(form.format(), ConfigFormat::Yaml);
        assert_eq!(
            codec::parse(form.raw_text(), ConfigFormat::Yaml).unwrap(),
            codec::example_config()
        );
    }

    #[rstest]
    #[case(SimpleField::LearningRate, "abc")]
    #[case(SimpleField::LearningRate, "-0.1")]
    #[case(SimpleField::BatchSize, "6.5")]
    #[case(SimpleField::Episodes, "")]
    fn invalid_numbers_leave_fields_untouched(#[case] field: SimpleField, #[case] input: &str) {
        let mut form = FormController::default();
        let before = form.simple().clone();

        let err = form.apply_field_input(field, input).unwrap_err();

        assert!(matches!(
            err,
            ValidationError::InvalidNumber { .. } | ValidationError::OutOfRange { .. }
        ));
        assert_eq!(form.simple(), &before);
    }

    #[rstest]
    #[case(-1.0)]
    #[case(f64::NAN)]
    #[case(f64::INFINITY)]
    fn out_of_range_rates_are_rejected(#[case] rate: f64) {
        let mut form = FormController::default();

        let err = form.set_learning_rate(rate).unwrap_err();

        assert!(matches!(err, ValidationError::OutOfRange { field: "Learning Rate", .. }));
        assert_eq!(form.simple().learning_rate, 0.0003);
    }

    #[test]
    fn format_toggle_is_refused_in_simple_mode() {
        let mut form = FormController::default();

        assert_eq!(form.toggle_format(), Err(FormatToggleError::SimpleMode));
        assert_eq!(form.format(), ConfigFormat::Json);
        assert!(form.raw_text().is_empty());
    }

    #[rstest]
    #[case("{\"algorithm\": null, \"environment\": {\"id\": \"Ant-v4\"}}")]
    #[case("{\"algorithm\": [\"DQN\"], \"environment\": null}")]
    fn null_and_nested_names_fall_back_to_simple_fields(#[case] text: &str) {
        let mut store = MemoryStore::new();
        let mut form = FormController::default();
        form.set_name("Fallback");
        form.set_algorithm("SAC");
        form.toggle_mode();
        form.set_raw_text(text);

        let task = form.submit(&mut store, &submitter()).unwrap();

        assert_eq!(task.algorithm, "SAC");
        assert_eq!(task.environment, "CartPole-v1");
    }

    #[test]
    fn field_input_updates_typed_values() {
        let mut form = FormController::default();
        form.apply_field_input(SimpleField::LearningRate, " 0.001 ").unwrap();
        form.apply_field_input(SimpleField::Episodes, "2000").unwrap();
        form.apply_field_input(SimpleField::Environment, "Pendulum-v1").unwrap();

        assert_eq!(form.simple().learning_rate, 0.001);
        assert_eq!(form.simple().episodes, 2000);
        assert_eq!(form.field_value(SimpleField::Environment), "Pendulum-v1");
    }

    #[test]
    fn successful_submit_discards_draft() {
        let mut store = MemoryStore::new();
        let mut form = FormController::new(ConfigFormat::Yaml);
        form.set_name("Run");
        form.toggle_mode();

        form.submit(&mut store, &submitter()).unwrap();

        assert_eq!(form.name(), "");
        assert_eq!(form.mode(), FormMode::Simple);
        assert_eq!(form.format(), ConfigFormat::Yaml);
        assert!(form.raw_text().is_empty());
    }
}
