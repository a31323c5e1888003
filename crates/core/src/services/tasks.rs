use chrono::Utc;

use crate::codec;
use crate::config::AppConfig;
use crate::form::{FormController, SubmitError};
use crate::model::{ConfigFormat, Task, TaskStatus};
use crate::store::{MemoryStore, TaskBackend, TaskNotFound};

pub struct TasksService {
    config: AppConfig,
    backend: Box<dyn TaskBackend>,
}

impl TasksService {
    pub fn new(config: AppConfig, backend: Box<dyn TaskBackend>) -> Self {
        Self { config, backend }
    }

    /// Service over an in-memory store seeded with the sample history.
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(config, Box::new(MemoryStore::with_sample_tasks()))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn new_form(&self) -> FormController {
        FormController::new(self.config.default_format())
    }

    pub fn list(&self) -> Vec<Task> {
        self.backend.list()
    }

    pub fn fetch_task(&self, id: &str) -> Result<Task, TaskNotFound> {
        self.backend.find_by_id(id)
    }

    pub fn submit(&mut self, form: &mut FormController) -> Result<Task, SubmitError> {
        form.submit(self.backend.as_mut(), self.config.submitter())
    }

    pub fn update_status(&mut self, id: &str, status: TaskStatus) -> Result<Task, TaskNotFound> {
        let task = self.backend.update_status(id, status, Utc::now())?;
        tracing::info!(task_id = id, status = status.as_str(), "task status updated");
        Ok(task)
    }

    /// The task's `{algorithm, environment, parameters}` document rendered as `format`.
    pub fn render_config(&self, task: &Task, format: ConfigFormat) -> String {
        codec::serialize(&task.config_document(), format)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Submitter;
    use pretty_assertions::assert_eq;

    fn service() -> TasksService {
        let config = AppConfig::default()
            .with_submitter(Submitter {
                name: "Session User".into(),
                avatar_url: "https://example.com/u.png".into(),
            })
            .with_default_format(ConfigFormat::Yaml);
        TasksService::in_memory(config)
    }

    #[test]
    fn submit_stamps_session_submitter() {
        let mut service = service();
        let mut form = service.new_form();
        assert_eq!(form.format(), ConfigFormat::Yaml);
        form.set_name("Pendulum sweep");
        form.set_environment("Pendulum-v1");

        let task = service.submit(&mut form).unwrap();

        assert_eq!(task.submitter.name, "Session User");
        assert_eq!(service.list()[0].id, task.id);
        assert_eq!(service.fetch_task(&task.id).unwrap().environment, "Pendulum-v1");
    }

    #[test]
    fn failed_submit_leaves_history_alone() {
        let mut service = service();
        let mut form = service.new_form();
        form.set_name("Broken");
        form.toggle_mode();
        form.set_raw_text("algorithm: [DQN");

        assert!(service.submit(&mut form).is_err());
        assert_eq!(service.list().len(), 2);
    }

    #[test]
    fn render_config_wraps_parameters() {
        let service = service();
        let task = service.fetch_task("1").unwrap();

        let json = service.render_config(&task, ConfigFormat::Json);
        let doc = codec::parse(&json, ConfigFormat::Json).unwrap();
        assert_eq!(doc, task.config_document());

        let yaml = service.render_config(&task, ConfigFormat::Yaml);
        assert!(yaml.contains("environment: CartPole-v1"));
    }

    #[test]
    fn update_status_reports_missing_tasks() {
        let mut service = service();
        let task = service.update_status("2", TaskStatus::Completed).unwrap();
        assert_eq!(task.status, TaskStatus::Completed);
        assert!(service.update_status("nope", TaskStatus::Failed).is_err());
    }
}
