use anyhow::Result;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::{json, Value};
use thiserror::Error;

use crate::model::{NewTask, Parameters, Submitter, Task, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Task {id} not found")]
pub struct TaskNotFound {
    pub id: String,
}

/// Storage seam for submitted tasks; a networked client can stand in for [`MemoryStore`].
pub trait TaskBackend {
    fn create(&mut self, task: NewTask, submitter: &Submitter, now: DateTime<Utc>)
        -> Result<Task>;

    /// Snapshot of all tasks, most recent first.
    fn list(&self) -> Vec<Task>;

    fn find_by_id(&self, id: &str) -> Result<Task, TaskNotFound>;

    fn update_status(
        &mut self,
        id: &str,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskNotFound>;
}

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    tasks: Vec<Task>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self { tasks: Vec::new() }
    }

    pub fn with_sample_tasks() -> Self {
        let mut store = Self::new();
        for task in sample_tasks().into_iter().rev() {
            store.append(task);
        }
        store
    }

    /// Insert at the front; callers guarantee the id is unique.
    pub fn append(&mut self, task: Task) {
        self.tasks.insert(0, task);
    }

    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

impl TaskBackend for MemoryStore {
    fn create(
        &mut self,
        task: NewTask,
        submitter: &Submitter,
        now: DateTime<Utc>,
    ) -> Result<Task> {
        let task = task.into_task(submitter, now);
        self.append(task.clone());
        Ok(task)
    }

    fn list(&self) -> Vec<Task> {
        self.tasks.clone()
    }

    fn find_by_id(&self, id: &str) -> Result<Task, TaskNotFound> {
        self.tasks
            .iter()
            .find(|task| task.id == id)
            .cloned()
            .ok_or_else(|| TaskNotFound { id: id.to_string() })
    }

    fn update_status(
        &mut self,
        id: &str,
        status: TaskStatus,
        now: DateTime<Utc>,
    ) -> Result<Task, TaskNotFound> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| TaskNotFound { id: id.to_string() })?;
        task.status = status;
        task.updated_at = now;
        Ok(task.clone())
    }
}

fn sample_tasks() -> Vec<Task> {
    vec![
        sample_task(
            "1",
            "CartPole Training",
            TaskStatus::Completed,
            ("PPO", "CartPole-v1"),
            json!({"learningRate": 0.0003, "batchSize": 64, "episodes": 1000}),
            (timestamp(8), timestamp(9)),
            Submitter {
                name: "John Doe".into(),
                avatar_url: "https://images.unsplash.com/photo-1472099645785-5658abf4ff4e?w=32&h=32&fit=crop&crop=face".into(),
            },
        ),
        sample_task(
            "2",
            "LunarLander Training",
            TaskStatus::Running,
            ("DQN", "LunarLander-v2"),
            json!({"learningRate": 0.0001, "batchSize": 128, "episodes": 2000}),
            (timestamp(10), timestamp(10)),
            Submitter {
                name: "Jane Smith".into(),
                avatar_url: "https://images.unsplash.com/photo-1494790108377-be9c29b29330?w=32&h=32&fit=crop&crop=face".into(),
            },
        ),
    ]
}

fn sample_task(
    id: &str,
    name: &str,
    status: TaskStatus,
    (algorithm, environment): (&str, &str),
    parameters: Value,
    (created_at, updated_at): (DateTime<Utc>, DateTime<Utc>),
    submitter: Submitter,
) -> Task {
    let parameters = match parameters {
        Value::Object(map) => map,
        _ => Parameters::new(),
    };
    Task {
        id: id.to_string(),
        name: name.to_string(),
        status,
        algorithm: algorithm.to_string(),
        environment: environment.to_string(),
        parameters,
        created_at,
        updated_at,
        submitter,
    }
}

fn timestamp(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 15, hour, 0, 0)
        .single()
        .unwrap_or_else(Utc::now)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn submitter() -> Submitter {
        Submitter {
            name: "Tester".into(),
            avatar_url: String::new(),
        }
    }

    fn payload(name: &str) -> NewTask {
        NewTask {
            name: name.into(),
            algorithm: "PPO".into(),
            environment: "CartPole-v1".into(),
            parameters: Parameters::new(),
        }
    }

    #[test]
    fn sample_tasks_are_seeded_in_history_order() {
        let store = MemoryStore::with_sample_tasks();
        let names: Vec<&str> = store.tasks().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["CartPole Training", "LunarLander Training"]);
        assert_eq!(store.tasks()[1].status, TaskStatus::Running);
    }

    #[test]
    fn create_puts_newest_first() {
        let mut store = MemoryStore::new();
        let first = store.create(payload("first"), &submitter(), Utc::now()).unwrap();
        let second = store.create(payload("second"), &submitter(), Utc::now()).unwrap();

        let ids: Vec<String> = store.list().into_iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![second.id, first.id]);
    }

    #[test]
    fn missing_id_is_not_found() {
        let store = MemoryStore::with_sample_tasks();
        let err = store.find_by_id("does-not-exist").unwrap_err();
        assert_eq!(err.id, "does-not-exist");
        assert_eq!(err.to_string(), "Task does-not-exist not found");
        assert!(store.find_by_id("2").is_ok());
    }

    #[test]
    fn update_status_bumps_updated_at_only() {
        let mut store = MemoryStore::new();
        let created = Utc::now();
        let task = store.create(payload("run"), &submitter(), created).unwrap();
        let later = created + Duration::minutes(30);

        let updated = store
            .update_status(&task.id, TaskStatus::Running, later)
            .unwrap();

        assert_eq!(updated.status, TaskStatus::Running);
        assert_eq!(updated.created_at, created);
        assert_eq!(updated.updated_at, later);
        assert_eq!(store.find_by_id(&task.id).unwrap().status, TaskStatus::Running);
        assert!(store
            .update_status("missing", TaskStatus::Failed, later)
            .is_err());
    }
}
