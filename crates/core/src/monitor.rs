//! Deterministic stand-ins for training telemetry shown in the task detail view.
//!
//! Nothing here talks to a running job; series are derived from the task id so a given
//! task always renders the same charts.

use chrono::{DateTime, Duration, TimeZone, Utc};
use serde::Serialize;

use crate::model::{LogEntry, LogLevel, ResourceMetrics, Task, TaskStatus};

pub const SERIES_LEN: usize = 50;
pub const SAMPLE_INTERVAL_SECS: u32 = 5;

#[derive(Debug, Clone, Copy, Serialize, PartialEq)]
pub struct MetricPoint {
    pub time: u32,
    pub value: f64,
}

/// `len` points spaced [`SAMPLE_INTERVAL_SECS`] apart, each within `base ± variance / 2`.
pub fn mock_series(len: usize, base: f64, variance: f64, seed: u64) -> Vec<MetricPoint> {
    (0..len)
        .map(|i| MetricPoint {
            time: i as u32 * SAMPLE_INTERVAL_SECS,
            value: base + variance * (unit_noise(seed, i as u64) - 0.5),
        })
        .collect()
}

// splitmix64 finalizer mapped onto [0, 1)
fn unit_noise(seed: u64, index: u64) -> f64 {
    let mut z = seed
        .wrapping_add(index.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^= z >> 31;
    (z >> 11) as f64 / (1u64 << 53) as f64
}

fn seed_for(id: &str) -> u64 {
    id.bytes().fold(0xcbf2_9ce4_8422_2325, |hash, byte| {
        (hash ^ byte as u64).wrapping_mul(0x0100_0000_01b3)
    })
}

#[derive(Debug, Clone)]
pub struct TaskMetrics {
    pub cpu: Vec<MetricPoint>,
    pub memory: Vec<MetricPoint>,
    pub gpu: Vec<MetricPoint>,
    pub reward: Vec<MetricPoint>,
}

impl TaskMetrics {
    pub fn for_task(task: &Task) -> Self {
        let seed = seed_for(&task.id);
        Self {
            cpu: mock_series(SERIES_LEN, 45.0, 20.0, seed),
            memory: mock_series(SERIES_LEN, 2.4, 1.0, seed.wrapping_add(1)),
            gpu: mock_series(SERIES_LEN, 78.0, 15.0, seed.wrapping_add(2)),
            reward: mock_series(SERIES_LEN, 100.0, 50.0, seed.wrapping_add(3)),
        }
    }

    pub fn latest_resources(&self) -> ResourceMetrics {
        let last = |series: &[MetricPoint]| series.last().map(|p| p.value).unwrap_or_default();
        ResourceMetrics {
            cpu_usage: last(&self.cpu),
            memory_usage: last(&self.memory),
            gpu_usage: self.gpu.last().map(|p| p.value),
        }
    }
}

pub fn sample_logs() -> Vec<LogEntry> {
    let base = Utc
        .with_ymd_and_hms(2024, 3, 15, 10, 0, 0)
        .single()
        .unwrap_or_else(Utc::now);
    let entries = [
        (LogLevel::Info, "Training started"),
        (LogLevel::Info, "Episode 1 completed: reward=100"),
        (LogLevel::Warning, "Learning rate adjusted to 0.0002"),
        (LogLevel::Info, "Episode 2 completed: reward=150"),
        (LogLevel::Error, "Memory usage exceeded 90%"),
    ];
    entries
        .into_iter()
        .enumerate()
        .map(|(minute, (level, message))| LogEntry {
            timestamp: base + Duration::minutes(minute as i64),
            level,
            message: message.to_string(),
        })
        .collect()
}

/// Wall time since submission; completed tasks stop at their last update.
pub fn task_duration(task: &Task, now: DateTime<Utc>) -> Duration {
    let end = if task.status == TaskStatus::Completed {
        task.updated_at
    } else {
        now
    };
    (end - task.created_at).max(Duration::zero())
}

pub fn format_duration(duration: Duration) -> String {
    let minutes = duration.num_minutes();
    if minutes == 1 {
        String::from("1 minute")
    } else {
        format!("{} minutes", minutes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, TaskBackend};

    #[test]
    fn series_is_deterministic_and_bounded() {
        let a = mock_series(SERIES_LEN, 45.0, 20.0, 7);
        let b = mock_series(SERIES_LEN, 45.0, 20.0, 7);
        assert_eq!(a, b);
        assert_eq!(a.len(), SERIES_LEN);
        assert_eq!(a[3].time, 15);
        assert!(a.iter().all(|p| p.value >= 35.0 && p.value < 55.0));
        assert_ne!(a, mock_series(SERIES_LEN, 45.0, 20.0, 8));
    }

    #[test]
    fn metrics_follow_task_identity() {
        let store = MemoryStore::with_sample_tasks();
        let first = store.find_by_id("1").unwrap();
        let second = store.find_by_id("2").unwrap();

        let m1 = TaskMetrics::for_task(&first);
        assert_eq!(m1.reward, TaskMetrics::for_task(&first).reward);
        assert_ne!(m1.reward, TaskMetrics::for_task(&second).reward);

        let resources = m1.latest_resources();
        assert!(resources.gpu_usage.is_some());
        assert!(resources.memory_usage > 1.8 && resources.memory_usage < 3.0);
    }

    #[test]
    fn completed_task_duration_stops_at_update() {
        let store = MemoryStore::with_sample_tasks();
        let completed = store.find_by_id("1").unwrap();
        let far_future = Utc::now() + Duration::days(30);

        let duration = task_duration(&completed, far_future);
        assert_eq!(duration.num_minutes(), 60);
        assert_eq!(format_duration(duration), "60 minutes");
    }

    #[test]
    fn running_task_duration_uses_now_and_clamps() {
        let store = MemoryStore::with_sample_tasks();
        let running = store.find_by_id("2").unwrap();
        let now = running.created_at + Duration::minutes(1);
        assert_eq!(format_duration(task_duration(&running, now)), "1 minute");

        let before = running.created_at - Duration::hours(1);
        assert_eq!(task_duration(&running, before), Duration::zero());
    }

    #[test]
    fn sample_logs_cover_all_levels() {
        let logs = sample_logs();
        assert_eq!(logs.len(), 5);
        assert_eq!(logs[0].message, "Training started");
        assert!(logs.iter().any(|l| l.level == LogLevel::Warning));
        assert!(logs.iter().any(|l| l.level == LogLevel::Error));
        assert!(logs.windows(2).all(|w| w[0].timestamp < w[1].timestamp));
    }
}
