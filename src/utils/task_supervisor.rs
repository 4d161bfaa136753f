use std::collections::HashMap;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};

/// Tracks the long-lived pipeline tasks so shutdown can wait for them.
///
/// ## Usage
/// ```ignore
/// let mut supervisor = TaskSupervisor::new();
/// supervisor.spawn("dispatcher", dispatcher.run());
///
/// signal.trigger("ctrl-c");
/// supervisor.join_all(Duration::from_secs(30)).await;
/// ```
pub struct TaskSupervisor {
    tasks: HashMap<String, JoinHandle<()>>,
}

/// What happened to the supervised tasks during `join_all`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct JoinReport {
    pub completed: Vec<String>,
    pub failed: Vec<String>,
    pub aborted: Vec<String>,
}

impl JoinReport {
    pub fn is_clean(&self) -> bool {
        self.failed.is_empty() && self.aborted.is_empty()
    }
}

impl TaskSupervisor {
    pub fn new() -> Self {
        TaskSupervisor {
            tasks: HashMap::new(),
        }
    }

    /// Spawn a background task and register it under `name`.
    pub fn spawn<F>(&mut self, name: impl Into<String>, future: F) -> &mut Self
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let name = name.into();
        let handle = tokio::spawn(future);

        info!("Spawned background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    /// Register a task that was spawned elsewhere.
    pub fn track(&mut self, name: impl Into<String>, handle: JoinHandle<()>) -> &mut Self {
        let name = name.into();
        info!("Tracking background task: {}", name);
        self.tasks.insert(name, handle);
        self
    }

    pub fn active_task_count(&self) -> usize {
        self.tasks.len()
    }

    /// Wait up to `grace` for every task to finish, then abort whatever is
    /// still running.
    pub async fn join_all(&mut self, grace: Duration) -> JoinReport {
        info!("Waiting up to {:?} for {} tasks", grace, self.tasks.len());

        let deadline = tokio::time::Instant::now() + grace;
        let mut report = JoinReport::default();

        for (name, mut handle) in self.tasks.drain() {
            match tokio::time::timeout_at(deadline, &mut handle).await {
                Ok(Ok(())) => {
                    info!("Task {} completed", name);
                    report.completed.push(name);
                }
                Ok(Err(e)) => {
                    error!("Task {} failed: {}", name, e);
                    report.failed.push(name);
                }
                Err(_) => {
                    handle.abort();
                    warn!("Task {} did not stop within {:?}, aborted", name, grace);
                    report.aborted.push(name);
                }
            }
        }

        report
    }
}

impl Default for TaskSupervisor {
    fn default() -> Self {
        Self::new()
    }
}
