//! Task records and the task store.
//!
//! The store is the sole owner of task records. Callers receive cloned
//! snapshots and effect transitions only through the named operations here,
//! each of which is a single check-and-set on the stored record.

use crate::error::MarketError;
use chrono::{DateTime, Utc};
use grid_token::AccountId;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use uuid::Uuid;

/// Unique task identifier.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TaskId(String);

impl TaskId {
    /// Create a new random task ID.
    #[must_use]
    pub fn new() -> Self {
        Self(format!("task-{}", Uuid::new_v4()))
    }

    /// Create from a string.
    #[must_use]
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the ID as a string.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for TaskId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Task size in gigabytes.
///
/// Held as integer milli-GB so settlement math stays in fixed point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SizeGb {
    milli_gb: u64,
}

impl SizeGb {
    /// Create from milli-gigabytes.
    #[must_use]
    pub const fn from_millis(milli_gb: u64) -> Self {
        Self { milli_gb }
    }

    /// Create from a decimal gigabyte value.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidInput`] for zero, negative, or
    /// non-finite sizes.
    pub fn try_gb(gb: f64) -> Result<Self, MarketError> {
        if !gb.is_finite() || gb <= 0.0 {
            return Err(MarketError::invalid_input(format!(
                "task size must be a positive number of gigabytes, got {gb}"
            )));
        }
        Ok(Self {
            milli_gb: (gb * 1000.0).round() as u64,
        })
    }

    /// Size in milli-gigabytes.
    #[must_use]
    pub const fn millis(&self) -> u64 {
        self.milli_gb
    }

    /// Size as a decimal gigabyte value.
    #[must_use]
    pub fn as_gb(&self) -> f64 {
        self.milli_gb as f64 / 1000.0
    }

    /// Whether the size is zero.
    #[must_use]
    pub const fn is_zero(&self) -> bool {
        self.milli_gb == 0
    }
}

impl fmt::Display for SizeGb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} GB", self.as_gb())
    }
}

/// Lifecycle state of a task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    /// Submitted and waiting for a contributor.
    Pending,
    /// Exclusively claimed by one contributor.
    Claimed,
    /// Processed and settled. Terminal.
    Completed,
    /// Aborted and refunded. Terminal.
    Failed,
}

impl TaskStatus {
    /// Check if the task is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed)
    }

    /// Checks if a transition to the target state is valid.
    #[must_use]
    pub const fn can_transition_to(&self, target: &Self) -> bool {
        use TaskStatus::{Claimed, Completed, Failed, Pending};

        matches!(
            (self, target),
            (Pending, Claimed) | (Claimed, Completed) | (Pending | Claimed, Failed)
        )
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Claimed => write!(f, "claimed"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// A compute task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// Unique task ID.
    pub id: TaskId,

    /// Client that submitted and paid for the task.
    pub owner: AccountId,

    /// Human-readable task name.
    pub name: String,

    /// Task size in gigabytes.
    pub size: SizeGb,

    /// Current lifecycle state.
    pub status: TaskStatus,

    /// Submission timestamp.
    pub submitted_at: DateTime<Utc>,

    /// Contributor holding the active claim, if any.
    pub claimed_by: Option<AccountId>,

    /// When the active claim was taken. Exposed so a surrounding policy can
    /// abort claims that never complete.
    pub claimed_at: Option<DateTime<Utc>>,

    /// Completion timestamp, once settled.
    pub completed_at: Option<DateTime<Utc>>,

    /// Why the task failed, if it did.
    pub fail_reason: Option<String>,
}

impl Task {
    /// Check if the task is in a terminal state.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        self.status.is_terminal()
    }
}

/// The task store. Sole owner of task records; tasks move to a terminal
/// state but are never destroyed.
#[derive(Debug, Default)]
pub struct TaskStore {
    tasks: HashMap<TaskId, Task>,
    // Submission order, for stable pending listings.
    order: Vec<TaskId>,
}

impl TaskStore {
    /// Create a new empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a new pending task and return a snapshot of it.
    pub fn create(&mut self, owner: AccountId, size: SizeGb, name: impl Into<String>) -> Task {
        let task = Task {
            id: TaskId::new(),
            owner,
            name: name.into(),
            size,
            status: TaskStatus::Pending,
            submitted_at: Utc::now(),
            claimed_by: None,
            claimed_at: None,
            completed_at: None,
            fail_reason: None,
        };
        self.order.push(task.id.clone());
        self.tasks.insert(task.id.clone(), task.clone());
        task
    }

    /// Get a snapshot of a task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::NoSuchTask`] if the ID is unknown.
    pub fn get(&self, id: &TaskId) -> Result<Task, MarketError> {
        self.tasks
            .get(id)
            .cloned()
            .ok_or_else(|| MarketError::NoSuchTask(id.to_string()))
    }

    /// Snapshot of all pending tasks, in submission order.
    #[must_use]
    pub fn list_pending(&self) -> Vec<Task> {
        self.order
            .iter()
            .filter_map(|id| self.tasks.get(id))
            .filter(|t| t.status == TaskStatus::Pending)
            .cloned()
            .collect()
    }

    /// Atomically transition Pending → Claimed for the given contributor.
    /// At most one contributor ever holds the claim on a task.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::AlreadyClaimed`] if the task is not pending,
    /// or [`MarketError::NoSuchTask`] if the ID is unknown.
    pub fn claim(&mut self, id: &TaskId, contributor: &AccountId) -> Result<Task, MarketError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| MarketError::NoSuchTask(id.to_string()))?;
        if task.status != TaskStatus::Pending {
            return Err(MarketError::AlreadyClaimed {
                task: id.to_string(),
            });
        }
        task.status = TaskStatus::Claimed;
        task.claimed_by = Some(contributor.clone());
        task.claimed_at = Some(Utc::now());
        Ok(task.clone())
    }

    /// Transition Claimed → Completed.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidTransition`] if the task is not
    /// claimed, or [`MarketError::NoSuchTask`] if the ID is unknown.
    pub fn complete(&mut self, id: &TaskId) -> Result<Task, MarketError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| MarketError::NoSuchTask(id.to_string()))?;
        if task.status != TaskStatus::Claimed {
            return Err(MarketError::InvalidTransition {
                from: task.status.to_string(),
                to: TaskStatus::Completed.to_string(),
            });
        }
        task.status = TaskStatus::Completed;
        task.completed_at = Some(Utc::now());
        Ok(task.clone())
    }

    /// Transition Pending|Claimed → Failed, recording the reason.
    ///
    /// # Errors
    ///
    /// Returns [`MarketError::InvalidTransition`] if the task is already
    /// terminal, or [`MarketError::NoSuchTask`] if the ID is unknown.
    pub fn fail(&mut self, id: &TaskId, reason: impl Into<String>) -> Result<Task, MarketError> {
        let task = self
            .tasks
            .get_mut(id)
            .ok_or_else(|| MarketError::NoSuchTask(id.to_string()))?;
        if !task.status.can_transition_to(&TaskStatus::Failed) {
            return Err(MarketError::InvalidTransition {
                from: task.status.to_string(),
                to: TaskStatus::Failed.to_string(),
            });
        }
        task.status = TaskStatus::Failed;
        task.fail_reason = Some(reason.into());
        Ok(task.clone())
    }

    /// Iterate over all tasks in submission order.
    pub fn iter(&self) -> impl Iterator<Item = &Task> {
        self.order.iter().filter_map(|id| self.tasks.get(id))
    }

    /// Total number of tasks ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the store is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
