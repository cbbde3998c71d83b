use serde::{Deserialize, Serialize};

/// A named task parameter. Required fields must be populated before a task
/// can be handed to the task-creation API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ParamField {
    TaskName,
    StartPos,
    TaskTrip,
    Executor,
    Remark,
}

impl ParamField {
    /// Fields that must be present on every task handed to task creation.
    pub const REQUIRED: [ParamField; 4] = [
        ParamField::TaskName,
        ParamField::StartPos,
        ParamField::TaskTrip,
        ParamField::Executor,
    ];

    /// Wire name of the field (camelCase, as used by the task API).
    pub fn as_str(&self) -> &'static str {
        match self {
            ParamField::TaskName => "taskName",
            ParamField::StartPos => "startPos",
            ParamField::TaskTrip => "taskTrip",
            ParamField::Executor => "executor",
            ParamField::Remark => "remark",
        }
    }
}

impl std::fmt::Display for ParamField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Task parameters as they travel through resolution.
///
/// Every member is optional: the model may return a partial object and the
/// extraction engine only fills what it finds. Downstream stages complete the
/// value before `shouldCreateTask` is ever set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_pos: Option<String>,
    /// Distance in meters.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_trip: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub executor: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    /// Template id the parameters were derived from (provenance only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_type: Option<String>,
    /// Classifier confidence for `task_type`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

/// Required task fields were missing when building a [`TaskRequest`].
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("task parameters incomplete, missing: {}", join_fields(.missing))]
pub struct IncompleteParams {
    pub missing: Vec<ParamField>,
}

fn join_fields(fields: &[ParamField]) -> String {
    fields
        .iter()
        .map(ParamField::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Payload accepted by the external task-creation API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRequest {
    pub task_name: String,
    pub start_pos: String,
    pub task_trip: u32,
    pub executor: String,
    #[serde(default)]
    pub remark: String,
}

fn present(value: &Option<String>) -> bool {
    value.as_deref().is_some_and(|s| !s.trim().is_empty())
}

impl TaskParams {
    /// True when no field at all is set (serialises as `{}`).
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Required fields that are absent, empty, or (for distance) zero.
    pub fn missing_required(&self) -> Vec<ParamField> {
        ParamField::REQUIRED
            .into_iter()
            .filter(|field| match field {
                ParamField::TaskName => !present(&self.task_name),
                ParamField::StartPos => !present(&self.start_pos),
                ParamField::TaskTrip => !self.task_trip.is_some_and(|trip| trip > 0),
                ParamField::Executor => !present(&self.executor),
                ParamField::Remark => false,
            })
            .collect()
    }

    pub fn is_complete(&self) -> bool {
        self.missing_required().is_empty()
    }

    /// Field-wise merge: values set on `self` win, gaps are taken from `base`.
    /// Empty strings on `self` count as gaps.
    pub fn merge_over(self, base: TaskParams) -> TaskParams {
        fn pick(top: Option<String>, base: Option<String>) -> Option<String> {
            if present(&top) { top } else { base.or(top) }
        }

        TaskParams {
            task_name: pick(self.task_name, base.task_name),
            start_pos: pick(self.start_pos, base.start_pos),
            task_trip: self.task_trip.filter(|t| *t > 0).or(base.task_trip),
            executor: pick(self.executor, base.executor),
            remark: self.remark.or(base.remark),
            task_type: self.task_type.or(base.task_type),
            confidence: self.confidence.or(base.confidence),
        }
    }

    /// Build the task-creation payload, failing if any required field is missing.
    pub fn to_request(&self) -> Result<TaskRequest, IncompleteParams> {
        let missing = self.missing_required();
        if !missing.is_empty() {
            return Err(IncompleteParams { missing });
        }

        Ok(TaskRequest {
            task_name: self.task_name.clone().unwrap_or_default(),
            start_pos: self.start_pos.clone().unwrap_or_default(),
            task_trip: self.task_trip.unwrap_or_default(),
            executor: self.executor.clone().unwrap_or_default(),
            remark: self.remark.clone().unwrap_or_default(),
        })
    }
}
