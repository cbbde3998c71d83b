use serde::{Deserialize, Serialize};

use crate::params::{TaskParams, TaskRequest};

/// Classified purpose of a user utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Intent {
    #[serde(alias = "新建任务")]
    CreateTask,
    #[serde(alias = "打招呼")]
    Greeting,
    #[serde(alias = "查询任务")]
    QueryTask,
    #[default]
    #[serde(alias = "未知")]
    Unknown,
}

impl Intent {
    pub const ALL: [Intent; 4] = [
        Intent::CreateTask,
        Intent::Greeting,
        Intent::QueryTask,
        Intent::Unknown,
    ];

    /// Chinese label the model is instructed to emit.
    pub fn label(&self) -> &'static str {
        match self {
            Intent::CreateTask => "新建任务",
            Intent::Greeting => "打招呼",
            Intent::QueryTask => "查询任务",
            Intent::Unknown => "未知",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::CreateTask => "CreateTask",
            Intent::Greeting => "Greeting",
            Intent::QueryTask => "QueryTask",
            Intent::Unknown => "Unknown",
        }
    }

    /// Map a free-form intent string from model output onto an `Intent`.
    ///
    /// Accepts the Chinese labels and the variant names in any case, with or
    /// without underscores (`create_task`, `CREATETASK`). Anything else is
    /// `Unknown`.
    pub fn from_label(label: &str) -> Intent {
        let label = label.trim();
        let folded: String = label
            .chars()
            .filter(|c| *c != '_' && *c != '-' && !c.is_whitespace())
            .flat_map(char::to_lowercase)
            .collect();

        Intent::ALL
            .into_iter()
            .find(|intent| label == intent.label() || folded == intent.as_str().to_lowercase())
            .unwrap_or(Intent::Unknown)
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output contract of intent resolution.
///
/// `params` is empty unless `intent` is `CreateTask`. When
/// `should_create_task` is true the params carry every required field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IntentResult {
    pub intent: Intent,
    /// Resolver confidence (0.0 - 1.0).
    pub confidence: f64,
    #[serde(default)]
    pub params: TaskParams,
    /// Human-readable reply, never empty.
    pub reply: String,
    pub should_create_task: bool,
}

impl IntentResult {
    pub fn greeting(reply: impl Into<String>) -> Self {
        Self {
            intent: Intent::Greeting,
            confidence: 0.9,
            params: TaskParams::default(),
            reply: reply.into(),
            should_create_task: false,
        }
    }

    pub fn unknown(reply: impl Into<String>) -> Self {
        Self {
            intent: Intent::Unknown,
            confidence: 0.5,
            params: TaskParams::default(),
            reply: reply.into(),
            should_create_task: false,
        }
    }

    /// The task-creation payload, if this result commits to creating a task.
    pub fn task_request(&self) -> Option<TaskRequest> {
        if !self.should_create_task || self.intent != Intent::CreateTask {
            return None;
        }
        self.params.to_request().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intent_serializes_as_variant_name() {
        assert_eq!(
            serde_json::to_string(&Intent::CreateTask).unwrap(),
            r#""CreateTask""#
        );
        assert_eq!(
            serde_json::to_string(&Intent::Unknown).unwrap(),
            r#""Unknown""#
        );
    }

    #[test]
    fn intent_deserializes_chinese_alias() {
        let intent: Intent = serde_json::from_str(r#""打招呼""#).unwrap();
        assert_eq!(intent, Intent::Greeting);
    }

    #[test]
    fn from_label_variants() {
        assert_eq!(Intent::from_label("新建任务"), Intent::CreateTask);
        assert_eq!(Intent::from_label(" 查询任务 "), Intent::QueryTask);
        assert_eq!(Intent::from_label("create_task"), Intent::CreateTask);
        assert_eq!(Intent::from_label("GREETING"), Intent::Greeting);
        assert_eq!(Intent::from_label("query-task"), Intent::QueryTask);
        assert_eq!(Intent::from_label("删除任务"), Intent::Unknown);
        assert_eq!(Intent::from_label(""), Intent::Unknown);
    }

    #[test]
    fn intent_result_wire_shape() {
        let result = IntentResult::greeting("您好！");
        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["intent"], "Greeting");
        assert_eq!(json["shouldCreateTask"], false);
        assert_eq!(json["params"], serde_json::json!({}));
        assert_eq!(json["reply"], "您好！");
    }

    #[test]
    fn task_request_requires_commitment() {
        let mut result = IntentResult {
            intent: Intent::CreateTask,
            confidence: 0.8,
            params: TaskParams {
                task_name: Some("巡检".into()),
                start_pos: Some("东门".into()),
                task_trip: Some(800),
                executor: Some("巡检机器人".into()),
                ..Default::default()
            },
            reply: "ok".into(),
            should_create_task: false,
        };
        assert!(result.task_request().is_none());

        result.should_create_task = true;
        let req = result.task_request().unwrap();
        assert_eq!(req.start_pos, "东门");
        assert_eq!(req.remark, "");
    }

    #[test]
    fn task_request_none_when_incomplete() {
        let result = IntentResult {
            intent: Intent::CreateTask,
            confidence: 0.9,
            params: TaskParams::default(),
            reply: "ok".into(),
            should_create_task: true,
        };
        assert!(result.task_request().is_none());
    }
}
