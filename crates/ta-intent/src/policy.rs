//! Confidence-gated decision on whether to commit to task creation.

use ta_protocol::{Intent, IntentResult};

use crate::fallback::generate_task_params;
use crate::templates::TemplateRegistry;

/// Minimum confidence to create a task without asking the user.
pub const CONFIDENCE_THRESHOLD: f64 = 0.7;

pub const CLARIFICATION_REPLY: &str =
    "我似乎理解您想创建一个任务，但不太确定。您可以换个方式，或者提供更具体的信息吗？";

/// Final gate applied to every completed result.
#[derive(Debug, Clone)]
pub struct DecisionPolicy {
    threshold: f64,
    registry: &'static TemplateRegistry,
}

impl Default for DecisionPolicy {
    fn default() -> Self {
        Self::new(CONFIDENCE_THRESHOLD)
    }
}

impl DecisionPolicy {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            registry: TemplateRegistry::builtin(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Decide what to do with a completed result.
    ///
    /// - Confident create: keep it, deriving params from `user_text` when the
    ///   result carries none and filling any required field it lacks.
    /// - Unsure create: withdraw the create flag and ask for clarification;
    ///   intent and params stay for inspection.
    /// - Anything else passes through.
    pub fn apply(&self, mut result: IntentResult, user_text: &str) -> IntentResult {
        if result.intent != Intent::CreateTask {
            result.should_create_task = false;
        }

        if !result.should_create_task {
            tracing::info!(intent = %result.intent, "decision: reply only");
            return result;
        }

        if result.confidence.is_nan() || result.confidence < self.threshold {
            tracing::info!(
                confidence = result.confidence,
                threshold = self.threshold,
                "decision: confidence too low, asking for clarification"
            );
            result.should_create_task = false;
            result.reply = CLARIFICATION_REPLY.into();
            return result;
        }

        if result.params.is_empty() {
            result.params = generate_task_params(self.registry, user_text);
        } else if !result.params.is_complete() {
            let missing = result.params.missing_required();
            tracing::debug!(?missing, "filling required params from text");
            result.params = result
                .params
                .merge_over(generate_task_params(self.registry, user_text));
        }

        tracing::info!(
            confidence = result.confidence,
            task_type = result.params.task_type.as_deref().unwrap_or("-"),
            "decision: create task"
        );
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ta_protocol::TaskParams;

    fn create(confidence: f64, params: TaskParams) -> IntentResult {
        IntentResult {
            intent: Intent::CreateTask,
            confidence,
            params,
            reply: "已为您创建任务。".into(),
            should_create_task: true,
        }
    }

    fn full_params() -> TaskParams {
        TaskParams {
            task_name: Some("巡检".into()),
            start_pos: Some("东门".into()),
            task_trip: Some(800),
            executor: Some("巡检机器人".into()),
            remark: None,
            task_type: None,
            confidence: None,
        }
    }

    #[test]
    fn low_confidence_asks_for_clarification() {
        let result = DecisionPolicy::default().apply(create(0.6, full_params()), "");
        assert!(!result.should_create_task);
        assert_eq!(result.reply, CLARIFICATION_REPLY);
        assert_eq!(result.intent, Intent::CreateTask);
        assert_eq!(result.params, full_params());
    }

    #[test]
    fn high_confidence_keeps_create() {
        let result = DecisionPolicy::default().apply(create(0.75, full_params()), "");
        assert!(result.should_create_task);
        assert_eq!(result.params, full_params());
        assert_eq!(result.reply, "已为您创建任务。");
    }

    #[test]
    fn threshold_is_inclusive() {
        let result = DecisionPolicy::default().apply(create(0.7, full_params()), "");
        assert!(result.should_create_task);
    }

    #[test]
    fn empty_params_derived_from_text() {
        let result = DecisionPolicy::default().apply(
            create(0.9, TaskParams::default()),
            "创建巡检任务，起点：东门，800米",
        );
        assert!(result.should_create_task);
        assert_eq!(result.params.start_pos.as_deref(), Some("东门"));
        assert_eq!(result.params.task_trip, Some(800));
        assert_eq!(result.params.task_name.as_deref(), Some("巡检"));
        assert!(result.params.is_complete());
    }

    #[test]
    fn partial_params_filled_model_values_win() {
        let partial = TaskParams {
            start_pos: Some("南门".into()),
            ..Default::default()
        };
        let result = DecisionPolicy::default().apply(create(0.9, partial), "起点：东门，设备故障");
        assert_eq!(result.params.start_pos.as_deref(), Some("南门"));
        assert_eq!(result.params.task_name.as_deref(), Some("设备检查任务"));
        assert_eq!(result.params.task_trip, Some(500));
        assert!(result.params.is_complete());
    }

    #[test]
    fn non_create_passes_through() {
        let greeting = IntentResult::greeting("您好");
        let result = DecisionPolicy::default().apply(greeting.clone(), "你好");
        assert_eq!(result, greeting);
    }

    #[test]
    fn create_flag_on_other_intent_is_withdrawn() {
        let mut query = IntentResult::unknown("?");
        query.intent = Intent::QueryTask;
        query.should_create_task = true;
        let result = DecisionPolicy::default().apply(query, "");
        assert!(!result.should_create_task);
    }

    #[test]
    fn nan_confidence_never_creates() {
        let result = DecisionPolicy::default().apply(create(f64::NAN, full_params()), "");
        assert!(!result.should_create_task);
        assert_eq!(result.reply, CLARIFICATION_REPLY);
    }

    #[test]
    fn custom_threshold() {
        let policy = DecisionPolicy::new(0.5);
        assert_eq!(policy.threshold(), 0.5);
        let result = policy.apply(create(0.6, full_params()), "");
        assert!(result.should_create_task);
    }
}
