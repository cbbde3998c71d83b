//! Rule-based fallback resolver: keyword matching plus regex extraction.
//!
//! Used whenever the generative pipeline is unavailable or its output is not
//! usable. Fully deterministic: the same input always resolves the same way.

use serde::Deserialize;

use ta_protocol::{Intent, IntentResult, TaskParams};

use crate::classify::classify;
use crate::extract::extract_params;
use crate::templates::TemplateRegistry;

pub const GREETING_REPLY: &str =
    "您好！我是智能任务助手，可以帮您创建和管理任务。请告诉我您需要什么帮助？";
pub const QUERY_REPLY: &str = "我可以帮您查询任务信息，请告诉我您想了解什么？";
pub const UNKNOWN_REPLY: &str = "我理解了您的需求，正在为您处理...";
pub const DEFAULT_TASK_REPLY: &str =
    "检测到您提到地铁隧道巡检相关内容，已为您创建默认巡检任务。您可以告诉我具体的起始位置和距离要求。";
/// Generic acknowledgment used when a reply is missing.
pub const GENERIC_REPLY: &str = "我理解了您的需求";

/// Keyword tables driving the fallback branches, matched as substrings of
/// lower-cased text. Entries are lower-cased when loaded and again when a
/// `FallbackResolver` is built.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct KeywordSets {
    #[serde(deserialize_with = "lowercase_words")]
    pub greeting: Vec<String>,
    #[serde(deserialize_with = "lowercase_words")]
    pub create_task: Vec<String>,
    #[serde(deserialize_with = "lowercase_words")]
    pub query_task: Vec<String>,
    /// Greeting markers looked for in a model-supplied reply.
    #[serde(deserialize_with = "lowercase_words")]
    pub reply_greeting: Vec<String>,
    /// Facility terms that still warrant a default task when nothing else matched.
    #[serde(deserialize_with = "lowercase_words")]
    pub domain_anchors: Vec<String>,
}

fn owned(words: &[&str]) -> Vec<String> {
    words.iter().map(|w| w.to_string()).collect()
}

fn lowercase_all(words: &mut [String]) {
    for word in words {
        *word = word.to_lowercase();
    }
}

fn lowercase_words<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let mut words = Vec::<String>::deserialize(deserializer)?;
    lowercase_all(&mut words);
    Ok(words)
}

impl KeywordSets {
    /// Lower-case every entry in place.
    pub fn normalize(&mut self) {
        for words in [
            &mut self.greeting,
            &mut self.create_task,
            &mut self.query_task,
            &mut self.reply_greeting,
            &mut self.domain_anchors,
        ] {
            lowercase_all(words);
        }
    }
}

impl Default for KeywordSets {
    fn default() -> Self {
        Self {
            greeting: owned(&[
                "你好", "您好", "早上好", "下午好", "晚上好", "hi", "hello", "good morning",
                "good afternoon", "good evening",
            ]),
            create_task: owned(&[
                "新建任务", "创建任务", "建个任务", "添加任务", "生成任务", "帮我创建", "帮我建",
                "巡检", "检查", "监控", "create", "new", "task", "inspection", "check",
                "monitor", "地铁", "隧道", "轨道", "线路",
            ]),
            query_task: owned(&[
                "查询任务", "查看任务", "任务列表", "有哪些任务", "任务状态", "任务进度", "query",
                "list", "status", "progress", "查看", "查询", "了解",
            ]),
            reply_greeting: owned(&["您好", "你好", "hi", "hello"]),
            domain_anchors: owned(&["地铁", "隧道", "巡检"]),
        }
    }
}

/// Check if the text contains any of the given keywords.
pub fn matches_any(text: &str, keywords: &[String]) -> bool {
    keywords.iter().any(|k| text.contains(k.as_str()))
}

/// Classify the text, extract explicit parameters, and lay them over the
/// matched template's defaults.
///
/// If the merged task name is still the template's unmodified default, the
/// template's display name is used instead.
pub fn generate_task_params(registry: &'static TemplateRegistry, text: &str) -> TaskParams {
    let classification = classify(registry, text);
    let template = classification.template;

    let mut params = extract_params(text).merge_over(template.default_params());
    if params.task_name.as_deref() == Some(template.defaults.task_name) {
        params.task_name = Some(template.display_name.to_string());
    }
    params.task_type = Some(template.id.to_string());
    params.confidence = Some(classification.confidence);
    params
}

/// Confirmation reply for a created task.
pub fn confirmation_reply(params: &TaskParams) -> String {
    format!(
        "已为您创建{}，起始位置：{}，距离：{}米，执行人：{}",
        params.task_name.as_deref().unwrap_or_default(),
        params.start_pos.as_deref().unwrap_or_default(),
        params.task_trip.unwrap_or_default(),
        params.executor.as_deref().unwrap_or_default(),
    )
}

/// Deterministic resolver built from keyword tables and the template registry.
#[derive(Debug, Clone)]
pub struct FallbackResolver {
    keywords: KeywordSets,
    registry: &'static TemplateRegistry,
}

impl Default for FallbackResolver {
    fn default() -> Self {
        Self::new(KeywordSets::default())
    }
}

impl FallbackResolver {
    pub fn new(mut keywords: KeywordSets) -> Self {
        keywords.normalize();
        Self {
            keywords,
            registry: TemplateRegistry::builtin(),
        }
    }

    pub fn keywords(&self) -> &KeywordSets {
        &self.keywords
    }

    pub fn registry(&self) -> &'static TemplateRegistry {
        self.registry
    }

    /// True if a model-supplied reply reads as a greeting.
    pub fn is_greeting_reply(&self, reply: &str) -> bool {
        matches_any(&reply.to_lowercase(), &self.keywords.reply_greeting)
    }

    /// Resolve without the model. `raw` is whatever the model produced (may be
    /// empty); `user_input` is the user's utterance.
    ///
    /// Branches are evaluated in strict priority order, first hit wins.
    pub fn resolve(&self, raw: &str, user_input: &str) -> IntentResult {
        let raw_lower = raw.to_lowercase();
        let input_lower = user_input.to_lowercase();
        let either = |keywords: &[String]| {
            matches_any(&raw_lower, keywords) || matches_any(&input_lower, keywords)
        };

        if either(&self.keywords.greeting) {
            tracing::debug!(branch = "greeting", "fallback resolved");
            return IntentResult::greeting(GREETING_REPLY);
        }

        if either(&self.keywords.create_task) {
            tracing::debug!(branch = "create_task", "fallback resolved");
            let params = generate_task_params(self.registry, user_input);
            return IntentResult {
                intent: Intent::CreateTask,
                confidence: 0.8,
                reply: confirmation_reply(&params),
                params,
                should_create_task: true,
            };
        }

        if either(&self.keywords.query_task) {
            tracing::debug!(branch = "query_task", "fallback resolved");
            return IntentResult {
                intent: Intent::QueryTask,
                confidence: 0.7,
                params: TaskParams::default(),
                reply: QUERY_REPLY.into(),
                should_create_task: false,
            };
        }

        if classify(self.registry, user_input).matched {
            tracing::debug!(branch = "template", "fallback resolved");
            let params = generate_task_params(self.registry, user_input);
            return IntentResult {
                intent: Intent::CreateTask,
                confidence: 0.6,
                reply: confirmation_reply(&params),
                params,
                should_create_task: true,
            };
        }

        if matches_any(&input_lower, &self.keywords.domain_anchors) {
            tracing::debug!(branch = "domain_anchor", "fallback resolved");
            return IntentResult {
                intent: Intent::CreateTask,
                confidence: 0.5,
                params: self.registry.fallback().default_params(),
                reply: DEFAULT_TASK_REPLY.into(),
                should_create_task: true,
            };
        }

        tracing::debug!(branch = "unknown", "fallback resolved");
        IntentResult::unknown(UNKNOWN_REPLY)
    }
}
