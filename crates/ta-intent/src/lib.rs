//! Task assistant intent resolution.
//!
//! Turns free-form operator text ("创建隧道巡检任务，起点：东门，800米") into a
//! structured `IntentResult`. A generative model is asked first; its output is
//! mined for a JSON object, completed, and gated on confidence. Whenever the
//! model is unavailable or its output is unusable, a deterministic
//! keyword/regex resolver produces the result instead.

pub mod classify;
pub mod completer;
pub mod config;
pub mod error;
pub mod extract;
pub mod fallback;
pub mod json_candidates;
pub mod mock;
pub mod ollama;
pub mod pipeline;
pub mod policy;
pub mod prompt;
pub mod resolver;
pub mod templates;

pub use config::ResolverConfig;
pub use error::{PipelineError, PipelineResult};
pub use fallback::{FallbackResolver, KeywordSets, generate_task_params};
pub use pipeline::{ChatPrompt, GenerativePipeline, LazyPipeline, PipelineFactory};
pub use policy::DecisionPolicy;
pub use resolver::IntentResolver;
