//! Resolution orchestrator.
//!
//! One resolution: prompt the generative pipeline once, mine its output for
//! a JSON object, complete it, then gate it through the decision policy. Any
//! pipeline failure short-circuits to the rule-based fallback.

use tracing::Instrument;
use uuid::Uuid;

use ta_protocol::IntentResult;

use crate::completer::complete;
use crate::config::ResolverConfig;
use crate::error::PipelineError;
use crate::fallback::FallbackResolver;
use crate::json_candidates::first_object;
use crate::ollama::OllamaConnector;
use crate::pipeline::LazyPipeline;
use crate::policy::DecisionPolicy;
use crate::prompt::build_prompt;

/// Turns user text into an `IntentResult`. Never fails.
pub struct IntentResolver {
    pipeline: Option<LazyPipeline>,
    fallback: FallbackResolver,
    policy: DecisionPolicy,
}

impl IntentResolver {
    pub fn new(
        pipeline: Option<LazyPipeline>,
        fallback: FallbackResolver,
        policy: DecisionPolicy,
    ) -> Self {
        Self {
            pipeline,
            fallback,
            policy,
        }
    }

    /// Rule-based only: every resolution goes straight to the fallback.
    pub fn without_pipeline() -> Self {
        Self::new(None, FallbackResolver::default(), DecisionPolicy::default())
    }

    /// Wire the Ollama pipeline (unless disabled), keyword tables and
    /// threshold from config. Nothing is contacted until the first resolution.
    pub fn from_config(config: &ResolverConfig) -> Self {
        let pipeline = if config.ollama.enabled {
            tracing::info!(
                host = %config.ollama.host,
                model = %config.ollama.model,
                "ollama pipeline enabled"
            );
            Some(LazyPipeline::new(OllamaConnector::new(config.ollama.clone())))
        } else {
            tracing::info!("ollama pipeline disabled, rule-based resolution only");
            None
        };

        Self::new(
            pipeline,
            FallbackResolver::new(config.keywords.clone()),
            DecisionPolicy::new(config.confidence_threshold),
        )
    }

    pub fn policy(&self) -> &DecisionPolicy {
        &self.policy
    }

    /// Resolve one user message.
    pub async fn resolve(&self, user_text: &str) -> IntentResult {
        let span = tracing::info_span!("resolve", resolution_id = %Uuid::now_v7());
        self.resolve_inner(user_text).instrument(span).await
    }

    async fn resolve_inner(&self, user_text: &str) -> IntentResult {
        let prompt = build_prompt(user_text);
        let invoked = match &self.pipeline {
            Some(pipeline) => pipeline.invoke(&prompt).await,
            None => Err(PipelineError::Disabled),
        };

        let raw = match invoked {
            Ok(raw) => raw,
            Err(PipelineError::Disabled) => {
                tracing::debug!("no generative pipeline, using fallback");
                return self.fallback.resolve("", user_text);
            }
            Err(e) => {
                tracing::warn!(error = %e, "generative pipeline failed, using fallback");
                return self.fallback.resolve("", user_text);
            }
        };

        tracing::debug!(raw = %raw, "model output");
        let completed = complete(first_object(&raw), &raw, user_text, &self.fallback);
        self.policy.apply(completed, user_text)
    }
}
