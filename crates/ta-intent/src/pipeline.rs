//! Generative pipeline seam and its initialize-once handle.
//!
//! The pipeline is opaque to resolution: a prompt goes in, raw text comes
//! out, or it fails. Setting one up is expensive (model load, server probe),
//! so `LazyPipeline` builds it on first use and shares it afterwards.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::OnceCell;

use crate::error::PipelineResult;

/// Fixed system instructions plus the user's message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatPrompt {
    pub system: String,
    pub user: String,
}

impl ChatPrompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

/// A text-generation backend.
#[async_trait]
pub trait GenerativePipeline: Send + Sync {
    /// Run one generation and return the raw model text.
    async fn invoke(&self, prompt: &ChatPrompt) -> PipelineResult<String>;

    /// Backend name (for logging).
    fn name(&self) -> &str;
}

/// Performs the expensive one-time setup of a pipeline.
#[async_trait]
pub trait PipelineFactory: Send + Sync {
    async fn build(&self) -> PipelineResult<Arc<dyn GenerativePipeline>>;
}

/// Lazily-initialized, shared pipeline handle.
///
/// The factory runs inside a `OnceCell`: concurrent first callers are
/// serialized, so at most one successful build ever happens and every later
/// caller reuses that handle. A failed build is not cached; the next caller
/// tries again.
pub struct LazyPipeline {
    factory: Option<Box<dyn PipelineFactory>>,
    handle: OnceCell<Arc<dyn GenerativePipeline>>,
}

impl LazyPipeline {
    pub fn new(factory: impl PipelineFactory + 'static) -> Self {
        Self {
            factory: Some(Box::new(factory)),
            handle: OnceCell::new(),
        }
    }

    /// Wrap an already-built pipeline.
    pub fn ready(pipeline: Arc<dyn GenerativePipeline>) -> Self {
        Self {
            factory: None,
            handle: OnceCell::from(pipeline),
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.handle.initialized()
    }

    /// The shared pipeline, building it first if needed.
    pub async fn get(&self) -> PipelineResult<Arc<dyn GenerativePipeline>> {
        let handle = self
            .handle
            .get_or_try_init(|| async {
                let Some(factory) = &self.factory else {
                    return Err(crate::PipelineError::Init("no pipeline factory".into()));
                };
                tracing::info!("initializing generative pipeline");
                let pipeline = factory.build().await?;
                tracing::info!(pipeline = pipeline.name(), "generative pipeline ready");
                Ok(pipeline)
            })
            .await?;
        Ok(handle.clone())
    }

    /// Invoke the pipeline, initializing it first if needed.
    pub async fn invoke(&self, prompt: &ChatPrompt) -> PipelineResult<String> {
        self.get().await?.invoke(prompt).await
    }
}
