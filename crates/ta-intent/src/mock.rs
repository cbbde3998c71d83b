//! Mock generative pipeline for testing without a model server.
//!
//! Records every prompt and counts invocations and builds for assertion in
//! tests.

use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::error::{PipelineError, PipelineResult};
use crate::pipeline::{ChatPrompt, GenerativePipeline, PipelineFactory};

#[derive(Debug, Clone)]
enum Behavior {
    Reply(String),
    Fail,
}

/// Mock implementation of the `GenerativePipeline` trait.
///
/// Thread-safe via `Mutex` (fine for test contexts).
pub struct MockPipeline {
    behavior: Behavior,
    calls: AtomicUsize,
    prompts: Mutex<Vec<ChatPrompt>>,
}

impl MockPipeline {
    /// A pipeline that always returns `text`.
    pub fn replying(text: impl Into<String>) -> Self {
        Self::with_behavior(Behavior::Reply(text.into()))
    }

    /// A pipeline whose every invocation fails.
    pub fn failing() -> Self {
        Self::with_behavior(Behavior::Fail)
    }

    fn with_behavior(behavior: Behavior) -> Self {
        Self {
            behavior,
            calls: AtomicUsize::new(0),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Number of invocations so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// All prompts received, in order.
    pub fn prompts(&self) -> Vec<ChatPrompt> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl GenerativePipeline for MockPipeline {
    async fn invoke(&self, prompt: &ChatPrompt) -> PipelineResult<String> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.prompts.lock().unwrap().push(prompt.clone());
        match &self.behavior {
            Behavior::Reply(text) => Ok(text.clone()),
            Behavior::Fail => Err(PipelineError::Request("mock pipeline failure".into())),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Mock factory handing out a shared `MockPipeline`.
pub struct MockFactory {
    pipeline: Arc<MockPipeline>,
    builds: Arc<AtomicUsize>,
    failures_left: AtomicUsize,
    delay: Duration,
}

impl MockFactory {
    pub fn new(pipeline: Arc<MockPipeline>) -> Self {
        Self {
            pipeline,
            builds: Arc::new(AtomicUsize::new(0)),
            failures_left: AtomicUsize::new(0),
            delay: Duration::ZERO,
        }
    }

    /// Sleep this long inside every build, to widen first-use races.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Fail the first `n` builds.
    pub fn failing_times(self, n: usize) -> Self {
        self.failures_left.store(n, Ordering::SeqCst);
        self
    }

    /// Shared counter of build attempts (kept valid after the factory is moved).
    pub fn build_counter(&self) -> Arc<AtomicUsize> {
        self.builds.clone()
    }
}

#[async_trait]
impl PipelineFactory for MockFactory {
    async fn build(&self) -> PipelineResult<Arc<dyn GenerativePipeline>> {
        self.builds.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let failing = self
            .failures_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            return Err(PipelineError::Init("mock build failure".into()));
        }

        Ok(self.pipeline.clone())
    }
}
