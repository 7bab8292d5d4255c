use crate::core::error::{PipelineError, Result};
use crate::core::stage::{FnStage, Stage, stage_fn};

use futures::FutureExt;
use futures::future::{self, BoxFuture};
use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use uuid::Uuid;

const DEFAULT_PIPELINE_NAME: &str = "pipeline";

/// What happens once a chain runs out of stages.
pub(crate) enum Terminal<'a, T> {
    /// Hand the final up value straight back as the down value.
    Resolve,
    /// Run the rest of an enclosing chain, then unwind with its output.
    Parent(Box<Next<'a, T>>),
}

impl<'a, T: Send + 'static> Terminal<'a, T> {
    fn end(self, input: T, pipeline: &'a str, run_id: Uuid) -> BoxFuture<'a, Result<T>> {
        match self {
            Terminal::Resolve => {
                log::trace!("[{}] run {}: end of chain, resolving", pipeline, run_id);
                Box::pin(future::ready(Ok(input)))
            }
            Terminal::Parent(parent) => {
                log::trace!(
                    "[{}] run {}: end of chain, handing off to '{}' at stage {}",
                    pipeline,
                    run_id,
                    parent.pipeline,
                    parent.position
                );
                (*parent).run(input)
            }
        }
    }
}

/// The remainder of a chain, as seen from inside a stage.
///
/// `Next` is consumed by [`Next::run`], so a stage can enter the rest of the chain at most
/// once. Dropping it instead skips every later stage.
pub struct Next<'a, T> {
    stages: &'a [Arc<dyn Stage<T>>],
    terminal: Terminal<'a, T>,
    pipeline: &'a str,
    position: usize,
    run_id: Uuid,
}

impl<'a, T: Send + 'static> Next<'a, T> {
    pub(crate) fn new(
        stages: &'a [Arc<dyn Stage<T>>],
        terminal: Terminal<'a, T>,
        pipeline: &'a str,
        run_id: Uuid,
    ) -> Self {
        Next {
            stages,
            terminal,
            pipeline,
            position: 0,
            run_id,
        }
    }

    /// Runs the rest of the chain with `input` and resolves with the value it unwinds to.
    pub fn run(self, input: T) -> BoxFuture<'a, Result<T>> {
        let Next {
            stages,
            terminal,
            pipeline,
            position,
            run_id,
        } = self;

        match stages.split_first() {
            Some((stage, rest)) => {
                log::trace!("[{}] run {}: invoking stage {}", pipeline, run_id, position);
                let next = Next {
                    stages: rest,
                    terminal,
                    pipeline,
                    position: position + 1,
                    run_id,
                };
                stage.invoke(input, next)
            }
            None => terminal.end(input, pipeline, run_id),
        }
    }

    /// Index of the stage this handle will invoke, within its own pipeline.
    pub fn position(&self) -> usize {
        self.position
    }

    /// Number of stages left in this handle's own pipeline.
    pub fn remaining(&self) -> usize {
        self.stages.len()
    }

    /// Identifier shared by every stage of the current run.
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }
}

/// An ordered chain of [`Stage`]s executed as nested up/down phases.
///
/// Stages run their up phase in the order they were piped and their down phase in
/// reverse. Each call to [`run`](Pipeline::run) gets its own continuation state, so one
/// pipeline may serve concurrent runs.
pub struct Pipeline<T> {
    name: String,
    stages: Vec<Arc<dyn Stage<T>>>,
}

impl<T> Clone for Pipeline<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            stages: self.stages.clone(),
        }
    }
}

impl<T: Send + 'static> Default for Pipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> Pipeline<T> {
    /// Creates an empty pipeline.
    pub fn new() -> Self {
        Self::named(DEFAULT_PIPELINE_NAME)
    }

    /// Creates an empty pipeline whose name tags its log lines.
    pub fn named(name: impl Into<String>) -> Self {
        Pipeline {
            name: name.into(),
            stages: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.stages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stages.is_empty()
    }

    /// Appends a stage and hands the pipeline back for further piping.
    pub fn pipe<S: Stage<T> + 'static>(self, stage: S) -> Self {
        self.pipe_shared(Arc::new(stage))
    }

    /// Appends a stage that is already shared with other pipelines.
    pub fn pipe_shared(mut self, stage: Arc<dyn Stage<T>>) -> Self {
        self.stages.push(stage);
        self
    }

    /// Appends a closure stage. See [`stage_fn`].
    pub fn pipe_fn<F>(self, f: F) -> Self
    where
        F: for<'a> Fn(T, Next<'a, T>) -> BoxFuture<'a, Result<T>> + Send + Sync + 'static,
    {
        let stage: FnStage<T, F> = stage_fn(f);
        self.pipe(stage)
    }

    /// Appends a stage in place.
    pub fn push<S: Stage<T> + 'static>(&mut self, stage: S) -> &mut Self {
        self.stages.push(Arc::new(stage));
        self
    }

    /// Runs `input` through every stage and resolves with the fully unwound output.
    ///
    /// A panic raised by any stage is caught and reported as [`PipelineError::Panicked`].
    pub async fn run(&self, input: T) -> Result<T> {
        let run_id = Uuid::new_v4();
        log::debug!(
            "[{}] run {}: started with {} stage(s)",
            self.name,
            run_id,
            self.stages.len()
        );

        let next = self.entry(Terminal::Resolve, run_id);
        let result = match AssertUnwindSafe(next.run(input)).catch_unwind().await {
            Ok(result) => result,
            Err(payload) => Err(PipelineError::Panicked(panic_message(payload))),
        };

        match &result {
            Ok(_) => log::debug!("[{}] run {}: settled", self.name, run_id),
            Err(err) => log::warn!("[{}] run {}: failed: {}", self.name, run_id, err),
        }
        result
    }

    pub(crate) fn entry<'a>(&'a self, terminal: Terminal<'a, T>, run_id: Uuid) -> Next<'a, T> {
        Next::new(&self.stages, terminal, &self.name, run_id)
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(msg) = payload.downcast_ref::<&str>() {
        (*msg).to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Clone)]
    struct Tag {
        id: &'static str,
    }

    #[async_trait]
    impl Stage<String> for Tag {
        async fn invoke(&self, input: String, next: Next<'_, String>) -> Result<String> {
            tokio::time::sleep(tokio::time::Duration::from_millis(1)).await;
            let output = next.run(format!("{}-{}-up", input, self.id)).await?;
            Ok(format!("{}-{}-down", output, self.id))
        }
    }

    struct Respond;

    #[async_trait]
    impl Stage<String> for Respond {
        async fn invoke(&self, input: String, _next: Next<'_, String>) -> Result<String> {
            Ok(format!("{}-respond", input))
        }
    }

    struct Counting {
        hits: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl Stage<String> for Counting {
        async fn invoke(&self, input: String, next: Next<'_, String>) -> Result<String> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            next.run(input).await
        }
    }

    struct Panicking;

    #[async_trait]
    impl Stage<String> for Panicking {
        async fn invoke(&self, _input: String, _next: Next<'_, String>) -> Result<String> {
            panic!("stage blew up");
        }
    }

    #[tokio::test]
    async fn test_empty_pipeline_is_identity() {
        let pipeline: Pipeline<String> = Pipeline::new();
        assert!(pipeline.is_empty());
        assert_eq!(pipeline.run("input".to_string()).await.unwrap(), "input");
    }

    #[tokio::test]
    async fn test_up_in_order_down_in_reverse() {
        let pipeline = Pipeline::new()
            .pipe(Tag { id: "S1" })
            .pipe(Tag { id: "S2" })
            .pipe(Tag { id: "S3" });

        let output = pipeline.run("x".to_string()).await.unwrap();
        assert_eq!(output, "x-S1-up-S2-up-S3-up-S3-down-S2-down-S1-down");
    }

    #[tokio::test]
    async fn test_short_circuit_skips_later_stages() {
        let hits = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .pipe(Tag { id: "A" })
            .pipe(Respond)
            .pipe(Counting { hits: hits.clone() });

        let output = pipeline.run("x".to_string()).await.unwrap();
        assert_eq!(output, "x-A-up-respond-A-down");
        assert_eq!(hits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_push_appends_in_place() {
        let mut pipeline = Pipeline::named("in-place");
        pipeline.push(Tag { id: "A" }).push(Tag { id: "B" });

        assert_eq!(pipeline.len(), 2);
        assert_eq!(pipeline.name(), "in-place");
        let output = pipeline.run("x".to_string()).await.unwrap();
        assert_eq!(output, "x-A-up-B-up-B-down-A-down");
    }

    #[tokio::test]
    async fn test_pipe_fn_closure_stage() {
        let pipeline = Pipeline::new()
            .pipe_fn(|input: String, next| {
                Box::pin(async move { next.run(input + "-up").await.map(|out| out + "-down") })
            })
            .pipe(Tag { id: "B" });

        let output = pipeline.run("x".to_string()).await.unwrap();
        assert_eq!(output, "x-up-B-up-B-down-down");
    }

    #[tokio::test]
    async fn test_shared_stage_is_reused() {
        let hits = Arc::new(AtomicUsize::new(0));
        let counter: Arc<dyn Stage<String>> = Arc::new(Counting { hits: hits.clone() });
        let pipeline = Pipeline::new()
            .pipe_shared(counter.clone())
            .pipe_shared(counter);

        pipeline.run("a".to_string()).await.unwrap();
        pipeline.run("b".to_string()).await.unwrap();
        assert_eq!(hits.load(Ordering::SeqCst), 4);
    }

    #[tokio::test]
    async fn test_panic_becomes_error() {
        let pipeline = Pipeline::new().pipe(Tag { id: "A" }).pipe(Panicking);

        let err = pipeline.run("x".to_string()).await.unwrap_err();
        match err {
            PipelineError::Panicked(msg) => assert_eq!(msg, "stage blew up"),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[tokio::test]
    async fn test_next_reports_position() {
        struct Probe {
            seen: Arc<AtomicUsize>,
        }

        #[async_trait]
        impl Stage<String> for Probe {
            async fn invoke(&self, input: String, next: Next<'_, String>) -> Result<String> {
                self.seen.store(next.position() * 10 + next.remaining(), Ordering::SeqCst);
                next.run(input).await
            }
        }

        let seen = Arc::new(AtomicUsize::new(0));
        let pipeline = Pipeline::new()
            .pipe(Tag { id: "A" })
            .pipe(Probe { seen: seen.clone() })
            .pipe(Tag { id: "C" });

        pipeline.run("x".to_string()).await.unwrap();
        // Probe sits at index 1, so its `next` points at index 2 with one stage left.
        assert_eq!(seen.load(Ordering::SeqCst), 21);
    }
}
