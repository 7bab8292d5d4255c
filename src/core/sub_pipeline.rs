use crate::core::error::Result;
use crate::core::pipeline::{Next, Pipeline, Terminal};
use crate::core::stage::Stage;

use async_trait::async_trait;
use futures::future::BoxFuture;

/// A pipeline that can run inside a stage of an enclosing pipeline.
///
/// When given a parent continuation, the sub-pipeline hands control to the enclosing
/// pipeline once its own up phase is done, and only starts its down phase after the
/// enclosing pipeline's remaining stages have resolved. Without a parent it behaves
/// exactly like a plain [`Pipeline`].
///
/// The parent is an argument of each run, never a field, so one sub-pipeline can serve
/// any number of concurrent runs.
pub struct SubPipeline<T>(Pipeline<T>);

/// The Derefs give access to the inner `Pipeline`'s builder and accessors
impl<T> std::ops::Deref for SubPipeline<T> {
    type Target = Pipeline<T>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> std::ops::DerefMut for SubPipeline<T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl<T> Clone for SubPipeline<T> {
    fn clone(&self) -> Self {
        SubPipeline(self.0.clone())
    }
}

impl<T: Send + 'static> Default for SubPipeline<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Send + 'static> From<Pipeline<T>> for SubPipeline<T> {
    fn from(pipeline: Pipeline<T>) -> Self {
        SubPipeline(pipeline)
    }
}

impl<T: Send + 'static> SubPipeline<T> {
    pub fn new() -> Self {
        SubPipeline(Pipeline::new())
    }

    pub fn named(name: impl Into<String>) -> Self {
        SubPipeline(Pipeline::named(name))
    }

    /// Appends a stage. Shadows [`Pipeline::pipe`] so the builder stays a `SubPipeline`.
    pub fn pipe<S: Stage<T> + 'static>(self, stage: S) -> Self {
        SubPipeline(self.0.pipe(stage))
    }

    /// Runs standalone; identical to [`Pipeline::run`].
    pub async fn run(&self, input: T) -> Result<T> {
        self.0.run(input).await
    }

    /// Runs with `parent` as the continuation reached when this pipeline runs out of stages.
    ///
    /// The output of `parent` becomes the value every nested stage's down phase unwinds.
    pub fn run_with_parent<'a>(&'a self, input: T, parent: Next<'a, T>) -> BoxFuture<'a, Result<T>> {
        let run_id = parent.run_id();
        log::trace!(
            "[{}] run {}: entered with parent continuation, {} stage(s)",
            self.0.name(),
            run_id,
            self.0.len()
        );
        self.0
            .entry(Terminal::Parent(Box::new(parent)), run_id)
            .run(input)
    }

    pub fn into_inner(self) -> Pipeline<T> {
        self.0
    }
}

/// Piping a sub-pipeline directly behaves like a filter that always matches.
#[async_trait]
impl<T: Send + 'static> Stage<T> for SubPipeline<T> {
    async fn invoke(&self, input: T, next: Next<'_, T>) -> Result<T> {
        self.run_with_parent(input, next).await
    }
}
