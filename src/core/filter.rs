use crate::core::error::Result;
use crate::core::matcher::{MatchStrategy, Matcher};
use crate::core::pipeline::Next;
use crate::core::stage::Stage;
use crate::core::sub_pipeline::SubPipeline;

use async_trait::async_trait;

const DEFAULT_FILTER_NAME: &str = "filter";

/// A stage that runs a nested [`SubPipeline`] only for inputs its matcher accepts.
///
/// On a match, the rest of the enclosing pipeline runs between the nested stages' up and
/// down phases. On a miss, the nested stages are skipped and the enclosing pipeline carries
/// on as if the filter were not there.
///
/// ```rust
/// use strata::prelude::*;
///
/// let pipeline: Pipeline<String> = Pipeline::new()
///     .pipe(Filter::when(|input: &String| input.starts_with("admin")));
/// assert_eq!(pipeline.len(), 1);
/// ```
pub struct Filter<T> {
    name: String,
    matcher: Matcher<T>,
    pipeline: SubPipeline<T>,
}

impl<T: Send + 'static> Filter<T> {
    /// Creates a filter with an empty nested pipeline.
    ///
    /// # Arguments
    /// * `strategy` - Either a [`MatchStrategy`] implementation or a `Fn(&T) -> bool`
    pub fn new<S: MatchStrategy<T> + 'static>(strategy: S) -> Self {
        Self::with_pipeline(strategy, SubPipeline::new())
    }

    /// Creates a filter from a bare callback.
    pub fn when<F>(callback: F) -> Self
    where
        F: Fn(&T) -> bool + Send + Sync + 'static,
    {
        Self::new(callback)
    }

    /// Creates a filter around an existing nested pipeline.
    pub fn with_pipeline<S: MatchStrategy<T> + 'static>(
        strategy: S,
        pipeline: SubPipeline<T>,
    ) -> Self {
        Filter {
            name: DEFAULT_FILTER_NAME.to_string(),
            matcher: Matcher::new(strategy),
            pipeline,
        }
    }

    /// Sets the name used in this filter's log lines.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Appends a stage to the nested pipeline.
    pub fn pipe<S: Stage<T> + 'static>(mut self, stage: S) -> Self {
        self.pipeline = self.pipeline.pipe(stage);
        self
    }

    /// Appends a stage to the nested pipeline in place.
    pub fn push<S: Stage<T> + 'static>(&mut self, stage: S) -> &mut Self {
        self.pipeline.push(stage);
        self
    }

    pub fn pipeline(&self) -> &SubPipeline<T> {
        &self.pipeline
    }

    pub fn matches(&self, input: &T) -> bool {
        self.matcher.matches(input)
    }
}

#[async_trait]
impl<T: Send + 'static> Stage<T> for Filter<T> {
    async fn invoke(&self, input: T, next: Next<'_, T>) -> Result<T> {
        if self.matcher.matches(&input) {
            log::debug!(
                "[{}] run {}: matched, entering {} nested stage(s)",
                self.name,
                next.run_id(),
                self.pipeline.len()
            );
            self.pipeline.run_with_parent(input, next).await
        } else {
            log::debug!("[{}] run {}: no match, bypassing", self.name, next.run_id());
            next.run(input).await
        }
    }
}
