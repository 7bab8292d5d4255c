use crate::core::error::Result;
use crate::core::pipeline::Next;

use async_trait::async_trait;
use futures::future::BoxFuture;
use std::marker::PhantomData;

/// A unit of work in a [`Pipeline`](crate::core::pipeline::Pipeline).
///
/// A stage has two phases wired through a single call to [`Next::run`]:
/// 1. **Up**: whatever happens to `input` before `next` is run
/// 2. **Down**: whatever happens to the downstream output after `next` resolves
///
/// Returning `Ok` settles this position of the chain, returning `Err` fails the whole run.
/// A stage that returns without running `next` short-circuits: no later stage is invoked.
///
/// Stages are shared behind an `Arc` and may be invoked by many runs, so any state they
/// keep must tolerate repeated and concurrent use.
#[async_trait]
pub trait Stage<T>: Send + Sync {
    /// Runs this stage for one input.
    ///
    /// # Arguments
    /// * `input` - The value produced by the previous stage (or given to `run`)
    /// * `next` - The remainder of the chain, consumed when run
    ///
    /// # Returns
    /// The value this position hands back to the previous stage's down phase
    async fn invoke(&self, input: T, next: Next<'_, T>) -> Result<T>;
}

/// Adapts a closure into a [`Stage`].
///
/// Built with [`stage_fn`] or [`Pipeline::pipe_fn`](crate::core::pipeline::Pipeline::pipe_fn).
pub struct FnStage<T, F> {
    f: F,
    _input: PhantomData<fn(T) -> T>,
}

/// Wraps `f` so it can be piped like any other stage.
///
/// ```rust
/// use strata::prelude::*;
///
/// let shout = stage_fn(|input: String, next| {
///     Box::pin(async move { next.run(input.to_uppercase()).await })
/// });
/// let pipeline = Pipeline::new().pipe(shout);
/// assert_eq!(pipeline.len(), 1);
/// ```
pub fn stage_fn<T, F>(f: F) -> FnStage<T, F>
where
    T: Send + 'static,
    F: for<'a> Fn(T, Next<'a, T>) -> BoxFuture<'a, Result<T>> + Send + Sync,
{
    FnStage {
        f,
        _input: PhantomData,
    }
}

#[async_trait]
impl<T, F> Stage<T> for FnStage<T, F>
where
    T: Send + 'static,
    F: for<'a> Fn(T, Next<'a, T>) -> BoxFuture<'a, Result<T>> + Send + Sync,
{
    async fn invoke(&self, input: T, next: Next<'_, T>) -> Result<T> {
        (self.f)(input, next).await
    }
}
