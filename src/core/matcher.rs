use std::sync::Arc;

/// Decides whether a [`Filter`](crate::core::filter::Filter) enters its nested pipeline.
///
/// Implement it on a type for a reusable strategy, or pass any `Fn(&T) -> bool` directly:
/// closures get this trait through a blanket impl. Evaluation is synchronous and should
/// be free of side effects.
pub trait MatchStrategy<T>: Send + Sync {
    fn matches(&self, input: &T) -> bool;
}

impl<T, F> MatchStrategy<T> for F
where
    F: Fn(&T) -> bool + Send + Sync,
{
    fn matches(&self, input: &T) -> bool {
        self(input)
    }
}

/// A shareable, composable [`MatchStrategy`].
///
/// Every strategy a filter receives is normalized into a `Matcher` once, when the filter
/// is built.
pub struct Matcher<T> {
    inner: Arc<dyn MatchStrategy<T>>,
}

impl<T> Clone for Matcher<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<T: 'static> Matcher<T> {
    pub fn new<S: MatchStrategy<T> + 'static>(strategy: S) -> Self {
        Matcher {
            inner: Arc::new(strategy),
        }
    }

    /// Matches every input.
    pub fn always() -> Self {
        Self::new(|_: &T| true)
    }

    /// Matches no input.
    pub fn never() -> Self {
        Self::new(|_: &T| false)
    }

    /// Inverts this matcher.
    pub fn negate(self) -> Self {
        Self::new(move |input: &T| !self.matches(input))
    }

    /// Matches when both matchers do. `other` is not evaluated if `self` misses.
    pub fn and<S: MatchStrategy<T> + 'static>(self, other: S) -> Self {
        Self::new(move |input: &T| self.matches(input) && other.matches(input))
    }

    /// Matches when either matcher does. `other` is not evaluated if `self` hits.
    pub fn or<S: MatchStrategy<T> + 'static>(self, other: S) -> Self {
        Self::new(move |input: &T| self.matches(input) || other.matches(input))
    }
}

impl<T> MatchStrategy<T> for Matcher<T> {
    fn matches(&self, input: &T) -> bool {
        self.inner.matches(input)
    }
}
