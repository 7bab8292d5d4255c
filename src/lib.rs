//! # Strata
//!
//! A typed, two-phase middleware chain for async Rust.
//!
//! ## Features
//!
//! - **Onion Model**: Each stage transforms the input on the way up, and the output on the way down
//! - **Short-Circuiting**: Any stage can answer without running the rest of the chain
//! - **Conditional Branches**: A [`Filter`] enters a nested [`SubPipeline`] only for matching inputs
//! - **Rejoining**: A matched branch runs the rest of the enclosing chain inside its own boundary
//! - **Reentrant**: Every run owns its continuation state, so pipelines can serve concurrent runs
//!
//! ## Quick Start
//!
//! ```rust
//! use strata::prelude::*;
//!
//! struct Audit;
//!
//! #[async_trait]
//! impl Stage<String> for Audit {
//!     async fn invoke(&self, input: String, next: Next<'_, String>) -> Result<String> {
//!         let output = next.run(format!("{}-audited", input)).await?;
//!         Ok(format!("{}-logged", output))
//!     }
//! }
//!
//! struct Respond;
//!
//! #[async_trait]
//! impl Stage<String> for Respond {
//!     async fn invoke(&self, input: String, _next: Next<'_, String>) -> Result<String> {
//!         Ok(format!("{}-handled", input))
//!     }
//! }
//!
//! # futures::executor::block_on(async {
//! let pipeline = Pipeline::new()
//!     .pipe(Filter::when(|input: &String| input.starts_with("admin")).pipe(Audit))
//!     .pipe(Respond);
//!
//! assert_eq!(
//!     pipeline.run("admin".to_string()).await.unwrap(),
//!     "admin-audited-handled-logged"
//! );
//! assert_eq!(pipeline.run("guest".to_string()).await.unwrap(), "guest-handled");
//! # });
//! ```
//!
//! ## Module Organization
//!
//! - [`Stage`] and [`Next`]: the unit of work and its handle on the rest of the chain
//! - [`Pipeline`]: the base engine
//! - [`SubPipeline`] and [`Filter`]: conditional branches that rejoin their parent
//! - [`prelude`]: Commonly used types and traits (import with `use strata::prelude::*`)

// ============================================================================
// Core Module
// ============================================================================

mod core;

// ============================================================================
// Public Re-exports - Granular Imports
// ============================================================================

// Errors
pub use crate::core::error::{BoxError, PipelineError, Result};

// Engine
pub use crate::core::pipeline::{Next, Pipeline};
pub use crate::core::stage::{FnStage, Stage, stage_fn};
pub use crate::core::sub_pipeline::SubPipeline;

// Branching
pub use crate::core::filter::Filter;
pub use crate::core::matcher::{MatchStrategy, Matcher};

// ============================================================================
// Prelude Module - Convenient Bulk Imports
// ============================================================================

/// The main prelude: imports everything needed to build and run pipelines.
///
/// Also re-exports [`async_trait`](async_trait::async_trait), which every
/// [`Stage`] implementation needs.
///
/// # Example
/// ```rust
/// use strata::prelude::*;
/// ```
pub mod prelude {
    pub use super::{
        // Branching
        Filter,
        MatchStrategy,
        Matcher,
        // Engine
        Next,
        Pipeline,
        // Errors
        PipelineError,
        Result,
        Stage,
        SubPipeline,
        stage_fn,
    };
    pub use async_trait::async_trait;
}

// ============================================================================
// Re-export commonly used external types for convenience
// ============================================================================

pub use futures::future::BoxFuture;

// ============================================================================
// Library Metadata
// ============================================================================

/// The version of this crate.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// The name of this crate.
pub const NAME: &str = env!("CARGO_PKG_NAME");
