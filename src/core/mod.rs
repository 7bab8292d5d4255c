//! The execution engine: stages, pipelines, and conditional sub-pipelines.
//!
//! - [`stage`]: the [`Stage`](stage::Stage) capability and closure adapter
//! - [`pipeline`]: the base [`Pipeline`](pipeline::Pipeline) and its [`Next`](pipeline::Next) handle
//! - [`sub_pipeline`]: a pipeline that rejoins the pipeline enclosing it
//! - [`filter`]: a stage that enters a sub-pipeline when its matcher accepts the input
//! - [`matcher`]: the match strategies filters are built from

pub mod error;
pub mod filter;
pub mod matcher;
pub mod pipeline;
pub mod stage;
pub mod sub_pipeline;
