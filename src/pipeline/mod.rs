// src/pipeline/mod.rs

//! One build pass over a target.
//!
//! - [`runner`] resolves, maps and fans mappings out to a transform.
//! - [`transform`] defines the pluggable [`Transform`] trait.
//! - [`copy`] and [`command`] are the built-in transforms.
//! - [`result`] holds the per-run summary.

pub mod command;
pub mod copy;
pub mod hash;
pub mod result;
pub mod runner;
pub mod transform;

pub use command::CommandTransform;
pub use copy::CopyTransform;
pub use result::{Failure, FailureKind, RunResult};
pub use runner::{PipelineRunner, RunPlan, RunScope};
pub use transform::{FnTransform, Transform, TransformFuture, TransformOutcome, transform_for_target};
