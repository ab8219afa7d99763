// storefront/core/src/lib.rs

//! Step-pipeline engine for the storefront service.
//!
//! A pipeline is an ordered list of named steps run against one shared,
//! lockable context. Each step can carry `before`, `on` and `after` handlers;
//! any handler may stop the run early or fail it. When a run fails, the
//! pipeline's failure handlers get a chance to compensate (for example by
//! rolling back an open database transaction) before the error is returned.
//!
//! Workflow at a glance:
//! 1. Define a context struct `MyCtx` for the process.
//! 2. Build a `Pipeline<MyCtx, MyError>` with its step names.
//! 3. Attach handlers with `.on_root()`, `.before_root()`, `.after_root()` and
//!    compensation with `.on_failure()`.
//! 4. Register the pipeline with a `Workflows<MyError>` registry.
//! 5. Run it with `workflows.run(ContextData::new(my_ctx)).await`.

pub mod core;
pub mod error;
pub mod pipeline;
pub mod registry;

pub use crate::core::context::{FailureHandler, Handler};
pub use crate::core::context_data::ContextData;
pub use crate::core::control::{PipelineControl, PipelineResult};
pub use crate::core::step::StepDef;

pub use crate::pipeline::definition::Pipeline;

pub use crate::error::{PipelineError, PipelineOutcome};

pub use crate::registry::Workflows;
