// storefront/core/src/core/context.rs

//! The boxed handler type stored by pipelines.

use crate::core::context_data::ContextData;
use crate::core::control::PipelineControl;
use std::future::Future;
use std::pin::Pin;

/// A pipeline step handler.
///
/// Takes a clone of the shared context handle and resolves to a flow signal or
/// the pipeline's error type. Handlers must release context guards before
/// awaiting anything.
pub type Handler<TData, Err> = Box<
  dyn Fn(ContextData<TData>) -> Pin<Box<dyn Future<Output = Result<PipelineControl, Err>> + Send>>
    + Send
    + Sync,
>;

/// A compensation handler, run after a step fails.
///
/// Receives the context and a rendering of the error that failed the run. Its
/// own failures are logged and never replace the original error.
pub type FailureHandler<TData> = Box<
  dyn Fn(ContextData<TData>, String) -> Pin<Box<dyn Future<Output = anyhow::Result<()>> + Send>>
    + Send
    + Sync,
>;
