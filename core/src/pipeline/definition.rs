// storefront/core/src/pipeline/definition.rs

//! The `Pipeline<TData, Err>` struct and its construction.

use crate::core::context::{FailureHandler, Handler};
use crate::core::step::StepDef;
use crate::error::PipelineError;
use std::collections::HashMap;

/// An ordered list of named steps run against a `ContextData<TData>`.
///
/// `Err` is the error type handlers return. It must be constructible from
/// `PipelineError` so engine-level failures (a required step without
/// handlers) surface through the same type.
pub struct Pipeline<TData, Err>
where
  TData: 'static + Send,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  pub(crate) steps: Vec<StepDef>,

  pub(crate) before: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) on: HashMap<String, Vec<Handler<TData, Err>>>,
  pub(crate) after: HashMap<String, Vec<Handler<TData, Err>>>,

  pub(crate) on_failure: Vec<FailureHandler<TData>>,
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Creates a pipeline from `(step_name, optional)` pairs, in execution order.
  ///
  /// # Panics
  /// When a step name appears twice.
  pub fn new(step_defs: &[(&str, bool)]) -> Self {
    let mut steps: Vec<StepDef> = Vec::with_capacity(step_defs.len());
    for (name, optional) in step_defs {
      if steps.iter().any(|s| s.name == *name) {
        panic!("Pipeline setup error: step '{}' is declared twice.", name);
      }
      steps.push(StepDef::new(*name, *optional));
    }

    Self {
      steps,
      before: HashMap::new(),
      on: HashMap::new(),
      after: HashMap::new(),
      on_failure: Vec::new(),
    }
  }

  /// Step names in execution order.
  pub fn step_names(&self) -> Vec<&str> {
    self.steps.iter().map(|s| s.name.as_str()).collect()
  }

  /// Panics when `step_name` is not part of this pipeline. A typo in a step
  /// name is a setup bug, not a runtime condition.
  pub(crate) fn ensure_step_exists(&self, step_name: &str) {
    if !self.steps.iter().any(|s| s.name == step_name) {
      panic!(
        "Pipeline setup error: step '{}' not found in pipeline definition.",
        step_name
      );
    }
  }
}
