// storefront/core/src/pipeline/execution.rs

//! `Pipeline::run()`: step-by-step execution and failure compensation.

use crate::core::context::Handler;
use crate::core::context_data::ContextData;
use crate::core::control::{PipelineControl, PipelineResult};
use crate::error::PipelineError;
use crate::pipeline::definition::Pipeline;
use tracing::{event, info_span, instrument, Instrument, Level};

/// What a single phase (before / on / after) of a step ended with.
enum PhaseOutcome<Err> {
  Continue,
  Stopped,
  Failed(Err),
}

impl<TData, Err> Pipeline<TData, Err>
where
  TData: 'static + Send,
  Err: std::error::Error + From<PipelineError> + Send + Sync + 'static,
{
  /// Runs every step against `ctx_data`.
  ///
  /// Returns `Completed` when all steps ran, `Stopped` when a handler returned
  /// `PipelineControl::Stop`, or the first error. On error every failure
  /// handler runs before the error is returned.
  #[instrument(
    name = "Pipeline::run",
    skip_all,
    fields(
      context_type = %std::any::type_name::<TData>(),
      num_steps = self.steps.len(),
    )
  )]
  pub async fn run(&self, ctx_data: ContextData<TData>) -> Result<PipelineResult, Err> {
    event!(Level::DEBUG, "Pipeline execution starting.");

    for (step_idx, step_def) in self.steps.iter().enumerate() {
      let step_name = step_def.name.as_str();
      let step_span = info_span!("pipeline_step", step_name, step_index = step_idx);

      let before = self.before.get(step_name).filter(|v| !v.is_empty());
      let on = self.on.get(step_name).filter(|v| !v.is_empty());
      let after = self.after.get(step_name).filter(|v| !v.is_empty());

      if before.is_none() && on.is_none() && after.is_none() {
        if step_def.optional {
          event!(Level::DEBUG, step_name, "Optional step has no handlers, skipping.");
          continue;
        }
        event!(Level::ERROR, step_name, "Non-optional step has no handlers.");
        let err = Err::from(PipelineError::HandlerMissing {
          step_name: step_def.name.clone(),
        });
        self.compensate(&ctx_data, &err).await;
        return Err(err);
      }

      for (phase, handlers) in [("before", before), ("on", on), ("after", after)] {
        let Some(handlers) = handlers else { continue };
        let outcome = Self::run_phase(handlers, &ctx_data, phase)
          .instrument(step_span.clone())
          .await;
        match outcome {
          PhaseOutcome::Continue => {}
          PhaseOutcome::Stopped => {
            event!(Level::INFO, step_name, phase, "Pipeline stopped by a handler.");
            return Ok(PipelineResult::Stopped);
          }
          PhaseOutcome::Failed(err) => {
            event!(Level::DEBUG, step_name, phase, error = %err, "Step handler failed.");
            self.compensate(&ctx_data, &err).await;
            return Err(err);
          }
        }
      }
      event!(Level::DEBUG, step_name, "Step finished.");
    }

    event!(Level::DEBUG, "Pipeline execution completed.");
    Ok(PipelineResult::Completed)
  }

  async fn run_phase(handlers: &[Handler<TData, Err>], ctx_data: &ContextData<TData>, phase: &str) -> PhaseOutcome<Err> {
    for (handler_idx, handler_fn) in handlers.iter().enumerate() {
      event!(Level::TRACE, phase, handler_index = handler_idx, "Executing handler.");
      match handler_fn(ctx_data.clone()).await {
        Ok(PipelineControl::Continue) => {}
        Ok(PipelineControl::Stop) => return PhaseOutcome::Stopped,
        Err(e) => return PhaseOutcome::Failed(e),
      }
    }
    PhaseOutcome::Continue
  }

  /// Runs the failure handlers. Their errors are logged and swallowed.
  async fn compensate(&self, ctx_data: &ContextData<TData>, err: &Err) {
    if self.on_failure.is_empty() {
      return;
    }
    let reason = err.to_string();
    for (idx, handler_fn) in self.on_failure.iter().enumerate() {
      if let Err(comp_err) = handler_fn(ctx_data.clone(), reason.clone()).await {
        event!(Level::ERROR, handler_index = idx, error = %comp_err, "Failure handler failed.");
      }
    }
  }
}
