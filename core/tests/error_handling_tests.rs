// tests/error_handling_tests.rs
mod common;
use common::*;
use serial_test::serial;
use storefront_core::{ContextData, Pipeline, PipelineControl, PipelineError, PipelineResult};

#[tokio::test]
#[serial]
async fn test_failure_handlers_run_after_handler_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("ok", false), ("boom", false), ("never", false)]);
  pipeline.on_root("ok", create_simple_handler("ok", "ok"));
  pipeline.on_root("boom", create_failing_handler("boom", "exploded"));
  pipeline.on_root("never", create_simple_handler("never", "never"));

  pipeline.on_failure(|ctx: ContextData<TestContext>, reason: String| async move {
    ctx.lock().compensations.push(format!("first: {}", reason));
    Ok::<(), anyhow::Error>(())
  });
  pipeline.on_failure(|ctx: ContextData<TestContext>, _reason: String| async move {
    ctx.lock().compensations.push("second".to_string());
    Ok::<(), anyhow::Error>(())
  });

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("exploded".to_string()));
  let guard = ctx.lock();
  assert_eq!(guard.steps_executed, vec!["ok", "boom"]);
  assert_eq!(
    guard.compensations,
    vec!["first: Test handler failed: exploded".to_string(), "second".to_string()]
  );
}

#[tokio::test]
#[serial]
async fn test_failing_failure_handler_does_not_mask_original_error() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("boom", false)]);
  pipeline.on_root("boom", create_failing_handler("boom", "original"));
  pipeline.on_failure(|_ctx: ContextData<TestContext>, _reason: String| async move {
    Err(anyhow::anyhow!("compensation also failed"))
  });
  pipeline.on_failure(|ctx: ContextData<TestContext>, _reason: String| async move {
    ctx.lock().compensations.push("still ran".to_string());
    Ok::<(), anyhow::Error>(())
  });

  let ctx = ContextData::new(TestContext::default());
  let result = pipeline.run(ctx.clone()).await;

  assert_eq!(result.unwrap_err(), TestError::Handler("original".to_string()));
  assert_eq!(ctx.lock().compensations, vec!["still ran".to_string()]);
}

#[tokio::test]
#[serial]
async fn test_failure_handlers_skipped_when_pipeline_stops() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("halt", false)]);
  pipeline.on_root("halt", |_ctx: ContextData<TestContext>| async move {
    Ok::<_, TestError>(PipelineControl::Stop)
  });
  pipeline.on_failure(|ctx: ContextData<TestContext>, _reason: String| async move {
    ctx.lock().compensations.push("should not run".to_string());
    Ok::<(), anyhow::Error>(())
  });

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Stopped);
  assert!(ctx.lock().compensations.is_empty());
}

#[tokio::test]
#[serial]
async fn test_failure_handlers_run_for_missing_handler() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("unhandled", false)]);
  pipeline.on_failure(|ctx: ContextData<TestContext>, reason: String| async move {
    ctx.lock().compensations.push(reason);
    Ok::<(), anyhow::Error>(())
  });

  let ctx = ContextData::new(TestContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_err());
  let guard = ctx.lock();
  assert_eq!(guard.compensations.len(), 1);
  assert!(guard.compensations[0].contains("unhandled"));
}

#[tokio::test]
#[serial]
async fn test_pipeline_with_pipeline_error_type() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, PipelineError>::new(&[("task", false)]);
  pipeline.on_root("task", |ctx: ContextData<TestContext>| async move {
    ctx.lock().counter = 1;
    Ok::<PipelineControl, PipelineError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  assert!(pipeline.run(ctx.clone()).await.is_ok());
  assert_eq!(ctx.lock().counter, 1);

  let mut failing = Pipeline::<TestContext, PipelineError>::new(&[("fail_task", false)]);
  failing.on_root("fail_task", |_ctx: ContextData<TestContext>| async move {
    Err::<PipelineControl, _>(anyhow::anyhow!("intentional"))
  });
  match failing.run(ContextData::new(TestContext::default())).await {
    Err(PipelineError::Handler { source }) => assert_eq!(source.to_string(), "intentional"),
    other => panic!("Expected PipelineError::Handler, got {:?}", other),
  }
}

#[derive(Clone, Default)]
struct CapturedLogs(std::sync::Arc<std::sync::Mutex<Vec<u8>>>);

impl std::io::Write for CapturedLogs {
  fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
    self.0.lock().unwrap().extend_from_slice(buf);
    Ok(buf.len())
  }

  fn flush(&mut self) -> std::io::Result<()> {
    Ok(())
  }
}

#[tokio::test]
#[serial]
async fn test_handler_error_is_not_logged_above_debug_by_engine() {
  let logs = CapturedLogs::default();
  let writer = logs.clone();
  let subscriber = tracing_subscriber::fmt()
    .with_max_level(tracing::Level::TRACE)
    .with_ansi(false)
    .with_writer(move || writer.clone())
    .finish();
  let _guard = tracing::subscriber::set_default(subscriber);

  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("boom", false)]);
  pipeline.on_root("boom", |_ctx: ContextData<TestContext>| {
    Box::pin(async move { Err::<PipelineControl, _>(TestError::Handler("out of stock".to_string())) })
  });
  pipeline.on_failure(|_ctx: ContextData<TestContext>, _reason: String| async move { Ok::<(), anyhow::Error>(()) });

  let result = pipeline.run(ContextData::new(TestContext::default())).await;
  assert_eq!(result.unwrap_err(), TestError::Handler("out of stock".to_string()));

  let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
  assert!(output.contains("Step handler failed."));
  let loud: Vec<&str> = output
    .lines()
    .filter(|line| line.contains("storefront_core") && (line.contains("ERROR") || line.contains("WARN")))
    .collect();
  assert!(loud.is_empty(), "engine logged the handler error loudly: {:?}", loud);
}
