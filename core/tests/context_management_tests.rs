// tests/context_management_tests.rs
mod common;
use common::*;
use serial_test::serial;
use std::time::Duration;
use storefront_core::{ContextData, Pipeline, PipelineControl, PipelineResult};

#[tokio::test]
#[serial]
async fn test_context_data_modifications_are_shared() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("modify_step", false), ("check_step", false)]);

  pipeline.on_root("modify_step", |ctx: ContextData<TestContext>| async move {
    let mut guard = ctx.lock();
    guard.counter = 100;
    guard.message = "Modified".to_string();
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  pipeline.on_root("check_step", |ctx: ContextData<TestContext>| async move {
    let guard = ctx.lock();
    assert_eq!(guard.counter, 100);
    assert_eq!(guard.message, "Modified");
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  pipeline.run(ctx.clone()).await.unwrap();

  let guard = ctx.lock();
  assert_eq!(guard.counter, 100);
  assert_eq!(guard.message, "Modified");
}

#[tokio::test]
#[serial]
async fn test_context_data_clones_point_to_same_data() {
  setup_tracing();
  let original = ContextData::new(TestContext::default());
  let cloned = original.clone();

  cloned.lock().counter = 42;
  assert_eq!(original.lock().counter, 42);

  original.lock().message = "Hello".to_string();
  assert_eq!(cloned.lock().message, "Hello");
}

#[tokio::test]
#[serial]
async fn test_guard_dropped_before_await_in_handler() {
  setup_tracing();
  let mut pipeline = Pipeline::<TestContext, TestError>::new(&[("async_op_step", false)]);

  pipeline.on_root("async_op_step", |ctx: ContextData<TestContext>| async move {
    let initial = {
      let mut guard = ctx.lock();
      guard.counter += 1;
      guard.counter
    };

    tokio::time::sleep(Duration::from_millis(5)).await;

    let mut guard = ctx.lock();
    guard.counter += initial;
    guard.message = "Async op done".to_string();
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(TestContext::default());
  assert_eq!(pipeline.run(ctx.clone()).await.unwrap(), PipelineResult::Completed);

  let guard = ctx.lock();
  assert_eq!(guard.counter, 2);
  assert_eq!(guard.message, "Async op done");
}

#[tokio::test]
#[serial]
async fn test_context_can_own_non_sync_state() {
  setup_tracing();
  // Cell is Send but not Sync; the context only needs Send.
  struct Owned {
    hits: std::cell::Cell<u32>,
  }

  let mut pipeline = Pipeline::<Owned, TestError>::new(&[("touch", false)]);
  pipeline.on_root("touch", |ctx: ContextData<Owned>| async move {
    let guard = ctx.lock();
    guard.hits.set(guard.hits.get() + 1);
    Ok::<_, TestError>(PipelineControl::Continue)
  });

  let ctx = ContextData::new(Owned {
    hits: std::cell::Cell::new(0),
  });
  pipeline.run(ctx.clone()).await.unwrap();
  assert_eq!(ctx.lock().hits.get(), 1);
}

#[test]
fn test_into_inner_requires_sole_handle() {
  let ctx = ContextData::new(TestContext::default());
  let other = ctx.clone();
  other.lock().counter = 7;

  drop(other);
  let inner = ctx.into_inner().expect("no other handles remain");
  assert_eq!(inner.counter, 7);

  let shared = ContextData::new(TestContext::default());
  let _still_held = shared.clone();
  assert!(shared.into_inner().is_none());
}

#[test]
fn test_map_lock_narrows_guard() {
  let ctx = ContextData::new(TestContext::default());
  ctx.map_lock(|c| &mut c.steps_executed).push("mapped".to_string());
  assert_eq!(ctx.lock().steps_executed, vec!["mapped"]);

  let _held = ctx.lock();
  assert!(ctx.try_lock().is_none());
}
