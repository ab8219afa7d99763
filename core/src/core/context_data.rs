// storefront/core/src/core/context_data.rs
use parking_lot::{MappedMutexGuard, Mutex, MutexGuard};
use std::sync::Arc;

/// Shared, lockable handle to a pipeline's context.
///
/// Every handler receives a clone of the same handle. The context only has to
/// be `Send`, so it can own resources such as an open database transaction
/// that are not `Sync`.
///
/// IMPORTANT: guards are blocking and MUST be dropped before any `.await`.
/// The compiler enforces this for handlers, since a guard held across an
/// await point makes the handler future `!Send`.
#[derive(Debug)]
pub struct ContextData<T: Send + 'static>(Arc<Mutex<T>>);

impl<T: Send + 'static> ContextData<T> {
  pub fn new(data: T) -> Self {
    ContextData(Arc::new(Mutex::new(data)))
  }

  /// Locks the context. The guard must not outlive the current synchronous section.
  pub fn lock(&self) -> MutexGuard<'_, T> {
    self.0.lock()
  }

  pub fn try_lock(&self) -> Option<MutexGuard<'_, T>> {
    self.0.try_lock()
  }

  /// Locks the context and narrows the guard to one part of it.
  pub fn map_lock<F, U: ?Sized>(&self, f: F) -> MappedMutexGuard<'_, U>
  where
    F: FnOnce(&mut T) -> &mut U,
  {
    MutexGuard::map(self.lock(), f)
  }

  /// Recovers the context once every other clone of the handle has been dropped.
  pub fn into_inner(self) -> Option<T> {
    Arc::try_unwrap(self.0).ok().map(Mutex::into_inner)
  }
}

impl<T: Send + 'static> Clone for ContextData<T> {
  fn clone(&self) -> Self {
    ContextData(Arc::clone(&self.0))
  }
}

impl<T: Send + 'static + Default> Default for ContextData<T> {
  fn default() -> Self {
    Self::new(T::default())
  }
}
