//! Single-flight pull-to-refresh.
//!
//! A refresh force-refetches a set of entities and, if every fetch succeeds,
//! restarts the screen's reveal window on the fresh list. At most one refresh
//! runs at a time: calls made while one is in flight join it and get its
//! outcome instead of starting their own.

use futures::future::{join_all, BoxFuture, Shared};
use futures::FutureExt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tracing::{debug, error, info, warn};

use crate::cache::{CacheError, EntityCache};
use crate::market::{Entity, EntityRef};
use crate::reveal::{RevealController, RevealWindow};

/// Why a refresh produced no new window.
#[derive(Debug, Clone, Error)]
pub enum RefreshError {
  #[error(transparent)]
  Cache(#[from] CacheError),
  /// The background refresh task panicked.
  #[error("refresh ended without a result")]
  Aborted,
}

type Outcome<T> = Result<RevealWindow<T>, RefreshError>;
type InFlight<T> = Shared<BoxFuture<'static, Outcome<T>>>;
type Selector<T> = Box<dyn Fn(&[Entity]) -> Vec<T> + Send + Sync>;

/// Coordinates refreshes for one screen.
///
/// Cloning is cheap and every clone shares the same in-flight guard and
/// reveal controller.
pub struct RefreshCoordinator<T> {
  inner: Arc<Inner<T>>,
}

struct Inner<T> {
  cache: EntityCache,
  reveal: Arc<Mutex<RevealController<T>>>,
  /// Picks the list to display out of the fetched entities
  select: Selector<T>,
  in_flight: Mutex<Option<InFlight<T>>>,
}

impl<T> Clone for RefreshCoordinator<T> {
  fn clone(&self) -> Self {
    Self {
      inner: Arc::clone(&self.inner),
    }
  }
}

pub(crate) fn lock<M>(mutex: &Mutex<M>) -> MutexGuard<'_, M> {
  mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl<T: Clone + Send + Sync + 'static> RefreshCoordinator<T> {
  /// Create a coordinator that resets `reveal` with whatever `select` picks
  /// from a successful refresh.
  pub fn new<F>(cache: EntityCache, reveal: Arc<Mutex<RevealController<T>>>, select: F) -> Self
  where
    F: Fn(&[Entity]) -> Vec<T> + Send + Sync + 'static,
  {
    Self {
      inner: Arc::new(Inner {
        cache,
        reveal,
        select: Box::new(select),
        in_flight: Mutex::new(None),
      }),
    }
  }

  /// The reveal controller this coordinator resets.
  pub fn reveal(&self) -> &Arc<Mutex<RevealController<T>>> {
    &self.inner.reveal
  }

  pub fn is_refreshing(&self) -> bool {
    lock(&self.inner.in_flight).is_some()
  }

  /// Force-refetch `refs` and restart the reveal window on the fresh list.
  ///
  /// If a refresh is already running this joins it and `refs` is ignored.
  /// On failure the reveal window is left exactly as it was. The work runs
  /// on its own task, so it completes even if every caller goes away.
  pub async fn refresh(&self, refs: Vec<EntityRef>) -> Outcome<T> {
    let pending = {
      let mut slot = lock(&self.inner.in_flight);
      match slot.as_ref() {
        Some(pending) => {
          debug!("refresh already in flight, joining it");
          pending.clone()
        }
        None => {
          let inner = Arc::clone(&self.inner);
          // The slot lock is held while spawning, so the task cannot clear
          // the slot before it has been filled.
          let task = tokio::spawn(async move {
            let _clear = ClearInFlight(Arc::clone(&inner));
            inner.run(refs).await
          });
          let pending = task
            .map(|joined| {
              joined.unwrap_or_else(|e| {
                error!(error = %e, "refresh task failed");
                Err(RefreshError::Aborted)
              })
            })
            .boxed()
            .shared();
          *slot = Some(pending.clone());
          pending
        }
      }
    };

    pending.await
  }
}

impl<T: Clone + Send + Sync + 'static> Inner<T> {
  async fn run(&self, refs: Vec<EntityRef>) -> Outcome<T> {
    info!(entities = refs.len(), "refresh started");

    // Let every fetch finish so each successful one still primes the cache
    let fetched = join_all(
      refs
        .iter()
        .map(|entity| self.cache.get_kind(entity.kind, &entity.key, true)),
    )
    .await;

    let entities = match fetched.into_iter().collect::<Result<Vec<_>, _>>() {
      Ok(entities) => entities,
      Err(e) => {
        warn!(error = %e, "refresh failed, keeping current window");
        return Err(e.into());
      }
    };

    let items = (self.select)(&entities);
    let mut reveal = lock(&self.reveal);
    reveal.reset(items);
    info!(items = reveal.window().len(), "refresh finished");
    Ok(reveal.window().clone())
  }
}

/// Clears the in-flight slot when the refresh task ends, including by panic.
struct ClearInFlight<T>(Arc<Inner<T>>);

impl<T> Drop for ClearInFlight<T> {
  fn drop(&mut self) {
    lock(&self.0.in_flight).take();
  }
}
