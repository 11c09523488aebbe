//! Session identity as seen by the cache.
//!
//! The cache never owns the session. It is handed a [`SessionProvider`] and
//! asks it for the active user id every time it needs to fingerprint a record.

use std::sync::{Arc, PoisonError, RwLock};

/// Source of the currently signed-in user id.
pub trait SessionProvider: Send + Sync {
  /// The active user id, or `None` when nobody is signed in.
  fn current_user_id(&self) -> Option<String>;
}

/// Shared, cloneable session slot.
///
/// Login and logout happen outside the cache layer; every clone observes the
/// same user id.
#[derive(Debug, Clone, Default)]
pub struct SessionHandle {
  user_id: Arc<RwLock<Option<String>>>,
}

impl SessionHandle {
  pub fn new(user_id: Option<String>) -> Self {
    Self {
      user_id: Arc::new(RwLock::new(user_id.filter(|id| !id.is_empty()))),
    }
  }

  /// Start a session. An empty id leaves nobody signed in.
  pub fn login(&self, user_id: impl Into<String>) {
    let user_id = Some(user_id.into()).filter(|id| !id.is_empty());
    match &user_id {
      Some(user) => tracing::info!(user = %user, "session started"),
      None => tracing::warn!("empty user id, no session started"),
    }
    *self.user_id.write().unwrap_or_else(PoisonError::into_inner) = user_id;
  }

  /// End the session, returning the user id that was signed in.
  pub fn logout(&self) -> Option<String> {
    let previous = self
      .user_id
      .write()
      .unwrap_or_else(PoisonError::into_inner)
      .take();
    if let Some(user) = &previous {
      tracing::info!(user = %user, "session ended");
    }
    previous
  }
}

impl SessionProvider for SessionHandle {
  fn current_user_id(&self) -> Option<String> {
    self
      .user_id
      .read()
      .unwrap_or_else(PoisonError::into_inner)
      .clone()
  }
}
