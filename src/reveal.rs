//! Windowed, incremental reveal of an in-memory list.
//!
//! Screens never render a whole dataset at once. They render the visible
//! prefix of a [`RevealWindow`] and ask for more when the user scrolls past
//! its end. Each step is held back by a short synthetic latency so that
//! paging through a small array does not re-render instantly.
//!
//! ```ignore
//! let mut reveal = RevealController::new(products, 3, Duration::from_millis(400));
//!
//! // Scroll hit the end of the visible rows
//! reveal.begin_advance();
//!
//! // In event loop tick
//! if reveal.poll() {
//!     // More rows are visible, re-render
//! }
//! ```

use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;

pub const DEFAULT_PAGE_SIZE: usize = 3;
pub const DEFAULT_REVEAL_LATENCY: Duration = Duration::from_millis(400);

/// How much of a dataset is currently exposed to rendering.
///
/// `visible_count` never exceeds the source length and only grows until the
/// next reset. The source is shared and never modified.
#[derive(Debug)]
pub struct RevealWindow<T> {
  source: Arc<[T]>,
  visible_count: usize,
  page_size: usize,
  loading: bool,
}

impl<T> Clone for RevealWindow<T> {
  fn clone(&self) -> Self {
    Self {
      source: Arc::clone(&self.source),
      visible_count: self.visible_count,
      page_size: self.page_size,
      loading: self.loading,
    }
  }
}

impl<T> RevealWindow<T> {
  /// Open a window over `source` showing the first page.
  pub fn init(source: impl Into<Arc<[T]>>, page_size: usize) -> Self {
    let source = source.into();
    let page_size = page_size.max(1);
    Self {
      visible_count: page_size.min(source.len()),
      source,
      page_size,
      loading: false,
    }
  }

  /// Swap in a new dataset and go back to the first page.
  pub fn reset(&mut self, source: impl Into<Arc<[T]>>) {
    self.source = source.into();
    self.visible_count = self.page_size.min(self.source.len());
    self.loading = false;
  }

  /// Start a reveal step. Returns false, changing nothing, when everything is
  /// already visible or a step is already pending.
  pub fn begin_advance(&mut self) -> bool {
    if self.loading || self.is_exhausted() {
      return false;
    }
    self.loading = true;
    true
  }

  /// Commit a pending reveal step.
  pub fn complete_advance(&mut self) {
    if !self.loading {
      return;
    }
    self.visible_count = (self.visible_count + self.page_size).min(self.source.len());
    self.loading = false;
  }

  /// The rows to render.
  pub fn visible_slice(&self) -> &[T] {
    &self.source[..self.visible_count]
  }

  pub fn visible_count(&self) -> usize {
    self.visible_count
  }

  pub fn len(&self) -> usize {
    self.source.len()
  }

  pub fn is_empty(&self) -> bool {
    self.source.is_empty()
  }

  pub fn is_loading(&self) -> bool {
    self.loading
  }

  pub fn is_exhausted(&self) -> bool {
    self.visible_count >= self.source.len()
  }
}

/// Drives a [`RevealWindow`] with the reveal latency applied.
#[derive(Debug)]
pub struct RevealController<T> {
  window: RevealWindow<T>,
  latency: Duration,
  due_at: Option<Instant>,
}

impl<T> RevealController<T> {
  pub fn new(source: impl Into<Arc<[T]>>, page_size: usize, latency: Duration) -> Self {
    Self {
      window: RevealWindow::init(source, page_size),
      latency,
      due_at: None,
    }
  }

  pub fn window(&self) -> &RevealWindow<T> {
    &self.window
  }

  pub fn visible_slice(&self) -> &[T] {
    self.window.visible_slice()
  }

  /// Request the next page. The check and the `loading` flag are set before
  /// anything waits, so a second request while one is pending is a no-op.
  pub fn begin_advance(&mut self) -> bool {
    if !self.window.begin_advance() {
      return false;
    }
    self.due_at = Some(Instant::now() + self.latency);
    true
  }

  /// Commit a pending step once its latency has elapsed.
  ///
  /// Returns `true` if the window changed. Call this in your event loop tick.
  pub fn poll(&mut self) -> bool {
    match self.due_at {
      Some(due) if Instant::now() >= due => {
        self.due_at = None;
        self.window.complete_advance();
        true
      }
      _ => false,
    }
  }

  /// Request the next page and wait for it to be revealed.
  ///
  /// Returns `false` without waiting if the request was a no-op.
  pub async fn advance(&mut self) -> bool {
    if !self.begin_advance() {
      return false;
    }
    tokio::time::sleep(self.latency).await;
    self.due_at = None;
    self.window.complete_advance();
    true
  }

  /// Replace the dataset and start again from the first page. Drops any
  /// pending step.
  pub fn reset(&mut self, source: impl Into<Arc<[T]>>) {
    self.window.reset(source);
    self.due_at = None;
  }
}


#[cfg(test)]
mod prop_tests {
  use super::*;
  use proptest::prelude::*;

  #[derive(Debug, Clone)]
  enum Op {
    Begin,
    Complete,
    Reset(usize),
  }

  fn op_strategy() -> impl Strategy<Value = Op> {
    prop_oneof![
      4 => Just(Op::Begin),
      4 => Just(Op::Complete),
      1 => (0usize..40).prop_map(Op::Reset),
    ]
  }

  fn items(n: usize) -> Vec<usize> {
    (0..n).collect()
  }

  proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    /// Between resets, the window only grows, one page per committed step,
    /// and never past the end of the source.
    #[test]
    fn prop_visible_count_never_shrinks(
      len in 0usize..40,
      page_size in 0usize..8,
      ops in prop::collection::vec(op_strategy(), 0..60),
    ) {
      let mut window = RevealWindow::init(items(len), page_size);
      let page = page_size.max(1);
      prop_assert_eq!(window.visible_count(), page.min(len));

      for op in ops {
        let before = window.visible_count();
        let was_loading = window.is_loading();
        match op {
          Op::Begin => {
            let was_exhausted = window.is_exhausted();
            let started = window.begin_advance();
            prop_assert_eq!(started, !was_loading && !was_exhausted);
            prop_assert_eq!(window.visible_count(), before);
          }
          Op::Complete => {
            window.complete_advance();
            let expected = if was_loading {
              (before + page).min(window.len())
            } else {
              before
            };
            prop_assert_eq!(window.visible_count(), expected);
            prop_assert!(!window.is_loading());
          }
          Op::Reset(n) => {
            window.reset(items(n));
            prop_assert_eq!(window.visible_count(), page.min(n));
            prop_assert!(!window.is_loading());
          }
        }
        prop_assert!(window.visible_count() <= window.len());
        prop_assert_eq!(window.visible_slice().len(), window.visible_count());
      }
    }

    /// Once everything is visible, further advances change nothing.
    #[test]
    fn prop_exhausted_advance_is_noop(
      len in 0usize..40,
      page_size in 1usize..8,
      extra in 1usize..10,
    ) {
      let mut window = RevealWindow::init(items(len), page_size);
      let mut steps = 0;
      while window.begin_advance() {
        window.complete_advance();
        steps += 1;
      }
      prop_assert_eq!(steps, len.saturating_sub(page_size).div_ceil(page_size));
      prop_assert!(window.is_exhausted());
      prop_assert_eq!(window.visible_count(), len);

      for _ in 0..extra {
        prop_assert!(!window.begin_advance());
        prop_assert!(!window.is_loading());
        window.complete_advance();
        prop_assert_eq!(window.visible_count(), len);
      }
    }
  }
}
