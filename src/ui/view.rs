use crossterm::event::KeyEvent;
use ratatui::prelude::*;
use std::time::{Duration, Instant};

/// A keyboard shortcut hint for display in the header
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutInfo {
  pub key: &'static str,
  pub label: &'static str,
}

impl ShortcutInfo {
  pub const fn new(key: &'static str, label: &'static str) -> Self {
    Self { key, label }
  }
}

/// How long a status message stays in the footer
const STATUS_TTL: Duration = Duration::from_secs(4);

/// Transient one-line message shown in the footer
#[derive(Debug, Clone)]
pub struct StatusLine {
  pub text: String,
  pub is_error: bool,
  shown_at: Instant,
}

impl StatusLine {
  pub fn info(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      is_error: false,
      shown_at: Instant::now(),
    }
  }

  pub fn error(text: impl Into<String>) -> Self {
    Self {
      text: text.into(),
      is_error: true,
      shown_at: Instant::now(),
    }
  }

  pub fn is_expired(&self) -> bool {
    self.shown_at.elapsed() > STATUS_TTL
  }
}

/// Actions that a view can request from the App
pub enum ViewAction {
  /// No action needed
  None,
  /// Swap the current view for another one
  Replace(Box<dyn View>),
  /// Leave the application
  Quit,
}

/// Trait for view behavior
///
/// Views own their background work and poll it in `tick()`. Anything that
/// changes which view is on screen goes back to the App as a [`ViewAction`].
pub trait View {
  /// Handle a key event, returning an action for App to execute
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction;

  /// Render the view to the frame
  fn render(&mut self, frame: &mut Frame, area: Rect);

  /// Label shown in the header next to the API host
  fn breadcrumb_label(&self) -> String;

  /// Called on each tick to poll background work
  fn tick(&mut self) -> ViewAction {
    ViewAction::None
  }

  /// Message for the footer, if any
  fn status(&self) -> Option<&StatusLine> {
    None
  }

  /// Keyboard shortcuts to display in the header
  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![ShortcutInfo::new("q", "quit")]
  }
}
