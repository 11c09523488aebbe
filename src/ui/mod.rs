mod renderfns;
pub mod view;
pub mod views;

use crate::app::App;
use ratatui::prelude::*;

/// Main draw function
pub fn draw(frame: &mut Frame, app: &mut App) {
  let chunks = Layout::default()
    .direction(Direction::Vertical)
    .constraints([
      Constraint::Length(1), // Header
      Constraint::Min(1),    // Main content
      Constraint::Length(1), // Status line
    ])
    .split(frame.area());

  let shortcuts = app.view().shortcuts();
  let context = app.view().breadcrumb_label();
  renderfns::draw_header(frame, chunks[0], app.title(), &context, &shortcuts);

  app.view_mut().render(frame, chunks[1]);

  renderfns::draw_footer(frame, chunks[2], app.view().status());
}
