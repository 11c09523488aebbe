use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

use crate::ui::view::StatusLine;

/// Draw the footer bar with the current status message
pub fn draw_footer(frame: &mut Frame, area: Rect, status: Option<&StatusLine>) {
  let line = match status {
    Some(status) => {
      let color = if status.is_error {
        Color::Red
      } else {
        Color::Green
      };
      Line::from(vec![
        Span::raw(" "),
        Span::styled(status.text.clone(), Style::default().fg(color)),
      ])
    }
    None => Line::default(),
  };

  let paragraph = Paragraph::new(line).style(Style::default().bg(Color::Black));
  frame.render_widget(paragraph, area);
}
