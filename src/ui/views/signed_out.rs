use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use crate::config::RevealConfig;
use crate::market::MarketClient;
use crate::ui::view::{ShortcutInfo, View, ViewAction};
use crate::ui::views::StoreView;

/// Shown when nobody is signed in. `l` signs back in as the last user.
pub struct SignedOutView {
  client: MarketClient,
  reveal_config: RevealConfig,
  last_user: Option<String>,
}

impl SignedOutView {
  pub fn new(client: MarketClient, reveal_config: RevealConfig, last_user: Option<String>) -> Self {
    Self {
      client,
      reveal_config,
      last_user,
    }
  }
}

impl View for SignedOutView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('l') => match &self.last_user {
        Some(user_id) => {
          self.client.session().login(user_id.clone());
          ViewAction::Replace(Box::new(StoreView::new(
            self.client.clone(),
            self.reveal_config.clone(),
          )))
        }
        None => ViewAction::None,
      },
      KeyCode::Char('q') | KeyCode::Esc => ViewAction::Quit,
      _ => ViewAction::None,
    }
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let text = match &self.last_user {
      Some(user_id) => format!("Signed out.\n\nPress 'l' to sign in again as {}.", user_id),
      None => "Not signed in.\n\nSet session.user_id in the config file or pass --user.".to_string(),
    };
    let paragraph = Paragraph::new(text)
      .block(Block::default().borders(Borders::ALL))
      .style(Style::default().fg(Color::DarkGray))
      .wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn breadcrumb_label(&self) -> String {
    "Signed out".to_string()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    let mut shortcuts = Vec::new();
    if self.last_user.is_some() {
      shortcuts.push(ShortcutInfo::new("l", "sign in"));
    }
    shortcuts.push(ShortcutInfo::new("q", "quit"));
    shortcuts
  }
}
