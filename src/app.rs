use crate::config::Config;
use crate::event::{Event, EventHandler};
use crate::market::MarketClient;
use crate::session::SessionProvider;
use crate::ui;
use crate::ui::view::{View, ViewAction};
use crate::ui::views::{SignedOutView, StoreView};
use color_eyre::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use crossterm::terminal::{
  disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::prelude::*;
use std::io::stdout;
use std::time::Duration;
use tracing::info;

/// Short enough that reveal steps land close to their latency
const TICK_RATE: Duration = Duration::from_millis(100);

/// Main application state
pub struct App {
  /// The view on screen
  view: Box<dyn View>,

  /// Host or custom title shown in the header
  title: String,

  /// Whether to quit
  should_quit: bool,
}

impl App {
  pub fn new(config: &Config, client: MarketClient) -> Self {
    let view: Box<dyn View> = if client.session().current_user_id().is_some() {
      Box::new(StoreView::new(client, config.reveal.clone()))
    } else {
      Box::new(SignedOutView::new(client, config.reveal.clone(), None))
    };

    Self {
      view,
      title: config.title.clone().unwrap_or_else(|| config.api.url.clone()),
      should_quit: false,
    }
  }

  pub async fn run(&mut self) -> Result<()> {
    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = self.run_loop(&mut terminal).await;

    // Restore the terminal even if the loop failed
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
  }

  async fn run_loop<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
    let mut events = EventHandler::new(TICK_RATE);
    info!("ui started");

    while !self.should_quit {
      terminal.draw(|frame| ui::draw(frame, self))?;

      match events.next().await {
        Some(event) => self.handle_event(event),
        None => break,
      }
    }

    info!("ui stopped");
    Ok(())
  }

  fn handle_event(&mut self, event: Event) {
    let action = match event {
      Event::Key(key) => self.handle_key(key),
      Event::Tick => self.view.tick(),
      Event::Resize => ViewAction::None,
    };
    self.apply(action);
  }

  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
      return ViewAction::Quit;
    }
    self.view.handle_key(key)
  }

  fn apply(&mut self, action: ViewAction) {
    match action {
      ViewAction::None => {}
      ViewAction::Replace(view) => self.view = view,
      ViewAction::Quit => self.should_quit = true,
    }
  }

  // Accessors for UI rendering
  pub fn view(&self) -> &dyn View {
    self.view.as_ref()
  }

  pub fn view_mut(&mut self) -> &mut dyn View {
    self.view.as_mut()
  }

  pub fn title(&self) -> &str {
    &self.title
  }
}
