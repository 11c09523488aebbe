use crossterm::event::{KeyCode, KeyEvent};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap};
use std::sync::{Arc, Mutex};

use crate::cache::{CacheError, FetchPolicy};
use crate::config::RevealConfig;
use crate::market::{
  listed_products, EntityRef, GatewayError, MarketClient, ProductSummary, Storefront,
};
use crate::pending::Pending;
use crate::refresh::{lock, RefreshCoordinator, RefreshError};
use crate::reveal::RevealController;
use crate::session::SessionProvider;
use crate::ui::renderfns::{format_price, stock_color, truncate};
use crate::ui::view::{ShortcutInfo, StatusLine, View, ViewAction};
use crate::ui::views::SignedOutView;

enum Screen {
  Loading,
  Failed(String),
  Ready(Storefront),
}

/// The signed-in owner's store and its product list.
///
/// Products are revealed a page at a time: moving past the last visible row
/// asks for the next page. `r` force-refreshes the store and its listing.
pub struct StoreView {
  client: MarketClient,
  reveal_config: RevealConfig,
  screen: Screen,
  reveal: Arc<Mutex<RevealController<ProductSummary>>>,
  refresher: RefreshCoordinator<ProductSummary>,
  load: Option<Pending<Result<Storefront, CacheError>>>,
  refresh: Option<Pending<Result<Storefront, RefreshError>>>,
  /// Another refresh must run once the in-flight one lands
  refresh_queued: bool,
  delete: Option<Pending<Result<String, GatewayError>>>,
  sign_out: Option<Pending<Option<String>>>,
  list_state: ListState,
  status: Option<StatusLine>,
}

impl StoreView {
  pub fn new(client: MarketClient, reveal_config: RevealConfig) -> Self {
    let reveal = Arc::new(Mutex::new(RevealController::new(
      Vec::new(),
      reveal_config.page_size,
      reveal_config.latency(),
    )));
    let refresher = RefreshCoordinator::new(client.cache().clone(), reveal.clone(), listed_products);

    let mut view = Self {
      client,
      reveal_config,
      screen: Screen::Loading,
      reveal,
      refresher,
      load: None,
      refresh: None,
      refresh_queued: false,
      delete: None,
      sign_out: None,
      list_state: ListState::default(),
      status: None,
    };
    view.start_load(FetchPolicy::CacheFirst);
    view
  }

  fn start_load(&mut self, policy: FetchPolicy) {
    if self.load.is_some() {
      return;
    }
    self.screen = Screen::Loading;
    let client = self.client.clone();
    self.load = Some(Pending::spawn(async move {
      client.load_storefront(policy).await
    }));
  }

  fn start_refresh(&mut self) {
    let Screen::Ready(front) = &self.screen else {
      // Nothing on screen yet, reload everything from the network
      self.start_load(FetchPolicy::ForceRefetch);
      return;
    };
    if self.refresh.is_some() {
      return;
    }
    self.refresh_queued = false;

    let refs = front.refresh_refs();
    let refresher = self.refresher.clone();
    let client = self.client.clone();
    self.refresh = Some(Pending::spawn(async move {
      refresher.refresh(refs).await?;
      // Records were just rewritten, so this is served from the cache
      Ok::<_, RefreshError>(client.load_storefront(FetchPolicy::CacheFirst).await?)
    }));
    self.status = Some(StatusLine::info("Refreshing..."));
  }

  fn delete_selected(&mut self) {
    if self.delete.is_some() {
      return;
    }
    let Screen::Ready(front) = &self.screen else {
      return;
    };
    let Some(store_id) = front.store_id().map(String::from) else {
      return;
    };
    let selected = self
      .list_state
      .selected()
      .and_then(|idx| lock(&self.reveal).visible_slice().get(idx).cloned());
    let Some(product) = selected else {
      return;
    };

    let client = self.client.clone();
    self.status = Some(StatusLine::info(format!("Deleting {}...", product.name)));
    self.delete = Some(Pending::spawn(async move {
      client.delete_product(&store_id, &product.id).await?;
      Ok::<_, GatewayError>(product.name)
    }));
  }

  fn delete_store(&mut self) {
    if self.delete.is_some() {
      return;
    }
    let Screen::Ready(front) = &self.screen else {
      return;
    };
    let Some(store) = front.store.found() else {
      return;
    };

    let owner_id = front.owner_id.clone();
    let store_id = store.id.clone();
    let name = store.name.clone();
    let client = self.client.clone();
    self.status = Some(StatusLine::info(format!("Deleting store {}...", name)));
    self.delete = Some(Pending::spawn(async move {
      client.delete_store(&owner_id, &store_id).await?;
      Ok::<_, GatewayError>(format!("store {}", name))
    }));
  }

  fn start_sign_out(&mut self) {
    if self.sign_out.is_some() {
      return;
    }
    let mut known = Vec::new();
    if let Screen::Ready(front) = &self.screen {
      known = front.refresh_refs();
    }
    if let Some(user_id) = self.client.session().current_user_id() {
      known.push(EntityRef::session_user(user_id));
    }

    let client = self.client.clone();
    self.sign_out = Some(Pending::spawn(async move {
      let user_id = client.session().current_user_id();
      client.sign_out(&known).await;
      user_id
    }));
  }

  /// Show a freshly loaded storefront, restarting the reveal window.
  fn show(&mut self, front: Storefront) {
    lock(&self.reveal).reset(front.products.clone());
    self.list_state.select(if front.products.is_empty() {
      None
    } else {
      Some(0)
    });
    self.screen = Screen::Ready(front);
  }

  fn move_down(&mut self) {
    let mut reveal = lock(&self.reveal);
    let visible = reveal.visible_slice().len();
    match self.list_state.selected() {
      Some(idx) if idx + 1 < visible => self.list_state.select(Some(idx + 1)),
      // At the last visible row, ask for the next page
      Some(_) => {
        reveal.begin_advance();
      }
      None if visible > 0 => self.list_state.select(Some(0)),
      None => {}
    }
  }

  fn move_up(&mut self) {
    if let Some(idx) = self.list_state.selected() {
      self.list_state.select(Some(idx.saturating_sub(1)));
    }
  }

  fn clamp_selection(&mut self) {
    let visible = lock(&self.reveal).visible_slice().len();
    let selected = match self.list_state.selected() {
      _ if visible == 0 => None,
      Some(idx) => Some(idx.min(visible - 1)),
      None => Some(0),
    };
    self.list_state.select(selected);
  }

  fn poll_load(&mut self) {
    match Pending::take_ready(&mut self.load) {
      Some(Ok(Ok(front))) => self.show(front),
      Some(Ok(Err(e))) => self.screen = Screen::Failed(e.to_string()),
      Some(Err(e)) => self.screen = Screen::Failed(e.to_string()),
      None => {}
    }
  }

  fn poll_refresh(&mut self) {
    let outcome = match Pending::take_ready(&mut self.refresh) {
      Some(Ok(outcome)) => outcome,
      Some(Err(_)) => Err(RefreshError::Aborted),
      None => return,
    };

    match outcome {
      Ok(front) => {
        let store_changed = match &self.screen {
          Screen::Ready(current) => current.store_id() != front.store_id(),
          _ => true,
        };
        if store_changed {
          // The refreshed set did not include the new store's listing
          self.show(front);
        } else {
          self.screen = Screen::Ready(front);
          self.clamp_selection();
        }
        self.status = Some(StatusLine::info("Refreshed"));
      }
      // The current list stays on screen
      Err(e) => self.status = Some(StatusLine::error(format!("Refresh failed: {}", e))),
    }

    if self.refresh_queued {
      self.start_refresh();
    }
  }

  fn poll_delete(&mut self) {
    match Pending::take_ready(&mut self.delete) {
      Some(Ok(Ok(name))) => {
        self.status = Some(StatusLine::info(format!("Deleted {}", name)));
        if self.refresh.is_some() {
          // The running refresh may have read the listing before the delete
          self.refresh_queued = true;
        } else {
          self.start_refresh();
        }
      }
      Some(Ok(Err(e))) => self.status = Some(StatusLine::error(format!("Delete failed: {}", e))),
      Some(Err(e)) => self.status = Some(StatusLine::error(format!("Delete failed: {}", e))),
      None => {}
    }
  }

  fn render_store(frame: &mut Frame, area: Rect, front: &Storefront) {
    let block = Block::default()
      .title(" Store ")
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    let owner = front
      .user
      .found()
      .map(|user| format!("{} <{}>", user.name, user.email))
      .unwrap_or_else(|| front.owner_id.clone());

    let origin = match front.cached_at {
      Some(at) => format!(
        "  (cached {})",
        at.with_timezone(&chrono::Local).format("%H:%M")
      ),
      None => String::new(),
    };

    let lines = match front.store.found() {
      Some(store) => vec![
        Line::from(Span::styled(
          store.name.clone(),
          Style::default().fg(Color::Yellow).bold(),
        )),
        Line::from(Span::raw(
          store.description.clone().unwrap_or_default(),
        )),
        Line::from(Span::styled(
          format!("Owner: {}{}", owner, origin),
          Style::default().fg(Color::DarkGray),
        )),
      ],
      None => vec![
        Line::from(Span::styled(
          "You have no store yet.",
          Style::default().fg(Color::DarkGray),
        )),
        Line::from(Span::styled(
          format!("Signed in as {}", owner),
          Style::default().fg(Color::DarkGray),
        )),
      ],
    };

    let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: true });
    frame.render_widget(paragraph, area);
  }

  fn render_products(&mut self, frame: &mut Frame, area: Rect) {
    let reveal = lock(&self.reveal);
    let window = reveal.window();

    let block = Block::default()
      .title(format!(
        " Products ({}/{}) ",
        window.visible_count(),
        window.len()
      ))
      .title_alignment(Alignment::Center)
      .borders(Borders::ALL)
      .border_style(Style::default().fg(Color::Blue));

    if window.is_empty() {
      let paragraph = Paragraph::new("No products listed.")
        .block(block)
        .style(Style::default().fg(Color::DarkGray));
      frame.render_widget(paragraph, area);
      return;
    }

    let mut items: Vec<ListItem> = window
      .visible_slice()
      .iter()
      .map(|product| {
        let stock = product
          .stock
          .map(|n| format!("{} in stock", n))
          .unwrap_or_default();
        ListItem::new(Line::from(vec![
          Span::raw(format!("{:<40}", truncate(&product.name, 40))),
          Span::styled(
            format!("{:>10}", format_price(product.price)),
            Style::default().fg(Color::Cyan),
          ),
          Span::raw("  "),
          Span::styled(stock, Style::default().fg(stock_color(product.stock))),
        ]))
      })
      .collect();

    if window.is_loading() {
      items.push(ListItem::new(Span::styled(
        "  loading more...",
        Style::default().fg(Color::Yellow),
      )));
    } else if !window.is_exhausted() {
      items.push(ListItem::new(Span::styled(
        format!("  {} more below", window.len() - window.visible_count()),
        Style::default().fg(Color::DarkGray),
      )));
    }

    let list = List::new(items)
      .block(block)
      .highlight_style(
        Style::default()
          .bg(Color::DarkGray)
          .add_modifier(Modifier::BOLD),
      )
      .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut self.list_state);
  }
}

impl View for StoreView {
  fn handle_key(&mut self, key: KeyEvent) -> ViewAction {
    match key.code {
      KeyCode::Char('j') | KeyCode::Down => self.move_down(),
      KeyCode::Char('k') | KeyCode::Up => self.move_up(),
      KeyCode::Char('r') => self.start_refresh(),
      KeyCode::Char('d') => self.delete_selected(),
      KeyCode::Char('D') => self.delete_store(),
      KeyCode::Char('L') => self.start_sign_out(),
      KeyCode::Char('q') | KeyCode::Esc => return ViewAction::Quit,
      _ => {}
    }
    ViewAction::None
  }

  fn render(&mut self, frame: &mut Frame, area: Rect) {
    let has_store = match &self.screen {
      Screen::Loading => {
        let paragraph = Paragraph::new("Loading storefront...")
          .block(Block::default().borders(Borders::ALL))
          .style(Style::default().fg(Color::DarkGray));
        frame.render_widget(paragraph, area);
        return;
      }
      Screen::Failed(e) => {
        let paragraph = Paragraph::new(format!("Failed to load: {}\n\nPress 'r' to retry.", e))
          .block(Block::default().borders(Borders::ALL))
          .style(Style::default().fg(Color::Red))
          .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
        return;
      }
      Screen::Ready(front) => !front.store.is_absent(),
    };

    let chunks = Layout::default()
      .direction(Direction::Vertical)
      .constraints([Constraint::Length(5), Constraint::Min(3)])
      .split(area);

    if let Screen::Ready(front) = &self.screen {
      Self::render_store(frame, chunks[0], front);
    }
    if has_store {
      self.render_products(frame, chunks[1]);
    }
  }

  fn breadcrumb_label(&self) -> String {
    let label = match &self.screen {
      Screen::Ready(front) => front
        .store
        .found()
        .map(|store| store.name.clone())
        .unwrap_or_else(|| "No store".to_string()),
      _ => "Store".to_string(),
    };
    if self.refresher.is_refreshing() {
      format!("{} (refreshing)", label)
    } else {
      label
    }
  }

  fn tick(&mut self) -> ViewAction {
    if lock(&self.reveal).poll() {
      self.clamp_selection();
    }
    self.poll_load();
    self.poll_refresh();
    self.poll_delete();

    if self.status.as_ref().is_some_and(StatusLine::is_expired) {
      self.status = None;
    }

    if let Some(outcome) = Pending::take_ready(&mut self.sign_out) {
      let last_user = outcome.ok().flatten();
      return ViewAction::Replace(Box::new(SignedOutView::new(
        self.client.clone(),
        self.reveal_config.clone(),
        last_user,
      )));
    }
    ViewAction::None
  }

  fn status(&self) -> Option<&StatusLine> {
    self.status.as_ref()
  }

  fn shortcuts(&self) -> Vec<ShortcutInfo> {
    vec![
      ShortcutInfo::new("j/k", "nav"),
      ShortcutInfo::new("r", "refresh"),
      ShortcutInfo::new("d", "delete"),
      ShortcutInfo::new("D", "delete store"),
      ShortcutInfo::new("L", "sign out"),
      ShortcutInfo::new("q", "quit"),
    ]
  }
}
