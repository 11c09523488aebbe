use ratatui::prelude::Color;

/// Truncate a string to a maximum number of characters, adding "..." if truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

pub fn format_price(price: f64) -> String {
  format!("{:.2}", price)
}

/// Display color for a product's stock level
pub fn stock_color(stock: Option<u32>) -> Color {
  match stock {
    Some(0) => Color::Red,
    Some(1..=5) => Color::Yellow,
    Some(_) => Color::Green,
    None => Color::DarkGray,
  }
}
