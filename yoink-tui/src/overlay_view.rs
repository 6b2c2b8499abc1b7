use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};
use yoink_core::ResultView;
use yoink_core::report::stats_line;
use yoink_scanner::{MediaKind, MediaReference};

/// A rectangle of the given percentage size centred in `area`
pub fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(area);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}

fn kind_color(kind: MediaKind) -> Color {
    match kind {
        MediaKind::Image => Color::Green,
        MediaKind::Video => Color::Cyan,
        MediaKind::Audio => Color::Yellow,
        MediaKind::Embed => Color::DarkGray,
    }
}

fn item_text(number: usize, item: &MediaReference) -> String {
    match item.kind {
        MediaKind::Image => format!(
            "{:>3} {} {} {}",
            number,
            item.kind.icon(),
            item.dimensions_label(),
            item.source_url
        ),
        _ => format!("{:>3} {} {}", number, item.kind.icon(), item.source_url),
    }
}

/// First visible row so that `selected` stays on screen
pub fn scroll_offset_for(selected: usize, height: usize, total: usize) -> usize {
    if height == 0 || total <= height {
        return 0;
    }
    selected
        .saturating_sub(height - 1)
        .min(total.saturating_sub(height))
}

/// Draw the media overlay popup on top of whatever is already rendered
pub fn render_overlay(f: &mut Frame, view: &ResultView, selected: usize) {
    let area = centered_rect(80, 70, f.area());
    f.render_widget(Clear, area);

    let title = format!(" Media on {} ", view.page_url);
    let block = Block::default()
        .borders(Borders::ALL)
        .title(title)
        .border_style(Style::default().fg(Color::Magenta));

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1), // Stats header
            Constraint::Length(1), // Rule
            Constraint::Min(1),    // Items
            Constraint::Length(1), // Hints
        ])
        .split(inner);

    let stats = Paragraph::new(stats_line(&view.collection.counts()))
        .style(Style::default().fg(Color::White).add_modifier(Modifier::BOLD));
    f.render_widget(stats, chunks[0]);

    let rule = Paragraph::new("─".repeat(chunks[1].width as usize))
        .style(Style::default().fg(Color::DarkGray));
    f.render_widget(rule, chunks[1]);

    render_items(f, chunks[2], view, selected);
    render_hints(f, chunks[3]);
}

fn render_items(f: &mut Frame, area: Rect, view: &ResultView, selected: usize) {
    let total = view.collection.len();
    if total == 0 {
        let empty = Paragraph::new("No media found on this page")
            .style(Style::default().fg(Color::DarkGray))
            .wrap(Wrap { trim: true });
        f.render_widget(empty, area);
        return;
    }

    let height = area.height as usize;
    let offset = scroll_offset_for(selected, height, total);

    let items: Vec<ListItem> = view
        .collection
        .iter()
        .enumerate()
        .skip(offset)
        .take(height)
        .map(|(idx, item)| {
            let mut style = Style::default().fg(kind_color(item.kind));
            if idx == selected {
                style = style.bg(Color::DarkGray).add_modifier(Modifier::BOLD);
            }
            ListItem::new(item_text(idx + 1, item)).style(style)
        })
        .collect();

    f.render_widget(List::new(items), area);
}

fn render_hints(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Black).bg(Color::Gray);
    let hints = Line::from(vec![
        Span::styled(" ↑/↓ ", key),
        Span::raw(" Select  "),
        Span::styled(" Enter/d ", key),
        Span::raw(" Download  "),
        Span::styled(" Tab ", key),
        Span::raw(" Prompt  "),
        Span::styled(" Esc ", key),
        Span::raw(" Close"),
    ]);

    f.render_widget(Paragraph::new(hints), area);
}
