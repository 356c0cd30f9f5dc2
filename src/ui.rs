//! Terminal UI rendering.
//!
//! All drawing logic lives here, separated from application state ([`App`])
//! and input handling ([`crate::input`]).
//!
//! Layout, top to bottom: theme tabs, topic tabs, sort control, the post
//! list, pagination controls and a one-line status bar.  Post bodies are
//! wrapped by [`wrap_text`] before drawing so that the read-more
//! measurement pass ([`App::settle_layout`]) counts exactly the rows that
//! are drawn.

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph, Tabs},
    Frame,
};
use textwrap::{wrap, Options as WrapOptions, WrapAlgorithm};

use crate::app::App;
use crate::feed::FeedPhase;
use crate::paginate::{NEXT_LABEL, PREVIOUS_LABEL};
use crate::render::{CardField, PostCard};
use crate::read_more::BodyState;

/// Columns post bodies are indented by inside the list.
const BODY_INDENT: u16 = 2;

/// Draw the complete UI for one frame.
pub fn draw(app: &mut App, frame: &mut Frame) {
    let [themes_area, topics_area, sort_area, list_area, pager_area, status_area] =
        Layout::vertical([
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Min(3),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .areas(frame.area());

    draw_theme_tabs(app, frame, themes_area);
    draw_topic_tabs(app, frame, topics_area);
    draw_sort_control(app, frame, sort_area);
    draw_post_list(app, frame, list_area);
    draw_pagination(app, frame, pager_area);
    draw_status_bar(app, frame, status_area);
}

fn tab_style() -> (Style, Style) {
    (
        Style::default().fg(Color::Gray),
        Style::default()
            .fg(Color::Black)
            .bg(Color::Cyan)
            .add_modifier(Modifier::BOLD),
    )
}

fn draw_theme_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let config = app.feed.config();
    let titles: Vec<Line> = config.themes.iter().map(|t| Line::from(t.label.as_str())).collect();
    let selected = config
        .themes
        .iter()
        .position(|t| t.key == app.feed.active_theme())
        .unwrap_or(0);
    let (normal, active) = tab_style();
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(normal)
        .highlight_style(active)
        .divider(" ");
    let [label_area, tabs_area] =
        Layout::horizontal([Constraint::Length(8), Constraint::Min(1)]).areas(area);
    frame.render_widget(Paragraph::new(" Tema:"), label_area);
    frame.render_widget(tabs, tabs_area);
}

fn draw_topic_tabs(app: &App, frame: &mut Frame, area: Rect) {
    let config = app.feed.config();
    let titles: Vec<Line> = config.topics.iter().map(|t| Line::from(t.label.as_str())).collect();
    let selected = config
        .topics
        .iter()
        .position(|t| t.key == app.feed.active_topic())
        .unwrap_or(0);
    let (normal, active) = tab_style();
    let tabs = Tabs::new(titles)
        .select(selected)
        .style(normal)
        .highlight_style(active)
        .divider(" ");
    let [label_area, tabs_area] =
        Layout::horizontal([Constraint::Length(8), Constraint::Min(1)]).areas(area);
    frame.render_widget(Paragraph::new(" Topic:"), label_area);
    frame.render_widget(tabs, tabs_area);
}

fn draw_sort_control(app: &App, frame: &mut Frame, area: Rect) {
    let sort = app.feed.sort();
    let value_style = if app.feed.sort_enabled() {
        Style::default().fg(Color::Yellow)
    } else {
        Style::default().fg(Color::DarkGray).add_modifier(Modifier::CROSSED_OUT)
    };
    let line = Line::from(vec![
        Span::raw(" Ordenar: "),
        Span::styled(sort.label(), value_style),
        Span::styled(format!("  ({sort})"), Style::default().fg(Color::DarkGray)),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

/// Render the scrollable list of post cards, or the feed message when
/// there are none.
fn draw_post_list(app: &mut App, frame: &mut Frame, area: Rect) {
    let block = Block::default().title(list_title(app)).borders(Borders::ALL);
    let inner = block.inner(area);
    app.body_width = inner.width.saturating_sub(BODY_INDENT);

    if app.feed.cards().is_empty() {
        let text = app.feed.message().unwrap_or_default().to_string();
        let style = match app.feed.phase() {
            FeedPhase::Error => Style::default().fg(Color::Red),
            FeedPhase::Empty => Style::default().fg(Color::Yellow),
            _ => Style::default().fg(Color::Gray),
        };
        let paragraph = Paragraph::new(Line::styled(text, style))
            .centered()
            .block(block);
        frame.render_widget(paragraph, area);
        return;
    }

    let collapsed = app.feed.config().collapsed_rows;
    let width = usize::from(app.body_width);
    let mut lines: Vec<Line> = Vec::new();
    let mut selected_span = (0u16, 0u16);

    for (i, (card, body)) in app.feed.cards().iter().zip(app.feed.bodies()).enumerate() {
        let start = lines.len();
        lines.extend(card_lines(card, body, i == app.selected, width, collapsed));
        if i == app.selected {
            selected_span = (to_row(start), to_row(lines.len()));
        }
    }

    app.scroll = follow_selection(app.scroll, selected_span, inner.height);
    let paragraph = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.scroll, 0));
    frame.render_widget(paragraph, area);
}

/// `" Posts 21-40 de 45 "` for a loaded feed, `" Posts "` otherwise.
fn list_title(app: &App) -> String {
    let total = app.feed.posts().len();
    if app.feed.phase() != FeedPhase::Loaded || total == 0 {
        return " Posts ".to_string();
    }
    let page_size = app.feed.config().page_size;
    let first = (app.feed.current_page() - 1) * page_size + 1;
    let last = (first + page_size - 1).min(total);
    format!(" Posts {first}-{last} de {total} ")
}

fn to_row(n: usize) -> u16 {
    u16::try_from(n).unwrap_or(u16::MAX)
}

/// Adjust `scroll` so the selected card `(start, end)` is in view, preferring
/// its top when it is taller than the viewport.
fn follow_selection(scroll: u16, (start, end): (u16, u16), height: u16) -> u16 {
    if start < scroll || height == 0 {
        return start;
    }
    if end > scroll.saturating_add(height) {
        return end.saturating_sub(height).min(start);
    }
    scroll
}

/// Lines for one card, in template order, followed by a blank separator.
fn card_lines<'a>(
    card: &'a PostCard,
    body: &BodyState,
    selected: bool,
    width: usize,
    collapsed_rows: u16,
) -> Vec<Line<'a>> {
    let mut lines = Vec::new();
    let mut header: Vec<Span> = Vec::new();
    let mut meta: Vec<Span> = Vec::new();
    let indent = " ".repeat(usize::from(BODY_INDENT));

    let marker = if selected { "▸ " } else { "  " };
    header.push(Span::styled(marker, Style::default().fg(Color::Cyan)));

    for field in &card.fields {
        match field {
            CardField::Number(n) => {
                header.push(Span::styled(format!("#{n} "), Style::default().fg(Color::DarkGray)));
            }
            CardField::Title(title) => {
                let mut style = Style::default().fg(Color::White).add_modifier(Modifier::BOLD);
                if selected {
                    style = style.bg(Color::DarkGray);
                }
                header.push(Span::styled(title.as_str(), style));
            }
            CardField::Archive(tag) => {
                header.push(Span::styled(format!("  [{tag}]"), Style::default().fg(Color::Magenta)));
            }
            CardField::Body(text) => {
                flush(&mut lines, &mut header);
                flush(&mut lines, &mut meta);
                let wrapped = wrap_text(text, width);
                let shown = match body.visible_rows(collapsed_rows) {
                    Some(rows) => usize::from(rows).min(wrapped.len()),
                    None => wrapped.len(),
                };
                lines.extend(
                    wrapped
                        .into_iter()
                        .take(shown)
                        .map(|row| Line::raw(format!("{indent}{row}"))),
                );
                if let Some(label) = body.toggle_label() {
                    lines.push(Line::from(vec![
                        Span::raw(indent.clone()),
                        Span::styled(
                            format!("[{label}]"),
                            Style::default().fg(Color::Cyan).add_modifier(Modifier::UNDERLINED),
                        ),
                    ]));
                }
            }
            CardField::Meta { label, icon, value } => {
                flush(&mut lines, &mut header);
                if meta.is_empty() {
                    meta.push(Span::raw(indent.clone()));
                } else {
                    meta.push(Span::styled(" · ", Style::default().fg(Color::DarkGray)));
                }
                meta.push(Span::styled(format!("{label}: "), Style::default().fg(Color::DarkGray)));
                if let Some(icon) = icon {
                    meta.push(Span::raw(format!("{icon} ")));
                }
                meta.push(Span::styled(value.as_str(), Style::default().fg(Color::Green)));
            }
        }
    }
    flush(&mut lines, &mut header);
    flush(&mut lines, &mut meta);
    lines.push(Line::default());
    lines
}

fn flush<'a>(lines: &mut Vec<Line<'a>>, spans: &mut Vec<Span<'a>>) {
    if !spans.is_empty() {
        lines.push(Line::from(std::mem::take(spans)));
    }
}

fn draw_pagination(app: &App, frame: &mut Frame, area: Rect) {
    let Some(controls) = app.feed.controls() else {
        return;
    };
    let button = |label: &str, disabled: bool| {
        let style = if disabled {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        };
        Span::styled(format!("[{label}]"), style)
    };
    let line = Line::from(vec![
        button(PREVIOUS_LABEL, controls.prev_disabled),
        Span::raw("  "),
        Span::raw(controls.label.clone()),
        Span::raw("  "),
        button(NEXT_LABEL, controls.next_disabled),
    ]);
    frame.render_widget(Paragraph::new(line).centered(), area);
}

/// Render the bottom status bar.
fn draw_status_bar(app: &App, frame: &mut Frame, area: Rect) {
    let status = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        Span::styled(&app.status, Style::default().fg(Color::Yellow)),
        Span::raw("  "),
        Span::styled(
            format!("{} posts", app.feed.posts().len()),
            Style::default().fg(Color::Green),
        ),
        Span::raw("  q: quit  ↑/↓: card  ←/→: page  Tab: topic  t: theme  s: sort  Enter: leer mas"),
    ]));
    frame.render_widget(status, area);
}

/// Word-wrap `text` to `width` display columns.  Words longer than a row
/// are split; wide glyphs count as two columns.  Newlines are kept; empty
/// text has no rows.
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }
    // First-fit keeps rows greedy, which is what the read-more height
    // measurement expects.
    let options = WrapOptions::new(width.max(1))
        .break_words(true)
        .wrap_algorithm(WrapAlgorithm::FirstFit);
    wrap(text, options).into_iter().map(|row| row.into_owned()).collect()
}
