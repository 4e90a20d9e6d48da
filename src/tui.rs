use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};
use std::io::stdout;

use crate::models::{Posting, PostingId};
use crate::store::ProfileStore;

struct AppState {
    postings: Vec<Posting>,
    selected: usize,
    scroll_offset: u16,
    favorites_only: bool,
    status_line: Option<String>,
}

impl AppState {
    fn new(postings: Vec<Posting>) -> Self {
        Self {
            postings,
            selected: 0,
            scroll_offset: 0,
            favorites_only: false,
            status_line: None,
        }
    }

    /// Postings shown in the list, in catalog order.
    fn visible<'a>(&'a self, favorites: &'a [PostingId]) -> Vec<&'a Posting> {
        self.postings
            .iter()
            .filter(|p| !self.favorites_only || favorites.contains(&p.id))
            .collect()
    }

    fn current<'a>(&'a self, favorites: &'a [PostingId]) -> Option<&'a Posting> {
        self.visible(favorites).get(self.selected).copied()
    }

    fn next(&mut self, len: usize) {
        if len > 0 && self.selected < len - 1 {
            self.selected += 1;
            self.scroll_offset = 0;
        }
    }

    fn prev(&mut self) {
        if self.selected > 0 {
            self.selected -= 1;
            self.scroll_offset = 0;
        }
    }

    fn scroll_down(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_add(3);
    }

    fn scroll_up(&mut self) {
        self.scroll_offset = self.scroll_offset.saturating_sub(3);
    }

    fn toggle_favorites_only(&mut self) {
        self.favorites_only = !self.favorites_only;
        self.selected = 0;
        self.scroll_offset = 0;
    }

    /// Keeps the selection inside the list after it shrinks.
    fn clamp(&mut self, len: usize) {
        if self.selected >= len {
            self.selected = len.saturating_sub(1);
        }
    }
}

pub fn run_browse(postings: Vec<Posting>, profile: &mut ProfileStore) -> Result<()> {
    if postings.is_empty() {
        println!("No postings found.");
        return Ok(());
    }

    let mut state = AppState::new(postings);

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, profile);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    profile: &mut ProfileStore,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, profile.favorites(), &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            let len = state.visible(profile.favorites()).len();
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(len),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('v') => state.toggle_favorites_only(),
                KeyCode::Char('f') => {
                    if let Some(id) = state.current(profile.favorites()).map(|p| p.id) {
                        state.status_line = Some(match profile.toggle_favorite(id) {
                            Ok(true) => format!("#{} saved to favorites", id),
                            Ok(false) => format!("#{} removed from favorites", id),
                            Err(e) => format!("Could not update favorites: {}", e),
                        });
                    }
                }
                _ => {}
            }
            state.clamp(state.visible(profile.favorites()).len());
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

fn draw(frame: &mut Frame, state: &AppState, favorites: &[PostingId], list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(frame.area());

    // Left panel: posting list
    let visible = state.visible(favorites);
    let items: Vec<ListItem> = visible
        .iter()
        .map(|posting| {
            let marker = if favorites.contains(&posting.id) { "*" } else { " " };
            ListItem::new(format!(
                "{} #{:<4} {} | {}",
                marker,
                posting.id,
                crate::truncate(&posting.title, 35),
                posting.company
            ))
        })
        .collect();

    let title = if state.favorites_only {
        format!(" Favorites ({}) ", visible.len())
    } else {
        format!(" Internships ({}) ", visible.len())
    };
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: posting detail
    let detail = build_detail(state.current(favorites), favorites);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Detail "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer help
    let help_area = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1)])
        .split(frame.area());

    let help = match &state.status_line {
        Some(status) => format!(" {}  |  f:favorite v:favorites only  q:quit", status),
        None => " j/k:navigate  J/K:scroll  f:favorite  v:favorites only  q:quit".to_string(),
    };
    let help = Paragraph::new(help).style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, help_area[1]);
}

fn build_detail<'a>(posting: Option<&'a Posting>, favorites: &[PostingId]) -> Text<'a> {
    let Some(posting) = posting else {
        return Text::raw("No posting selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    // Header
    lines.push(Line::from(Span::styled(
        &posting.title,
        Style::default().add_modifier(Modifier::BOLD),
    )));
    lines.push(Line::from(format!("at {}", posting.company)));
    if favorites.contains(&posting.id) {
        lines.push(Line::from(Span::styled(
            "* In your favorites",
            Style::default().fg(Color::Yellow),
        )));
    }

    lines.push(Line::from(format!("Location: {}", posting.location)));
    lines.push(Line::from(format!("Duration: {}", posting.duration)));
    if let Some(salary) = &posting.salary {
        lines.push(Line::from(format!("Salary: {}", salary)));
    }
    if let Some(start) = &posting.start_date {
        lines.push(Line::from(format!("Start: {}", start)));
    }
    lines.push(Line::from(format!(
        "Applications: {}  |  Published: {}",
        posting.applications_count,
        posting.created_at.format("%Y-%m-%d")
    )));
    if !posting.tags.is_empty() {
        lines.push(Line::from(Span::styled(
            posting.tags.join(", "),
            Style::default().fg(Color::Cyan),
        )));
    }

    lines.push(Line::from(""));
    for line in textwrap::fill(&posting.description, 70).lines() {
        lines.push(Line::from(line.to_string()));
    }

    for (label, items) in [
        ("MISSIONS", &posting.missions),
        ("REQUIREMENTS", &posting.requirements),
        ("BENEFITS", &posting.benefits),
    ] {
        if items.is_empty() {
            continue;
        }
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            label,
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for item in items {
            lines.push(Line::from(format!("  - {}", item)));
        }
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        format!("Apply with: stagehub apply {} --letter \"...\"", posting.id),
        Style::default().fg(Color::DarkGray),
    )));

    Text::from(lines)
}
