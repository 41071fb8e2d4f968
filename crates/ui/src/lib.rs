//! ratatui-based UI.

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Context as _;
use application::AppContext;
use catalog::{CatalogWorker, FetchJob, FetchOutcome, Source};
use crossterm::event::{Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{event, terminal};
use openshelf_core::{BookRecord, CategoryFilter, Theme};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{
    Block, Borders, Clear, HighlightSpacing, List, ListItem, ListState, Paragraph, Wrap,
};
use ratatui_image::picker::Picker;
use ratatui_image::protocol::Protocol as ImageProtocol;
use ratatui_image::{Image as ImageWidget, Resize};
use storage::Storage;
use unicode_width::UnicodeWidthStr;

/// The one user-visible fetch failure message; the error taxonomy stays flat.
const FETCH_FAILED_MESSAGE: &str = "Could not load books. Try again.";
const EMPTY_RESULT_NOTICE: &str = "No books found. Try a different search term.";

/// Query used when the user submits a web search with a blank field.
const DEFAULT_SEARCH_QUERY: &str = "javascript";

pub struct Ui {
    ctx: AppContext,
    storage: Storage,
    worker: CatalogWorker,
    source: Source,
    fetch_ticket: u64,
    search_panel: SearchPanel,
    category_panel: CategoryPanel,
    detail: Option<BookRecord>,
    cover: CoverSlot,
    image_picker: Picker,
}

impl Ui {
    pub fn new(ctx: AppContext, storage: Storage, worker: CatalogWorker) -> Self {
        Self {
            ctx,
            storage,
            worker,
            source: Source::ReadingLog,
            fetch_ticket: 0,
            search_panel: SearchPanel::default(),
            category_panel: CategoryPanel::default(),
            detail: None,
            cover: CoverSlot::default(),
            image_picker: Picker::halfblocks(),
        }
    }

    /// Runs the UI to completion, persisting settings on the way out. The
    /// terminal is restored on error and panic alike.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let mut terminal = setup_terminal()?;
        self.image_picker = Picker::from_query_stdio().unwrap_or_else(|_| Picker::halfblocks());
        terminal.clear().ok();

        // The one startup fetch.
        self.request_records(Source::ReadingLog);

        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            self.event_loop(&mut terminal)
        }));
        let restore_result = restore_terminal(&mut terminal);

        match (result, restore_result) {
            (Ok(Ok(())), Ok(())) => Ok(()),
            (Ok(Ok(())), Err(err)) => Err(err),
            (Ok(Err(err)), _) => Err(err),
            (Err(panic), Ok(())) => Err(anyhow::anyhow!(panic_to_string(panic))),
            (Err(panic), Err(err)) => Err(anyhow::anyhow!(
                "{}\n(additionally failed to restore terminal: {err})",
                panic_to_string(panic)
            )),
        }
    }

    fn event_loop(
        &mut self,
        terminal: &mut Terminal<CrosstermBackend<Stdout>>,
    ) -> anyhow::Result<()> {
        let tick_rate = Duration::from_millis(150);
        let mut needs_redraw = true;

        loop {
            if self.drain_fetch_outcomes() {
                needs_redraw = true;
            }

            if needs_redraw {
                terminal.draw(|frame| self.draw(frame.area(), frame))?;
                needs_redraw = false;
            }

            if !event::poll(tick_rate)? {
                continue;
            }

            match event::read()? {
                Event::Resize(_, _) => {
                    needs_redraw = true;
                }
                Event::Key(key) => {
                    if key.kind == KeyEventKind::Release {
                        continue;
                    }

                    needs_redraw = true;

                    let quit = if self.detail.is_some() {
                        self.handle_detail_key(key)?
                    } else if self.search_panel.open {
                        self.handle_search_panel_key(key)
                    } else if self.category_panel.open {
                        self.handle_category_panel_key(key)
                    } else {
                        self.handle_main_key(key)?
                    };

                    if quit {
                        self.storage.save_settings(&self.ctx.settings)?;
                        return Ok(());
                    }
                }
                _ => {}
            }
        }
    }

    // --- fetch plumbing ---

    fn request_records(&mut self, source: Source) {
        self.fetch_ticket += 1;
        self.source = source.clone();
        self.ctx.begin_fetch();
        self.worker.submit(FetchJob::Records {
            ticket: self.fetch_ticket,
            source,
        });
    }

    fn drain_fetch_outcomes(&mut self) -> bool {
        let mut changed = false;
        while let Some(outcome) = self.worker.try_recv() {
            changed = true;
            match outcome {
                FetchOutcome::Records { ticket, result } => {
                    // Stale outcome: a newer request owns the state now.
                    if ticket != self.fetch_ticket {
                        continue;
                    }
                    match result {
                        Ok(records) if records.is_empty() => {
                            self.ctx.empty_fetch(EMPTY_RESULT_NOTICE);
                        }
                        Ok(records) => {
                            self.ctx.finish_fetch(records);
                            self.ctx.selected = 0;
                        }
                        Err(_) => self.ctx.fail_fetch(FETCH_FAILED_MESSAGE),
                    }
                }
                FetchOutcome::Cover { cover_id, result } => {
                    if self.cover.cover_id != Some(cover_id) {
                        continue;
                    }
                    match result.ok().and_then(|bytes| {
                        image::load_from_memory(&bytes).ok()
                    }) {
                        Some(decoded) => {
                            self.cover.image = Some(decoded);
                            self.cover.protocol = None;
                        }
                        None => self.cover.failed = true,
                    }
                }
            }
        }
        changed
    }

    fn request_cover(&mut self, record: &BookRecord) {
        if self.cover.cover_id == record.cover_id && record.cover_id.is_some() {
            return;
        }
        self.cover = CoverSlot {
            cover_id: record.cover_id,
            ..CoverSlot::default()
        };
        if let Some(cover_id) = record.cover_id {
            self.worker.submit(FetchJob::Cover { cover_id });
        }
    }

    // --- key handling ---

    fn handle_main_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && let KeyCode::Char('u') = key.code
        {
            self.ctx.criteria.search_text.clear();
            self.ctx.criteria.category = CategoryFilter::All;
            self.ctx.clamp_selection();
            return Ok(false);
        }

        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => return Ok(true),
            KeyCode::Up => self.select_prev(),
            KeyCode::Down => self.select_next(),
            KeyCode::Enter => self.open_detail(),
            KeyCode::Char('/') => {
                self.search_panel.open = true;
                self.search_panel.snapshot = Some(self.ctx.criteria.search_text.clone());
            }
            KeyCode::Char('s') => {
                self.ctx.criteria.sort_key = self.ctx.criteria.sort_key.cycle();
                self.ctx.clamp_selection();
            }
            KeyCode::Char('c') => self.open_category_panel(),
            KeyCode::Char('f') => self.toggle_selected_favorite()?,
            KeyCode::Char('w') => {
                let query = self.ctx.criteria.search_text.trim().to_string();
                let query = if query.is_empty() {
                    DEFAULT_SEARCH_QUERY.to_string()
                } else {
                    query
                };
                self.request_records(Source::Search {
                    query,
                    limit: self.ctx.settings.search_limit,
                });
            }
            KeyCode::Char('g') => {
                let query = self.ctx.criteria.search_text.trim().to_string();
                let query = if query.is_empty() {
                    DEFAULT_SEARCH_QUERY.to_string()
                } else {
                    query
                };
                self.request_records(Source::Volumes { query });
            }
            KeyCode::Char('r') => self.request_records(Source::ReadingLog),
            KeyCode::Char('t') => {
                self.ctx.settings.cycle_theme();
                self.storage.save_settings(&self.ctx.settings)?;
            }
            _ => {}
        }
        Ok(false)
    }

    fn handle_search_panel_key(&mut self, key: KeyEvent) -> bool {
        if key.modifiers.contains(KeyModifiers::CONTROL)
            && let KeyCode::Char('u') = key.code
        {
            self.ctx.criteria.search_text.clear();
            self.ctx.clamp_selection();
            return false;
        }

        match key.code {
            KeyCode::Esc => {
                // Cancel restores the text from panel open time.
                if let Some(snapshot) = self.search_panel.snapshot.take() {
                    self.ctx.criteria.search_text = snapshot;
                    self.ctx.clamp_selection();
                }
                self.search_panel.open = false;
            }
            KeyCode::Enter => {
                self.search_panel.open = false;
                self.search_panel.snapshot = None;
            }
            KeyCode::Backspace => {
                self.ctx.criteria.search_text.pop();
                self.ctx.clamp_selection();
            }
            KeyCode::Char(ch) if !ch.is_control() => {
                self.ctx.criteria.search_text.push(ch);
                self.ctx.clamp_selection();
            }
            _ => {}
        }
        false
    }

    fn handle_category_panel_key(&mut self, key: KeyEvent) -> bool {
        let entries = self.category_entries();
        match key.code {
            KeyCode::Esc => self.category_panel.open = false,
            KeyCode::Up => {
                self.category_panel.cursor = self.category_panel.cursor.saturating_sub(1);
            }
            KeyCode::Down => {
                self.category_panel.cursor = (self.category_panel.cursor + 1)
                    .min(entries.len().saturating_sub(1));
            }
            KeyCode::Enter => {
                self.ctx.criteria.category = match self.category_panel.cursor {
                    0 => CategoryFilter::All,
                    index => entries
                        .get(index)
                        .map(|name| CategoryFilter::Selected(name.clone()))
                        .unwrap_or(CategoryFilter::All),
                };
                self.category_panel.open = false;
                self.ctx.clamp_selection();
            }
            _ => {}
        }
        false
    }

    fn handle_detail_key(&mut self, key: KeyEvent) -> anyhow::Result<bool> {
        match key.code {
            KeyCode::Esc | KeyCode::Enter => self.detail = None,
            KeyCode::Char('f') => {
                if let Some(record) = &self.detail {
                    let title = record.title.clone();
                    self.ctx.favorites = self.storage.toggle_favorite(&self.ctx.favorites, &title)?;
                }
            }
            _ => {}
        }
        Ok(false)
    }

    // --- state helpers ---

    fn select_prev(&mut self) {
        self.ctx.selected = self.ctx.selected.saturating_sub(1);
    }

    fn select_next(&mut self) {
        let visible = self.ctx.visible().len();
        if visible > 0 {
            self.ctx.selected = (self.ctx.selected + 1).min(visible - 1);
        }
    }

    fn open_detail(&mut self) {
        let visible = self.ctx.visible();
        if let Some(record) = visible.get(self.ctx.selected) {
            self.request_cover(record);
            self.detail = Some(record.clone());
        }
    }

    fn open_category_panel(&mut self) {
        let entries = self.category_entries();
        self.category_panel.cursor = match &self.ctx.criteria.category {
            CategoryFilter::All => 0,
            CategoryFilter::Selected(name) => {
                entries.iter().position(|entry| entry == name).unwrap_or(0)
            }
        };
        self.category_panel.open = true;
    }

    /// Index 0 is the "all" entry, the rest are the derived category names.
    fn category_entries(&self) -> Vec<String> {
        let mut entries = vec!["All categories".to_string()];
        entries.extend(self.ctx.categories());
        entries
    }

    fn toggle_selected_favorite(&mut self) -> anyhow::Result<()> {
        let visible = self.ctx.visible();
        let Some(record) = visible.get(self.ctx.selected) else {
            return Ok(());
        };
        let title = record.title.clone();
        self.ctx.favorites = self.storage.toggle_favorite(&self.ctx.favorites, &title)?;
        self.ctx.clamp_selection();
        Ok(())
    }

    fn accent_color(&self) -> Color {
        match self.ctx.settings.theme {
            Theme::Light => Color::Blue,
            Theme::Dark => Color::Yellow,
        }
    }

    // --- drawing ---

    fn draw(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let sections = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(4),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);

        self.draw_status(sections[0], frame);

        let main = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
            .split(sections[1]);

        self.draw_book_list(main[0], frame);
        self.draw_selected_summary(main[1], frame);
        self.draw_help(sections[2], frame);

        if self.search_panel.open {
            self.draw_search_panel(area, frame);
        }
        if self.category_panel.open {
            self.draw_category_panel(area, frame);
        }
        if self.detail.is_some() {
            self.draw_detail_modal(area, frame);
        }
    }

    fn draw_status(&self, area: Rect, frame: &mut ratatui::Frame) {
        let visible = self.ctx.visible().len();
        let mut lines = Vec::new();

        lines.push(Line::from(vec![
            Span::styled("Source: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(self.source.label()),
            Span::raw("  "),
            Span::styled("Books: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(format!("{visible}/{}", self.ctx.records.len())),
            Span::raw("  "),
            Span::styled("Sort: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(self.ctx.criteria.sort_key.to_string()),
            Span::raw("  "),
            Span::styled("Category: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(self.ctx.criteria.category.label().to_string()),
            Span::raw("  "),
            Span::styled("Favorites: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(self.ctx.favorites.len().to_string()),
        ]));

        if self.ctx.loading {
            lines.push(Line::styled(
                "Loading books…",
                Style::default().fg(self.accent_color()),
            ));
        } else if let Some(error) = &self.ctx.error {
            lines.push(Line::styled(
                error.clone(),
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            ));
        } else if let Some(notice) = &self.ctx.notice {
            lines.push(Line::styled(
                notice.clone(),
                Style::default().fg(Color::Yellow),
            ));
        } else {
            let query = self.ctx.criteria.search_text.trim();
            let query = if query.is_empty() { "-" } else { query };
            lines.push(Line::raw(format!("Filter: {query}")));
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Openshelf"));
        frame.render_widget(paragraph, area);
    }

    fn draw_book_list(&self, area: Rect, frame: &mut ratatui::Frame) {
        let visible = self.ctx.visible();
        let has_filters = !self.ctx.criteria.search_text.trim().is_empty()
            || !matches!(self.ctx.criteria.category, CategoryFilter::All);
        let title = if has_filters {
            format!("Books — {}/{} matches", visible.len(), self.ctx.records.len())
        } else {
            "Books".to_string()
        };
        let block = Block::default().borders(Borders::ALL).title(title);

        if self.ctx.records.is_empty() {
            let message = if self.ctx.loading {
                "Fetching the reading list…"
            } else {
                "No books loaded. Press r to reload or w to search."
            };
            let paragraph = Paragraph::new(Line::raw(message))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        if visible.is_empty() {
            let mut lines = vec![Line::raw("No matches.")];
            let query = self.ctx.criteria.search_text.trim();
            if !query.is_empty() {
                lines.push(Line::raw(""));
                lines.push(Line::raw(format!("Filter: {query}")));
                lines.push(Line::raw("Tip: press / to edit the filter, Ctrl+u to clear."));
            }
            let paragraph = Paragraph::new(Text::from(lines))
                .block(block)
                .wrap(Wrap { trim: true });
            frame.render_widget(paragraph, area);
            return;
        }

        let max_width = area.width.saturating_sub(4) as usize;
        let items: Vec<ListItem> = visible
            .iter()
            .map(|record| {
                let marker = if self.ctx.is_favorite(&record.title) {
                    "★ "
                } else {
                    "  "
                };
                let year = record
                    .first_publish_year
                    .map(|y| format!(" ({y})"))
                    .unwrap_or_default();
                let author = record.first_author();
                let label = if author.is_empty() {
                    format!("{marker}{}{year}", record.title)
                } else {
                    format!("{marker}{} — {author}{year}", record.title)
                };
                ListItem::new(Line::raw(truncate_to_width(&label, max_width.max(8))))
            })
            .collect();

        let highlight_style = Style::default()
            .fg(Color::Black)
            .bg(self.accent_color())
            .add_modifier(Modifier::BOLD);

        let list = List::new(items)
            .block(block)
            .highlight_style(highlight_style)
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.ctx.selected.min(visible.len() - 1)));
        frame.render_stateful_widget(list, area, &mut state);
    }

    fn draw_selected_summary(&self, area: Rect, frame: &mut ratatui::Frame) {
        let visible = self.ctx.visible();
        let mut lines = Vec::new();

        if let Some(record) = visible.get(self.ctx.selected) {
            lines.push(Line::styled(
                record.title.clone(),
                Style::default().add_modifier(Modifier::BOLD),
            ));
            lines.push(Line::raw(""));
            lines.push(detail_line("Authors", &display_or(record.authors_joined(), "Unknown author")));
            lines.push(detail_line(
                "First published",
                &record
                    .first_publish_year
                    .map(|y| y.to_string())
                    .unwrap_or_else(|| "-".to_string()),
            ));
            let subjects: Vec<&str> = record
                .subjects
                .iter()
                .take(6)
                .map(String::as_str)
                .collect();
            lines.push(detail_line("Subjects", &display_or(subjects.join(", "), "-")));
            lines.push(detail_line(
                "ISBN",
                record.isbns.first().map(String::as_str).unwrap_or("-"),
            ));
            lines.push(detail_line(
                "Favorite",
                if self.ctx.is_favorite(&record.title) {
                    "yes"
                } else {
                    "no"
                },
            ));
            lines.push(detail_line(
                "Cover",
                &record.cover_url().unwrap_or_else(|| "-".to_string()),
            ));
            lines.push(Line::raw(""));
            lines.push(Line::raw("Enter opens the detail view."));
        } else {
            lines.push(Line::raw("No selection."));
        }

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Details"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, area);
    }

    fn draw_help(&self, area: Rect, frame: &mut ratatui::Frame) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![
            Span::styled("/", bold),
            Span::raw(" filter  "),
            Span::styled("w", bold),
            Span::raw(" web search  "),
            Span::styled("g", bold),
            Span::raw(" volumes  "),
            Span::styled("r", bold),
            Span::raw(" reading list  "),
            Span::styled("s", bold),
            Span::raw(" sort  "),
            Span::styled("c", bold),
            Span::raw(" category  "),
            Span::styled("f", bold),
            Span::raw(" favorite  "),
            Span::styled("t", bold),
            Span::raw(" theme  "),
            Span::styled("Enter", bold),
            Span::raw(" details  "),
            Span::styled("Esc", bold),
            Span::raw(" quit"),
        ]);
        frame.render_widget(Paragraph::new(line).alignment(Alignment::Left), area);
    }

    fn draw_search_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(60, 20, area);
        frame.render_widget(Clear, popup_area);

        let mut lines = Vec::new();
        lines.push(Line::from(vec![
            Span::styled("Query: ", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(self.ctx.criteria.search_text.clone()),
            Span::styled("▌", Style::default().fg(self.accent_color())),
        ]));
        lines.push(Line::raw(""));
        lines.push(Line::raw(
            "Matches title or author while you type. Enter keeps it, Esc cancels,",
        ));
        lines.push(Line::raw("Ctrl+u clears. Press w afterwards to search the web."));

        let paragraph = Paragraph::new(Text::from(lines))
            .block(Block::default().borders(Borders::ALL).title("Search"))
            .wrap(Wrap { trim: true });
        frame.render_widget(paragraph, popup_area);
    }

    fn draw_category_panel(&self, area: Rect, frame: &mut ratatui::Frame) {
        let popup_area = centered_rect(50, 60, area);
        frame.render_widget(Clear, popup_area);

        let entries = self.category_entries();
        let items: Vec<ListItem> = entries
            .iter()
            .enumerate()
            .map(|(index, entry)| {
                let active = match (&self.ctx.criteria.category, index) {
                    (CategoryFilter::All, 0) => true,
                    (CategoryFilter::Selected(name), _) => name == entry,
                    _ => false,
                };
                let marker = if active { "● " } else { "  " };
                ListItem::new(Line::raw(format!("{marker}{entry}")))
            })
            .collect();

        let highlight_style = Style::default()
            .fg(Color::Black)
            .bg(self.accent_color())
            .add_modifier(Modifier::BOLD);

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title("Category"))
            .highlight_style(highlight_style)
            .highlight_symbol("> ")
            .highlight_spacing(HighlightSpacing::Always);

        let mut state = ListState::default();
        state.select(Some(self.category_panel.cursor.min(entries.len() - 1)));
        frame.render_stateful_widget(list, popup_area, &mut state);
    }

    fn draw_detail_modal(&mut self, area: Rect, frame: &mut ratatui::Frame) {
        let Some(record) = self.detail.clone() else {
            return;
        };

        let popup_area = centered_rect(80, 80, area);
        frame.render_widget(Clear, popup_area);

        let block = Block::default().borders(Borders::ALL).title("Book details");
        let inner = block.inner(popup_area);
        frame.render_widget(block, popup_area);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Length(26), Constraint::Min(0)])
            .split(inner);

        self.draw_cover(columns[0], frame, &record);

        let mut lines = Vec::new();
        lines.push(Line::styled(
            record.title.clone(),
            Style::default()
                .fg(self.accent_color())
                .add_modifier(Modifier::BOLD),
        ));
        lines.push(Line::raw(""));
        lines.push(detail_line("Authors", &display_or(record.authors_joined(), "Unknown author")));
        lines.push(detail_line(
            "First published",
            &record
                .first_publish_year
                .map(|y| y.to_string())
                .unwrap_or_else(|| "Unknown".to_string()),
        ));
        if !record.subjects.is_empty() {
            let subjects: Vec<&str> = record
                .subjects
                .iter()
                .take(6)
                .map(String::as_str)
                .collect();
            lines.push(detail_line("Subjects", &subjects.join(", ")));
        }
        if !record.isbns.is_empty() {
            let isbns: Vec<&str> = record.isbns.iter().take(3).map(String::as_str).collect();
            lines.push(detail_line("ISBN", &isbns.join(", ")));
        }
        lines.push(detail_line(
            "Favorite",
            if self.ctx.is_favorite(&record.title) {
                "yes"
            } else {
                "no"
            },
        ));
        lines.push(Line::raw(""));
        lines.push(Line::from(vec![
            Span::styled("f", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" toggle favorite  "),
            Span::styled("Esc", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw(" close"),
        ]));

        let paragraph = Paragraph::new(Text::from(lines)).wrap(Wrap { trim: true });
        frame.render_widget(paragraph, columns[1]);
    }

    fn draw_cover(&mut self, area: Rect, frame: &mut ratatui::Frame, record: &BookRecord) {
        if area.width == 0 || area.height == 0 {
            return;
        }

        if record.cover_id.is_none() || self.cover.failed {
            let message = if record.cover_id.is_none() {
                "No cover available."
            } else {
                "Cover could not be loaded."
            };
            let placeholder = Paragraph::new(Text::from(vec![
                Line::raw("📚"),
                Line::raw(""),
                Line::raw(message),
            ]))
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true });
            frame.render_widget(placeholder, area);
            return;
        }

        let Some(decoded) = self.cover.image.clone() else {
            let loading = Paragraph::new(Line::raw("Loading cover…"))
                .alignment(Alignment::Center)
                .style(Style::default().fg(self.accent_color()));
            frame.render_widget(loading, area);
            return;
        };

        // Protocols bake in the target rect; rebuild after a resize.
        let stale = match &self.cover.protocol {
            Some((rect, _)) => *rect != area,
            None => true,
        };
        if stale {
            match self
                .image_picker
                .new_protocol(decoded, area, Resize::Fit(None))
            {
                Ok(protocol) => self.cover.protocol = Some((area, protocol)),
                Err(_) => {
                    self.cover.failed = true;
                    return;
                }
            }
        }

        if let Some((_, protocol)) = &self.cover.protocol {
            frame.render_widget(ImageWidget::new(protocol), area);
        }
    }
}

#[derive(Debug, Clone, Default)]
struct SearchPanel {
    open: bool,
    snapshot: Option<String>,
}

#[derive(Debug, Clone, Default)]
struct CategoryPanel {
    open: bool,
    cursor: usize,
}

#[derive(Default)]
struct CoverSlot {
    cover_id: Option<u64>,
    image: Option<image::DynamicImage>,
    protocol: Option<(Rect, ImageProtocol)>,
    failed: bool,
}

fn detail_line(label: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(
            format!("{label}: "),
            Style::default().add_modifier(Modifier::BOLD),
        ),
        Span::raw(value.to_string()),
    ])
}

fn display_or(value: String, fallback: &str) -> String {
    if value.is_empty() {
        fallback.to_string()
    } else {
        value
    }
}

fn setup_terminal() -> anyhow::Result<Terminal<CrosstermBackend<Stdout>>> {
    terminal::enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    crossterm::execute!(stdout, EnterAlternateScreen).context("enter alt screen")?;
    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("create terminal")
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> anyhow::Result<()> {
    terminal::disable_raw_mode().context("disable raw mode")?;
    crossterm::execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .context("leave alt screen")?;
    Ok(())
}

fn panic_to_string(panic: Box<dyn std::any::Any + Send>) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        format!("panic: {s}")
    } else if let Some(s) = panic.downcast_ref::<String>() {
        format!("panic: {s}")
    } else {
        "panic: (unknown payload)".to_string()
    }
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(rows[1])[1]
}

fn truncate_to_width(text: &str, max_width: usize) -> String {
    if UnicodeWidthStr::width(text) <= max_width {
        return text.to_string();
    }

    let ellipsis = "…";
    let budget = max_width.saturating_sub(UnicodeWidthStr::width(ellipsis));
    let mut out = String::new();
    let mut used = 0usize;
    for ch in text.chars() {
        let mut buf = [0u8; 4];
        let w = UnicodeWidthStr::width(ch.encode_utf8(&mut buf));
        if used + w > budget {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push_str(ellipsis);
    out
}
