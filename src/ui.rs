use std::io::{self, Stdout};

use anyhow::Result;
use crossterm::event::{self, Event};
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use crossterm::ExecutableCommand;
use ratatui::backend::{Backend, CrosstermBackend};
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span, Text};
use ratatui::widgets::{Block, Borders, List, ListItem, Padding, Paragraph, Wrap};
use ratatui::{Frame, Terminal};
use textwrap::{wrap, Options as WrapOptions};
use unicode_width::UnicodeWidthStr;

use crate::controller::{Focus, Session, Transition};
use crate::error::UiInitError;
use crate::keymap;
use crate::logging;

const COLOR_BG: Color = Color::Rgb(30, 30, 46);
const COLOR_PANEL_BG: Color = Color::Rgb(24, 24, 36);
const COLOR_PANEL_FOCUSED_BG: Color = Color::Rgb(49, 50, 68);
const COLOR_PANEL_SELECTED_BG: Color = Color::Rgb(69, 71, 90);
const COLOR_BORDER_IDLE: Color = Color::Rgb(49, 50, 68);
const COLOR_BORDER_FOCUSED: Color = Color::Rgb(137, 180, 250);
const COLOR_TEXT_PRIMARY: Color = Color::Rgb(205, 214, 244);
const COLOR_TEXT_SECONDARY: Color = Color::Rgb(166, 173, 200);
const COLOR_ACCENT: Color = Color::Rgb(137, 180, 250);
const COLOR_SUCCESS: Color = Color::Rgb(166, 227, 161);
const COLOR_ERROR: Color = Color::Rgb(243, 139, 168);

#[derive(Clone, Copy, PartialEq, Eq)]
enum Pane {
    Categories,
    Items,
    Details,
}

impl Pane {
    fn title(self) -> &'static str {
        match self {
            Pane::Categories => "Language",
            Pane::Items => "GitHub Trending",
            Pane::Details => "Details",
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum StatusKind {
    Info,
    Success,
    Error,
}

#[derive(Clone, Debug)]
pub struct Options {
    pub status_message: String,
    pub status_kind: StatusKind,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            status_message: String::new(),
            status_kind: StatusKind::Info,
        }
    }
}

pub struct Model {
    session: Session,
    status_message: String,
    status_kind: StatusKind,
    needs_redraw: bool,
}

impl Model {
    pub fn new(session: Session, options: Options) -> Self {
        Self {
            session,
            status_message: options.status_message,
            status_kind: options.status_kind,
            needs_redraw: true,
        }
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode().map_err(UiInitError::RawMode)?;
        let mut stdout = io::stdout();
        if let Err(err) = stdout.execute(EnterAlternateScreen) {
            let _ = disable_raw_mode();
            return Err(UiInitError::AlternateScreen(err).into());
        }
        logging::set_terminal_active(true);
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = match Terminal::new(backend) {
            Ok(terminal) => terminal,
            Err(err) => {
                let _ = disable_raw_mode();
                let _ = io::stdout().execute(LeaveAlternateScreen);
                logging::set_terminal_active(false);
                return Err(UiInitError::Terminal(err).into());
            }
        };

        let result = terminal
            .clear()
            .map_err(anyhow::Error::from)
            .and_then(|()| self.event_loop(&mut terminal));

        let restored = restore_terminal(&mut terminal);
        result?;
        restored
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            if self.needs_redraw {
                terminal.draw(|frame| self.draw(frame))?;
                self.needs_redraw = false;
            }

            match event::read()? {
                Event::Key(key) => {
                    if self.handle_key(&key) {
                        break;
                    }
                }
                Event::Resize(_, _) => self.mark_dirty(),
                _ => {}
            }
        }
        tracing::info!("session ended");
        Ok(())
    }

    /// Returns true when the session should end.
    pub fn handle_key(&mut self, key: &crossterm::event::KeyEvent) -> bool {
        let Some(action) = keymap::action_for(key) else {
            return false;
        };
        let transition = self.session.apply(action);
        if transition.needs_redraw() {
            self.mark_dirty();
        }
        match transition {
            Transition::Quit => return true,
            Transition::Opened { url, target } => {
                tracing::info!(%url, %target, "opened repository");
                self.set_status(format!("Opened {url}"), StatusKind::Success);
            }
            Transition::OpenFailed(err) => {
                self.set_status(format!("Failed to open: {err}"), StatusKind::Error);
            }
            Transition::Changed => {
                if self.status_kind != StatusKind::Info {
                    self.set_status(String::new(), StatusKind::Info);
                }
            }
            Transition::Unchanged => {}
        }
        false
    }

    fn set_status(&mut self, message: String, kind: StatusKind) {
        self.status_message = message;
        self.status_kind = kind;
        self.mark_dirty();
    }

    fn mark_dirty(&mut self) {
        self.needs_redraw = true;
    }

    fn draw(&mut self, frame: &mut Frame<'_>) {
        let full = frame.size();
        frame.render_widget(Block::default().style(Style::default().bg(COLOR_BG)), full);

        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(full);

        let status_color = match self.status_kind {
            StatusKind::Info => COLOR_TEXT_PRIMARY,
            StatusKind::Success => COLOR_SUCCESS,
            StatusKind::Error => COLOR_ERROR,
        };
        let status_line = Paragraph::new(self.status_message.clone()).style(
            Style::default()
                .fg(status_color)
                .bg(COLOR_PANEL_FOCUSED_BG)
                .add_modifier(Modifier::BOLD),
        );
        frame.render_widget(status_line, layout[0]);

        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(20), Constraint::Percentage(80)])
            .split(layout[1]);
        let right = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Percentage(80), Constraint::Percentage(20)])
            .split(columns[1]);

        let categories_block = self.pane_block(Pane::Categories);
        let items_block = self.pane_block(Pane::Items);
        let categories_inner = categories_block.inner(columns[0]);
        let items_inner = items_block.inner(right[0]);
        self.session.set_pane_heights(
            categories_inner.height as usize,
            items_inner.height as usize,
        );

        frame.render_widget(categories_block, columns[0]);
        self.draw_categories(frame, categories_inner);
        frame.render_widget(items_block, right[0]);
        self.draw_items(frame, items_inner);
        self.draw_details(frame, right[1]);

        let footer = Paragraph::new(keymap::footer_hints())
            .style(
                Style::default()
                    .fg(COLOR_TEXT_SECONDARY)
                    .bg(COLOR_PANEL_BG)
                    .add_modifier(Modifier::ITALIC),
            )
            .alignment(Alignment::Center);
        frame.render_widget(footer, layout[2]);
    }

    fn pane_block(&self, pane: Pane) -> Block<'static> {
        let focused = match pane {
            Pane::Categories => self.session.focus() == Focus::Categories,
            Pane::Items => self.session.focus() == Focus::Items,
            Pane::Details => false,
        };
        let border_style = if focused {
            Style::default().fg(COLOR_BORDER_FOCUSED)
        } else {
            Style::default().fg(COLOR_BORDER_IDLE)
        };
        let title_style = if focused {
            Style::default()
                .fg(COLOR_ACCENT)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(COLOR_TEXT_SECONDARY)
        };
        Block::default()
            .title(Span::styled(pane.title(), title_style))
            .borders(Borders::ALL)
            .border_style(border_style)
            .style(Style::default().bg(COLOR_PANEL_BG))
            .padding(Padding::horizontal(1))
    }

    fn draw_categories(&self, frame: &mut Frame<'_>, area: Rect) {
        let keys = self.session.store().keys();
        let viewport = self.session.categories_viewport();
        let focused = self.session.focus() == Focus::Categories;
        let rows = viewport
            .visible_range(keys.len())
            .map(|idx| (keys[idx].clone(), idx == viewport.cursor()));
        let list = list_rows(rows, focused, area.width, "No languages");
        frame.render_widget(list, area);
    }

    fn draw_items(&self, frame: &mut Frame<'_>, area: Rect) {
        let items = self.session.current_items();
        let viewport = self.session.items_viewport();
        let focused = self.session.focus() == Focus::Items;
        let rows = viewport
            .visible_range(items.len())
            .map(|idx| (items[idx].row_label(), idx == viewport.cursor()));
        let list = list_rows(rows, focused, area.width, "No trending repositories");
        frame.render_widget(list, area);
    }

    fn draw_details(&self, frame: &mut Frame<'_>, area: Rect) {
        let block = self.pane_block(Pane::Details);
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let Some(details) = self.session.details() else {
            return;
        };
        let width = inner.width.max(1) as usize;
        let mut lines = vec![Line::from(vec![
            Span::styled(
                details.id.clone(),
                Style::default()
                    .fg(COLOR_ACCENT)
                    .add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                details.summary.clone(),
                Style::default().fg(COLOR_TEXT_SECONDARY),
            ),
        ])];
        lines.extend(wrap_plain(
            &details.description,
            width,
            Style::default().fg(COLOR_TEXT_PRIMARY),
        ));
        frame.render_widget(
            Paragraph::new(Text::from(lines)).wrap(Wrap { trim: false }),
            inner,
        );
    }
}

fn restore_terminal<B: Backend + io::Write>(terminal: &mut Terminal<B>) -> Result<()> {
    logging::set_terminal_active(false);
    disable_raw_mode()?;
    terminal.backend_mut().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

fn list_rows<I>(rows: I, focused: bool, width: u16, empty_label: &str) -> List<'static>
where
    I: Iterator<Item = (String, bool)>,
{
    let mut items: Vec<ListItem> = Vec::new();
    for (label, selected) in rows {
        let background = if selected && focused {
            COLOR_PANEL_SELECTED_BG
        } else {
            COLOR_PANEL_BG
        };
        let mut style = Style::default()
            .fg(if selected {
                COLOR_TEXT_PRIMARY
            } else {
                COLOR_TEXT_SECONDARY
            })
            .bg(background);
        if selected {
            style = style.add_modifier(Modifier::BOLD);
        }
        let mut lines = vec![Line::from(Span::styled(label, style))];
        pad_lines_to_width(&mut lines, width);
        items.push(ListItem::new(lines));
    }

    if items.is_empty() {
        let mut lines = vec![Line::from(Span::styled(
            empty_label.to_string(),
            Style::default()
                .fg(COLOR_TEXT_SECONDARY)
                .bg(COLOR_PANEL_BG)
                .add_modifier(Modifier::ITALIC),
        ))];
        pad_lines_to_width(&mut lines, width);
        items.push(ListItem::new(lines));
    }

    List::new(items)
}

fn wrap_plain(text: &str, width: usize, style: Style) -> Vec<Line<'static>> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    wrap(text, WrapOptions::new(width.max(1)))
        .into_iter()
        .map(|segment| Line::from(Span::styled(segment.into_owned(), style)))
        .collect()
}

fn pad_lines_to_width(lines: &mut [Line<'static>], width: u16) {
    let target = width as usize;
    if target == 0 {
        return;
    }
    for line in lines {
        let current: usize = line
            .spans
            .iter()
            .map(|span| UnicodeWidthStr::width(span.content.as_ref()))
            .sum();
        if current >= target {
            continue;
        }
        let style = line
            .spans
            .last()
            .map(|span| span.style)
            .unwrap_or_default();
        line.spans
            .push(Span::styled(" ".repeat(target - current), style));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::{LaunchTarget, Launcher};
    use crate::store::CategoryStore;
    use crate::trending::Item;
    use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
    use ratatui::backend::TestBackend;
    use std::sync::Arc;

    struct NoopLauncher;

    impl Launcher for NoopLauncher {
        fn launch(&self, _url: &str, _target: &LaunchTarget) -> Result<()> {
            Ok(())
        }
    }

    struct BrokenLauncher;

    impl Launcher for BrokenLauncher {
        fn launch(&self, _url: &str, _target: &LaunchTarget) -> Result<()> {
            anyhow::bail!("nothing installed")
        }
    }

    fn model_with(launcher: Arc<dyn Launcher>) -> Model {
        let store = CategoryStore::from_entries(vec![
            ("go", vec![Item::new("a/b", "desc1")]),
            ("rust", Vec::new()),
        ]);
        Model::new(Session::new(store, launcher, "firefox"), Options::default())
    }

    fn render(model: &mut Model) -> String {
        let mut terminal = Terminal::new(TestBackend::new(80, 20)).unwrap();
        terminal.draw(|frame| model.draw(frame)).unwrap();
        let buffer = terminal.backend().buffer();
        let width = buffer.area.width as usize;
        buffer
            .content
            .chunks(width)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn draws_three_titled_panes() {
        let mut model = model_with(Arc::new(NoopLauncher));
        let screen = render(&mut model);
        assert!(screen.contains("Language"));
        assert!(screen.contains("GitHub Trending"));
        assert!(screen.contains("Details"));
        assert!(screen.contains("[a/b] desc1"));
        assert!(screen.contains("★0"));
    }

    #[test]
    fn empty_category_renders_placeholder_and_clears_details() {
        let mut model = model_with(Arc::new(NoopLauncher));
        model.handle_key(&key(KeyCode::Char('j')));
        let screen = render(&mut model);
        assert_eq!(model.session().active_category(), Some("rust"));
        assert!(screen.contains("No trending repositories"));
        assert!(!screen.contains("desc1"));
    }

    #[test]
    fn open_reports_result_in_status_line() {
        let mut model = model_with(Arc::new(NoopLauncher));
        model.handle_key(&key(KeyCode::Char('l')));
        assert!(!model.handle_key(&key(KeyCode::Enter)));
        assert_eq!(model.status_kind, StatusKind::Success);
        assert_eq!(model.status_message, "Opened https://github.com/a/b");

        let mut broken = model_with(Arc::new(BrokenLauncher));
        broken.handle_key(&key(KeyCode::Right));
        broken.handle_key(&key(KeyCode::Enter));
        assert_eq!(broken.status_kind, StatusKind::Error);
        assert!(broken.status_message.starts_with("Failed to open"));
        broken.handle_key(&key(KeyCode::Left));
        assert_eq!(broken.status_kind, StatusKind::Info);
    }

    #[test]
    fn quit_keys_end_the_loop() {
        let mut model = model_with(Arc::new(NoopLauncher));
        assert!(model.handle_key(&key(KeyCode::Char('q'))));
        assert!(model.handle_key(&KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL)));
        assert!(!model.handle_key(&key(KeyCode::Char('x'))));
    }

    #[test]
    fn pad_lines_extends_to_width() {
        let mut lines = vec![Line::from(vec![Span::raw("abc")])];
        pad_lines_to_width(&mut lines, 6);
        assert_eq!(lines[0].spans.len(), 2);
        assert_eq!(lines[0].spans[1].content.as_ref(), "   ");
    }

    #[test]
    fn pad_lines_does_not_shorten() {
        let mut lines = vec![Line::from(vec![Span::raw("abcdef")])];
        pad_lines_to_width(&mut lines, 4);
        assert_eq!(lines[0].spans.len(), 1);
    }
}
