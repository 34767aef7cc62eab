//! Main TUI application state and logic

use crate::parser::{ParseOutcome, ParseStatus};
use crate::ui::panes::{
    render_source_pane, render_status_bar, render_tree_pane, StatusRenderData, TreeRow,
};
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind};
use ratatui::{
    backend::Backend,
    layout::{Constraint, Direction, Layout},
    Frame, Terminal,
};
use std::io;

/// The main application state
pub struct App {
    /// The parse being browsed
    pub outcome: ParseOutcome,

    /// The source text the tree was built from
    pub source_code: String,

    /// Tree nodes in pre-order, one per visible row
    pub rows: Vec<TreeRow>,

    /// Index into `rows` of the selected node
    pub selected: usize,

    /// Per-pane scroll offsets
    pub tree_scroll: usize,
    pub source_scroll: usize,

    /// Rows moved by PgUp/PgDn, updated from the tree pane height on render
    pub page_size: usize,

    /// Whether the app should quit
    pub should_quit: bool,

    /// Status message to display
    pub status_message: String,
}

impl App {
    /// Create a new app for a finished parse. When the parse produced any
    /// diagnostic, the first one is selected.
    pub fn new(outcome: ParseOutcome, source_code: String) -> Self {
        let rows = TreeRow::collect(&outcome.tree);
        let mut app = App {
            outcome,
            source_code,
            rows,
            selected: 0,
            tree_scroll: 0,
            source_scroll: 0,
            page_size: 10,
            should_quit: false,
            status_message: String::from("Ready!"),
        };
        if let Some(first) = app.diagnostic_rows().first() {
            app.selected = *first;
            app.status_message = app.selected_message();
        }
        app
    }

    /// Run the TUI application
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.should_quit {
                break;
            }

            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press {
                    self.handle_key_event(key);
                }
            }
        }

        Ok(())
    }

    /// Render the UI
    fn render(&mut self, frame: &mut Frame) {
        let size = frame.area();

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Min(0), Constraint::Length(1)])
            .split(size);

        // Tree (left) | Source (right)
        let columns = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
            .split(main_chunks[0]);

        self.page_size = columns[0].height.saturating_sub(2).max(1) as usize;

        let tree = &self.outcome.tree;
        render_tree_pane(
            frame,
            columns[0],
            tree,
            &self.rows,
            self.selected,
            &mut self.tree_scroll,
        );

        let (line, is_error) = match self.rows.get(self.selected) {
            Some(row) => {
                let node = tree.node(row.id);
                (node.location.line, node.kind.is_diagnostic())
            }
            None => (0, false),
        };
        render_source_pane(
            frame,
            columns[1],
            &self.source_code,
            line,
            is_error,
            &mut self.source_scroll,
        );

        render_status_bar(
            frame,
            main_chunks[1],
            &StatusRenderData {
                message: &self.status_message,
                selected: self.selected,
                node_count: self.rows.len(),
                diagnostic_count: tree.diagnostics().count(),
                status: self.outcome.status,
            },
        );
    }

    /// Handle keyboard events
    pub fn handle_key_event(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => {
                self.should_quit = true;
            }
            KeyCode::Up => self.select(self.selected.saturating_sub(1)),
            KeyCode::Down => self.select(self.selected.saturating_add(1)),
            KeyCode::PageUp => self.select(self.selected.saturating_sub(self.page_size)),
            KeyCode::PageDown => self.select(self.selected.saturating_add(self.page_size)),
            KeyCode::Home => self.select(0),
            KeyCode::End => self.select(usize::MAX),
            KeyCode::Char('n') => self.next_diagnostic(),
            KeyCode::Char('N') => self.previous_diagnostic(),
            _ => {}
        }
    }

    /// Move the selection, clamped to the last row.
    fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
        self.status_message = self.selected_message();
    }

    /// Row indices of error and warning nodes, in pre-order
    fn diagnostic_rows(&self) -> Vec<usize> {
        let tree = &self.outcome.tree;
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| tree.kind(row.id).is_diagnostic())
            .map(|(idx, _)| idx)
            .collect()
    }

    fn next_diagnostic(&mut self) {
        let rows = self.diagnostic_rows();
        match rows.iter().find(|&&r| r > self.selected).or(rows.first()) {
            Some(&row) => self.select(row),
            None => self.status_message = "No diagnostics".to_string(),
        }
    }

    fn previous_diagnostic(&mut self) {
        let rows = self.diagnostic_rows();
        match rows.iter().rev().find(|&&r| r < self.selected).or(rows.last()) {
            Some(&row) => self.select(row),
            None => self.status_message = "No diagnostics".to_string(),
        }
    }

    /// Status line text for the selected node
    fn selected_message(&self) -> String {
        let Some(row) = self.rows.get(self.selected) else {
            return String::new();
        };
        let tree = &self.outcome.tree;
        let node = tree.node(row.id);
        match (&node.diagnostic, self.outcome.status) {
            (Some(message), _) => format!("{}: {}", node.location, message),
            (None, ParseStatus::Completed) => tree.describe(row.id),
            (None, status) => format!("{} [{}]", tree.describe(row.id), status),
        }
    }
}
