//! Kanban board interface.
//!
//! This module implements a board view with three fixed columns
//! (Backlog, In Progress, Completed) over the task store. Cards only
//! move between columns through store transitions, so the board can
//! never produce a state the CLI could not.

use std::collections::HashSet;
use std::io;
use std::time::Duration;

use chrono::{Local, TimeZone, Utc};
use crossterm::event::{self, Event, KeyCode, KeyModifiers};
use ratatui::{
    backend::Backend,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph, Wrap},
    Frame, Terminal,
};

use crate::cmd::format_due_relative;
use crate::fields::{Importance, Size, Status};
use crate::store::TaskStore;
use crate::task::{Task, TaskDraft};
use crate::tui::colors::{AMBER, DARK_GREEN, DIM_TEAL, SLATE_BLUE};

const COLUMN_COUNT: usize = 3;

/// Which value the modal input line is collecting.
#[derive(Debug, Clone, Copy, PartialEq)]
enum Prompt {
    /// Title for a new root task.
    AddRoot,
    /// Title for a new child of the given task.
    AddChild(u64),
    /// Achievement note for completing the given task.
    Complete(u64),
}

/// Main board application state
pub struct BoardApp {
    store: TaskStore,
    selected_column: usize,  // Current column (0-2)
    selected_card: usize,    // Selected card within the column
    column_scroll_offsets: [usize; COLUMN_COUNT],  // Scroll offset for each column
    status_message: String,
    show_task_detail: bool,  // Whether to show task detail popup
    prompt: Option<Prompt>,  // Active modal input line, if any
    prompt_text: String,     // Text typed into the input line
    confirm_delete: Option<u64>,  // Task awaiting delete confirmation

    // Task ids by column: Backlog (incl. child-active), In Progress, Completed
    columns: [Vec<u64>; COLUMN_COUNT],
}

impl BoardApp {
    /// Create a new BoardApp over an opened store.
    pub fn new(store: TaskStore) -> Self {
        let mut app = BoardApp {
            store,
            selected_column: 0,
            selected_card: 0,
            column_scroll_offsets: [0; COLUMN_COUNT],
            status_message: String::new(),
            show_task_detail: false,
            prompt: None,
            prompt_text: String::new(),
            confirm_delete: None,
            columns: Default::default(),
        };

        app.update_columns();
        app
    }

    /// Get column titles
    fn column_titles() -> [&'static str; COLUMN_COUNT] {
        ["Backlog", "In Progress", "Completed"]
    }

    /// Accent color for a column
    fn column_color(column_index: usize) -> Color {
        match column_index {
            0 => SLATE_BLUE,
            1 => AMBER,
            _ => DARK_GREEN,
        }
    }

    /// Rebuild the column contents from the store.
    ///
    /// Backlog and child-active tasks share the first column in collection
    /// order (newest first); the completed column is sorted by completion
    /// stamp, newest first.
    fn update_columns(&mut self) {
        // Clear all columns and reset scroll offsets
        for (i, column) in self.columns.iter_mut().enumerate() {
            column.clear();
            self.column_scroll_offsets[i] = 0;
        }

        let mut completed: Vec<(i64, u64)> = Vec::new();
        for task in self.store.tasks() {
            match task.status {
                Status::Backlog | Status::HasInProgressChild => self.columns[0].push(task.id),
                Status::InProgress => self.columns[1].push(task.id),
                Status::Completed => completed.push((task.completed_at_utc.unwrap_or(0), task.id)),
            }
        }
        completed.sort_by(|a, b| b.cmp(a));
        self.columns[2] = completed.into_iter().map(|(_, id)| id).collect();

        // Ensure selected card is valid
        self.clamp_selection();
    }

    /// Ensure selected column and card indices are valid
    fn clamp_selection(&mut self) {
        if self.selected_column >= self.columns.len() {
            self.selected_column = 0;
        }

        let column_len = self.columns[self.selected_column].len();
        if column_len == 0 {
            self.selected_card = 0;
            self.column_scroll_offsets[self.selected_column] = 0;
        } else if self.selected_card >= column_len {
            self.selected_card = column_len - 1;
        }
    }

    /// The task id under the cursor, if the column has any cards.
    fn selected_task_id(&self) -> Option<u64> {
        self.columns[self.selected_column].get(self.selected_card).copied()
    }

    /// Move the selection to wherever the task now sits on the board.
    fn select_task(&mut self, id: u64) {
        for (col, ids) in self.columns.iter().enumerate() {
            if let Some(pos) = ids.iter().position(|&t| t == id) {
                self.selected_column = col;
                self.selected_card = pos;
                return;
            }
        }
        self.clamp_selection();
    }

    /// Set a status message
    fn set_status_message(&mut self, msg: String) {
        self.status_message = msg;
    }

    /// Clear the status message
    fn clear_status_message(&mut self) {
        self.status_message.clear();
    }

    /// Handle keyboard input
    fn handle_input(&mut self) -> io::Result<bool> {
        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                // Handle modal input line
                if self.prompt.is_some() {
                    match key.code {
                        KeyCode::Esc => {
                            self.prompt = None;
                            self.prompt_text.clear();
                            self.clear_status_message();
                        }
                        KeyCode::Enter => {
                            self.submit_prompt();
                        }
                        KeyCode::Backspace => {
                            self.prompt_text.pop();
                        }
                        KeyCode::Char(c) => {
                            self.prompt_text.push(c);
                        }
                        _ => {}
                    }
                    return Ok(false);
                }

                // Handle delete confirmation popup
                if let Some(id) = self.confirm_delete {
                    match key.code {
                        KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                            self.confirm_delete = None;
                            self.delete_now(id);
                        }
                        KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                            self.confirm_delete = None;
                        }
                        _ => {}
                    }
                    return Ok(false);
                }

                self.clear_status_message();

                match key.code {
                    KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                        return Ok(true)
                    }
                    KeyCode::Char('q') => return Ok(true),
                    KeyCode::Esc => return Ok(true),

                    // Task detail popup
                    KeyCode::Enter => {
                        self.show_task_detail = !self.show_task_detail;
                    }

                    // Column navigation
                    KeyCode::Left => {
                        if self.selected_column > 0 {
                            self.selected_column -= 1;
                            self.clamp_selection();
                        }
                    }
                    KeyCode::Right => {
                        if self.selected_column < COLUMN_COUNT - 1 {
                            self.selected_column += 1;
                            self.clamp_selection();
                        }
                    }

                    // Card navigation within column
                    KeyCode::Up => {
                        if self.selected_card > 0 {
                            self.selected_card -= 1;
                        }
                    }
                    KeyCode::Down => {
                        let column_len = self.columns[self.selected_column].len();
                        if column_len > 0 && self.selected_card < column_len - 1 {
                            self.selected_card += 1;
                        }
                    }

                    // Add a root task / a child of the selection
                    KeyCode::Char('a') => {
                        self.prompt = Some(Prompt::AddRoot);
                        self.prompt_text.clear();
                    }
                    KeyCode::Char('n') => {
                        self.prompt_add_child();
                    }

                    // Lifecycle verbs
                    KeyCode::Char('s') => {
                        self.start_selected();
                    }
                    KeyCode::Char('c') => {
                        self.prompt_complete();
                    }
                    KeyCode::Char('r') => {
                        self.revert_or_reopen_selected();
                    }
                    KeyCode::Char('d') => {
                        self.request_delete();
                    }

                    // Help
                    KeyCode::Char('h') => {
                        self.set_status_message(
                            "Help: arrows: Navigate | Enter: Details | a/n: Add root/child | s: Start | c: Complete | r: Revert/Reopen | d: Delete | q: Quit".to_string(),
                        );
                    }

                    _ => {}
                }
            }
        }
        Ok(false)
    }

    /// Dispatch the confirmed input line to the action that opened it.
    fn submit_prompt(&mut self) {
        let Some(prompt) = self.prompt.take() else {
            return;
        };
        let text = std::mem::take(&mut self.prompt_text);
        match prompt {
            Prompt::AddRoot => self.add_from_prompt(text, None),
            Prompt::AddChild(parent) => self.add_from_prompt(text, Some(parent)),
            Prompt::Complete(id) => self.complete_from_prompt(id, text),
        }
    }

    fn add_from_prompt(&mut self, title: String, parent: Option<u64>) {
        let draft = TaskDraft {
            title,
            ..TaskDraft::default()
        };
        match self.store.add_task(draft, parent) {
            Ok(id) => {
                self.update_columns();
                // New tasks land at the front of the backlog column.
                self.selected_column = 0;
                self.selected_card = 0;
                match parent {
                    Some(p) => self.set_status_message(format!("Added task #{} under #{}", id, p)),
                    None => self.set_status_message(format!("Added task #{}", id)),
                }
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    fn complete_from_prompt(&mut self, id: u64, note: String) {
        let mut subtree = HashSet::new();
        self.store.collect_descendants(id, None, &mut subtree);
        let note = note.trim().to_string();
        let achievement = if note.is_empty() { None } else { Some(note.as_str()) };
        match self.store.set_status(id, Status::Completed, achievement) {
            Ok(()) => {
                self.update_columns();
                self.select_task(id);
                if subtree.is_empty() {
                    self.set_status_message(format!("Completed task #{}", id));
                } else {
                    self.set_status_message(format!(
                        "Completed task #{} and {} descendant(s)",
                        id,
                        subtree.len()
                    ));
                }
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    fn prompt_add_child(&mut self) {
        match self.selected_task_id() {
            Some(parent) => {
                self.prompt = Some(Prompt::AddChild(parent));
                self.prompt_text.clear();
            }
            None => self.set_status_message("No task selected".to_string()),
        }
    }

    fn prompt_complete(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.set_status_message("No task selected".to_string());
            return;
        };
        if self.store.get(id).map(|t| t.status) == Some(Status::Completed) {
            self.set_status_message(format!("Task #{} is already completed", id));
            return;
        }
        self.prompt = Some(Prompt::Complete(id));
        self.prompt_text.clear();
    }

    fn start_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.set_status_message("No task selected".to_string());
            return;
        };
        // Starting only makes sense from the backlog; a completed task
        // moving to in progress is the reopen verb, bound to 'r'.
        if self.store.get(id).map(|t| t.status) != Some(Status::Backlog) {
            self.set_status_message(format!("Task #{} is not in the backlog", id));
            return;
        }
        match self.store.set_status(id, Status::InProgress, None) {
            Ok(()) => {
                self.update_columns();
                self.select_task(id);
                self.set_status_message(format!("Started task #{}", id));
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    fn revert_or_reopen_selected(&mut self) {
        let Some(id) = self.selected_task_id() else {
            self.set_status_message("No task selected".to_string());
            return;
        };
        let Some(status) = self.store.get(id).map(|t| t.status) else {
            return;
        };
        let (target, verb) = match status {
            Status::InProgress => (Status::Backlog, "Reverted"),
            Status::Completed => (Status::InProgress, "Reopened"),
            _ => {
                self.set_status_message(format!(
                    "Task #{} is neither in progress nor completed",
                    id
                ));
                return;
            }
        };
        match self.store.set_status(id, target, None) {
            Ok(()) => {
                self.update_columns();
                self.select_task(id);
                self.set_status_message(format!("{} task #{}", verb, id));
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    fn request_delete(&mut self) {
        match self.selected_task_id() {
            Some(id) => self.confirm_delete = Some(id),
            None => self.set_status_message("No task selected".to_string()),
        }
    }

    fn delete_now(&mut self, id: u64) {
        let mut subtree = HashSet::new();
        self.store.collect_descendants(id, None, &mut subtree);
        match self.store.delete_task(id) {
            Ok(()) => {
                self.update_columns();
                if subtree.is_empty() {
                    self.set_status_message(format!("Deleted task #{}", id));
                } else {
                    self.set_status_message(format!(
                        "Deleted task #{} and {} descendant(s)",
                        id,
                        subtree.len()
                    ));
                }
            }
            Err(e) => self.set_status_message(format!("Error: {}", e)),
        }
    }

    /// Render the board
    fn render(&mut self, f: &mut Frame) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3), // Header
                Constraint::Min(0),    // Board
                Constraint::Length(1), // Status bar
            ])
            .split(f.area());

        self.render_header(f, chunks[0]);
        self.render_board(f, chunks[1]);
        self.render_status_bar(f, chunks[2]);

        // Render popups over the board
        if self.show_task_detail {
            self.render_task_detail_popup(f);
        }
        if self.confirm_delete.is_some() {
            self.render_confirm_popup(f);
        }
    }

    /// Render the header
    fn render_header(&self, f: &mut Frame, area: Rect) {
        let counts = format!(
            "{} backlog | {} in progress | {} completed",
            self.columns[0].len(),
            self.columns[1].len(),
            self.columns[2].len()
        );

        let header_text = vec![Line::from(vec![
            Span::styled("TASK BOARD", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  "),
            Span::styled(
                counts,
                Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
            ),
        ])];

        let header_block = Paragraph::new(header_text)
            .block(Block::default().borders(Borders::ALL))
            .alignment(Alignment::Center);
        f.render_widget(header_block, area);
    }

    /// Render the three columns
    fn render_board(&mut self, f: &mut Frame, area: Rect) {
        let constraints: Vec<Constraint> = (0..COLUMN_COUNT)
            .map(|_| Constraint::Percentage(100 / COLUMN_COUNT as u16))
            .collect();

        let columns_layout = Layout::default()
            .direction(Direction::Horizontal)
            .constraints(constraints)
            .split(area);

        let column_titles = Self::column_titles();

        for (i, &column_area) in columns_layout.iter().enumerate() {
            self.render_column(f, column_area, i, column_titles[i]);
        }
    }

    /// Render a single column
    fn render_column(&mut self, f: &mut Frame, area: Rect, column_index: usize, title: &str) {
        let is_selected = column_index == self.selected_column;
        let accent = Self::column_color(column_index);

        let border_style = if is_selected {
            Style::default().fg(accent).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(border_style);

        let inner = block.inner(area);
        f.render_widget(block, area);

        // Render cards in this column
        let cards = &self.columns[column_index];
        if cards.is_empty() {
            return;
        }

        // Fixed-height cards so titles stay readable
        let card_height = 5;
        let available_height = inner.height as usize;
        let visible_cards = available_height / card_height;

        // Calculate scroll offset for this column
        let scroll_offset = if is_selected {
            // Update scroll to ensure selected card is visible
            let start_visible = self.column_scroll_offsets[column_index];
            let end_visible = start_visible + visible_cards;

            if self.selected_card < start_visible {
                // Scroll up
                self.column_scroll_offsets[column_index] = self.selected_card;
                self.selected_card
            } else if self.selected_card >= end_visible && end_visible > 0 {
                // Scroll down
                let new_offset = self.selected_card - visible_cards + 1;
                self.column_scroll_offsets[column_index] = new_offset;
                new_offset
            } else {
                start_visible
            }
        } else {
            self.column_scroll_offsets[column_index]
        };

        let mut current_y = 0;
        let mut rendered_cards = 0;

        // Start rendering from the scroll offset
        for (card_index, &task_id) in cards.iter().enumerate().skip(scroll_offset) {
            if let Some(task) = self.store.get(task_id) {
                // Check if this card would fit
                if current_y + card_height > available_height {
                    break;
                }

                let is_this_card_selected = is_selected && card_index == self.selected_card;

                let card_area = Rect {
                    x: inner.x,
                    y: inner.y + current_y as u16,
                    width: inner.width,
                    height: card_height as u16,
                };

                self.render_card(f, card_area, task, is_this_card_selected);

                current_y += card_height;
                rendered_cards += 1;
            }
        }

        // Show scroll indicators
        if scroll_offset > 0 {
            let indicator = Paragraph::new(format!("▲ +{} above", scroll_offset))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y,
                    width: inner.width,
                    height: 1,
                },
            );
        }

        let remaining = cards.len() - scroll_offset - rendered_cards;
        if remaining > 0 {
            let indicator = Paragraph::new(format!("▼ +{} below", remaining))
                .style(Style::default().fg(Color::Cyan));
            f.render_widget(
                indicator,
                Rect {
                    x: inner.x,
                    y: inner.y + inner.height - 1,
                    width: inner.width,
                    height: 1,
                },
            );
        }
    }

    /// Render a single task card
    fn render_card(&self, f: &mut Frame, area: Rect, task: &Task, is_selected: bool) {
        let style = if is_selected {
            Style::default()
                .bg(status_color(task.status))
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().bg(Color::DarkGray)
        };

        let mut card_text = vec![Line::from(format!("#{}", task.id))];

        // Title wrapped to at most two lines (accounting for borders)
        let available_width = area.width.saturating_sub(2) as usize;
        for line in wrap_title(&task.title, available_width, 2) {
            card_text.push(Line::from(line));
        }

        // Bottom line: status label, plus the achievement for completed
        // cards or the relative due date otherwise
        let today = Local::now().date_naive();
        let footer = if task.status == Status::Completed {
            if task.achievement.is_empty() {
                task.status.label().to_string()
            } else {
                format!("{} | {}", task.status.label(), truncate(&task.achievement, 24))
            }
        } else if task.due.is_some() {
            format!(
                "{} | due {}",
                task.status.label(),
                format_due_relative(task.due, today)
            )
        } else {
            task.status.label().to_string()
        };
        card_text.push(Line::from(footer));

        let card_block = Paragraph::new(card_text)
            .block(Block::default().borders(Borders::ALL))
            .style(style)
            .wrap(Wrap { trim: true });

        f.render_widget(card_block, area);
    }

    /// Render the status bar
    fn render_status_bar(&self, f: &mut Frame, area: Rect) {
        let status_text = if let Some(prompt) = self.prompt {
            let label = match prompt {
                Prompt::AddRoot => "New task title".to_string(),
                Prompt::AddChild(parent) => format!("New child of #{}", parent),
                Prompt::Complete(id) => format!("Achievement for #{}", id),
            };
            format!(
                "{}: {} | Enter to confirm, Esc to cancel",
                label, self.prompt_text
            )
        } else if !self.status_message.is_empty() {
            self.status_message.clone()
        } else {
            let total_tasks: usize = self.columns.iter().map(|col| col.len()).sum();
            format!(
                "Tasks: {} | a: Add | n: Add child | s: Start | c: Complete | r: Revert/Reopen | d: Delete | h: Help",
                total_tasks
            )
        };

        let accent = Self::column_color(self.selected_column);
        let text_color = match accent {
            AMBER => Color::Rgb(20, 20, 20),
            _ => Color::White,
        };

        let status = Paragraph::new(status_text)
            .style(Style::default().bg(accent).fg(text_color))
            .alignment(Alignment::Left);

        f.render_widget(status, area);
    }

    /// Render the task detail popup
    fn render_task_detail_popup(&self, f: &mut Frame) {
        let Some(task_id) = self.selected_task_id() else {
            return;
        };
        if let Some(task) = self.store.get(task_id) {
            // Create popup area (centered, 80% of screen)
            let popup_area = {
                let area = f.area();
                let popup_width = (area.width * 80) / 100;
                let popup_height = (area.height * 80) / 100;
                let x = (area.width - popup_width) / 2;
                let y = (area.height - popup_height) / 2;
                Rect::new(x, y, popup_width, popup_height)
            };

            // Clear the background
            f.render_widget(Clear, popup_area);

            let today = Local::now().date_naive();
            let parent_str = match task.parent {
                Some(pid) => match self.store.get(pid) {
                    Some(p) => format!("{} ({})", pid, p.title),
                    None => pid.to_string(),
                },
                None => "-".to_string(),
            };
            let children_str = if task.children.is_empty() {
                "-".to_string()
            } else {
                task.children
                    .iter()
                    .map(|c| format!("#{}", c))
                    .collect::<Vec<_>>()
                    .join(", ")
            };

            let mut detail_lines = vec![
                Line::from(vec![Span::styled(
                    format!("Task #{}: {}", task.id, task.title),
                    Style::default().add_modifier(Modifier::BOLD),
                )]),
                Line::from(""),
                Line::from(format!("Status:       {}", task.status.label())),
                Line::from(format!(
                    "Size:         {}",
                    task.size.map(Size::label).unwrap_or("-")
                )),
                Line::from(format!(
                    "Importance:   {}",
                    task.importance.map(Importance::label).unwrap_or("-")
                )),
                Line::from(format!(
                    "Due:          {}",
                    format_due_relative(task.due, today)
                )),
                Line::from(format!("Parent:       {}", parent_str)),
                Line::from(format!("Children:     {}", children_str)),
                Line::from(format!(
                    "Collapsed:    {}",
                    if task.collapsed { "yes" } else { "no" }
                )),
            ];

            if let Some(ts) = task.completed_at_utc {
                let stamp = Utc
                    .timestamp_opt(ts, 0)
                    .single()
                    .map(|t| t.to_rfc3339())
                    .unwrap_or_default();
                detail_lines.push(Line::from(format!("Completed:    {}", stamp)));
                detail_lines.push(Line::from(format!("Achievement:  {}", task.achievement)));
            }

            detail_lines.push(Line::from(""));
            detail_lines.push(Line::from("Description:"));
            detail_lines.push(Line::from(if task.description.is_empty() {
                "-".to_string()
            } else {
                task.description.clone()
            }));

            let popup_block = Block::default()
                .borders(Borders::ALL)
                .title("Task Details (Press Enter to close)")
                .title_alignment(Alignment::Center)
                .border_style(
                    Style::default()
                        .fg(status_color(task.status))
                        .add_modifier(Modifier::BOLD),
                );

            let popup_paragraph = Paragraph::new(detail_lines)
                .block(popup_block)
                .wrap(Wrap { trim: true })
                .style(Style::default().bg(Color::Black));

            f.render_widget(popup_paragraph, popup_area);
        }
    }

    /// Render the delete confirmation popup
    fn render_confirm_popup(&self, f: &mut Frame) {
        let Some(id) = self.confirm_delete else {
            return;
        };
        let title = self
            .store
            .get(id)
            .map(|t| t.title.clone())
            .unwrap_or_default();
        let mut subtree = HashSet::new();
        self.store.collect_descendants(id, None, &mut subtree);

        let popup_area = {
            let area = f.area();
            let popup_width = (area.width * 60) / 100;
            let popup_height = 7;
            let x = (area.width - popup_width) / 2;
            let y = area.height.saturating_sub(popup_height) / 2;
            Rect::new(x, y, popup_width, popup_height)
        };
        f.render_widget(Clear, popup_area);

        let question = if subtree.is_empty() {
            format!("Delete task #{} \"{}\"?", id, truncate(&title, 40))
        } else {
            format!(
                "Delete task #{} \"{}\" and {} descendant(s)?",
                id,
                truncate(&title, 40),
                subtree.len()
            )
        };

        let lines = vec![
            Line::from(""),
            Line::from(question),
            Line::from(""),
            Line::from("Press 'y' to confirm, 'n' to cancel"),
        ];

        let popup = Paragraph::new(lines)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .title("Confirm Action")
                    .title_alignment(Alignment::Center)
                    .border_style(Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)),
            )
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .style(Style::default().bg(Color::Black));

        f.render_widget(popup, popup_area);
    }

    /// Main event loop
    pub fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> io::Result<()> {
        loop {
            terminal.draw(|f| self.render(f))?;

            if self.handle_input()? {
                break;
            }
        }
        Ok(())
    }
}

/// Card accent by task status.
fn status_color(status: Status) -> Color {
    match status {
        Status::Backlog => SLATE_BLUE,
        Status::InProgress => AMBER,
        Status::HasInProgressChild => DIM_TEAL,
        Status::Completed => DARK_GREEN,
    }
}

/// Word-wrap a title into at most `max_lines` lines of `width` characters;
/// anything past the last line is dropped.
fn wrap_title(title: &str, width: usize, max_lines: usize) -> Vec<String> {
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    for word in title.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.len() + 1 + word.len() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
            if lines.len() >= max_lines {
                break;
            }
        }
    }
    if !current.is_empty() && lines.len() < max_lines {
        lines.push(current);
    }
    lines
}

fn truncate(s: &str, width: usize) -> String {
    if s.chars().count() <= width {
        return s.to_string();
    }
    let mut out: String = s.chars().take(width.saturating_sub(1)).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStorage;

    fn app_with(titles: &[&str]) -> BoardApp {
        let mut store = TaskStore::open(Box::new(MemoryStorage::default()));
        for t in titles {
            store
                .add_task(
                    TaskDraft {
                        title: t.to_string(),
                        ..TaskDraft::default()
                    },
                    None,
                )
                .unwrap();
        }
        BoardApp::new(store)
    }

    #[test]
    fn test_columns_follow_status() {
        let mut app = app_with(&["one", "two", "three"]);
        // ids are 1..=3; newest first in the collection
        app.store.set_status(2, Status::InProgress, None).unwrap();
        app.store.set_status(3, Status::Completed, None).unwrap();
        app.update_columns();
        assert_eq!(app.columns[0], vec![1]);
        assert_eq!(app.columns[1], vec![2]);
        assert_eq!(app.columns[2], vec![3]);
    }

    #[test]
    fn test_flagged_parent_shares_backlog_column() {
        let mut app = app_with(&["parent"]);
        let c = app
            .store
            .add_task(
                TaskDraft {
                    title: "child".to_string(),
                    ..TaskDraft::default()
                },
                Some(1),
            )
            .unwrap();
        app.store.set_status(c, Status::InProgress, None).unwrap();
        app.update_columns();
        assert_eq!(app.columns[0], vec![1]);
        assert_eq!(app.columns[1], vec![c]);
    }

    #[test]
    fn test_completed_column_newest_first() {
        let mut app = app_with(&["first", "second"]);
        app.store.set_status(1, Status::Completed, None).unwrap();
        app.store.set_status(2, Status::Completed, None).unwrap();
        app.update_columns();
        // Same-second stamps fall back to id order, so the later
        // completion still lands on top.
        assert_eq!(app.columns[2], vec![2, 1]);
    }

    #[test]
    fn test_prompt_submit_adds_and_selects() {
        let mut app = app_with(&[]);
        app.prompt = Some(Prompt::AddRoot);
        app.prompt_text = "from board".to_string();
        app.submit_prompt();
        assert_eq!(app.prompt, None);
        assert_eq!(app.store.tasks().len(), 1);
        assert_eq!(app.store.tasks()[0].title, "from board");
        assert_eq!(app.columns[0], vec![1]);
        assert_eq!((app.selected_column, app.selected_card), (0, 0));
        assert!(app.status_message.contains("Added task #1"));
    }

    #[test]
    fn test_prompt_submit_blank_title_reports_error() {
        let mut app = app_with(&[]);
        app.prompt = Some(Prompt::AddRoot);
        app.prompt_text = "   ".to_string();
        app.submit_prompt();
        assert!(app.store.tasks().is_empty());
        assert!(app.status_message.starts_with("Error:"));
    }

    #[test]
    fn test_select_task_follows_board_position() {
        let mut app = app_with(&["a", "b", "c"]);
        app.store.set_status(2, Status::InProgress, None).unwrap();
        app.update_columns();
        app.select_task(2);
        assert_eq!(app.selected_column, 1);
        assert_eq!(app.selected_card, 0);
        app.select_task(3);
        assert_eq!(app.selected_column, 0);
        assert_eq!(app.selected_card, 0);
    }

    #[test]
    fn test_wrap_title_limits_lines() {
        assert_eq!(wrap_title("short", 20, 2), vec!["short"]);
        assert_eq!(
            wrap_title("two words here", 9, 2),
            vec!["two words", "here"]
        );
        let wrapped = wrap_title("one two three four five six", 7, 2);
        assert_eq!(wrapped.len(), 2);
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate("short", 10), "short");
        assert_eq!(truncate("a longer string", 8), "a longe…");
    }
}
