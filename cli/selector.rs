//! Interactive cursor interface over the core tree model.
//!
//! The selector is a plain consumer of `flatten` and the selection
//! operations: every piece of tree state lives in the [`FileTree`], and this
//! struct only holds cursor, scroll and search state for one session.

use anyhow::{Context, Result};
use codepick_core::select::{self, FilterError};
use codepick_core::tree::{FileTree, NodeId};
use crossterm::cursor::{Hide, MoveTo, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use crossterm::style::{Attribute, Print, SetAttribute};
use crossterm::terminal::{
    self, Clear, ClearType, EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode,
    enable_raw_mode,
};
use crossterm::{execute, queue};
use std::io::{self, Write};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorOutcome {
    Done { copy_to_clipboard: bool },
    Cancelled,
}

/// Run the interactive selector until the user confirms or cancels.
pub fn run(tree: &mut FileTree) -> Result<SelectorOutcome> {
    let _guard = TerminalGuard::enter().context("Failed to initialize the terminal")?;
    let mut selector = Selector::new(tree);
    selector.event_loop(tree)
}

/// Restores the terminal on every exit path, panics included.
struct TerminalGuard;

impl TerminalGuard {
    fn enter() -> io::Result<Self> {
        enable_raw_mode()?;
        execute!(io::stdout(), EnterAlternateScreen, Hide)?;
        Ok(TerminalGuard)
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = execute!(io::stdout(), LeaveAlternateScreen, Show);
        let _ = disable_raw_mode();
    }
}

struct Selector {
    cursor: usize,
    scroll: usize,
    visible: Vec<(NodeId, usize)>,
    search_mode: bool,
    search_buffer: String,
    active_queries: Vec<String>,
    status: String,
    copy_to_clipboard: bool,
}

impl Selector {
    fn new(tree: &FileTree) -> Self {
        Selector {
            cursor: 0,
            scroll: 0,
            visible: tree.flatten(true),
            search_mode: false,
            search_buffer: String::new(),
            active_queries: Vec::new(),
            status: String::new(),
            copy_to_clipboard: true,
        }
    }

    fn event_loop(&mut self, tree: &mut FileTree) -> Result<SelectorOutcome> {
        loop {
            self.draw(tree)?;
            let Event::Key(key) = event::read()? else {
                continue;
            };
            if key.kind != KeyEventKind::Press {
                continue;
            }
            if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                return Ok(SelectorOutcome::Cancelled);
            }
            let outcome = if self.search_mode {
                self.handle_search_key(tree, key.code)
            } else {
                self.handle_key(tree, key.code)
            };
            if let Some(outcome) = outcome {
                return Ok(outcome);
            }
        }
    }

    fn handle_key(&mut self, tree: &mut FileTree, code: KeyCode) -> Option<SelectorOutcome> {
        match code {
            KeyCode::Up => self.cursor = self.cursor.saturating_sub(1),
            KeyCode::Down => {
                if self.cursor + 1 < self.visible.len() {
                    self.cursor += 1;
                }
            }
            KeyCode::Right => {
                if let Some(id) = self.current() {
                    let node = tree.node(id);
                    if node.is_dir && !node.expanded {
                        select::toggle_expand(tree, id);
                        self.refresh(tree);
                    }
                }
            }
            KeyCode::Left => {
                if let Some(id) = self.current() {
                    let node = tree.node(id);
                    if node.is_dir && node.expanded {
                        select::toggle_expand(tree, id);
                        self.refresh(tree);
                    } else if let Some(parent) = node.parent {
                        // Jump to the parent line, unless it is the root.
                        if let Some(index) =
                            self.visible.iter().position(|&(vid, _)| vid == parent)
                        {
                            self.cursor = index;
                        }
                    }
                }
            }
            KeyCode::Char(' ') => {
                if let Some(id) = self.current() {
                    select::toggle_selection(tree, id);
                }
            }
            KeyCode::Char('a') | KeyCode::Char('A') => select::select_all(tree, true),
            KeyCode::Char('n') | KeyCode::Char('N') => select::select_all(tree, false),
            KeyCode::Char('e') | KeyCode::Char('E') => {
                select::expand_all(tree, true);
                self.refresh(tree);
            }
            KeyCode::Char('c') | KeyCode::Char('C') => {
                select::expand_all(tree, false);
                self.refresh(tree);
            }
            KeyCode::Char('t') | KeyCode::Char('T') => {
                if let Some(id) = self.current() {
                    select::toggle_current_dir_only(tree, id);
                }
            }
            KeyCode::Char('b') | KeyCode::Char('B') => {
                self.copy_to_clipboard = !self.copy_to_clipboard;
            }
            KeyCode::Char('/') => {
                self.search_mode = true;
                self.search_buffer = self.active_queries.join(" ");
                self.status.clear();
            }
            KeyCode::Char('d') | KeyCode::Char('D') | KeyCode::Enter => {
                return Some(SelectorOutcome::Done {
                    copy_to_clipboard: self.copy_to_clipboard,
                });
            }
            KeyCode::Esc => {
                if self.active_queries.is_empty() {
                    return Some(SelectorOutcome::Cancelled);
                }
                // Esc with an active filter clears it instead of exiting.
                self.active_queries.clear();
                self.status.clear();
                self.refresh(tree);
            }
            KeyCode::Char('x') | KeyCode::Char('X') => {
                return Some(SelectorOutcome::Cancelled);
            }
            _ => {}
        }
        None
    }

    fn handle_search_key(
        &mut self,
        tree: &mut FileTree,
        code: KeyCode,
    ) -> Option<SelectorOutcome> {
        match code {
            KeyCode::Esc => {
                self.search_mode = false;
                self.search_buffer.clear();
                self.active_queries.clear();
                self.status.clear();
                self.refresh(tree);
            }
            KeyCode::Enter => {
                self.search_mode = false;
                self.active_queries = split_queries(&self.search_buffer);
                self.refresh(tree);
            }
            KeyCode::Backspace => {
                self.search_buffer.pop();
            }
            KeyCode::Char(c) => self.search_buffer.push(c),
            _ => {}
        }
        None
    }

    fn current(&self) -> Option<NodeId> {
        self.visible.get(self.cursor).map(|&(id, _)| id)
    }

    /// Recompute the visible list after any structural change, re-applying
    /// the active search filter if there is one.
    fn refresh(&mut self, tree: &mut FileTree) {
        if self.active_queries.is_empty() {
            self.visible = tree.flatten(true);
        } else {
            let original = tree.flatten(true);
            match select::apply_search_filter(tree, &self.active_queries, false, &original) {
                Ok(filtered) => {
                    self.visible = filtered;
                    self.status.clear();
                }
                Err(FilterError::NoMatches) => {
                    // Deliberate: no matches empties the view rather than
                    // falling back to the unfiltered list.
                    self.visible.clear();
                    self.status = FilterError::NoMatches.to_string();
                }
                Err(err @ FilterError::InvalidPattern(_)) => {
                    self.status = err.to_string();
                }
            }
        }
        if self.cursor >= self.visible.len() {
            self.cursor = self.visible.len().saturating_sub(1);
        }
    }

    fn draw(&mut self, tree: &FileTree) -> Result<()> {
        let (width, height) = terminal::size()?;
        let width = width as usize;
        let max_rows = (height as usize).saturating_sub(6).max(1);

        if self.cursor < self.scroll {
            self.scroll = self.cursor;
        } else if self.cursor >= self.scroll + max_rows {
            self.scroll = self.cursor + 1 - max_rows;
        }

        let mut stdout = io::stdout();
        queue!(stdout, Clear(ClearType::All), MoveTo(0, 0))?;

        let selected = tree.count_selected();
        let total = self
            .visible
            .iter()
            .filter(|&&(id, _)| !tree.node(id).is_dir)
            .count();
        queue!(
            stdout,
            SetAttribute(Attribute::Bold),
            Print(truncate(
                &format!("Selected files: {}/{}", selected, total),
                width
            )),
            SetAttribute(Attribute::Reset)
        )?;

        let window_end = (self.scroll + max_rows).min(self.visible.len());
        for (row, &(id, depth)) in self.visible[self.scroll..window_end].iter().enumerate() {
            let node = tree.node(id);
            let prefix = if node.is_dir {
                if node.expanded { "+ " } else { "- " }
            } else if node.selected {
                "✓ "
            } else {
                "☐ "
            };
            let line = format!("{}{}{}", "  ".repeat(depth), prefix, node.name);
            queue!(stdout, MoveTo(0, (row + 1) as u16))?;
            if row + self.scroll == self.cursor {
                queue!(
                    stdout,
                    SetAttribute(Attribute::Reverse),
                    Print(truncate(&line, width)),
                    SetAttribute(Attribute::Reset)
                )?;
            } else {
                queue!(stdout, Print(truncate(&line, width)))?;
            }
        }

        let footer_top = height.saturating_sub(4);
        queue!(stdout, MoveTo(0, footer_top))?;
        if self.search_mode {
            queue!(
                stdout,
                Print(truncate(&format!("Search: {}_", self.search_buffer), width))
            )?;
        } else if !self.status.is_empty() {
            queue!(stdout, Print(truncate(&self.status, width)))?;
        }
        queue!(
            stdout,
            MoveTo(0, footer_top + 1),
            Print(truncate(
                "↑/↓: Navigate  SPACE: Select  ←/→: Close/Open folder  /: Search",
                width
            )),
            MoveTo(0, footer_top + 2),
            Print(truncate(
                "T: Toggle dir only  E: Expand all  C: Collapse all",
                width
            )),
            MoveTo(0, footer_top + 3),
            Print(truncate(
                &format!(
                    "A: All  N: None  B: Clipboard({})  D: Done  X: Exit",
                    if self.copy_to_clipboard { "ON" } else { "OFF" }
                ),
                width
            ))
        )?;

        stdout.flush()?;
        Ok(())
    }
}

/// The raw search input, split on commas and spaces into glob queries.
fn split_queries(input: &str) -> Vec<String> {
    input
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(str::to_string)
        .collect()
}

fn truncate(text: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    if text.chars().count() < width {
        return text.to_string();
    }
    let mut out: String = text.chars().take(width - 1).collect();
    out.push('…');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_queries_on_commas_and_spaces() {
        assert_eq!(split_queries("*.py, *.rs  main*"), vec!["*.py", "*.rs", "main*"]);
        assert_eq!(split_queries("   "), Vec::<String>::new());
        assert_eq!(split_queries(""), Vec::<String>::new());
    }

    #[test]
    fn test_truncate_appends_ellipsis() {
        assert_eq!(truncate("short", 40), "short");
        assert_eq!(truncate("a-very-long-name", 6), "a-ver…");
        assert_eq!(truncate("anything", 0), "");
    }
}
