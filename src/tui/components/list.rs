use crossterm::event::{KeyCode, KeyEvent, MouseEvent, MouseEventKind};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState},
};

/// One line of the results list: a headline, a dimmed detail and an optional colored badge.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub title: String,
    pub detail: String,
    pub badge: Option<(String, Color)>,
}

impl ResultRow {
    pub fn new(title: impl Into<String>, detail: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            detail: detail.into(),
            badge: None,
        }
    }

    pub fn with_badge(mut self, badge: impl Into<String>, color: Color) -> Self {
        self.badge = Some((badge.into(), color));
        self
    }
}

pub struct ResultList {
    pub rows: Vec<ResultRow>,
    pub state: ListState,
    viewport_size: usize,
}

impl ResultList {
    pub fn new(rows: Vec<ResultRow>) -> Self {
        let mut state = ListState::default();
        if !rows.is_empty() {
            state.select(Some(0));
        }

        Self {
            rows,
            state,
            viewport_size: 0,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Up => {
                self.previous();
                true
            }
            KeyCode::Down => {
                self.next();
                true
            }
            KeyCode::PageDown => {
                self.step(self.viewport_size.max(1) as isize);
                true
            }
            KeyCode::PageUp => {
                self.step(-(self.viewport_size.max(1) as isize));
                true
            }
            KeyCode::Home => {
                self.select(0);
                true
            }
            KeyCode::End => {
                self.select(self.rows.len().saturating_sub(1));
                true
            }
            _ => false,
        }
    }

    pub fn handle_mouse(&mut self, mouse: MouseEvent) -> bool {
        match mouse.kind {
            MouseEventKind::ScrollUp => {
                self.step(-1);
                true
            }
            MouseEventKind::ScrollDown => {
                self.step(1);
                true
            }
            _ => false,
        }
    }

    pub fn next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(i) => (i + 1) % self.rows.len(),
            None => 0,
        };
        self.select(i);
    }

    pub fn previous(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        let i = match self.state.selected() {
            Some(0) | None => self.rows.len() - 1,
            Some(i) => i - 1,
        };
        self.select(i);
    }

    /// Move by `delta` rows, clamped to the list without wrapping.
    fn step(&mut self, delta: isize) {
        if self.rows.is_empty() {
            return;
        }
        let current = self.state.selected().unwrap_or(0) as isize;
        let last = self.rows.len() as isize - 1;
        self.select((current + delta).clamp(0, last) as usize);
    }

    fn select(&mut self, index: usize) {
        if self.rows.is_empty() {
            return;
        }
        self.state.select(Some(index.min(self.rows.len() - 1)));
        self.adjust_offset();
    }

    pub fn selected(&self) -> Option<usize> {
        self.state.selected().filter(|&i| i < self.rows.len())
    }

    pub fn render(&mut self, f: &mut Frame, area: Rect, title: &str) {
        self.viewport_size = (area.height.saturating_sub(2) as usize).max(1);
        self.adjust_offset();

        let items: Vec<ListItem> = self
            .rows
            .iter()
            .enumerate()
            .map(|(i, row)| {
                let mut spans = vec![Span::styled(
                    format!("{:>3}. ", i + 1),
                    Style::default().fg(Color::DarkGray),
                )];
                if let Some((badge, color)) = &row.badge {
                    spans.push(Span::styled(
                        format!("[{badge}] "),
                        Style::default().fg(*color),
                    ));
                }
                spans.push(Span::styled(
                    row.title.as_str(),
                    Style::default().fg(Color::White),
                ));
                if !row.detail.is_empty() {
                    spans.push(Span::styled(
                        format!("  {}", row.detail),
                        Style::default().fg(Color::Gray),
                    ));
                }
                ListItem::new(Line::from(spans))
            })
            .collect();

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            );

        f.render_stateful_widget(list, area, &mut self.state);
    }

    /// Swap the rows, keeping the selection where it still fits.
    pub fn update_rows(&mut self, rows: Vec<ResultRow>) {
        let current = self.state.selected();
        self.rows = rows;

        if self.rows.is_empty() {
            self.state.select(None);
        } else {
            let index = current.unwrap_or(0).min(self.rows.len() - 1);
            self.state.select(Some(index));
        }
        self.adjust_offset();
    }

    fn adjust_offset(&mut self) {
        if self.rows.is_empty() {
            *self.state.offset_mut() = 0;
            return;
        }

        let viewport = self.viewport_size.max(1);
        let selected = self.state.selected().unwrap_or(0).min(self.rows.len() - 1);
        self.state.select(Some(selected));

        let max_offset = self.rows.len().saturating_sub(viewport);
        let offset = self.state.offset().min(max_offset);
        *self.state.offset_mut() = offset;

        if selected < offset {
            *self.state.offset_mut() = selected;
        } else if selected >= offset + viewport {
            *self.state.offset_mut() = selected + 1 - viewport;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::KeyModifiers;

    fn rows(n: usize) -> Vec<ResultRow> {
        (0..n).map(|i| ResultRow::new(format!("video {i}"), "")).collect()
    }

    fn press(list: &mut ResultList, code: KeyCode) {
        list.handle_key(KeyEvent::new(code, KeyModifiers::NONE));
    }

    #[test]
    fn arrows_wrap_and_paging_clamps() {
        let mut list = ResultList::new(rows(3));
        press(&mut list, KeyCode::Up);
        assert_eq!(list.selected(), Some(2));
        press(&mut list, KeyCode::Down);
        assert_eq!(list.selected(), Some(0));
        press(&mut list, KeyCode::PageDown);
        assert_eq!(list.selected(), Some(1));
        press(&mut list, KeyCode::End);
        press(&mut list, KeyCode::PageDown);
        assert_eq!(list.selected(), Some(2));
    }

    #[test]
    fn shrinking_rows_keeps_selection_in_range() {
        let mut list = ResultList::new(rows(5));
        press(&mut list, KeyCode::End);
        list.update_rows(rows(2));
        assert_eq!(list.selected(), Some(1));
        list.update_rows(Vec::new());
        assert_eq!(list.selected(), None);
    }
}
