use crossterm::event::{KeyCode, KeyEvent};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
};

/// Scrollable plaintext page for one result.
pub struct ContentViewer {
    pub content: String,
    pub scroll: usize,
    pub title: String,
}

impl ContentViewer {
    pub fn new(content: String, title: String) -> Self {
        Self {
            content,
            scroll: 0,
            title,
        }
    }

    fn line_count(&self) -> usize {
        self.content.lines().count()
    }

    pub fn handle_key(&mut self, key: KeyEvent, area_height: usize) -> bool {
        let page_size = area_height.saturating_sub(2);
        let last_top = self.line_count().saturating_sub(page_size);
        match key.code {
            KeyCode::Up => {
                self.scroll = self.scroll.saturating_sub(1);
                true
            }
            KeyCode::Down => {
                if self.scroll < last_top {
                    self.scroll += 1;
                }
                true
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(page_size);
                true
            }
            KeyCode::PageDown => {
                self.scroll = (self.scroll + page_size).min(last_top);
                true
            }
            KeyCode::Home => {
                self.scroll = 0;
                true
            }
            KeyCode::End => {
                self.scroll = last_top;
                true
            }
            _ => false,
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect) {
        let visible_lines = area.height.saturating_sub(2) as usize;
        let lines: Vec<Line> = self
            .content
            .lines()
            .skip(self.scroll)
            .take(visible_lines)
            .map(|line| {
                if line.ends_with(':') && !line.starts_with(' ') {
                    // Section headings
                    Line::from(Span::styled(
                        line,
                        Style::default()
                            .fg(Color::Yellow)
                            .add_modifier(Modifier::BOLD),
                    ))
                } else if line.starts_with("URL:") || line.starts_with("Channel:") {
                    Line::from(Span::styled(line, Style::default().fg(Color::Cyan)))
                } else if line.starts_with("- ") || line.starts_with("• ") {
                    Line::from(Span::styled(line, Style::default().fg(Color::Green)))
                } else {
                    Line::from(Span::raw(line))
                }
            })
            .collect();

        let total_lines = self.line_count();
        let scroll_info = if total_lines > visible_lines {
            format!(
                " (lines {}-{} of {})",
                self.scroll + 1,
                (self.scroll + visible_lines).min(total_lines),
                total_lines
            )
        } else {
            String::new()
        };

        let block = Block::default()
            .borders(Borders::ALL)
            .title(format!("{}{scroll_info}", self.title));

        let paragraph = Paragraph::new(lines).block(block).wrap(Wrap { trim: false });
        f.render_widget(paragraph, area);
    }
}
