use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

pub struct ProgressBar {
    pub progress: f64,
    pub message: String,
    pub logs: Vec<String>,
    pub max_logs: usize,
}

impl ProgressBar {
    pub fn new() -> Self {
        Self {
            progress: 0.0,
            message: String::new(),
            logs: Vec::new(),
            max_logs: 200,
        }
    }

    pub fn set_progress(&mut self, progress: f64) {
        self.progress = progress.clamp(0.0, 1.0);
    }

    pub fn set_message(&mut self, message: String) {
        self.message = message;
    }

    pub fn add_log(&mut self, log: String) {
        let timestamp = chrono::Local::now().format("%H:%M:%S");
        self.logs.push(format!("[{timestamp}] {log}"));

        if self.logs.len() > self.max_logs {
            self.logs.remove(0);
        }
    }

    pub fn render(&self, f: &mut Frame, area: Rect, task: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1), // Task
                Constraint::Length(3), // Gauge
                Constraint::Length(1), // Status
                Constraint::Min(1),    // Logs
            ])
            .split(area);

        f.render_widget(
            Paragraph::new(format!("Task: {task}")).style(Style::default().fg(Color::White)),
            chunks[0],
        );

        let gauge = Gauge::default()
            .block(Block::default().borders(Borders::ALL).title("Progress"))
            .gauge_style(Style::default().fg(Color::Green))
            .percent((self.progress * 100.0).round() as u16);
        f.render_widget(gauge, chunks[1]);

        f.render_widget(
            Paragraph::new(format!("Status: {}", self.message))
                .style(Style::default().fg(Color::Yellow)),
            chunks[2],
        );

        // Newest lines stay visible.
        let visible = chunks[3].height.saturating_sub(2) as usize;
        let skip = self.logs.len().saturating_sub(visible);
        let log_lines: Vec<Line> = self
            .logs
            .iter()
            .skip(skip)
            .map(|log| Line::from(Span::raw(log.as_str())))
            .collect();

        let logs = Paragraph::new(log_lines).block(Block::default().borders(Borders::ALL).title("Log"));
        f.render_widget(logs, chunks[3]);
    }

    pub fn reset(&mut self) {
        self.progress = 0.0;
        self.message.clear();
        self.logs.clear();
    }
}

impl Default for ProgressBar {
    fn default() -> Self {
        Self::new()
    }
}
