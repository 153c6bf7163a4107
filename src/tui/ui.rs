use crate::core::stats::SortOrder;
use crate::error::Provider;
use crate::tui::app::{App, Screen, Tab};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Tabs, Wrap},
};

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(1),    // Body
            Constraint::Length(1), // Notice
            Constraint::Length(3), // Help
        ])
        .split(f.area());

    draw_header(f, app, chunks[0]);

    let help = match app.screen.clone() {
        Screen::Login => {
            draw_login(f, app, chunks[1]);
            "[Enter] Log in  [Ctrl+C] Quit"
        }
        Screen::Form => {
            draw_form(f, app, chunks[1]);
            if app.focus == 0 {
                "[←→] Switch tab  [Enter/Tab] Edit  [r] Last results  [Ctrl+L] Log out  [Ctrl+C] Quit"
            } else {
                "[Enter] Run  [Tab] Next field  [Shift+Tab] Tab bar  [Ctrl+L] Log out  [Ctrl+C] Quit"
            }
        }
        Screen::Processing { task } => {
            app.progress_bar.render(f, chunks[1], &task);
            "Working... [Ctrl+C] Quit"
        }
        Screen::Results => {
            draw_results(f, app, chunks[1]);
            match app.tab {
                Tab::Videos => "[↑↓] Move  [Enter] Details  [s] Sort  [t] Summarize transcript  [e] Export CSV  [Esc] Back",
                Tab::Growth => "[↑↓] Move  [Enter] Details  [e] Export CSV  [Esc] Back",
                Tab::VideoList => "[↑↓] Move  [Enter] Report  [e] Export reports  [Esc] Back",
            }
        }
        Screen::Viewer => {
            if let Some(viewer) = &app.viewer {
                app.viewer_height = chunks[1].height;
                viewer.render(f, chunks[1]);
            }
            "[↑↓] Scroll  [PgUp/PgDn] Page  [Home/End] Top/Bottom  [Esc] Back"
        }
    };

    if let Some(notice) = &app.notice {
        let style = if notice.is_error {
            Style::default().fg(Color::Red)
        } else {
            Style::default().fg(Color::Green)
        };
        f.render_widget(
            Paragraph::new(notice.text.as_str())
                .style(style)
                .alignment(Alignment::Center),
            chunks[2],
        );
    }

    let help = Paragraph::new(help)
        .style(Style::default().fg(Color::Gray))
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(help, chunks[3]);
}

fn key_label(app: &App, provider: Provider, slot: usize) -> String {
    let (pool, _) = app.session.state.pool(provider);
    match app.key_indices[slot] {
        Some(index) if !pool.is_empty() => format!("{provider} key {}/{}", index + 1, pool.len()),
        _ => format!("{provider} keys: none"),
    }
}

fn draw_header(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(1), Constraint::Length(44)])
        .split(area);

    let block = Block::default().borders(Borders::ALL).title("chanscope");
    let tabs = Tabs::new(Tab::ALL.iter().map(|tab| tab.title()))
        .block(block)
        .select(app.tab.index())
        .style(Style::default().fg(Color::White))
        .highlight_style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        );
    let tabs = if app.screen == Screen::Form && app.focus == 0 {
        tabs.highlight_style(
            Style::default()
                .fg(Color::Black)
                .bg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
    } else {
        tabs
    };
    f.render_widget(tabs, chunks[0]);

    let keys = Paragraph::new(Line::from(vec![
        Span::styled(key_label(app, Provider::YouTube, 0), Style::default().fg(Color::Cyan)),
        Span::raw("  "),
        Span::styled(key_label(app, Provider::Ai, 1), Style::default().fg(Color::Magenta)),
    ]))
    .alignment(Alignment::Right)
    .block(Block::default().borders(Borders::ALL));
    f.render_widget(keys, chunks[1]);
}

fn centered(area: Rect, width: u16, height: u16) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

fn draw_login(f: &mut Frame, app: &App, area: Rect) {
    let area = centered(area, 60, 7);
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(3)])
        .split(area);

    let title = Paragraph::new("Enter the access key you were given")
        .style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        )
        .alignment(Alignment::Center)
        .block(Block::default().borders(Borders::ALL));
    f.render_widget(title, chunks[0]);

    app.login_input.render(f, chunks[1]);
}

fn draw_form(f: &mut Frame, app: &App, area: Rect) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // First input
            Constraint::Length(3), // Second input
            Constraint::Min(1),    // Hint
        ])
        .split(area);

    let hint = match app.tab {
        Tab::Videos => {
            app.channels_input.render(f, chunks[0]);
            app.days_input.render(f, chunks[1]);
            format!(
                "Finds each channel's videos from the last N days that beat the channel average and summarizes their comments.\n{} stored result(s).",
                app.session.state.results.len()
            )
        }
        Tab::Growth => {
            app.growth_channels_input.render(f, chunks[0]);
            app.growth_days_input.render(f, chunks[1]);
            format!(
                "Compares average views of the last N days against the N days before and ranks the channels.\n{} stored result(s).",
                app.session.state.growth_results.len()
            )
        }
        Tab::VideoList => {
            app.urls_input.render(f, chunks[0]);
            format!(
                "Collects details and all comments of each video and asks AI for an audience insight. Stops when every key is out of quota.\n{} stored result(s).",
                app.session.state.video_list.len()
            )
        }
    };

    let hint_area = if app.tab == Tab::VideoList {
        chunks[1].union(chunks[2])
    } else {
        chunks[2]
    };
    let hint = Paragraph::new(hint)
        .style(Style::default().fg(Color::Gray))
        .wrap(Wrap { trim: true })
        .block(Block::default().borders(Borders::ALL).title(app.tab.title()));
    f.render_widget(hint, hint_area);
}

fn draw_results(f: &mut Frame, app: &mut App, area: Rect) {
    let title = match app.tab {
        Tab::Videos => {
            let order = match app.sort {
                SortOrder::Ratio => "by view ratio",
                SortOrder::Views => "by views",
            };
            format!("Outlier videos ({}) {order}", app.results.rows.len())
        }
        Tab::Growth => format!(
            "Channel growth, {}-day periods ({})",
            app.session.state.growth_timeframe_days,
            app.results.rows.len()
        ),
        Tab::VideoList => format!("Video list ({})", app.results.rows.len()),
    };

    if app.results.rows.is_empty() {
        let empty = Paragraph::new("No results yet.")
            .style(Style::default().fg(Color::Gray))
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(title));
        f.render_widget(empty, area);
        return;
    }
    app.results.render(f, area, &title);
}
