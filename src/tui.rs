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

use crate::models::{format_money, PipelineStage};
use crate::session::Session;
use crate::store::Store;

struct AppState {
    selected: usize,
    scroll_offset: u16,
    status_line: String,
}

impl AppState {
    fn new() -> Self {
        Self {
            selected: 0,
            scroll_offset: 0,
            status_line: String::new(),
        }
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
}

pub fn run_board(store: &mut Store, session: &Session) -> Result<()> {
    if store.jobs.is_empty() {
        println!("No jobs found.");
        return Ok(());
    }

    let mut state = AppState::new();

    // Setup terminal
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = run_loop(&mut terminal, &mut state, store, session);

    // Restore terminal
    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;

    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    state: &mut AppState,
    store: &mut Store,
    session: &Session,
) -> Result<()> {
    let mut list_state = ListState::default();
    list_state.select(Some(0));

    loop {
        terminal.draw(|frame| draw(frame, state, store, &mut list_state))?;

        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                continue;
            }
            match key.code {
                KeyCode::Char('q') | KeyCode::Esc => break,
                KeyCode::Down | KeyCode::Char('j') => state.next(store.jobs.len()),
                KeyCode::Up | KeyCode::Char('k') => state.prev(),
                KeyCode::Char('J') | KeyCode::PageDown => state.scroll_down(),
                KeyCode::Char('K') | KeyCode::PageUp => state.scroll_up(),
                KeyCode::Char('n') => move_selected(state, store, session, StageMove::Next),
                KeyCode::Char('p') => move_selected(state, store, session, StageMove::Previous),
                KeyCode::Char('i') => move_selected(state, store, session, StageMove::Install),
                KeyCode::Char('r') => {
                    store.refresh_alerts();
                    state.status_line =
                        format!("Alerts recomputed: {} active", store.active_alerts().len());
                }
                KeyCode::Char('o') => {
                    if session.is_admin() {
                        let value = !store.override_pre_meter();
                        store.set_override_pre_meter(value);
                        state.status_line = format!(
                            "Pre-meter override {}",
                            if value { "enabled" } else { "disabled" }
                        );
                    } else {
                        state.status_line = "Only admins can toggle the override".to_string();
                    }
                }
                _ => {}
            }
            list_state.select(Some(state.selected));
        }
    }
    Ok(())
}

enum StageMove {
    Next,
    Previous,
    Install,
}

fn move_selected(state: &mut AppState, store: &mut Store, session: &Session, mv: StageMove) {
    let Some(job) = store.jobs.get(state.selected) else {
        return;
    };
    let job_id = job.id.clone();
    let index = job.pipeline_stage.index();

    let target = match mv {
        StageMove::Next => PipelineStage::ALL.get(index + 1).copied(),
        StageMove::Previous => index.checked_sub(1).and_then(|i| PipelineStage::ALL.get(i)).copied(),
        StageMove::Install => Some(PipelineStage::Installed),
    };
    let Some(target) = target else {
        state.status_line = "Already at the end of the pipeline".to_string();
        return;
    };

    if store.move_job_stage(&job_id, target, session.user_name()) {
        state.status_line = format!("{} moved to {}", job_id, target.label());
    } else {
        state.status_line = format!(
            "Blocked: {} needs an approved pre-meter (or the override) to be installed",
            job_id
        );
    }
}

fn draw(frame: &mut Frame, state: &AppState, store: &Store, list_state: &mut ListState) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35),
            Constraint::Percentage(65),
        ])
        .split(frame.area());

    // Left panel: pipeline job list
    let items: Vec<ListItem> = store
        .jobs
        .iter()
        .map(|job| {
            let alert_mark = if store.job_alerts(&job.id).is_empty() { " " } else { "!" };
            let customer = store
                .customer(&job.customer_id)
                .map_or("Unknown", |c| c.name.as_str());
            let name = if customer.len() > 18 {
                format!("{}...", &customer[..15])
            } else {
                customer.to_string()
            };
            ListItem::new(format!(
                "{} {:<4} {:<22} {}",
                alert_mark,
                job.id,
                job.pipeline_stage.label(),
                name
            ))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(format!(
            " Pipeline ({}) ", store.jobs.len()
        )))
        .highlight_style(Style::default().bg(Color::DarkGray).add_modifier(Modifier::BOLD))
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, chunks[0], list_state);

    // Right panel: job detail
    let detail = build_detail(state, store);
    let detail_widget = Paragraph::new(detail)
        .block(Block::default().borders(Borders::ALL).title(" Job "))
        .wrap(Wrap { trim: false })
        .scroll((state.scroll_offset, 0));

    frame.render_widget(detail_widget, chunks[1]);

    // Footer: status line above the help line
    let footer = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(1), Constraint::Length(1)])
        .split(frame.area());

    let status = Paragraph::new(format!(" {}", state.status_line))
        .style(Style::default().fg(Color::Yellow));
    frame.render_widget(status, footer[1]);

    let help = Paragraph::new(
        " j/k:navigate  J/K:scroll  n/p:stage forward/back  i:install  r:refresh alerts  o:override  q:quit",
    )
    .style(Style::default().fg(Color::DarkGray));
    frame.render_widget(help, footer[2]);
}

fn build_detail(state: &AppState, store: &Store) -> Text<'static> {
    let Some(job) = store.jobs.get(state.selected) else {
        return Text::raw("No job selected");
    };

    let mut lines: Vec<Line> = Vec::new();

    let customer = store.customer(&job.customer_id);
    let name = customer.map_or("Unknown", |c| c.name.as_str());
    lines.push(Line::from(Span::styled(
        format!("{} — {}", job.id, name),
        Style::default().add_modifier(Modifier::BOLD),
    )));
    if let Some(customer) = customer {
        lines.push(Line::from(format!("{} | {}", customer.address, customer.phone)));
    }
    lines.push(Line::from(""));

    let stage_style = match job.pipeline_stage {
        PipelineStage::Lead | PipelineStage::Quoted => Style::default().fg(Color::DarkGray),
        PipelineStage::Installed | PipelineStage::Completed => Style::default().fg(Color::Green),
        PipelineStage::Paid => Style::default().fg(Color::Cyan),
        _ => Style::default().fg(Color::Yellow),
    };
    lines.push(Line::from(Span::styled(
        format!("Stage: {}", job.pipeline_stage.label()),
        stage_style,
    )));
    lines.push(Line::from(format!(
        "System: {} {}kW, {}",
        job.system_type.as_str(),
        job.system_size_kw,
        format_money(job.project_price)
    )));
    lines.push(Line::from(format!("Team: {}", job.assigned_team)));
    if let Some(date) = job.install_date {
        lines.push(Line::from(format!("Install: {}", date)));
    }
    let mut invoice = format!("Invoice: {}", job.invoice_status.as_str());
    if let Some(due) = job.invoice_due_date {
        invoice.push_str(&format!(" (due {})", due));
    }
    lines.push(Line::from(invoice));
    lines.push(Line::from(""));

    let meters = store.job_meters(&job.id);
    if !meters.is_empty() {
        lines.push(Line::from(Span::styled(
            "Meter applications",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for meter in meters {
            let mut line = format!(
                "  {} {} — {}",
                meter.meter_type.as_str(),
                meter.date_submitted,
                meter.status.as_str()
            );
            if let Some(reason) = &meter.rejection_reason {
                line.push_str(&format!(" ({})", reason));
            }
            lines.push(Line::from(line));
        }
        lines.push(Line::from(""));
    }

    let alerts = store.job_alerts(&job.id);
    if !alerts.is_empty() {
        lines.push(Line::from(Span::styled(
            "Alerts",
            Style::default().add_modifier(Modifier::BOLD).fg(Color::Red),
        )));
        for alert in alerts {
            lines.push(Line::from(Span::styled(
                format!("  [{}] {}", alert.severity.as_str(), alert.message),
                Style::default().fg(Color::Red),
            )));
        }
        lines.push(Line::from(""));
    }

    let timeline = store.job_timeline(&job.id);
    if !timeline.is_empty() {
        lines.push(Line::from(Span::styled(
            "Timeline",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for event in timeline.iter().take(8) {
            lines.push(Line::from(format!(
                "  {} {} ({})",
                event.created_at.format("%Y-%m-%d"),
                event.description,
                event.created_by
            )));
        }
        lines.push(Line::from(""));
    }

    let notes = store.job_notes(&job.id);
    if !notes.is_empty() {
        lines.push(Line::from(Span::styled(
            "Notes",
            Style::default().add_modifier(Modifier::BOLD),
        )));
        for note in notes {
            for wrapped in textwrap::fill(&note.text, 70).lines() {
                lines.push(Line::from(format!("  {}", wrapped)));
            }
        }
    }

    Text::from(lines)
}
