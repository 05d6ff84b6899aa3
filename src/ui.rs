pub mod charting;

use devtyper::{
    metrics::LiveMetrics,
    session::{CharStatus, LifecycleState, Session},
    TestResult,
};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Axis, Chart, Dataset, GraphType, Paragraph, Widget, Wrap},
};

use crate::App;

const HORIZONTAL_MARGIN: u16 = 5;
const VERTICAL_MARGIN: u16 = 2;

impl Widget for &App {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let engine = &self.engine;
        match (engine.lifecycle(), engine.result()) {
            (LifecycleState::Finished, Some(result)) => render_results(result, area, buf),
            _ => render_typing(engine.session(), engine.live_metrics(), area, buf),
        }
    }
}

fn render_typing(session: &Session, live: &LiveMetrics, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let green_bold_style = Style::default().patch(bold_style).fg(Color::Green);
    let red_bold_style = Style::default().patch(bold_style).fg(Color::Red);
    let dim_bold_style = Style::default()
        .patch(bold_style)
        .add_modifier(Modifier::DIM);
    let underlined_dim_bold_style = Style::default()
        .patch(dim_bold_style)
        .add_modifier(Modifier::UNDERLINED);

    let max_chars_per_line = area.width.saturating_sub(HORIZONTAL_MARGIN * 2).max(1);
    let prompt_len = session.target_len() as u16;
    let prompt_occupied_lines = if prompt_len <= max_chars_per_line {
        1
    } else {
        prompt_len.div_ceil(max_chars_per_line) + 1
    };
    let padding = area.height.saturating_sub(prompt_occupied_lines) / 2;

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .constraints([
            Constraint::Length(padding.saturating_sub(2)),
            Constraint::Length(2),
            Constraint::Length(prompt_occupied_lines),
            Constraint::Min(0),
        ])
        .split(area);

    let spans: Vec<Span> = session
        .target_text()
        .chars()
        .enumerate()
        .map(|(idx, expected)| match session.char_status(idx) {
            CharStatus::Correct => Span::styled(expected.to_string(), green_bold_style),
            CharStatus::Incorrect => {
                let typed = session.input_log[idx];
                Span::styled(
                    match typed {
                        ' ' => "·".to_owned(),
                        c => c.to_string(),
                    },
                    red_bold_style,
                )
            }
            CharStatus::Current => Span::styled(expected.to_string(), underlined_dim_bold_style),
            CharStatus::Upcoming => Span::styled(expected.to_string(), dim_bold_style),
        })
        .collect();

    let prompt = Paragraph::new(Line::from(spans))
        .alignment(if prompt_occupied_lines == 1 {
            Alignment::Center
        } else {
            Alignment::Left
        })
        .wrap(Wrap { trim: true });
    prompt.render(chunks[2], buf);

    let status = match live.lifecycle {
        LifecycleState::Idle => "start typing".to_string(),
        _ => {
            let clock = match live.remaining_secs {
                Some(remaining) => format!("{remaining:.1}s"),
                None => format!("{:.0}%", live.progress_percent),
            };
            format!("{}   {} wpm   {}% acc", clock, live.wpm, live.accuracy)
        }
    };
    Paragraph::new(Span::styled(status, dim_bold_style))
        .alignment(Alignment::Center)
        .render(chunks[1], buf);
}

fn render_results(result: &TestResult, area: Rect, buf: &mut Buffer) {
    let bold_style = Style::default().add_modifier(Modifier::BOLD);
    let italic_style = Style::default().add_modifier(Modifier::ITALIC);
    let magenta_style = Style::default().fg(Color::Magenta);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .horizontal_margin(HORIZONTAL_MARGIN)
        .vertical_margin(VERTICAL_MARGIN)
        .constraints([
            Constraint::Min(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(area);

    let tuples: Vec<(f64, f64)> = result.wpm_history.iter().map(|&p| p.into()).collect();
    let (overall_duration, highest_wpm) =
        charting::compute_chart_params(&tuples, result.duration_secs);

    let datasets = vec![Dataset::default()
        .marker(ratatui::symbols::Marker::Braille)
        .style(magenta_style)
        .graph_type(GraphType::Line)
        .data(&tuples)];

    Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title("seconds")
                .bounds([1.0, overall_duration])
                .labels(vec![
                    Span::styled("1", bold_style),
                    Span::styled(charting::format_label(overall_duration), bold_style),
                ]),
        )
        .y_axis(
            Axis::default()
                .title("wpm")
                .bounds([0.0, highest_wpm])
                .labels(vec![
                    Span::styled("0", bold_style),
                    Span::styled(charting::format_label(highest_wpm), bold_style),
                ]),
        )
        .render(chunks[0], buf);

    Paragraph::new(Span::styled(
        format!(
            "{} wpm   {} raw   {}% acc   {:.1}s",
            result.wpm, result.raw_wpm, result.accuracy, result.duration_secs
        ),
        bold_style,
    ))
    .alignment(Alignment::Center)
    .render(chunks[1], buf);

    let burst = &result.burst_speed;
    Paragraph::new(Span::styled(
        format!(
            "burst {:.0}-{:.0} cpm   confidence {:.2}   {} text ({:.2})",
            burst.min, burst.max, result.confidence, result.complexity_level, result.complexity_factor
        ),
        Style::default().fg(Color::Cyan).add_modifier(Modifier::ITALIC),
    ))
    .alignment(Alignment::Center)
    .render(chunks[2], buf);

    Paragraph::new(Span::styled("(←) retry / (→) new / (esc)ape", italic_style))
        .render(chunks[4], buf);
}
