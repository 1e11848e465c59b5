//! Logs panel component - recent tracing output, toggled with L

use crate::logging::{LogBuffer, LogLevel};
use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

pub fn render(f: &mut Frame, area: Rect, buffer: &LogBuffer, theme: &Theme) {
    let visible = area.height.saturating_sub(2) as usize;
    let entries = buffer.recent(visible);

    let items: Vec<ListItem> = entries
        .iter()
        .map(|entry| {
            let color = match entry.level {
                LogLevel::Error => theme.error,
                LogLevel::Warn => theme.busy,
                LogLevel::Info => theme.foreground,
                LogLevel::Debug | LogLevel::Trace => theme.border,
            };
            ListItem::new(Line::from(vec![
                Span::styled(
                    format!("{} ", entry.timestamp.format("%H:%M:%S")),
                    Style::default().fg(theme.border),
                ),
                Span::styled(format!("{:5} ", entry.level.as_str()), Style::default().fg(color)),
                Span::styled(entry.message.clone(), Style::default().fg(color)),
            ]))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(theme.border))
            .title(" Logs "),
    );
    f.render_widget(list, area);
}
