//! Status bar component - page status, paging numbers, key hints

use crate::pages::PageInfo;
use crate::theme::Theme;
use ratatui::{
    layout::Rect,
    style::Style,
    widgets::Paragraph,
    Frame,
};

pub fn render(
    f: &mut Frame,
    area: Rect,
    status_line: &str,
    info: PageInfo,
    busy: bool,
    theme: &Theme,
) {
    let paging = if info.pageable && info.page_size > 0 {
        let pages = (info.count + info.page_size - 1) / info.page_size;
        format!(
            " │ page {}/{} · size {}",
            info.offset + 1,
            pages.max(1),
            info.page_size
        )
    } else {
        String::new()
    };

    let busy_marker = if busy { " │ working…" } else { "" };

    let text = format!(
        " {}{}{} │ ? help ",
        status_line, paging, busy_marker
    );

    let paragraph = Paragraph::new(text).style(
        Style::default()
            .fg(theme.foreground)
            .bg(theme.status_bar),
    );
    f.render_widget(paragraph, area);
}
