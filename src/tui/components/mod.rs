//! UI components for the console
//!
//! Each component is a plain render function over its slice of state, in
//! the order they stack on screen: title bar, grid, status bar, logs
//! panel, plus the overlays (chooser, form editor, toast).

pub mod chooser;
pub mod form;
pub mod grid;
pub mod logs_panel;
pub mod status_bar;
pub mod title_bar;
pub mod toast;

use ratatui::layout::Rect;

/// A centered overlay area, clamped to the frame
pub fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    let x = area.x + (area.width - width) / 2;
    let y = area.y + (area.height - height) / 2;
    Rect::new(x, y, width, height)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_centered_rect_is_clamped_and_centered() {
        let area = Rect::new(0, 0, 100, 40);
        let rect = centered_rect(60, 20, area);
        assert_eq!(rect, Rect::new(20, 10, 60, 20));

        let clamped = centered_rect(200, 80, area);
        assert_eq!(clamped, area);
    }
}
