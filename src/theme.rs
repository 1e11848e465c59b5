// Theme support for the TUI
//
// Provides color palettes configurable via config file.
// "auto" uses the terminal's ANSI palette, named themes use true color.

use ratatui::style::Color;

/// Color palette for the console
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,

    pub background: Color,
    pub foreground: Color,

    // Chrome
    pub title: Color,
    pub border: Color,
    pub highlight: Color,
    pub header: Color,
    pub status_bar: Color,

    // Grid states
    pub selection: Color,
    pub busy: Color,

    // Alert levels
    pub success: Color,
    pub error: Color,
    pub info: Color,
}

impl Theme {
    /// Load theme by name
    pub fn by_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dracula" => Self::dracula(),
            "nord" => Self::nord(),
            "gruvbox" => Self::gruvbox(),
            _ => Self::auto(), // "auto" or unknown
        }
    }

    /// Cycle through the available themes
    pub fn next(&self) -> Self {
        match self.name.as_str() {
            "auto" => Self::dracula(),
            "dracula" => Self::nord(),
            "nord" => Self::gruvbox(),
            _ => Self::auto(),
        }
    }

    /// Auto theme - uses the terminal's ANSI palette
    pub fn auto() -> Self {
        Self {
            name: "auto".to_string(),
            background: Color::Reset,
            foreground: Color::Reset,
            title: Color::Cyan,
            border: Color::DarkGray,
            highlight: Color::Yellow,
            header: Color::Cyan,
            status_bar: Color::DarkGray,
            selection: Color::Blue,
            busy: Color::Yellow,
            success: Color::Green,
            error: Color::Red,
            info: Color::Blue,
        }
    }

    pub fn dracula() -> Self {
        Self {
            name: "dracula".to_string(),
            background: Color::Rgb(40, 42, 54),
            foreground: Color::Rgb(248, 248, 242),
            title: Color::Rgb(189, 147, 249),
            border: Color::Rgb(98, 114, 164),
            highlight: Color::Rgb(241, 250, 140),
            header: Color::Rgb(139, 233, 253),
            status_bar: Color::Rgb(68, 71, 90),
            selection: Color::Rgb(98, 114, 164),
            busy: Color::Rgb(241, 250, 140),
            success: Color::Rgb(80, 250, 123),
            error: Color::Rgb(255, 85, 85),
            info: Color::Rgb(139, 233, 253),
        }
    }

    pub fn nord() -> Self {
        Self {
            name: "nord".to_string(),
            background: Color::Rgb(46, 52, 64),
            foreground: Color::Rgb(216, 222, 233),
            title: Color::Rgb(136, 192, 208),
            border: Color::Rgb(76, 86, 106),
            highlight: Color::Rgb(235, 203, 139),
            header: Color::Rgb(129, 161, 193),
            status_bar: Color::Rgb(59, 66, 82),
            selection: Color::Rgb(94, 129, 172),
            busy: Color::Rgb(235, 203, 139),
            success: Color::Rgb(163, 190, 140),
            error: Color::Rgb(191, 97, 106),
            info: Color::Rgb(136, 192, 208),
        }
    }

    pub fn gruvbox() -> Self {
        Self {
            name: "gruvbox".to_string(),
            background: Color::Rgb(40, 40, 40),
            foreground: Color::Rgb(235, 219, 178),
            title: Color::Rgb(254, 128, 25),
            border: Color::Rgb(124, 111, 100),
            highlight: Color::Rgb(250, 189, 47),
            header: Color::Rgb(131, 165, 152),
            status_bar: Color::Rgb(60, 56, 54),
            selection: Color::Rgb(69, 133, 136),
            busy: Color::Rgb(250, 189, 47),
            success: Color::Rgb(184, 187, 38),
            error: Color::Rgb(251, 73, 52),
            info: Color::Rgb(131, 165, 152),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_name_falls_back_to_auto() {
        assert_eq!(Theme::by_name("no-such-theme").name, "auto");
        assert_eq!(Theme::by_name("DRACULA").name, "dracula");
    }

    #[test]
    fn test_theme_cycle_returns_to_start() {
        let mut theme = Theme::auto();
        for _ in 0..4 {
            theme = theme.next();
        }
        assert_eq!(theme.name, "auto");
    }
}
