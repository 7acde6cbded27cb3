use ratatui::style::Color;

use crate::pipeline::render::Highlight;

#[derive(Debug, Clone)]
pub struct Theme {
    pub name: &'static str,
    pub header_accent_bg: Color,
    pub header_accent_fg: Color,
    pub status_ok: Color,
    pub status_err: Color,
    pub statusbar_bg: Color,
    pub overlay_border: Color,
    pub text_primary: Color,
    pub text_secondary: Color,
    pub accent: Color,
    pub pill_key_bg: Color,
    pub pill_key_fg: Color,
    pub pill_desc_fg: Color,
    pub surface_bg: Color,
    pub gauge_ok: Color,
    pub gauge_warn: Color,
    pub gauge_critical: Color,
    pub gauge_unfilled: Color,
    pub table_header_fg: Color,
    pub highlight_strong: Color,
    pub highlight_weak: Color,
    pub selection_bg: Color,
    pub cursor_bg: Color,
}

impl Theme {
    /// Unknown names fall back to `light`.
    pub fn from_name(name: &str) -> Self {
        match name.to_lowercase().as_str() {
            "dark" => Self::dark(),
            "modern" => Self::modern(),
            _ => Self::light(),
        }
    }

    pub fn next(&self) -> Self {
        match self.name {
            "light" => Self::dark(),
            "dark" => Self::modern(),
            _ => Self::light(),
        }
    }

    /// Memory gauge colour: below 50% ok, below 80% warning, else critical.
    pub fn gauge_color(&self, percent: f64) -> Color {
        if percent < 50.0 {
            self.gauge_ok
        } else if percent < 80.0 {
            self.gauge_warn
        } else {
            self.gauge_critical
        }
    }

    pub fn highlight_bg(&self, highlight: Highlight) -> Option<Color> {
        match highlight {
            Highlight::Strong => Some(self.highlight_strong),
            Highlight::Weak => Some(self.highlight_weak),
            Highlight::None => None,
        }
    }

    pub fn light() -> Self {
        Theme {
            name: "light",
            header_accent_bg: Color::Blue,
            header_accent_fg: Color::White,
            status_ok: Color::Rgb(0, 120, 0),
            status_err: Color::Red,
            statusbar_bg: Color::Rgb(220, 220, 220),
            overlay_border: Color::Rgb(150, 150, 150),
            text_primary: Color::Black,
            text_secondary: Color::DarkGray,
            accent: Color::Blue,
            pill_key_bg: Color::Blue,
            pill_key_fg: Color::White,
            pill_desc_fg: Color::Black,
            surface_bg: Color::Rgb(200, 200, 200),
            gauge_ok: Color::Rgb(39, 174, 96),
            gauge_warn: Color::Rgb(243, 156, 18),
            gauge_critical: Color::Rgb(231, 76, 60),
            gauge_unfilled: Color::Rgb(200, 200, 200),
            table_header_fg: Color::Rgb(40, 40, 40),
            highlight_strong: Color::Rgb(255, 230, 153),
            highlight_weak: Color::Rgb(255, 243, 204),
            selection_bg: Color::Rgb(173, 216, 230),
            cursor_bg: Color::Rgb(70, 130, 180),
        }
    }

    pub fn dark() -> Self {
        Theme {
            name: "dark",
            header_accent_bg: Color::Green,
            header_accent_fg: Color::Black,
            status_ok: Color::Green,
            status_err: Color::Red,
            statusbar_bg: Color::DarkGray,
            overlay_border: Color::DarkGray,
            text_primary: Color::White,
            text_secondary: Color::Gray,
            accent: Color::Green,
            pill_key_bg: Color::Yellow,
            pill_key_fg: Color::Black,
            pill_desc_fg: Color::White,
            surface_bg: Color::DarkGray,
            gauge_ok: Color::Rgb(46, 204, 113),
            gauge_warn: Color::Rgb(243, 156, 18),
            gauge_critical: Color::Rgb(231, 76, 60),
            gauge_unfilled: Color::DarkGray,
            table_header_fg: Color::Gray,
            highlight_strong: Color::Rgb(102, 80, 0),
            highlight_weak: Color::Rgb(61, 50, 10),
            selection_bg: Color::Rgb(35, 60, 90),
            cursor_bg: Color::Rgb(60, 100, 150),
        }
    }

    pub fn modern() -> Self {
        Theme {
            name: "modern",
            header_accent_bg: Color::Rgb(203, 166, 247),
            header_accent_fg: Color::Rgb(30, 30, 46),
            status_ok: Color::Rgb(166, 227, 161),
            status_err: Color::Rgb(243, 139, 168),
            statusbar_bg: Color::Rgb(49, 50, 68),
            overlay_border: Color::Rgb(69, 71, 90),
            text_primary: Color::Rgb(205, 214, 244),
            text_secondary: Color::Rgb(166, 173, 200),
            accent: Color::Rgb(203, 166, 247),
            pill_key_bg: Color::Rgb(203, 166, 247),
            pill_key_fg: Color::Rgb(30, 30, 46),
            pill_desc_fg: Color::Rgb(205, 214, 244),
            surface_bg: Color::Rgb(49, 50, 68),
            gauge_ok: Color::Rgb(166, 227, 161),
            gauge_warn: Color::Rgb(249, 226, 175),
            gauge_critical: Color::Rgb(243, 139, 168),
            gauge_unfilled: Color::Rgb(69, 71, 90),
            table_header_fg: Color::Rgb(180, 190, 254),
            highlight_strong: Color::Rgb(88, 70, 40),
            highlight_weak: Color::Rgb(60, 55, 50),
            selection_bg: Color::Rgb(69, 71, 90),
            cursor_bg: Color::Rgb(88, 91, 112),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn theme_cycles_through_all_three() {
        let light = Theme::light();
        let dark = light.next();
        let modern = dark.next();
        assert_eq!(dark.name, "dark");
        assert_eq!(modern.name, "modern");
        assert_eq!(modern.next().name, "light");
    }

    #[test]
    fn unknown_theme_name_is_light() {
        assert_eq!(Theme::from_name("DARK").name, "dark");
        assert_eq!(Theme::from_name("solarized").name, "light");
    }

    #[test]
    fn gauge_color_thresholds() {
        let theme = Theme::light();
        assert_eq!(theme.gauge_color(49.9), theme.gauge_ok);
        assert_eq!(theme.gauge_color(50.0), theme.gauge_warn);
        assert_eq!(theme.gauge_color(79.9), theme.gauge_warn);
        assert_eq!(theme.gauge_color(80.0), theme.gauge_critical);
    }

    #[test]
    fn no_highlight_means_no_background() {
        let theme = Theme::dark();
        assert_eq!(theme.highlight_bg(Highlight::None), None);
        assert_eq!(theme.highlight_bg(Highlight::Strong), Some(theme.highlight_strong));
    }
}
