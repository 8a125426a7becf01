use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Widget,
};

use crate::theme::ThemeColors;

const KEY_HINTS: &str = " l:open h:up s:sort o:order f:fold r:refresh q:quit ";

/// Status bar widget that displays the selected DN, node info, the current
/// ordering, key hints, or a transient status message.
pub struct StatusBarWidget<'a> {
    dn_str: &'a str,
    node_info: &'a str,
    theme: &'a ThemeColors,
    status_message: Option<&'a str>,
    is_error: bool,
    sort_info: Option<&'a str>,
    more_hint: Option<&'a str>,
}

impl<'a> StatusBarWidget<'a> {
    pub fn new(dn_str: &'a str, node_info: &'a str, theme: &'a ThemeColors) -> Self {
        Self {
            dn_str,
            node_info,
            theme,
            status_message: None,
            is_error: false,
            sort_info: None,
            more_hint: None,
        }
    }

    pub fn status_message(mut self, msg: &'a str, is_error: bool) -> Self {
        self.status_message = Some(msg);
        self.is_error = is_error;
        self
    }

    /// Current sort and folding settings, e.g. `RDN value asc | fold 100`.
    pub fn sort_info(mut self, info: &'a str) -> Self {
        self.sort_info = Some(info);
        self
    }

    /// Shown when the server capped the children of the selected entry.
    pub fn more_hint(mut self, hint: &'a str) -> Self {
        self.more_hint = Some(hint);
        self
    }
}

fn truncate(s: &str, width: usize) -> String {
    s.chars().take(width).collect()
}

impl<'a> Widget for StatusBarWidget<'a> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.height == 0 || area.width == 0 {
            return;
        }

        let width = area.width as usize;

        if let Some(msg) = self.status_message {
            let style = if self.is_error {
                Style::default()
                    .bg(self.theme.error_fg)
                    .fg(self.theme.status_fg)
            } else {
                Style::default().fg(self.theme.success_fg)
            };

            let display = format!("{:<width$}", truncate(msg, width), width = width);
            let line = Line::from(Span::styled(display, style));
            buf.set_line(area.x, area.y, &line, area.width);
            return;
        }

        // Normal bar: [dn] [node_info] [sort_info] [more_hint] [key_hints]
        let hints_len = KEY_HINTS.chars().count();
        // Each optional span carries a leading space.
        let extras_len: usize = [self.sort_info, self.more_hint]
            .iter()
            .flatten()
            .map(|s| s.chars().count() + 1)
            .sum();
        let remaining = width.saturating_sub(hints_len).saturating_sub(extras_len);

        let info_len = self.node_info.chars().count();
        let dn_budget = remaining.saturating_sub(info_len).saturating_sub(1);
        let dn_len = self.dn_str.chars().count();

        // Long DNs keep their leftmost (most specific) RDNs.
        let dn_display = if dn_len > dn_budget {
            if dn_budget > 3 {
                format!("{}...", truncate(self.dn_str, dn_budget - 3))
            } else {
                truncate(self.dn_str, dn_budget)
            }
        } else {
            self.dn_str.to_string()
        };
        let dn_display_len = dn_display.chars().count();

        let info_display = truncate(self.node_info, remaining.saturating_sub(dn_display_len));
        let gap = remaining
            .saturating_sub(dn_display_len)
            .saturating_sub(info_display.chars().count());

        let dn_style = Style::default().fg(self.theme.status_fg);
        let info_style = Style::default().fg(self.theme.info_fg);
        let hints_style = Style::default()
            .fg(self.theme.dim_fg)
            .add_modifier(Modifier::DIM);

        let mut spans = vec![
            Span::styled(dn_display, dn_style),
            Span::raw(" ".repeat(gap)),
            Span::styled(info_display, info_style),
        ];

        if let Some(sort_str) = self.sort_info {
            let sort_style = Style::default()
                .fg(self.theme.accent_fg)
                .add_modifier(Modifier::BOLD);
            spans.push(Span::raw(" "));
            spans.push(Span::styled(sort_str.to_string(), sort_style));
        }

        if let Some(hint) = self.more_hint {
            let hint_style = Style::default()
                .fg(self.theme.warning_fg)
                .add_modifier(Modifier::BOLD);
            spans.push(Span::raw(" "));
            spans.push(Span::styled(hint.to_string(), hint_style));
        }

        let used: usize = spans.iter().map(|s| s.content.chars().count()).sum();
        let pad = width.saturating_sub(used).saturating_sub(hints_len);
        if pad > 0 {
            spans.push(Span::raw(" ".repeat(pad)));
        }
        spans.push(Span::styled(KEY_HINTS, hints_style));

        let line = Line::from(spans);
        buf.set_line(area.x, area.y, &line, area.width);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;
    use ratatui::style::Color;

    fn test_theme() -> ThemeColors {
        theme::dark_theme()
    }

    fn row(buf: &Buffer, width: u16) -> String {
        (0..width)
            .map(|x| buf.cell((x, 0)).unwrap().symbol().to_string())
            .collect()
    }

    #[test]
    fn test_basic_widget_creation() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("uid=1,ou=people", "leaf", &tc);
        assert_eq!(widget.dn_str, "uid=1,ou=people");
        assert_eq!(widget.node_info, "leaf");
        assert!(widget.status_message.is_none());
        assert!(!widget.is_error);
    }

    #[test]
    fn test_status_message_success() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("dc=example", "info", &tc)
            .status_message("Connection opened", false);

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(row(&buf, 80).contains("Connection opened"));
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.fg, Color::Rgb(166, 227, 161));
    }

    #[test]
    fn test_status_message_error() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("dc=example", "info", &tc)
            .status_message("Fetch failed: no source", true);

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(row(&buf, 80).contains("Fetch failed"));
        let cell = buf.cell((0, 0)).unwrap();
        assert_eq!(cell.bg, Color::Rgb(243, 139, 168));
        assert_eq!(cell.fg, Color::Rgb(205, 214, 244));
    }

    #[test]
    fn test_normal_bar_rendering() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("ou=people,dc=example,dc=com", "97 children", &tc)
            .sort_info("RDN value asc | fold 10");

        let area = Rect::new(0, 0, 140, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = row(&buf, 140);
        assert!(content.contains("ou=people,dc=example,dc=com"));
        assert!(content.contains("97 children"));
        assert!(content.contains("fold 10"));
        assert!(content.contains("s:sort"));
        assert!(content.contains("q:quit"));
    }

    #[test]
    fn test_long_dn_is_truncated_on_the_right() {
        let tc = test_theme();
        let dn = "uid=someone,ou=a-very-long-organizational-unit,ou=another,dc=example,dc=com";
        let widget = StatusBarWidget::new(dn, "leaf", &tc);

        let area = Rect::new(0, 0, 80, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = row(&buf, 80);
        assert!(content.starts_with("uid=someone"));
        assert!(content.contains("..."));
    }

    #[test]
    fn test_zero_area_does_not_panic() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("dc=example", "info", &tc);
        let area = Rect::new(0, 0, 0, 0);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);
    }

    #[test]
    fn test_key_hints_survive_sort_info_and_more_hint() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("uid=42,ou=people,dc=example,dc=com", "not loaded", &tc)
            .sort_info("RDN value asc | fold 100")
            .more_hint("+more");

        let area = Rect::new(0, 0, 140, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        let content = row(&buf, 140);
        assert!(content.ends_with(KEY_HINTS));
        assert!(content.contains("fold 100 +more"));
        assert!(content.starts_with("uid=42"));
    }

    #[test]
    fn test_more_hint_displayed() {
        let tc = test_theme();
        let widget = StatusBarWidget::new("ou=people", "1000 children", &tc).more_hint("+more");

        let area = Rect::new(0, 0, 120, 1);
        let mut buf = Buffer::empty(area);
        widget.render(area, &mut buf);

        assert!(row(&buf, 120).contains("+more"));
    }
}
