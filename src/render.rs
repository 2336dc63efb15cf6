use chrono::{DateTime, Utc};
use crossterm::style::{Color, Stylize};

use crate::config::TimestampStyle;

#[derive(Debug, Clone, PartialEq)]
pub struct Span {
    pub text: String,
    pub color: Option<Color>,
}

impl Span {
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            color: None,
        }
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self {
            text: text.into(),
            color: Some(color),
        }
    }

    fn console(&self) -> String {
        match self.color {
            Some(color) if !self.text.is_empty() => self.text.as_str().with(color).to_string(),
            _ => self.text.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Line {
    spans: Vec<Span>,
}

impl Line {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn plain(text: impl Into<String>) -> Self {
        Self::new().with(Span::plain(text))
    }

    pub fn colored(text: impl Into<String>, color: Color) -> Self {
        Self::new().with(Span::colored(text, color))
    }

    pub fn with(mut self, span: Span) -> Self {
        self.spans.push(span);
        self
    }

    pub fn text(self, text: impl Into<String>) -> Self {
        self.with(Span::plain(text))
    }

    pub fn paint(self, text: impl Into<String>, color: Color) -> Self {
        self.with(Span::colored(text, color))
    }

    pub fn append(&mut self, other: Line) {
        self.spans.extend(other.spans);
    }

    pub fn spans(&self) -> &[Span] {
        &self.spans
    }

    pub fn console(&self) -> String {
        self.spans.iter().map(Span::console).collect()
    }

    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// Ordered lines of one report section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReportText {
    lines: Vec<Line>,
}

impl ReportText {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, line: Line) {
        self.lines.push(line);
    }

    pub fn blank(&mut self) {
        self.lines.push(Line::new());
    }

    pub fn extend(&mut self, other: ReportText) {
        self.lines.extend(other.lines);
    }

    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn console(&self) -> String {
        self.lines
            .iter()
            .map(Line::console)
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn plain(&self) -> String {
        self.lines
            .iter()
            .map(Line::plain_text)
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Joins sections with a separator line of `separator` text between them.
pub fn join_sections(sections: Vec<ReportText>, separator: &str) -> ReportText {
    let mut out = ReportText::new();
    for (idx, section) in sections.into_iter().enumerate() {
        if idx > 0 {
            out.push(Line::plain(separator));
        }
        out.extend(section);
    }
    out
}

fn utc(epoch: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(epoch, 0)
}

/// `2024-01-31 18:00:00 GMT`, used for event and milestone schedules.
pub fn epoch_to_gmt(epoch: i64) -> String {
    utc(epoch)
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S GMT").to_string())
        .unwrap_or_else(|| epoch.to_string())
}

/// Showdown and tournament window stamps.
pub fn format_timestamp(epoch: i64, style: TimestampStyle) -> String {
    match style {
        TimestampStyle::Discord => format!("<t:{epoch}:f>"),
        TimestampStyle::Utc => utc(epoch)
            .map(|dt| dt.format("%Y-%m-%d %H:%M:%S UTC").to_string())
            .unwrap_or_else(|| epoch.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn console_and_plain_share_text() {
        let line = Line::plain("Zonda R ")
            .paint("(PS)", Color::Magenta)
            .text(" - ")
            .paint("250 Gold Coins", Color::Yellow);
        assert_eq!(line.plain_text(), "Zonda R (PS) - 250 Gold Coins");
        assert!(line.console().contains('\u{1b}'));
        assert_ne!(line.console(), line.plain_text());
    }

    #[test]
    fn report_joins_lines_with_newlines() {
        let mut text = ReportText::new();
        text.push(Line::colored("Title", Color::Cyan));
        text.blank();
        text.push(Line::plain("body"));
        assert_eq!(text.plain(), "Title\n\nbody");
    }

    #[test]
    fn epoch_formats() {
        assert_eq!(epoch_to_gmt(0), "1970-01-01 00:00:00 GMT");
        assert_eq!(
            format_timestamp(86_400, TimestampStyle::Utc),
            "1970-01-02 00:00:00 UTC"
        );
        assert_eq!(
            format_timestamp(86_400, TimestampStyle::Discord),
            "<t:86400:f>"
        );
    }
}
