//! Pipeline log feed.
//!
//! Entries are echoed to stderr and broadcast to any subscriber, so a
//! presentation layer can stream progress while a run is in flight. Each
//! entry carries the file, category and sheet being worked on, letting a
//! subscriber group progress per upload.
//!
//! Diagnostics are not logs: skips are always returned in the run report.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::broadcast;

use crate::models::Category;

/// Entries buffered for slow subscribers before the oldest are dropped.
const CHANNEL_CAPACITY: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Info,
    Success,
    Warning,
    Error,
}

/// One progress line, with the input it is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    pub level: LogLevel,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub section: Option<String>,
}

impl LogEntry {
    /// A run-level entry, not tied to any file.
    pub fn new(level: LogLevel, message: impl Into<String>) -> Self {
        Self {
            level,
            message: message.into(),
            file: None,
            category: None,
            section: None,
        }
    }

    /// Nesting depth for display: run, file, sheet.
    pub fn depth(&self) -> usize {
        match (&self.file, &self.section) {
            (None, _) => 0,
            (Some(_), None) => 1,
            (Some(_), Some(_)) => 2,
        }
    }

    /// Human-readable line as echoed to stderr.
    pub fn render(&self) -> String {
        let marker = match self.level {
            LogLevel::Info => "",
            LogLevel::Success => "✓ ",
            LogLevel::Warning => "⚠️  ",
            LogLevel::Error => "❌ ",
        };
        let indent = "   ".repeat(self.depth());
        match (&self.file, &self.section) {
            (Some(file), Some(section)) if section != file => {
                format!("{}{}[{}] {}", indent, marker, section, self.message)
            }
            _ => format!("{}{}{}", indent, marker, self.message),
        }
    }
}

/// The file (and optionally sheet) a batch of log lines is about.
#[derive(Debug, Clone, Copy)]
pub struct Scope<'a> {
    file: &'a str,
    category: Category,
    section: Option<&'a str>,
}

impl<'a> Scope<'a> {
    pub fn file(file: &'a str, category: Category) -> Self {
        Self {
            file,
            category,
            section: None,
        }
    }

    /// Narrow to one sheet of the file.
    pub fn section(self, section: &'a str) -> Self {
        Self {
            section: Some(section),
            ..self
        }
    }

    pub fn entry(&self, level: LogLevel, message: impl Into<String>) -> LogEntry {
        LogEntry {
            file: Some(self.file.to_string()),
            category: Some(self.category),
            section: self.section.map(str::to_string),
            ..LogEntry::new(level, message)
        }
    }

    pub fn info(&self, message: impl Into<String>) {
        LOG_BROADCASTER.log(self.entry(LogLevel::Info, message));
    }

    pub fn success(&self, message: impl Into<String>) {
        LOG_BROADCASTER.log(self.entry(LogLevel::Success, message));
    }

    pub fn warning(&self, message: impl Into<String>) {
        LOG_BROADCASTER.log(self.entry(LogLevel::Warning, message));
    }
}

/// Global log broadcaster
pub static LOG_BROADCASTER: Lazy<LogBroadcaster> = Lazy::new(LogBroadcaster::new);

pub struct LogBroadcaster {
    sender: broadcast::Sender<LogEntry>,
    echo: AtomicBool,
}

impl LogBroadcaster {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self {
            sender,
            echo: AtomicBool::new(true),
        }
    }

    /// Turn the stderr echo on or off.
    pub fn set_echo(&self, enabled: bool) {
        self.echo.store(enabled, Ordering::Relaxed);
    }

    pub fn log(&self, entry: LogEntry) {
        if self.echo.load(Ordering::Relaxed) {
            eprintln!("{}", entry.render());
        }
        // No receivers is fine
        let _ = self.sender.send(entry);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<LogEntry> {
        self.sender.subscribe()
    }
}

impl Default for LogBroadcaster {
    fn default() -> Self {
        Self::new()
    }
}

pub fn log_info(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Info, msg));
}

pub fn log_success(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Success, msg));
}

pub fn log_error(msg: impl Into<String>) {
    LOG_BROADCASTER.log(LogEntry::new(LogLevel::Error, msg));
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_scoped_entry() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_echo(false);
        let mut rx = broadcaster.subscribe();

        let scope = Scope::file("admob.xlsx", Category::Revenue).section("Sheet2");
        broadcaster.log(scope.entry(LogLevel::Warning, "no revenue column"));

        let entry = rx.try_recv().unwrap();
        assert_eq!(entry.level, LogLevel::Warning);
        assert_eq!(entry.file.as_deref(), Some("admob.xlsx"));
        assert_eq!(entry.category, Some(Category::Revenue));
        assert_eq!(entry.section.as_deref(), Some("Sheet2"));
        assert_eq!(entry.depth(), 2);
    }

    #[test]
    fn test_log_without_subscribers() {
        let broadcaster = LogBroadcaster::new();
        broadcaster.set_echo(false);
        broadcaster.log(LogEntry::new(LogLevel::Info, "nobody listening"));
    }

    #[test]
    fn test_render() {
        let run = LogEntry::new(LogLevel::Error, "no cost rows");
        assert_eq!(run.render(), "❌ no cost rows");

        let file = Scope::file("ads.csv", Category::Cost);
        assert_eq!(file.entry(LogLevel::Info, "csv").render(), "   csv");

        // A CSV's only section is named after the file
        let csv_section = file.section("ads.csv").entry(LogLevel::Success, "3 rows");
        assert_eq!(csv_section.render(), "      ✓ 3 rows");

        let sheet = Scope::file("ads.xlsx", Category::Cost).section("Search");
        assert_eq!(sheet.entry(LogLevel::Info, "1 row").render(), "      [Search] 1 row");
    }

    #[test]
    fn test_entry_serialization() {
        let json = serde_json::to_value(LogEntry::new(LogLevel::Success, "done")).unwrap();
        assert_eq!(json["level"], "success");
        assert!(json.get("file").is_none());

        let scoped = Scope::file("ads.csv", Category::Cost).entry(LogLevel::Info, "x");
        let json = serde_json::to_value(scoped).unwrap();
        assert_eq!(json["file"], "ads.csv");
        assert_eq!(json["category"], "cost");
    }
}
