use crate::domain::port::{LogLevel, Logger};
use chrono::{DateTime, Utc};
use std::collections::HashMap;

/// ログエントリ
/// 構造化ログの基本構造を定義
/// アダプター層の実装詳細として配置
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub component: String,
    pub additional_context: HashMap<String, String>,
}

impl LogEntry {
    /// 新しいログエントリを作成
    pub fn new(level: LogLevel, message: String, component: String) -> Self {
        Self {
            timestamp: Utc::now(),
            level,
            message,
            component,
            additional_context: HashMap::new(),
        }
    }

    /// 追加コンテキストを設定
    pub fn with_context_map(mut self, context: HashMap<String, String>) -> Self {
        self.additional_context.extend(context);
        self
    }

    /// ログエントリを文字列として出力
    pub fn format(&self) -> String {
        let level_str = match self.level {
            LogLevel::Debug => "DEBUG",
            LogLevel::Info => "INFO",
            LogLevel::Warning => "WARN",
            LogLevel::Error => "ERROR",
        };

        let mut parts = vec![
            format!("[{}]", self.timestamp.format("%Y-%m-%d %H:%M:%S UTC")),
            format!("[{}]", level_str),
            format!("[{}]", self.component),
        ];

        parts.push(self.message.clone());

        // 追加コンテキストがある場合は追加
        if !self.additional_context.is_empty() {
            let mut pairs: Vec<_> = self.additional_context.iter().collect();
            pairs.sort_by_key(|(k, _)| k.clone());
            let context_str = pairs
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("[{}]", context_str));
        }

        parts.join(" ")
    }
}

/// コンソールロガー
/// ログエントリを整形して標準出力（エラーは標準エラー出力）へ書き出す
#[derive(Debug, Clone, Default)]
pub struct ConsoleLogger;

impl ConsoleLogger {
    /// 新しいコンソールロガーを作成
    pub fn new() -> Self {
        Self
    }

    fn emit(&self, level: LogLevel, component: &str, message: &str, context: Option<HashMap<String, String>>) {
        let mut entry = LogEntry::new(level, message.to_string(), component.to_string());
        if let Some(context) = context {
            entry = entry.with_context_map(context);
        }
        match level {
            LogLevel::Error => eprintln!("{}", entry.format()),
            _ => println!("{}", entry.format()),
        }
    }
}

impl Logger for ConsoleLogger {
    fn debug(&self, component: &str, message: &str, context: Option<HashMap<String, String>>) {
        self.emit(LogLevel::Debug, component, message, context);
    }

    fn info(&self, component: &str, message: &str, context: Option<HashMap<String, String>>) {
        self.emit(LogLevel::Info, component, message, context);
    }

    fn warn(&self, component: &str, message: &str, context: Option<HashMap<String, String>>) {
        self.emit(LogLevel::Warning, component, message, context);
    }

    fn error(&self, component: &str, message: &str, context: Option<HashMap<String, String>>) {
        self.emit(LogLevel::Error, component, message, context);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_format_contains_parts() {
        let entry = LogEntry::new(
            LogLevel::Info,
            "テストメッセージ".to_string(),
            "TestComponent".to_string(),
        );
        let formatted = entry.format();
        assert!(formatted.contains("[INFO]"));
        assert!(formatted.contains("[TestComponent]"));
        assert!(formatted.contains("テストメッセージ"));
    }

    #[test]
    fn test_log_entry_format_with_context() {
        let entry = LogEntry::new(
            LogLevel::Warning,
            "msg".to_string(),
            "C".to_string(),
        )
        .with_context_map(HashMap::from([(
            "key".to_string(),
            "value".to_string(),
        )]));
        let formatted = entry.format();
        assert!(formatted.contains("[WARN]"));
        assert!(formatted.contains("key=value"));
    }
}
