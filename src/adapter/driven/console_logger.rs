use crate::domain::port::{LogLevel, Logger};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

/// ログエントリ
/// 構造化ログの基本構造を定義。
/// アダプター層の実装詳細として配置
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub level: LogLevel,
    pub message: String,
    pub correlation_id: Option<Uuid>,
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
            correlation_id: None,
            component,
            additional_context: HashMap::new(),
        }
    }

    /// 相関IDを設定
    pub fn with_correlation_id(mut self, correlation_id: Uuid) -> Self {
        self.correlation_id = Some(correlation_id);
        self
    }

    /// 追加コンテキストを設定
    pub fn with_context(mut self, key: String, value: String) -> Self {
        self.additional_context.insert(key, value);
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

        if let Some(correlation_id) = self.correlation_id {
            parts.push(format!("[correlation_id: {}]", correlation_id));
        }

        parts.push(self.message.clone());

        if !self.additional_context.is_empty() {
            let context_str = self
                .additional_context
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join(", ");
            parts.push(format!("[{}]", context_str));
        }

        parts.join(" ")
    }
}

/// コンソールログ実装
/// 標準出力・標準エラー出力にログを出力する
pub struct ConsoleLogger;

impl ConsoleLogger {
    pub fn new() -> Self {
        Self
    }

    fn build_entry(
        level: LogLevel,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) -> LogEntry {
        let mut entry = LogEntry::new(level, message.to_string(), component.to_string());

        if let Some(corr_id) = correlation_id {
            entry = entry.with_correlation_id(corr_id);
        }

        if let Some(ctx) = context {
            for (key, value) in ctx {
                entry = entry.with_context(key, value);
            }
        }

        entry
    }
}

impl Default for ConsoleLogger {
    fn default() -> Self {
        Self::new()
    }
}

impl Logger for ConsoleLogger {
    fn debug(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        let entry = Self::build_entry(LogLevel::Debug, component, message, correlation_id, context);
        println!("{}", entry.format());
    }

    fn info(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        let entry = Self::build_entry(LogLevel::Info, component, message, correlation_id, context);
        println!("{}", entry.format());
    }

    fn warn(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        let entry =
            Self::build_entry(LogLevel::Warning, component, message, correlation_id, context);
        println!("{}", entry.format());
    }

    fn error(
        &self,
        component: &str,
        message: &str,
        correlation_id: Option<Uuid>,
        context: Option<HashMap<String, String>>,
    ) {
        let entry = Self::build_entry(LogLevel::Error, component, message, correlation_id, context);
        eprintln!("{}", entry.format());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_entry_creation() {
        let entry = LogEntry::new(
            LogLevel::Info,
            "予約を作成しました".to_string(),
            "ReservationApplicationService".to_string(),
        );

        assert_eq!(entry.level, LogLevel::Info);
        assert_eq!(entry.message, "予約を作成しました");
        assert_eq!(entry.component, "ReservationApplicationService");
        assert!(entry.correlation_id.is_none());
    }

    #[test]
    fn test_log_entry_format_contains_all_parts() {
        let correlation_id = Uuid::new_v4();
        let entry = LogEntry::new(
            LogLevel::Warning,
            "期間が重複しています".to_string(),
            "ReservationApplicationService".to_string(),
        )
        .with_correlation_id(correlation_id)
        .with_context("car_id".to_string(), "abc".to_string());

        let formatted = entry.format();

        assert!(formatted.contains("[WARN]"));
        assert!(formatted.contains("[ReservationApplicationService]"));
        assert!(formatted.contains(&format!("[correlation_id: {}]", correlation_id)));
        assert!(formatted.contains("期間が重複しています"));
        assert!(formatted.contains("car_id=abc"));
    }

    #[test]
    fn test_console_logger_output_does_not_panic() {
        // 出力内容の検証は困難なため、各レベルで出力できることのみ確認
        let logger = ConsoleLogger::new();
        let correlation_id = Uuid::new_v4();
        let mut context = HashMap::new();
        context.insert("key1".to_string(), "value1".to_string());

        logger.debug("Test", "debug message", None, None);
        logger.info("Test", "info message", Some(correlation_id), None);
        logger.warn("Test", "warn message", None, Some(context));
        logger.error("Test", "error message", None, None);
    }
}
