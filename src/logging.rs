use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Registry};

use crate::config::Config;

const LOG_FILE_PREFIX: &str = "bond-backend";
const MAX_LOG_FILES: usize = 30;

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
}

impl Default for LogConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            enable_file_logs: false,
            log_dir: "./logs".to_string(),
        }
    }
}

impl From<&Config> for LogConfig {
    fn from(config: &Config) -> Self {
        Self {
            log_level: config.log_level.clone(),
            enable_file_logs: config.enable_file_logs,
            log_dir: config.log_dir.clone(),
        }
    }
}

/// 初始化全局 subscriber，可重复调用（测试中常见）。
///
/// 启用文件日志时返回后台写线程的 guard，调用方需持有到进程退出，否则尾部日志会丢失。
/// 日志目录不可用时退回仅 stdout。
pub fn init_tracing(config: &LogConfig) -> Option<WorkerGuard> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    let stdout_layer = fmt::layer().with_target(true).with_thread_ids(false);
    let registry = Registry::default().with(env_filter).with(stdout_layer);

    if config.enable_file_logs {
        let appender = RollingFileAppender::builder()
            .rotation(Rotation::DAILY)
            .filename_prefix(LOG_FILE_PREFIX)
            .filename_suffix("log")
            .max_log_files(MAX_LOG_FILES)
            .build(&config.log_dir);

        match appender {
            Ok(appender) => {
                let (writer, guard) = tracing_appender::non_blocking(appender);
                let file_layer = fmt::layer().with_writer(writer).with_ansi(false).json();
                if registry.with(file_layer).try_init().is_err() {
                    return None;
                }
                tracing::info!(log_dir = %config.log_dir, "File logging enabled");
                return Some(guard);
            }
            Err(e) => {
                let _ = registry.try_init();
                tracing::warn!(
                    log_dir = %config.log_dir,
                    error = %e,
                    "Rolling file appender unavailable, logging to stdout only"
                );
                return None;
            }
        }
    }

    // 全局 subscriber 已设置时 try_init 返回错误，忽略即可
    let _ = registry.try_init();
    None
}
