use std::env;
use std::net::{IpAddr, Ipv4Addr};
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub log_level: String,
    pub enable_file_logs: bool,
    pub log_dir: String,
    pub sled_path: String,
    pub cors_origin: String,
    pub engine: EngineEnvConfig,
}

#[derive(Debug, Clone)]
pub struct EngineEnvConfig {
    pub secondary_threshold: u8,
    pub devotional_unit_hours: u32,
    pub game_sample_size: usize,
    pub game_max_sample_size: usize,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            host: env_or_parse("HOST", IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))),
            port: env_or_parse("PORT", 3000_u16),
            log_level: env_or("RUST_LOG", "info"),
            enable_file_logs: env_or_bool("ENABLE_FILE_LOGS", false),
            log_dir: env_or("LOG_DIR", "./logs"),
            sled_path: env_or("SLED_PATH", "./data/bond.sled"),
            cors_origin: env_or("CORS_ORIGIN", "http://localhost:5173"),
            engine: EngineEnvConfig {
                secondary_threshold: env_or_parse("ROTATION_SECONDARY_THRESHOLD", 7_u8),
                devotional_unit_hours: env_or_parse("DEVOTIONAL_UNIT_HOURS", 24_u32),
                game_sample_size: env_or_parse("GAME_SAMPLE_SIZE", 10_usize),
                game_max_sample_size: env_or_parse("GAME_MAX_SAMPLE_SIZE", 50_usize),
            },
        }
    }
}

pub fn env_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| default.to_string())
}

pub fn env_or_parse<T>(key: &str, default: T) -> T
where
    T: FromStr + Copy,
{
    match env::var(key) {
        Ok(raw) => match raw.parse::<T>() {
            Ok(v) => v,
            Err(_) => {
                tracing::warn!(
                    key,
                    value = %raw,
                    "Failed to parse env var, using default"
                );
                default
            }
        },
        Err(_) => default,
    }
}

pub fn env_or_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(raw) => match raw.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => true,
            "0" | "false" | "no" | "off" => false,
            _ => default,
        },
        Err(_) => default,
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Mutex, OnceLock};

    use super::*;

    fn env_lock() -> &'static Mutex<()> {
        static LOCK: OnceLock<Mutex<()>> = OnceLock::new();
        LOCK.get_or_init(|| Mutex::new(()))
    }

    fn managed_keys() -> &'static [&'static str] {
        &[
            "PORT",
            "RUST_LOG",
            "ENABLE_FILE_LOGS",
            "ROTATION_SECONDARY_THRESHOLD",
            "DEVOTIONAL_UNIT_HOURS",
            "GAME_SAMPLE_SIZE",
        ]
    }

    fn clear_keys(keys: &[&str]) {
        for key in keys {
            env::remove_var(key);
        }
    }

    #[test]
    fn loads_defaults_when_missing() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.engine.secondary_threshold, 7);
        assert_eq!(cfg.engine.devotional_unit_hours, 24);
        assert!(!cfg.enable_file_logs);
    }

    #[test]
    fn parses_engine_values() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ROTATION_SECONDARY_THRESHOLD", "8");
        env::set_var("DEVOTIONAL_UNIT_HOURS", "12");
        env::set_var("GAME_SAMPLE_SIZE", "5");

        let cfg = Config::from_env();
        assert_eq!(cfg.engine.secondary_threshold, 8);
        assert_eq!(cfg.engine.devotional_unit_hours, 12);
        assert_eq!(cfg.engine.game_sample_size, 5);

        clear_keys(managed_keys());
    }

    #[test]
    fn invalid_values_fall_back() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("PORT", "bad");
        env::set_var("ROTATION_SECONDARY_THRESHOLD", "-1");

        let cfg = Config::from_env();
        assert_eq!(cfg.port, 3000);
        assert_eq!(cfg.engine.secondary_threshold, 7);

        clear_keys(managed_keys());
    }

    #[test]
    fn bool_flags_accept_common_spellings() {
        let _guard = env_lock().lock().expect("env lock");
        clear_keys(managed_keys());

        env::set_var("ENABLE_FILE_LOGS", "Yes");
        assert!(Config::from_env().enable_file_logs);
        env::set_var("ENABLE_FILE_LOGS", "maybe");
        assert!(!Config::from_env().enable_file_logs);

        clear_keys(managed_keys());
    }
}
