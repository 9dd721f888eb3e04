use chrono::FixedOffset;
use thiserror::Error;

/// 永続化の方式
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageConfig {
    /// プロセス内メモリ（再起動で消える）
    Memory,
    Postgres(DbConfig),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub max_connections: u32,
}

/// 起動時に一度だけ読み込む設定
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub storage: StorageConfig,
    pub port: u16,
    /// 「今日」を判定するコミュニティのUTCオフセット
    pub community_offset: FixedOffset,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{key} must be set when STORAGE=postgres")]
    Missing { key: &'static str },

    #[error("{key} has an invalid value: {value}")]
    Invalid { key: &'static str, value: String },
}

const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

impl AppConfig {
    /// 環境変数から読み込む
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の参照関数から読み込む
    ///
    /// 未設定の項目は既定値になる。値が不正なら起動を止める。
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let storage = match lookup("STORAGE").as_deref() {
            None | Some("memory") => StorageConfig::Memory,
            Some("postgres") => {
                let url = lookup("DATABASE_URL").ok_or(ConfigError::Missing {
                    key: "DATABASE_URL",
                })?;
                let max_connections =
                    parse_or(&lookup, "DATABASE_MAX_CONNECTIONS", DEFAULT_MAX_CONNECTIONS)?;
                StorageConfig::Postgres(DbConfig {
                    url,
                    max_connections,
                })
            }
            Some(other) => {
                return Err(ConfigError::Invalid {
                    key: "STORAGE",
                    value: other.to_string(),
                });
            }
        };

        let port = parse_or(&lookup, "PORT", DEFAULT_PORT)?;

        let offset_hours: i32 = parse_or(&lookup, "COMMUNITY_UTC_OFFSET_HOURS", 0)?;
        let community_offset = offset_hours
            .checked_mul(3600)
            .and_then(FixedOffset::east_opt)
            .ok_or(ConfigError::Invalid {
                key: "COMMUNITY_UTC_OFFSET_HOURS",
                value: offset_hours.to_string(),
            })?;

        Ok(Self {
            storage,
            port,
            community_offset,
        })
    }
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    match lookup(key) {
        None => Ok(default),
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid { key, value }),
    }
}
