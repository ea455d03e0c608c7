use std::env;
use std::fmt;
use std::net::IpAddr;
use std::str::FromStr;
use thiserror::Error;

/// 開発・テスト環境でのみ使う署名鍵
const DEVELOPMENT_JWT_SECRET: &str = "todo-app-development-secret";

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },

    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}

/// 実行モード
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeMode {
    Development,
    Test,
    Production,
}

impl RuntimeMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            RuntimeMode::Development => "development",
            RuntimeMode::Test => "test",
            RuntimeMode::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, RuntimeMode::Production)
    }
}

impl FromStr for RuntimeMode {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" | "dev" => Ok(RuntimeMode::Development),
            "test" => Ok(RuntimeMode::Test),
            "production" | "prod" => Ok(RuntimeMode::Production),
            _ => Err(ConfigError::InvalidValue {
                key: "APP_ENV",
                value: s.to_string(),
            }),
        }
    }
}

/// ドキュメントストアのバックエンド
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreBackend {
    DynamoDb,
    Memory,
}

impl FromStr for StoreBackend {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dynamodb" => Ok(StoreBackend::DynamoDb),
            "memory" => Ok(StoreBackend::Memory),
            _ => Err(ConfigError::InvalidValue {
                key: "STORE_BACKEND",
                value: s.to_string(),
            }),
        }
    }
}

/// プロセス起動時に一度だけ読み込む設定
#[derive(Clone)]
pub struct Config {
    pub environment: RuntimeMode,
    pub bind_addr: IpAddr,
    pub port: u16,
    pub store_backend: StoreBackend,
    pub dynamodb_table: String,
    pub dynamodb_endpoint: Option<String>,
    pub aws_region: String,
    pub jwt_secret: String,
    /// `JWT_SECRET` が未設定で開発用の署名鍵にフォールバックしたか
    pub uses_development_secret: bool,
}

impl Config {
    /// 環境変数（と `.env`）から設定を読み込む
    ///
    /// トレーシング初期化前に呼ばれるため、ここではログを出さない。
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 任意のキー検索関数から設定を組み立てる
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = match lookup("APP_ENV") {
            Some(value) => value.parse()?,
            None => RuntimeMode::Development,
        };

        let port = match lookup("PORT") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "PORT",
                value,
            })?,
            None => 3000,
        };

        let bind_addr = match lookup("BIND_ADDR") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidValue {
                key: "BIND_ADDR",
                value,
            })?,
            None => IpAddr::from([0, 0, 0, 0]),
        };

        let store_backend = match lookup("STORE_BACKEND") {
            Some(value) => value.parse()?,
            None if environment == RuntimeMode::Test => StoreBackend::Memory,
            None => StoreBackend::DynamoDb,
        };

        let (jwt_secret, uses_development_secret) = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => (secret, false),
            _ if environment.is_production() => return Err(ConfigError::Missing("JWT_SECRET")),
            _ => (DEVELOPMENT_JWT_SECRET.to_string(), true),
        };

        Ok(Config {
            environment,
            bind_addr,
            port,
            store_backend,
            dynamodb_table: lookup("DYNAMODB_TABLE")
                .unwrap_or_else(|| format!("todo-app-{}", environment.as_str())),
            dynamodb_endpoint: lookup("DYNAMODB_ENDPOINT"),
            aws_region: lookup("AWS_REGION").unwrap_or_else(|| "ap-northeast-1".to_string()),
            jwt_secret,
            uses_development_secret,
        })
    }
}

// 署名鍵をログに出さない
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("environment", &self.environment)
            .field("bind_addr", &self.bind_addr)
            .field("port", &self.port)
            .field("store_backend", &self.store_backend)
            .field("dynamodb_table", &self.dynamodb_table)
            .field("dynamodb_endpoint", &self.dynamodb_endpoint)
            .field("aws_region", &self.aws_region)
            .field("jwt_secret", &"<redacted>")
            .field("uses_development_secret", &self.uses_development_secret)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_for_development() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.environment, RuntimeMode::Development);
        assert_eq!(config.port, 3000);
        assert_eq!(config.store_backend, StoreBackend::DynamoDb);
        assert_eq!(config.dynamodb_table, "todo-app-development");
        assert_eq!(config.jwt_secret, DEVELOPMENT_JWT_SECRET);
        assert!(config.uses_development_secret);
    }

    #[test]
    fn test_explicit_secret_is_not_flagged_as_development() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "s3cret")])).unwrap();
        assert_eq!(config.jwt_secret, "s3cret");
        assert!(!config.uses_development_secret);

        // 空文字は未設定と同じ扱い
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "")])).unwrap();
        assert!(config.uses_development_secret);
    }

    #[test]
    fn test_test_mode_defaults_to_memory_store() {
        let config = Config::from_lookup(lookup(&[("APP_ENV", "test")])).unwrap();
        assert_eq!(config.store_backend, StoreBackend::Memory);
        assert_eq!(config.dynamodb_table, "todo-app-test");
    }

    #[test]
    fn test_production_requires_secret() {
        let err = Config::from_lookup(lookup(&[("APP_ENV", "production")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing("JWT_SECRET"));

        let config = Config::from_lookup(lookup(&[
            ("APP_ENV", "production"),
            ("JWT_SECRET", "s3cret"),
            ("PORT", "8080"),
            ("DYNAMODB_ENDPOINT", "http://localhost:8000"),
        ]))
        .unwrap();
        assert_eq!(config.port, 8080);
        assert_eq!(config.dynamodb_endpoint.as_deref(), Some("http://localhost:8000"));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        assert!(Config::from_lookup(lookup(&[("PORT", "eighty")])).is_err());
        assert!(Config::from_lookup(lookup(&[("APP_ENV", "staging")])).is_err());
        assert!(Config::from_lookup(lookup(&[("STORE_BACKEND", "mongo")])).is_err());
    }

    #[test]
    fn test_debug_redacts_secret() {
        let config = Config::from_lookup(lookup(&[("JWT_SECRET", "top-secret")])).unwrap();
        let printed = format!("{config:?}");
        assert!(!printed.contains("top-secret"));
    }
}
