use ::config::{Config, ConfigBuilder, ConfigError, File, FileFormat};
use ::config::builder::DefaultState;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// 默认配置文件 (工作目录下，可选)
pub const CONFIG_FILE: &str = "config.json";

/// 应用配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub ocr: OcrConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// 秒
    pub read_timeout: u64,
    /// 秒
    pub write_timeout: u64,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub username: String,
    pub password: String,
    pub database: String,
    pub max_connections: u32,
}

#[derive(Clone, Serialize, Deserialize)]
pub struct OcrConfig {
    pub region: String,
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    pub upload_dir: PathBuf,
    pub static_dir: PathBuf,
}

// 日志里不打印密码和密钥
impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("username", &self.username)
            .field("password", &"***")
            .field("database", &self.database)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl fmt::Debug for OcrConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OcrConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id.as_ref().map(|_| "***"))
            .field("secret_access_key", &self.secret_access_key.as_ref().map(|_| "***"))
            .finish()
    }
}

impl OcrConfig {
    /// 访问密钥与私钥同时存在且非空
    pub fn credentials(&self) -> Option<(&str, &str)> {
        match (self.access_key_id.as_deref(), self.secret_access_key.as_deref()) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => Some((key, secret)),
            _ => None,
        }
    }
}

/// 环境变量 -> 配置键
const ENV_OVERRIDES: &[(&str, &str)] = &[
    ("SERVER_HOST", "server.host"),
    ("SERVER_PORT", "server.port"),
    ("DB_HOST", "database.host"),
    ("DB_PORT", "database.port"),
    ("DB_USER", "database.username"),
    ("DB_PASSWORD", "database.password"),
    ("DB_NAME", "database.database"),
    ("AWS_REGION", "ocr.region"),
    ("AWS_ACCESS_KEY_ID", "ocr.access_key_id"),
    ("AWS_SECRET_ACCESS_KEY", "ocr.secret_access_key"),
    ("UPLOAD_DIR", "storage.upload_dir"),
];

static GLOBAL: OnceLock<AppConfig> = OnceLock::new();

impl AppConfig {
    /// 进程级单例：首次调用时加载 (默认值 -> config.json -> 环境变量)
    pub fn global() -> &'static AppConfig {
        GLOBAL.get_or_init(|| {
            Self::load(Path::new(CONFIG_FILE), |key| std::env::var(key).ok()).unwrap_or_else(|e| {
                tracing::warn!("Invalid configuration ({}), falling back to defaults", e);
                Self::default()
            })
        })
    }

    /// 加载配置。配置文件格式错误时记录日志并忽略该文件
    pub fn load<F>(path: &Path, env: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let with_file = Self::layered(&env)?
            .add_source(File::from(path).format(FileFormat::Json).required(false))
            .build()
            .and_then(|c| c.try_deserialize::<AppConfig>());

        match with_file {
            Ok(config) => Ok(config),
            Err(e) => {
                tracing::warn!("Failed to load config file {}: {}", path.display(), e);
                Self::layered(&env)?.build()?.try_deserialize()
            }
        }
    }

    fn layered<F>(env: &F) -> Result<ConfigBuilder<DefaultState>, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let mut builder = Config::builder()
            .set_default("server.host", defaults.server.host)?
            .set_default("server.port", i64::from(defaults.server.port))?
            .set_default("server.read_timeout", defaults.server.read_timeout as i64)?
            .set_default("server.write_timeout", defaults.server.write_timeout as i64)?
            .set_default("database.host", defaults.database.host)?
            .set_default("database.port", i64::from(defaults.database.port))?
            .set_default("database.username", defaults.database.username)?
            .set_default("database.password", defaults.database.password)?
            .set_default("database.database", defaults.database.database)?
            .set_default("database.max_connections", i64::from(defaults.database.max_connections))?
            .set_default("ocr.region", defaults.ocr.region)?
            .set_default(
                "storage.upload_dir",
                defaults.storage.upload_dir.to_string_lossy().to_string(),
            )?
            .set_default(
                "storage.static_dir",
                defaults.storage.static_dir.to_string_lossy().to_string(),
            )?;

        for (var, key) in ENV_OVERRIDES {
            let value = env(var).filter(|v| !v.is_empty());
            builder = builder.set_override_option(*key, value)?;
        }

        Ok(builder)
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
                read_timeout: 10,
                write_timeout: 10,
            },
            database: DatabaseConfig {
                host: "postgres".to_string(),
                port: 5432,
                username: "postgres".to_string(),
                password: "postgres".to_string(),
                database: "cereja".to_string(),
                max_connections: 20,
            },
            ocr: OcrConfig {
                region: "us-east-1".to_string(),
                access_key_id: None,
                secret_access_key: None,
            },
            storage: StorageConfig {
                upload_dir: PathBuf::from("./uploads/receipts"),
                static_dir: PathBuf::from("./internal/receipts/static"),
            },
        }
    }
}
