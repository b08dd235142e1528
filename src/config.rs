//! 配置系统
//! 从环境变量加载所有配置，使用 Secret 包装敏感信息

use config::{Config, ConfigError, Environment};
use secrecy::{ExposeSecret, Secret};
use serde::Deserialize;

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 监听地址，例如 "0.0.0.0:8000"
    pub addr: String,
    /// 优雅关闭超时时间（秒）
    pub graceful_shutdown_timeout_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// 数据库连接 URL（使用 Secret 包装，防止日志泄露）
    pub url: Secret<String>,
    /// 最大连接数
    pub max_connections: u32,
    /// 最小连接数
    pub min_connections: u32,
    /// 获取连接超时时间（秒）
    pub acquire_timeout_secs: u64,
    /// 空闲连接超时时间（秒）
    pub idle_timeout_secs: u64,
    /// 连接最大生命周期（秒）
    pub max_lifetime_secs: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 日志级别: trace, debug, info, warn, error
    pub level: String,
    /// 日志格式: json, pretty
    pub format: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SecurityConfig {
    /// 访问令牌签名密钥
    pub access_token_secret: Secret<String>,
    /// 访问令牌过期时间（秒）
    pub access_token_exp_secs: u64,
    /// 刷新令牌签名密钥（必须与访问令牌密钥不同）
    pub refresh_token_secret: Secret<String>,
    /// 刷新令牌过期时间（秒）
    pub refresh_token_exp_secs: u64,
    /// Argon2 内存开销（KiB）
    pub password_hash_memory_kib: u32,
    /// Argon2 迭代次数
    pub password_hash_iterations: u32,
    /// Argon2 并行度
    pub password_hash_parallelism: u32,
    /// Cookie 是否带 Secure 标记
    pub cookie_secure: bool,
    /// 修改密码时是否同时作废已保存的刷新令牌
    pub revoke_sessions_on_password_change: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub logging: LoggingConfig,
    pub security: SecurityConfig,
}

impl AppConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> Result<Self, ConfigError> {
        let mut settings = Config::builder();

        // 添加默认配置
        settings = settings
            .set_default("server.addr", "0.0.0.0:8000")?
            .set_default("server.graceful_shutdown_timeout_secs", 30)?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 2)?
            .set_default("database.acquire_timeout_secs", 30)?
            .set_default("database.idle_timeout_secs", 600)?
            .set_default("database.max_lifetime_secs", 1800)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "json")?
            .set_default("security.access_token_exp_secs", 900)?
            .set_default("security.refresh_token_exp_secs", 864000)?
            .set_default("security.password_hash_memory_kib", 19456)?
            .set_default("security.password_hash_iterations", 2)?
            .set_default("security.password_hash_parallelism", 1)?
            .set_default("security.cookie_secure", true)?
            .set_default("security.revoke_sessions_on_password_change", false)?;

        // 从环境变量加载配置（前缀为 VIDSHARE_）
        settings = settings.add_source(
            Environment::with_prefix("VIDSHARE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config: AppConfig = settings.build()?.try_deserialize()?;

        // 验证配置
        config.validate()?;

        Ok(config)
    }

    /// 验证配置合法性
    pub fn validate(&self) -> Result<(), ConfigError> {
        // 验证端口范围（0 表示随机端口）
        if let Some(port_str) = self.server.addr.split(':').next_back() {
            if let Ok(port) = port_str.parse::<u16>() {
                if port != 0 && port < 1024 {
                    return Err(ConfigError::Message("Server port should be >= 1024".to_string()));
                }
            }
        }

        // 验证日志级别
        match self.logging.level.to_lowercase().as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log level: {}. Must be one of: trace, debug, info, warn, error",
                    self.logging.level
                )))
            }
        }

        // 验证日志格式
        match self.logging.format.to_lowercase().as_str() {
            "json" | "pretty" => {}
            _ => {
                return Err(ConfigError::Message(format!(
                    "Invalid log format: {}. Must be one of: json, pretty",
                    self.logging.format
                )))
            }
        }

        // 验证数据库连接池配置
        if self.database.max_connections < self.database.min_connections {
            return Err(ConfigError::Message(
                "max_connections must be >= min_connections".to_string(),
            ));
        }

        // 验证令牌密钥（至少 32 字符，且两种令牌不能共用密钥）
        let access_secret = self.security.access_token_secret.expose_secret();
        let refresh_secret = self.security.refresh_token_secret.expose_secret();
        if access_secret.len() < 32 || refresh_secret.len() < 32 {
            return Err(ConfigError::Message(
                "Token secrets must be at least 32 characters long".to_string(),
            ));
        }
        if access_secret == refresh_secret {
            return Err(ConfigError::Message(
                "access_token_secret and refresh_token_secret must differ".to_string(),
            ));
        }

        // 验证令牌过期时间
        if self.security.access_token_exp_secs < 60 || self.security.access_token_exp_secs > 86400 {
            return Err(ConfigError::Message(
                "access_token_exp_secs must be between 60 and 86400 (1 minute to 24 hours)"
                    .to_string(),
            ));
        }

        if self.security.refresh_token_exp_secs < 3600
            || self.security.refresh_token_exp_secs > 2592000
        {
            return Err(ConfigError::Message(
                "refresh_token_exp_secs must be between 3600 and 2592000 (1 hour to 30 days)"
                    .to_string(),
            ));
        }

        // 验证 Argon2 参数
        argon2::Params::new(
            self.security.password_hash_memory_kib,
            self.security.password_hash_iterations,
            self.security.password_hash_parallelism,
            None,
        )
        .map_err(|e| ConfigError::Message(format!("Invalid password hash parameters: {}", e)))?;

        Ok(())
    }
}
