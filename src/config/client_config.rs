use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::env::EnvConfig;
use crate::error::{RegistryError, Result};
use crate::utils::validation::ConfigValidator;

pub const ENV_URL: &str = "SCHEMA_REGISTRY_URL";
pub const ENV_USERNAME: &str = "SCHEMA_REGISTRY_USERNAME";
pub const ENV_PASSWORD: &str = "SCHEMA_REGISTRY_PASSWORD";
pub const ENV_TOKEN: &str = "SCHEMA_REGISTRY_TOKEN";
pub const ENV_TIMEOUT_SECS: &str = "SCHEMA_REGISTRY_TIMEOUT_SECS";

/// 认证配置，密钥可写成 `${VAR}` 在构建客户端时解析
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AuthConfig {
    #[default]
    None,
    Basic { username: String, password: String },
    Bearer { token: String },
}

impl AuthConfig {
    /// 返回把 `${VAR}` 替换为环境变量值后的副本
    pub fn resolved(&self) -> Result<AuthConfig> {
        Ok(match self {
            AuthConfig::None => AuthConfig::None,
            AuthConfig::Basic { username, password } => AuthConfig::Basic {
                username: EnvConfig::resolve_secret(username)?,
                password: EnvConfig::resolve_secret(password)?,
            },
            AuthConfig::Bearer { token } => AuthConfig::Bearer {
                token: EnvConfig::resolve_secret(token)?,
            },
        })
    }
}

/// 注册中心客户端配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistryClientConfig {
    pub base_url: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
    #[serde(default = "default_connect_timeout_seconds")]
    pub connect_timeout_seconds: u64,
    #[serde(default)]
    pub auth: AuthConfig,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub headers: HashMap<String, String>,
    /// 同一个键的并发首次未命中只发一次请求
    #[serde(default = "default_single_flight")]
    pub single_flight: bool,
}

fn default_timeout_seconds() -> u64 {
    30
}

fn default_connect_timeout_seconds() -> u64 {
    10
}

fn default_single_flight() -> bool {
    true
}

fn whole_seconds(duration: Duration) -> u64 {
    let seconds = duration.as_secs() + u64::from(duration.subsec_nanos() > 0);
    seconds.max(1)
}

impl RegistryClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            timeout_seconds: default_timeout_seconds(),
            connect_timeout_seconds: default_connect_timeout_seconds(),
            auth: AuthConfig::None,
            headers: HashMap::new(),
            single_flight: default_single_flight(),
        }
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// 超时以整秒保存，不足一秒的部分向上取整
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_seconds = whole_seconds(timeout);
        self
    }

    /// 同 `with_timeout`，按整秒向上取整
    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout_seconds = whole_seconds(timeout);
        self
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.single_flight = enabled;
        self
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_seconds)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_seconds)
    }

    /// 从 JSON 文件加载
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            RegistryError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: RegistryClientConfig = serde_json::from_str(&content).map_err(|e| {
            RegistryError::Config(format!("failed to parse {}: {e}", path.display()))
        })?;
        config.validate()?;
        Ok(config)
    }

    /// 从环境变量加载
    ///
    /// 优先级：`SCHEMA_REGISTRY_TOKEN` 存在时使用 bearer 认证，
    /// 否则同时设置用户名和密码时使用 basic 认证。
    pub fn from_env() -> Result<Self> {
        let mut config = Self::new(EnvConfig::get_env(ENV_URL)?);

        if let Some(timeout) = EnvConfig::get_env_optional(ENV_TIMEOUT_SECS) {
            config.timeout_seconds = timeout.parse().map_err(|_| {
                RegistryError::Config(format!("{ENV_TIMEOUT_SECS} must be an integer, got `{timeout}`"))
            })?;
        }

        if let Some(token) = EnvConfig::get_env_optional(ENV_TOKEN) {
            config.auth = AuthConfig::Bearer { token };
        } else if let (Some(username), Some(password)) = (
            EnvConfig::get_env_optional(ENV_USERNAME),
            EnvConfig::get_env_optional(ENV_PASSWORD),
        ) {
            config.auth = AuthConfig::Basic { username, password };
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        ConfigValidator::validate_url(&self.base_url)?;
        ConfigValidator::validate_timeout("timeout_seconds", self.timeout_seconds)?;
        ConfigValidator::validate_timeout("connect_timeout_seconds", self.connect_timeout_seconds)?;
        match &self.auth {
            AuthConfig::None => {}
            AuthConfig::Basic { username, password } => {
                ConfigValidator::validate_credential("auth.username", username)?;
                ConfigValidator::validate_credential("auth.password", password)?;
            }
            AuthConfig::Bearer { token } => {
                ConfigValidator::validate_credential("auth.token", token)?;
            }
        }
        Ok(())
    }
}
