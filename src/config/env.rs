use crate::error::{RegistryError, Result};
use std::env;

/// 环境变量配置管理
pub struct EnvConfig;

impl EnvConfig {
    /// 解析可能引用环境变量的密钥值
    ///
    /// - `${VAR_NAME}` 形式：读取对应环境变量，未设置时报错
    /// - 其他值：原样返回
    pub fn resolve_secret(value: &str) -> Result<String> {
        if value.starts_with("${") && value.ends_with('}') && value.len() > 3 {
            let env_var_name = &value[2..value.len() - 1];
            Self::get_env(env_var_name)
        } else {
            Ok(value.to_string())
        }
    }

    /// 从环境变量获取值
    pub fn get_env(key: &str) -> Result<String> {
        env::var(key).map_err(|_| {
            RegistryError::Config(format!("environment variable `{key}` is not set"))
        })
    }

    /// 获取可选的环境变量
    pub fn get_env_optional(key: &str) -> Option<String> {
        env::var(key).ok().filter(|value| !value.is_empty())
    }
}
