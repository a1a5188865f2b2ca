use reqwest::Url;

use crate::error::{RegistryError, Result};

/// 配置验证器
pub struct ConfigValidator;

impl ConfigValidator {
    /// 验证注册中心地址，返回解析后的 URL
    pub fn validate_url(url: &str) -> Result<Url> {
        if url.trim().is_empty() {
            return Err(RegistryError::Construction(
                "registry base url must not be empty".to_string(),
            ));
        }

        let parsed = Url::parse(url)
            .map_err(|e| RegistryError::Construction(format!("malformed base url `{url}`: {e}")))?;

        if parsed.scheme() != "http" && parsed.scheme() != "https" {
            return Err(RegistryError::Construction(format!(
                "base url must use http or https, got `{}`",
                parsed.scheme()
            )));
        }
        if parsed.cannot_be_a_base() {
            return Err(RegistryError::Construction(format!(
                "base url `{url}` cannot carry a path"
            )));
        }

        Ok(parsed)
    }

    /// 验证超时时间
    pub fn validate_timeout(name: &str, seconds: u64) -> Result<()> {
        if seconds == 0 {
            return Err(RegistryError::Config(format!("{name} must be greater than zero")));
        }
        Ok(())
    }

    /// 验证认证字段
    pub fn validate_credential(name: &str, value: &str) -> Result<()> {
        if value.trim().is_empty() {
            return Err(RegistryError::Config(format!("{name} must not be empty")));
        }
        Ok(())
    }
}
