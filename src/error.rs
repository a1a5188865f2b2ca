use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("registry resource not found (status {status}): {message}")]
    NotFound {
        status: u16,
        error_code: Option<i32>,
        message: String,
    },
    #[error("registry transport failure{}: {message}", fmt_status(.status))]
    Transport {
        status: Option<u16>,
        error_code: Option<i32>,
        message: String,
    },
    #[error("invalid registry client setup: {0}")]
    Construction(String),
    #[error("invalid schema: {0}")]
    InvalidSchema(String),
    #[error("configuration error: {0}")]
    Config(String),
}

fn fmt_status(status: &Option<u16>) -> String {
    match status {
        Some(status) => format!(" (status {status})"),
        None => String::new(),
    }
}

impl RegistryError {
    pub fn transport(message: impl Into<String>) -> Self {
        RegistryError::Transport {
            status: None,
            error_code: None,
            message: message.into(),
        }
    }

    /// 远端明确表示 ID / subject / version 不存在
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// HTTP 状态码（若错误来自一个 HTTP 响应）
    pub fn status(&self) -> Option<u16> {
        match self {
            RegistryError::NotFound { status, .. } => Some(*status),
            RegistryError::Transport { status, .. } => *status,
            _ => None,
        }
    }

    /// 注册中心返回的 `error_code`（例如 40401 subject 不存在）
    pub fn error_code(&self) -> Option<i32> {
        match self {
            RegistryError::NotFound { error_code, .. }
            | RegistryError::Transport { error_code, .. } => *error_code,
            _ => None,
        }
    }
}
