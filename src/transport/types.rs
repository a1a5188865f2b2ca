use serde::{Deserialize, Serialize};

/// GET /schemas/ids/{id}
#[derive(Debug, Deserialize)]
pub(crate) struct SchemaResponse {
    pub schema: String,
}

/// GET /subjects/{subject}/versions/{version}，以及 POST /subjects/{subject}
#[derive(Debug, Deserialize)]
pub(crate) struct SubjectVersionResponse {
    #[serde(default)]
    pub version: Option<u32>,
    pub id: u32,
    #[serde(default)]
    pub schema: Option<String>,
}

/// POST /subjects/{subject}/versions
#[derive(Debug, Deserialize)]
pub(crate) struct IdResponse {
    pub id: u32,
}

#[derive(Debug, Serialize)]
pub(crate) struct RegisterSchemaRequest<'a> {
    pub schema: &'a str,
}

/// 非 2xx 响应体
#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub error_code: Option<i32>,
    #[serde(default)]
    pub message: Option<String>,
}
