use std::sync::Arc;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Url};
use serde::de::DeserializeOwned;
use tracing::instrument;

use super::types::{ErrorBody, IdResponse, RegisterSchemaRequest, SchemaResponse, SubjectVersionResponse};
use super::RegistryTransport;
use crate::config::{AuthConfig, RegistryClientConfig};
use crate::error::{RegistryError, Result};
use crate::schema::{AvroSchemaParser, DynSchemaParser, Schema, SchemaVersion, SchemaWithId};
use crate::utils::validation::ConfigValidator;

const SCHEMA_REGISTRY_CONTENT_TYPE: &str = "application/vnd.schemaregistry.v1+json";

/// 基于 reqwest 的注册中心传输实现
#[derive(Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: Url,
    auth: AuthConfig,
    parser: DynSchemaParser,
}

impl HttpTransport {
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(&RegistryClientConfig::new(base_url))
    }

    pub fn from_config(config: &RegistryClientConfig) -> Result<Self> {
        Self::with_parser(config, Arc::new(AvroSchemaParser))
    }

    pub fn with_parser(config: &RegistryClientConfig, parser: DynSchemaParser) -> Result<Self> {
        let base_url = ConfigValidator::validate_url(&config.base_url)?;
        config.validate()?;
        let auth = config.auth.resolved()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(SCHEMA_REGISTRY_CONTENT_TYPE));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes()).map_err(|e| {
                RegistryError::Construction(format!("invalid header name `{name}`: {e}"))
            })?;
            let value = HeaderValue::from_str(value).map_err(|e| {
                RegistryError::Construction(format!("invalid value for header `{name}`: {e}"))
            })?;
            headers.insert(name, value);
        }

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .connect_timeout(config.connect_timeout())
            .timeout(config.timeout())
            .build()
            .map_err(|e| RegistryError::Construction(format!("failed to build http client: {e}")))?;

        Ok(Self {
            client,
            base_url,
            auth,
            parser,
        })
    }

    /// 拼接路径，每一段都按单个 path segment 转义
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        url: Url,
        body: Option<RegisterSchemaRequest<'_>>,
    ) -> Result<T> {
        let mut request = self.client.request(method.clone(), url.clone());
        request = match &self.auth {
            AuthConfig::None => request,
            AuthConfig::Basic { username, password } => request.basic_auth(username, Some(password)),
            AuthConfig::Bearer { token } => request.bearer_auth(token),
        };
        if let Some(body) = body {
            let payload = serde_json::to_vec(&body)
                .map_err(|e| RegistryError::transport(format!("failed to encode request: {e}")))?;
            request = request
                .header(CONTENT_TYPE, SCHEMA_REGISTRY_CONTENT_TYPE)
                .body(payload);
        }

        let response = request.send().await.map_err(|e| {
            tracing::warn!(%method, %url, error = %e, "registry request failed");
            RegistryError::transport(format!("{method} {url} failed: {e}"))
        })?;

        let status = response.status().as_u16();
        let text = response.text().await.map_err(|e| RegistryError::Transport {
            status: Some(status),
            error_code: None,
            message: format!("failed to read response body: {e}"),
        })?;

        if !(200..300).contains(&status) {
            tracing::debug!(%method, %url, status, "registry returned error status");
            return Err(status_error(status, &text));
        }

        serde_json::from_str(&text).map_err(|e| RegistryError::Transport {
            status: Some(status),
            error_code: None,
            message: format!("malformed response body from {method} {url}: {e}"),
        })
    }
}

/// 把非 2xx 响应映射为领域错误
///
/// 只有带 `error_code` 的注册中心错误体的 404 才算 NotFound；
/// 代理或错误 base url 返回的 404 页面属于传输失败。
pub(crate) fn status_error(status: u16, body: &str) -> RegistryError {
    let (error_code, message) = match serde_json::from_str::<ErrorBody>(body) {
        Ok(ErrorBody { error_code, message }) => (
            error_code,
            message.unwrap_or_else(|| body.to_string()),
        ),
        Err(_) if body.trim().is_empty() => (None, format!("http status {status}")),
        Err(_) => (None, body.to_string()),
    };

    if status == 404 && error_code.is_some() {
        RegistryError::NotFound {
            status,
            error_code,
            message,
        }
    } else {
        RegistryError::Transport {
            status: Some(status),
            error_code,
            message,
        }
    }
}

#[async_trait]
impl RegistryTransport for HttpTransport {
    #[instrument(skip(self), level = "debug")]
    async fn fetch_schema_by_id(&self, id: u32) -> Result<Schema> {
        let url = self.endpoint(&["schemas", "ids", &id.to_string()]);
        let response: SchemaResponse = self.execute(Method::GET, url, None).await?;
        self.parser.parse(&response.schema)
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_subjects(&self) -> Result<Vec<String>> {
        let url = self.endpoint(&["subjects"]);
        self.execute(Method::GET, url, None).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn list_versions(&self, subject: &str) -> Result<Vec<u32>> {
        let url = self.endpoint(&["subjects", subject, "versions"]);
        self.execute(Method::GET, url, None).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn fetch_schema_by_subject_version(
        &self,
        subject: &str,
        version: SchemaVersion,
    ) -> Result<SchemaWithId> {
        let url = self.endpoint(&["subjects", subject, "versions", &version.to_string()]);
        let response: SubjectVersionResponse = self.execute(Method::GET, url, None).await?;
        let text = response.schema.ok_or_else(|| {
            RegistryError::transport(format!(
                "response for {subject} version {version} carries no schema"
            ))
        })?;

        let mut entry = SchemaWithId::new(response.id, self.parser.parse(&text)?);
        entry.version = response.version;
        Ok(entry)
    }

    #[instrument(skip(self, schema), level = "debug")]
    async fn register_schema(&self, subject: &str, schema: &Schema) -> Result<u32> {
        let url = self.endpoint(&["subjects", subject, "versions"]);
        let body = RegisterSchemaRequest {
            schema: schema.canonical_string(),
        };
        let response: IdResponse = self.execute(Method::POST, url, Some(body)).await?;
        Ok(response.id)
    }

    #[instrument(skip(self, schema), level = "debug")]
    async fn lookup_schema(&self, subject: &str, schema: &Schema) -> Result<SchemaWithId> {
        let url = self.endpoint(&["subjects", subject]);
        let body = RegisterSchemaRequest {
            schema: schema.canonical_string(),
        };
        let response: SubjectVersionResponse = self.execute(Method::POST, url, Some(body)).await?;

        let mut entry = SchemaWithId::new(response.id, schema.clone());
        entry.version = response.version;
        Ok(entry)
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_subject(&self, subject: &str) -> Result<Vec<u32>> {
        let url = self.endpoint(&["subjects", subject]);
        self.execute(Method::DELETE, url, None).await
    }

    #[instrument(skip(self), level = "debug")]
    async fn delete_subject_version(&self, subject: &str, version: u32) -> Result<u32> {
        let url = self.endpoint(&["subjects", subject, "versions", &version.to_string()]);
        self.execute(Method::DELETE, url, None).await
    }
}
