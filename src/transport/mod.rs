//! 注册中心传输层
//!
//! 每个逻辑操作对应一次 HTTP 请求，与缓存无关：
//! - `RegistryTransport`: 客户端依赖的接口
//! - `HttpTransport`: 基于 reqwest 的实现
//!
//! 传输层不做去重也不做重试；带注册中心错误体的 404 映射为
//! `RegistryError::NotFound`，其他非 2xx 状态映射为 `RegistryError::Transport`。

pub mod http;
pub(crate) mod types;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{Schema, SchemaVersion, SchemaWithId};

pub use http::HttpTransport;

#[async_trait]
pub trait RegistryTransport: Send + Sync {
    /// GET /schemas/ids/{id}
    async fn fetch_schema_by_id(&self, id: u32) -> Result<Schema>;

    /// GET /subjects
    async fn list_subjects(&self) -> Result<Vec<String>>;

    /// GET /subjects/{subject}/versions
    async fn list_versions(&self, subject: &str) -> Result<Vec<u32>>;

    /// GET /subjects/{subject}/versions/{version|latest}
    async fn fetch_schema_by_subject_version(
        &self,
        subject: &str,
        version: SchemaVersion,
    ) -> Result<SchemaWithId>;

    /// POST /subjects/{subject}/versions，返回注册中心分配的 ID
    async fn register_schema(&self, subject: &str, schema: &Schema) -> Result<u32>;

    /// POST /subjects/{subject}，schema 未在该 subject 下注册时返回 NotFound
    async fn lookup_schema(&self, subject: &str, schema: &Schema) -> Result<SchemaWithId>;

    /// DELETE /subjects/{subject}
    async fn delete_subject(&self, subject: &str) -> Result<Vec<u32>>;

    /// DELETE /subjects/{subject}/versions/{version}
    async fn delete_subject_version(&self, subject: &str, version: u32) -> Result<u32>;
}

pub type DynRegistryTransport = Arc<dyn RegistryTransport>;
