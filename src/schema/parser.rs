use std::sync::Arc;

use apache_avro::Schema as AvroSchema;

use super::schema::Schema;
use crate::error::{RegistryError, Result};

/// Schema 解析器
///
/// 把注册中心返回的 schema 文本变成 `Schema`。规范字符串必须对同一语义的
/// schema 稳定且唯一，缓存以它作为身份键。
pub trait SchemaParser: Send + Sync {
    fn parse(&self, text: &str) -> Result<Schema>;
}

pub type DynSchemaParser = Arc<dyn SchemaParser>;

/// Avro 解析器，规范字符串为解析后 schema 的 JSON 序列化（保留默认值）
#[derive(Default, Clone)]
pub struct AvroSchemaParser;

impl SchemaParser for AvroSchemaParser {
    fn parse(&self, text: &str) -> Result<Schema> {
        let parsed = AvroSchema::parse_str(text)
            .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
        let canonical = serde_json::to_string(&parsed)
            .map_err(|e| RegistryError::InvalidSchema(e.to_string()))?;
        Ok(Schema::new(canonical, parsed))
    }
}

/// 不做任何解析，原样保留文本
#[derive(Default, Clone)]
pub struct RawSchemaParser;

impl SchemaParser for RawSchemaParser {
    fn parse(&self, text: &str) -> Result<Schema> {
        Ok(Schema::from_canonical(text))
    }
}
