use std::sync::Arc;

use tracing::{debug, instrument};

use crate::cache::{CacheStats, FlightGroup, FlightGuard, SchemaCache};
use crate::config::RegistryClientConfig;
use crate::error::Result;
use crate::schema::{DynSchemaParser, Schema, SchemaVersion, SchemaWithId};
use crate::transport::{DynRegistryTransport, HttpTransport};

/// 单飞闸门的键，与三张缓存表一一对应
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
enum FlightKey {
    Id(u32),
    SubjectSchema(String, String),
    SubjectVersion(String, u32),
}

/// 带缓存的注册中心客户端
///
/// 每个操作都是「查缓存 → 未命中则调用传输层 → 成功后写入缓存 → 返回」。
/// 缓存只增不改，删除操作不会使已缓存的条目失效。
pub struct CachedSchemaRegistryClient {
    transport: DynRegistryTransport,
    cache: SchemaCache,
    flights: Option<FlightGroup<FlightKey>>,
}

impl CachedSchemaRegistryClient {
    /// 使用默认配置连接 `base_url`
    pub fn new(base_url: &str) -> Result<Self> {
        Self::from_config(RegistryClientConfig::new(base_url))
    }

    pub fn from_config(config: RegistryClientConfig) -> Result<Self> {
        let transport = HttpTransport::from_config(&config)?;
        Ok(Self::with_transport(Arc::new(transport), config.single_flight))
    }

    /// 使用自定义的 schema 解析器（默认为 Avro）
    pub fn with_parser(config: RegistryClientConfig, parser: DynSchemaParser) -> Result<Self> {
        let transport = HttpTransport::with_parser(&config, parser)?;
        Ok(Self::with_transport(Arc::new(transport), config.single_flight))
    }

    pub fn with_transport(transport: DynRegistryTransport, single_flight: bool) -> Self {
        Self {
            transport,
            cache: SchemaCache::new(),
            flights: single_flight.then(FlightGroup::new),
        }
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    async fn enter(&self, key: FlightKey) -> Option<FlightGuard<'_, FlightKey>> {
        match &self.flights {
            Some(group) => Some(group.enter(key).await),
            None => None,
        }
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_schema_by_id(&self, id: u32) -> Result<Schema> {
        if let Some(schema) = self.cache.get_by_id(id) {
            debug!(id, "schema id cache hit");
            return Ok(schema);
        }

        let _flight = self.enter(FlightKey::Id(id)).await;
        if let Some(schema) = self.cache.get_by_id(id) {
            return Ok(schema);
        }

        debug!(id, "schema id cache miss");
        let schema = self.transport.fetch_schema_by_id(id).await?;
        Ok(self.cache.put_by_id(id, schema))
    }

    /// subject 列表会随时间变化，不缓存
    pub async fn subjects(&self) -> Result<Vec<String>> {
        self.transport.list_subjects().await
    }

    /// 版本列表随注册而增长，不缓存
    pub async fn versions(&self, subject: &str) -> Result<Vec<u32>> {
        self.transport.list_versions(subject).await
    }

    #[instrument(skip(self), level = "debug")]
    pub async fn get_schema_by_subject(&self, subject: &str, version: u32) -> Result<SchemaWithId> {
        if let Some(entry) = self.cache.get_by_subject_version(subject, version) {
            debug!(subject, version, "subject version cache hit");
            return Ok(entry);
        }

        let _flight = self
            .enter(FlightKey::SubjectVersion(subject.to_string(), version))
            .await;
        if let Some(entry) = self.cache.get_by_subject_version(subject, version) {
            return Ok(entry);
        }

        debug!(subject, version, "subject version cache miss");
        let mut entry = self
            .transport
            .fetch_schema_by_subject_version(subject, SchemaVersion::Number(version))
            .await?;
        entry.version.get_or_insert(version);
        self.remember(subject, &entry);
        Ok(self.cache.put_by_subject_version(subject, version, entry))
    }

    /// 总是请求 `latest`；响应中的具体版本号用作版本缓存的键
    #[instrument(skip(self), level = "debug")]
    pub async fn get_latest_schema(&self, subject: &str) -> Result<SchemaWithId> {
        let entry = self
            .transport
            .fetch_schema_by_subject_version(subject, SchemaVersion::Latest)
            .await?;
        self.remember(subject, &entry);
        match entry.version {
            Some(version) => Ok(self.cache.put_by_subject_version(subject, version, entry)),
            None => Ok(entry),
        }
    }

    /// 同一 subject 下重复注册同一 schema 不会再发请求；
    /// 换一个 subject 则是一次新的未命中，即使注册中心返回相同的 ID
    #[instrument(skip(self, schema), level = "debug")]
    pub async fn register_new_schema(&self, subject: &str, schema: &Schema) -> Result<u32> {
        let canonical = schema.canonical_string();
        if let Some(entry) = self.cache.get_by_subject_schema(subject, canonical) {
            debug!(subject, id = entry.id, "subject schema cache hit");
            return Ok(entry.id);
        }

        let _flight = self
            .enter(FlightKey::SubjectSchema(subject.to_string(), canonical.to_string()))
            .await;
        if let Some(entry) = self.cache.get_by_subject_schema(subject, canonical) {
            return Ok(entry.id);
        }

        let id = self.transport.register_schema(subject, schema).await?;
        debug!(subject, id, "schema registered");
        self.cache.put_by_id(id, schema.clone());
        let entry = self
            .cache
            .put_by_subject_schema(subject, SchemaWithId::new(id, schema.clone()));
        Ok(entry.id)
    }

    /// `Some` 表示 schema 已在该 subject 下注册；注册中心返回 404 时为 `None`
    #[instrument(skip(self, schema), level = "debug")]
    pub async fn is_schema_registered(
        &self,
        subject: &str,
        schema: &Schema,
    ) -> Result<Option<SchemaWithId>> {
        if let Some(entry) = self
            .cache
            .get_by_subject_schema(subject, schema.canonical_string())
        {
            return Ok(Some(entry));
        }

        match self.transport.lookup_schema(subject, schema).await {
            Ok(entry) => {
                self.remember(subject, &entry);
                if let Some(version) = entry.version {
                    self.cache.put_by_subject_version(subject, version, entry.clone());
                }
                Ok(Some(entry))
            }
            Err(error) if error.is_not_found() => {
                debug!(subject, %error, "schema not registered");
                Ok(None)
            }
            Err(error) => Err(error),
        }
    }

    /// 不会清理缓存中属于该 subject 的条目
    pub async fn delete_subject(&self, subject: &str) -> Result<Vec<u32>> {
        let deleted = self.transport.delete_subject(subject).await?;
        debug!(subject, ?deleted, "subject deleted");
        Ok(deleted)
    }

    pub async fn delete_subject_version(&self, subject: &str, version: u32) -> Result<u32> {
        let deleted = self.transport.delete_subject_version(subject, version).await?;
        debug!(subject, deleted, "subject version deleted");
        Ok(deleted)
    }

    /// 已知 ID 与规范文本时，顺带填充 ID 表和 subject 表
    ///
    /// subject 表先写者胜：先由 `register_new_schema` 或不带版本号的 `latest`
    /// 写入的条目 `version` 为 `None`，之后即使得知版本号也不会更新。
    fn remember(&self, subject: &str, entry: &SchemaWithId) {
        self.cache.put_by_id(entry.id, entry.schema.clone());
        self.cache.put_by_subject_schema(subject, entry.clone());
    }
}
