use std::collections::HashMap;

use parking_lot::RwLock;

use crate::schema::{Schema, SchemaWithId};

/// 缓存条目数量快照
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub ids: usize,
    pub subject_schemas: usize,
    pub subject_versions: usize,
}

/// 三张只增不改的映射表，每张表一把读写锁
///
/// 同一个键只接受第一次写入，之后的写入被忽略并返回已存在的值。
/// 锁只在同步代码里持有，不会跨越 `.await`。
#[derive(Default)]
pub struct SchemaCache {
    by_id: RwLock<HashMap<u32, Schema>>,
    by_subject_schema: RwLock<HashMap<String, HashMap<String, SchemaWithId>>>,
    by_subject_version: RwLock<HashMap<String, HashMap<u32, SchemaWithId>>>,
}

impl SchemaCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_by_id(&self, id: u32) -> Option<Schema> {
        self.by_id.read().get(&id).cloned()
    }

    pub fn put_by_id(&self, id: u32, schema: Schema) -> Schema {
        self.by_id.write().entry(id).or_insert(schema).clone()
    }

    pub fn get_by_subject_schema(&self, subject: &str, canonical: &str) -> Option<SchemaWithId> {
        self.by_subject_schema
            .read()
            .get(subject)
            .and_then(|schemas| schemas.get(canonical))
            .cloned()
    }

    pub fn put_by_subject_schema(&self, subject: &str, entry: SchemaWithId) -> SchemaWithId {
        let mut guard = self.by_subject_schema.write();
        let schemas = guard.entry(subject.to_string()).or_default();
        schemas
            .entry(entry.schema.canonical_string().to_string())
            .or_insert(entry)
            .clone()
    }

    pub fn get_by_subject_version(&self, subject: &str, version: u32) -> Option<SchemaWithId> {
        self.by_subject_version
            .read()
            .get(subject)
            .and_then(|versions| versions.get(&version))
            .cloned()
    }

    pub fn put_by_subject_version(
        &self,
        subject: &str,
        version: u32,
        entry: SchemaWithId,
    ) -> SchemaWithId {
        let mut guard = self.by_subject_version.write();
        let versions = guard.entry(subject.to_string()).or_default();
        versions.entry(version).or_insert(entry).clone()
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            ids: self.by_id.read().len(),
            subject_schemas: self.by_subject_schema.read().values().map(HashMap::len).sum(),
            subject_versions: self.by_subject_version.read().values().map(HashMap::len).sum(),
        }
    }
}
