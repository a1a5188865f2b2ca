use std::any::Any;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// 已解析的 schema
///
/// 对缓存而言 schema 是不透明的：身份只由规范字符串决定，
/// 解析后的表示（例如 `apache_avro::Schema`）通过 `downcast_ref` 取回。
#[derive(Clone)]
pub struct Schema {
    canonical: Arc<str>,
    parsed: Arc<dyn Any + Send + Sync>,
}

impl Schema {
    pub fn new<T>(canonical: impl Into<String>, parsed: T) -> Self
    where
        T: Any + Send + Sync,
    {
        Self {
            canonical: Arc::from(canonical.into()),
            parsed: Arc::new(parsed),
        }
    }

    /// 没有解析表示的 schema，解析值就是规范字符串本身
    pub fn from_canonical(canonical: impl Into<String>) -> Self {
        let canonical: Arc<str> = Arc::from(canonical.into());
        Self {
            parsed: Arc::new(canonical.to_string()),
            canonical,
        }
    }

    pub fn canonical_string(&self) -> &str {
        &self.canonical
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.parsed.downcast_ref::<T>()
    }

    pub fn as_avro(&self) -> Option<&apache_avro::Schema> {
        self.downcast_ref::<apache_avro::Schema>()
    }
}

impl PartialEq for Schema {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for Schema {}

impl Hash for Schema {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Debug for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Schema").field(&self.canonical).finish()
    }
}

impl fmt::Display for Schema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}

/// 绑定了注册中心 ID 的 schema
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SchemaWithId {
    pub id: u32,
    /// 仅当注册中心的响应带有具体版本号时才有值
    pub version: Option<u32>,
    pub schema: Schema,
}

impl SchemaWithId {
    pub fn new(id: u32, schema: Schema) -> Self {
        Self {
            id,
            version: None,
            schema,
        }
    }

    pub fn with_version(mut self, version: u32) -> Self {
        self.version = Some(version);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SchemaVersion {
    Number(u32),
    Latest,
}

impl fmt::Display for SchemaVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVersion::Number(version) => write!(f, "{version}"),
            SchemaVersion::Latest => f.write_str("latest"),
        }
    }
}

impl From<u32> for SchemaVersion {
    fn from(version: u32) -> Self {
        SchemaVersion::Number(version)
    }
}
