use std::sync::Arc;

use regcache::{
    AuthConfig, AvroSchemaParser, CachedSchemaRegistryClient, RawSchemaParser, RegistryClientConfig,
    RegistryError, Schema, SchemaParser,
};
use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const RECORD_SCHEMA: &str = r#"{"type": "record", "name": "test", "fields" : [{"name": "val", "type": "int", "default": 0}]}"#;

struct MockRegistry {
    server: MockServer,
    schema: Schema,
    subject: String,
    id: u32,
}

impl MockRegistry {
    async fn request_count(&self) -> usize {
        self.server
            .received_requests()
            .await
            .map(|requests| requests.len())
            .unwrap_or_default()
    }

    fn client(&self) -> CachedSchemaRegistryClient {
        CachedSchemaRegistryClient::new(&self.server.uri()).expect("client")
    }
}

fn record_schema() -> Schema {
    AvroSchemaParser.parse(RECORD_SCHEMA).expect("record schema")
}

async fn mock_registry(subject: &str, id: u32) -> MockRegistry {
    let server = MockServer::start().await;
    let schema = record_schema();
    let canonical = schema.canonical_string().to_string();

    for registered_subject in [subject.to_string(), format!("{subject}2")] {
        Mock::given(method("POST"))
            .and(path(format!("/subjects/{registered_subject}/versions")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path(format!("/subjects/{registered_subject}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": id })))
            .mount(&server)
            .await;
    }

    Mock::given(method("GET"))
        .and(path(format!("/schemas/ids/{id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "schema": RECORD_SCHEMA })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([subject])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(format!("/subjects/{subject}/versions")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([id])))
        .mount(&server)
        .await;
    for version in ["1", "latest"] {
        Mock::given(method("GET"))
            .and(path(format!("/subjects/{subject}/versions/{version}")))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "subject": subject,
                "version": 1,
                "schema": canonical,
                "id": id
            })))
            .mount(&server)
            .await;
    }
    Mock::given(method("DELETE"))
        .and(path(format!("/subjects/{subject}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1])))
        .mount(&server)
        .await;
    Mock::given(method("DELETE"))
        .and(path(format!("/subjects/{subject}/versions/1")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(1)))
        .mount(&server)
        .await;

    MockRegistry {
        server,
        schema,
        subject: subject.to_string(),
        id,
    }
}

#[tokio::test]
async fn get_schema_by_id_is_served_from_cache_the_second_time() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let first = client.get_schema_by_id(1).await.expect("first lookup");
    let second = client.get_schema_by_id(1).await.expect("second lookup");

    assert_eq!(first.canonical_string(), registry.schema.canonical_string());
    assert_eq!(second.canonical_string(), first.canonical_string());
    assert_eq!(registry.request_count().await, 1);
    assert_eq!(client.cache_stats().ids, 1);
}

#[tokio::test]
async fn subjects_are_listed_from_the_registry() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let subjects = client.subjects().await.expect("subjects");
    assert!(subjects.contains(&registry.subject));

    client.subjects().await.expect("subjects again");
    assert_eq!(registry.request_count().await, 2);
}

#[tokio::test]
async fn versions_are_listed_from_the_registry() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let versions = client.versions(&registry.subject).await.expect("versions");
    assert!(versions.contains(&registry.id));
}

#[tokio::test]
async fn schema_by_version_matches_latest_schema() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let by_version = client
        .get_schema_by_subject(&registry.subject, 1)
        .await
        .expect("version 1");
    let latest = client
        .get_latest_schema(&registry.subject)
        .await
        .expect("latest");

    assert_eq!(by_version.schema.canonical_string(), registry.schema.canonical_string());
    assert_eq!(latest.schema.canonical_string(), by_version.schema.canonical_string());
    assert_eq!(latest.id, registry.id);
    assert_eq!(latest.version, Some(1));
}

#[tokio::test]
async fn latest_schema_fills_the_version_cache() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    client
        .get_latest_schema(&registry.subject)
        .await
        .expect("latest");
    let by_version = client
        .get_schema_by_subject(&registry.subject, 1)
        .await
        .expect("version 1");
    let by_id = client.get_schema_by_id(registry.id).await.expect("by id");

    assert_eq!(by_version.id, registry.id);
    assert_eq!(by_id, by_version.schema);
    assert_eq!(registry.request_count().await, 1);

    let already_registered = client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register");
    assert_eq!(already_registered, registry.id);
    assert_eq!(registry.request_count().await, 1);
}

/// 只挂载一个 `versions/{version}` 端点，响应体不带 `version` 字段
async fn versionless_registry(subject: &str, version: &str, id: u32) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(format!("/subjects/{subject}/versions/{version}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "subject": subject,
            "id": id,
            "schema": record_schema().canonical_string()
        })))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn latest_without_version_skips_the_version_cache() {
    let server = versionless_registry("orders", "latest", 7).await;
    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");

    let latest = client.get_latest_schema("orders").await.expect("latest");
    assert_eq!(latest.id, 7);
    assert_eq!(latest.version, None);

    let stats = client.cache_stats();
    assert_eq!(stats.ids, 1);
    assert_eq!(stats.subject_schemas, 1);
    assert_eq!(stats.subject_versions, 0);

    // 注册端点未挂载，命中 subject 表才能成功
    let id = client
        .register_new_schema("orders", &record_schema())
        .await
        .expect("served from cache");
    assert_eq!(id, 7);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn numbered_version_without_version_field_is_cached_under_the_request() {
    let server = versionless_registry("orders", "1", 7).await;
    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");

    let entry = client.get_schema_by_subject("orders", 1).await.expect("version 1");
    assert_eq!(entry.version, Some(1));
    assert_eq!(client.cache_stats().subject_versions, 1);

    let again = client.get_schema_by_subject("orders", 1).await.expect("cached");
    assert_eq!(again, entry);
    assert_eq!(server.received_requests().await.unwrap_or_default().len(), 1);
}

#[tokio::test]
async fn subject_entry_keeps_its_first_version() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register");
    let by_version = client
        .get_schema_by_subject(&registry.subject, 1)
        .await
        .expect("version 1");
    assert_eq!(by_version.version, Some(1));

    // subject 表先写者胜，注册时写入的条目没有版本号
    let found = client
        .is_schema_registered(&registry.subject, &registry.schema)
        .await
        .expect("lookup")
        .expect("registered");
    assert_eq!(found.id, registry.id);
    assert_eq!(found.version, None);
    assert_eq!(registry.request_count().await, 2);
}

#[tokio::test]
async fn custom_parser_keeps_schema_text_verbatim() {
    let server = MockServer::start().await;
    let text = "syntax = \"proto3\";";
    Mock::given(method("GET"))
        .and(path("/schemas/ids/3"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "schema": text })))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::with_parser(
        RegistryClientConfig::new(server.uri()),
        Arc::new(RawSchemaParser),
    )
    .expect("client");
    let schema = client.get_schema_by_id(3).await.expect("raw schema");
    assert_eq!(schema.canonical_string(), text);
    assert!(schema.as_avro().is_none());
}

#[tokio::test]
async fn register_new_schema_calls_the_registry_once_per_subject() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let id = client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register");
    assert_eq!(id, registry.id);

    let same_id = client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register again");
    assert_eq!(same_id, id);
    assert_eq!(registry.request_count().await, 1);

    // 同一个 schema，换一个 subject
    let new_id = client
        .register_new_schema("test2", &registry.schema)
        .await
        .expect("register under test2");
    assert_eq!(new_id, id);
    assert_eq!(registry.request_count().await, 2);

    let new_id = client
        .register_new_schema("test2", &registry.schema)
        .await
        .expect("register under test2 again");
    assert_eq!(new_id, id);
    assert_eq!(registry.request_count().await, 2);

    assert_eq!(client.cache_stats().subject_schemas, 2);
    assert_eq!(client.cache_stats().ids, 1);
}

#[tokio::test]
async fn registration_sends_the_canonical_schema_text() {
    let server = MockServer::start().await;
    let schema = record_schema();
    Mock::given(method("POST"))
        .and(path("/subjects/orders-value/versions"))
        .and(header("content-type", "application/vnd.schemaregistry.v1+json"))
        .and(body_json(json!({ "schema": schema.canonical_string() })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "id": 21 })))
        .expect(1)
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let id = client
        .register_new_schema("orders-value", &schema)
        .await
        .expect("register");
    assert_eq!(id, 21);
}

#[tokio::test]
async fn is_schema_registered_finds_known_schema() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let found = client
        .is_schema_registered(&registry.subject, &registry.schema)
        .await
        .expect("lookup");
    let entry = found.expect("schema should be registered");
    assert_eq!(entry.id, registry.id);

    let registered_id = client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register");
    assert_eq!(registered_id, entry.id);
    assert_eq!(registry.request_count().await, 1);
}

#[tokio::test]
async fn is_schema_registered_reports_absence_without_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subjects/unknown"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": 40403,
            "message": "Schema not found"
        })))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let found = client
        .is_schema_registered("unknown", &record_schema())
        .await
        .expect("absence is not an error");
    assert!(found.is_none());
    assert_eq!(client.cache_stats().subject_schemas, 0);
}

#[tokio::test]
async fn is_schema_registered_surfaces_other_failures() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subjects/broken"))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "error_code": 50001,
            "message": "Error in the backend data store"
        })))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let error = client
        .is_schema_registered("broken", &record_schema())
        .await
        .expect_err("server failure must surface");
    assert_eq!(error.status(), Some(500));
    assert_eq!(error.error_code(), Some(50001));
}

#[tokio::test]
async fn non_registry_not_found_page_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/subjects/x"))
        .respond_with(ResponseTemplate::new(404).set_body_string("<html>nginx 404</html>"))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let error = client
        .is_schema_registered("x", &record_schema())
        .await
        .expect_err("proxy 404 must not read as absence");
    assert!(!error.is_not_found());
    assert_eq!(error.status(), Some(404));
}

#[tokio::test]
async fn delete_subject_returns_deleted_versions() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let deleted = client
        .delete_subject(&registry.subject)
        .await
        .expect("delete on cold cache");
    assert_eq!(deleted, vec![1]);

    client.get_schema_by_id(registry.id).await.expect("warm cache");
    client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("register");
    let deleted = client
        .delete_subject(&registry.subject)
        .await
        .expect("delete on warm cache");
    assert_eq!(deleted, vec![1]);

    // 删除不会清理已缓存的条目
    let cached = client
        .register_new_schema(&registry.subject, &registry.schema)
        .await
        .expect("cached registration");
    assert_eq!(cached, registry.id);
    assert_eq!(registry.request_count().await, 4);
}

#[tokio::test]
async fn delete_subject_version_returns_deleted_version() {
    let registry = mock_registry("test", 1).await;
    let client = registry.client();

    let deleted = client
        .delete_subject_version(&registry.subject, 1)
        .await
        .expect("delete version");
    assert_eq!(deleted, 1);
}

#[tokio::test]
async fn missing_id_is_not_found_and_not_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schemas/ids/101"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "error_code": 40403,
            "message": "Schema not found"
        })))
        .expect(2)
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    for _ in 0..2 {
        let error = client.get_schema_by_id(101).await.expect_err("missing id");
        assert!(error.is_not_found());
        assert_eq!(error.error_code(), Some(40403));
    }
    assert_eq!(client.cache_stats().ids, 0);
}

#[tokio::test]
async fn malformed_body_is_a_transport_failure() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subjects"))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let error = client.subjects().await.expect_err("malformed body");
    assert!(matches!(
        error,
        RegistryError::Transport {
            status: Some(200),
            ..
        }
    ));
}

#[tokio::test]
async fn unparseable_schema_text_is_rejected() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/schemas/ids/5"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "schema": "{\"type\": \"nope\"}" })))
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let error = client.get_schema_by_id(5).await.expect_err("invalid schema");
    assert!(matches!(error, RegistryError::InvalidSchema(_)));
}

#[tokio::test]
async fn subjects_are_escaped_as_single_path_segments() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subjects/team%2Forders/versions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([1, 2])))
        .expect(1)
        .mount(&server)
        .await;

    let client = CachedSchemaRegistryClient::new(&server.uri()).expect("client");
    let versions = client.versions("team/orders").await.expect("versions");
    assert_eq!(versions, vec![1, 2]);
}

#[tokio::test]
async fn configured_auth_and_headers_are_sent() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/subjects"))
        .and(header("authorization", "Basic c3ZjOnB3"))
        .and(header("x-tenant", "blue"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!(["a", "b"])))
        .expect(1)
        .mount(&server)
        .await;

    let config = RegistryClientConfig::new(server.uri())
        .with_auth(AuthConfig::Basic {
            username: "svc".to_string(),
            password: "pw".to_string(),
        })
        .with_header("x-tenant", "blue");
    let client = CachedSchemaRegistryClient::from_config(config).expect("client");

    let subjects = client.subjects().await.expect("subjects");
    assert_eq!(subjects, vec!["a".to_string(), "b".to_string()]);
}

#[test]
fn malformed_base_url_fails_construction() {
    let result = CachedSchemaRegistryClient::new("not a url");
    assert!(matches!(result, Err(RegistryError::Construction(_))));
}
