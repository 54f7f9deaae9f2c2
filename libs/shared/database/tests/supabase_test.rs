use reqwest::Method;
use serde_json::{json, Value};
use wiremock::matchers::{body_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use shared_config::AppConfig;
use shared_database::supabase::{backend_message, return_representation, ApiError, SupabaseClient};

fn config_for(server: &MockServer) -> AppConfig {
    AppConfig {
        supabase_url: server.uri(),
        supabase_anon_key: "test-anon-key".to_string(),
        supabase_jwt_secret: "secret".to_string(),
        ..AppConfig::default()
    }
}

#[tokio::test]
async fn get_sends_api_key_and_bearer() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("status", "eq.Active"))
        .and(header("apikey", "test-anon-key"))
        .and(header("authorization", "Bearer user-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([{"id": "D1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Value> = client
        .request(Method::GET, "/rest/v1/doctors?status=eq.Active", Some("user-token"), None)
        .await
        .unwrap();

    assert_eq!(rows, vec![json!({"id": "D1"})]);
}

#[tokio::test]
async fn post_with_prefer_header_returns_rows() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .and(header("prefer", "return=representation"))
        .and(body_json(json!({"doctor_id": "D1"})))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!([{"id": "A1", "doctor_id": "D1"}])))
        .expect(1)
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let rows: Vec<Value> = client
        .request_with_headers(
            Method::POST,
            "/rest/v1/appointments",
            Some("user-token"),
            Some(json!({"doctor_id": "D1"})),
            Some(return_representation()),
        )
        .await
        .unwrap();

    assert_eq!(rows[0]["id"], "A1");
}

#[tokio::test]
async fn error_status_carries_response_text() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(409).set_body_string("duplicate key value"))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let err = client
        .request::<Value>(Method::POST, "/rest/v1/appointments", None, Some(json!({})))
        .await
        .unwrap_err();

    let message = err.to_string();
    assert!(message.contains("409"));
    assert!(message.contains("duplicate key value"));

    Mock::given(method("GET"))
        .and(path("/rest/v1/private"))
        .respond_with(ResponseTemplate::new(401).set_body_string("JWT expired"))
        .mount(&server)
        .await;

    let err = client
        .request::<Value>(Method::GET, "/rest/v1/private", None, None)
        .await
        .unwrap_err();
    assert_eq!(err.to_string(), "Authentication error: JWT expired");
}

#[tokio::test]
async fn backend_message_unwraps_postgrest_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/rest/v1/appointments"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "code": "23505",
            "message": "duplicate key value violates unique constraint",
            "details": null,
            "hint": null
        })))
        .mount(&server)
        .await;

    let client = SupabaseClient::new(&config_for(&server));
    let err = client
        .request::<Value>(Method::POST, "/rest/v1/appointments", None, Some(json!({})))
        .await
        .unwrap_err();

    let api = err.downcast_ref::<ApiError>().expect("status errors carry the response");
    assert_eq!(api.status.as_u16(), 400);
    assert!(err.to_string().starts_with("API error (400"));
    assert_eq!(backend_message(&err), "duplicate key value violates unique constraint");
}

#[tokio::test]
async fn transport_failure_keeps_its_own_message() {
    let config = AppConfig {
        supabase_url: "http://127.0.0.1:1".to_string(),
        supabase_anon_key: "test-anon-key".to_string(),
        ..AppConfig::default()
    };

    let client = SupabaseClient::new(&config);
    let err = client
        .request::<Value>(Method::GET, "/rest/v1/doctors", None, None)
        .await
        .unwrap_err();

    assert!(err.downcast_ref::<ApiError>().is_none());
    assert_eq!(backend_message(&err), err.to_string());
}
