use assert_matches::assert_matches;
use serde_json::json;
use wiremock::matchers::{header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use doctor_cell::models::{Doctor, DoctorError, DoctorStatus, DEFAULT_DOCTOR_IMAGE};
use doctor_cell::services::{DoctorDirectory, InMemoryDoctorDirectory, SupabaseDoctorDirectory};
use shared_utils::test_utils::{MockSupabaseResponses, TestConfig};

#[tokio::test]
async fn lists_active_doctors_from_supabase() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("status", "eq.Active"))
        .and(header("authorization", "Bearer patient-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row("D1", "Active", &["2025-06-10"]),
            MockSupabaseResponses::doctor_row("D3", "Active", &[]),
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let directory = SupabaseDoctorDirectory::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config());
    let doctors = directory.list_active_doctors(Some("patient-token")).await.unwrap();

    assert_eq!(doctors.len(), 2);
    assert_eq!(doctors[0].id, "D1");
    assert_eq!(doctors[0].image_url, DEFAULT_DOCTOR_IMAGE);
    assert_eq!(doctors[0].available_dates.len(), 1);
}

#[tokio::test]
async fn find_doctor_returns_any_status() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.D2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            MockSupabaseResponses::doctor_row("D2", "Inactive", &["2025-06-10"]),
        ])))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .and(query_param("id", "eq.D404"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
        .mount(&server)
        .await;

    let directory = SupabaseDoctorDirectory::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config());

    let found = directory.find_doctor("D2", None).await.unwrap().unwrap();
    assert_eq!(found.status, DoctorStatus::Inactive);

    assert!(directory.find_doctor("D404", None).await.unwrap().is_none());
}

#[tokio::test]
async fn backend_failure_becomes_directory_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream unavailable"))
        .mount(&server)
        .await;

    let directory = SupabaseDoctorDirectory::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config());
    let err = directory.list_active_doctors(None).await.unwrap_err();

    assert_matches!(&err, DoctorError::Directory(msg) if msg == "upstream unavailable");
}

#[tokio::test]
async fn postgrest_error_message_is_kept_verbatim() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/rest/v1/doctors"))
        .respond_with(ResponseTemplate::new(401).set_body_json(
            MockSupabaseResponses::error_response("JWT expired", "PGRST301"),
        ))
        .mount(&server)
        .await;

    let directory = SupabaseDoctorDirectory::new(&TestConfig::with_supabase_url(&server.uri()).to_app_config());
    let err = directory.find_doctor("D1", Some("stale-token")).await.unwrap_err();

    assert_eq!(err, DoctorError::Directory("JWT expired".to_string()));
}

#[tokio::test]
async fn in_memory_directory_filters_and_updates() {
    let directory = InMemoryDoctorDirectory::new(vec![
        Doctor {
            id: "D1".into(),
            name: "Dr. Okafor".into(),
            specialization: "Pediatrics".into(),
            status: DoctorStatus::Active,
            image: None,
            rating: 4.9,
            available_dates: vec!["2025-06-10".into()],
        },
        Doctor {
            id: "D2".into(),
            name: "Dr. Musa".into(),
            specialization: "Neurology".into(),
            status: DoctorStatus::Inactive,
            image: None,
            rating: 4.1,
            available_dates: vec!["2025-06-10".into()],
        },
    ]);

    let active = directory.list_active_doctors(None).await.unwrap();
    assert_eq!(active.iter().map(|d| d.id.as_str()).collect::<Vec<_>>(), vec!["D1"]);

    assert!(directory.set_available_dates("D1", Vec::new()));
    assert!(!directory.set_available_dates("D404", Vec::new()));

    let refreshed = directory.find_doctor("D1", None).await.unwrap().unwrap();
    assert!(refreshed.available_dates.is_empty());
    assert!(directory.find_doctor("D2", None).await.unwrap().is_some());
}
