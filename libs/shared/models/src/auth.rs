use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct JwtClaims {
    pub sub: String,
    pub exp: Option<u64>,
    pub email: Option<String>,
    pub role: Option<String>,
    pub app_metadata: Option<serde_json::Value>,
    pub user_metadata: Option<serde_json::Value>,
    pub aud: Option<String>,
    pub iat: Option<u64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: Option<String>,
    pub role: Option<String>,
    pub metadata: Option<serde_json::Value>,
    pub created_at: Option<DateTime<Utc>>,
}

impl User {
    /// Best-effort human name: `full_name` from user metadata, then the email, then the id.
    pub fn display_name(&self) -> String {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get("full_name"))
            .and_then(|name| name.as_str())
            .filter(|name| !name.trim().is_empty())
            .map(|name| name.trim().to_string())
            .or_else(|| self.email.clone())
            .unwrap_or_else(|| self.id.clone())
    }
}

/// Authenticated patient a booking is made for.
///
/// Passed explicitly to everything that acts on the patient's behalf; the
/// bearer token is forwarded to the backend and never serialized.
#[derive(Debug, Clone, Serialize)]
pub struct PatientIdentity {
    pub patient_id: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub access_token: String,
}

impl PatientIdentity {
    pub fn new(patient_id: impl Into<String>, display_name: impl Into<String>, access_token: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            display_name: display_name.into(),
            access_token: access_token.into(),
        }
    }

    pub fn from_user(user: &User, access_token: &str, display_name: Option<String>) -> Self {
        let display_name = display_name
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| user.display_name());

        Self::new(user.id.clone(), display_name, access_token)
    }
}
