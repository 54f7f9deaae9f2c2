use std::env;
use std::str::FromStr;
use tracing::warn;

pub const DEFAULT_BOOKING_WINDOW_DAYS: i64 = 30;
pub const MIN_BOOKING_WINDOW_DAYS: i64 = 1;
pub const MAX_BOOKING_WINDOW_DAYS: i64 = 365;
pub const DEFAULT_REDIRECT_DELAY_SECS: u64 = 2;
pub const DEFAULT_PATIENT_DASHBOARD_PATH: &str = "/patient/dashboard";
pub const DEFAULT_SESSION_TTL_SECS: u64 = 30 * 60;

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub supabase_url: String,
    pub supabase_anon_key: String,
    pub supabase_jwt_secret: String,
    pub booking_window_days: i64,
    pub booking_redirect_delay_secs: u64,
    pub patient_dashboard_path: String,
    /// Idle time after which an abandoned booking session is dropped.
    pub booking_session_ttl_secs: u64,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            supabase_url: String::new(),
            supabase_anon_key: String::new(),
            supabase_jwt_secret: String::new(),
            booking_window_days: DEFAULT_BOOKING_WINDOW_DAYS,
            booking_redirect_delay_secs: DEFAULT_REDIRECT_DELAY_SECS,
            patient_dashboard_path: DEFAULT_PATIENT_DASHBOARD_PATH.to_string(),
            booking_session_ttl_secs: DEFAULT_SESSION_TTL_SECS,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let config = Self {
            supabase_url: env::var("SUPABASE_URL")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_URL not set, using empty value");
                    String::new()
                }),
            supabase_anon_key: env::var("SUPABASE_ANON_PUBLIC_KEY")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_ANON_PUBLIC_KEY not set, using empty value");
                    String::new()
                }),
            supabase_jwt_secret: env::var("SUPABASE_JWT_SECRET")
                .unwrap_or_else(|_| {
                    warn!("SUPABASE_JWT_SECRET not set, using empty value");
                    String::new()
                }),
            booking_window_days: clamp_window_days(parse_or_default(
                "BOOKING_WINDOW_DAYS",
                DEFAULT_BOOKING_WINDOW_DAYS,
            )),
            booking_redirect_delay_secs: parse_or_default(
                "BOOKING_REDIRECT_DELAY_SECS",
                DEFAULT_REDIRECT_DELAY_SECS,
            ),
            patient_dashboard_path: env::var("PATIENT_DASHBOARD_PATH")
                .unwrap_or_else(|_| DEFAULT_PATIENT_DASHBOARD_PATH.to_string()),
            booking_session_ttl_secs: parse_or_default(
                "BOOKING_SESSION_TTL_SECS",
                DEFAULT_SESSION_TTL_SECS,
            ),
        };

        if !config.is_configured() {
            warn!("Application not fully configured - missing environment variables");
        }

        config
    }

    pub fn is_configured(&self) -> bool {
        !self.supabase_url.is_empty()
            && !self.supabase_anon_key.is_empty()
            && !self.supabase_jwt_secret.is_empty()
    }
}

fn parse_or_default<T>(key: &str, default: T) -> T
where
    T: FromStr + std::fmt::Display + Copy,
{
    match env::var(key) {
        Ok(raw) => raw.trim().parse().unwrap_or_else(|_| {
            warn!("{} has invalid value '{}', using default {}", key, raw, default);
            default
        }),
        Err(_) => default,
    }
}

fn clamp_window_days(days: i64) -> i64 {
    let clamped = days.clamp(MIN_BOOKING_WINDOW_DAYS, MAX_BOOKING_WINDOW_DAYS);
    if clamped != days {
        warn!(
            "BOOKING_WINDOW_DAYS {} outside {}..={}, using {}",
            days, MIN_BOOKING_WINDOW_DAYS, MAX_BOOKING_WINDOW_DAYS, clamped
        );
    }
    clamped
}
