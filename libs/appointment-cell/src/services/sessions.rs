// libs/appointment-cell/src/services/sessions.rs
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock};
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use shared_config::DEFAULT_SESSION_TTL_SECS;

use crate::models::AppointmentError;
use crate::services::wizard::BookingWizard;

/// How long a booked session stays readable so the client can show the receipt.
pub const BOOKED_SESSION_GRACE: Duration = Duration::from_secs(60);

struct SessionEntry {
    owner_id: String,
    wizard: Arc<Mutex<BookingWizard>>,
    expires_at: Instant,
    booked: bool,
}

/// In-memory booking sessions, one wizard per id, visible only to the
/// patient who opened it.
///
/// Idle sessions expire after the configured TTL and booked ones shortly
/// after booking. Expired entries are pruned whenever a session is opened or
/// looked up.
#[derive(Clone)]
pub struct BookingSessions {
    sessions: Arc<RwLock<HashMap<Uuid, SessionEntry>>>,
    idle_ttl: Duration,
}

impl Default for BookingSessions {
    fn default() -> Self {
        Self::with_idle_ttl(Duration::from_secs(DEFAULT_SESSION_TTL_SECS))
    }
}

impl BookingSessions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_idle_ttl(idle_ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(RwLock::new(HashMap::new())),
            idle_ttl,
        }
    }

    pub async fn open(&self, wizard: BookingWizard) -> (Uuid, Arc<Mutex<BookingWizard>>) {
        let id = Uuid::new_v4();
        let owner_id = wizard.identity().patient_id.clone();
        let wizard = Arc::new(Mutex::new(wizard));
        let now = Instant::now();

        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, now);
        sessions.insert(
            id,
            SessionEntry {
                owner_id: owner_id.clone(),
                wizard: Arc::clone(&wizard),
                expires_at: now + self.idle_ttl,
                booked: false,
            },
        );

        debug!("Opened booking session {} for patient {} ({} open)", id, owner_id, sessions.len());
        (id, wizard)
    }

    /// Fetch an owned session and push back its idle deadline.
    pub async fn get(&self, id: Uuid, owner_id: &str) -> Result<Arc<Mutex<BookingWizard>>, AppointmentError> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        prune_expired(&mut sessions, now);

        let entry = sessions
            .get_mut(&id)
            .filter(|entry| entry.owner_id == owner_id)
            .ok_or(AppointmentError::SessionNotFound)?;

        if !entry.booked {
            entry.expires_at = now + self.idle_ttl;
        }
        Ok(Arc::clone(&entry.wizard))
    }

    /// Start the short post-booking countdown for a session.
    pub async fn mark_booked(&self, id: Uuid) {
        let mut sessions = self.sessions.write().await;
        if let Some(entry) = sessions.get_mut(&id) {
            entry.booked = true;
            entry.expires_at = Instant::now() + BOOKED_SESSION_GRACE.min(self.idle_ttl);
            debug!("Booking session {} will expire after its grace period", id);
        }
    }

    pub async fn close(&self, id: Uuid, owner_id: &str) -> Result<(), AppointmentError> {
        let mut sessions = self.sessions.write().await;
        let owned = sessions
            .get(&id)
            .is_some_and(|entry| entry.owner_id == owner_id);

        if !owned {
            return Err(AppointmentError::SessionNotFound);
        }

        sessions.remove(&id);
        debug!("Closed booking session {}", id);
        Ok(())
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

fn prune_expired(sessions: &mut HashMap<Uuid, SessionEntry>, now: Instant) {
    let before = sessions.len();
    sessions.retain(|_, entry| entry.expires_at > now);

    let pruned = before - sessions.len();
    if pruned > 0 {
        debug!("Pruned {} expired booking sessions", pruned);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use doctor_cell::services::AvailabilityCalculator;
    use shared_models::auth::PatientIdentity;

    fn wizard(patient: &str) -> BookingWizard {
        BookingWizard::new(
            PatientIdentity::new(patient, "Patient", "token"),
            AvailabilityCalculator::for_today(30, Vec::new()),
        )
    }

    #[tokio::test]
    async fn sessions_are_scoped_to_their_owner() {
        let sessions = BookingSessions::new();
        let (id, _) = sessions.open(wizard("P1")).await;

        assert!(sessions.get(id, "P1").await.is_ok());
        assert_eq!(sessions.get(id, "P2").await.err(), Some(AppointmentError::SessionNotFound));
        assert_eq!(sessions.close(id, "P2").await, Err(AppointmentError::SessionNotFound));

        sessions.close(id, "P1").await.unwrap();
        assert_eq!(sessions.len().await, 0);
        assert!(sessions.get(id, "P1").await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn idle_sessions_expire() {
        let sessions = BookingSessions::with_idle_ttl(Duration::from_secs(600));
        let (idle, _) = sessions.open(wizard("P1")).await;
        let (active, _) = sessions.open(wizard("P2")).await;

        tokio::time::advance(Duration::from_secs(400)).await;
        assert!(sessions.get(active, "P2").await.is_ok());

        tokio::time::advance(Duration::from_secs(300)).await;
        assert_eq!(sessions.get(idle, "P1").await.err(), Some(AppointmentError::SessionNotFound));
        // touched 300s ago, still inside its TTL
        assert!(sessions.get(active, "P2").await.is_ok());
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn booked_sessions_expire_after_grace() {
        let sessions = BookingSessions::with_idle_ttl(Duration::from_secs(3600));
        let (id, _) = sessions.open(wizard("P1")).await;
        sessions.mark_booked(id).await;

        tokio::time::advance(BOOKED_SESSION_GRACE / 2).await;
        // reading the receipt does not extend a booked session
        assert!(sessions.get(id, "P1").await.is_ok());

        tokio::time::advance(BOOKED_SESSION_GRACE).await;
        sessions.open(wizard("P2")).await;
        assert_eq!(sessions.len().await, 1);
        assert!(sessions.get(id, "P1").await.is_err());
    }
}
