// libs/appointment-cell/src/services/feed.rs
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, Weak};

use tokio::sync::mpsc;
use tracing::debug;

use crate::models::AppointmentRecord;

/// Which records a listener wants. Empty filter means everything.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FeedFilter {
    pub patient_id: Option<String>,
    pub doctor_id: Option<String>,
}

impl FeedFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn for_patient(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: Some(patient_id.into()),
            doctor_id: None,
        }
    }

    pub fn for_doctor(doctor_id: impl Into<String>) -> Self {
        Self {
            patient_id: None,
            doctor_id: Some(doctor_id.into()),
        }
    }

    pub fn matches(&self, record: &AppointmentRecord) -> bool {
        self.patient_id.as_deref().map_or(true, |id| id == record.patient_id)
            && self.doctor_id.as_deref().map_or(true, |id| id == record.doctor_id)
    }
}

struct Listener {
    filter: FeedFilter,
    sender: mpsc::UnboundedSender<AppointmentRecord>,
}

#[derive(Default)]
struct Registry {
    next_id: AtomicU64,
    listeners: Mutex<HashMap<u64, Listener>>,
}

impl Registry {
    fn remove(&self, id: u64) {
        let mut listeners = self.listeners.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if listeners.remove(&id).is_some() {
            debug!("Appointment feed listener {} unsubscribed", id);
        }
    }
}

/// Live stream of newly booked appointments for dashboards.
///
/// Listeners get an [`AppointmentSubscription`] back from [`subscribe`](Self::subscribe);
/// dropping it or calling `unsubscribe` detaches the listener.
#[derive(Clone, Default)]
pub struct AppointmentFeed {
    registry: Arc<Registry>,
}

impl AppointmentFeed {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, filter: FeedFilter) -> AppointmentSubscription {
        let (sender, receiver) = mpsc::unbounded_channel();
        let id = self.registry.next_id.fetch_add(1, Ordering::Relaxed);

        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(id, Listener { filter, sender });

        debug!("Appointment feed listener {} subscribed", id);

        AppointmentSubscription {
            id,
            receiver,
            registry: Some(Arc::downgrade(&self.registry)),
        }
    }

    /// Deliver to every matching listener, returns how many received it.
    pub fn publish(&self, record: &AppointmentRecord) -> usize {
        let mut listeners = self
            .registry
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        let mut delivered = 0;
        listeners.retain(|id, listener| {
            if listener.sender.is_closed() {
                debug!("Pruning closed appointment feed listener {}", id);
                return false;
            }
            if listener.filter.matches(record) && listener.sender.send(record.clone()).is_ok() {
                delivered += 1;
            }
            true
        });

        delivered
    }

    #[cfg(test)]
    fn subscriber_count(&self) -> usize {
        self.registry
            .listeners
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .len()
    }
}

pub struct AppointmentSubscription {
    id: u64,
    receiver: mpsc::UnboundedReceiver<AppointmentRecord>,
    registry: Option<Weak<Registry>>,
}

impl AppointmentSubscription {
    pub fn id(&self) -> u64 {
        self.id
    }

    /// Next record, or `None` once the feed is gone.
    pub async fn recv(&mut self) -> Option<AppointmentRecord> {
        self.receiver.recv().await
    }

    pub fn try_recv(&mut self) -> Option<AppointmentRecord> {
        self.receiver.try_recv().ok()
    }

    pub fn unsubscribe(mut self) {
        self.detach();
    }

    fn detach(&mut self) {
        if let Some(registry) = self.registry.take().and_then(|weak| weak.upgrade()) {
            registry.remove(self.id);
        }
        self.receiver.close();
    }
}

impl Drop for AppointmentSubscription {
    fn drop(&mut self) {
        self.detach();
    }
}
