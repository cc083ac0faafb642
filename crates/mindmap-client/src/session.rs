//! The validated passphrase and its time-boxed local cache.
//!
//! A [`Session`] is created once a passphrase has opened the `default`
//! record. It is mirrored into the `mindmap_auth` slot as
//! `{"password": ..., "timestamp": <epoch millis>}` so a restart within the
//! TTL can log back in without asking.

use std::fmt;

use chrono::{DateTime, Duration, TimeZone, Utc};
use mindmap_shared::constants::{SESSION_SLOT_KEY, SESSION_TTL_HOURS};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::slot::SessionSlot;

#[derive(Clone)]
pub struct Session {
    passphrase: String,
    obtained_at: DateTime<Utc>,
    ttl: Duration,
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedSession {
    password: String,
    timestamp: i64,
}

impl Session {
    pub fn new(passphrase: impl Into<String>, obtained_at: DateTime<Utc>) -> Self {
        Self {
            passphrase: passphrase.into(),
            obtained_at,
            ttl: Duration::hours(SESSION_TTL_HOURS),
        }
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn passphrase(&self) -> &str {
        &self.passphrase
    }

    pub fn obtained_at(&self) -> DateTime<Utc> {
        self.obtained_at
    }

    /// Still usable at `now`: strictly younger than the TTL.
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        now - self.obtained_at < self.ttl
    }

    /// Read the cached session from `slot`.
    ///
    /// Expired or unreadable entries are deleted and `None` is returned.
    pub fn restore(slot: &dyn SessionSlot, now: DateTime<Utc>, ttl: Duration) -> Option<Self> {
        let raw = match slot.get(SESSION_SLOT_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "failed to read cached session");
                return None;
            }
        };

        let session = serde_json::from_str::<PersistedSession>(&raw)
            .ok()
            .and_then(|p| {
                let obtained_at = Utc.timestamp_millis_opt(p.timestamp).single()?;
                Some(Session::new(p.password, obtained_at).with_ttl(ttl))
            });

        match session {
            Some(session) if session.is_valid(now) => {
                debug!(obtained_at = %session.obtained_at, "cached session is still valid");
                Some(session)
            }
            Some(_) => {
                debug!("cached session expired");
                Self::forget(slot);
                None
            }
            None => {
                warn!("cached session is unreadable, discarding it");
                Self::forget(slot);
                None
            }
        }
    }

    pub fn persist(&self, slot: &dyn SessionSlot) -> std::io::Result<()> {
        let persisted = PersistedSession {
            password: self.passphrase.clone(),
            timestamp: self.obtained_at.timestamp_millis(),
        };
        let json = serde_json::to_string(&persisted)?;
        slot.set(SESSION_SLOT_KEY, &json)
    }

    pub fn forget(slot: &dyn SessionSlot) {
        if let Err(e) = slot.remove(SESSION_SLOT_KEY) {
            warn!(error = %e, "failed to clear cached session");
        }
    }
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("passphrase", &"<redacted>")
            .field("obtained_at", &self.obtained_at)
            .field("ttl", &self.ttl)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::slot::MemorySlot;

    fn ttl() -> Duration {
        Duration::hours(24)
    }

    fn slot_with(json: &str) -> MemorySlot {
        let slot = MemorySlot::new();
        slot.set(SESSION_SLOT_KEY, json).unwrap();
        slot
    }

    #[test]
    fn validity_window() {
        let now = Utc::now();
        let just_under = Session::new("p", now - ttl() + Duration::seconds(1));
        let exactly = Session::new("p", now - ttl());
        let over = Session::new("p", now - ttl() - Duration::minutes(1));

        assert!(just_under.is_valid(now));
        assert!(!exactly.is_valid(now));
        assert!(!over.is_valid(now));
    }

    #[test]
    fn persist_uses_web_client_shape() {
        let slot = MemorySlot::new();
        let at = Utc.timestamp_millis_opt(1_700_000_000_123).unwrap();
        Session::new("hunter2", at).persist(&slot).unwrap();

        let raw = slot.get(SESSION_SLOT_KEY).unwrap().unwrap();
        let value: serde_json::Value = serde_json::from_str(&raw).unwrap();
        assert_eq!(value["password"], "hunter2");
        assert_eq!(value["timestamp"], 1_700_000_000_123i64);
    }

    #[test]
    fn restore_fresh_session() {
        let now = Utc::now();
        let at = now - Duration::hours(23) - Duration::minutes(59);
        let slot = MemorySlot::new();
        Session::new("pw", at).persist(&slot).unwrap();

        let restored = Session::restore(&slot, now, ttl()).unwrap();
        assert_eq!(restored.passphrase(), "pw");
        assert_eq!(restored.obtained_at().timestamp_millis(), at.timestamp_millis());
    }

    #[test]
    fn restore_discards_expired_session() {
        let now = Utc::now();
        let slot = MemorySlot::new();
        Session::new("pw", now - Duration::hours(25)).persist(&slot).unwrap();

        assert!(Session::restore(&slot, now, ttl()).is_none());
        assert_eq!(slot.get(SESSION_SLOT_KEY).unwrap(), None);
    }

    #[test]
    fn restore_discards_garbage() {
        let slot = slot_with("{not json");
        assert!(Session::restore(&slot, Utc::now(), ttl()).is_none());
        assert_eq!(slot.get(SESSION_SLOT_KEY).unwrap(), None);

        let slot = slot_with(r#"{"password":"pw"}"#);
        assert!(Session::restore(&slot, Utc::now(), ttl()).is_none());
        assert_eq!(slot.get(SESSION_SLOT_KEY).unwrap(), None);
    }

    #[test]
    fn empty_slot_restores_nothing() {
        assert!(Session::restore(&MemorySlot::new(), Utc::now(), ttl()).is_none());
    }

    #[test]
    fn debug_redacts_passphrase() {
        let rendered = format!("{:?}", Session::new("top-secret", Utc::now()));
        assert!(!rendered.contains("top-secret"));
    }
}
