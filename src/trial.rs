//! Weekly premium trial
//!
//! Every device may start one 7-day trial. The start timestamp is persisted
//! under `trials/<device-id>`; everything else ([`TrialInfo`]) is derived
//! from it on each query.

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::store::{get_doc, put_doc, DocumentStore, SharedStore};

const TRIAL_COLLECTION: &str = "trials";
const DEVICE_COLLECTION: &str = "device";
const DEVICE_DOC: &str = "identity";

pub const TRIAL_DAYS: i64 = 7;

/// A started trial window
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrialSession {
    pub device_id: String,
    pub started_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl TrialSession {
    fn starting_at(device_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            device_id: device_id.to_string(),
            started_at: now,
            expires_at: now + Duration::days(TRIAL_DAYS),
        }
    }

    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        now >= self.started_at && now < self.expires_at
    }
}

/// Trial state as shown on the premium screen.
///
/// Remaining time is reported in whole days while at least a day is left
/// (`remaining_trial_hours` is 0), and in whole hours after that
/// (`remaining_trial_days` is 0).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrialInfo {
    pub has_active_trial: bool,
    pub is_trial_expired: bool,
    pub remaining_trial_days: i64,
    pub remaining_trial_hours: i64,
}

impl TrialInfo {
    pub fn from_session(session: &TrialSession, now: DateTime<Utc>) -> Self {
        let remaining = session.expires_at - now;
        if remaining <= Duration::zero() {
            return Self {
                has_active_trial: false,
                is_trial_expired: true,
                remaining_trial_days: 0,
                remaining_trial_hours: 0,
            };
        }

        let days = remaining.num_days();
        let (remaining_trial_days, remaining_trial_hours) = if days >= 1 {
            (days, 0)
        } else {
            (0, remaining.num_hours())
        };

        Self {
            has_active_trial: true,
            is_trial_expired: false,
            remaining_trial_days,
            remaining_trial_hours,
        }
    }

    pub fn display(&self) -> String {
        if self.is_trial_expired {
            return "Trial expired".to_string();
        }
        if !self.has_active_trial {
            return "No trial started".to_string();
        }
        match (self.remaining_trial_days, self.remaining_trial_hours) {
            (1, _) => "1 day left in trial".to_string(),
            (d, _) if d > 1 => format!("{} days left in trial", d),
            (_, 1) => "1 hour left in trial".to_string(),
            (_, h) if h > 1 => format!("{} hours left in trial", h),
            _ => "Trial ends within the hour".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct DeviceIdentity {
    id: String,
    created_at: DateTime<Utc>,
}

/// The id this installation is known by, created on first use.
pub fn load_or_create_device_id(store: &dyn DocumentStore) -> Result<String> {
    if let Some(identity) = get_doc::<DeviceIdentity>(store, DEVICE_COLLECTION, DEVICE_DOC)
        .context("Failed to read device identity")?
    {
        return Ok(identity.id);
    }

    let identity = DeviceIdentity {
        id: Uuid::new_v4().to_string(),
        created_at: Utc::now(),
    };
    put_doc(store, DEVICE_COLLECTION, DEVICE_DOC, &identity)
        .context("Failed to save device identity")?;
    tracing::info!(device_id = %identity.id, "created device identity");
    Ok(identity.id)
}

/// Trial bookkeeping for one device
#[derive(Clone)]
pub struct TrialManager {
    store: SharedStore,
    device_id: String,
}

impl TrialManager {
    pub fn new(store: SharedStore, device_id: impl Into<String>) -> Self {
        Self {
            store,
            device_id: device_id.into(),
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    fn load_session(&self) -> Result<Option<TrialSession>> {
        get_doc(self.store.as_ref(), TRIAL_COLLECTION, &self.device_id)
            .context("Failed to read trial record")
    }

    /// The stored session, if any. Read failures are treated as "none".
    pub fn session(&self) -> Option<TrialSession> {
        self.load_session().unwrap_or_else(|err| {
            tracing::warn!(device_id = %self.device_id, error = %err, "failed to load trial");
            None
        })
    }

    /// True iff this device has never started a trial. An unreadable store
    /// answers `false` so a trial can't be restarted during an outage.
    pub fn is_trial_eligible(&self) -> bool {
        match self.load_session() {
            Ok(session) => session.is_none(),
            Err(err) => {
                tracing::warn!(device_id = %self.device_id, error = %err, "trial eligibility unknown");
                false
            }
        }
    }

    pub fn start_weekly_trial(&self) -> Result<Option<TrialSession>> {
        self.start_weekly_trial_at(Utc::now())
    }

    /// Start the 7-day window from `now`. `None` if this device already
    /// had a trial.
    pub fn start_weekly_trial_at(&self, now: DateTime<Utc>) -> Result<Option<TrialSession>> {
        if self.load_session()?.is_some() {
            tracing::info!(device_id = %self.device_id, "trial already used on this device");
            return Ok(None);
        }

        let session = TrialSession::starting_at(&self.device_id, now);
        put_doc(self.store.as_ref(), TRIAL_COLLECTION, &self.device_id, &session)
            .context("Failed to save trial")?;
        tracing::info!(
            device_id = %self.device_id,
            expires_at = %session.expires_at,
            "weekly trial started"
        );
        Ok(Some(session))
    }

    pub fn get_trial_info(&self) -> TrialInfo {
        self.get_trial_info_at(Utc::now())
    }

    pub fn get_trial_info_at(&self, now: DateTime<Utc>) -> TrialInfo {
        self.session()
            .map(|session| TrialInfo::from_session(&session, now))
            .unwrap_or_default()
    }
}
