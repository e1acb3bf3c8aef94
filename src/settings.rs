//! Settings screen state
//!
//! Premium status, trial status and version info are each fetched from the
//! store on their own. A failed fetch leaves that one value at its default
//! and is logged; the others still load.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::auth::{AuthProvider, UserIdentity};
use crate::store::{get_doc, SharedStore};
use crate::trial::{TrialInfo, TrialManager};

const USERS_COLLECTION: &str = "users";
const META_COLLECTION: &str = "app_meta";
const VERSION_DOC: &str = "version";

pub const CURRENT_VERSION: &str = env!("CARGO_PKG_VERSION");

#[derive(Debug, Clone, Default, Deserialize)]
struct UserRecord {
    #[serde(default)]
    premium: bool,
}

/// What the release channel advertises (`app_meta/version`)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteVersion {
    #[serde(default)]
    pub latest: Option<String>,
    #[serde(default)]
    pub minimum_supported: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VersionInfo {
    pub current: String,
    pub latest: Option<String>,
    pub minimum_supported: Option<String>,
    pub update_available: bool,
    pub update_required: bool,
}

impl VersionInfo {
    /// Version info with nothing known about the release channel
    pub fn local(current: &str) -> Self {
        Self::compare(current, &RemoteVersion::default())
    }

    pub fn compare(current: &str, remote: &RemoteVersion) -> Self {
        let update_available = remote
            .latest
            .as_deref()
            .is_some_and(|latest| is_newer_version(latest, current));
        let update_required = remote
            .minimum_supported
            .as_deref()
            .is_some_and(|minimum| is_newer_version(minimum, current));
        Self {
            current: current.to_string(),
            latest: remote.latest.clone(),
            minimum_supported: remote.minimum_supported.clone(),
            update_available,
            update_required,
        }
    }
}

impl Default for VersionInfo {
    fn default() -> Self {
        Self::local(CURRENT_VERSION)
    }
}

/// True if `candidate` is a newer `major.minor.patch` than `current`.
/// Unparseable versions never compare as newer.
pub fn is_newer_version(candidate: &str, current: &str) -> bool {
    let parse = |v: &str| -> Option<(u32, u32, u32)> {
        let mut parts = v.trim().trim_start_matches('v').split('.');
        let major = parts.next()?.parse().ok()?;
        let minor = parts.next()?.parse().ok()?;
        let patch = parts.next()?.split(['-', '+']).next()?.parse().ok()?;
        Some((major, minor, patch))
    };

    match (parse(candidate), parse(current)) {
        (Some(candidate), Some(current)) => candidate > current,
        _ => false,
    }
}

pub struct SettingsController {
    store: SharedStore,
    auth: Arc<dyn AuthProvider>,
    trial: Option<TrialManager>,
    current_version: String,
    is_premium: bool,
    trial_info: TrialInfo,
    version_info: VersionInfo,
}

impl SettingsController {
    /// Build the controller and fetch everything once. Without a trial
    /// manager (no device identity) trial info stays at its default.
    pub fn load(
        store: SharedStore,
        auth: Arc<dyn AuthProvider>,
        trial: Option<TrialManager>,
    ) -> Self {
        Self::load_with_version(store, auth, trial, CURRENT_VERSION)
    }

    pub fn load_with_version(
        store: SharedStore,
        auth: Arc<dyn AuthProvider>,
        trial: Option<TrialManager>,
        current_version: &str,
    ) -> Self {
        let mut controller = Self {
            store,
            auth,
            trial,
            current_version: current_version.to_string(),
            is_premium: false,
            trial_info: TrialInfo::default(),
            version_info: VersionInfo::local(current_version),
        };
        controller.refresh();
        controller
    }

    pub fn refresh(&mut self) {
        self.is_premium = match self.fetch_premium() {
            Ok(premium) => premium,
            Err(err) => {
                tracing::warn!(error = %err, "premium status unavailable");
                false
            }
        };

        self.trial_info = self
            .trial
            .as_ref()
            .map(TrialManager::get_trial_info)
            .unwrap_or_default();

        self.version_info = match self.fetch_remote_version() {
            Ok(remote) => VersionInfo::compare(&self.current_version, &remote),
            Err(err) => {
                tracing::warn!(error = %err, "version info unavailable");
                VersionInfo::local(&self.current_version)
            }
        };

        tracing::debug!(
            premium = self.is_premium,
            trial_active = self.trial_info.has_active_trial,
            update_available = self.version_info.update_available,
            "settings refreshed"
        );
    }

    fn fetch_premium(&self) -> Result<bool> {
        let Some(user) = self.auth.current_user() else {
            return Ok(false);
        };
        let record: Option<UserRecord> = get_doc(self.store.as_ref(), USERS_COLLECTION, &user.uid)
            .with_context(|| format!("Failed to read user record for {}", user.uid))?;
        Ok(record.is_some_and(|r| r.premium))
    }

    fn fetch_remote_version(&self) -> Result<RemoteVersion> {
        let remote = get_doc(self.store.as_ref(), META_COLLECTION, VERSION_DOC)
            .context("Failed to read version metadata")?;
        Ok(remote.unwrap_or_default())
    }

    pub fn is_premium(&self) -> bool {
        self.is_premium
    }

    pub fn trial_info(&self) -> TrialInfo {
        self.trial_info
    }

    pub fn version_info(&self) -> &VersionInfo {
        &self.version_info
    }

    /// Premium subscribers and devices inside an active trial
    pub fn has_premium_access(&self) -> bool {
        self.is_premium || self.trial_info.has_active_trial
    }

    pub fn current_user(&self) -> Option<UserIdentity> {
        self.auth.current_user()
    }

    /// Mark the signed-in user as premium (or not) and update the cached flag
    pub fn set_premium(&mut self, premium: bool) -> Result<()> {
        let user = self
            .auth
            .current_user()
            .ok_or_else(|| anyhow!("No signed-in user"))?;
        let mut record = self
            .store
            .get(USERS_COLLECTION, &user.uid)
            .with_context(|| format!("Failed to read user record for {}", user.uid))?
            .unwrap_or_else(|| Value::Object(Map::new()));
        match record.as_object_mut() {
            Some(fields) => {
                fields.insert("premium".to_string(), Value::Bool(premium));
            }
            None => bail!("User record for {} is not an object", user.uid),
        }
        self.store
            .put(USERS_COLLECTION, &user.uid, record)
            .with_context(|| format!("Failed to update premium flag for {}", user.uid))?;
        self.is_premium = premium;
        tracing::info!(uid = %user.uid, premium, "premium status updated");
        Ok(())
    }
}
