//! Signed-in user identity
//!
//! Authentication itself happens elsewhere; this crate only needs to know
//! who (if anyone) is signed in so per-user documents can be looked up.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::store::{get_doc, put_doc, SharedStore};

const AUTH_COLLECTION: &str = "auth";
const CURRENT_USER_DOC: &str = "current";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub uid: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
}

impl UserIdentity {
    pub fn new(uid: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            display_name: None,
            email: None,
            photo_url: None,
        }
    }

    /// Name for greetings: display name, else the email's local part, else "Friend"
    pub fn greeting_name(&self) -> &str {
        if let Some(name) = self.display_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return name.trim();
        }
        if let Some(local) = self
            .email
            .as_deref()
            .and_then(|e| e.split('@').next())
            .filter(|l| !l.is_empty())
        {
            return local;
        }
        "Friend"
    }
}

pub trait AuthProvider: Send + Sync {
    fn current_user(&self) -> Option<UserIdentity>;
}

/// Fixed identity (or none)
#[derive(Debug, Clone, Default)]
pub struct StaticAuth {
    user: Option<UserIdentity>,
}

impl StaticAuth {
    pub fn signed_in(user: UserIdentity) -> Self {
        Self { user: Some(user) }
    }

    pub fn signed_out() -> Self {
        Self { user: None }
    }
}

impl AuthProvider for StaticAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        self.user.clone()
    }
}

/// Identity persisted in the document store under `auth/current`
#[derive(Clone)]
pub struct StoredAuth {
    store: SharedStore,
}

impl StoredAuth {
    pub fn new(store: SharedStore) -> Self {
        Self { store }
    }

    pub fn sign_in(&self, user: &UserIdentity) -> Result<()> {
        put_doc(self.store.as_ref(), AUTH_COLLECTION, CURRENT_USER_DOC, user)
            .context("Failed to save signed-in user")?;
        tracing::info!(uid = %user.uid, "signed in");
        Ok(())
    }

    pub fn sign_out(&self) -> Result<()> {
        self.store
            .delete(AUTH_COLLECTION, CURRENT_USER_DOC)
            .context("Failed to clear signed-in user")?;
        tracing::info!("signed out");
        Ok(())
    }
}

impl AuthProvider for StoredAuth {
    fn current_user(&self) -> Option<UserIdentity> {
        match get_doc(self.store.as_ref(), AUTH_COLLECTION, CURRENT_USER_DOC) {
            Ok(user) => user,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read signed-in user, treating as signed out");
                None
            }
        }
    }
}
