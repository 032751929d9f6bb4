//! Session state, injected instead of read from ambient storage.
//!
//! [`SessionManager`] is the only writer: `login` and `logout` are the two
//! mutation entry points. Screens receive a [`Session`] snapshot and read it.

use std::cell::RefCell;
use std::collections::HashMap;

use serde::Deserialize;
use serde_json::Value;

use crate::access::{AccessRights, Action, AdminFlag, ModuleId, Permission};
use crate::error::{AuthError, ConsoleError};
use crate::ids::ItsId;

pub mod keys {
    pub const ACCESS_TOKEN: &str = "access_token";
    pub const SESSION_EXPIRY: &str = "session_expiry";
    pub const ITS_ID: &str = "its_id";
    pub const FULL_NAME: &str = "full_name";
    pub const IS_ADMIN: &str = "is_admin";
    pub const ACCESS_RIGHTS: &str = "access_rights";

    pub const ALL: [&str; 6] = [ACCESS_TOKEN, SESSION_EXPIRY, ITS_ID, FULL_NAME, IS_ADMIN, ACCESS_RIGHTS];
}

/// Browser-local key/value storage, abstracted so tests can use memory.
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&self, key: &str, value: &str);
    fn remove(&self, key: &str);

    fn clear_session(&self) {
        for key in keys::ALL {
            self.remove(key);
        }
    }
}

#[derive(Default)]
pub struct MemoryStore {
    inner: RefCell<HashMap<String, String>>,
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.inner.borrow().get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) {
        self.inner.borrow_mut().insert(key.to_string(), value.to_string());
    }

    fn remove(&self, key: &str) {
        self.inner.borrow_mut().remove(key);
    }
}

/// What a successful login returns.
#[derive(Clone, Debug, Deserialize)]
pub struct LoginGrant {
    pub access_token: String,
    /// Epoch millis.
    pub session_expiry: i64,
    pub its_id: ItsId,
    pub full_name: String,
    #[serde(default)]
    pub is_admin: Value,
    #[serde(default)]
    pub access_rights: String,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Session {
    token: String,
    expires_at_ms: i64,
    its_id: ItsId,
    full_name: String,
    rights: AccessRights,
    raw_rights: String,
}

impl Session {
    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.token)
    }

    pub fn its_id(&self) -> &ItsId {
        &self.its_id
    }

    pub fn full_name(&self) -> &str {
        &self.full_name
    }

    pub fn is_admin(&self) -> bool {
        self.rights.is_admin()
    }

    pub fn raw_rights(&self) -> &str {
        &self.raw_rights
    }

    pub fn expires_at_ms(&self) -> i64 {
        self.expires_at_ms
    }

    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms >= self.expires_at_ms
    }

    pub fn permission(&self, module: &str) -> Permission {
        self.rights.permission(module)
    }

    /// Gate for a protected action; checked before any request goes out.
    pub fn authorize(&self, module: &str, action: Action, now_ms: i64) -> Result<(), ConsoleError> {
        if self.is_expired(now_ms) {
            return Err(AuthError::Expired.into());
        }
        if self.permission(module).allows(action) {
            Ok(())
        } else {
            log::info!("{} denied {action} on module {module}", self.its_id);
            Err(ConsoleError::Forbidden { module: ModuleId::from(module), action })
        }
    }
}

pub struct SessionManager<S: KeyValueStore> {
    store: S,
}

impl<S: KeyValueStore> SessionManager<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn login(&self, grant: LoginGrant) -> Session {
        let admin = AdminFlag::from_value(&grant.is_admin).0;
        self.store.set(keys::ACCESS_TOKEN, &grant.access_token);
        self.store.set(keys::SESSION_EXPIRY, &grant.session_expiry.to_string());
        self.store.set(keys::ITS_ID, grant.its_id.as_str());
        self.store.set(keys::FULL_NAME, &grant.full_name);
        self.store.set(keys::IS_ADMIN, if admin { "true" } else { "false" });
        self.store.set(keys::ACCESS_RIGHTS, &grant.access_rights);
        log::info!("session opened for {}", grant.its_id);

        Session {
            token: grant.access_token,
            expires_at_ms: grant.session_expiry,
            its_id: grant.its_id,
            full_name: grant.full_name,
            rights: AccessRights::parse(&grant.access_rights).with_admin(admin),
            raw_rights: grant.access_rights,
        }
    }

    pub fn logout(&self) {
        self.store.clear_session();
        log::info!("session cleared");
    }

    /// Rebuilds the session from storage. Any incomplete or expired state
    /// wipes the store.
    pub fn restore(&self, now_ms: i64) -> Result<Session, AuthError> {
        let session = match self.read() {
            Some(s) => s,
            None => {
                self.store.clear_session();
                return Err(AuthError::Missing);
            }
        };
        if session.is_expired(now_ms) {
            log::warn!("stored session for {} has expired", session.its_id);
            self.store.clear_session();
            return Err(AuthError::Expired);
        }
        Ok(session)
    }

    fn read(&self) -> Option<Session> {
        let token = self.store.get(keys::ACCESS_TOKEN).filter(|t| !t.is_empty())?;
        let expires_at_ms = self.store.get(keys::SESSION_EXPIRY)?.trim().parse::<i64>().ok()?;
        let its_id = ItsId::parse(&self.store.get(keys::ITS_ID)?)?;
        let full_name = self.store.get(keys::FULL_NAME).unwrap_or_default();
        let admin = self.store.get(keys::IS_ADMIN).map(|v| AdminFlag::from_text(&v).0).unwrap_or(false);
        let raw_rights = self.store.get(keys::ACCESS_RIGHTS).unwrap_or_default();

        Some(Session {
            token,
            expires_at_ms,
            its_id,
            full_name,
            rights: AccessRights::parse(&raw_rights).with_admin(admin),
            raw_rights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn grant(is_admin: Value, rights: &str) -> LoginGrant {
        LoginGrant {
            access_token: "tok".into(),
            session_expiry: 10_000,
            its_id: ItsId::parse("30301234").unwrap(),
            full_name: "Test User".into(),
            is_admin,
            access_rights: rights.into(),
        }
    }

    #[test]
    fn login_persists_every_key() {
        let mgr = SessionManager::new(MemoryStore::default());
        mgr.login(grant(json!("1"), "[108]110"));
        for key in keys::ALL {
            assert!(mgr.store().get(key).is_some(), "missing {key}");
        }
        assert_eq!(mgr.store().get(keys::IS_ADMIN).as_deref(), Some("true"));
    }

    #[test]
    fn restore_round_trips_through_storage() {
        let mgr = SessionManager::new(MemoryStore::default());
        let live = mgr.login(grant(json!(false), "[108]110"));
        let restored = mgr.restore(5_000).unwrap();
        assert_eq!(live, restored);
        assert_eq!(restored.bearer(), "Bearer tok");
    }

    #[test]
    fn expired_session_clears_the_store() {
        let mgr = SessionManager::new(MemoryStore::default());
        mgr.login(grant(json!(false), ""));
        assert_eq!(mgr.restore(10_000), Err(AuthError::Expired));
        assert!(mgr.store().get(keys::ACCESS_TOKEN).is_none());
    }

    #[test]
    fn incomplete_storage_is_missing() {
        let mgr = SessionManager::new(MemoryStore::default());
        mgr.store().set(keys::ACCESS_TOKEN, "tok");
        assert_eq!(mgr.restore(0), Err(AuthError::Missing));
        assert!(mgr.store().get(keys::ACCESS_TOKEN).is_none());
    }

    #[test]
    fn logout_removes_everything() {
        let mgr = SessionManager::new(MemoryStore::default());
        mgr.login(grant(json!(true), "[101]111"));
        mgr.logout();
        for key in keys::ALL {
            assert!(mgr.store().get(key).is_none());
        }
    }

    #[test]
    fn non_admin_with_duty_rights_cannot_delete() {
        let mgr = SessionManager::new(MemoryStore::default());
        let session = mgr.login(grant(json!(false), "[108]110"));
        let p = session.permission("108");
        assert_eq!(p, Permission { can_add: true, can_edit: true, can_delete: false, has_access: true });
        assert!(session.authorize("108", Action::Add, 0).is_ok());
        let err = session.authorize("108", Action::Delete, 0).unwrap_err();
        assert!(err.is_forbidden());
    }

    #[test]
    fn authorize_reports_expiry_first() {
        let mgr = SessionManager::new(MemoryStore::default());
        let session = mgr.login(grant(json!(true), ""));
        let err = session.authorize("108", Action::View, 20_000).unwrap_err();
        assert!(err.requires_logout());
    }
}
