//! RBAC enforcement over a shared, reloadable rule snapshot.

use std::path::Path;
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use tracing::debug;

use super::error::PolicyError;
use super::loader::{self, Grant};
use super::matcher::MatcherKind;

/// Allow or deny, with the matching grant named on allow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
}

impl PolicyDecision {
    fn allow(reason: String) -> Self {
        Self {
            allowed: true,
            reason: Some(reason),
        }
    }

    fn deny() -> Self {
        Self {
            allowed: false,
            reason: None,
        }
    }
}

/// One complete, immutable view of the rule set.
///
/// Readers always see a snapshot as a whole; reload replaces the value
/// behind the lock rather than mutating it in place.
#[derive(Debug)]
struct PolicySnapshot {
    matcher: MatcherKind,
    grants: Vec<Grant>,
    loaded_at: DateTime<Utc>,
}

impl PolicySnapshot {
    fn decide(&self, role: &str, path: &str, action: &str) -> PolicyDecision {
        for grant in &self.grants {
            if grant.role == role
                && (grant.action == "*" || grant.action == action)
                && self.matcher.matches(&grant.pattern, path)
            {
                return PolicyDecision::allow(format!(
                    "grant ({}, {}, {})",
                    grant.role, grant.pattern, grant.action
                ));
            }
        }
        PolicyDecision::deny()
    }
}

/// The engine handle. Cloneable and thread-safe; construct once at startup
/// and share it, reloading explicitly on signal or interval.
#[derive(Clone, Debug)]
pub struct PolicyEngine {
    inner: Arc<RwLock<PolicySnapshot>>,
}

impl PolicyEngine {
    pub fn new_from_str(model_text: &str, grants_text: &str) -> Result<Self, PolicyError> {
        let snapshot = build_snapshot(model_text, grants_text)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(snapshot)),
        })
    }

    pub fn from_files(model_path: &Path, grants_path: &Path) -> Result<Self, PolicyError> {
        let model = loader::load_model(model_path)?;
        let grants = loader::load_grants(grants_path)?;
        Ok(Self {
            inner: Arc::new(RwLock::new(PolicySnapshot {
                matcher: model.matcher,
                grants,
                loaded_at: Utc::now(),
            })),
        })
    }

    /// Replace the rule set atomically. On error the previous snapshot
    /// stays in effect and concurrent readers are unaffected.
    pub fn reload_from_str(&self, model_text: &str, grants_text: &str) -> Result<(), PolicyError> {
        let snapshot = build_snapshot(model_text, grants_text)?;
        self.swap(snapshot)
    }

    pub fn reload_from_files(
        &self,
        model_path: &Path,
        grants_path: &Path,
    ) -> Result<(), PolicyError> {
        // Parse both resources fully before taking the write lock so a
        // bad file never evicts the working snapshot.
        let model = loader::load_model(model_path)?;
        let grants = loader::load_grants(grants_path)?;
        self.swap(PolicySnapshot {
            matcher: model.matcher,
            grants,
            loaded_at: Utc::now(),
        })
    }

    /// Evaluate (role, path, action) against the current snapshot.
    /// Absence of a matching grant is a deny, not an error.
    pub fn enforce(
        &self,
        subject_role: &str,
        resource_path: &str,
        action: &str,
    ) -> Result<PolicyDecision, PolicyError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| PolicyError::Poisoned(e.to_string()))?;
        let decision = guard.decide(subject_role, resource_path, action);

        debug!(
            role = subject_role,
            path = resource_path,
            action,
            allowed = decision.allowed,
            reason = decision.reason.as_deref().unwrap_or(""),
            "policy decision"
        );

        Ok(decision)
    }

    pub fn grant_count(&self) -> Result<usize, PolicyError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| PolicyError::Poisoned(e.to_string()))?;
        Ok(guard.grants.len())
    }

    pub fn loaded_at(&self) -> Result<DateTime<Utc>, PolicyError> {
        let guard = self
            .inner
            .read()
            .map_err(|e| PolicyError::Poisoned(e.to_string()))?;
        Ok(guard.loaded_at)
    }

    fn swap(&self, snapshot: PolicySnapshot) -> Result<(), PolicyError> {
        let mut guard = self
            .inner
            .write()
            .map_err(|e| PolicyError::Poisoned(e.to_string()))?;
        *guard = snapshot;
        Ok(())
    }

    /// Poison the snapshot lock so evaluation fails. Test-only.
    #[cfg(test)]
    pub(crate) fn poison(&self) {
        let inner = Arc::clone(&self.inner);
        let _ = std::thread::spawn(move || {
            let _guard = inner.write().unwrap();
            panic!("poison policy lock");
        })
        .join();
    }
}

fn build_snapshot(model_text: &str, grants_text: &str) -> Result<PolicySnapshot, PolicyError> {
    let model = loader::parse_model(model_text)?;
    let grants = loader::parse_grants(grants_text)?;
    Ok(PolicySnapshot {
        matcher: model.matcher,
        grants,
        loaded_at: Utc::now(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MODEL: &str = "matcher = glob\n";
    const GRANTS: &str = "\
admin, /users, GET
admin, /users/*, *
nurse, /patients/*, GET
unauthorized, /health, GET
";

    fn engine() -> PolicyEngine {
        PolicyEngine::new_from_str(MODEL, GRANTS).unwrap()
    }

    #[test]
    fn allows_matching_grant() {
        let decision = engine().enforce("admin", "/users", "GET").unwrap();
        assert!(decision.allowed);
        assert_eq!(decision.reason.as_deref(), Some("grant (admin, /users, GET)"));
    }

    #[test]
    fn wildcard_action_matches_any_method() {
        let e = engine();
        assert!(e.enforce("admin", "/users/42", "DELETE").unwrap().allowed);
        assert!(e.enforce("admin", "/users/42", "PATCH").unwrap().allowed);
    }

    #[test]
    fn denies_without_matching_grant() {
        let e = engine();
        let decision = e.enforce("nurse", "/admin/reports", "GET").unwrap();
        assert!(!decision.allowed);
        assert!(decision.reason.is_none());
    }

    #[test]
    fn denies_role_with_wrong_action() {
        let e = engine();
        assert!(!e.enforce("nurse", "/patients/7", "DELETE").unwrap().allowed);
    }

    #[test]
    fn denies_unknown_role() {
        assert!(!engine().enforce("", "/users", "GET").unwrap().allowed);
    }

    #[test]
    fn reload_replaces_the_rule_set() {
        let e = engine();
        assert!(e.enforce("admin", "/users", "GET").unwrap().allowed);

        e.reload_from_str(MODEL, "nurse, /patients/*, GET\n").unwrap();

        assert!(!e.enforce("admin", "/users", "GET").unwrap().allowed);
        assert!(e.enforce("nurse", "/patients/7", "GET").unwrap().allowed);
    }

    #[test]
    fn failed_reload_keeps_previous_snapshot() {
        let e = engine();
        let before = e.grant_count().unwrap();

        let err = e.reload_from_str(MODEL, "admin, /users\n").unwrap_err();
        assert!(matches!(err, PolicyError::Grants(_)));

        assert_eq!(e.grant_count().unwrap(), before);
        assert!(e.enforce("admin", "/users", "GET").unwrap().allowed);
    }

    #[test]
    fn reload_is_atomic_under_concurrent_evaluation() {
        use std::thread;

        // Two rule sets that allow disjoint requests. A reader must see
        // one or the other in full, never a mix or an empty table.
        let set_a = "admin, /users, GET\n";
        let set_b = "admin, /reports, GET\n";

        let e = PolicyEngine::new_from_str(MODEL, set_a).unwrap();
        let reader = e.clone();

        let eval = thread::spawn(move || {
            for _ in 0..1000 {
                let users = reader.enforce("admin", "/users", "GET").unwrap().allowed;
                let reports = reader.enforce("admin", "/reports", "GET").unwrap().allowed;
                assert_eq!(reader.grant_count().unwrap(), 1);
                let _ = (users, reports);
            }
        });

        let writer = thread::spawn(move || {
            for i in 0..200 {
                let set = if i % 2 == 0 { set_b } else { set_a };
                e.reload_from_str(MODEL, set).unwrap();
            }
        });

        eval.join().unwrap();
        writer.join().unwrap();
    }

    #[test]
    fn loaded_at_advances_on_reload() {
        let e = engine();
        let first = e.loaded_at().unwrap();
        e.reload_from_str(MODEL, GRANTS).unwrap();
        assert!(e.loaded_at().unwrap() >= first);
    }

    #[test]
    fn poisoned_lock_is_an_error_not_an_allow() {
        let e = engine();
        e.poison();
        let err = e.enforce("admin", "/users", "GET").unwrap_err();
        assert!(matches!(err, PolicyError::Poisoned(_)));
    }
}
