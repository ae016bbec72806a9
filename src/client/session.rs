use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex, PoisonError,
};

use tracing::{info, warn};

use crate::errors::DEACTIVATED_CODE;

/// Where the bearer token lives between requests.
pub trait CredentialStore: Send + Sync {
    fn token(&self) -> Option<String>;
    fn store(&self, token: String);
    fn clear(&self);
}

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    token: Mutex<Option<String>>,
}

impl CredentialStore for MemoryCredentialStore {
    fn token(&self) -> Option<String> {
        self.token
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn store(&self, token: String) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    fn clear(&self) {
        *self.token.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }
}

/// User-facing side effects of losing a session.
pub trait Notifier: Send + Sync {
    fn alert(&self, title: &str, message: &str);
    fn redirect_to_login(&self);
}

/// Notifier for headless use; only logs.
#[derive(Debug, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn alert(&self, title: &str, message: &str) {
        warn!("{title}: {message}");
    }

    fn redirect_to_login(&self) {
        info!("Session ended, login required");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    LoggedOut,
    /// `alerted` is false when this deactivation was already reported.
    Deactivated { alerted: bool },
}

/// Global auth-failure handling for every API call.
///
/// The deactivation flag makes sure a burst of failing requests raises a
/// single alert. It is cleared on the next login or by [`SessionGuard::reset`].
pub struct SessionGuard {
    credentials: Arc<dyn CredentialStore>,
    notifier: Arc<dyn Notifier>,
    deactivation_alerted: AtomicBool,
}

impl SessionGuard {
    pub fn new(credentials: Arc<dyn CredentialStore>, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            credentials,
            notifier,
            deactivation_alerted: AtomicBool::new(false),
        }
    }

    pub fn in_memory() -> Self {
        Self::new(
            Arc::new(MemoryCredentialStore::default()),
            Arc::new(TracingNotifier),
        )
    }

    pub fn token(&self) -> Option<String> {
        self.credentials.token()
    }

    pub fn on_login(&self, token: String) {
        self.credentials.store(token);
        self.reset();
    }

    pub fn logout(&self) {
        self.credentials.clear();
    }

    pub fn reset(&self) {
        self.deactivation_alerted.store(false, Ordering::SeqCst);
    }

    /// Looks at a failed response and ends the session when it was an auth failure.
    pub fn inspect(&self, status: u16, code: Option<&str>) -> Option<SessionEvent> {
        if code == Some(DEACTIVATED_CODE) {
            self.credentials.clear();
            let alerted = !self.deactivation_alerted.swap(true, Ordering::SeqCst);
            if alerted {
                self.notifier.alert(
                    "Account deactivated",
                    "Your account has been deactivated. Please contact an administrator.",
                );
                self.notifier.redirect_to_login();
            }
            return Some(SessionEvent::Deactivated { alerted });
        }
        if status == 401 {
            self.credentials.clear();
            self.notifier.redirect_to_login();
            return Some(SessionEvent::LoggedOut);
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::AtomicUsize;

    use super::*;

    #[derive(Default)]
    struct CountingNotifier {
        alerts: AtomicUsize,
        redirects: AtomicUsize,
    }

    impl Notifier for CountingNotifier {
        fn alert(&self, _: &str, _: &str) {
            self.alerts.fetch_add(1, Ordering::SeqCst);
        }

        fn redirect_to_login(&self) {
            self.redirects.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn guard() -> (SessionGuard, Arc<CountingNotifier>) {
        let notifier = Arc::new(CountingNotifier::default());
        let guard = SessionGuard::new(
            Arc::new(MemoryCredentialStore::default()),
            notifier.clone(),
        );
        guard.on_login("token".to_owned());
        (guard, notifier)
    }

    #[test]
    fn deactivation_alerts_once() {
        let (guard, notifier) = guard();
        assert_eq!(
            guard.inspect(403, Some(DEACTIVATED_CODE)),
            Some(SessionEvent::Deactivated { alerted: true })
        );
        assert_eq!(
            guard.inspect(403, Some(DEACTIVATED_CODE)),
            Some(SessionEvent::Deactivated { alerted: false })
        );
        assert_eq!(notifier.alerts.load(Ordering::SeqCst), 1);
        assert_eq!(guard.token(), None);
    }

    #[test]
    fn login_rearms_deactivation_alert() {
        let (guard, notifier) = guard();
        guard.inspect(403, Some(DEACTIVATED_CODE));
        guard.on_login("fresh".to_owned());
        guard.inspect(403, Some(DEACTIVATED_CODE));
        assert_eq!(notifier.alerts.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn unauthorized_clears_credentials() {
        let (guard, notifier) = guard();
        assert_eq!(guard.inspect(401, Some("UNAUTHORIZED")), Some(SessionEvent::LoggedOut));
        assert_eq!(guard.token(), None);
        assert_eq!(notifier.redirects.load(Ordering::SeqCst), 1);
        assert_eq!(notifier.alerts.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn other_failures_keep_the_session() {
        let (guard, _) = guard();
        assert_eq!(guard.inspect(403, Some("FORBIDDEN")), None);
        assert_eq!(guard.inspect(500, None), None);
        assert_eq!(guard.token().as_deref(), Some("token"));
    }
}
