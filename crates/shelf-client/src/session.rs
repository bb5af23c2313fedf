//! # Session
//!
//! Holds the bearer token of the signed-in user. A session is logged in
//! while it holds a non-empty token; the token itself is never inspected.

use tokio::sync::watch;
use tracing::info;

/// Shared login state. Cheap to clone; clones see the same token.
#[derive(Debug, Clone)]
pub struct Session {
    token: std::sync::Arc<watch::Sender<Option<String>>>,
}

impl Session {
    pub fn anonymous() -> Self {
        Session {
            token: std::sync::Arc::new(watch::Sender::new(None)),
        }
    }

    pub fn with_token(token: Option<String>) -> Self {
        let session = Self::anonymous();
        if let Some(token) = token {
            session.login(token);
        }
        session
    }

    /// Stores `token`; an empty token logs the session out.
    pub fn login(&self, token: impl Into<String>) {
        let token = token.into();
        let token = (!token.trim().is_empty()).then_some(token);
        let logged_in = token.is_some();
        self.token.send_replace(token);
        info!(logged_in, "Session token updated");
    }

    pub fn logout(&self) {
        if self.token.send_replace(None).is_some() {
            info!("Session logged out");
        }
    }

    pub fn logged_in(&self) -> bool {
        self.token.borrow().is_some()
    }

    pub fn token(&self) -> Option<String> {
        self.token.borrow().clone()
    }

    /// Notified on every login and logout.
    pub fn subscribe(&self) -> watch::Receiver<Option<String>> {
        self.token.subscribe()
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::anonymous()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_logout() {
        let session = Session::anonymous();
        assert!(!session.logged_in());

        session.login("abc");
        assert!(session.logged_in());
        assert_eq!(session.token().as_deref(), Some("abc"));

        session.logout();
        assert!(!session.logged_in());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_empty_token_is_logged_out() {
        let session = Session::with_token(Some(String::new()));
        assert!(!session.logged_in());

        session.login("   ");
        assert!(!session.logged_in());
    }

    #[test]
    fn test_clones_share_state() {
        let session = Session::anonymous();
        let other = session.clone();
        session.login("t");
        assert!(other.logged_in());
    }
}
