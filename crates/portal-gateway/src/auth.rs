//! Credential verification for external callers
//!
//! A NAS that relays CHAP or PAP credentials to the portal (rather than
//! receiving them from it) needs them checked against a user store. These
//! traits are that seam; [`SimpleAuthService`] is an in-memory store for
//! small deployments and tests.

use crate::config::User;
use portal_proto::verify_chap;
use std::collections::HashMap;
use std::net::Ipv4Addr;
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("Unknown user: {0}")]
    UnknownUser(String),
    #[error("Invalid credentials for user: {0}")]
    InvalidCredentials(String),
}

/// Verify CHAP credentials
///
/// On success returns the session timeout in seconds, 0 meaning unlimited.
pub trait ChapAuthService: Send + Sync {
    fn auth_chap(
        &self,
        username: &[u8],
        chap_id: u8,
        chap_password: &[u8],
        challenge: &[u8],
        user_ip: Ipv4Addr,
    ) -> Result<u32, AuthError>;
}

/// Verify PAP credentials
///
/// On success returns the session timeout in seconds, 0 meaning unlimited.
pub trait PapAuthService: Send + Sync {
    fn auth_pap(&self, username: &[u8], password: &[u8], user_ip: Ipv4Addr)
    -> Result<u32, AuthError>;
}

struct Account {
    password: String,
    session_timeout: u32,
}

/// Simple in-memory user table
#[derive(Default)]
pub struct SimpleAuthService {
    users: HashMap<String, Account>,
}

impl SimpleAuthService {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build the table from configured users
    pub fn from_users(users: &[User]) -> Self {
        let mut service = Self::new();
        for user in users {
            service.add_user(&user.username, &user.password, user.session_timeout);
        }
        service
    }

    pub fn add_user(
        &mut self,
        username: impl Into<String>,
        password: impl Into<String>,
        session_timeout: u32,
    ) {
        self.users.insert(
            username.into(),
            Account {
                password: password.into(),
                session_timeout,
            },
        );
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn account(&self, username: &[u8]) -> Result<(String, &Account), AuthError> {
        let name = String::from_utf8_lossy(username).into_owned();
        match self.users.get(&name) {
            Some(account) => Ok((name, account)),
            None => Err(AuthError::UnknownUser(name)),
        }
    }
}

impl ChapAuthService for SimpleAuthService {
    fn auth_chap(
        &self,
        username: &[u8],
        chap_id: u8,
        chap_password: &[u8],
        challenge: &[u8],
        user_ip: Ipv4Addr,
    ) -> Result<u32, AuthError> {
        let (name, account) = self.account(username)?;

        if verify_chap(chap_id, account.password.as_bytes(), challenge, chap_password) {
            debug!(username = %name, user_ip = %user_ip, "CHAP credentials accepted");
            Ok(account.session_timeout)
        } else {
            Err(AuthError::InvalidCredentials(name))
        }
    }
}

impl PapAuthService for SimpleAuthService {
    fn auth_pap(
        &self,
        username: &[u8],
        password: &[u8],
        user_ip: Ipv4Addr,
    ) -> Result<u32, AuthError> {
        let (name, account) = self.account(username)?;

        if account.password.as_bytes() == password {
            debug!(username = %name, user_ip = %user_ip, "PAP credentials accepted");
            Ok(account.session_timeout)
        } else {
            Err(AuthError::InvalidCredentials(name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use portal_proto::compute_chap_response;

    fn service() -> SimpleAuthService {
        let mut service = SimpleAuthService::new();
        service.add_user("alice", "password", 3600);
        service.add_user("bob", "hunter2", 0);
        service
    }

    fn user_ip() -> Ipv4Addr {
        Ipv4Addr::new(192, 168, 56, 2)
    }

    #[test]
    fn test_chap_accepts_valid_response() {
        let challenge = [0x11u8; 16];
        let response = compute_chap_response(6, b"password", &challenge);

        let timeout = service()
            .auth_chap(b"alice", 6, &response, &challenge, user_ip())
            .unwrap();
        assert_eq!(timeout, 3600);
    }

    #[test]
    fn test_chap_rejects_wrong_ident() {
        let challenge = [0x11u8; 16];
        let response = compute_chap_response(6, b"password", &challenge);

        assert_eq!(
            service().auth_chap(b"alice", 7, &response, &challenge, user_ip()),
            Err(AuthError::InvalidCredentials("alice".to_string()))
        );
    }

    #[test]
    fn test_chap_rejects_truncated_response() {
        let challenge = [0x11u8; 16];
        let response = compute_chap_response(6, b"password", &challenge);

        assert!(
            service()
                .auth_chap(b"alice", 6, &response[..15], &challenge, user_ip())
                .is_err()
        );
    }

    #[test]
    fn test_unknown_user() {
        assert_eq!(
            service().auth_pap(b"mallory", b"password", user_ip()),
            Err(AuthError::UnknownUser("mallory".to_string()))
        );
    }

    #[test]
    fn test_pap() {
        let service = service();
        assert_eq!(service.auth_pap(b"bob", b"hunter2", user_ip()), Ok(0));
        assert!(service.auth_pap(b"bob", b"hunter3", user_ip()).is_err());
    }

    #[test]
    fn test_from_users() {
        let users = vec![User {
            username: "carol".to_string(),
            password: "secret".to_string(),
            session_timeout: 60,
        }];
        let service = SimpleAuthService::from_users(&users);

        assert_eq!(service.len(), 1);
        assert_eq!(service.auth_pap(b"carol", b"secret", user_ip()), Ok(60));
    }
}
