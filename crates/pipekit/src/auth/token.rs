//! Token authentication with login and logout

use pipekit_transport::{AuthenticationModule, Connection};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::io;
use std::sync::{PoisonError, RwLock};

/// Header carrying the token unless another is configured.
pub const DEFAULT_TOKEN_HEADER: &str = "Auth-Token";

/// Sends a session token in a request header.
///
/// The token is set after a successful login and cleared on logout; while
/// no token is held, requests go out without the header. One module can be
/// shared by several pipes.
pub struct TokenAuthentication {
    header: String,
    token: RwLock<Option<SecretString>>,
}

impl TokenAuthentication {
    /// Create a logged-out module using the `Auth-Token` header
    pub fn new() -> Self {
        Self::with_header(DEFAULT_TOKEN_HEADER)
    }

    /// Create a logged-out module using a custom header
    pub fn with_header(header: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            token: RwLock::new(None),
        }
    }

    /// Header the token is sent in
    pub fn header(&self) -> &str {
        &self.header
    }

    /// Store the token returned by a login
    pub fn set_token(&self, token: impl Into<String>) {
        let token = SecretString::new(token.into().into_boxed_str());
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = Some(token);
    }

    /// Forget the token
    pub fn clear_token(&self) {
        *self.token.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Whether a token is held
    pub fn is_logged_in(&self) -> bool {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
    }
}

impl Default for TokenAuthentication {
    fn default() -> Self {
        Self::new()
    }
}

impl AuthenticationModule for TokenAuthentication {
    fn authenticate(&self, connection: &mut dyn Connection) -> io::Result<()> {
        let token = self.token.read().unwrap_or_else(PoisonError::into_inner);
        match token.as_ref() {
            Some(token) => connection.set_request_header(&self.header, token.expose_secret()),
            None => Ok(()),
        }
    }
}

impl fmt::Debug for TokenAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenAuthentication")
            .field("header", &self.header)
            .field("logged_in", &self.is_logged_in())
            .finish()
    }
}
