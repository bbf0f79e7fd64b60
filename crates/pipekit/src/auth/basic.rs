//! HTTP Basic authentication (RFC 7617)

use base64::{Engine as _, engine::general_purpose::STANDARD};
use pipekit_transport::{AuthenticationModule, Connection};
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::io;

/// Encode a username and password as a Basic `Authorization` header value.
///
/// ```
/// use pipekit::auth::basic_auth;
///
/// assert_eq!(basic_auth("user", "pass123"), "Basic dXNlcjpwYXNzMTIz");
/// ```
pub fn basic_auth(username: &str, password: &str) -> String {
    let encoded = STANDARD.encode(format!("{username}:{password}"));
    format!("Basic {encoded}")
}

/// Sends fixed credentials in the `Authorization` header.
pub struct BasicAuthentication {
    username: String,
    password: SecretString,
}

impl BasicAuthentication {
    /// Create a module for these credentials
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into().into_boxed_str()),
        }
    }

    /// Username sent with every request
    pub fn username(&self) -> &str {
        &self.username
    }
}

impl AuthenticationModule for BasicAuthentication {
    fn authenticate(&self, connection: &mut dyn Connection) -> io::Result<()> {
        connection.set_request_header(
            "Authorization",
            &basic_auth(&self.username, self.password.expose_secret()),
        )
    }
}

impl fmt::Debug for BasicAuthentication {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicAuthentication")
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pipekit_transport::ConnectionPreparer;
    use pipekit_transport::stub::{StubConnectionPreparer, StubResponse};

    #[test]
    fn test_basic_auth_encoding() {
        assert_eq!(basic_auth("user", "pass123"), "Basic dXNlcjpwYXNzMTIz");
        assert_eq!(basic_auth("", ""), "Basic Og==");
    }

    #[test]
    fn test_sets_authorization_header() {
        let preparer = StubConnectionPreparer::new(StubResponse::ok(""));
        let mut connection = preparer.prepare(None).unwrap();

        BasicAuthentication::new("john", "123")
            .authenticate(&mut *connection)
            .unwrap();

        assert_eq!(
            preparer.last_exchange().unwrap().request_header("Authorization"),
            Some("Basic am9objoxMjM=")
        );
    }

    #[test]
    fn test_debug_redacts_password() {
        let module = BasicAuthentication::new("john", "hunter2");
        let debug = format!("{module:?}");
        assert!(debug.contains("john"));
        assert!(!debug.contains("hunter2"));
    }
}
