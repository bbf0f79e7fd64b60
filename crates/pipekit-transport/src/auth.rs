//! Authentication hook applied to outgoing requests

use crate::connection::Connection;
use std::io;

/// Pre-request hook that adds credentials to a connection.
///
/// The transport calls [`authenticate`](AuthenticationModule::authenticate)
/// on every freshly prepared connection, before the method and body are set.
pub trait AuthenticationModule: Send + Sync {
    /// Add credentials to the outgoing request
    ///
    /// # Errors
    ///
    /// Returns an error if the credentials cannot be attached; the request
    /// is then not sent.
    fn authenticate(&self, connection: &mut dyn Connection) -> io::Result<()>;
}
