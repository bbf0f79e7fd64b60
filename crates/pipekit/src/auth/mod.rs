//! Authentication modules
//!
//! Modules implement [`AuthenticationModule`] and are attached to a pipe with
//! [`Pipe::set_authentication_module`](crate::Pipe::set_authentication_module).
//! They run on every request, just before the method is set, and may only
//! add request headers.

pub mod basic;
pub mod token;

pub use basic::{BasicAuthentication, basic_auth};
pub use pipekit_transport::AuthenticationModule;
pub use token::{DEFAULT_TOKEN_HEADER, TokenAuthentication};
