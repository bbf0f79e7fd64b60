//! Pipe construction

use crate::config::{PipeConfig, PipeType};
use crate::error::Result;
use crate::pipe::{Pipe, RestPipe};
use pipekit_transport::http::{HttpConnectionConfig, ReqwestConnectionPreparer};
use std::sync::Arc;

/// Builds pipes for a [`crate::Pipeline`].
#[cfg_attr(test, mockall::automock)]
pub trait PipeFactory: Send + Sync {
    /// Create the pipe described by `config`
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration cannot be turned into a pipe.
    fn create_pipe(&self, config: &PipeConfig) -> Result<Arc<dyn Pipe>>;
}

/// Factory building [`RestPipe`]s over reqwest connections.
///
/// Every pipe gets its own preparer; `Content-Type` and `Accept` default to
/// the pipe's content type unless the connection settings already name them.
#[derive(Debug, Clone, Default)]
pub struct DefaultPipeFactory {
    connection: HttpConnectionConfig,
}

impl DefaultPipeFactory {
    /// Create a factory with default connection settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a factory with custom connection settings
    pub fn with_connection_config(connection: HttpConnectionConfig) -> Self {
        Self { connection }
    }

    fn connection_for(&self, config: &PipeConfig) -> HttpConnectionConfig {
        let mut connection = self.connection.clone();
        for name in ["Content-Type", "Accept"] {
            let present = connection
                .default_headers
                .iter()
                .any(|(existing, _)| existing.eq_ignore_ascii_case(name));
            if !present {
                connection
                    .default_headers
                    .push((name.to_string(), config.content_type().to_string()));
            }
        }
        connection
    }
}

impl PipeFactory for DefaultPipeFactory {
    fn create_pipe(&self, config: &PipeConfig) -> Result<Arc<dyn Pipe>> {
        match config.pipe_type() {
            PipeType::Rest => {
                let preparer = ReqwestConnectionPreparer::with_config(
                    config.resource_url()?,
                    self.connection_for(config),
                )?;
                Ok(Arc::new(RestPipe::new(config.clone(), preparer)?))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::Error;
    use std::time::Duration;

    fn config() -> PipeConfig {
        PipeConfig::builder("http://localhost:8080/api".parse().unwrap(), "tasks")
            .content_type("application/vnd.tasks+json")
            .build()
            .unwrap()
    }

    #[test]
    fn test_creates_rest_pipe() {
        let pipe = DefaultPipeFactory::new().create_pipe(&config()).unwrap();
        assert_eq!(pipe.name(), "tasks");
        assert_eq!(pipe.url().as_str(), "http://localhost:8080/api/tasks");
        assert_eq!(pipe.pipe_type(), PipeType::Rest);
    }

    #[test]
    fn test_content_headers_default_to_pipe_content_type() {
        let factory = DefaultPipeFactory::with_connection_config(HttpConnectionConfig {
            timeout: Some(Duration::from_secs(3)),
            default_headers: vec![("accept".to_string(), "*/*".to_string())],
            ..Default::default()
        });

        let connection = factory.connection_for(&config());

        assert_eq!(connection.timeout, Some(Duration::from_secs(3)));
        assert_eq!(
            connection.default_headers,
            vec![
                ("accept".to_string(), "*/*".to_string()),
                (
                    "Content-Type".to_string(),
                    "application/vnd.tasks+json".to_string()
                ),
            ]
        );
    }

    #[test]
    fn test_invalid_default_header_is_reported() {
        let factory = DefaultPipeFactory::with_connection_config(HttpConnectionConfig {
            default_headers: vec![("bad header".to_string(), "x".to_string())],
            ..Default::default()
        });

        let result = factory.create_pipe(&config());
        assert!(matches!(result, Err(Error::Transport(_))));
    }
}
