//! Integration tests and fixtures for the pipekit workspace
//!
//! The tests in `tests/` run the whole stack (pipeline, default factory,
//! REST pipe, reqwest connection) against a local mock HTTP server. Pipes
//! built by the default factory drive their connections from tokio's
//! blocking pool, so every test uses the multi-threaded runtime.

use pipekit::{Pipeline, PipelineConfig, Resource};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};

/// Context path of the todo server the fixtures model.
pub const CONTEXT_PATH: &str = "/todo-server";

/// Task entity served under `/todo-server/tasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
    #[serde(default)]
    pub done: bool,
}

impl Task {
    /// An unsaved task
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: None,
            title: title.into(),
            done: false,
        }
    }
}

impl Resource for Task {
    const NAME: &'static str = "tasks";
}

/// Project entity served under `/todo-server/projects`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<u64>,
    pub title: String,
}

impl Resource for Project {
    const NAME: &'static str = "projects";
}

/// Path of a resource collection on the todo server
pub fn collection_path<R: Resource>() -> String {
    format!("{CONTEXT_PATH}/{}", R::ENDPOINT)
}

/// Path of one entity on the todo server
pub fn entity_path<R: Resource>(id: impl std::fmt::Display) -> String {
    format!("{}/{id}", collection_path::<R>())
}

/// Pipeline configuration pointing at a server root URI
pub fn pipeline_config(server_uri: &str) -> PipelineConfig {
    PipelineConfig::new(format!("{server_uri}{CONTEXT_PATH}"))
}

/// Pipeline with default settings pointing at a server root URI
///
/// # Panics
///
/// Panics if `server_uri` is not a valid URL.
pub fn pipeline(server_uri: &str) -> Pipeline {
    Pipeline::from_config(&pipeline_config(server_uri)).expect("valid server URI")
}

/// Two stored tasks as the server lists them
pub fn task_list() -> Value {
    json!([
        {"id": 1, "title": "Buy milk", "done": false},
        {"id": 2, "title": "Write tests", "done": true}
    ])
}
