//! Basic pipe usage against a todo server
//!
//! ```bash
//! PIPEKIT_BASE_URL=http://localhost:8080/todo-server \
//!     RUST_LOG=debug cargo run --example basic --features trace
//! ```

use pipekit::observability::init_tracing;
use pipekit::{PipeExt, Pipeline, PipelineConfig, Resource, TokenAuthentication};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

#[derive(Debug, Serialize, Deserialize)]
struct Task {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    title: String,
}

impl Resource for Task {
    const NAME: &'static str = "tasks";
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let mut config = PipelineConfig::from_env()?;
    if config.base_url.is_none() {
        config.base_url = Some("http://localhost:8080/todo-server".to_string());
    }
    let pipeline = Pipeline::from_config(&config)?;

    let tasks = pipeline.pipe::<Task>().await?;
    println!("Pipe '{}' at {}", tasks.name(), tasks.url());

    if let Ok(token) = std::env::var("PIPEKIT_TOKEN") {
        let auth = Arc::new(TokenAuthentication::new());
        auth.set_token(token);
        tasks.set_authentication_module(Some(auth));
    }

    let saved = tasks
        .save_as(&Task {
            id: None,
            title: "Try pipekit".to_string(),
        })
        .await?;
    println!("Saved: {saved:?}");

    match tasks.read_as::<Task>().await {
        Ok(all) => println!("{} tasks on the server", all.len()),
        Err(err) => match err.http_error() {
            Some(http) => eprintln!("Server answered {}: {:?}", http.status_code(), http.text()),
            None => return Err(err.into()),
        },
    }

    if let Some(id) = saved.id {
        tasks.remove(&id.to_string()).await?;
        println!("Removed task {id}");
    }

    Ok(())
}
