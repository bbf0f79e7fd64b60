//! Pipeline tests over recording stub connections

use pipekit::transport::stub::{StubConnectionPreparer, StubResponse};
use pipekit::transport::Method;
use pipekit::{
    BasicAuthentication, DuplicatePolicy, Error, Pipe, PipeConfig, PipeExt, PipeFactory, Pipeline,
    Resource, RestPipe, TokenAuthentication,
};
use pretty_assertions::assert_eq;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Factory handing every pipe its own stub preparer, kept for inspection
#[derive(Default)]
struct StubFactory {
    preparers: Mutex<HashMap<String, StubConnectionPreparer>>,
}

impl StubFactory {
    fn preparer(&self, name: &str) -> StubConnectionPreparer {
        self.preparers.lock().unwrap()[name].clone()
    }
}

impl PipeFactory for StubFactory {
    fn create_pipe(&self, config: &PipeConfig) -> pipekit::Result<Arc<dyn Pipe>> {
        let preparer = StubConnectionPreparer::new(StubResponse::ok("[]"));
        self.preparers
            .lock()
            .unwrap()
            .insert(config.name().to_string(), preparer.clone());
        Ok(Arc::new(RestPipe::new(config.clone(), preparer)?))
    }
}

#[derive(Debug, PartialEq, Serialize, Deserialize)]
struct Task {
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<u64>,
    title: String,
}

impl Resource for Task {
    const NAME: &'static str = "tasks";
}

struct Project;

impl Resource for Project {
    const NAME: &'static str = "projects";
}

fn setup(policy: DuplicatePolicy) -> (Pipeline, Arc<StubFactory>) {
    let factory = Arc::new(StubFactory::default());
    let pipeline = Pipeline::builder("http://localhost:8080/todo-server".parse().unwrap())
        .factory(factory.clone())
        .duplicate_policy(policy)
        .build();
    (pipeline, factory)
}

#[tokio::test]
async fn test_pipes_are_independent() {
    let (pipeline, factory) = setup(DuplicatePolicy::Replace);
    let tasks = pipeline.pipe::<Task>().await.unwrap();
    let projects = pipeline.pipe::<Project>().await.unwrap();

    factory
        .preparer("tasks")
        .set_response(StubResponse::ok(r#"[{"id":1,"title":"a"}]"#));

    let read: Vec<Task> = tasks.read_as().await.unwrap();
    assert_eq!(read, vec![Task { id: Some(1), title: "a".to_string() }]);
    assert!(projects.read().await.unwrap().is_empty());

    assert_eq!(factory.preparer("tasks").exchanges().len(), 1);
    assert_eq!(factory.preparer("projects").exchanges().len(), 1);
}

#[tokio::test]
async fn test_crud_through_registry_lookup() {
    let (pipeline, factory) = setup(DuplicatePolicy::Replace);
    pipeline.pipe::<Task>().await.unwrap();
    let preparer = factory.preparer("tasks");

    let tasks = pipeline.get("tasks").await.unwrap();

    preparer.set_response(StubResponse::with_status(201, r#"{"id":5,"title":"new"}"#));
    let created = tasks
        .save_as(&Task { id: None, title: "new".to_string() })
        .await
        .unwrap();
    assert_eq!(created.id, Some(5));

    preparer.set_response(StubResponse::ok(""));
    tasks
        .save(json!({"id": 5, "title": "renamed"}))
        .await
        .unwrap();
    tasks.remove("5").await.unwrap();

    let calls: Vec<_> = preparer
        .exchanges()
        .into_iter()
        .map(|e| (e.method, e.id))
        .collect();
    assert_eq!(
        calls,
        vec![
            (Method::POST, None),
            (Method::PUT, Some("5".to_string())),
            (Method::DELETE, Some("5".to_string())),
        ]
    );
}

#[tokio::test]
async fn test_http_error_surfaces_status_and_body() {
    let (pipeline, factory) = setup(DuplicatePolicy::Replace);
    let tasks = pipeline.pipe::<Task>().await.unwrap();
    factory
        .preparer("tasks")
        .set_response(StubResponse::failure(404, "12345"));

    let err = tasks.read().await.unwrap_err();

    let http = err.http_error().expect("expected an HTTP error");
    assert_eq!(http.status_code(), 404);
    assert_eq!(http.data(), b"12345");
}

#[tokio::test]
async fn test_shared_token_module_follows_login_state() {
    let (pipeline, factory) = setup(DuplicatePolicy::Replace);
    let tasks = pipeline.pipe::<Task>().await.unwrap();
    let projects = pipeline.pipe::<Project>().await.unwrap();

    let auth = Arc::new(TokenAuthentication::new());
    tasks.set_authentication_module(Some(auth.clone()));
    projects.set_authentication_module(Some(auth.clone()));

    auth.set_token("session-1");
    tasks.read().await.unwrap();
    projects.read().await.unwrap();
    auth.clear_token();
    tasks.read().await.unwrap();

    let tasks_log = factory.preparer("tasks").exchanges();
    assert_eq!(tasks_log[0].request_header("Auth-Token"), Some("session-1"));
    assert_eq!(tasks_log[1].request_header("Auth-Token"), None);
    assert_eq!(
        factory.preparer("projects").last_exchange().unwrap().request_header("Auth-Token"),
        Some("session-1")
    );
}

#[tokio::test]
async fn test_basic_authentication_header() {
    let (pipeline, factory) = setup(DuplicatePolicy::Replace);
    let tasks = pipeline.pipe::<Task>().await.unwrap();
    tasks.set_authentication_module(Some(Arc::new(BasicAuthentication::new("user", "pass123"))));

    tasks.remove("1").await.unwrap();

    assert_eq!(
        factory
            .preparer("tasks")
            .last_exchange()
            .unwrap()
            .request_header("Authorization"),
        Some("Basic dXNlcjpwYXNzMTIz")
    );
}

#[tokio::test]
async fn test_reject_policy_leaves_registered_pipe_in_use() {
    let (pipeline, _) = setup(DuplicatePolicy::Reject);
    let first = pipeline.pipe::<Task>().await.unwrap();

    let config = PipeConfig::builder(pipeline.base_url().clone(), "tasks")
        .endpoint("other")
        .build()
        .unwrap();
    let err = pipeline.pipe_with_config(config).await.unwrap_err();

    assert!(matches!(err, Error::DuplicatePipe(_)));
    let current = pipeline.get("tasks").await.unwrap();
    assert!(std::ptr::addr_eq(Arc::as_ptr(&first), Arc::as_ptr(&current)));
    assert_eq!(current.url().as_str(), "http://localhost:8080/todo-server/tasks");
}

#[test]
fn test_registry_from_sync_context() {
    let (pipeline, _) = setup(DuplicatePolicy::Replace);

    tokio_test::block_on(async {
        pipeline.pipe::<Project>().await.unwrap();
        assert_eq!(pipeline.names().await, vec!["projects"]);
        assert!(pipeline.remove("projects").await.is_some());
        assert!(pipeline.is_empty().await);
    });
}
