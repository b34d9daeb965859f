//! Request pipeline stages, observed through their log output

use std::io::Write;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use futures::FutureExt;
use serde::Serialize;
use uuid::Uuid;

use epr_server::context::RequestContext;
use epr_server::cqrs::{Pipeline, Validate};
use epr_server::error::{AppError, AppResult, FieldError};
use epr_server::repository::{MemoryStore, RepositoryError, SharedStore};

#[derive(Debug, Serialize)]
struct PingQuery {
    name: String,
}

impl mediator::Request<AppResult<String>> for PingQuery {}

#[async_trait]
impl Validate for PingQuery {
    async fn validate(
        &self,
        _ctx: &RequestContext,
        _store: &SharedStore,
    ) -> Result<Vec<FieldError>, RepositoryError> {
        if self.name.is_empty() {
            return Ok(vec![FieldError::new("name", "'name' must not be empty")]);
        }
        Ok(Vec::new())
    }
}

#[derive(Clone, Default)]
struct Captured(Arc<Mutex<Vec<u8>>>);

impl Captured {
    fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }
}

impl Write for Captured {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

fn capture() -> (Captured, tracing::subscriber::DefaultGuard) {
    let captured = Captured::default();
    let writer = captured.clone();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(move || writer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    (captured, tracing::subscriber::set_default(subscriber))
}

fn pipeline(threshold: Duration) -> Pipeline {
    Pipeline::new(Arc::new(MemoryStore::new()), threshold)
}

fn ctx() -> RequestContext {
    RequestContext::new(Uuid::new_v4(), Uuid::new_v4())
}

fn ping(name: &str) -> PingQuery {
    PingQuery {
        name: name.to_string(),
    }
}

#[tokio::test]
async fn test_invalid_request_never_reaches_handler() {
    let (logs, _guard) = capture();
    let ran = AtomicBool::new(false);

    let result = pipeline(Duration::from_millis(500))
        .send(&ctx(), ping(""), |_| async {
            ran.store(true, Ordering::SeqCst);
            Ok("pong".to_string())
        })
        .await;

    assert!(matches!(result, Err(AppError::Validation(errors)) if errors[0].field == "name"));
    assert!(!ran.load(Ordering::SeqCst));
    assert!(logs.text().contains("Request failed validation"));
    assert!(!logs.text().contains("Handling PingQuery"));
}

#[tokio::test]
async fn test_entry_and_exit_are_logged() {
    let (logs, _guard) = capture();

    let result = pipeline(Duration::from_millis(500))
        .send(&ctx(), ping("a"), |query| async move { Ok(format!("pong {}", query.name)) })
        .await;

    assert_eq!(result.unwrap(), "pong a");
    let text = logs.text();
    assert!(text.contains("Handling PingQuery"));
    assert!(text.contains("Handled PingQuery"));
    assert!(!text.contains("Long running request"));
}

#[tokio::test(start_paused = true)]
async fn test_slow_request_is_reported_with_payload() {
    let (logs, _guard) = capture();

    pipeline(Duration::from_millis(500))
        .send(&ctx(), ping("slow"), |_| async {
            tokio::time::sleep(Duration::from_millis(600)).await;
            Ok("pong".to_string())
        })
        .await
        .unwrap();

    let text = logs.text();
    assert!(text.contains("Long running request"));
    assert!(text.contains("slow"));
}

#[tokio::test]
async fn test_only_unexpected_errors_are_logged_as_unhandled() {
    let (logs, _guard) = capture();
    let pipeline = pipeline(Duration::from_millis(500));

    let expected = pipeline
        .send(&ctx(), ping("a"), |_| async { Err(AppError::not_found("nothing")) })
        .await;
    assert!(matches!(expected, Err(AppError::NotFound(_))));
    assert!(!logs.text().contains("Unhandled error"));

    let unexpected = pipeline
        .send(&ctx(), ping("a"), |_| async {
            Err(AppError::Unimplemented("ping".to_string()))
        })
        .await;
    assert!(matches!(unexpected, Err(AppError::Unimplemented(_))));
    assert!(logs.text().contains("Unhandled error while processing request"));
}

#[tokio::test]
async fn test_panics_are_logged_and_propagated() {
    let (logs, _guard) = capture();

    let outcome = AssertUnwindSafe(pipeline(Duration::from_millis(500)).send(
        &ctx(),
        ping("a"),
        |_| async {
            let result: AppResult<String> = panic!("boom");
            result
        },
    ))
    .catch_unwind()
    .await;

    assert!(outcome.is_err());
    assert!(logs.text().contains("Request handler panicked"));
}
