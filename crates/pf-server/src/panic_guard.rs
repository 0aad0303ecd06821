//! Panic recovery around the terminal handler: a handler panic becomes an
//! `Internal` status rather than taking the connection down, mirroring
//! the recovery `pf-tasks` applies around a task handler.

use std::future::Future;

use pf_core::{Error, Result};

/// Runs `handler` under panic recovery: the handler is spawned as its own
/// task so a panic only fails that task's `JoinHandle`, never unwinds the
/// caller.
pub async fn protect<F, T>(handler: F) -> Result<T>
where
	F: Future<Output = Result<T>> + Send + 'static,
	T: Send + 'static,
{
	match tokio::spawn(handler).await {
		Ok(result) => result,
		Err(join_err) => Err(Error::internal(panic_message(&join_err)).with_public_message("internal error")),
	}
}

fn panic_message(join_err: &tokio::task::JoinError) -> String {
	if join_err.is_cancelled() {
		return "handler was cancelled".to_string();
	}
	format!("handler panicked: {join_err}")
}
