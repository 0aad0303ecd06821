//! The [`WorkQueue`]/[`TaskHandler`] contract: a single-consumer task queue
//! with round-robin fan-out across subscribers registered on the same
//! queue name.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pf_core::Result;

use crate::task::Task;

/// Handles one delivered [`Task`]. `Ok` acks it; `Err` is logged as a nack
/// but does not trigger redelivery in the in-memory implementation —
/// that remains implementation-defined for other backends.
#[async_trait]
pub trait TaskHandler<P: Send + 'static>: Send + Sync {
	async fn handle(&self, task: Task<P>) -> Result<()>;
}

/// Adapts a plain async closure into a [`TaskHandler`], so callers rarely
/// need to name the trait directly.
pub struct FnHandler<F>(pub F);

#[async_trait]
impl<P, F, Fut> TaskHandler<P> for FnHandler<F>
where
	P: Send + 'static,
	F: Fn(Task<P>) -> Fut + Send + Sync,
	Fut: Future<Output = Result<()>> + Send,
{
	async fn handle(&self, task: Task<P>) -> Result<()> {
		(self.0)(task).await
	}
}

/// Bounds how long [`WorkQueue::wait`] blocks for in-flight tasks to
/// drain. `None` waits indefinitely.
#[derive(Debug, Clone, Copy, Default)]
pub struct WaitContext {
	deadline: Option<Instant>,
}

impl WaitContext {
	pub fn forever() -> Self {
		Self { deadline: None }
	}

	pub fn with_timeout(timeout: Duration) -> Self {
		Self { deadline: Some(Instant::now() + timeout) }
	}

	pub(crate) fn deadline(&self) -> Option<Instant> {
		self.deadline
	}
}

/// A named stream of tasks with one or more round-robin subscribers.
///
/// Enqueue delivers a payload to exactly one subscriber. If no
/// subscriber is registered for a queue, enqueue is a silent drop — the
/// caller is responsible for subscribing first.
#[async_trait]
pub trait WorkQueue<P: Send + 'static>: Send + Sync {
	/// Registers `handler` on `queue`. Multiple subscribers on the same
	/// queue name receive tasks round-robin.
	fn subscribe(&self, queue: &str, handler: Arc<dyn TaskHandler<P>>);

	/// Delivers `payload` to the next subscriber on `queue` in round-robin
	/// order. Returns once the task has been accepted for dispatch, not
	/// once it has run.
	async fn enqueue(&self, queue: &str, payload: P) -> Result<()>;

	/// Blocks until every enqueued task has completed or panicked, or
	/// `ctx`'s deadline passes (in which case it returns a
	/// `DeadlineExceeded` error).
	async fn wait(&self, ctx: &WaitContext) -> Result<()>;

	/// Stops accepting new tasks, drains what is already queued, and then
	/// behaves like [`WorkQueue::wait`]. The default implementation simply
	/// waits; implementations that accept new work after construction
	/// should override this to actually stop accepting it first.
	async fn shutdown(&self, ctx: &WaitContext) -> Result<()> {
		self.wait(ctx).await
	}
}
