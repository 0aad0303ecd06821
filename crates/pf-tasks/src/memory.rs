//! The in-memory [`WorkQueue`] implementation: a bounded job channel
//! feeding a fixed worker pool, with round-robin subscriber fan-out and
//! panic-recovering execution.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use async_trait::async_trait;
use parking_lot::RwLock;
use pf_core::{Error, Result};
use tokio::sync::{Mutex as AsyncMutex, Notify, mpsc};

use crate::queue::{TaskHandler, WaitContext, WorkQueue};
use crate::task::{Task, generate_task_id};

/// Tunables for [`InMemoryQueue`]. `worker_count = 0` spawns a fresh task
/// per job instead of pulling from a bounded pool — unbounded
/// concurrency, used by tests that assert immediate parallelism.
#[derive(Debug, Clone, Copy)]
pub struct QueueConfig {
	pub worker_count: usize,
	pub channel_capacity: usize,
}

impl Default for QueueConfig {
	fn default() -> Self {
		Self { worker_count: 100, channel_capacity: 500 }
	}
}

impl QueueConfig {
	/// Spawns a fresh worker per job rather than pulling from a bounded
	/// pool. Intended for tests.
	pub fn unbounded() -> Self {
		Self { worker_count: 0, channel_capacity: 0 }
	}
}

struct Subscribers<P> {
	handlers: Vec<Arc<dyn TaskHandler<P>>>,
	next: AtomicUsize,
}

impl<P> Subscribers<P> {
	fn new() -> Self {
		Self { handlers: Vec::new(), next: AtomicUsize::new(0) }
	}

	/// Picks the next handler round-robin. `None` if nobody is subscribed.
	fn pick(&self) -> Option<Arc<dyn TaskHandler<P>>> {
		if self.handlers.is_empty() {
			return None;
		}
		let index = self.next.fetch_add(1, Ordering::Relaxed) % self.handlers.len();
		Some(self.handlers[index].clone())
	}
}

struct Job<P> {
	task: Task<P>,
	handler: Arc<dyn TaskHandler<P>>,
}

/// A bounded channel plus fixed worker pool (or, with
/// [`QueueConfig::unbounded`], a fresh task per job), coordinating with an
/// in-flight counter and [`Notify`] so [`WorkQueue::wait`] can drain.
pub struct InMemoryQueue<P: Send + 'static> {
	config: QueueConfig,
	subscribers: RwLock<HashMap<String, Subscribers<P>>>,
	pool: AsyncMutex<Option<mpsc::Sender<Job<P>>>>,
	in_flight: Arc<AtomicUsize>,
	notify: Arc<Notify>,
	shut_down: std::sync::atomic::AtomicBool,
}

impl<P: Send + 'static> InMemoryQueue<P> {
	pub fn new(config: QueueConfig) -> Self {
		Self {
			config,
			subscribers: RwLock::new(HashMap::new()),
			pool: AsyncMutex::new(None),
			in_flight: Arc::new(AtomicUsize::new(0)),
			notify: Arc::new(Notify::new()),
			shut_down: std::sync::atomic::AtomicBool::new(false),
		}
	}

	/// Returns a handle to send jobs to, starting the worker pool lazily on
	/// first call.
	async fn sender(&self) -> mpsc::Sender<Job<P>> {
		let mut guard = self.pool.lock().await;
		if let Some(sender) = guard.as_ref() {
			return sender.clone();
		}
		let (tx, rx) = mpsc::channel(self.config.channel_capacity);
		let rx = Arc::new(AsyncMutex::new(rx));
		for _ in 0..self.config.worker_count {
			tokio::spawn(worker_loop(rx.clone(), self.in_flight.clone(), self.notify.clone()));
		}
		*guard = Some(tx.clone());
		tx
	}
}

impl<P: Send + 'static> Default for InMemoryQueue<P> {
	fn default() -> Self {
		Self::new(QueueConfig::default())
	}
}

#[async_trait]
impl<P: Send + 'static> WorkQueue<P> for InMemoryQueue<P> {
	fn subscribe(&self, queue: &str, handler: Arc<dyn TaskHandler<P>>) {
		let mut subscribers = self.subscribers.write();
		subscribers.entry(queue.to_string()).or_insert_with(Subscribers::new).handlers.push(handler);
	}

	async fn enqueue(&self, queue: &str, payload: P) -> Result<()> {
		if self.shut_down.load(Ordering::SeqCst) {
			return Err(Error::unavailable("work queue is shut down"));
		}
		let handler = {
			let subscribers = self.subscribers.read();
			match subscribers.get(queue) {
				Some(s) => s.pick(),
				None => None,
			}
		};
		// No subscriber registered: silent drop. The caller is responsible
		// for subscribing before enqueueing.
		let Some(handler) = handler else {
			tracing::debug!(queue, "enqueue with no subscriber, dropping task");
			return Ok(());
		};
		let task = Task::new(generate_task_id(), queue, payload);
		self.in_flight.fetch_add(1, Ordering::SeqCst);

		if self.config.worker_count == 0 {
			let in_flight = self.in_flight.clone();
			let notify = self.notify.clone();
			tokio::spawn(execute(Job { task, handler }, in_flight, notify));
			return Ok(());
		}

		let sender = self.sender().await;
		if sender.send(Job { task, handler }).await.is_err() {
			self.in_flight.fetch_sub(1, Ordering::SeqCst);
			self.notify.notify_waiters();
			return Err(Error::unavailable("work queue is shut down"));
		}
		Ok(())
	}

	async fn wait(&self, ctx: &WaitContext) -> Result<()> {
		loop {
			let notified = self.notify.notified();
			if self.in_flight.load(Ordering::SeqCst) == 0 {
				return Ok(());
			}
			tokio::pin!(notified);
			match ctx.deadline() {
				Some(deadline) => {
					let remaining = deadline.saturating_duration_since(Instant::now());
					if tokio::time::timeout(remaining, notified).await.is_err() {
						if self.in_flight.load(Ordering::SeqCst) == 0 {
							return Ok(());
						}
						return Err(Error::deadline_exceeded("work queue wait timed out"));
					}
				}
				None => notified.await,
			}
		}
	}

	/// Closes the job channel — draining jobs already queued, accepting no
	/// new ones — then waits for drain.
	async fn shutdown(&self, ctx: &WaitContext) -> Result<()> {
		self.shut_down.store(true, Ordering::SeqCst);
		let mut guard = self.pool.lock().await;
		guard.take();
		drop(guard);
		self.wait(ctx).await
	}
}

/// Runs one job under panic recovery: the job itself is spawned as its
/// own task so a panic inside it only fails that task's `JoinHandle`
/// rather than unwinding the persistent worker loop that drives it.
async fn execute<P: Send + 'static>(job: Job<P>, in_flight: Arc<AtomicUsize>, notify: Arc<Notify>) {
	let Job { task, handler } = job;
	let task_id = task.id.clone();
	let queue = task.queue.clone();
	let outcome = tokio::spawn(async move { handler.handle(task).await }).await;
	match outcome {
		Ok(Ok(())) => {
			tracing::debug!(task_id = %task_id, queue = %queue, "task completed");
		}
		Ok(Err(err)) => {
			tracing::error!(task_id = %task_id, queue = %queue, error = %err, "task handler returned an error");
		}
		Err(join_err) => {
			tracing::error!(
				task_id = %task_id,
				queue = %queue,
				panic = %panic_message(&join_err),
				"task panicked"
			);
		}
	}
	in_flight.fetch_sub(1, Ordering::SeqCst);
	notify.notify_waiters();
}

async fn worker_loop<P: Send + 'static>(
	receiver: Arc<AsyncMutex<mpsc::Receiver<Job<P>>>>,
	in_flight: Arc<AtomicUsize>,
	notify: Arc<Notify>,
) {
	loop {
		let job = {
			let mut receiver = receiver.lock().await;
			receiver.recv().await
		};
		match job {
			Some(job) => execute(job, in_flight.clone(), notify.clone()).await,
			None => return,
		}
	}
}

fn panic_message(join_err: &tokio::task::JoinError) -> String {
	if join_err.is_cancelled() {
		return "task was cancelled".to_string();
	}
	// JoinError::into_panic requires ownership; we only have a reference
	// here (to keep the caller's tracing fields simple), so fall back to
	// the error's own Display, which already summarizes the panic.
	join_err.to_string()
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering as AtomicOrdering};
	use std::time::Duration;

	use parking_lot::Mutex as SyncMutex;

	use super::*;

	struct Recording {
		label: &'static str,
		seen: Arc<SyncMutex<Vec<(&'static str, u32)>>>,
	}

	#[async_trait]
	impl TaskHandler<u32> for Recording {
		async fn handle(&self, task: Task<u32>) -> Result<()> {
			self.seen.lock().push((self.label, task.payload));
			Ok(())
		}
	}

	#[tokio::test]
	async fn enqueue_with_no_subscriber_is_a_silent_drop() {
		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::unbounded());
		queue.enqueue("ghost-queue", 1).await.unwrap();
		queue.wait(&WaitContext::with_timeout(Duration::from_millis(200))).await.unwrap();
	}

	#[tokio::test]
	async fn round_robin_splits_tasks_between_two_subscribers() {
		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::unbounded());
		let seen = Arc::new(SyncMutex::new(Vec::new()));
		queue.subscribe("q", Arc::new(Recording { label: "A", seen: seen.clone() }));
		queue.subscribe("q", Arc::new(Recording { label: "B", seen: seen.clone() }));

		queue.enqueue("q", 1).await.unwrap();
		queue.enqueue("q", 2).await.unwrap();
		queue.enqueue("q", 3).await.unwrap();
		queue.wait(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();

		let seen = seen.lock();
		let a: Vec<u32> = seen.iter().filter(|(l, _)| *l == "A").map(|(_, p)| *p).collect();
		let b: Vec<u32> = seen.iter().filter(|(l, _)| *l == "B").map(|(_, p)| *p).collect();
		assert_eq!(a, vec![1, 3]);
		assert_eq!(b, vec![2]);
		assert_eq!(seen.len(), 3);
	}

	#[tokio::test]
	async fn deliveries_split_evenly_across_many_subscribers() {
		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::default());
		let counts: Vec<Arc<AtomicU32>> = (0..4).map(|_| Arc::new(AtomicU32::new(0))) .collect();

		struct Counter(Arc<AtomicU32>);
		#[async_trait]
		impl TaskHandler<u32> for Counter {
			async fn handle(&self, _task: Task<u32>) -> Result<()> {
				self.0.fetch_add(1, AtomicOrdering::SeqCst);
				Ok(())
			}
		}

		for counter in &counts {
			queue.subscribe("fanout", Arc::new(Counter(counter.clone())));
		}
		for payload in 0..23u32 {
			queue.enqueue("fanout", payload).await.unwrap();
		}
		queue.wait(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();

		let total: u32 = counts.iter().map(|c| c.load(AtomicOrdering::SeqCst)).sum();
		assert_eq!(total, 23);
		for count in &counts {
			let n = count.load(AtomicOrdering::SeqCst);
			assert!(n == 5 || n == 6, "expected 5 or 6 deliveries, got {n}");
		}
	}

	#[tokio::test]
	async fn panicking_handler_is_recovered_and_counted() {
		struct Panics;
		#[async_trait]
		impl TaskHandler<u32> for Panics {
			async fn handle(&self, _task: Task<u32>) -> Result<()> {
				panic!("boom");
			}
		}

		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::unbounded());
		queue.subscribe("q", Arc::new(Panics));
		queue.enqueue("q", 1).await.unwrap();

		// wait() must still return promptly despite the panic.
		queue.wait(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();
	}

	#[tokio::test]
	async fn handler_error_does_not_block_drain() {
		struct Fails;
		#[async_trait]
		impl TaskHandler<u32> for Fails {
			async fn handle(&self, _task: Task<u32>) -> Result<()> {
				Err(Error::internal("handler failed"))
			}
		}

		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::unbounded());
		queue.subscribe("q", Arc::new(Fails));
		queue.enqueue("q", 1).await.unwrap();
		queue.wait(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();
	}

	#[tokio::test]
	async fn shutdown_drains_queued_work_and_rejects_new_enqueues() {
		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::default());
		let seen = Arc::new(SyncMutex::new(Vec::new()));
		queue.subscribe("q", Arc::new(Recording { label: "A", seen: seen.clone() }));

		queue.enqueue("q", 1).await.unwrap();
		queue.shutdown(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();

		assert_eq!(*seen.lock(), vec![("A", 1)]);
		let err = queue.enqueue("q", 2).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::Unavailable));
	}

	#[tokio::test]
	async fn wait_times_out_while_a_task_is_still_running() {
		struct Sleeps;
		#[async_trait]
		impl TaskHandler<u32> for Sleeps {
			async fn handle(&self, _task: Task<u32>) -> Result<()> {
				tokio::time::sleep(Duration::from_secs(5)).await;
				Ok(())
			}
		}

		let queue: InMemoryQueue<u32> = InMemoryQueue::new(QueueConfig::unbounded());
		queue.subscribe("q", Arc::new(Sleeps));
		queue.enqueue("q", 1).await.unwrap();

		let err = queue.wait(&WaitContext::with_timeout(Duration::from_millis(50))).await.unwrap_err();
		assert!(err.is(pf_core::ErrorKind::DeadlineExceeded));
	}
}
