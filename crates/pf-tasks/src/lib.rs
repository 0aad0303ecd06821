//! # pf-tasks
//!
//! A single-consumer work queue abstraction ([`WorkQueue`]) plus an
//! in-memory, round-robin-dispatching implementation ([`InMemoryQueue`])
//! backed by a bounded channel and a fixed worker pool.
//!
//! ```
//! use std::sync::Arc;
//! use std::time::Duration;
//! use pf_tasks::{InMemoryQueue, QueueConfig, TaskHandler, Task, WaitContext, WorkQueue};
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl TaskHandler<String> for Echo {
//!     async fn handle(&self, task: Task<String>) -> pf_core::Result<()> {
//!         println!("{}", task.payload);
//!         Ok(())
//!     }
//! }
//!
//! # tokio_test::block_on(async {
//! let queue: InMemoryQueue<String> = InMemoryQueue::new(QueueConfig::unbounded());
//! queue.subscribe("greetings", Arc::new(Echo));
//! queue.enqueue("greetings", "hello".to_string()).await.unwrap();
//! queue.wait(&WaitContext::with_timeout(Duration::from_secs(1))).await.unwrap();
//! # });
//! ```

pub mod memory;
pub mod queue;
pub mod task;

pub use memory::{InMemoryQueue, QueueConfig};
pub use queue::{FnHandler, TaskHandler, WaitContext, WorkQueue};
pub use task::Task;
