//! The unit of work dispatched through a [`crate::queue::WorkQueue`].

/// A task delivered to exactly one subscriber. `attempt` is 1-based; the
/// in-memory queue never redelivers, so every task it hands out carries
/// `attempt == 1` (implementations that do redeliver would increment it).
#[derive(Debug, Clone)]
pub struct Task<P> {
	pub id: String,
	pub queue: String,
	pub payload: P,
	pub attempt: u32,
}

impl<P> Task<P> {
	pub(crate) fn new(id: impl Into<String>, queue: impl Into<String>, payload: P) -> Self {
		Self { id: id.into(), queue: queue.into(), payload, attempt: 1 }
	}
}

/// Generates a fresh 16-byte random hex task ID at enqueue time.
pub(crate) fn generate_task_id() -> String {
	use rand::RngCore;
	let mut bytes = [0u8; 16];
	rand::rng().fill_bytes(&mut bytes);
	hex::encode(bytes)
}
