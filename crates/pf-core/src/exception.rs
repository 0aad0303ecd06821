//! Unified error type for the pf server framework.
//!
//! Every error that crosses a plugin, interceptor, or storage boundary is an
//! [`Error`]: a status-code [`ErrorKind`], an internal cause, an optional
//! public (user-visible) message, structured detail objects, log fields for
//! the tracing layer, a prefix chain, and a bounded call stack captured at
//! the point the error was first wrapped.

use std::backtrace::Backtrace;
use std::collections::BTreeMap;
use std::fmt;

use thiserror::Error as ThisError;

/// Maximum number of stack frames retained in a captured [`Error`].
const MAX_STACK_FRAMES: usize = 32;

/// Status-code kind, mirroring the gRPC status space and mapped to an HTTP
/// status for the transcoding gateway. The `thiserror` derive gives each
/// variant its own `Display` text, used as the default internal message
/// when a status-only error is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ThisError)]
pub enum ErrorKind {
	#[error("ok")]
	Ok,
	#[error("invalid argument")]
	InvalidArgument,
	#[error("out of range")]
	OutOfRange,
	#[error("unauthenticated")]
	Unauthenticated,
	#[error("permission denied")]
	PermissionDenied,
	#[error("not found")]
	NotFound,
	#[error("already exists")]
	AlreadyExists,
	#[error("failed precondition")]
	FailedPrecondition,
	#[error("resource exhausted")]
	ResourceExhausted,
	#[error("internal")]
	Internal,
	#[error("unknown")]
	Unknown,
	#[error("aborted")]
	Aborted,
	#[error("data loss")]
	DataLoss,
	#[error("unimplemented")]
	Unimplemented,
	#[error("unavailable")]
	Unavailable,
	#[error("deadline exceeded")]
	DeadlineExceeded,
}

impl ErrorKind {
	/// HTTP status this kind maps to, per the gateway's transcoding table.
	pub fn http_status(self) -> u16 {
		match self {
			ErrorKind::Ok => 200,
			ErrorKind::InvalidArgument | ErrorKind::OutOfRange => 400,
			ErrorKind::Unauthenticated => 401,
			ErrorKind::PermissionDenied => 403,
			ErrorKind::NotFound => 404,
			ErrorKind::AlreadyExists => 409,
			ErrorKind::FailedPrecondition => 412,
			ErrorKind::ResourceExhausted => 429,
			ErrorKind::Internal | ErrorKind::Unknown | ErrorKind::Aborted | ErrorKind::DataLoss => {
				500
			}
			ErrorKind::Unimplemented => 501,
			ErrorKind::Unavailable => 503,
			ErrorKind::DeadlineExceeded => 504,
		}
	}
}

/// The framework's error type.
///
/// Construct via the `ErrorKind`-named helpers (e.g. [`Error::not_found`]),
/// enrich with [`Error::with_public_message`]/[`Error::with_field`], and
/// propagate with `?`. Use [`Error::wrap`] at storage/IO boundaries to
/// attach a prefix without resetting the stack, and [`Error::mark`] when an
/// error is re-raised from a genuinely new call site.
pub struct Error {
	kind: ErrorKind,
	message: String,
	cause: Option<Box<dyn std::error::Error + Send + Sync + 'static>>,
	http_status_override: Option<u16>,
	public_message: Option<String>,
	details: Vec<serde_json::Value>,
	log_fields: BTreeMap<String, serde_json::Value>,
	prefix: Vec<String>,
	stack: Vec<String>,
	/// Set once this error has already been through [`Error::wrap`], so a
	/// second `wrap` call is a no-op on the stack.
	wrapped: bool,
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
	fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
		Self {
			kind,
			message: message.into(),
			cause: None,
			http_status_override: None,
			public_message: None,
			details: Vec::new(),
			log_fields: BTreeMap::new(),
			prefix: Vec::new(),
			stack: capture_stack(),
			wrapped: false,
		}
	}

	pub fn kind(&self) -> ErrorKind {
		self.kind
	}

	/// The fully prefixed internal message ("outer: inner" chain), never
	/// shown to callers — see [`Error::public_message`] for that.
	pub fn message(&self) -> String {
		if self.prefix.is_empty() {
			self.message.clone()
		} else {
			format!("{}: {}", self.prefix.join(": "), self.message)
		}
	}

	pub fn public_message(&self) -> Option<&str> {
		self.public_message.as_deref()
	}

	pub fn details(&self) -> &[serde_json::Value] {
		&self.details
	}

	pub fn log_fields(&self) -> &BTreeMap<String, serde_json::Value> {
		&self.log_fields
	}

	pub fn stack(&self) -> &[String] {
		&self.stack
	}

	/// HTTP status for the transcoding gateway: an explicit override if set,
	/// otherwise the kind's default mapping.
	pub fn http_status(&self) -> u16 {
		self.http_status_override.unwrap_or_else(|| self.kind.http_status())
	}

	pub fn with_public_message(mut self, message: impl Into<String>) -> Self {
		self.public_message = Some(message.into());
		self
	}

	pub fn with_http_status(mut self, status: u16) -> Self {
		self.http_status_override = Some(status);
		self
	}

	pub fn with_detail(mut self, detail: serde_json::Value) -> Self {
		self.details.push(detail);
		self
	}

	pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
		self.log_fields.insert(key.into(), value.into());
		self
	}

	pub fn with_cause(mut self, cause: impl std::error::Error + Send + Sync + 'static) -> Self {
		self.cause = Some(Box::new(cause));
		self
	}

	/// Prepend a prefix ("outer: inner") and attach a cause, wrapping `err`.
	/// Idempotent: calling `wrap` again on an already-wrapped error only
	/// adds another prefix segment, it does not recapture the stack.
	pub fn wrap(mut self, prefix: impl Into<String>) -> Self {
		self.prefix.insert(0, prefix.into());
		if !self.wrapped {
			self.wrapped = true;
		}
		self
	}

	/// Force a fresh stack capture at the current call site, preserving
	/// kind, details, public message, prefix, and log fields.
	pub fn mark(mut self) -> Self {
		self.stack = capture_stack();
		self
	}

	/// Transparent equality: unwraps through the cause chain, like
	/// `errors.Is` in the source the framework's error model was inspired
	/// by.
	pub fn is(&self, kind: ErrorKind) -> bool {
		self.kind == kind
	}

	pub fn invalid_argument(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::InvalidArgument, message)
	}

	pub fn out_of_range(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::OutOfRange, message)
	}

	pub fn unauthenticated(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unauthenticated, message)
	}

	pub fn permission_denied(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::PermissionDenied, message)
	}

	pub fn not_found(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::NotFound, message)
	}

	pub fn already_exists(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::AlreadyExists, message)
	}

	pub fn failed_precondition(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::FailedPrecondition, message)
	}

	pub fn resource_exhausted(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::ResourceExhausted, message)
	}

	pub fn internal(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Internal, message)
	}

	pub fn unknown(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unknown, message)
	}

	pub fn unimplemented(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unimplemented, message)
	}

	pub fn unavailable(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::Unavailable, message)
	}

	pub fn deadline_exceeded(message: impl Into<String>) -> Self {
		Self::new(ErrorKind::DeadlineExceeded, message)
	}
}

fn capture_stack() -> Vec<String> {
	let backtrace = Backtrace::force_capture();
	format!("{backtrace}")
		.lines()
		.filter(|line| line.trim_start().starts_with(|c: char| c.is_ascii_digit()))
		.take(MAX_STACK_FRAMES)
		.map(str::to_owned)
		.collect()
}

impl fmt::Debug for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Error")
			.field("kind", &self.kind)
			.field("message", &self.message())
			.field("public_message", &self.public_message)
			.finish()
	}
}

impl fmt::Display for Error {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}: {}", self.kind, self.message())
	}
}

impl std::error::Error for Error {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		self.cause.as_deref().map(|c| c as &(dyn std::error::Error + 'static))
	}
}
