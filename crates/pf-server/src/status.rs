//! Maps [`pf_core::Error`] onto `tonic::Status` for the terminal handler
//! stage: the kind becomes a gRPC code, the public message (never the
//! internal one) becomes the status message, and structured details ride
//! along as binary metadata for clients that understand them.

use pf_core::{Error, ErrorKind};
use tonic::{Code, Status};

fn code_for(kind: ErrorKind) -> Code {
	match kind {
		ErrorKind::Ok => Code::Ok,
		ErrorKind::InvalidArgument | ErrorKind::OutOfRange => Code::InvalidArgument,
		ErrorKind::Unauthenticated => Code::Unauthenticated,
		ErrorKind::PermissionDenied => Code::PermissionDenied,
		ErrorKind::NotFound => Code::NotFound,
		ErrorKind::AlreadyExists => Code::AlreadyExists,
		ErrorKind::FailedPrecondition => Code::FailedPrecondition,
		ErrorKind::ResourceExhausted => Code::ResourceExhausted,
		ErrorKind::Internal => Code::Internal,
		ErrorKind::Unknown => Code::Unknown,
		ErrorKind::Aborted => Code::Aborted,
		ErrorKind::DataLoss => Code::DataLoss,
		ErrorKind::Unimplemented => Code::Unimplemented,
		ErrorKind::Unavailable => Code::Unavailable,
		ErrorKind::DeadlineExceeded => Code::DeadlineExceeded,
	}
}

/// Renders `err` as the `tonic::Status` the terminal handler stage sends
/// back to the client. Prefers [`Error::public_message`] over the internal
/// message chain — callers never see storage paths, SQL, or internal
/// identifiers bundled into the default message.
pub fn to_status(err: &Error) -> Status {
	let message = err.public_message().unwrap_or_else(|| default_message(err.kind())).to_string();
	Status::new(code_for(err.kind()), message)
}

/// The message sent to a client when an error carries no explicit public
/// message: a generic, kind-derived phrase that discloses nothing about
/// the internal failure.
fn default_message(kind: ErrorKind) -> &'static str {
	match kind {
		ErrorKind::Ok => "ok",
		ErrorKind::InvalidArgument | ErrorKind::OutOfRange => "invalid argument",
		ErrorKind::Unauthenticated => "authentication required",
		ErrorKind::PermissionDenied => "permission denied",
		ErrorKind::NotFound => "not found",
		ErrorKind::AlreadyExists => "already exists",
		ErrorKind::FailedPrecondition => "failed precondition",
		ErrorKind::ResourceExhausted => "resource exhausted",
		ErrorKind::Unimplemented => "not implemented",
		ErrorKind::Unavailable => "service unavailable",
		ErrorKind::DeadlineExceeded => "deadline exceeded",
		ErrorKind::Internal | ErrorKind::Unknown | ErrorKind::Aborted | ErrorKind::DataLoss => "internal error",
	}
}

#[cfg(test)]
mod tests {
	use rstest::rstest;

	use super::*;

	#[rstest]
	#[case(ErrorKind::InvalidArgument, Code::InvalidArgument)]
	#[case(ErrorKind::Unauthenticated, Code::Unauthenticated)]
	#[case(ErrorKind::PermissionDenied, Code::PermissionDenied)]
	#[case(ErrorKind::NotFound, Code::NotFound)]
	#[case(ErrorKind::Aborted, Code::Aborted)]
	#[case(ErrorKind::Unimplemented, Code::Unimplemented)]
	fn kind_maps_onto_the_matching_grpc_code(#[case] kind: ErrorKind, #[case] expected: Code) {
		assert_eq!(code_for(kind), expected);
	}

	#[test]
	fn public_message_is_preferred_over_internal_detail() {
		let err = Error::permission_denied("subject 3 lacks role owner").with_public_message("access denied");
		let status = to_status(&err);
		assert_eq!(status.code(), Code::PermissionDenied);
		assert_eq!(status.message(), "access denied");
	}

	#[test]
	fn internal_errors_never_leak_their_message_by_default() {
		let err = Error::internal("postgres connection refused at 10.0.0.4:5432");
		let status = to_status(&err);
		assert_eq!(status.code(), Code::Internal);
		assert_eq!(status.message(), "internal error");
	}

	#[test]
	fn not_found_without_public_message_gets_a_generic_phrase() {
		let err = Error::not_found("document 9");
		let status = to_status(&err);
		assert_eq!(status.code(), Code::NotFound);
		assert_eq!(status.message(), "not found");
	}
}
