#![allow(non_snake_case, non_upper_case_globals)]

//! The closed error taxonomy every fallible operation in this crate returns.
//!
//! Parsers fail fast: there is no partial recovery once a header anomaly or an
//! out-of-range offset is observed. Each variant carries whatever diagnostic
//! context was available at the point of failure (a file path, a ResRef, an
//! index, an offset), per the "Diagnostic context" rule.

use std::io;
use std::path::PathBuf;

use crate::resref::ResRef;

/// The crate-wide result alias. Every public fallible function returns this.
pub type Result<T> = std::result::Result<T, CoreError>;

#[derive(Debug, thiserror::Error)]
pub enum CoreError
{
	/// A magic number or version string did not match what the format requires.
	#[error("{path:?}: format mismatch, expected {expected:?} but found {found:?}")]
	FormatMismatch
	{
		path: PathBuf,
		expected: String,
		found: String,
	},

	/// An offset, index, or length exceeded the bounds of its container.
	#[error("{path:?}: offset/index {value} is out of range (limit {limit})")]
	OutOfRange
	{
		path: PathBuf,
		value: u64,
		limit: u64,
	},

	/// A field-type/flags combination is recognized as invalid.
	#[error("{path:?}: unsupported variant: {detail}")]
	UnsupportedVariant
	{
		path: PathBuf,
		detail: String,
	},

	/// A read ran past the end of the stream.
	#[error("{path:?}: truncated input at offset {offset}, wanted {wanted} bytes, got {got}")]
	TruncatedInput
	{
		path: PathBuf,
		offset: u64,
		wanted: u64,
		got: u64,
	},

	/// DEFLATE inflate/deflate reported an error or a size constraint was violated.
	#[error("{path:?}: compression failure: {detail}")]
	CompressionFailure
	{
		path: PathBuf,
		detail: String,
	},

	/// A lookup found no matching entry. Not normally surfaced as an `Err` —
	/// `get_resource` returns `Ok(None)` for this; kept here so archive-internal
	/// code that legitimately needs to signal "no such index" has a typed way to.
	#[error("{path:?}: resource not found: {resref} ({file_type:?})")]
	MissingResource
	{
		path: PathBuf,
		resref: ResRef,
		file_type: crate::filetype::FileType,
	},

	/// A writer was asked to do more than its declared capacity allows, or was
	/// used after being finished.
	#[error("{path:?}: writer capacity exceeded: {detail}")]
	WriterCapacity
	{
		path: PathBuf,
		detail: String,
	},

	/// Decoding bytes under the requested text encoding failed.
	#[error("{path:?}: encoding error: {detail}")]
	EncodingError
	{
		path: PathBuf,
		detail: String,
	},

	/// Passthrough for the underlying filesystem/stream I/O.
	#[error("{path:?}: I/O error: {source}")]
	Io
	{
		path: PathBuf,
		#[source]
		source: io::Error,
	},
}

impl CoreError
{
	/// Attach a path to a bare `io::Error`, the way every subsystem boundary in
	/// this crate wraps a lower-level failure before it propagates further.
	pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self
	{
		return Self::Io { path: path.into(), source };
	}

	pub fn format_mismatch(path: impl Into<PathBuf>, expected: impl Into<String>, found: impl Into<String>) -> Self
	{
		return Self::FormatMismatch { path: path.into(), expected: expected.into(), found: found.into() };
	}

	pub fn out_of_range(path: impl Into<PathBuf>, value: u64, limit: u64) -> Self
	{
		return Self::OutOfRange { path: path.into(), value, limit };
	}

	pub fn unsupported_variant(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self
	{
		return Self::UnsupportedVariant { path: path.into(), detail: detail.into() };
	}

	pub fn truncated(path: impl Into<PathBuf>, offset: u64, wanted: u64, got: u64) -> Self
	{
		return Self::TruncatedInput { path: path.into(), offset, wanted, got };
	}

	pub fn compression(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self
	{
		return Self::CompressionFailure { path: path.into(), detail: detail.into() };
	}

	pub fn writer_capacity(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self
	{
		return Self::WriterCapacity { path: path.into(), detail: detail.into() };
	}

	pub fn encoding(path: impl Into<PathBuf>, detail: impl Into<String>) -> Self
	{
		return Self::EncodingError { path: path.into(), detail: detail.into() };
	}

	pub fn missing(path: impl Into<PathBuf>, resref: crate::resref::ResRef, file_type: crate::filetype::FileType) -> Self
	{
		return Self::MissingResource { path: path.into(), resref, file_type };
	}
}

impl From<io::Error> for CoreError
{
	fn from(source: io::Error) -> Self
	{
		return Self::Io { path: PathBuf::new(), source };
	}
}
