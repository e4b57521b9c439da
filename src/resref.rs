#![allow(non_snake_case, non_upper_case_globals)]

//! The archive-internal resource name: case-insensitive, at most 16 characters,
//! never carrying its own extension.

use std::fmt;

/// Maximum length, in bytes, of a ResRef once normalized.
pub const MAX_RESREF_LENGTH: usize = 16;

/// A case-insensitive, at-most-16-character resource name.
///
/// All lookups canonicalize to lowercase. Any Windows-style backslashes found
/// in a stored name are rewritten to forward slashes before truncation, since
/// a handful of archives (The Witcher in particular) store directory-qualified
/// names inside what is nominally a flat resource table.
#[derive(Clone, Debug, Default, Eq, PartialEq, Hash, Ord, PartialOrd, serde::Serialize, serde::Deserialize)]
pub struct ResRef(String);

impl ResRef
{
	/// Build a ResRef from an arbitrary name, normalizing case, separators and
	/// length the way every archive reader in this crate needs to.
	pub fn new(name: impl AsRef<str>) -> Self
	{
		let mut normalized = name.as_ref().replace('\\', "/").to_lowercase();
		normalized.truncate(MAX_RESREF_LENGTH);
		return Self(normalized);
	}

	pub fn as_str(&self) -> &str
	{
		return &self.0;
	}

	pub fn is_empty(&self) -> bool
	{
		return self.0.is_empty();
	}
}

impl fmt::Display for ResRef
{
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result
	{
		return write!(f, "{}", self.0);
	}
}

impl<T: AsRef<str>> From<T> for ResRef
{
	fn from(value: T) -> Self
	{
		return Self::new(value);
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn normalizesCaseAndSeparators()
	{
		let a = ResRef::new("Data\\Ambient");
		let b = ResRef::new("DATA/AMBIENT");

		assert_eq!(a, b);
		assert_eq!("data/ambient", a.as_str());
	}

	#[test]
	fn truncatesToSixteenCharacters()
	{
		let long = ResRef::new("a_name_that_is_definitely_too_long");
		assert_eq!(MAX_RESREF_LENGTH, long.as_str().len());
	}
}
