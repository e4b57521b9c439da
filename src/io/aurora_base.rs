#![allow(non_snake_case, non_upper_case_globals)]

//! The header commonality shared by every archive format: a FourCC `id`, a
//! FourCC `version`, and a flag recording whether both were found encoded as
//! little-endian UTF-16 ASCII rather than plain bytes (ERF V2.0/V2.2).

use std::io::Read;

use byteorder::{BigEndian, ReadBytesExt};

use crate::error::CoreError;
use crate::io::tag::Tag;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct AuroraBase
{
	pub id: Tag,
	pub version: Tag,
	pub utf16le: bool,
}

impl AuroraBase
{
	/// Read the 8 (or, for UTF-16LE-encoded magics, 16) header bytes and
	/// auto-detect which encoding was used.
	///
	/// The detection tests whether the first two big-endian `u32` words both
	/// have their `0x00FF00FF` bits clear — the signature of ASCII packed two
	/// bytes per UTF-16LE code unit. When it fires, the four meaningful bytes
	/// of each word are repacked into one tag, and two more words are read the
	/// same way for the version tag.
	pub fn read(stream: &mut impl Read) -> Result<Self, CoreError>
	{
		let path = "<aurora-base>";
		let mut idWord = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;
		let mut versionWord = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;

		let utf16le = (idWord & 0x00FF00FF == 0) && (versionWord & 0x00FF00FF == 0);
		if utf16le
		{
			let id = convert_utf16le_pair(idWord, versionWord);

			let version1 = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;
			let version2 = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;
			let version = convert_utf16le_pair(version1, version2);

			return Ok(Self { id: Tag(id), version: Tag(version), utf16le });
		}

		// keep the read values intact for the non-UTF16 path
		idWord &= 0xFFFFFFFF;
		versionWord &= 0xFFFFFFFF;
		return Ok(Self { id: Tag(idWord), version: Tag(versionWord), utf16le: false });
	}

	pub fn check_id(&self, path: impl Into<std::path::PathBuf>, expected: &[u32]) -> Result<(), CoreError>
	{
		if expected.contains(&self.id.0)
		{
			return Ok(());
		}

		return Err(CoreError::format_mismatch(
			path,
			expected.iter().map(|t| Tag(*t).to_string()).collect::<Vec<_>>().join("/"),
			self.id.to_string(),
		));
	}

	pub fn check_version(&self, path: impl Into<std::path::PathBuf>, expected: &[u32]) -> Result<(), CoreError>
	{
		if expected.contains(&self.version.0)
		{
			return Ok(());
		}

		return Err(CoreError::format_mismatch(
			path,
			expected.iter().map(|t| Tag(*t).to_string()).collect::<Vec<_>>().join("/"),
			self.version.to_string(),
		));
	}
}

/// Take 8 bytes (as two big-endian `u32` words) and drop every second byte,
/// reconstructing the four ASCII bytes that were encoded as UTF-16LE.
fn convert_utf16le_pair(x1: u32, x2: u32) -> u32
{
	return (x1 & 0xFF000000) | ((x1 & 0x0000FF00) << 8) | ((x2 & 0xFF000000) >> 16) | ((x2 & 0x0000FF00) >> 8);
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::io::tag::make_tag;
	use std::io::Cursor;

	#[test]
	fn readsPlainAsciiHeader()
	{
		let mut data = Vec::new();
		data.extend_from_slice(b"KEY ");
		data.extend_from_slice(b"V1  ");

		let mut cursor = Cursor::new(data);
		let base = AuroraBase::read(&mut cursor).unwrap();

		assert!(!base.utf16le);
		assert_eq!(make_tag(b'K', b'E', b'Y', b' '), base.id.0);
		assert_eq!(make_tag(b'V', b'1', b' ', b' '), base.version.0);
	}

	#[test]
	fn detectsAndDecodesUtf16LeHeader()
	{
		// "ERF V2.0" packed as UTF-16LE, 16 bytes on disk.
		let text = "ERF V2.0";
		let mut data = Vec::new();
		for c in text.chars()
		{
			data.push(c as u8);
			data.push(0);
		}

		let mut cursor = Cursor::new(data);
		let base = AuroraBase::read(&mut cursor).unwrap();

		assert!(base.utf16le);
		assert_eq!(make_tag(b'E', b'R', b'F', b' '), base.id.0);
		assert_eq!(make_tag(b'V', b'2', b'.', b'0'), base.version.0);
	}
}
