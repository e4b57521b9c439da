#![allow(non_snake_case, non_upper_case_globals)]

//! The uniform interface every archive format is read through, and the closed
//! set of readers that implement it.
//!
//! Six formats share one contract: a resource list, a size lookup, and an
//! indexed fetch. Rather than `Box<dyn Archive>` (the set never grows at
//! runtime — see `crate::io::stream`'s equivalent reasoning), [`ArchiveHandle`]
//! is a tagged union that delegates to whichever reader it was opened as.

pub mod erf;
pub mod herf;
pub mod key;
pub mod obb;
pub mod rim;
pub mod tws;

use std::path::Path;

use crate::error::CoreError;
use crate::filetype::{FileType, FileTypeManager};
use crate::io::stream::ByteStream;
use crate::resref::ResRef;

/// One entry in an archive's resource list: a name, a type, and the index
/// used to fetch it back out of the same archive.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Resource
{
	pub name: ResRef,
	pub r#type: FileType,
	pub index: u32,
}

/// Implemented by every archive reader. `try_no_copy` is a hint, not a
/// guarantee: callers must accept whatever stream comes back even when the
/// implementation can't honor it (compressed entries never can).
pub trait Archive
{
	fn resources(&self) -> &[Resource];
	fn resource_size(&self, index: u32) -> Result<u64, CoreError>;
	fn resource(&self, index: u32, try_no_copy: bool) -> Result<ByteStream, CoreError>;
}

/// The closed set of archive readers, dispatched by tag instead of by trait
/// object.
pub enum ArchiveHandle
{
	Key(key::KeyArchive),
	Erf(erf::ErfArchive),
	Rim(rim::RimArchive),
	Obb(obb::ObbArchive),
	Tws(tws::TwsArchive),
	Herf(herf::HerfArchive),
}

impl ArchiveHandle
{
	pub fn open_key(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Key(key::KeyArchive::open(path, typeManager)?));
	}

	pub fn open_erf(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Erf(erf::ErfArchive::open(path, typeManager)?));
	}

	pub fn open_rim(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Rim(rim::RimArchive::open(path, typeManager)?));
	}

	pub fn open_obb(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Obb(obb::ObbArchive::open(path, typeManager)?));
	}

	pub fn open_tws(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Tws(tws::TwsArchive::open(path, typeManager)?));
	}

	pub fn open_herf(path: impl AsRef<Path>, dictionaryPath: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		return Ok(Self::Herf(herf::HerfArchive::open(path, dictionaryPath, typeManager)?));
	}
}

impl Archive for ArchiveHandle
{
	fn resources(&self) -> &[Resource]
	{
		return match self
		{
			Self::Key(a) => a.resources(),
			Self::Erf(a) => a.resources(),
			Self::Rim(a) => a.resources(),
			Self::Obb(a) => a.resources(),
			Self::Tws(a) => a.resources(),
			Self::Herf(a) => a.resources(),
		};
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		return match self
		{
			Self::Key(a) => a.resource_size(index),
			Self::Erf(a) => a.resource_size(index),
			Self::Rim(a) => a.resource_size(index),
			Self::Obb(a) => a.resource_size(index),
			Self::Tws(a) => a.resource_size(index),
			Self::Herf(a) => a.resource_size(index),
		};
	}

	fn resource(&self, index: u32, try_no_copy: bool) -> Result<ByteStream, CoreError>
	{
		return match self
		{
			Self::Key(a) => a.resource(index, try_no_copy),
			Self::Erf(a) => a.resource(index, try_no_copy),
			Self::Rim(a) => a.resource(index, try_no_copy),
			Self::Obb(a) => a.resource(index, try_no_copy),
			Self::Tws(a) => a.resource(index, try_no_copy),
			Self::Herf(a) => a.resource(index, try_no_copy),
		};
	}
}

/// Shared bounds-check every `resource`/`resource_size` implementation opens with.
pub(crate) fn check_index(path: impl Into<std::path::PathBuf>, index: u32, count: usize) -> Result<(), CoreError>
{
	if (index as usize) >= count
	{
		return Err(CoreError::out_of_range(path, index as u64, count as u64));
	}
	return Ok(());
}
