#![allow(non_snake_case, non_upper_case_globals)]

//! RIM: the simplest of the archive formats. A flat header (magic, version,
//! resource count, table offset) followed by one fixed-size entry per
//! resource, naming an uncompressed (offset, size) payload range directly.
//!
//! Grounded on the same cursor-read shape as [`crate::archive::key`] — there
//! is no dedicated RIM reader in the retrieved original source, so this
//! follows spec.md §4.4.3's byte layout directly, structured the way the
//! teacher's `Readable::fromCursor` implementations are.

use std::io::{Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::archive::{check_index, Archive, Resource};
use crate::error::CoreError;
use crate::filetype::FileTypeManager;
use crate::io::aurora_base::AuroraBase;
use crate::io::stream::{open_file, ByteStream};
use crate::io::strings::{read_string_fixed, Encoding};
use crate::io::tag::make_tag;
use crate::resref::ResRef;

#[derive(Clone, Debug)]
struct RimEntry
{
	offset: u32,
	size: u32,
}

pub struct RimArchive
{
	base: ByteStream,
	resources: Vec<Resource>,
	entries: Vec<RimEntry>,
}

impl RimArchive
{
	pub fn open(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref();
		let mut stream = open_file(path)?;

		let header = AuroraBase::read(&mut stream)?;
		header.check_id(path, &[make_tag(b'R', b'I', b'M', b' ')])?;
		header.check_version(path, &[make_tag(b'V', b'1', b'.', b'0')])?;

		let resourceCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let tableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		stream.seek(SeekFrom::Start(tableOffset as u64)).map_err(|e| CoreError::io(path, e))?;

		let mut resources = Vec::with_capacity(resourceCount as usize);
		let mut entries = Vec::with_capacity(resourceCount as usize);
		for index in 0..resourceCount
		{
			let name = read_string_fixed(&mut stream, Encoding::Ascii, 16)?;
			let typeId = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _resId = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

			resources.push(Resource { name: ResRef::new(name), r#type: typeManager.type_from_id(typeId as i32), index });
			entries.push(RimEntry { offset, size });
		}

		return Ok(Self { base: open_file(path)?, resources, entries });
	}
}

impl Archive for RimArchive
{
	fn resources(&self) -> &[Resource]
	{
		return &self.resources;
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		check_index(self.base.path(), index, self.entries.len())?;
		return Ok(self.entries[index as usize].size as u64);
	}

	fn resource(&self, index: u32, _try_no_copy: bool) -> Result<ByteStream, CoreError>
	{
		check_index(self.base.path(), index, self.entries.len())?;
		let entry = &self.entries[index as usize];
		return self.base.sub_stream(entry.offset as u64, entry.offset as u64 + entry.size as u64);
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::filetype::FileType;

	fn write_rim(path: &Path, entries: &[(&str, FileType, &[u8])])
	{
		let headerSize = 16u32;
		let tableOffset = headerSize;
		let entrySize = 32u32;
		let mut dataOffset = tableOffset + entries.len() as u32 * entrySize;

		let mut buffer = Vec::new();
		buffer.extend_from_slice(b"RIM ");
		buffer.extend_from_slice(b"V1.0");
		buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&tableOffset.to_le_bytes());

		let mut table = Vec::new();
		let mut data = Vec::new();
		for (i, (name, r#type, bytes)) in entries.iter().enumerate()
		{
			let mut nameBytes = [0u8; 16];
			nameBytes[..name.len()].copy_from_slice(name.as_bytes());
			table.extend_from_slice(&nameBytes);
			table.extend_from_slice(&(r#type.id() as u32).to_le_bytes());
			table.extend_from_slice(&(i as u32).to_le_bytes());
			table.extend_from_slice(&dataOffset.to_le_bytes());
			table.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
			data.extend_from_slice(bytes);
			dataOffset += bytes.len() as u32;
		}

		buffer.extend_from_slice(&table);
		buffer.extend_from_slice(&data);
		std::fs::write(path, buffer).unwrap();
	}

	#[test]
	fn readsFlatResourceTable()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-rim-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("module.rim");

		write_rim(&path, &[("credits", FileType::ARE, b"area payload")]);

		let typeManager = FileTypeManager::new();
		let archive = RimArchive::open(&path, &typeManager).unwrap();

		assert_eq!(1, archive.resources().len());
		assert_eq!(FileType::ARE, archive.resources()[0].r#type);
		assert_eq!(12, archive.resource_size(0).unwrap());

		let mut stream = archive.resource(0, false).unwrap();
		assert_eq!(b"area payload".to_vec(), stream.read_all().unwrap());

		std::fs::remove_dir_all(&dir).ok();
	}
}
