#![allow(non_snake_case, non_upper_case_globals)]

//! HERF: a hashed-name variant of ERF v1.0 used by the Nintendo DS titles.
//! Where ERF v1.0's key table stores each resource's name as a 16-byte
//! ResRef, HERF stores a 64-bit hash of the resource's full "name.ext"
//! string instead; recovering a human-readable name means consulting a
//! companion dictionary file that maps hash back to full name.
//!
//! No HERF source survives in the retrieved original source
//! (`original_source/` keeps no `herf`/`ndsrom` C++ files), so this reader
//! follows the same cursor-read shape as [`crate::archive::erf`]'s V1.0 path,
//! generalized the way spec.md §4.4.3 describes the hash substitution. `NDS`
//! (the outer Nintendo DS ROM container) is not modelled separately here:
//! the spec gives no byte layout for it beyond naming it alongside HERF, so
//! only the HERF container itself is read; `FileType::NDS` exists in the
//! taxonomy purely for tagging loose `.nds` files. This and the dictionary
//! file's own layout are recorded as open-question resolutions in DESIGN.md.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::archive::{check_index, Archive, Resource};
use crate::error::CoreError;
use crate::filetype::FileTypeManager;
use crate::io::aurora_base::AuroraBase;
use crate::io::stream::{open_file, ByteStream};
use crate::io::tag::make_tag;
use crate::resref::ResRef;

#[derive(Clone, Debug)]
struct HerfEntry
{
	offset: u32,
	size: u32,
}

/// `hash -> full name`, read from the dictionary file named `(count: u32)`
/// then `count` × `(hash: u64, name_length: u16, name: ASCII)` rows.
fn read_dictionary(path: &Path) -> Result<HashMap<u64, String>, CoreError>
{
	let mut stream = open_file(path)?;

	let count = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
	let mut dictionary = HashMap::with_capacity(count as usize);
	for _ in 0..count
	{
		let hash = stream.read_u64::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let nameLength = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let mut nameBytes = vec![0u8; nameLength as usize];
		stream.read_exact(&mut nameBytes).map_err(|e| CoreError::io(path, e))?;
		dictionary.insert(hash, String::from_utf8_lossy(&nameBytes).into_owned());
	}

	return Ok(dictionary);
}

/// A parsed HERF file, with resource names resolved through its companion
/// dictionary where possible. A hash absent from the dictionary still
/// yields a resource — its ResRef is synthesized from the hash itself —
/// since the key table alone is sufficient to fetch bytes by index.
pub struct HerfArchive
{
	base: ByteStream,
	resources: Vec<Resource>,
	entries: Vec<HerfEntry>,
}

impl HerfArchive
{
	pub fn open(path: impl AsRef<Path>, dictionaryPath: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref();
		let mut stream = open_file(path)?;

		let header = AuroraBase::read(&mut stream)?;
		header.check_id(path, &[make_tag(b'H', b'E', b'R', b'F')])?;
		header.check_version(path, &[make_tag(b'V', b'1', b'.', b'0')])?;

		let _locStringCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _locStringSize = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let entryCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _locStringOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let keyTableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let resourceTableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		let dictionary = read_dictionary(dictionaryPath.as_ref())?;

		stream.seek(SeekFrom::Start(keyTableOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut hashes = Vec::with_capacity(entryCount as usize);
		for _ in 0..entryCount
		{
			let hash = stream.read_u64::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _resId = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let typeId = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _unused = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			hashes.push((hash, typeId));
		}

		stream.seek(SeekFrom::Start(resourceTableOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut resources = Vec::with_capacity(entryCount as usize);
		let mut entries = Vec::with_capacity(entryCount as usize);
		for (index, (hash, typeId)) in hashes.into_iter().enumerate()
		{
			let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

			let r#type = typeManager.type_from_id(typeId as i32);
			let name = match dictionary.get(&hash)
			{
				Some(fullName) => ResRef::new(Path::new(fullName).file_stem().and_then(|s| s.to_str()).unwrap_or(fullName)),
				None => ResRef::new(format!("{hash:016x}")),
			};

			resources.push(Resource { name, r#type, index: index as u32 });
			entries.push(HerfEntry { offset, size });
		}

		return Ok(Self { base: open_file(path)?, resources, entries });
	}
}

impl Archive for HerfArchive
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
	use crate::filetype::{FileType, HashAlgorithm};

	fn write_herf(path: &Path, dictionaryPath: &Path, typeManager: &FileTypeManager, entries: &[(&str, FileType, &[u8])])
	{
		let headerSize = 32u32;
		let keyTableOffset = headerSize;
		let keySize = 16u32;
		let resourceTableOffset = keyTableOffset + entries.len() as u32 * keySize;
		let dataOffset = resourceTableOffset + entries.len() as u32 * 8;

		let fullNames: Vec<String> = entries.iter()
			.map(|(name, r#type, _)| format!("{name}{}", typeManager.extension_for(*r#type)))
			.collect();
		let hashes: Vec<u64> = fullNames.iter().map(|n| HashAlgorithm::Fnv64.hash_text(n)).collect();

		let mut buffer = Vec::new();
		buffer.extend_from_slice(b"HERF");
		buffer.extend_from_slice(b"V1.0");
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&headerSize.to_le_bytes());
		buffer.extend_from_slice(&keyTableOffset.to_le_bytes());
		buffer.extend_from_slice(&resourceTableOffset.to_le_bytes());

		for (i, (_, r#type, _)) in entries.iter().enumerate()
		{
			buffer.extend_from_slice(&hashes[i].to_le_bytes());
			buffer.extend_from_slice(&0u32.to_le_bytes());
			buffer.extend_from_slice(&(r#type.id() as u16).to_le_bytes());
			buffer.extend_from_slice(&0u16.to_le_bytes());
		}

		let mut offset = dataOffset;
		for (_, _, bytes) in entries
		{
			buffer.extend_from_slice(&offset.to_le_bytes());
			buffer.extend_from_slice(&(bytes.len() as u32).to_le_bytes());
			offset += bytes.len() as u32;
		}

		for (_, _, bytes) in entries
		{
			buffer.extend_from_slice(bytes);
		}

		std::fs::write(path, buffer).unwrap();

		let mut dict = Vec::new();
		dict.extend_from_slice(&(fullNames.len() as u32).to_le_bytes());
		for (i, name) in fullNames.iter().enumerate()
		{
			dict.extend_from_slice(&hashes[i].to_le_bytes());
			dict.extend_from_slice(&(name.len() as u16).to_le_bytes());
			dict.extend_from_slice(name.as_bytes());
		}
		std::fs::write(dictionaryPath, dict).unwrap();
	}

	#[test]
	fn resolvesHashedNamesThroughDictionary()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-herf-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("data.herf");
		let dictPath = dir.join("data.dict");

		let typeManager = FileTypeManager::new();
		write_herf(&path, &dictPath, &typeManager, &[("ncgr_sprite", FileType::NCGR, b"sprite bytes")]);

		let archive = HerfArchive::open(&path, &dictPath, &typeManager).unwrap();
		assert_eq!(1, archive.resources().len());
		assert_eq!("ncgr_sprite", archive.resources()[0].name.as_str());
		assert_eq!(FileType::NCGR, archive.resources()[0].r#type);

		let mut stream = archive.resource(0, false).unwrap();
		assert_eq!(b"sprite bytes".to_vec(), stream.read_all().unwrap());

		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn missingDictionaryEntryFallsBackToHashName()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-herf-miss-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("data.herf");
		let dictPath = dir.join("empty.dict");

		let typeManager = FileTypeManager::new();
		write_herf(&path, &dictPath, &typeManager, &[("orphan", FileType::NCGR, b"bytes")]);
		// overwrite with an empty dictionary so the lookup misses
		std::fs::write(&dictPath, 0u32.to_le_bytes()).unwrap();

		let archive = HerfArchive::open(&path, &dictPath, &typeManager).unwrap();
		assert_eq!(1, archive.resources().len());
		assert_ne!("orphan", archive.resources()[0].name.as_str());

		std::fs::remove_dir_all(&dir).ok();
	}
}
