#![allow(non_snake_case, non_upper_case_globals)]

//! KEY/BIF: a split archive pair. The KEY file is a directory — it names the
//! BIF files that actually hold data and lists every resource as a (name,
//! type, locator) triple pointing into one of them. Fetching a resource means
//! resolving the locator to a BIF index and a local entry index, opening that
//! BIF lazily, and returning the subrange its file-entry table names.
//!
//! Grounded on the teacher's `types::key::Key`/`BifEntry`/`ResourceEntry`
//! (cursor-based `fromCursor` reads, the locator bit-packing via `ReadValue`)
//! and `types::bif::bif::Bif`/`FileEntry`, generalized from Infinity Engine's
//! fixed IDs to this crate's `FileTypeManager`.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use byteorder::{LittleEndian, ReadBytesExt};

use crate::archive::{check_index, Archive, Resource};
use crate::error::CoreError;
use crate::filetype::FileTypeManager;
use crate::io::aurora_base::AuroraBase;
use crate::io::bits::ReadValue;
use crate::io::stream::{open_file, ByteStream};
use crate::io::tag::make_tag;
use crate::resref::ResRef;

const FILE_INDEX_BITS: u64 = 20;
const BIF_INDEX_BITS: u64 = 12;
const BIF_INDEX_SHIFT: u64 = 20;

#[derive(Clone, Debug)]
struct BifReference
{
	fileName: String,
	length: u32,
}

#[derive(Clone, Debug)]
struct KeyResourceEntry
{
	name: ResRef,
	locator: u32,
}

#[derive(Clone, Debug)]
struct BifFileEntry
{
	/// Low `FILE_INDEX_BITS` bits match a KEY locator's file index.
	locator: u32,
	offset: u32,
	size: u32,
}

/// A parsed KEY file plus the BIF files it references, opened on demand.
pub struct KeyArchive
{
	baseDir: PathBuf,
	bifReferences: Vec<BifReference>,
	resources: Vec<Resource>,
	entries: Vec<KeyResourceEntry>,
	bifCache: Mutex<HashMap<u32, Vec<BifFileEntry>>>,
}

impl KeyArchive
{
	pub fn open(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref();
		let mut stream = open_file(path)?;

		let base = AuroraBase::read(&mut stream)?;
		base.check_id(path, &[make_tag(b'K', b'E', b'Y', b' ')])?;
		base.check_version(path, &[make_tag(b'V', b'1', b' ', b' '), make_tag(b'V', b'1', b'.', b'1')])?;

		let bifCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let resourceCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let bifOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let resourceOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		stream.seek(SeekFrom::Start(bifOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut rawRefs = Vec::with_capacity(bifCount as usize);
		for _ in 0..bifCount
		{
			let length = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let nameOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let nameLength = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _locatorBits = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			rawRefs.push((length, nameOffset, nameLength));
		}

		let mut bifReferences = Vec::with_capacity(rawRefs.len());
		for (length, nameOffset, nameLength) in rawRefs
		{
			stream.seek(SeekFrom::Start(nameOffset as u64)).map_err(|e| CoreError::io(path, e))?;
			let mut nameBytes = vec![0u8; nameLength as usize];
			stream.read_exact(&mut nameBytes).map_err(|e| CoreError::io(path, e))?;
			let fileName = String::from_utf8_lossy(&nameBytes).trim_end_matches('\0').replace('\\', "/");
			bifReferences.push(BifReference { fileName, length });
		}

		stream.seek(SeekFrom::Start(resourceOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut entries = Vec::with_capacity(resourceCount as usize);
		let mut resources = Vec::with_capacity(resourceCount as usize);
		for index in 0..resourceCount
		{
			let mut nameBytes = [0u8; 8];
			stream.read_exact(&mut nameBytes).map_err(|e| CoreError::io(path, e))?;
			let name = ResRef::new(String::from_utf8_lossy(&nameBytes).trim_end_matches('\0'));
			let typeId = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let locator = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

			let r#type = typeManager.type_from_id(typeId as i32);
			resources.push(Resource { name: name.clone(), r#type, index });
			entries.push(KeyResourceEntry { name, locator });
		}

		return Ok(Self
		{
			baseDir: path.parent().map(Path::to_path_buf).unwrap_or_default(),
			bifReferences,
			resources,
			entries,
			bifCache: Mutex::new(HashMap::new()),
		});
	}

	fn bif_index(locator: u32) -> u32
	{
		return ReadValue(locator as u64, BIF_INDEX_BITS, BIF_INDEX_SHIFT) as u32;
	}

	fn file_index(locator: u32) -> u32
	{
		return ReadValue(locator as u64, FILE_INDEX_BITS, 0) as u32;
	}

	fn bif_path(&self, bifIndex: u32) -> Result<PathBuf, CoreError>
	{
		let reference = self.bifReferences.get(bifIndex as usize)
			.ok_or_else(|| CoreError::out_of_range(self.baseDir.clone(), bifIndex as u64, self.bifReferences.len() as u64))?;
		return Ok(self.baseDir.join(&reference.fileName));
	}

	/// Parse (and cache) a BIF's file-entry table. Missing BIFs surface here,
	/// at fetch time, not while the KEY itself is being read.
	fn bif_entries(&self, bifIndex: u32) -> Result<Vec<BifFileEntry>, CoreError>
	{
		if let Some(cached) = self.bifCache.lock().unwrap().get(&bifIndex)
		{
			return Ok(cached.clone());
		}

		let path = self.bif_path(bifIndex)?;
		let mut stream = open_file(&path).inspect_err(|_| {
			log::warn!("BIF {} referenced by {} is missing on disk", path.display(), self.baseDir.display());
		})?;

		let base = AuroraBase::read(&mut stream)?;
		base.check_id(&path, &[make_tag(b'B', b'I', b'F', b'F')])?;

		let fileCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
		let _tilesetCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
		let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;

		stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(&path, e))?;
		let mut entries = Vec::with_capacity(fileCount as usize);
		for _ in 0..fileCount
		{
			let locator = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let entryOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let _type = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let _unused = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			entries.push(BifFileEntry { locator, offset: entryOffset, size });
		}

		self.bifCache.lock().unwrap().insert(bifIndex, entries.clone());
		return Ok(entries);
	}

	fn locate(&self, index: u32) -> Result<(PathBuf, BifFileEntry), CoreError>
	{
		check_index(&self.baseDir, index, self.entries.len())?;
		let entry = &self.entries[index as usize];

		let bifIndex = Self::bif_index(entry.locator);
		let fileIndex = Self::file_index(entry.locator);
		let path = self.bif_path(bifIndex)?;
		let entries = self.bif_entries(bifIndex)?;

		let fileEntry = entries.iter().find(|e| Self::file_index(e.locator) == fileIndex)
			.ok_or_else(|| CoreError::missing(path.clone(), entry.name.clone(), self.resources[index as usize].r#type))?;

		return Ok((path, fileEntry.clone()));
	}
}

impl Archive for KeyArchive
{
	fn resources(&self) -> &[Resource]
	{
		return &self.resources;
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		let (_, entry) = self.locate(index)?;
		return Ok(entry.size as u64);
	}

	fn resource(&self, index: u32, _try_no_copy: bool) -> Result<ByteStream, CoreError>
	{
		let (path, entry) = self.locate(index)?;
		return ByteStream::from_file_range(path, entry.offset as u64, entry.offset as u64 + entry.size as u64);
	}
}
