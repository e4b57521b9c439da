#![allow(non_snake_case, non_upper_case_globals)]

//! TheWitcherSave: a fixed 8232-byte header (four constant signature words and
//! a duplicated, UTF-16LE-encoded area name) followed by savegame resources
//! and a trailing resource table.
//!
//! Grounded on `thewitchersavefile.h`/`.cpp`: the `RGMH` magic, the four
//! `0xEE7C4A60`/`0x459E4568`/`0x10D3DBBD`/`0x1CBCF20B` constants, the
//! "Lightning Storm" literal, and the `[-8..]` trailing `(offset, count)`
//! pointer into a UTF-8-named resource table.

pub mod writer;

use std::io::{Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::archive::{check_index, Archive, Resource};
use crate::error::CoreError;
use crate::filetype::{FileType, FileTypeManager};
use crate::io::stream::{open_file, ByteStream};
use crate::io::strings::{read_string_fixed, Encoding};
use crate::resref::ResRef;

const RGMH_ID: u32 = 0x52474D48; // 'R','G','M','H'
const HEADER_SIGNATURE: [u32; 4] = [0xEE7C4A60, 0x459E4568, 0x10D3DBBD, 0x1CBCF20B];
const LIGHTNING_STORM: &str = "Lightning Storm";
const FIXED_STRING_LENGTH: usize = 2048;

#[derive(Clone, Debug)]
struct TwsEntry
{
	offset: u32,
	length: u32,
}

pub struct TwsArchive
{
	path: PathBuf,
	areaName: String,
	resources: Vec<Resource>,
	entries: Vec<TwsEntry>,
}

impl TwsArchive
{
	pub fn open(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref().to_path_buf();
		let mut stream = open_file(&path)?;

		let magic = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(&path, e))?;
		if magic != RGMH_ID
		{
			return Err(CoreError::format_mismatch(&path, "RGMH".to_string(), format!("{magic:#010X}")));
		}

		let version = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
		if version != 1
		{
			return Err(CoreError::format_mismatch(&path, "version 1".to_string(), version.to_string()));
		}

		let dataOffset = stream.read_u64::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
		stream.seek(SeekFrom::Current(8)).map_err(|e| CoreError::io(&path, e))?; // reserved

		for expected in HEADER_SIGNATURE
		{
			let value = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			if value != expected
			{
				return Err(CoreError::format_mismatch(&path, format!("{expected:#010X}"), format!("{value:#010X}")));
			}
		}

		let lightningStorm = read_string_fixed(&mut stream, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;
		if lightningStorm != LIGHTNING_STORM
		{
			return Err(CoreError::format_mismatch(&path, LIGHTNING_STORM.to_string(), lightningStorm));
		}

		let areaName1 = read_string_fixed(&mut stream, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;
		let areaName2 = read_string_fixed(&mut stream, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;
		if areaName1 != areaName2
		{
			return Err(CoreError::format_mismatch(&path, areaName1, areaName2));
		}

		stream.seek(SeekFrom::End(-8)).map_err(|e| CoreError::io(&path, e))?;
		let resourceTableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
		let resourceCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;

		stream.seek(SeekFrom::Start(resourceTableOffset as u64)).map_err(|e| CoreError::io(&path, e))?;

		let mut resources = Vec::with_capacity(resourceCount as usize);
		let mut entries = Vec::with_capacity(resourceCount as usize);

		for index in 0..resourceCount
		{
			let nameLength = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let fullName = read_string_fixed(&mut stream, Encoding::Utf8, nameLength as usize)?;

			let length = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;

			if (offset as u64) < dataOffset
			{
				return Err(CoreError::out_of_range(&path, offset as u64, dataOffset));
			}

			let r#type = typeManager.type_from_path(&fullName);
			let bareName = typeManager.set_file_type(&fullName, FileType::None);
			let normalized = bareName.to_string_lossy().replace('\\', "/");

			resources.push(Resource { name: ResRef::new(normalized), r#type, index });
			entries.push(TwsEntry { offset, length });
		}

		return Ok(Self { path, areaName: areaName1, resources, entries });
	}

	pub fn area_name(&self) -> &str
	{
		return &self.areaName;
	}
}

impl Archive for TwsArchive
{
	fn resources(&self) -> &[Resource]
	{
		return &self.resources;
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		check_index(&self.path, index, self.entries.len())?;
		return Ok(self.entries[index as usize].length as u64);
	}

	fn resource(&self, index: u32, _try_no_copy: bool) -> Result<ByteStream, CoreError>
	{
		check_index(&self.path, index, self.entries.len())?;
		let entry = &self.entries[index as usize];
		return ByteStream::from_file_range(&self.path, entry.offset as u64, entry.offset as u64 + entry.length as u64);
	}
}
