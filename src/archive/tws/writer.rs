#![allow(non_snake_case, non_upper_case_globals)]

//! Writer counterpart to [`super::TwsArchive`], grounded on
//! `thewitchersavewriter.h`/`.cpp`: a fixed 8232-byte header written up front,
//! resources appended as they're added, and a trailing resource table written
//! once on `finish()`.

use std::io::{Read, Seek, Write};

use byteorder::{BigEndian, LittleEndian, WriteBytesExt};

use crate::error::CoreError;
use crate::filetype::{FileType, FileTypeManager};
use crate::io::strings::{write_string_fixed, Encoding};

const RGMH_ID: u32 = 0x52474D48;
const HEADER_SIGNATURE: [u32; 4] = [0xEE7C4A60, 0x459E4568, 0x10D3DBBD, 0x1CBCF20B];
const LIGHTNING_STORM: &str = "Lightning Storm";
const FIXED_STRING_LENGTH: usize = 2048;

/// The header's declared constant length: 4+4+8+8 fixed fields, 16 bytes of
/// signature words, three 2048-byte UTF-16LE strings, and 2048 bytes of
/// trailing padding.
const DATA_OFFSET: u64 = 8232;

struct WrittenResource
{
	name: String,
	offset: u64,
	size: u64,
}

pub struct TwsWriter<'a, W: Write + Seek>
{
	stream: &'a mut W,
	resources: Vec<WrittenResource>,
	finished: bool,
}

impl<'a, W: Write + Seek> TwsWriter<'a, W>
{
	pub fn new(areaName: &str, stream: &'a mut W) -> Result<Self, CoreError>
	{
		let path = "<tws-writer>";

		stream.write_u32::<BigEndian>(RGMH_ID).map_err(|e| CoreError::io(path, e))?;
		stream.write_u32::<LittleEndian>(1).map_err(|e| CoreError::io(path, e))?;
		stream.write_u64::<LittleEndian>(DATA_OFFSET).map_err(|e| CoreError::io(path, e))?;
		stream.write_all(&[0u8; 8]).map_err(|e| CoreError::io(path, e))?;

		for word in HEADER_SIGNATURE
		{
			stream.write_u32::<LittleEndian>(word).map_err(|e| CoreError::io(path, e))?;
		}

		write_string_fixed(stream, LIGHTNING_STORM, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;
		write_string_fixed(stream, areaName, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;
		write_string_fixed(stream, areaName, Encoding::Utf16Le, FIXED_STRING_LENGTH)?;

		stream.write_all(&[0u8; FIXED_STRING_LENGTH]).map_err(|e| CoreError::io(path, e))?;

		return Ok(Self { stream, resources: Vec::new(), finished: false });
	}

	pub fn add(&mut self, resRef: &str, fileType: FileType, data: &mut impl Read, typeManager: &FileTypeManager) -> Result<(), CoreError>
	{
		let path = "<tws-writer>";

		if self.finished
		{
			return Err(CoreError::writer_capacity(path, "archive is already finished".to_string()));
		}

		let name = typeManager.set_file_type(resRef, fileType).to_string_lossy().into_owned();
		let offset = self.stream.stream_position().map_err(|e| CoreError::io(path, e))?;

		let mut buffer = Vec::new();
		data.read_to_end(&mut buffer).map_err(|e| CoreError::io(path, e))?;
		self.stream.write_all(&buffer).map_err(|e| CoreError::io(path, e))?;

		self.resources.push(WrittenResource { name, offset, size: buffer.len() as u64 });
		return Ok(());
	}

	pub fn finish(&mut self) -> Result<(), CoreError>
	{
		let path = "<tws-writer>";

		if self.finished
		{
			return Err(CoreError::writer_capacity(path, "archive is already finished".to_string()));
		}

		let resourceTableOffset = self.stream.stream_position().map_err(|e| CoreError::io(path, e))?;

		for resource in &self.resources
		{
			self.stream.write_u32::<LittleEndian>(resource.name.len() as u32).map_err(|e| CoreError::io(path, e))?;
			write_string_fixed(self.stream, &resource.name, Encoding::Ascii, resource.name.len())?;
			self.stream.write_u32::<LittleEndian>(resource.size as u32).map_err(|e| CoreError::io(path, e))?;
			self.stream.write_u32::<LittleEndian>(resource.offset as u32).map_err(|e| CoreError::io(path, e))?;
		}

		self.stream.write_u32::<LittleEndian>(resourceTableOffset as u32).map_err(|e| CoreError::io(path, e))?;
		self.stream.write_u32::<LittleEndian>(self.resources.len() as u32).map_err(|e| CoreError::io(path, e))?;

		self.finished = true;
		return Ok(());
	}
}

impl<'a, W: Write + Seek> Drop for TwsWriter<'a, W>
{
	fn drop(&mut self)
	{
		debug_assert!(self.finished, "TwsWriter dropped without calling finish()");
	}
}
