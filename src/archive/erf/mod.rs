#![allow(non_snake_case, non_upper_case_globals)]

//! ERF (encapsulated resource file), three on-disk versions sharing one
//! container concept: a table of named entries followed by their payload
//! bytes. V1.0 is plain ASCII with a separate key table; V2.0/V2.2 fold the
//! name into a single UTF-16LE resource table and are distinguished from V1.0
//! entirely by `AuroraBase`'s UTF-16LE auto-detection, since `"ERF V2.0"` and
//! `"ERF V2.2"` are themselves stored that way.
//!
//! The writer lives in [`writer`] and is grounded on the same original source
//! this reader resolves ambiguity against (`examples/original_source/src/aurora/erfwriter.cpp`).

pub mod writer;

use std::io::{Read, Seek, SeekFrom};
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

const WINDOW_BITS_MAX: i32 = 15;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
enum Compression
{
	None,
	BiowareZlib,
	HeaderlessZlib,
}

#[derive(Clone, Debug)]
struct ErfEntry
{
	offset: u32,
	compressedSize: u32,
	uncompressedSize: u32,
}

pub struct ErfArchive
{
	base: ByteStream,
	compression: Compression,
	resources: Vec<Resource>,
	entries: Vec<ErfEntry>,
}

impl ErfArchive
{
	pub fn open(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref();
		let mut stream = open_file(path)?;

		let header = AuroraBase::read(&mut stream)?;
		header.check_id(path, &[
			make_tag(b'E', b'R', b'F', b' '),
			make_tag(b'M', b'O', b'D', b' '),
			make_tag(b'H', b'A', b'K', b' '),
			make_tag(b'S', b'A', b'V', b' '),
		])?;

		if header.utf16le
		{
			return Self::open_v2(path, stream, header, typeManager);
		}

		header.check_version(path, &[make_tag(b'V', b'1', b'.', b'0')])?;
		return Self::open_v1(path, stream, typeManager);
	}

	fn open_v1(path: &Path, mut stream: ByteStream, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let _locStringCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let locStringSize = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let entryCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _locStringOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let keyTableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let resourceTableOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		let _ = locStringSize;

		stream.seek(SeekFrom::Start(keyTableOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut names = Vec::with_capacity(entryCount as usize);
		for _ in 0..entryCount
		{
			let name = read_string_fixed(&mut stream, Encoding::Ascii, 16)?;
			let _resId = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let typeId = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _unused = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			names.push((ResRef::new(name), typeManager.type_from_id(typeId as i32)));
		}

		stream.seek(SeekFrom::Start(resourceTableOffset as u64)).map_err(|e| CoreError::io(path, e))?;
		let mut resources = Vec::with_capacity(entryCount as usize);
		let mut entries = Vec::with_capacity(entryCount as usize);
		for (index, (name, r#type)) in names.into_iter().enumerate()
		{
			let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			resources.push(Resource { name, r#type, index: index as u32 });
			entries.push(ErfEntry { offset, compressedSize: size, uncompressedSize: size });
		}

		return Ok(Self { base: open_file(path)?, compression: Compression::None, resources, entries });
	}

	fn open_v2(path: &Path, mut stream: ByteStream, header: AuroraBase, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let isV22 = header.version.0 == make_tag(b'V', b'2', b'.', b'2');
		if !isV22
		{
			header.check_version(path, &[make_tag(b'V', b'2', b'.', b'0')])?;
		}

		let entryCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _buildYear = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _buildDay = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		let _marker = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		let compression = if isV22
		{
			let flags = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let _password = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let mut moduleId = [0u8; 16];
			stream.read_exact(&mut moduleId).map_err(|e| CoreError::io(path, e))?;

			match flags & 0xF0000000
			{
				0x20000000 => Compression::BiowareZlib,
				0xE0000000 => Compression::HeaderlessZlib,
				_ => Compression::None,
			}
		}
		else
		{
			Compression::None
		};

		let mut resources = Vec::with_capacity(entryCount as usize);
		let mut entries = Vec::with_capacity(entryCount as usize);
		for index in 0..entryCount
		{
			let fullName = read_string_fixed(&mut stream, Encoding::Utf16Le, 64)?;
			let offset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

			let (compressedSize, uncompressedSize) = if isV22
			{
				let compressed = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
				let uncompressed = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
				(compressed, uncompressed)
			}
			else
			{
				let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
				(size, size)
			};

			let r#type = typeManager.type_from_path(&fullName);
			let bareName = Path::new(&fullName).file_stem().and_then(|s| s.to_str()).unwrap_or(&fullName);
			resources.push(Resource { name: ResRef::new(bareName), r#type, index });
			entries.push(ErfEntry { offset, compressedSize, uncompressedSize });
		}

		return Ok(Self { base: open_file(path)?, compression, resources, entries });
	}

	fn payload(&self, index: u32) -> Result<ByteStream, CoreError>
	{
		check_index(self.base.path(), index, self.entries.len())?;
		let entry = &self.entries[index as usize];
		return self.base.sub_stream(entry.offset as u64, entry.offset as u64 + entry.compressedSize as u64);
	}
}

impl Archive for ErfArchive
{
	fn resources(&self) -> &[Resource]
	{
		return &self.resources;
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		check_index(self.base.path(), index, self.entries.len())?;
		return Ok(self.entries[index as usize].uncompressedSize as u64);
	}

	fn resource(&self, index: u32, try_no_copy: bool) -> Result<ByteStream, CoreError>
	{
		let path = self.base.path();
		let entry = self.entries.get(index as usize)
			.ok_or_else(|| CoreError::out_of_range(path.clone(), index as u64, self.entries.len() as u64))?
			.clone();

		match self.compression
		{
			Compression::None => return self.payload(index),
			Compression::HeaderlessZlib =>
			{
				let _ = try_no_copy;
				let mut compressed = self.payload(index)?;
				let bytes = compressed.read_all()?;
				let inflated = crate::compress::inflate_fixed(&bytes, entry.uncompressedSize as usize, -WINDOW_BITS_MAX)?;
				return Ok(ByteStream::from_vec(inflated));
			},
			Compression::BiowareZlib =>
			{
				let mut compressed = self.payload(index)?;
				let bytes = compressed.read_all()?;
				let (windowByte, rest) = bytes.split_first()
					.ok_or_else(|| CoreError::compression(path.clone(), "BioWare-zlib entry missing its window-size byte"))?;

				let windowSize = windowByte >> 4;
				if windowSize > WINDOW_BITS_MAX as u8
				{
					return Err(CoreError::compression(path.clone(), format!("unsupported window size {windowSize}")));
				}

				let inflated = crate::compress::inflate_fixed(rest, entry.uncompressedSize as usize, -WINDOW_BITS_MAX)?;
				return Ok(ByteStream::from_vec(inflated));
			},
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use crate::filetype::FileType;
	use std::io::Write as _;

	fn write_v10(path: &Path, entries: &[(&str, FileType, &[u8])])
	{
		let headerSize = 160u32;
		let keyTableOffset = headerSize;
		let keySize = 24u32;
		let resourceTableOffset = keyTableOffset + entries.len() as u32 * keySize;
		let dataOffset = resourceTableOffset + entries.len() as u32 * 8;

		let mut buffer = Vec::new();
		buffer.extend_from_slice(b"ERF ");
		buffer.extend_from_slice(b"V1.0");
		buffer.extend_from_slice(&0u32.to_le_bytes()); // locstring count
		buffer.extend_from_slice(&0u32.to_le_bytes()); // locstring size
		buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&headerSize.to_le_bytes()); // locstring offset
		buffer.extend_from_slice(&keyTableOffset.to_le_bytes());
		buffer.extend_from_slice(&resourceTableOffset.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes()); // year
		buffer.extend_from_slice(&0u32.to_le_bytes()); // day
		buffer.extend_from_slice(&0u32.to_le_bytes()); // descr strref
		buffer.extend_from_slice(&[0u8; 116]);

		for (name, r#type, _) in entries
		{
			let mut nameBytes = [0u8; 16];
			nameBytes[..name.len()].copy_from_slice(name.as_bytes());
			buffer.extend_from_slice(&nameBytes);
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
	}

	/// Scenario A — round-trip ERF v1.0: write two entries directly (the
	/// on-disk-layout half of the scenario; the writer half is exercised in
	/// `writer::tests`), then confirm the reader recovers both exactly.
	#[test]
	fn roundTripsErfV10Entries()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-erf-v10-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("test.erf");

		write_v10(&path, &[
			("alpha", FileType::DLG, &[0x01, 0x02, 0x03]),
			("beta", FileType::ARE, &[0xAA, 0xBB]),
		]);

		let typeManager = FileTypeManager::new();
		let archive = ErfArchive::open(&path, &typeManager).unwrap();

		assert_eq!(2, archive.resources().len());

		let alpha = archive.resources().iter().find(|r| r.name.as_str() == "alpha").unwrap();
		assert_eq!(FileType::DLG, alpha.r#type);
		let mut alphaStream = archive.resource(alpha.index, false).unwrap();
		assert_eq!(vec![0x01, 0x02, 0x03], alphaStream.read_all().unwrap());

		let beta = archive.resources().iter().find(|r| r.name.as_str() == "beta").unwrap();
		assert_eq!(FileType::ARE, beta.r#type);
		let mut betaStream = archive.resource(beta.index, false).unwrap();
		assert_eq!(vec![0xAA, 0xBB], betaStream.read_all().unwrap());

		std::fs::remove_dir_all(&dir).ok();
	}

	#[test]
	fn readsV22BiowareZlibCompressedEntry()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-erf-v22-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("test.erf");

		let original = b"some payload worth compressing, repeated, repeated, repeated".to_vec();
		let deflated = crate::compress::deflate(&original, -WINDOW_BITS_MAX).unwrap();
		let mut compressedEntry = vec![(WINDOW_BITS_MAX as u8) << 4];
		compressedEntry.extend_from_slice(&deflated);

		let headerSize = 32u32;
		let resourceTableOffset = headerSize;
		let entrySize = 76u32;
		let dataOffset = resourceTableOffset + entrySize;

		let mut buffer = Vec::new();
		for c in "ERF V2.2".chars()
		{
			buffer.push(c as u8);
			buffer.push(0);
		}
		buffer.extend_from_slice(&1u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0xFFFFFFFFu32.to_le_bytes());
		buffer.extend_from_slice(&0x20000000u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&[0u8; 16]);

		let mut nameBytes = vec![0u8; 64];
		let encodedName: Vec<u8> = "payload.dlg".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
		nameBytes[..encodedName.len()].copy_from_slice(&encodedName);
		buffer.extend_from_slice(&nameBytes);
		buffer.extend_from_slice(&dataOffset.to_le_bytes());
		buffer.extend_from_slice(&(compressedEntry.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&(original.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&compressedEntry);

		std::fs::write(&path, buffer).unwrap();

		let typeManager = FileTypeManager::new();
		let archive = ErfArchive::open(&path, &typeManager).unwrap();
		assert_eq!(1, archive.resources().len());
		assert_eq!(FileType::DLG, archive.resources()[0].r#type);
		assert_eq!(original.len() as u64, archive.resource_size(0).unwrap());

		let mut stream = archive.resource(0, false).unwrap();
		assert_eq!(original, stream.read_all().unwrap());

		std::fs::remove_dir_all(&dir).ok();
	}
}
