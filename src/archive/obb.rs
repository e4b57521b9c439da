#![allow(non_snake_case, non_upper_case_globals)]

//! OBB: Aspyr's Android port virtual filesystem. No header at all — the file
//! is nothing but concatenated zlib chunks, with the resource index itself
//! stored as the very last chunk. Locating anything means scanning backward
//! for zlib-stream markers rather than following offsets out of a directory.
//!
//! Grounded on `obbfile.h`/`.cpp`: the `0x78 0x9C` leading check, the
//! `{0,0,0,0,0x78,0x9C}` backward-search marker for the index chunk's start,
//! the `(u32 offset, 0u32)` marker for its end, and the fixed-4096-byte
//! chunked decompression loop in `getResource()`.

use std::io::{Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use byteorder::{LittleEndian, ReadBytesExt};

use crate::archive::{check_index, Archive, Resource};
use crate::compress;
use crate::error::CoreError;
use crate::filetype::{FileType, FileTypeManager};
use crate::io::strings::{read_string_fixed, Encoding};
use crate::resref::ResRef;

/// `kWindowBitsMax` in the original: every chunk, including the index, is
/// wrapped with a full zlib header rather than raw deflate.
const WINDOW_BITS_MAX: i32 = 15;
const ZLIB_CHUNK_MARKER: [u8; 6] = [0x00, 0x00, 0x00, 0x00, 0x78, 0x9C];
const MAX_READ_BACK: usize = 0xFFFFFF;
const OUTPUT_CHUNK_SIZE: usize = 4096;

#[derive(Clone, Debug)]
struct ObbEntry
{
	offset: u32,
	uncompressedSize: u32,
}

pub struct ObbArchive
{
	path: PathBuf,
	data: Vec<u8>,
	resources: Vec<Resource>,
	entries: Vec<ObbEntry>,
}

impl ObbArchive
{
	pub fn open(path: impl AsRef<Path>, typeManager: &FileTypeManager) -> Result<Self, CoreError>
	{
		let path = path.as_ref().to_path_buf();
		let data = std::fs::read(&path).map_err(|e| CoreError::io(&path, e))?;

		if data.len() < 2 || u16::from_be_bytes([data[0], data[1]]) != 0x789C
		{
			return Err(CoreError::format_mismatch(&path, "0x789C".to_string(), "no leading zlib header".to_string()));
		}

		let indexBytes = find_index(&path, &data)?;
		let (resources, entries) = read_res_list(&path, &indexBytes, typeManager)?;

		return Ok(Self { path, data, resources, entries });
	}
}

impl Archive for ObbArchive
{
	fn resources(&self) -> &[Resource]
	{
		return &self.resources;
	}

	fn resource_size(&self, index: u32) -> Result<u64, CoreError>
	{
		check_index(&self.path, index, self.entries.len())?;
		return Ok(self.entries[index as usize].uncompressedSize as u64);
	}

	fn resource(&self, index: u32, _try_no_copy: bool) -> Result<crate::io::stream::ByteStream, CoreError>
	{
		check_index(&self.path, index, self.entries.len())?;
		let entry = &self.entries[index as usize];

		let mut out = Vec::with_capacity(entry.uncompressedSize as usize);
		let mut cursor = entry.offset as usize;
		let mut bytesLeft = entry.uncompressedSize as usize;

		// Each chunk is its own complete deflate stream decompressing to at
		// most `OUTPUT_CHUNK_SIZE` bytes (less only for the file's last chunk);
		// chunks for the same file sit back to back with no gap between them.
		while bytesLeft > 0
		{
			let (chunk, consumed) = compress::inflate_chunk(&self.data[cursor..], WINDOW_BITS_MAX)?;
			out.extend_from_slice(&chunk);
			bytesLeft = bytesLeft.saturating_sub(chunk.len());
			cursor += consumed;
		}

		return Ok(crate::io::stream::ByteStream::from_vec(out));
	}
}

/// Walk backward from the end of `data` for the chunk marker that starts the
/// resource index, then walk forward within that chunk for the end-of-index
/// marker, returning the decompressed directory bytes.
fn find_index(path: &Path, data: &[u8]) -> Result<Vec<u8>, CoreError>
{
	let lastZlib = search_backwards(data, &ZLIB_CHUNK_MARKER, MAX_READ_BACK)
		.ok_or_else(|| CoreError::format_mismatch(path, "zlib chunk marker".to_string(), "none found within read-back window".to_string()))?;

	let indexStart = lastZlib + 4;

	let mut endMarker = Vec::with_capacity(8);
	endMarker.extend_from_slice(&(indexStart as u32).to_le_bytes());
	endMarker.extend_from_slice(&[0u8; 4]);

	let tail = &data[indexStart..];
	let indexSize = search_backwards(tail, &endMarker, MAX_READ_BACK)
		.ok_or_else(|| CoreError::format_mismatch(path, "index end marker".to_string(), "none found within read-back window".to_string()))?;

	return compress::inflate_streaming(&data[indexStart..indexStart + indexSize], WINDOW_BITS_MAX);
}

/// Find the rightmost occurrence of `needle` in `haystack`, bounded to the
/// last `max_read_back` bytes.
fn search_backwards(haystack: &[u8], needle: &[u8], max_read_back: usize) -> Option<usize>
{
	if needle.len() > haystack.len()
	{
		return None;
	}

	let minStart = haystack.len().saturating_sub(max_read_back);
	let mut i = haystack.len() - needle.len();
	loop
	{
		if i < minStart
		{
			return None;
		}
		if &haystack[i..i + needle.len()] == needle
		{
			return Some(i);
		}
		if i == 0
		{
			return None;
		}
		i -= 1;
	}
}

fn read_res_list(path: &Path, indexBytes: &[u8], typeManager: &FileTypeManager) -> Result<(Vec<Resource>, Vec<ObbEntry>), CoreError>
{
	let mut cursor = Cursor::new(indexBytes);

	let resourceCount = cursor.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
	cursor.seek(SeekFrom::Current(4)).map_err(|e| CoreError::io(path, e))?; // reserved, always 0

	let mut resources = Vec::new();
	let mut entries = Vec::new();
	let mut resIndex = 0u32;

	for _ in 0..resourceCount
	{
		let nameLength = cursor.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		cursor.seek(SeekFrom::Current(4)).map_err(|e| CoreError::io(path, e))?;

		let name = read_string_fixed(&mut cursor, Encoding::Ascii, nameLength as usize)?;

		let offset = cursor.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		cursor.seek(SeekFrom::Current(4)).map_err(|e| CoreError::io(path, e))?;

		let uncompressedSize = cursor.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		cursor.seek(SeekFrom::Current(4)).map_err(|e| CoreError::io(path, e))?;

		// Unreliable, per the chunked decompression loop in `resource()` — we
		// never actually rely on this value.
		let _compressedSize = cursor.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		cursor.seek(SeekFrom::Current(4)).map_err(|e| CoreError::io(path, e))?;

		// Directories have size 0; we only model files.
		if uncompressedSize == 0
		{
			continue;
		}

		let r#type = typeManager.type_from_path(&name);
		let bareName = typeManager.set_file_type(&name, FileType::None);

		resources.push(Resource { name: ResRef::new(bareName.to_string_lossy()), r#type, index: resIndex });
		entries.push(ObbEntry { offset, uncompressedSize });
		resIndex += 1;
	}

	return Ok((resources, entries));
}

#[cfg(test)]
mod tests
{
	use super::*;

	fn append_chunk(buffer: &mut Vec<u8>, plain: &[u8])
	{
		buffer.extend_from_slice(&compress::deflate(plain, WINDOW_BITS_MAX).unwrap());
	}

	/// Split `plain` into `OUTPUT_CHUNK_SIZE`-byte pieces, each deflated as its
	/// own stream and appended back to back, the way a file's chunks sit
	/// inside the OBB with no gap between them.
	fn append_file(buffer: &mut Vec<u8>, plain: &[u8])
	{
		for piece in plain.chunks(OUTPUT_CHUNK_SIZE)
		{
			append_chunk(buffer, piece);
		}
	}

	fn build_index(entries: &[(&str, u32, u32)]) -> Vec<u8>
	{
		let mut index = Vec::new();
		index.extend_from_slice(&(entries.len() as u32).to_le_bytes());
		index.extend_from_slice(&[0u8; 4]);

		for (name, offset, uncompressedSize) in entries
		{
			index.extend_from_slice(&(name.len() as u32).to_le_bytes());
			index.extend_from_slice(&[0u8; 4]);
			index.extend_from_slice(name.as_bytes());
			index.extend_from_slice(&offset.to_le_bytes());
			index.extend_from_slice(&[0u8; 4]);
			index.extend_from_slice(&uncompressedSize.to_le_bytes());
			index.extend_from_slice(&[0u8; 4]);
			index.extend_from_slice(&0u32.to_le_bytes()); // compressed size, unreliable/unused
			index.extend_from_slice(&[0u8; 4]);
		}

		return index;
	}

	#[test]
	fn locatesAndDecodesTheTrailingIndexChunk()
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-obb-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join("data.obb");

		let payload = b"jade empire android payload bytes, long enough to span a chunk boundary".repeat(64);

		let mut buffer = Vec::new();
		let fileChunkOffset = buffer.len() as u32;
		append_file(&mut buffer, &payload);
		buffer.extend_from_slice(&[0u8; 16]); // opaque inter-file metadata

		let indexOffset = buffer.len() as u32;
		let index = build_index(&[("level01.are", fileChunkOffset, payload.len() as u32)]);
		append_chunk(&mut buffer, &index);

		let mut trailer = Vec::new();
		trailer.extend_from_slice(&indexOffset.to_le_bytes());
		trailer.extend_from_slice(&[0u8; 4]);
		buffer.extend_from_slice(&trailer);

		std::fs::write(&path, &buffer).unwrap();

		let typeManager = FileTypeManager::new();
		let archive = ObbArchive::open(&path, &typeManager).unwrap();

		assert_eq!(1, archive.resources().len());
		assert_eq!(FileType::ARE, archive.resources()[0].r#type);
		assert_eq!(payload.len() as u64, archive.resource_size(0).unwrap());

		let mut stream = archive.resource(0, false).unwrap();
		assert_eq!(payload, stream.read_all().unwrap());

		std::fs::remove_dir_all(&dir).ok();
	}
}
