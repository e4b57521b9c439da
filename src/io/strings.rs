#![allow(non_snake_case, non_upper_case_globals)]

//! Text encodings the core must decode/encode, normalized to UTF-8 in memory.

use std::io::{Read, Write};

use crate::error::CoreError;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Encoding
{
	Ascii,
	Cp1252,
	Utf8,
	Utf16Le,
	Utf16Be,
}

impl Encoding
{
	/// Byte width of this encoding's "zero unit" terminator.
	fn unitWidth(self) -> usize
	{
		return match self
		{
			Encoding::Utf16Le | Encoding::Utf16Be => 2,
			_ => 1,
		};
	}

	fn decode(self, bytes: &[u8]) -> Result<String, String>
	{
		return match self
		{
			Encoding::Ascii =>
			{
				if bytes.iter().any(|&b| b > 0x7F)
				{
					Err("non-ASCII byte in an ASCII-encoded string".to_string())
				}
				else
				{
					Ok(bytes.iter().map(|&b| b as char).collect())
				}
			},
			Encoding::Cp1252 =>
			{
				let (decoded, _, hadErrors) = encoding_rs::WINDOWS_1252.decode(bytes);
				if hadErrors { Err("invalid CP-1252 byte sequence".to_string()) } else { Ok(decoded.into_owned()) }
			},
			Encoding::Utf8 => String::from_utf8(bytes.to_vec()).map_err(|e| e.to_string()),
			Encoding::Utf16Le =>
			{
				let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_le_bytes([c[0], c[1]])).collect();
				String::from_utf16(&units).map_err(|e| e.to_string())
			},
			Encoding::Utf16Be =>
			{
				let units: Vec<u16> = bytes.chunks_exact(2).map(|c| u16::from_be_bytes([c[0], c[1]])).collect();
				String::from_utf16(&units).map_err(|e| e.to_string())
			},
		};
	}

	fn encode(self, text: &str) -> Vec<u8>
	{
		return match self
		{
			Encoding::Ascii | Encoding::Utf8 => text.as_bytes().to_vec(),
			Encoding::Cp1252 =>
			{
				let (encoded, _, _) = encoding_rs::WINDOWS_1252.encode(text);
				encoded.into_owned()
			},
			Encoding::Utf16Le => text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect(),
			Encoding::Utf16Be => text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect(),
		};
	}
}

/// Consume exactly `byteLength` bytes and decode them, trimming any trailing
/// NUL padding before the encoding conversion.
pub fn read_string_fixed(stream: &mut impl Read, encoding: Encoding, byteLength: usize) -> Result<String, CoreError>
{
	let mut raw = vec![0u8; byteLength];
	stream.read_exact(&mut raw).map_err(|e| CoreError::io("<stream>", e))?;

	let trimmed = trim_nul_padding(&raw, encoding.unitWidth());
	return encoding.decode(trimmed).map_err(|detail| CoreError::encoding("<stream>", detail));
}

/// Read until the encoding's zero unit (a NUL byte, or a NUL u16 for UTF-16).
pub fn read_null_terminated_string(stream: &mut impl Read, encoding: Encoding) -> Result<String, CoreError>
{
	let unit = encoding.unitWidth();
	let mut raw = Vec::new();
	let mut buf = vec![0u8; unit];

	loop
	{
		stream.read_exact(&mut buf).map_err(|e| CoreError::io("<stream>", e))?;
		if buf.iter().all(|&b| b == 0)
		{
			break;
		}
		raw.extend_from_slice(&buf);
	}

	return encoding.decode(&raw).map_err(|detail| CoreError::encoding("<stream>", detail));
}

/// Pad or truncate `text` to exactly `byteLength` bytes and write it.
pub fn write_string_fixed(stream: &mut impl Write, text: &str, encoding: Encoding, byteLength: usize) -> Result<(), CoreError>
{
	let mut encoded = encoding.encode(text);
	encoded.resize(byteLength, 0);
	stream.write_all(&encoded).map_err(|e| CoreError::io("<stream>", e))?;
	return Ok(());
}

fn trim_nul_padding(raw: &[u8], unitWidth: usize) -> &[u8]
{
	if unitWidth == 2
	{
		let mut cut = raw.len();
		let mut i = 0;
		while i + 1 < raw.len()
		{
			if raw[i] == 0 && raw[i + 1] == 0
			{
				cut = i;
				break;
			}
			i += 2;
		}
		return &raw[..cut];
	}

	let cut = raw.iter().position(|&b| b == 0).unwrap_or(raw.len());
	return &raw[..cut];
}
