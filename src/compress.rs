#![allow(non_snake_case, non_upper_case_globals)]

//! DEFLATE (RFC 1951) inflate/deflate with explicit window-bits control.
//!
//! `window_bits` follows the zlib `inflateInit2`/`deflateInit2` convention:
//! positive means "with a two-byte zlib header and four-byte Adler-32
//! trailer" (RFC 1950 framing), negative means raw deflate with neither. Every
//! format in this crate that compresses data uses a window of 15 one way or
//! the other, so the sign of `window_bits` is all that actually changes
//! decoder behavior here; the magnitude is preserved in error messages only
//! (§9's open question about window-size bytes above 15 is enforced by the
//! ERF v2.2 reader in `crate::archive::erf`, not here).

use std::io::Read;

use flate2::read::{DeflateDecoder, ZlibDecoder};
use flate2::write::{DeflateEncoder, ZlibEncoder};
use flate2::Compression;

use crate::error::CoreError;

/// Inflate exactly `expected_size` bytes from `input`. Fails if the stream
/// ends before producing that many bytes, or if it produces more/fewer than
/// expected once it has run to completion.
pub fn inflate_fixed(input: &[u8], expected_size: usize, window_bits: i32) -> Result<Vec<u8>, CoreError>
{
	let (output, _consumed) = run_inflate(input, window_bits)?;

	if output.len() < expected_size
	{
		return Err(CoreError::compression("<inflate>", format!(
			"premature end: expected {expected_size} bytes, got {}", output.len()
		)));
	}

	if output.len() > expected_size
	{
		return Err(CoreError::compression("<inflate>", format!(
			"size mismatch: expected exactly {expected_size} bytes, got {}", output.len()
		)));
	}

	return Ok(output);
}

/// Inflate until end-of-stream; the output size is whatever the stream
/// produces. Never fails on a size mismatch, only on a malformed stream.
pub fn inflate_streaming(input: &[u8], window_bits: i32) -> Result<Vec<u8>, CoreError>
{
	let (output, _consumed) = run_inflate(input, window_bits)?;
	return Ok(output);
}

/// Inflate exactly one DEFLATE stream out of `input`, stopping at its natural
/// end, and report how many input bytes that stream occupied so the caller
/// can advance past it (used to walk OBB's concatenated chunks).
pub fn inflate_chunk(input: &[u8], window_bits: i32) -> Result<(Vec<u8>, usize), CoreError>
{
	return run_inflate(input, window_bits);
}

fn run_inflate(input: &[u8], window_bits: i32) -> Result<(Vec<u8>, usize), CoreError>
{
	let mut output = Vec::new();

	let consumedAndResult = if window_bits > 0
	{
		let mut decoder = ZlibDecoder::new(input);
		let result = decoder.read_to_end(&mut output);
		(decoder.total_in() as usize, result)
	}
	else
	{
		let mut decoder = DeflateDecoder::new(input);
		let result = decoder.read_to_end(&mut output);
		(decoder.total_in() as usize, result)
	};

	let (consumed, result) = consumedAndResult;
	result.map_err(|e| CoreError::compression("<inflate>", format!("deflate stream error: {e}")))?;

	return Ok((output, consumed));
}

/// Deflate the entirety of `input`, framed the same way `window_bits`'
/// sign is interpreted when reading: positive wraps the output in a zlib
/// header+trailer, negative emits raw deflate with neither.
pub fn deflate(input: &[u8], window_bits: i32) -> Result<Vec<u8>, CoreError>
{
	use std::io::Write;

	if window_bits > 0
	{
		let mut encoder = ZlibEncoder::new(Vec::new(), Compression::default());
		encoder.write_all(input).map_err(|e| CoreError::compression("<deflate>", e.to_string()))?;
		return encoder.finish().map_err(|e| CoreError::compression("<deflate>", e.to_string()));
	}

	let mut encoder = DeflateEncoder::new(Vec::new(), Compression::default());
	encoder.write_all(input).map_err(|e| CoreError::compression("<deflate>", e.to_string()))?;
	return encoder.finish().map_err(|e| CoreError::compression("<deflate>", e.to_string()));
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn inflateRoundTripsThroughDeflateWithZlibHeader()
	{
		let original = b"the quick brown fox jumps over the lazy dog".repeat(4);
		let compressed = deflate(&original, 15).unwrap();
		let restored = inflate_fixed(&compressed, original.len(), 15).unwrap();
		assert_eq!(original, restored);
	}

	#[test]
	fn inflateRoundTripsThroughRawDeflate()
	{
		let original = b"raw deflate has no header or trailer".to_vec();
		let compressed = deflate(&original, -15).unwrap();
		let restored = inflate_fixed(&compressed, original.len(), -15).unwrap();
		assert_eq!(original, restored);
	}

	#[test]
	fn inflateFixedFailsOnSizeMismatch()
	{
		let original = b"short".to_vec();
		let compressed = deflate(&original, 15).unwrap();
		let err = inflate_fixed(&compressed, original.len() + 1, 15);
		assert!(err.is_err());
	}

	#[test]
	fn inflateChunkStopsAtStreamEndAndReportsConsumedBytes()
	{
		let first = b"first chunk payload".to_vec();
		let second = b"second chunk payload, different bytes".to_vec();

		let mut concatenated = deflate(&first, 15).unwrap();
		let firstLen = concatenated.len();
		concatenated.extend_from_slice(&[0u8; 16]); // opaque trailer metadata, as OBB has between chunks
		concatenated.extend_from_slice(&deflate(&second, 15).unwrap());

		let (decodedFirst, consumed) = inflate_chunk(&concatenated, 15).unwrap();
		assert_eq!(first, decodedFirst);
		assert_eq!(firstLen, consumed);

		let (decodedSecond, _) = inflate_chunk(&concatenated[consumed + 16..], 15).unwrap();
		assert_eq!(second, decodedSecond);
	}

	#[test]
	fn inflateStreamingNeverFailsOnSizeDiscovery()
	{
		let original = b"variable length payload whose size the caller does not know ahead of time".to_vec();
		let compressed = deflate(&original, 15).unwrap();
		let restored = inflate_streaming(&compressed, 15).unwrap();
		assert_eq!(original, restored);
	}
}
