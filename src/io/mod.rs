#![allow(non_snake_case, non_upper_case_globals)]

//! Byte-level plumbing: streams, endianness-aware string decoding, FourCC
//! tags, the shared archive-header preamble, and small bit-twiddling helpers
//! used by the GFF4 numeric decoders and the ERF v2.2 flags word.

pub mod aurora_base;
pub mod bits;
pub mod stream;
pub mod strings;
pub mod tag;
