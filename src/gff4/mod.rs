#![allow(non_snake_case, non_upper_case_globals)]

//! GFF v4.0/v4.1: the Dragon Age-era successor to GFF3, trading a
//! human-readable label table for numeric field IDs resolved against
//! struct templates, and adding the "generic" field — a value of variable
//! type, including lists that mix types across their own elements.
//!
//! Grounded on `gff4file.h`/`gff4file.cpp` from the retrieved original
//! source: the header/struct-template/field layouts, the `(offset,
//! templateIndex)` struct-identity scheme, and the four disallowed
//! list/reference/generic configurations below all mirror that reader's
//! `GFF4File`/`GFF4Struct` (renamed to this crate's idiom — no owning
//! pointers or a global struct registry, just an arena `Vec` indexed by
//! position, per the arena-of-structs design noted for GFF4 specifically).

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::sync::Mutex;

use byteorder::{BigEndian, LittleEndian, ReadBytesExt};

use crate::error::CoreError;
use crate::io::aurora_base::AuroraBase;
use crate::io::stream::{open_file, ByteStream};
use crate::io::tag::{make_tag, Tag};

const SENTINEL: u32 = 0xFFFF_FFFF;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[repr(i32)]
pub enum FieldType
{
	Uint8 = 0,
	Sint8 = 1,
	Uint16 = 2,
	Sint16 = 3,
	Uint32 = 4,
	Sint32 = 5,
	Uint64 = 6,
	Sint64 = 7,
	Float32 = 8,
	Float64 = 9,
	Vector3f = 10,
	Vector4f = 12,
	Quaternionf = 13,
	StringType = 14,
	Color4f = 15,
	Matrix4x4f = 16,
	TlkString = 17,
	NdsFixed = 18,
	AsciiString = 20,
	Struct = 65534,
	Generic = 65535,
}

impl FieldType
{
	fn from_u16(value: u16) -> Self
	{
		return match value
		{
			0 => Self::Uint8,
			1 => Self::Sint8,
			2 => Self::Uint16,
			3 => Self::Sint16,
			4 => Self::Uint32,
			5 => Self::Sint32,
			6 => Self::Uint64,
			7 => Self::Sint64,
			8 => Self::Float32,
			9 => Self::Float64,
			10 => Self::Vector3f,
			12 => Self::Vector4f,
			13 => Self::Quaternionf,
			14 => Self::StringType,
			15 => Self::Color4f,
			16 => Self::Matrix4x4f,
			17 => Self::TlkString,
			18 => Self::NdsFixed,
			20 => Self::AsciiString,
			65534 => Self::Struct,
			_ => Self::Generic,
		};
	}

	fn fixedSize(self) -> Option<u32>
	{
		return match self
		{
			Self::Uint8 | Self::Sint8 => Some(1),
			Self::Uint16 | Self::Sint16 => Some(2),
			Self::Uint32 | Self::Sint32 | Self::Float32 | Self::NdsFixed => Some(4),
			Self::Uint64 | Self::Sint64 | Self::Float64 => Some(8),
			Self::Vector3f => Some(12),
			Self::Vector4f | Self::Quaternionf | Self::Color4f => Some(16),
			Self::Matrix4x4f => Some(64),
			Self::TlkString => Some(8),
			Self::StringType | Self::AsciiString => Some(4),
			_ => None,
		};
	}
}

struct TemplateField
{
	label: u32,
	r#type: u16,
	flags: u16,
	offset: u32,
}

struct StructTemplate
{
	label: u32,
	size: u32,
	fields: Vec<TemplateField>,
}

struct FieldRecord
{
	fieldType: FieldType,
	offset: u32,
	isList: bool,
	isReference: bool,
	isGeneric: bool,
	structTemplateIndex: u32,
	structs: Vec<usize>,
}

impl FieldRecord
{
	/// Mirrors the original `Field` constructor's flag decoding and its four
	/// "we don't know how any of these work" rejections.
	fn new(path: &std::path::Path, r#type: u16, flags: u16, offset: u32, isGeneric: bool) -> Result<Self, CoreError>
	{
		let isList = flags & 0x8000 != 0;
		let isReference = flags & 0x2000 != 0;
		let isStruct = flags & 0x4000 != 0;

		let (fieldType, structTemplateIndex) = if isStruct
		{
			(FieldType::Struct, r#type as u32)
		}
		else
		{
			(FieldType::from_u16(r#type), 0)
		};

		let isReference = if fieldType == FieldType::StringType { false } else { isReference };

		if isList && fieldType == FieldType::AsciiString
		{
			log::debug!("{}: rejecting field decl: list of ASCII strings", path.display());
			return Err(CoreError::unsupported_variant(path, "list of ASCII strings"));
		}
		if isList && fieldType == FieldType::TlkString
		{
			log::debug!("{}: rejecting field decl: list of TlkStrings", path.display());
			return Err(CoreError::unsupported_variant(path, "list of TlkStrings"));
		}
		if isList && isReference && fieldType != FieldType::Struct && fieldType != FieldType::Generic
		{
			log::debug!("{}: rejecting field decl: list-by-reference of a non-struct, non-generic type", path.display());
			return Err(CoreError::unsupported_variant(path, "list-by-reference of a non-struct, non-generic type"));
		}
		if isList && !isReference && fieldType == FieldType::Generic
		{
			log::debug!("{}: rejecting field decl: list of generics without reference indirection", path.display());
			return Err(CoreError::unsupported_variant(path, "list of generics without reference indirection"));
		}

		return Ok(Self { fieldType, offset, isList, isReference, isGeneric, structTemplateIndex, structs: Vec::new() });
	}
}

struct StructRecord
{
	label: u32,
	fields: HashMap<u32, FieldRecord>,
	fieldLabels: Vec<u32>,
}

pub struct Gff4File
{
	stream: Mutex<ByteStream>,

	platformId: Tag,
	contentType: Tag,
	typeVersion: u32,
	dataOffset: u32,
	hasSharedStrings: bool,
	sharedStrings: Vec<String>,

	templates: Vec<StructTemplate>,
	arena: Mutex<Vec<StructRecord>>,
	idMap: Mutex<HashMap<u64, usize>>,
	topLevelIndex: usize,
}

impl Gff4File
{
	pub fn open(path: impl AsRef<Path>) -> Result<Self, CoreError>
	{
		return Self::open_expecting(path, None);
	}

	pub fn open_expecting(path: impl AsRef<Path>, expectedType: Option<Tag>) -> Result<Self, CoreError>
	{
		let path = path.as_ref();
		let mut stream = open_file(path)?;

		let header = AuroraBase::read(&mut stream)?;
		header.check_id(path, &[make_tag(b'G', b'F', b'F', b' ')])?;
		header.check_version(path, &[make_tag(b'V', b'4', b'.', b'0'), make_tag(b'V', b'4', b'.', b'1')])?;
		let isV41 = header.version.0 == make_tag(b'V', b'4', b'.', b'1');

		let platformId = Tag(stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?);
		let contentType = Tag(stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?);
		let typeVersion = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;

		if let Some(expected) = expectedType
		{
			if expected != contentType
			{
				return Err(CoreError::format_mismatch(path, expected.to_string(), contentType.to_string()));
			}
		}

		let structCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
		if structCount == 0
		{
			return Err(CoreError::unsupported_variant(path, "GFF4 with no struct templates"));
		}

		let (stringCount, stringOffset) = if isV41
		{
			(
				stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?,
				stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?,
			)
		}
		else
		{
			(0, SENTINEL)
		};
		let hasSharedStrings = stringCount > 0 || stringOffset != SENTINEL;

		let dataOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

		let templateStart = stream.seek(SeekFrom::Current(0)).map_err(|e| CoreError::io(path, e))?;
		let mut templates = Vec::with_capacity(structCount as usize);
		for i in 0..structCount
		{
			stream.seek(SeekFrom::Start(templateStart + i as u64 * 16)).map_err(|e| CoreError::io(path, e))?;
			let label = stream.read_u32::<BigEndian>().map_err(|e| CoreError::io(path, e))?;
			let fieldCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let fieldOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
			let size = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;

			let mut fields = Vec::with_capacity(fieldCount as usize);
			if fieldOffset != SENTINEL
			{
				stream.seek(SeekFrom::Start(fieldOffset as u64)).map_err(|e| CoreError::io(path, e))?;
				for _ in 0..fieldCount
				{
					let fieldLabel = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
					let fieldTypeRaw = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
					let flags = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
					let fieldFieldOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
					fields.push(TemplateField { label: fieldLabel, r#type: fieldTypeRaw, flags, offset: fieldFieldOffset });
				}
			}
			else if fieldCount != 0
			{
				return Err(CoreError::unsupported_variant(path, format!("struct template {i} has a null field offset but a nonzero field count")));
			}

			templates.push(StructTemplate { label, size, fields });
		}

		let mut sharedStrings = Vec::new();
		if hasSharedStrings
		{
			stream.seek(SeekFrom::Start(stringOffset as u64)).map_err(|e| CoreError::io(path, e))?;
			sharedStrings.reserve(stringCount as usize);
			for _ in 0..stringCount
			{
				sharedStrings.push(read_length_prefixed_utf8(&mut stream, path)?);
			}
		}

		let file = Self
		{
			stream: Mutex::new(stream),
			platformId, contentType, typeVersion, dataOffset, hasSharedStrings, sharedStrings,
			templates,
			arena: Mutex::new(Vec::new()),
			idMap: Mutex::new(HashMap::new()),
			topLevelIndex: 0,
		};

		let topLevelIndex = file.build_struct(file.dataOffset, 0)?;
		return Ok(Self { topLevelIndex, ..file });
	}

	pub fn content_type(&self) -> Tag
	{
		return self.contentType;
	}

	pub fn platform(&self) -> Tag
	{
		return self.platformId;
	}

	pub fn type_version(&self) -> u32
	{
		return self.typeVersion;
	}

	pub fn top_level(&self) -> Gff4Struct<'_>
	{
		return Gff4Struct { file: self, index: self.topLevelIndex };
	}

	fn path(&self) -> std::path::PathBuf
	{
		return self.stream.lock().unwrap().path();
	}

	fn generate_id(offset: u32, templateIndex: Option<u32>) -> u64
	{
		return ((offset as u64) << 32) | templateIndex.unwrap_or(SENTINEL) as u64;
	}

	/// Return the arena index of the struct at `offset` built from
	/// `templates[templateIndex]`, building and registering it first if this
	/// is the first time this `(offset, templateIndex)` pair is seen.
	fn build_struct(&self, offset: u32, templateIndex: u32) -> Result<usize, CoreError>
	{
		let id = Self::generate_id(offset, Some(templateIndex));

		{
			let idMap = self.idMap.lock().unwrap();
			if let Some(&index) = idMap.get(&id)
			{
				return Ok(index);
			}
		}

		let reservedIndex =
		{
			let mut arena = self.arena.lock().unwrap();
			let index = arena.len();
			arena.push(StructRecord { label: self.templates[templateIndex as usize].label, fields: HashMap::new(), fieldLabels: Vec::new() });
			self.idMap.lock().unwrap().insert(id, index);
			index
		};

		let record = self.load_struct_fields(offset, templateIndex)?;
		self.arena.lock().unwrap()[reservedIndex] = record;
		return Ok(reservedIndex);
	}

	fn load_struct_fields(&self, offset: u32, templateIndex: u32) -> Result<StructRecord, CoreError>
	{
		let path = self.path();
		let label = self.templates[templateIndex as usize].label;

		let mut fields = HashMap::new();
		let mut fieldLabels = Vec::new();

		let templateFieldCount = self.templates[templateIndex as usize].fields.len();
		for i in 0..templateFieldCount
		{
			let (label2, r#type, flags, rawOffset) =
			{
				let tf = &self.templates[templateIndex as usize].fields[i];
				(tf.label, tf.r#type, tf.flags, tf.offset)
			};

			let fieldOffset = if offset == SENTINEL || rawOffset == SENTINEL { SENTINEL } else { offset + rawOffset };

			let mut field = FieldRecord::new(&path, r#type, flags, fieldOffset, false)?;

			if field.fieldType == FieldType::Struct
			{
				self.load_struct_list(&mut field)?;
			}
			if field.fieldType == FieldType::Generic
			{
				self.load_generic(&mut field)?;
			}
			if field.fieldType == FieldType::AsciiString && self.hasSharedStrings
			{
				return Err(CoreError::unsupported_variant(&path, "ASCII string field in a file with shared strings"));
			}

			fieldLabels.push(label2);
			fields.insert(label2, field);
		}

		return Ok(StructRecord { label, fields, fieldLabels });
	}

	/// Populate `field.structs` for a `Struct`-typed field: one element if
	/// not a list, `getListCount` elements otherwise.
	fn load_struct_list(&self, field: &mut FieldRecord) -> Result<(), CoreError>
	{
		if field.offset == SENTINEL
		{
			return Ok(());
		}

		let templateIndex = field.structTemplateIndex;
		let structSize = if field.isReference { 4 } else { self.templates[templateIndex as usize].size };

		let mut stream = self.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(field.offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;

		let count = self.read_list_count_locked(&mut stream, field.isList)?;
		let structStart = stream.seek(SeekFrom::Current(0)).map_err(|e| CoreError::io(self.path(), e))?;
		drop(stream);

		for i in 0..count
		{
			let elementOffset = self.deref_offset(field.isReference, structStart as u32 + i * structSize)?;
			if elementOffset == SENTINEL
			{
				continue;
			}
			field.structs.push(self.build_struct(elementOffset, templateIndex)?);
		}

		return Ok(());
	}

	/// Populate `field.structs` (exactly one element) for a `Generic`-typed
	/// field. Note the original reuses `isList` as the dereference flag here
	/// — a listed generic's inline slot is a pointer to the list data, while
	/// a scalar generic embeds its data directly.
	fn load_generic(&self, field: &mut FieldRecord) -> Result<(), CoreError>
	{
		field.offset = self.deref_offset(field.isList, field.offset)?;
		if field.offset == SENTINEL
		{
			return Ok(());
		}

		let id = Self::generate_id(field.offset, None);
		let existing = self.idMap.lock().unwrap().get(&id).copied();
		let index = match existing
		{
			Some(index) => index,
			None =>
			{
				let reservedIndex =
				{
					let mut arena = self.arena.lock().unwrap();
					let index = arena.len();
					arena.push(StructRecord { label: 0, fields: HashMap::new(), fieldLabels: Vec::new() });
					self.idMap.lock().unwrap().insert(id, index);
					index
				};
				let record = self.load_generic_fields(field.offset, field.isList, field.isReference)?;
				self.arena.lock().unwrap()[reservedIndex] = record;
				reservedIndex
			},
		};

		field.structs.push(index);
		return Ok(());
	}

	fn load_generic_fields(&self, offset: u32, isList: bool, isReference: bool) -> Result<StructRecord, CoreError>
	{
		let path = self.path();

		let mut stream = self.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(&path, e))?;
		let genericCount = if isList { stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(&path, e))? } else { 1 };
		let genericStart = stream.seek(SeekFrom::Current(0)).map_err(|e| CoreError::io(&path, e))?;
		drop(stream);

		let mut fields = HashMap::new();
		let mut fieldLabels = Vec::new();

		for i in 0..genericCount
		{
			let mut stream = self.stream.lock().unwrap();
			stream.seek(SeekFrom::Start(genericStart + i as u64 * 8)).map_err(|e| CoreError::io(&path, e))?;
			let fieldTypeRaw = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let fieldFlags = stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(&path, e))?;
			let afterTagPos = stream.seek(SeekFrom::Current(0)).map_err(|e| CoreError::io(&path, e))?;
			drop(stream);

			let fieldOffset = self.deref_offset(isReference, afterTagPos as u32)?;
			if fieldOffset == SENTINEL
			{
				continue;
			}

			let mut field = FieldRecord::new(&path, fieldTypeRaw, fieldFlags, fieldOffset, true)?;
			if field.fieldType == FieldType::Struct
			{
				self.load_struct_list(&mut field)?;
			}
			if field.fieldType == FieldType::Generic
			{
				return Err(CoreError::unsupported_variant(&path, "generic field directly containing another generic"));
			}
			if field.fieldType == FieldType::AsciiString && self.hasSharedStrings
			{
				return Err(CoreError::unsupported_variant(&path, "ASCII string field in a file with shared strings"));
			}

			fieldLabels.push(i);
			fields.insert(i, field);
		}

		return Ok(StructRecord { label: 0, fields, fieldLabels });
	}

	/// `getListCount`: for a non-list field, always 1, consuming nothing.
	/// For a list field, read the list-offset word, and if present seek to
	/// `dataOffset + listOffset` and read the element count there.
	fn read_list_count_locked(&self, stream: &mut ByteStream, isList: bool) -> Result<u32, CoreError>
	{
		if !isList
		{
			return Ok(1);
		}

		let listOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))?;
		if listOffset == SENTINEL
		{
			return Ok(0);
		}

		stream.seek(SeekFrom::Start(self.dataOffset as u64 + listOffset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
		return stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e));
	}

	/// `getDataOffset(isReference, offset)`: non-references (and null
	/// offsets) pass through unchanged; a reference reads one more pointer
	/// word and rebases it against the file's data offset.
	fn deref_offset(&self, isReference: bool, offset: u32) -> Result<u32, CoreError>
	{
		if !isReference || offset == SENTINEL
		{
			return Ok(offset);
		}

		let mut stream = self.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
		let pointee = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))?;
		if pointee == SENTINEL
		{
			return Ok(pointee);
		}
		return Ok(self.dataOffset + pointee);
	}

	fn shared_string(&self, index: u32) -> String
	{
		if index == SENTINEL
		{
			return String::new();
		}
		return self.sharedStrings.get(index as usize).cloned().unwrap_or_default();
	}

	fn read_u64_at(&self, r#type: FieldType, offset: u32) -> Result<u64, CoreError>
	{
		let mut stream = self.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
		return match r#type
		{
			FieldType::Uint8 => Ok(stream.read_u8().map_err(|e| CoreError::io(self.path(), e))? as u64),
			FieldType::Sint8 => Ok(stream.read_i8().map_err(|e| CoreError::io(self.path(), e))? as i64 as u64),
			FieldType::Uint16 => Ok(stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as u64),
			FieldType::Sint16 => Ok(stream.read_i16::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as i64 as u64),
			FieldType::Uint32 => Ok(stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as u64),
			FieldType::Sint32 => Ok(stream.read_i32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as i64 as u64),
			FieldType::Uint64 => stream.read_u64::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e)),
			FieldType::Sint64 => Ok(stream.read_i64::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as u64),
			_ => Err(CoreError::unsupported_variant(self.path(), "field is not an integer type")),
		};
	}

	/// `readNintendoFixedPoint`: a signed 32-bit fixed-point value with 12
	/// fractional bits, as found in the Sonic Chronicles GFF4s.
	fn read_nds_fixed_at(&self, offset: u32) -> Result<f64, CoreError>
	{
		let mut stream = self.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
		let raw = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))?;
		return Ok(raw as i32 as f64 / 4096.0);
	}

	fn read_f64_at(&self, r#type: FieldType, offset: u32) -> Result<f64, CoreError>
	{
		return match r#type
		{
			FieldType::Float32 =>
			{
				let mut stream = self.stream.lock().unwrap();
				stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
				Ok(stream.read_f32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))? as f64)
			},
			FieldType::Float64 =>
			{
				let mut stream = self.stream.lock().unwrap();
				stream.seek(SeekFrom::Start(offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
				stream.read_f64::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))
			},
			FieldType::NdsFixed => self.read_nds_fixed_at(offset),
			_ => Err(CoreError::unsupported_variant(self.path(), "field is not a float type")),
		};
	}

	fn read_string_value(&self, field: &FieldRecord) -> Result<String, CoreError>
	{
		if field.fieldType == FieldType::StringType
		{
			if self.hasSharedStrings
			{
				let mut stream = self.stream.lock().unwrap();
				stream.seek(SeekFrom::Start(field.offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
				let index = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))?;
				drop(stream);
				return Ok(self.shared_string(index));
			}

			let stringOffset = if field.isGeneric
			{
				field.offset
			}
			else
			{
				let mut stream = self.stream.lock().unwrap();
				stream.seek(SeekFrom::Start(field.offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
				let rawOffset = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(self.path(), e))?;
				if rawOffset == SENTINEL
				{
					return Ok(String::new());
				}
				self.dataOffset + rawOffset
			};

			let mut stream = self.stream.lock().unwrap();
			stream.seek(SeekFrom::Start(stringOffset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
			return read_length_prefixed_utf16le(&mut stream, &self.path());
		}

		if field.fieldType == FieldType::AsciiString
		{
			let mut stream = self.stream.lock().unwrap();
			stream.seek(SeekFrom::Start(field.offset as u64)).map_err(|e| CoreError::io(self.path(), e))?;
			return read_length_prefixed_ascii(&mut stream, &self.path());
		}

		return Err(CoreError::unsupported_variant(self.path(), "field is not a string type"));
	}
}

fn read_length_prefixed_utf8(stream: &mut ByteStream, path: &Path) -> Result<String, CoreError>
{
	let length = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
	let mut bytes = vec![0u8; length as usize];
	stream.read_exact(&mut bytes).map_err(|e| CoreError::io(path, e))?;
	return String::from_utf8(bytes).map_err(|e| CoreError::encoding(path, e.to_string()));
}

fn read_length_prefixed_ascii(stream: &mut ByteStream, path: &Path) -> Result<String, CoreError>
{
	return read_length_prefixed_utf8(stream, path);
}

fn read_length_prefixed_utf16le(stream: &mut ByteStream, path: &Path) -> Result<String, CoreError>
{
	let charCount = stream.read_u32::<LittleEndian>().map_err(|e| CoreError::io(path, e))?;
	let mut units = Vec::with_capacity(charCount as usize);
	for _ in 0..charCount
	{
		units.push(stream.read_u16::<LittleEndian>().map_err(|e| CoreError::io(path, e))?);
	}
	return String::from_utf16(&units).map_err(|e| CoreError::encoding(path, e.to_string()));
}

/// A borrowed, non-mutating view of one struct instance (real or
/// generic-mapped) within a [`Gff4File`]'s arena.
#[derive(Clone, Copy)]
pub struct Gff4Struct<'a>
{
	file: &'a Gff4File,
	index: usize,
}

impl<'a> Gff4Struct<'a>
{
	pub fn label(&self) -> u32
	{
		return self.file.arena.lock().unwrap()[self.index].label;
	}

	pub fn field_count(&self) -> usize
	{
		return self.file.arena.lock().unwrap()[self.index].fieldLabels.len();
	}

	pub fn has_field(&self, field: u32) -> bool
	{
		return self.file.arena.lock().unwrap()[self.index].fields.contains_key(&field);
	}

	pub fn field_labels(&self) -> Vec<u32>
	{
		return self.file.arena.lock().unwrap()[self.index].fieldLabels.clone();
	}

	fn with_field<T>(&self, field: u32, f: impl FnOnce(&FieldRecord) -> T) -> Option<T>
	{
		let arena = self.file.arena.lock().unwrap();
		return arena[self.index].fields.get(&field).map(f);
	}

	/// `getDataOffset(field)`: struct-typed fields have no scalar data offset;
	/// every other field's raw template offset is dereferenced through
	/// `isReference` before use, exactly as `getData`/`getField` do in the
	/// original reader.
	fn resolve_data_offset(&self, field: u32) -> Option<(FieldType, u32, bool)>
	{
		let (r#type, offset, isList, isReference) = self.with_field(field, |f| (f.fieldType, f.offset, f.isList, f.isReference))?;
		if r#type == FieldType::Struct
		{
			return None;
		}

		let resolved = self.file.deref_offset(isReference, offset).ok()?;
		if resolved == SENTINEL
		{
			return None;
		}
		return Some((r#type, resolved, isList));
	}

	pub fn get_uint(&self, field: u32, default: u64) -> u64
	{
		let Some((r#type, offset, isList)) = self.resolve_data_offset(field) else { return default; };
		if isList { return default; }
		return self.file.read_u64_at(r#type, offset).unwrap_or(default);
	}

	pub fn get_sint(&self, field: u32, default: i64) -> i64
	{
		return self.get_uint(field, default as u64) as i64;
	}

	pub fn get_bool(&self, field: u32, default: bool) -> bool
	{
		return self.get_uint(field, default as u64) != 0;
	}

	pub fn get_double(&self, field: u32, default: f64) -> f64
	{
		let Some((r#type, offset, isList)) = self.resolve_data_offset(field) else { return default; };
		if isList { return default; }
		return self.file.read_f64_at(r#type, offset).unwrap_or(default);
	}

	pub fn get_float(&self, field: u32, default: f32) -> f32
	{
		return self.get_double(field, default as f64) as f32;
	}

	/// The string at this field, decoded from the shared-string table
	/// (V4.1), the data block (UTF-16LE), or inline ASCII — whichever this
	/// field's type and the file's header say apply.
	pub fn get_string(&self, field: u32, default: &str) -> String
	{
		let snapshot = self.with_field(field, |f| (f.fieldType, f.offset, f.isList, f.isGeneric));
		let Some((r#type, offset, isList, isGeneric)) = snapshot else { return default.to_string(); };
		if isList || offset == SENTINEL { return default.to_string(); }

		let fieldRecord = FieldRecord { fieldType: r#type, offset, isList, isReference: false, isGeneric, structTemplateIndex: 0, structs: Vec::new() };
		return self.file.read_string_value(&fieldRecord).unwrap_or_else(|_| default.to_string());
	}

	/// A TlkString field: a talk-table strref plus an optional inline/shared
	/// override string.
	pub fn get_talk_string(&self, field: u32) -> Option<(u32, String)>
	{
		let (r#type, offset, isList) = self.resolve_data_offset(field)?;
		if r#type != FieldType::TlkString || isList
		{
			return None;
		}

		let strref = self.file.read_u64_at(FieldType::Uint32, offset).ok()? as u32;
		let rawOffset = self.file.read_u64_at(FieldType::Uint32, offset + 4).ok()? as u32;

		let mut text = String::new();
		if rawOffset != SENTINEL
		{
			if self.file.hasSharedStrings
			{
				text = self.file.shared_string(rawOffset);
			}
			else if rawOffset != 0
			{
				let mut stream = self.file.stream.lock().unwrap();
				let path = self.file.path();
				if stream.seek(SeekFrom::Start(self.file.dataOffset as u64 + rawOffset as u64)).is_ok()
				{
					text = read_length_prefixed_utf16le(&mut stream, &path).unwrap_or_default();
				}
			}
		}

		return Some((strref, text));
	}

	fn read_vector(&self, field: u32, length: usize) -> Option<Vec<f64>>
	{
		let (r#type, offset, isList) = self.resolve_data_offset(field)?;
		if isList { return None; }

		let expected = match r#type
		{
			FieldType::Vector3f => 3,
			FieldType::Vector4f | FieldType::Quaternionf | FieldType::Color4f => 4,
			FieldType::Matrix4x4f => 16,
			_ => return None,
		};
		if expected != length
		{
			return None;
		}

		let mut values = Vec::with_capacity(length);
		let mut stream = self.file.stream.lock().unwrap();
		stream.seek(SeekFrom::Start(offset as u64)).ok()?;
		for _ in 0..length
		{
			values.push(stream.read_f32::<LittleEndian>().ok()? as f64);
		}
		return Some(values);
	}

	pub fn get_vector3(&self, field: u32) -> Option<[f64; 3]>
	{
		let v = self.read_vector(field, 3)?;
		return Some([v[0], v[1], v[2]]);
	}

	pub fn get_vector4(&self, field: u32) -> Option<[f64; 4]>
	{
		let v = self.read_vector(field, 4)?;
		return Some([v[0], v[1], v[2], v[3]]);
	}

	pub fn get_matrix4x4(&self, field: u32) -> Option<[f64; 16]>
	{
		let v = self.read_vector(field, 16)?;
		let mut m = [0.0; 16];
		m.copy_from_slice(&v);
		return Some(m);
	}

	/// The singular struct referenced by this field, or `None` if absent or
	/// the list is empty.
	pub fn get_struct(&self, field: u32) -> Option<Gff4Struct<'a>>
	{
		let index = self.with_field(field, |f|
		{
			if f.fieldType == FieldType::Struct { f.structs.first().copied() } else { None }
		}).flatten()?;
		return Some(Gff4Struct { file: self.file, index });
	}

	/// The struct this generic field maps to, or `None` if absent.
	pub fn get_generic(&self, field: u32) -> Option<Gff4Struct<'a>>
	{
		let index = self.with_field(field, |f|
		{
			if f.fieldType == FieldType::Generic { f.structs.first().copied() } else { None }
		}).flatten()?;
		return Some(Gff4Struct { file: self.file, index });
	}

	/// All structs referenced by a list-of-struct field.
	pub fn get_list(&self, field: u32) -> Vec<Gff4Struct<'a>>
	{
		let indices = self.with_field(field, |f|
		{
			if f.fieldType == FieldType::Struct { f.structs.clone() } else { Vec::new() }
		}).unwrap_or_default();
		return indices.into_iter().map(|index| Gff4Struct { file: self.file, index }).collect();
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	struct Gff4Builder
	{
		templates: Vec<(u32, Vec<(u32, u16, u16, u32)>)>,
		data: Vec<u8>,
		sharedStrings: Vec<String>,
	}

	impl Gff4Builder
	{
		fn new() -> Self
		{
			return Self { templates: Vec::new(), data: Vec::new(), sharedStrings: Vec::new() };
		}

		fn add_template(&mut self, label: &str, fields: Vec<(u32, u16, u16, u32)>) -> u32
		{
			let mut labelBytes = [b' '; 4];
			labelBytes[..label.len().min(4)].copy_from_slice(&label.as_bytes()[..label.len().min(4)]);
			self.templates.push((make_tag(labelBytes[0], labelBytes[1], labelBytes[2], labelBytes[3]), fields));
			return self.templates.len() as u32 - 1;
		}

		fn push_u32(&mut self, value: u32) -> u32
		{
			let offset = self.data.len() as u32;
			self.data.extend_from_slice(&value.to_le_bytes());
			return offset;
		}

		fn add_shared_string(&mut self, text: &str) -> u32
		{
			self.sharedStrings.push(text.to_string());
			return self.sharedStrings.len() as u32 - 1;
		}

		fn build(&self, version: &str) -> (Vec<u8>, u32)
		{
			let isV41 = version == "V4.1";

			let mut buffer = Vec::new();
			buffer.extend_from_slice(b"GFF ");
			buffer.extend_from_slice(version.as_bytes());
			buffer.extend_from_slice(b"PC  ");
			buffer.extend_from_slice(b"TEST");
			buffer.extend_from_slice(&1u32.to_be_bytes());
			buffer.extend_from_slice(&(self.templates.len() as u32).to_le_bytes());

			let mut stringOffsetPatch = None;
			if isV41
			{
				buffer.extend_from_slice(&(self.sharedStrings.len() as u32).to_le_bytes());
				stringOffsetPatch = Some(buffer.len());
				buffer.extend_from_slice(&0u32.to_le_bytes());
			}
			let dataOffsetPatch = buffer.len();
			buffer.extend_from_slice(&0u32.to_le_bytes());

			let mut fieldTables = Vec::new();
			for (label, fields) in &self.templates
			{
				buffer.extend_from_slice(&label.to_be_bytes());
				buffer.extend_from_slice(&(fields.len() as u32).to_le_bytes());
				fieldTables.push(buffer.len());
				buffer.extend_from_slice(&0u32.to_le_bytes());
				buffer.extend_from_slice(&16u32.to_le_bytes());
			}

			for (i, (_, fields)) in self.templates.iter().enumerate()
			{
				let fieldOffset = buffer.len() as u32;
				buffer[fieldTables[i]..fieldTables[i] + 4].copy_from_slice(&fieldOffset.to_le_bytes());
				for (label, r#type, flags, dataFieldOffset) in fields
				{
					buffer.extend_from_slice(&label.to_le_bytes());
					buffer.extend_from_slice(&r#type.to_le_bytes());
					buffer.extend_from_slice(&flags.to_le_bytes());
					buffer.extend_from_slice(&dataFieldOffset.to_le_bytes());
				}
			}

			let dataStart = buffer.len() as u32;
			buffer[dataOffsetPatch..dataOffsetPatch + 4].copy_from_slice(&dataStart.to_le_bytes());
			buffer.extend_from_slice(&self.data);

			if let Some(patchAt) = stringOffsetPatch
			{
				let stringTableStart = buffer.len() as u32;
				buffer[patchAt..patchAt + 4].copy_from_slice(&stringTableStart.to_le_bytes());
				for s in &self.sharedStrings
				{
					buffer.extend_from_slice(&(s.len() as u32).to_le_bytes());
					buffer.extend_from_slice(s.as_bytes());
				}
			}

			return (buffer, dataStart);
		}
	}

	fn write_and_open(buffer: Vec<u8>, name: &str) -> Gff4File
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-gff4-{:?}", std::thread::current().id()));
		std::fs::create_dir_all(&dir).unwrap();
		let path = dir.join(name);
		std::fs::write(&path, buffer).unwrap();
		return Gff4File::open(&path).unwrap();
	}

	#[test]
	fn readsSimpleIntegerField()
	{
		let mut builder = Gff4Builder::new();
		// top-level template: one Uint32 field, at offset 0 within the struct
		builder.add_template("TOP ", vec![(1, FieldType::Uint32 as u16, 0, 0)]);
		builder.push_u32(42);
		let (buffer, _) = builder.build("V4.0");

		let file = write_and_open(buffer, "simple.gff4");
		let top = file.top_level();
		assert!(top.has_field(1));
		assert_eq!(42, top.get_uint(1, 0));
		assert_eq!(0, top.get_uint(2, 0));
	}

	/// Scenario D — GFF4 V4.1 shared strings: a string field resolves
	/// through the shared-string table by index.
	#[test]
	fn resolvesV41SharedStringByIndex()
	{
		let mut builder = Gff4Builder::new();
		builder.add_shared_string("one");
		builder.add_shared_string("two");
		builder.add_shared_string("three");

		builder.add_template("TOP ", vec![(5, FieldType::StringType as u16, 0, 0)]);
		builder.push_u32(2);
		let (buffer, _) = builder.build("V4.1");

		let file = write_and_open(buffer, "shared.gff4");
		let top = file.top_level();
		assert_eq!("three", top.get_string(5, ""));
	}

	#[test]
	fn readsNestedStructField()
	{
		let mut builder = Gff4Builder::new();
		// child template: one Uint8 field
		let childTemplate = builder.add_template("CHLD", vec![(9, FieldType::Uint8 as u16, 0, 0)]);
		// top-level template: one Struct field pointing at the child template, non-list non-reference
		builder.add_template("TOP ", vec![(1, childTemplate as u16, 0x4000, 4)]);

		builder.push_u32(0); // padding so the child struct starts at offset 4
		builder.data.push(7u8); // child's Uint8 value

		let (buffer, _) = builder.build("V4.0");
		let file = write_and_open(buffer, "nested.gff4");

		let top = file.top_level();
		let child = top.get_struct(1).unwrap();
		assert_eq!(7, child.get_uint(9, 0));
	}
}
