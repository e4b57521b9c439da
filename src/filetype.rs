#![allow(non_snake_case, non_upper_case_globals, non_camel_case_types)]

//! The closed ~300-entry file-type taxonomy: numeric IDs as stored inside
//! KEY/ERF/RIM archives, mapped to the canonical lowercase extension used for
//! loose files on disk.
//!
//! The numeric IDs and extensions below are reproduced byte-exact from the
//! original engine's type table so that archives from every supported game
//! round-trip through `add_file_type`/`get_file_type` without translation.
//! A handful of extensions are legitimately aliases of each other in that
//! table (`.dft`/`.dtf` both resolve to `FileType::DFT`, `.fxr`/`.fxt` both
//! resolve to `FileType::FXR`, and similarly for `MDX`/`MDX2`, `TXB`/`TXB2`,
//! and others) — the original engine assigns both extensions the same
//! numeric ID, which Rust's `#[repr(i32)]` enum cannot represent as two
//! variants with one discriminant, so the second extension's row in
//! `FILE_TYPE_TABLE` simply names the surviving variant again.
//! `type_from_path` resolves to whichever row appears later in
//! `FILE_TYPE_TABLE`, matching the original's last-insert-wins map behavior.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, OnceLock};

/// IDs at or above this value never appear inside an archive; they are used
/// only to tag loose files on disk (or, for the handful of `None`-free
/// placeholder values the original project reserved, simply never used).
pub const MAX_ARCHIVE_ID: i32 = 9999;

/// A closed set of ~300 resource-type tags. The numeric discriminant is the
/// same value stored inside archives that tag resources numerically (KEY,
/// ERF, RIM); `FileType::None` (`-1`) marks "no type".
///
/// A few extensions (`.dft`/`.dtf`, `.fxr`/`.fxt`, and others) map to the
/// same variant because the original engine's table gives both the same
/// numeric ID — see `FILE_TYPE_TABLE`.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, strum::EnumIter, serde::Serialize, serde::Deserialize)]
#[repr(i32)]
pub enum FileType
{
	None = -1,
	/// Generic GFF.
	RES = 0,
	/// Image, Windows bitmap.
	BMP = 1,
	/// Video, Infinity Engine.
	MVE = 2,
	/// Image, Truevision TARGA image.
	TGA = 3,
	/// Audio, Waveform.
	WAV = 4,
	/// Packed layer texture.
	PLT = 6,
	/// Configuration, Windows INI.
	INI = 7,
	/// Audio, MP3 with extra header.
	BMU = 8,
	/// Video, MPEG.
	MPG = 9,
	/// Text, raw.
	TXT = 10,
	/// Audio, Windows media.
	WMA = 11,
	/// Video, Windows media.
	WMV = 12,
	/// Video, Xbox.
	XMV = 13,
	PLH = 2000,
	/// Texture.
	TEX = 2001,
	/// Geometry, BioWare model.
	MDL = 2002,
	THG = 2003,
	/// Font.
	FNT = 2005,
	/// Script, LUA source.
	LUA = 2007,
	SLT = 2008,
	/// Script, NWScript source.
	NSS = 2009,
	/// Script, NWScript bytecode.
	NCS = 2010,
	/// Module, ERF.
	MOD = 2011,
	/// Static area data, GFF.
	ARE = 2012,
	/// Tileset.
	SET = 2013,
	/// Module information, GFF.
	IFO = 2014,
	/// Character data, GFF.
	BIC = 2015,
	/// Walk mesh.
	WOK = 2016,
	/// Table data, 2-dimensional text array.
	TwoDa = 2017,
	/// Talk table.
	TLK = 2018,
	/// Texture information.
	TXI = 2022,
	/// Dynamic area data, GFF.
	GIT = 2023,
	/// Item template (BioWare), GFF.
	BTI = 2024,
	/// Item template (user), GFF.
	UTI = 2025,
	/// Creature template (BioWare), GFF.
	BTC = 2026,
	/// Creature template (user), GFF.
	UTC = 2027,
	/// Dialog tree, GFF.
	DLG = 2029,
	/// Toolset "palette" (tree of tiles or object templates), GFF.
	ITP = 2030,
	/// Trigger template (BioWare), GFF.
	BTT = 2031,
	/// Trigger template (user), GFF.
	UTT = 2032,
	/// Texture, DirectDraw Surface.
	DDS = 2033,
	/// Sound template (BioWare), GFF.
	BTS = 2034,
	/// Sound template (user), GFF.
	UTS = 2035,
	/// Letter combo probability information.
	LTR = 2036,
	/// Generic GFF.
	GFF = 2037,
	/// Faction information, GFF.
	FAC = 2038,
	/// Encounter template (BioWare), GFF.
	BTE = 2039,
	/// Encounter template (user), GFF.
	UTE = 2040,
	/// Door template (BioWare), GFF.
	BTD = 2041,
	/// Door template (user), GFF.
	UTD = 2042,
	/// Placeable template (BioWare), GFF.
	BTP = 2043,
	/// Placeable template (user), GFF.
	UTP = 2044,
	/// Default values; also default value file, INI (`.dft`/`.dtf` both
	/// resolve here — see `FILE_TYPE_TABLE`).
	DFT = 2045,
	/// Game instance comments, GFF.
	GIC = 2046,
	/// GUI definition, GFF.
	GUI = 2047,
	/// Script, conditional source script.
	CSS = 2048,
	/// Script, conditional compiled script.
	CCS = 2049,
	/// Store template (BioWare), GFF.
	BTM = 2050,
	/// Store template (user), GFF.
	UTM = 2051,
	/// Door walk mesh.
	DWK = 2052,
	/// Placeable walk mesh.
	PWK = 2053,
	/// Random item generator template (BioWare), GFF.
	BTG = 2054,
	/// Random item generator template (user), GFF.
	UTG = 2055,
	/// Journal data, GFF.
	JRL = 2056,
	/// Game save, ERF.
	SAV = 2057,
	/// Waypoint template, GFF.
	UTW = 2058,
	/// Texture, custom 16-bit RGBA.
	FourPc = 2059,
	/// Sound Set File.
	SSF = 2060,
	/// Resource hak pak, ERF.
	HAK = 2061,
	/// Neverwinter Nights original campaign module, ERF.
	NWM = 2062,
	/// Video, RAD Game Tools Bink.
	BIK = 2063,
	/// Script debugger file.
	NDB = 2064,
	/// Plot instance/manager, GFF.
	PTM = 2065,
	/// Plot wizard template, GFF.
	PTT = 2066,
	NCM = 2067,
	MFX = 2068,
	/// Material.
	MAT = 2069,
	/// Geometry, BioWare model.
	MDB = 2070,
	SAY = 2071,
	/// Font, True Type.
	TTF = 2072,
	TTC = 2073,
	/// Cutscene, GFF.
	CUT = 2074,
	/// Karma, XML.
	KA = 2075,
	/// Image, JPEG.
	JPG = 2076,
	/// Icon, Windows ICO.
	ICO = 2077,
	/// Audio, Ogg Vorbis.
	OGG = 2078,
	/// Tree data SpeedTree.
	SPT = 2079,
	SPW = 2080,
	/// Woot effect class, XML.
	WFX = 2081,
	UGM = 2082,
	/// Quest database, GFF.
	QDB = 2083,
	/// Quest, GFF.
	QST = 2084,
	NPC = 2085,
	SPN = 2086,
	UTX = 2087,
	MMD = 2088,
	SMM = 2089,
	UTA = 2090,
	MDE = 2091,
	MDV = 2092,
	MDA = 2093,
	MBA = 2094,
	OCT = 2095,
	BFX = 2096,
	PDB = 2097,
	/// Game save in The Witcher.
	TheWitcherSave = 2098,
	PVS = 2099,
	CFX = 2100,
	/// Script, LUA bytecode.
	LUC = 2101,
	PRB = 2103,
	/// Campaign information.
	CAM = 2104,
	VDS = 2105,
	BIN = 2106,
	WOB = 2107,
	API = 2108,
	Properties = 2109,
	/// Image, Portable Network Graphics.
	PNG = 2110,
	/// Area data, room layout.
	LYT = 3000,
	/// Area data, room visibilities.
	VIS = 3001,
	/// Module resources, RIM.
	RIM = 3002,
	/// Path finder data, GFF.
	PTH = 3003,
	/// Lipsync data.
	LIP = 3004,
	BWM = 3005,
	/// Texture.
	TXB = 3006,
	/// Texture.
	TPC = 3007,
	/// Geometry, model mesh data.
	MDX = 3008,
	RSV = 3009,
	SIG = 3010,
	/// Material, binary.
	MAB = 3011,
	/// Quest, GFF.
	QST2 = 3012,
	/// GFF.
	STO = 3013,
	/// Hex grid file.
	HEX = 3015,
	/// Geometry, model mesh data.
	MDX2 = 3016,
	/// Texture.
	TXB2 = 3017,
	/// Finite State Machine data.
	FSM = 3022,
	/// Area environment settings, INI.
	ART = 3023,
	/// Brightening control.
	AMP = 3024,
	/// Crowd attributes, GFF.
	CWA = 3025,
	/// Lipsync data, binary LIP.
	BIP = 3028,
	MDB2 = 4000,
	MDA2 = 4001,
	SPT2 = 4002,
	GR2 = 4003,
	FXA = 4004,
	FXE = 4005,
	JPG2 = 4007,
	PWC = 4008,
	/// Table data, 1-dimensional text array.
	OneDa = 9996,
	/// Module resources.
	ERF = 9997,
	/// Game resource data.
	BIF = 9998,
	/// Game resource index.
	KEY = 9999,
	/// Windows PE EXE file.
	EXE = 19000,
	/// xBase database.
	DBF = 19001,
	/// FoxPro database index.
	CDX = 19002,
	/// FoxPro database memo file.
	FPT = 19003,
	/// Face bone definitions, FaceFX Actor.
	ZIP = 20000,
	/// Face metadata, FaceFX.
	FXM = 20001,
	/// Face metadata, FaceFX.
	FXS = 20002,
	/// Extensible Markup Language.
	XML = 20003,
	/// Walk mesh.
	WLK = 20004,
	/// Tree template (user), GFF.
	UTR = 20005,
	/// Special effect file.
	SEF = 20006,
	/// Particle effect.
	PFX = 20007,
	/// Trail effect.
	TFX = 20008,
	IFX = 20009,
	/// Line effect.
	LFX = 20010,
	/// Billboard effect.
	BBX = 20011,
	/// Prefab blueprint.
	PFB = 20012,
	UPE = 20013,
	USC = 20014,
	/// Light template (user), GFF.
	ULT = 20015,
	FX = 20016,
	MAX = 20017,
	DOC = 20018,
	SCC = 20019,
	/// World map, GFF.
	WMP = 20020,
	OSC = 20021,
	TRN = 20022,
	UEN = 20023,
	ROS = 20024,
	RST = 20025,
	PTX = 20026,
	LTX = 20027,
	TRX = 20028,
	/// Archive, Nintendo DS ROM file.
	NDS = 21000,
	/// Archive, hashed ERF.
	HERF = 21001,
	/// HERF file name -> hashes dictionary.
	DICT = 21002,
	/// Compressed file, Nintendo LZSS.
	SMALL = 21003,
	CBGT = 21004,
	CDPTH = 21005,
	EMIT = 21006,
	/// Items, 2DA.
	ITM = 21007,
	/// Animation, Nitro ANimation Resource.
	NANR = 21008,
	/// Palette, Nitro Basic File Palette.
	NBFP = 21009,
	/// Image, Map, Nitro Basic File Screen.
	NBFS = 21010,
	/// Image, Nitro CEll Resource.
	NCER = 21011,
	/// Image, Nitro Character Graphic Resource.
	NCGR = 21012,
	/// Palette, Nitro CoLoR.
	NCLR = 21013,
	/// Font.
	NFTR = 21014,
	/// Model Animation.
	NSBCA = 21015,
	/// Model.
	NSBMD = 21016,
	/// Texture animation.
	NSBTA = 21017,
	/// Texture part.
	NSBTP = 21018,
	/// Texture.
	NSBTX = 21019,
	/// Palette.
	PAL = 21020,
	/// Image, raw.
	RAW = 21021,
	SADL = 21022,
	/// Audio, Sound DATa.
	SDAT = 21023,
	SMP = 21024,
	/// Spells, 2DA.
	SPL = 21025,
	/// Video, Actimagine.
	VX = 21026,
	/// Animation blend.
	ANB = 22000,
	/// Animation sequence.
	ANI = 22001,
	/// Script, client script source.
	CNS = 22002,
	/// Cursor, Windows cursor.
	CUR = 22003,
	/// Animation event.
	EVT = 22004,
	FDL = 22005,
	FXO = 22006,
	/// GOB Animation Data.
	GAD = 22007,
	/// Table data, GFF'd 2DA, 2-dimensional text array.
	GDA = 22008,
	/// Vector graphics animation, Scaleform GFx.
	GFX = 22009,
	/// Language definition file.
	LDF = 22010,
	/// Area list.
	LST = 22011,
	/// Material Library.
	MAL = 22012,
	/// Material Object.
	MAO = 22013,
	/// Model Mesh Hierarchy.
	MMH = 22014,
	MOP = 22015,
	/// Head Morph.
	MOR = 22016,
	/// Mesh.
	MSH = 22017,
	MTX = 22018,
	/// Script, compiled client script.
	NCC = 22019,
	/// Physics, Novodex collision info.
	PHY = 22020,
	/// Plot information.
	PLO = 22021,
	/// Cutscene stage.
	STG = 22022,
	TBI = 22023,
	/// Material tint.
	TNT = 22024,
	/// Area layout.
	ARL = 22025,
	/// FMOD Event.
	FEV = 22026,
	/// Audio, FMOD sound bank.
	FSB = 22027,
	OPF = 22028,
	CRF = 22029,
	RIMP = 22030,
	/// Resource meta information.
	MET = 22031,
	/// Resource meta information.
	META = 22032,
	/// Face metadata, FaceFX (`.fxr`/`.fxt` both resolve here — see
	/// `FILE_TYPE_TABLE`).
	FXR = 22033,
	/// Campaign Information File, GFF4.
	CIF = 22034,
	CUB = 22035,
	DLB = 22036,
	/// NWScript client script source.
	NSC = 22037,
	/// Video, QuickTime/MPEG-4.
	MOV = 23000,
	/// Cursor, Mac CURS format.
	CURS = 23001,
	/// Image, Mac PICT format.
	PICT = 23002,
	/// Mac resource fork.
	RSRC = 23003,
	/// Mac property list (XML).
	PLIST = 23004,
	/// Creature, GFF.
	CRE = 24000,
	/// Shader.
	PSO = 24001,
	/// Shader.
	VSO = 24002,
	/// Font, character descriptions.
	ABC = 24003,
	/// Font, character bitmap data.
	SBM = 24004,
	PVD = 24005,
	/// Placeable, GFF.
	PLA = 24006,
	/// Trigger, GFF.
	TRG = 24007,
	PK = 24008,
	ALS = 25000,
	APL = 25001,
	Assembly = 25002,
	BAK = 25003,
	BNK = 25004,
	CL = 25005,
	CNV = 25006,
	CON = 25007,
	DAT = 25008,
	DX11 = 25009,
	IDS = 25010,
	LOG = 25011,
	MAP = 25012,
	MML = 25013,
	MP3 = 25014,
	PCK = 25015,
	RML = 25016,
	S = 25017,
	STA = 25018,
	SVR = 25019,
	VLM = 25020,
	WBD = 25021,
	XBX = 25022,
	XLS = 25023,
	/// Game resource data, LZMA-compressed BIF.
	BZF = 26000,
	/// Extra adventure modules, ERF.
	ADV = 27000,
	/// JavaScript Object Notation.
	JSON = 28000,
	/// Talk table for extra expert-level control strings, plain text.
	TlkExpert = 28001,
	/// Talk table for extra mobile port strings, plain text.
	TlkMobile = 28002,
	/// Talk table for extra touch control strings, plain text.
	TlkTouch = 28003,
	/// OpenType Font.
	OTF = 28004,
	PAR = 28005,
	/// XACT WaveBank.
	XWB = 29000,
	/// XACT SoundBank.
	XSB = 29001,
	/// Texture.
	XDS = 30000,
	WND = 30001,
	/// Intermediate texture.
	XEOSITEX = 40000,
	/// Video, WebM.
	WBM = 41000,
}

impl FileType
{
	pub fn id(self) -> i32
	{
		return self as i32;
	}

	/// Whether this ID could appear inside an archive's numeric type field,
	/// as opposed to being synthesized only for loose files on disk.
	pub fn is_archive_type(self) -> bool
	{
		let id = self.id();
		return id >= 0 && id <= MAX_ARCHIVE_ID;
	}
}

impl Default for FileType
{
	fn default() -> Self
	{
		return FileType::None;
	}
}

/// `(FileType, extension)` rows in original declaration order. Order matters:
/// lookups resolve collisions to the later row, matching the source engine.
static FILE_TYPE_TABLE: &[(FileType, &str)] = &[
	(FileType::None, ""),
	(FileType::RES, ".res"),
	(FileType::BMP, ".bmp"),
	(FileType::MVE, ".mve"),
	(FileType::TGA, ".tga"),
	(FileType::WAV, ".wav"),
	(FileType::PLT, ".plt"),
	(FileType::INI, ".ini"),
	(FileType::BMU, ".bmu"),
	(FileType::MPG, ".mpg"),
	(FileType::TXT, ".txt"),
	(FileType::WMA, ".wma"),
	(FileType::WMV, ".wmv"),
	(FileType::XMV, ".xmv"),
	(FileType::PLH, ".plh"),
	(FileType::TEX, ".tex"),
	(FileType::MDL, ".mdl"),
	(FileType::THG, ".thg"),
	(FileType::FNT, ".fnt"),
	(FileType::LUA, ".lua"),
	(FileType::SLT, ".slt"),
	(FileType::NSS, ".nss"),
	(FileType::NCS, ".ncs"),
	(FileType::MOD, ".mod"),
	(FileType::ARE, ".are"),
	(FileType::SET, ".set"),
	(FileType::IFO, ".ifo"),
	(FileType::BIC, ".bic"),
	(FileType::WOK, ".wok"),
	(FileType::TwoDa, ".2da"),
	(FileType::TLK, ".tlk"),
	(FileType::TXI, ".txi"),
	(FileType::GIT, ".git"),
	(FileType::BTI, ".bti"),
	(FileType::UTI, ".uti"),
	(FileType::BTC, ".btc"),
	(FileType::UTC, ".utc"),
	(FileType::DLG, ".dlg"),
	(FileType::ITP, ".itp"),
	(FileType::BTT, ".btt"),
	(FileType::UTT, ".utt"),
	(FileType::DDS, ".dds"),
	(FileType::BTS, ".bts"),
	(FileType::UTS, ".uts"),
	(FileType::LTR, ".ltr"),
	(FileType::GFF, ".gff"),
	(FileType::FAC, ".fac"),
	(FileType::BTE, ".bte"),
	(FileType::UTE, ".ute"),
	(FileType::BTD, ".btd"),
	(FileType::UTD, ".utd"),
	(FileType::BTP, ".btp"),
	(FileType::UTP, ".utp"),
	(FileType::DFT, ".dft"),
	(FileType::DFT, ".dtf"),
	(FileType::GIC, ".gic"),
	(FileType::GUI, ".gui"),
	(FileType::CSS, ".css"),
	(FileType::CCS, ".ccs"),
	(FileType::BTM, ".btm"),
	(FileType::UTM, ".utm"),
	(FileType::DWK, ".dwk"),
	(FileType::PWK, ".pwk"),
	(FileType::BTG, ".btg"),
	(FileType::UTG, ".utg"),
	(FileType::JRL, ".jrl"),
	(FileType::SAV, ".sav"),
	(FileType::UTW, ".utw"),
	(FileType::FourPc, ".4pc"),
	(FileType::SSF, ".ssf"),
	(FileType::HAK, ".hak"),
	(FileType::NWM, ".nwm"),
	(FileType::BIK, ".bik"),
	(FileType::NDB, ".ndb"),
	(FileType::PTM, ".ptm"),
	(FileType::PTT, ".ptt"),
	(FileType::NCM, ".ncm"),
	(FileType::MFX, ".mfx"),
	(FileType::MAT, ".mat"),
	(FileType::MDB, ".mdb"),
	(FileType::SAY, ".say"),
	(FileType::TTF, ".ttf"),
	(FileType::TTC, ".ttc"),
	(FileType::CUT, ".cut"),
	(FileType::KA, ".ka"),
	(FileType::JPG, ".jpg"),
	(FileType::ICO, ".ico"),
	(FileType::OGG, ".ogg"),
	(FileType::SPT, ".spt"),
	(FileType::SPW, ".spw"),
	(FileType::WFX, ".wfx"),
	(FileType::UGM, ".ugm"),
	(FileType::QDB, ".qdb"),
	(FileType::QST, ".qst"),
	(FileType::NPC, ".npc"),
	(FileType::SPN, ".spn"),
	(FileType::UTX, ".utx"),
	(FileType::MMD, ".mmd"),
	(FileType::SMM, ".smm"),
	(FileType::UTA, ".uta"),
	(FileType::MDE, ".mde"),
	(FileType::MDV, ".mdv"),
	(FileType::MDA, ".mda"),
	(FileType::MBA, ".mba"),
	(FileType::OCT, ".oct"),
	(FileType::BFX, ".bfx"),
	(FileType::PDB, ".pdb"),
	(FileType::TheWitcherSave, ".TheWitcherSave"),
	(FileType::PVS, ".pvs"),
	(FileType::CFX, ".cfx"),
	(FileType::LUC, ".luc"),
	(FileType::PRB, ".prb"),
	(FileType::CAM, ".cam"),
	(FileType::VDS, ".vds"),
	(FileType::BIN, ".bin"),
	(FileType::WOB, ".wob"),
	(FileType::API, ".api"),
	(FileType::Properties, ".properties"),
	(FileType::PNG, ".png"),
	(FileType::LYT, ".lyt"),
	(FileType::VIS, ".vis"),
	(FileType::RIM, ".rim"),
	(FileType::PTH, ".pth"),
	(FileType::LIP, ".lip"),
	(FileType::BWM, ".bwm"),
	(FileType::TXB, ".txb"),
	(FileType::TPC, ".tpc"),
	(FileType::MDX, ".mdx"),
	(FileType::RSV, ".rsv"),
	(FileType::SIG, ".sig"),
	(FileType::MAB, ".mab"),
	(FileType::QST2, ".qst"),
	(FileType::STO, ".sto"),
	(FileType::HEX, ".hex"),
	(FileType::MDX2, ".mdx"),
	(FileType::TXB2, ".txb"),
	(FileType::FSM, ".fsm"),
	(FileType::ART, ".art"),
	(FileType::AMP, ".amp"),
	(FileType::CWA, ".cwa"),
	(FileType::BIP, ".bip"),
	(FileType::MDB2, ".mdb2"),
	(FileType::MDA2, ".mda2"),
	(FileType::SPT2, ".spt2"),
	(FileType::GR2, ".gr2"),
	(FileType::FXA, ".fxa"),
	(FileType::FXE, ".fxe"),
	(FileType::JPG2, ".jpg2"),
	(FileType::PWC, ".pwc"),
	(FileType::OneDa, ".1da"),
	(FileType::ERF, ".erf"),
	(FileType::BIF, ".bif"),
	(FileType::KEY, ".key"),
	(FileType::EXE, ".exe"),
	(FileType::DBF, ".dbf"),
	(FileType::CDX, ".cdx"),
	(FileType::FPT, ".fpt"),
	(FileType::ZIP, ".zip"),
	(FileType::FXM, ".fxm"),
	(FileType::FXS, ".fxs"),
	(FileType::XML, ".xml"),
	(FileType::WLK, ".wlk"),
	(FileType::UTR, ".utr"),
	(FileType::SEF, ".sef"),
	(FileType::PFX, ".pfx"),
	(FileType::TFX, ".tfx"),
	(FileType::IFX, ".ifx"),
	(FileType::LFX, ".lfx"),
	(FileType::BBX, ".bbx"),
	(FileType::PFB, ".pfb"),
	(FileType::UPE, ".upe"),
	(FileType::USC, ".usc"),
	(FileType::ULT, ".ult"),
	(FileType::FX, ".fx"),
	(FileType::MAX, ".max"),
	(FileType::DOC, ".doc"),
	(FileType::SCC, ".scc"),
	(FileType::WMP, ".wmp"),
	(FileType::OSC, ".osc"),
	(FileType::TRN, ".trn"),
	(FileType::UEN, ".uen"),
	(FileType::ROS, ".ros"),
	(FileType::RST, ".rst"),
	(FileType::PTX, ".ptx"),
	(FileType::LTX, ".ltx"),
	(FileType::TRX, ".trx"),
	(FileType::NDS, ".nds"),
	(FileType::HERF, ".herf"),
	(FileType::DICT, ".dict"),
	(FileType::SMALL, ".small"),
	(FileType::CBGT, ".cbgt"),
	(FileType::CDPTH, ".cdpth"),
	(FileType::EMIT, ".emit"),
	(FileType::ITM, ".itm"),
	(FileType::NANR, ".nanr"),
	(FileType::NBFP, ".nbfp"),
	(FileType::NBFS, ".nbfs"),
	(FileType::NCER, ".ncer"),
	(FileType::NCGR, ".ncgr"),
	(FileType::NCLR, ".nclr"),
	(FileType::NFTR, ".nftr"),
	(FileType::NSBCA, ".nsbca"),
	(FileType::NSBMD, ".nsbmd"),
	(FileType::NSBTA, ".nsbta"),
	(FileType::NSBTP, ".nsbtp"),
	(FileType::NSBTX, ".nsbtx"),
	(FileType::PAL, ".pal"),
	(FileType::RAW, ".raw"),
	(FileType::SADL, ".sadl"),
	(FileType::SDAT, ".sdat"),
	(FileType::SMP, ".smp"),
	(FileType::SPL, ".spl"),
	(FileType::VX, ".vx"),
	(FileType::ANB, ".anb"),
	(FileType::ANI, ".ani"),
	(FileType::CNS, ".cns"),
	(FileType::CUR, ".cur"),
	(FileType::EVT, ".evt"),
	(FileType::FDL, ".fdl"),
	(FileType::FXO, ".fxo"),
	(FileType::GAD, ".gad"),
	(FileType::GDA, ".gda"),
	(FileType::GFX, ".gfx"),
	(FileType::LDF, ".ldf"),
	(FileType::LST, ".lst"),
	(FileType::MAL, ".mal"),
	(FileType::MAO, ".mao"),
	(FileType::MMH, ".mmh"),
	(FileType::MOP, ".mop"),
	(FileType::MOR, ".mor"),
	(FileType::MSH, ".msh"),
	(FileType::MTX, ".mtx"),
	(FileType::NCC, ".ncc"),
	(FileType::PHY, ".phy"),
	(FileType::PLO, ".plo"),
	(FileType::STG, ".stg"),
	(FileType::TBI, ".tbi"),
	(FileType::TNT, ".tnt"),
	(FileType::ARL, ".arl"),
	(FileType::FEV, ".fev"),
	(FileType::FSB, ".fsb"),
	(FileType::OPF, ".opf"),
	(FileType::CRF, ".crf"),
	(FileType::RIMP, ".rimp"),
	(FileType::MET, ".met"),
	(FileType::META, ".meta"),
	(FileType::FXR, ".fxr"),
	(FileType::FXR, ".fxt"),
	(FileType::CIF, ".cif"),
	(FileType::CUB, ".cub"),
	(FileType::DLB, ".dlb"),
	(FileType::NSC, ".nsc"),
	(FileType::MOV, ".mov"),
	(FileType::CURS, ".curs"),
	(FileType::PICT, ".pict"),
	(FileType::RSRC, ".rsrc"),
	(FileType::PLIST, ".plist"),
	(FileType::CRE, ".cre"),
	(FileType::PSO, ".pso"),
	(FileType::VSO, ".vso"),
	(FileType::ABC, ".abc"),
	(FileType::SBM, ".sbm"),
	(FileType::PVD, ".pvd"),
	(FileType::PLA, ".pla"),
	(FileType::TRG, ".trg"),
	(FileType::PK, ".pk"),
	(FileType::ALS, ".als"),
	(FileType::APL, ".apl"),
	(FileType::Assembly, ".assembly"),
	(FileType::BAK, ".bak"),
	(FileType::BNK, ".bnk"),
	(FileType::CL, ".cl"),
	(FileType::CNV, ".cnv"),
	(FileType::CON, ".con"),
	(FileType::DAT, ".dat"),
	(FileType::DX11, ".dx11"),
	(FileType::IDS, ".ids"),
	(FileType::LOG, ".log"),
	(FileType::MAP, ".map"),
	(FileType::MML, ".mml"),
	(FileType::MP3, ".mp3"),
	(FileType::PCK, ".pck"),
	(FileType::RML, ".rml"),
	(FileType::S, ".s"),
	(FileType::STA, ".sta"),
	(FileType::SVR, ".svr"),
	(FileType::VLM, ".vlm"),
	(FileType::WBD, ".wbd"),
	(FileType::XBX, ".xbx"),
	(FileType::XLS, ".xls"),
	(FileType::BZF, ".bzf"),
	(FileType::ADV, ".adv"),
	(FileType::JSON, ".json"),
	(FileType::TlkExpert, ".tlk_expert"),
	(FileType::TlkMobile, ".tlk_mobile"),
	(FileType::TlkTouch, ".tlk_touch"),
	(FileType::OTF, ".otf"),
	(FileType::PAR, ".par"),
	(FileType::XWB, ".xwb"),
	(FileType::XSB, ".xsb"),
	(FileType::XDS, ".xds"),
	(FileType::WND, ".wnd"),
	(FileType::XEOSITEX, ".xeositex"),
	(FileType::WBM, ".wbm"),
];

/// Hash algorithms HERF-style archives may use to store a lowercased
/// extension as a 64-bit hash instead of the extension text itself.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HashAlgorithm
{
	/// FNV-1a, 64-bit.
	Fnv64,
	/// DJB2 (Bernstein hash), widened to 64 bits.
	Djb2,
}

impl HashAlgorithm
{
	fn hash(self, text: &str) -> u64
	{
		return self.hash_text(text);
	}

	/// Hash arbitrary text (e.g. a HERF resource's full "name.ext" string),
	/// not just an extension.
	pub fn hash_text(self, text: &str) -> u64
	{
		return match self
		{
			HashAlgorithm::Fnv64 => fnv1a64(text.as_bytes()),
			HashAlgorithm::Djb2 => djb2_64(text.as_bytes()),
		};
	}
}

fn fnv1a64(bytes: &[u8]) -> u64
{
	const OFFSET_BASIS: u64 = 0xcbf29ce484222325;
	const PRIME: u64 = 0x100000001b3;

	let mut hash = OFFSET_BASIS;
	for &byte in bytes
	{
		hash ^= byte as u64;
		hash = hash.wrapping_mul(PRIME);
	}
	return hash;
}

fn djb2_64(bytes: &[u8]) -> u64
{
	let mut hash: u64 = 5381;
	for &byte in bytes
	{
		hash = hash.wrapping_mul(33).wrapping_add(byte as u64);
	}
	return hash;
}

/// A process-wide-shaped registry over `FILE_TYPE_TABLE`, plus a runtime
/// alias map for resolving numeric-ID collisions between games (§4.3). Not a
/// global singleton (§9: "pass these as explicit context objects") — an
/// engine layer owns one instance and threads it through.
#[derive(Default)]
pub struct FileTypeManager
{
	extensionLookup: OnceLock<HashMap<String, FileType>>,
	typeLookup: OnceLock<HashMap<i32, FileType>>,
	hashLookups: Mutex<HashMap<HashAlgorithm, HashMap<u64, FileType>>>,
	aliases: Mutex<HashMap<String, FileType>>,
}

impl FileTypeManager
{
	pub fn new() -> Self
	{
		return Self::default();
	}

	fn extension_lookup(&self) -> &HashMap<String, FileType>
	{
		return self.extensionLookup.get_or_init(|| {
			let mut map = HashMap::with_capacity(FILE_TYPE_TABLE.len());
			for &(fileType, extension) in FILE_TYPE_TABLE
			{
				if !extension.is_empty()
				{
					map.insert(extension.trim_start_matches('.').to_ascii_lowercase(), fileType);
				}
			}
			map
		});
	}

	fn type_lookup(&self) -> &HashMap<i32, FileType>
	{
		return self.typeLookup.get_or_init(|| {
			let mut map = HashMap::with_capacity(FILE_TYPE_TABLE.len());
			for &(fileType, _) in FILE_TYPE_TABLE
			{
				map.insert(fileType.id(), fileType);
			}
			map
		});
	}

	/// `path` → `FileType`, via the extension after the last `.`, lowercased.
	/// Aliases registered with `add_type_alias` are consulted first.
	pub fn type_from_path(&self, path: impl AsRef<Path>) -> FileType
	{
		let extension = match path.as_ref().extension().and_then(|e| e.to_str())
		{
			Some(extension) => extension.to_ascii_lowercase(),
			None => return FileType::None,
		};

		if let Some(aliased) = self.aliases.lock().unwrap().get(&extension)
		{
			return *aliased;
		}

		return self.extension_lookup().get(&extension).copied().unwrap_or(FileType::None);
	}

	/// `FileType` → canonical extension, with the leading `.` (empty for `None`).
	pub fn extension_for(&self, fileType: FileType) -> &'static str
	{
		let id = fileType.id();
		for &(candidate, extension) in FILE_TYPE_TABLE.iter().rev()
		{
			if candidate.id() == id
			{
				return extension;
			}
		}
		return "";
	}

	/// ID → `FileType`, as stored numerically inside KEY/ERF/RIM archives.
	pub fn type_from_id(&self, id: i32) -> FileType
	{
		return self.type_lookup().get(&id).copied().unwrap_or(FileType::None);
	}

	/// Resolve a HERF-style 64-bit hashed extension to a `FileType`, caching
	/// the `hash -> FileType` map for `algorithm` on first use.
	pub fn type_from_hashed_extension(&self, algorithm: HashAlgorithm, hashedExtension: u64) -> FileType
	{
		let mut lookups = self.hashLookups.lock().unwrap();
		let map = lookups.entry(algorithm).or_insert_with(|| {
			let mut map = HashMap::with_capacity(FILE_TYPE_TABLE.len());
			for &(fileType, extension) in FILE_TYPE_TABLE
			{
				let bare = extension.trim_start_matches('.');
				if !bare.is_empty()
				{
					map.insert(algorithm.hash(bare), fileType);
				}
			}
			map
		});

		return map.get(&hashedExtension).copied().unwrap_or(FileType::None);
	}

	/// Replace `path`'s extension with `fileType`'s canonical one.
	pub fn set_file_type(&self, path: impl AsRef<Path>, fileType: FileType) -> PathBuf
	{
		let extension = self.extension_for(fileType).trim_start_matches('.');
		let mut out = path.as_ref().to_path_buf();
		out.set_extension(extension);
		return out;
	}

	/// Append `fileType`'s canonical extension to `path` (which has none yet).
	pub fn add_file_type(&self, path: impl AsRef<Path>, fileType: FileType) -> PathBuf
	{
		let extension = self.extension_for(fileType);
		let mut out = path.as_ref().as_os_str().to_owned();
		out.push(extension);
		return PathBuf::from(out);
	}

	/// Overlay `from`'s extension resolution onto `to`, for games that reuse a
	/// numeric ID for something else. Subsequent `type_from_path` calls whose
	/// extension matches `from`'s return `to` instead.
	pub fn add_type_alias(&self, from: FileType, to: FileType)
	{
		let extension = self.extension_for(from).trim_start_matches('.').to_ascii_lowercase();
		if !extension.is_empty()
		{
			self.aliases.lock().unwrap().insert(extension, to);
		}
	}
}

#[cfg(test)]
mod tests
{
	use super::*;

	#[test]
	fn resolvesPathToFileTypeCaseInsensitively()
	{
		let manager = FileTypeManager::new();
		assert_eq!(FileType::DLG, manager.type_from_path("conversation.DLG"));
		assert_eq!(FileType::ARE, manager.type_from_path("area01.are"));
	}

	#[test]
	fn roundTripsAddFileTypeThroughGetFileType()
	{
		let manager = FileTypeManager::new();
		let tagged = manager.add_file_type(Path::new("foo"), FileType::DLG);
		assert_eq!(FileType::DLG, manager.type_from_path(&tagged));
	}

	#[test]
	fn setFileTypeReplacesExistingExtension()
	{
		let manager = FileTypeManager::new();
		let replaced = manager.set_file_type(Path::new("foo.dlg"), FileType::ARE);
		assert_eq!(FileType::ARE, manager.type_from_path(&replaced));
	}

	#[test]
	fn unknownExtensionResolvesToNone()
	{
		let manager = FileTypeManager::new();
		assert_eq!(FileType::None, manager.type_from_path("mystery.zzqzq"));
	}

	#[test]
	fn idRoundTripsThroughTypeFromId()
	{
		let manager = FileTypeManager::new();
		assert_eq!(FileType::DLG, manager.type_from_id(2029));
		assert_eq!(FileType::None, manager.type_from_id(-1));
	}

	#[test]
	fn typeAliasOverlaysOneIdOntoAnother()
	{
		let manager = FileTypeManager::new();
		manager.add_type_alias(FileType::BTI, FileType::UTI);
		assert_eq!(FileType::UTI, manager.type_from_path("item.bti"));
	}

	#[test]
	fn hashedExtensionLookupIsCachedAndStable()
	{
		let manager = FileTypeManager::new();
		let hash = fnv1a64(b"dlg");
		assert_eq!(FileType::DLG, manager.type_from_hashed_extension(HashAlgorithm::Fnv64, hash));
		// second query hits the cached map and must agree
		assert_eq!(FileType::DLG, manager.type_from_hashed_extension(HashAlgorithm::Fnv64, hash));
	}

	#[test]
	fn maxArchiveIdSeparatesArchiveFromLooseOnlyTypes()
	{
		assert!(FileType::DLG.is_archive_type());
		assert!(!FileType::EXE.is_archive_type());
	}

	#[test]
	fn everyVariantAppearsInFileTypeTable()
	{
		use strum::IntoEnumIterator;

		for variant in FileType::iter()
		{
			assert!(
				FILE_TYPE_TABLE.iter().any(|&(candidate, _)| candidate.id() == variant.id()),
				"{variant:?} (id {}) has no FILE_TYPE_TABLE row", variant.id()
			);
		}
	}
}
