#![allow(non_snake_case, non_upper_case_globals)]

//! Resource-access core for a BioWare Aurora-family engine reimplementation.
//!
//! Dependency order, leaves first (spec.md §2): [`io`] (byte streams,
//! endianness, strings, FourCC tags) and [`compress`] underpin everything;
//! [`filetype`] is the static type taxonomy; [`archive`] holds the six
//! container-format readers plus the ERF/TheWitcherSave writers; [`gff3`] and
//! [`gff4`] are the structured-record readers; [`resource`] is the
//! process-wide prioritized registry tying archives and loose directories
//! together into one `(ResRef, FileType)` lookup.

pub mod archive;
pub mod compress;
pub mod error;
pub mod filetype;
pub mod gff3;
pub mod gff4;
pub mod io;
pub mod resource;
pub mod resref;

pub use archive::{Archive, ArchiveHandle, Resource};
pub use error::{CoreError, Result};
pub use filetype::{FileType, FileTypeManager};
pub use gff3::Gff3File;
pub use gff4::Gff4File;
pub use resource::{ChangeId, ResourceManager};
pub use resref::ResRef;
