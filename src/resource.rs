#![allow(non_snake_case, non_upper_case_globals)]

//! The resource manager: a process-wide (but not process-global — see §9's
//! design notes on singletons) registry that unifies loose directories and
//! archives into one priority-ordered `(ResRef, FileType) -> bytes` lookup.
//!
//! Grounded on the teacher's `resource::ResourceManager`
//! (`examples/nemesisx00-infinity-engine-parser/src/resource.rs`): the shape
//! — a struct holding cached sources behind interior mutability, with lookups
//! that walk a key table before touching an archive — carries over. What
//! doesn't carry over is the teacher's install-path discovery (`Games`,
//! `FindInstallationPath`): this crate's caller always supplies an explicit
//! path (SPEC_FULL.md §4.7), so there is no per-game cache keyed by `Games`,
//! only a flat registry keyed by `(ResRef, FileType)`. Priority and
//! `ChangeID`-scoped deregistration have no teacher counterpart; those follow
//! spec.md §4.7/§8 directly.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};

use crate::archive::{Archive, ArchiveHandle};
use crate::error::CoreError;
use crate::filetype::{FileType, FileTypeManager};
use crate::io::stream::{open_file, ByteStream};
use crate::resref::ResRef;

/// A token identifying one registration call. Deregistering a `ChangeId`
/// removes exactly the entries added under it (spec.md §3's manager
/// invariants) and, if it named an archive, disposes that archive.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct ChangeId(u64);

#[derive(Clone)]
enum Source
{
	LooseFile
	{
		path: PathBuf,
		size: u64,
	},
	ArchiveEntry
	{
		archive: Arc<ArchiveHandle>,
		index: u32,
	},
}

#[derive(Clone)]
struct Entry
{
	r#type: FileType,
	priority: u32,
	source: Source,
	changeId: ChangeId,
}

#[derive(Default)]
struct Registry
{
	/// Every key's candidates, in registration order. Lookup picks the
	/// highest-priority candidate, preferring the most recently pushed one on
	/// ties (§5: "if two resources share the same key and same priority, the
	/// lookup returns the *last* one registered").
	entries: HashMap<(String, FileType), Vec<Entry>>,
	/// Archives this manager owns, kept alive only as long as at least one of
	/// their entries is still registered. Disposed (dropped) from `deindex`
	/// once the last entry referencing them is removed.
	archives: HashMap<ChangeId, Arc<ArchiveHandle>>,
}

impl Registry
{
	fn bestIndex(candidates: &[Entry]) -> Option<usize>
	{
		let mut best: Option<usize> = None;
		for (i, candidate) in candidates.iter().enumerate()
		{
			let isBetter = match best
			{
				None => true,
				Some(b) => candidate.priority >= candidates[b].priority,
			};
			if isBetter
			{
				best = Some(i);
			}
		}
		return best;
	}
}

/// The prioritized registry unifying archives and loose directories behind
/// one `(ResRef, FileType)` lookup.
///
/// Readers (`has_resource`, `get_resource`, `get_resource_size`) take a
/// shared lock; mutators (`index_directory`, `index_archive`, `deindex`,
/// `clear`) take an exclusive one (§5's recommended policy).
pub struct ResourceManager
{
	registry: RwLock<Registry>,
	nextChangeId: AtomicU64,
}

impl Default for ResourceManager
{
	fn default() -> Self
	{
		return Self::new();
	}
}

impl ResourceManager
{
	pub fn new() -> Self
	{
		return Self { registry: RwLock::new(Registry::default()), nextChangeId: AtomicU64::new(1) };
	}

	fn allocateChangeId(&self) -> ChangeId
	{
		return ChangeId(self.nextChangeId.fetch_add(1, Ordering::Relaxed));
	}

	/// Scan `path` for loose files and register each as a resource keyed by
	/// its filename stem and `typeManager`-derived type. `recurseDepth == 0`
	/// visits only `path` itself; negative means unlimited recursion.
	pub fn index_directory(&self, path: impl AsRef<Path>, recurseDepth: i32, priority: u32, typeManager: &FileTypeManager) -> Result<ChangeId, CoreError>
	{
		let path = path.as_ref();
		let changeId = self.allocateChangeId();

		let mut added: Vec<((String, FileType), Entry)> = Vec::new();
		self.collectLooseFiles(path, recurseDepth, priority, typeManager, changeId, &mut added)?;

		let mut registry = self.registry.write().expect("resource manager registry poisoned");
		for (key, entry) in added
		{
			registry.entries.entry(key).or_default().push(entry);
		}
		return Ok(changeId);
	}

	fn collectLooseFiles(
		&self,
		dir: &Path,
		recurseDepth: i32,
		priority: u32,
		typeManager: &FileTypeManager,
		changeId: ChangeId,
		out: &mut Vec<((String, FileType), Entry)>,
	) -> Result<(), CoreError>
	{
		let readDir = fs::read_dir(dir).map_err(|e| CoreError::io(dir, e))?;
		for entry in readDir
		{
			let entry = entry.map_err(|e| CoreError::io(dir, e))?;
			let entryPath = entry.path();
			let metadata = entry.metadata().map_err(|e| CoreError::io(&entryPath, e))?;

			if metadata.is_dir()
			{
				if recurseDepth != 0
				{
					self.collectLooseFiles(&entryPath, recurseDepth - 1, priority, typeManager, changeId, out)?;
				}
				continue;
			}

			let r#type = typeManager.type_from_path(&entryPath);
			let stem = entryPath.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
			let resref = ResRef::new(stem);
			let key = (resref.as_str().to_owned(), r#type);

			out.push((key, Entry {
				r#type,
				priority,
				source: Source::LooseFile { path: entryPath, size: metadata.len() },
				changeId,
			}));
		}
		return Ok(());
	}

	/// Register every resource an already-opened archive exposes. The caller
	/// opens the archive (via `ArchiveHandle::open_*`, choosing the format);
	/// the manager takes ownership from there and disposes it on `deindex`.
	pub fn index_archive(&self, archive: ArchiveHandle, priority: u32) -> ChangeId
	{
		let changeId = self.allocateChangeId();
		let archive = Arc::new(archive);

		let mut registry = self.registry.write().expect("resource manager registry poisoned");
		for resource in archive.resources()
		{
			let key = (resource.name.as_str().to_owned(), resource.r#type);
			registry.entries.entry(key).or_default().push(Entry {
				r#type: resource.r#type,
				priority,
				source: Source::ArchiveEntry { archive: Arc::clone(&archive), index: resource.index },
				changeId,
			});
		}
		registry.archives.insert(changeId, archive);
		return changeId;
	}

	pub fn has_resource(&self, name: &ResRef, r#type: FileType) -> bool
	{
		let registry = self.registry.read().expect("resource manager registry poisoned");
		let key = (name.as_str().to_owned(), r#type);
		return registry.entries.get(&key).map_or(false, |v| !v.is_empty());
	}

	pub fn has_resource_any(&self, name: &ResRef, types: &[FileType]) -> bool
	{
		return types.iter().any(|t| self.has_resource(name, *t));
	}

	/// Resolve `(name, type)` to the highest-priority registered entry and
	/// return a fresh, independently seekable stream over its bytes. `Ok(None)`
	/// means no entry is registered for the key — a normal outcome, not an
	/// error (§7's propagation policy). An `Err` means a matching entry was
	/// found but fetching its bytes failed.
	pub fn get_resource(&self, name: &ResRef, r#type: FileType) -> Result<Option<ByteStream>, CoreError>
	{
		let entry = {
			let registry = self.registry.read().expect("resource manager registry poisoned");
			let key = (name.as_str().to_owned(), r#type);
			match registry.entries.get(&key).and_then(|candidates| Registry::bestIndex(candidates).map(|i| candidates[i].clone()))
			{
				Some(e) => e,
				None => return Ok(None),
			}
		};

		return Ok(Some(Self::fetch(&entry)?));
	}

	/// As `get_resource`, but tries each type in `types` in order and returns
	/// the first that resolves, alongside the type it matched under.
	pub fn get_resource_any(&self, name: &ResRef, types: &[FileType]) -> Result<Option<(ByteStream, FileType)>, CoreError>
	{
		for &r#type in types
		{
			if let Some(stream) = self.get_resource(name, r#type)?
			{
				return Ok(Some((stream, r#type)));
			}
		}
		return Ok(None);
	}

	pub fn get_resource_size(&self, name: &ResRef, r#type: FileType) -> Result<Option<u64>, CoreError>
	{
		let entry = {
			let registry = self.registry.read().expect("resource manager registry poisoned");
			let key = (name.as_str().to_owned(), r#type);
			match registry.entries.get(&key).and_then(|candidates| Registry::bestIndex(candidates).map(|i| candidates[i].clone()))
			{
				Some(e) => e,
				None => return Ok(None),
			}
		};

		return match &entry.source
		{
			Source::LooseFile { size, .. } => Ok(Some(*size)),
			Source::ArchiveEntry { archive, index } => Ok(Some(archive.resource_size(*index)?)),
		};
	}

	fn fetch(entry: &Entry) -> Result<ByteStream, CoreError>
	{
		return match &entry.source
		{
			Source::LooseFile { path, .. } => open_file(path),
			Source::ArchiveEntry { archive, index } => archive.resource(*index, true),
		};
	}

	/// Remove every entry registered under `changeId`, disposing the backing
	/// archive (if any) once no entry referencing it remains.
	pub fn deindex(&self, changeId: ChangeId)
	{
		let mut registry = self.registry.write().expect("resource manager registry poisoned");

		let mut emptyKeys = Vec::new();
		for (key, candidates) in registry.entries.iter_mut()
		{
			candidates.retain(|e| e.changeId != changeId);
			if candidates.is_empty()
			{
				emptyKeys.push(key.clone());
			}
		}
		for key in emptyKeys
		{
			registry.entries.remove(&key);
		}

		registry.archives.remove(&changeId);
	}

	/// Remove every registered entry and dispose every owned archive.
	pub fn clear(&self)
	{
		let mut registry = self.registry.write().expect("resource manager registry poisoned");
		registry.entries.clear();
		registry.archives.clear();
	}
}

#[cfg(test)]
mod tests
{
	use super::*;
	use std::io::Read as _;

	fn writeFile(dir: &Path, name: &str, bytes: &[u8])
	{
		fs::write(dir.join(name), bytes).unwrap();
	}

	fn tempDir(tag: &str) -> PathBuf
	{
		let dir = std::env::temp_dir().join(format!("aurora-core-resman-{tag}-{:?}", std::thread::current().id()));
		fs::create_dir_all(&dir).unwrap();
		return dir;
	}

	/// Scenario B (priority override) minus the archive half: a higher
	/// priority loose registration shadows a lower one, and deindexing it
	/// restores the original.
	#[test]
	fn higherPriorityLooseFileShadowsLower()
	{
		let typeManager = FileTypeManager::new();
		let manager = ResourceManager::new();

		let baseDir = tempDir("base");
		writeFile(&baseDir, "foo.dlg", b"X");
		let baseChange = manager.index_directory(&baseDir, 0, 100, &typeManager).unwrap();

		let overrideDir = tempDir("override");
		writeFile(&overrideDir, "foo.dlg", b"Y");
		let overrideChange = manager.index_directory(&overrideDir, 0, 200, &typeManager).unwrap();

		let name = ResRef::new("foo");
		let mut stream = manager.get_resource(&name, FileType::DLG).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"Y".to_vec(), bytes);

		manager.deindex(overrideChange);
		let mut stream = manager.get_resource(&name, FileType::DLG).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"X".to_vec(), bytes);

		manager.deindex(baseChange);
		assert!(!manager.has_resource(&name, FileType::DLG));

		fs::remove_dir_all(&baseDir).ok();
		fs::remove_dir_all(&overrideDir).ok();
	}

	#[test]
	fn lastRegisteredWinsOnEqualPriority()
	{
		let typeManager = FileTypeManager::new();
		let manager = ResourceManager::new();

		let firstDir = tempDir("equal-a");
		writeFile(&firstDir, "foo.txt", b"first");
		manager.index_directory(&firstDir, 0, 50, &typeManager).unwrap();

		let secondDir = tempDir("equal-b");
		writeFile(&secondDir, "foo.txt", b"second");
		manager.index_directory(&secondDir, 0, 50, &typeManager).unwrap();

		let name = ResRef::new("foo");
		let mut stream = manager.get_resource(&name, FileType::TXT).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"second".to_vec(), bytes);

		fs::remove_dir_all(&firstDir).ok();
		fs::remove_dir_all(&secondDir).ok();
	}

	#[test]
	fn deindexReusesPrioritiesWithoutAmbiguity()
	{
		let typeManager = FileTypeManager::new();
		let manager = ResourceManager::new();

		let dir = tempDir("reuse");
		writeFile(&dir, "foo.txt", b"one");
		let change = manager.index_directory(&dir, 0, 10, &typeManager).unwrap();
		manager.deindex(change);

		let dir2 = tempDir("reuse2");
		writeFile(&dir2, "foo.txt", b"two");
		manager.index_directory(&dir2, 0, 10, &typeManager).unwrap();

		let name = ResRef::new("foo");
		let mut stream = manager.get_resource(&name, FileType::TXT).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"two".to_vec(), bytes);

		fs::remove_dir_all(&dir).ok();
		fs::remove_dir_all(&dir2).ok();
	}

	fn writeErfV10(path: &Path, entries: &[(&str, FileType, &[u8])])
	{
		let headerSize = 160u32;
		let keyTableOffset = headerSize;
		let keySize = 24u32;
		let resourceTableOffset = keyTableOffset + entries.len() as u32 * keySize;
		let dataOffset = resourceTableOffset + entries.len() as u32 * 8;

		let mut buffer = Vec::new();
		buffer.extend_from_slice(b"ERF ");
		buffer.extend_from_slice(b"V1.0");
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&(entries.len() as u32).to_le_bytes());
		buffer.extend_from_slice(&headerSize.to_le_bytes());
		buffer.extend_from_slice(&keyTableOffset.to_le_bytes());
		buffer.extend_from_slice(&resourceTableOffset.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
		buffer.extend_from_slice(&0u32.to_le_bytes());
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

		fs::write(path, buffer).unwrap();
	}

	/// Scenario B in full: a loose-file base registration is shadowed by a
	/// higher-priority archive registration, and deindexing the archive's
	/// `ChangeId` both restores the loose entry and disposes the archive.
	#[test]
	fn archiveRegistrationOverridesLooseFileAndDisposesOnDeindex()
	{
		let typeManager = FileTypeManager::new();
		let manager = ResourceManager::new();

		let baseDir = tempDir("archive-base");
		writeFile(&baseDir, "foo.dlg", b"X");
		manager.index_directory(&baseDir, 0, 100, &typeManager).unwrap();

		let archiveDir = tempDir("archive-override");
		let archivePath = archiveDir.join("override.erf");
		writeErfV10(&archivePath, &[("foo", FileType::DLG, b"Y")]);

		let handle = ArchiveHandle::open_erf(&archivePath, &typeManager).unwrap();
		let overrideChange = manager.index_archive(handle, 200);

		let name = ResRef::new("foo");
		let mut stream = manager.get_resource(&name, FileType::DLG).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"Y".to_vec(), bytes);

		manager.deindex(overrideChange);
		assert!(manager.registry.read().unwrap().archives.get(&overrideChange).is_none());

		let mut stream = manager.get_resource(&name, FileType::DLG).unwrap().unwrap();
		let mut bytes = Vec::new();
		stream.read_to_end(&mut bytes).unwrap();
		assert_eq!(b"X".to_vec(), bytes);

		fs::remove_dir_all(&baseDir).ok();
		fs::remove_dir_all(&archiveDir).ok();
	}

	#[test]
	fn missingResourceIsNotAnError()
	{
		let manager = ResourceManager::new();
		let name = ResRef::new("nope");
		assert!(!manager.has_resource(&name, FileType::TXT));
		assert!(manager.get_resource(&name, FileType::TXT).unwrap().is_none());
		assert!(manager.get_resource_size(&name, FileType::TXT).unwrap().is_none());
	}

	#[test]
	fn clearRemovesEverything()
	{
		let typeManager = FileTypeManager::new();
		let manager = ResourceManager::new();

		let dir = tempDir("clear");
		writeFile(&dir, "foo.txt", b"bytes");
		manager.index_directory(&dir, 0, 10, &typeManager).unwrap();

		let name = ResRef::new("foo");
		assert!(manager.has_resource(&name, FileType::TXT));

		manager.clear();
		assert!(!manager.has_resource(&name, FileType::TXT));

		fs::remove_dir_all(&dir).ok();
	}
}
