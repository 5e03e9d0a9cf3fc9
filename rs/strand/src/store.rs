//! Content-addressed cache of assembled segment files.
//!
//! Keys identify a slice of a remote resource; values are temp files holding
//! the assembled payload (initialization section already prepended). Entries
//! live for the process lifetime or until [`BlobStore::purge`]; the files
//! themselves may outlive the process, cleanup is a separate concern.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing::debug;

/// Identifies a cached slice of a resource: the URI's final path component
/// plus the byte range covered. `length: None` means the whole resource.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BytesKey {
	pub name: String,
	pub offset: u64,
	pub length: Option<u64>,
}

impl BytesKey {
	pub fn whole(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			offset: 0,
			length: None,
		}
	}

	pub fn range(name: impl Into<String>, offset: u64, length: u64) -> Self {
		Self {
			name: name.into(),
			offset,
			length: Some(length),
		}
	}

	/// The length as written into blob filenames, `-1` for whole resources.
	pub fn length_label(&self) -> i64 {
		self.length.map(|l| l as i64).unwrap_or(-1)
	}
}

/// Map from [`BytesKey`] to a file written under the temp directory.
pub struct BlobStore {
	root: PathBuf,
	entries: Mutex<HashMap<BytesKey, PathBuf>>,
}

impl BlobStore {
	/// A store writing under the system temporary directory.
	pub fn new() -> Self {
		Self::with_root(std::env::temp_dir())
	}

	pub fn with_root(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			entries: Mutex::new(HashMap::new()),
		}
	}

	pub fn contains(&self, key: &BytesKey) -> bool {
		self.entries.lock().unwrap().contains_key(key)
	}

	pub fn get(&self, key: &BytesKey) -> Option<PathBuf> {
		self.entries.lock().unwrap().get(key).cloned()
	}

	/// Write `data` under `file_name` and record it for `key`.
	///
	/// Returns the existing path without rewriting if the key is already
	/// present.
	pub async fn insert(&self, key: BytesKey, file_name: &str, data: &[u8]) -> std::io::Result<PathBuf> {
		if let Some(existing) = self.get(&key) {
			return Ok(existing);
		}

		let path = self.root.join(file_name);
		tokio::fs::write(&path, data).await?;

		debug!(name = %key.name, bytes = data.len(), path = %path.display(), "stored blob");
		self.entries.lock().unwrap().insert(key, path.clone());
		Ok(path)
	}

	pub fn len(&self) -> usize {
		self.entries.lock().unwrap().len()
	}

	pub fn is_empty(&self) -> bool {
		self.entries.lock().unwrap().is_empty()
	}

	/// Forget every entry and best-effort delete the backing files.
	pub async fn purge(&self) {
		let paths: Vec<PathBuf> = {
			let mut entries = self.entries.lock().unwrap();
			entries.drain().map(|(_, path)| path).collect()
		};

		for path in paths {
			if let Err(err) = tokio::fs::remove_file(&path).await {
				debug!(path = %path.display(), %err, "failed to delete blob");
			}
		}
	}

	pub fn root(&self) -> &Path {
		&self.root
	}
}

impl Default for BlobStore {
	fn default() -> Self {
		Self::new()
	}
}
