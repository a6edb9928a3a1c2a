//! File-based storage backend implementation.
//!
//! Each key is stored as one file. The namespace part of a `namespace:id`
//! key becomes a subdirectory of the configured base path, and the id becomes
//! an escaped file name, so listings can recover the original keys.

use crate::{StorageError, StorageFactory, StorageInterface, StorageRegistry};
use async_trait::async_trait;
use orderdesk_types::{
	ConfigSchema, Field, FieldType, ImplementationRegistry, Schema, ValidationError,
};
use std::path::{Path, PathBuf};
use tokio::fs;

const EXTENSION: &str = "json";

/// File-based storage implementation.
///
/// Writes go to a temporary file first and are renamed into place, so a
/// crash never leaves a half-written record behind.
pub struct FileStorage {
	/// Base directory path for storing files.
	base_path: PathBuf,
}

impl FileStorage {
	/// Creates a new FileStorage instance rooted at `base_path`.
	pub fn new(base_path: PathBuf) -> Self {
		Self { base_path }
	}

	/// Converts a storage key to a file path.
	fn get_file_path(&self, key: &str) -> PathBuf {
		match key.split_once(':') {
			Some((namespace, id)) => self
				.base_path
				.join(escape(namespace))
				.join(format!("{}.{}", escape(id), EXTENSION)),
			None => self.base_path.join(format!("{}.{}", escape(key), EXTENSION)),
		}
	}

	/// Reads the keys stored directly under `dir`, prefixing them with
	/// `namespace:` when reading a namespace directory.
	async fn keys_in(&self, dir: &Path, namespace: Option<&str>) -> Result<Vec<String>, StorageError> {
		let mut entries = match fs::read_dir(dir).await {
			Ok(entries) => entries,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
			Err(e) => return Err(StorageError::Backend(e.to_string())),
		};

		let mut keys = Vec::new();
		while let Some(entry) = entries
			.next_entry()
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?
		{
			let path = entry.path();
			if path.extension() != Some(std::ffi::OsStr::new(EXTENSION)) {
				continue;
			}
			let Some(stem) = path.file_stem().and_then(|s| s.to_str()) else {
				tracing::debug!("Skipping file {:?}: name is not valid UTF-8", path);
				continue;
			};
			let id = unescape(stem);
			keys.push(match namespace {
				Some(ns) => format!("{}:{}", ns, id),
				None => id,
			});
		}
		Ok(keys)
	}
}

/// Escapes characters that are unsafe in file names as `%XX` byte
/// sequences. Control characters are escaped too, since file systems reject
/// a NUL byte in a path.
fn escape(segment: &str) -> String {
	let mut out = String::with_capacity(segment.len());
	for c in segment.chars() {
		match c {
			'%' | '/' | '\\' | ':' => push_escaped(&mut out, c),
			'.' if out.is_empty() => push_escaped(&mut out, c),
			c if c.is_control() => push_escaped(&mut out, c),
			c => out.push(c),
		}
	}
	out
}

fn push_escaped(out: &mut String, c: char) {
	let mut buf = [0u8; 4];
	for byte in c.encode_utf8(&mut buf).bytes() {
		out.push_str(&format!("%{:02X}", byte));
	}
}

fn unescape(segment: &str) -> String {
	let bytes = segment.as_bytes();
	let mut out = Vec::with_capacity(bytes.len());
	let mut i = 0;
	while i < bytes.len() {
		let decoded = (bytes[i] == b'%')
			.then(|| segment.get(i + 1..i + 3))
			.flatten()
			.filter(|hex| hex.bytes().all(|b| b.is_ascii_hexdigit()))
			.and_then(|hex| u8::from_str_radix(hex, 16).ok());
		match decoded {
			Some(byte) => {
				out.push(byte);
				i += 3;
			},
			None => {
				out.push(bytes[i]);
				i += 1;
			},
		}
	}
	String::from_utf8_lossy(&out).into_owned()
}

#[async_trait]
impl StorageInterface for FileStorage {
	async fn get_bytes(&self, key: &str) -> Result<Vec<u8>, StorageError> {
		let path = self.get_file_path(key);

		match fs::read(&path).await {
			Ok(data) => Ok(data),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(StorageError::NotFound),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn set_bytes(&self, key: &str, value: Vec<u8>) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		if let Some(parent) = path.parent() {
			fs::create_dir_all(parent)
				.await
				.map_err(|e| StorageError::Backend(e.to_string()))?;
		}

		let temp_path = path.with_extension("tmp");
		fs::write(&temp_path, value)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		fs::rename(&temp_path, &path)
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))?;

		Ok(())
	}

	async fn delete(&self, key: &str) -> Result<(), StorageError> {
		let path = self.get_file_path(key);

		match fs::remove_file(&path).await {
			Ok(_) => Ok(()),
			Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StorageError::Backend(e.to_string())),
		}
	}

	async fn exists(&self, key: &str) -> Result<bool, StorageError> {
		fs::try_exists(self.get_file_path(key))
			.await
			.map_err(|e| StorageError::Backend(e.to_string()))
	}

	async fn list_keys(&self, prefix: &str) -> Result<Vec<String>, StorageError> {
		let mut keys = match prefix.split_once(':') {
			Some((namespace, _)) => {
				let dir = self.base_path.join(escape(namespace));
				self.keys_in(&dir, Some(namespace)).await?
			},
			None => {
				let mut keys = self.keys_in(&self.base_path, None).await?;
				let mut entries = match fs::read_dir(&self.base_path).await {
					Ok(entries) => entries,
					Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
					Err(e) => return Err(StorageError::Backend(e.to_string())),
				};
				while let Some(entry) = entries
					.next_entry()
					.await
					.map_err(|e| StorageError::Backend(e.to_string()))?
				{
					let path = entry.path();
					if !path.is_dir() {
						continue;
					}
					if let Some(name) = path.file_name().and_then(|s| s.to_str()) {
						let namespace = unescape(name);
						keys.extend(self.keys_in(&path, Some(&namespace)).await?);
					}
				}
				keys
			},
		};
		keys.retain(|key| key.starts_with(prefix));
		keys.sort();
		Ok(keys)
	}

	fn config_schema(&self) -> Box<dyn ConfigSchema> {
		Box::new(FileStorageSchema)
	}
}

/// Configuration schema for FileStorage.
pub struct FileStorageSchema;

impl ConfigSchema for FileStorageSchema {
	fn validate(&self, config: &toml::Value) -> Result<(), ValidationError> {
		let schema = Schema::new(
			vec![],
			vec![Field::new("storage_path", FieldType::String).with_validator(|value| {
				match value.as_str() {
					Some(path) if !path.trim().is_empty() => Ok(()),
					_ => Err("storage_path must not be empty".to_string()),
				}
			})],
		);
		schema.validate(config)
	}
}

/// Factory function to create a storage backend from configuration.
///
/// Configuration parameters:
/// - `storage_path`: Base directory for file storage (default: "./data/storage")
pub fn create_storage(config: &toml::Value) -> Result<Box<dyn StorageInterface>, StorageError> {
	FileStorageSchema
		.validate(config)
		.map_err(|e| StorageError::Configuration(e.to_string()))?;

	let storage_path = config
		.get("storage_path")
		.and_then(|v| v.as_str())
		.unwrap_or("./data/storage");

	tracing::debug!(component = "storage", path = %storage_path, "Using file storage");
	Ok(Box::new(FileStorage::new(PathBuf::from(storage_path))))
}

/// Registry for the file storage implementation.
pub struct Registry;

impl ImplementationRegistry for Registry {
	const NAME: &'static str = "file";
	type Factory = StorageFactory;

	fn factory() -> Self::Factory {
		create_storage
	}
}

impl StorageRegistry for Registry {}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[tokio::test]
	async fn test_basic_operations() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		let key = "orders:5f1c";
		let value = br#"{"id":"5f1c"}"#.to_vec();
		storage.set_bytes(key, value.clone()).await.unwrap();
		assert_eq!(storage.get_bytes(key).await.unwrap(), value);
		assert!(storage.exists(key).await.unwrap());
		assert!(temp_dir.path().join("orders").join("5f1c.json").exists());

		storage.delete(key).await.unwrap();
		assert!(!storage.exists(key).await.unwrap());
		assert!(matches!(
			storage.get_bytes(key).await,
			Err(StorageError::NotFound)
		));
		// Deleting twice is not an error
		storage.delete(key).await.unwrap();
	}

	#[tokio::test]
	async fn test_list_keys_round_trips_escaped_ids() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		for key in ["products:TEA/01", "products:A:B", "orders:1", "products:50%"] {
			storage.set_bytes(key, vec![b'1']).await.unwrap();
		}

		let keys = storage.list_keys("products:").await.unwrap();
		assert_eq!(
			keys,
			vec![
				"products:50%".to_string(),
				"products:A:B".to_string(),
				"products:TEA/01".to_string(),
			]
		);
		assert_eq!(storage.get_bytes("products:TEA/01").await.unwrap(), b"1");

		let all = storage.list_keys("").await.unwrap();
		assert_eq!(all.len(), 4);
	}

	#[tokio::test]
	async fn test_control_characters_are_escaped() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().to_path_buf());

		assert!(matches!(
			storage.get_bytes("orders:a\0b").await,
			Err(StorageError::NotFound)
		));
		assert!(!storage.exists("orders:a\0b").await.unwrap());

		storage.set_bytes("orders:a\0b\tc", vec![b'1']).await.unwrap();
		assert!(temp_dir.path().join("orders").join("a%00b%09c.json").exists());
		assert_eq!(
			storage.list_keys("orders:").await.unwrap(),
			vec!["orders:a\0b\tc".to_string()]
		);
	}

	#[test]
	fn test_escape_round_trip() {
		for id in ["plain", ".hidden", "50%", "a/b\\c:d", "nul\0", "ORD%2F"] {
			assert_eq!(unescape(&escape(id)), id);
		}
		assert_eq!(escape("a\0b"), "a%00b");
	}

	#[tokio::test]
	async fn test_list_keys_on_missing_directory() {
		let temp_dir = TempDir::new().unwrap();
		let storage = FileStorage::new(temp_dir.path().join("not-created-yet"));
		assert!(storage.list_keys("orders:").await.unwrap().is_empty());
	}

	#[test]
	fn test_schema_rejects_blank_path() {
		let config: toml::Value = toml::from_str("storage_path = \"  \"").unwrap();
		assert!(create_storage(&config).is_err());

		let config: toml::Value = toml::from_str("storage_path = \"./data\"").unwrap();
		assert!(create_storage(&config).is_ok());
	}
}
