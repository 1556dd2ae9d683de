//! Where datasets come from.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::PathBuf;

use log::debug;

use super::error::LoadError;
use super::loader::Table;

/// Supplies named text datasets to the loader.
///
/// `Ok(None)` means the dataset is absent, which the caller decides is fatal
/// (required datasets) or not (subsystem datasets). A dataset that exists but
/// cannot be read is an error, never absent.
pub trait DataSource {
	/// Read the dataset called `name`, or `None` if it is missing or empty.
	fn read(&self, name: &str) -> Result<Option<Table>, LoadError>;
}

/// Reads datasets relative to a base directory.
#[derive(Clone, Debug)]
pub struct FsSource {
	base: PathBuf,
}

impl FsSource {
	/// Serve files from `base`.
	pub fn new(base: impl Into<PathBuf>) -> Self {
		Self { base: base.into() }
	}
}

impl DataSource for FsSource {
	fn read(&self, name: &str) -> Result<Option<Table>, LoadError> {
		let path = self.base.join(name);
		match std::fs::read_to_string(&path) {
			Ok(text) => {
				debug!("read {} bytes from {}", text.len(), path.display());
				Ok(Table::new(name, text))
			}
			Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
			Err(err) => Err(LoadError::Unreadable {
				dataset: name.to_owned(),
				message: format!("{}: {err}", path.display()),
			}),
		}
	}
}

/// Datasets compiled into the binary, keyed by name.
#[derive(Clone, Debug, Default)]
pub struct EmbeddedSource {
	files: HashMap<String, &'static str>,
}

impl EmbeddedSource {
	/// An empty source.
	pub fn new() -> Self {
		Self::default()
	}

	/// Register `text` under `name`.
	pub fn with(mut self, name: impl Into<String>, text: &'static str) -> Self {
		self.files.insert(name.into(), text);
		self
	}
}

impl DataSource for EmbeddedSource {
	fn read(&self, name: &str) -> Result<Option<Table>, LoadError> {
		Ok(self
			.files
			.get(name)
			.and_then(|text| Table::new(name, (*text).to_owned())))
	}
}
