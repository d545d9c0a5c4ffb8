use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::model::document::TreeDocument;

const JSON_EXTENSION: &str = "json";

/// Reads a whole text file into memory.
pub fn read_text<P: AsRef<Path>>(filename: P) -> Result<String> {
	Ok(fs::read_to_string(filename)?)
}

/// Returns `true` if the path should hold a JSON document.
fn is_json<P: AsRef<Path>>(path: P) -> bool {
	path.as_ref()
		.extension()
		.is_some_and(|extension| extension.eq_ignore_ascii_case(JSON_EXTENSION))
}

/// Writes a document to disk.
///
/// - `.json` files get the pretty JSON encoding
/// - any other extension gets the compact binary encoding
pub fn save_document<P: AsRef<Path>>(document: &TreeDocument, path: P) -> Result<()> {
	let path = path.as_ref();
	let bytes = if is_json(path) {
		document.to_json()?.into_bytes()
	} else {
		document.to_bytes()?
	};
	fs::write(path, &bytes)?;
	debug!("saved {} bytes to {}", bytes.len(), path.display());
	Ok(())
}

/// Reads a document written by [`save_document`].
pub fn load_document<P: AsRef<Path>>(path: P) -> Result<TreeDocument> {
	let path = path.as_ref();
	if is_json(path) {
		TreeDocument::from_json(&fs::read_to_string(path)?)
	} else {
		TreeDocument::from_bytes(&fs::read(path)?)
	}
}

/// Default location of the document learned from `input`: the same file
/// with the JSON extension, so it can be read back by [`load_document`].
///
/// ```
/// use std::path::PathBuf;
/// use rs_markov_core::io::document_path_for;
///
/// let path = document_path_for("corpus/novels.txt").unwrap();
/// assert_eq!(path, PathBuf::from("corpus/novels.json"));
/// ```
///
/// # Errors
/// Returns an [`io::ErrorKind::InvalidInput`] error when `input` names no file.
pub fn document_path_for<P: AsRef<Path>>(input: P) -> Result<PathBuf> {
	let input = input.as_ref();
	if input.file_stem().is_none() {
		return Err(io::Error::new(io::ErrorKind::InvalidInput, "input path has no file name").into());
	}
	Ok(input.with_extension(JSON_EXTENSION))
}
