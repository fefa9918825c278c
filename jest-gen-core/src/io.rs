use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::io;

/// Reads a text file and returns all its lines as a `Vec<String>`.
///
/// - Reads the entire file into memory
/// - Splits on `\n` / `\r\n`
pub fn read_file<P: AsRef<Path>>(filename: P) -> io::Result<Vec<String>> {
	let mut contents = String::new();
	File::open(filename)?.read_to_string(&mut contents)?;
	Ok(contents.lines().map(str::to_owned).collect())
}

/// Appends one line to a text file, creating the file if needed.
///
/// Embedded line breaks are replaced by spaces so that a record always
/// occupies exactly one line.
pub fn append_line<P: AsRef<Path>>(filename: P, line: &str) -> io::Result<()> {
	let mut file = OpenOptions::new().create(true).append(true).open(filename)?;
	let record = line.replace(['\r', '\n'], " ");
	writeln!(file, "{}", record.trim_end())
}

/// Builds an output path based on an input path and a new extension.
///
/// Example:
/// `data/phrases.dat` + `"bin"` → `data/phrases.bin`
pub(crate) fn build_output_path<P: AsRef<Path>>(
	input_path: P,
	output_extension: &str,
) -> io::Result<PathBuf> {
	let input_path = input_path.as_ref();

	let parent = input_path.parent().unwrap_or_else(|| Path::new("."));
	let file_stem = input_path
		.file_stem()
		.ok_or_else(|| io::Error::new(io::ErrorKind::InvalidInput, "Input path has no filename"))?;

	let mut output = PathBuf::from(parent);
	output.push(file_stem);
	output.set_extension(output_extension);

	Ok(output)
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::tempdir;

	#[test]
	fn output_path_swaps_extension() {
		let path = build_output_path("data/phrases.dat", "bin").unwrap();
		assert_eq!(path, PathBuf::from("data/phrases.bin"));
	}

	#[test]
	fn output_path_without_filename_fails() {
		assert!(build_output_path("/", "bin").is_err());
	}

	#[test]
	fn appended_lines_are_read_back_in_order() {
		let dir = tempdir().unwrap();
		let path = dir.path().join("funny.txt");
		append_line(&path, "I ate the moon.").unwrap();
		append_line(&path, "two\nlines").unwrap();

		let lines = read_file(&path).unwrap();
		assert_eq!(lines, vec!["I ate the moon.".to_owned(), "two lines".to_owned()]);
	}
}
