//! Delimited text tables: columns, float rows and matrices.
//!
//! Blank lines are skipped everywhere, so row `n` is the `n`-th non-blank
//! line. Line numbers in errors are 1-based positions in the raw text.

use log::debug;

use super::error::LoadError;

/// Characters removed from raw structure identifiers.
const SEPARATORS: &[char] = &['_', '-'];

/// How to post-process a string column.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ColumnFormat {
	/// Trimmed text, escaped newlines expanded.
	#[default]
	Plain,
	/// Raw structure identifier turned into a display name.
	StructureName,
}

/// A named blob of delimited text.
#[derive(Clone, Debug, PartialEq)]
pub struct Table {
	name: String,
	text: String,
}

impl Table {
	/// Wrap `text`. Returns `None` when it holds nothing but whitespace.
	pub fn new(name: impl Into<String>, text: impl Into<String>) -> Option<Self> {
		let text = text.into();
		if text.trim().is_empty() {
			return None;
		}
		Some(Self {
			name: name.into(),
			text,
		})
	}

	/// Dataset name used in diagnostics.
	pub fn name(&self) -> &str {
		&self.name
	}

	fn rows(&self) -> impl Iterator<Item = (usize, &str)> {
		self.text
			.lines()
			.enumerate()
			.filter(|(_, line)| !line.trim().is_empty())
			.map(|(i, line)| (i + 1, line))
	}

	/// Number of non-blank rows.
	pub fn row_count(&self) -> usize {
		self.rows().count()
	}

	/// One trimmed field per row.
	pub fn column(
		&self,
		column: usize,
		delimiter: char,
		format: ColumnFormat,
	) -> Result<Vec<String>, LoadError> {
		let values = self
			.rows()
			.map(|(line, text)| {
				let field = text
					.split(delimiter)
					.nth(column)
					.ok_or_else(|| LoadError::MissingColumn {
						dataset: self.name.clone(),
						line,
						column,
					})?
					.trim();
				Ok(match format {
					ColumnFormat::Plain => expand_newlines(field),
					ColumnFormat::StructureName => structure_name(&expand_newlines(field)),
				})
			})
			.collect::<Result<Vec<_>, _>>()?;
		debug!("{}: loaded column {column} ({} rows)", self.name, values.len());
		Ok(values)
	}

	/// Parse row `row` as floats.
	pub fn float_row(&self, row: usize, delimiter: char) -> Result<Vec<f64>, LoadError> {
		let rows = self.row_count();
		let (line, text) = self.rows().nth(row).ok_or_else(|| LoadError::MissingRow {
			dataset: self.name.clone(),
			row,
			rows,
		})?;
		self.parse_floats(line, text, delimiter)
	}

	/// Every row parsed as floats. Rows may differ in length.
	pub fn float_matrix(&self, delimiter: char) -> Result<Vec<Vec<f64>>, LoadError> {
		let matrix = self
			.rows()
			.map(|(line, text)| self.parse_floats(line, text, delimiter))
			.collect::<Result<Vec<_>, _>>()?;
		debug!("{}: loaded {} numeric rows", self.name, matrix.len());
		Ok(matrix)
	}

	/// Every row split into trimmed fields. Rows may differ in length.
	pub fn string_matrix(&self, delimiter: char) -> Vec<Vec<String>> {
		self.rows()
			.map(|(_, text)| {
				split_fields(text, delimiter)
					.map(expand_newlines)
					.collect()
			})
			.collect()
	}

	/// Every row parsed as floats, each exactly `width` entries long.
	pub fn float_matrix_of_width(
		&self,
		delimiter: char,
		width: usize,
	) -> Result<Vec<Vec<f64>>, LoadError> {
		self.rows()
			.map(|(line, text)| {
				let row = self.parse_floats(line, text, delimiter)?;
				self.check_width(line, row.len(), width)?;
				Ok(row)
			})
			.collect()
	}

	/// Every row split into trimmed fields, each exactly `width` long.
	pub fn string_matrix_of_width(
		&self,
		delimiter: char,
		width: usize,
	) -> Result<Vec<Vec<String>>, LoadError> {
		self.rows()
			.map(|(line, text)| {
				let row: Vec<String> = split_fields(text, delimiter).map(expand_newlines).collect();
				self.check_width(line, row.len(), width)?;
				Ok(row)
			})
			.collect()
	}

	fn check_width(&self, line: usize, found: usize, expected: usize) -> Result<(), LoadError> {
		if found == expected {
			return Ok(());
		}
		Err(LoadError::RowLength {
			dataset: self.name.clone(),
			line,
			expected,
			found,
		})
	}

	fn parse_floats(&self, line: usize, text: &str, delimiter: char) -> Result<Vec<f64>, LoadError> {
		let mut tokens: Vec<&str> = split_fields(text, delimiter).collect();
		// tolerate a trailing delimiter
		if tokens.len() > 1 && tokens.last() == Some(&"") {
			tokens.pop();
		}
		tokens
			.into_iter()
			.map(|token| {
				token.parse::<f64>().map_err(|_| LoadError::InvalidNumber {
					dataset: self.name.clone(),
					line,
					token: token.to_owned(),
				})
			})
			.collect()
	}
}

fn split_fields(text: &str, delimiter: char) -> impl Iterator<Item = &str> {
	text.split(delimiter).map(str::trim)
}

/// Replace two-character `\n` markers with real line breaks.
pub fn expand_newlines(text: &str) -> String {
	text.replace("\\n", "\n")
}

/// Turn a raw identifier such as `Superior_Temporal_Gyrus_L` into
/// `Superior Temporal Gyrus (Left)`.
pub fn structure_name(raw: &str) -> String {
	let tokens: Vec<&str> = raw.split(SEPARATORS).filter(|t| !t.is_empty()).collect();
	match tokens.split_last() {
		Some((&"R", rest)) if !rest.is_empty() => format!("{} (Right)", rest.join(" ")),
		Some((&"L", rest)) if !rest.is_empty() => format!("{} (Left)", rest.join(" ")),
		_ => tokens.join(" "),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn table(text: &str) -> Table {
		Table::new("test.txt", text).unwrap()
	}

	#[test]
	fn structure_names_get_side_suffix() {
		assert_eq!(structure_name("Superior_Temporal_Gyrus_L"), "Superior Temporal Gyrus (Left)");
		assert_eq!(structure_name("Caudate-R"), "Caudate (Right)");
		assert_eq!(structure_name("Brain_Stem"), "Brain Stem");
		// a lone marker is a name, not a side
		assert_eq!(structure_name("L"), "L");
		assert_eq!(structure_name("Lateral_LR"), "Lateral LR");
	}

	#[test]
	fn column_selects_trims_and_formats() {
		let t = table("Amygdala_L | Fear\\nmemory\n\nAmygdala_R|Fear\n");
		let names = t.column(0, '|', ColumnFormat::StructureName).unwrap();
		assert_eq!(names, vec!["Amygdala (Left)", "Amygdala (Right)"]);
		let descriptions = t.column(1, '|', ColumnFormat::Plain).unwrap();
		assert_eq!(descriptions, vec!["Fear\nmemory", "Fear"]);
	}

	#[test]
	fn missing_column_reports_line() {
		let t = table("a|b\n\nc\n");
		let err = t.column(1, '|', ColumnFormat::Plain).unwrap_err();
		assert_eq!(
			err,
			LoadError::MissingColumn {
				dataset: "test.txt".into(),
				line: 3,
				column: 1
			}
		);
	}

	#[test]
	fn float_row_rejects_non_numeric_tokens() {
		let t = table("1,2,3\n4,five,6\n");
		assert_eq!(t.float_row(0, ',').unwrap(), vec![1.0, 2.0, 3.0]);
		let err = t.float_row(1, ',').unwrap_err();
		assert!(matches!(err, LoadError::InvalidNumber { line: 2, ref token, .. } if token == "five"));
		assert!(matches!(t.float_row(2, ','), Err(LoadError::MissingRow { rows: 2, .. })));
	}

	#[test]
	fn ragged_matrices_keep_row_lengths() {
		let t = table("1,2,3,\n4,5\n");
		let m = t.float_matrix(',').unwrap();
		assert_eq!(m, vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0]]);
	}

	#[test]
	fn short_row_reports_raw_line() {
		let t = table("0,1\n\n1\n");
		assert_eq!(
			t.float_matrix_of_width(',', 2).unwrap_err(),
			LoadError::RowLength {
				dataset: "test.txt".into(),
				line: 3,
				expected: 2,
				found: 1
			}
		);
		// a trailing delimiter does not count as an entry
		assert!(table("1,2,\n3,4\n").float_matrix_of_width(',', 2).is_ok());

		let err = table("a|b\n\n\nc\n").string_matrix_of_width('|', 2).unwrap_err();
		assert!(matches!(err, LoadError::RowLength { line: 4, found: 1, .. }));
	}

	#[test]
	fn string_matrix_expands_newlines() {
		let t = table("|a\\nb\nc|\n");
		assert_eq!(
			t.string_matrix('|'),
			vec![
				vec![String::new(), "a\nb".to_string()],
				vec!["c".to_string(), String::new()]
			]
		);
	}

	#[test]
	fn blank_text_is_absent() {
		assert!(Table::new("empty", "\n \n").is_none());
	}
}
