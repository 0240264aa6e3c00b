//! Delimited point table reader.
//!
//! Reads tables of point observations, such as city populations, into a
//! point [`VectorLayer`].
//!
//! # Format
//!
//! ```text
//! # US cities, 2010 census
//! name,lon,lat,pop
//! "Portland, OR",-122.68,45.52,583776
//! Seattle,-122.33,47.61,608660
//! ```
//!
//! The first non-comment line is the header. Lines starting with `#` and
//! blank lines are skipped. The delimiter (comma, tab or semicolon) is taken
//! from the header unless set explicitly. Fields may be wrapped in double
//! quotes; a doubled quote inside a quoted field is a literal quote.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use geo::Point;
use tracing::info;

use crate::crs::Crs;
use crate::error::FormatError;
use crate::vector::{AttributeValue, Feature, VectorLayer};

const CANDIDATE_DELIMITERS: [char; 3] = [',', '\t', ';'];

/// Which columns hold the coordinates, and how to read the table.
#[derive(Debug, Clone, PartialEq)]
pub struct PointTableOptions {
    pub x_column: String,
    pub y_column: String,
    /// Field delimiter; detected from the header when `None`
    pub delimiter: Option<char>,
    /// CRS of the coordinates, attached to the resulting layer
    pub crs: Option<Crs>,
}

impl PointTableOptions {
    pub fn new(x_column: impl Into<String>, y_column: impl Into<String>) -> Self {
        Self {
            x_column: x_column.into(),
            y_column: y_column.into(),
            delimiter: None,
            crs: None,
        }
    }

    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = Some(delimiter);
        self
    }

    pub fn with_crs(mut self, crs: Crs) -> Self {
        self.crs = Some(crs);
        self
    }
}

impl Default for PointTableOptions {
    fn default() -> Self {
        Self::new("lon", "lat")
    }
}

/// Pick the candidate delimiter that occurs most often in the header.
fn detect_delimiter(header: &str) -> char {
    CANDIDATE_DELIMITERS
        .iter()
        .copied()
        .max_by_key(|d| header.matches(*d).count())
        .filter(|d| header.contains(*d))
        .unwrap_or(',')
}

/// Split one line, honouring double-quoted fields.
fn split_fields(line: &str, delimiter: char) -> Result<Vec<String>, String> {
    let mut fields = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.trim().is_empty() => {
                field.clear();
                in_quotes = true;
            }
            c if c == delimiter && !in_quotes => {
                fields.push(field.trim().to_string());
                field.clear();
            }
            c => field.push(c),
        }
    }

    if in_quotes {
        return Err("unterminated quoted field".to_string());
    }
    fields.push(field.trim().to_string());
    Ok(fields)
}

fn parse_attribute(raw: &str) -> AttributeValue {
    if raw.is_empty() {
        return AttributeValue::Null;
    }
    match raw.parse::<f64>() {
        Ok(v) if v.is_finite() => AttributeValue::Number(v),
        _ => AttributeValue::Text(raw.to_string()),
    }
}

/// Read a delimited point table.
///
/// Every row becomes a point feature; columns other than the coordinate
/// columns become attributes, numeric where they parse as numbers.
pub fn read_point_table<P: AsRef<Path>>(
    path: P,
    options: &PointTableOptions,
) -> Result<VectorLayer, FormatError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|e| FormatError::io(path, e))?;
    let reader = BufReader::new(file);

    let mut header: Option<(Vec<String>, char, usize, usize)> = None;
    let mut features = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result.map_err(|e| FormatError::io(path, e))?;
        let line = line.trim_end_matches('\r');

        // Skip comments and blank lines
        if line.trim().is_empty() || line.trim_start().starts_with('#') {
            continue;
        }

        let line_no = line_num + 1;
        let parse_error = |message: String| FormatError::Parse {
            line: line_no,
            message,
        };

        let Some((columns, delimiter, x_idx, y_idx)) = &header else {
            let delimiter = options.delimiter.unwrap_or_else(|| detect_delimiter(line));
            let columns = split_fields(line, delimiter).map_err(parse_error)?;
            let find = |name: &str| {
                columns
                    .iter()
                    .position(|c| c == name)
                    .ok_or_else(|| FormatError::MissingColumn(name.to_string()))
            };
            let x_idx = find(&options.x_column)?;
            let y_idx = find(&options.y_column)?;
            header = Some((columns, delimiter, x_idx, y_idx));
            continue;
        };

        let fields = split_fields(line, *delimiter).map_err(parse_error)?;
        if fields.len() != columns.len() {
            return Err(parse_error(format!(
                "expected {} fields, found {}",
                columns.len(),
                fields.len()
            )));
        }

        let coordinate = |idx: usize| {
            fields[idx].parse::<f64>().map_err(|_| {
                parse_error(format!(
                    "column '{}' is not a number: '{}'",
                    columns[idx], fields[idx]
                ))
            })
        };
        let x = coordinate(*x_idx)?;
        let y = coordinate(*y_idx)?;

        let attributes: BTreeMap<String, AttributeValue> = columns
            .iter()
            .zip(&fields)
            .enumerate()
            .filter(|(i, _)| i != x_idx && i != y_idx)
            .map(|(_, (name, raw))| (name.clone(), parse_attribute(raw)))
            .collect();

        features.push(Feature {
            geometry: Point::new(x, y).into(),
            attributes,
        });
    }

    if features.is_empty() {
        return Err(FormatError::Empty(format!(
            "no data rows in {}",
            path.display()
        )));
    }

    let name = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();

    info!(
        path = %path.display(),
        points = features.len(),
        crs = %crate::crs::describe(options.crs),
        "loaded point table"
    );

    Ok(VectorLayer::new(name, features, options.crs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_split_fields() {
        assert_eq!(split_fields("a, b ,c", ',').unwrap(), vec!["a", "b", "c"]);
        assert_eq!(
            split_fields("\"Portland, OR\",1", ',').unwrap(),
            vec!["Portland, OR", "1"]
        );
        assert_eq!(
            split_fields("\"say \"\"hi\"\"\";2", ';').unwrap(),
            vec!["say \"hi\"", "2"]
        );
        assert!(split_fields("\"open,1", ',').is_err());
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("name,lon,lat"), ',');
        assert_eq!(detect_delimiter("name\tlon\tlat"), '\t');
        assert_eq!(detect_delimiter("name;lon;lat"), ';');
        assert_eq!(detect_delimiter("name"), ',');
    }

    #[test]
    fn test_read_csv_table() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "# US cities").unwrap();
        writeln!(file, "name,lon,lat,pop").unwrap();
        writeln!(file, "\"Portland, OR\",-122.68,45.52,583776").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "Seattle,-122.33,47.61,608660").unwrap();

        let options = PointTableOptions::default().with_crs(Crs::Geographic);
        let layer = read_point_table(file.path(), &options).unwrap();

        assert_eq!(layer.len(), 2);
        assert_eq!(layer.crs, Some(Crs::Geographic));
        let portland = &layer.features[0];
        assert_eq!(portland.geometry, geo::Geometry::Point(Point::new(-122.68, 45.52)));
        assert_eq!(portland.attribute("name").as_text().as_deref(), Some("Portland, OR"));
        assert_eq!(portland.attribute("pop").as_f64(), Some(583776.0));
        assert!(portland.attribute("lon").is_null());
    }

    #[test]
    fn test_read_tab_table_with_custom_columns() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "x\ty\tcount").unwrap();
        writeln!(file, "500000\t4200000\t").unwrap();

        let layer = read_point_table(file.path(), &PointTableOptions::new("x", "y")).unwrap();
        assert!(layer.features[0].attribute("count").is_null());
        assert_eq!(layer.crs, None);
    }

    #[test]
    fn test_errors() {
        let mut missing = NamedTempFile::new().unwrap();
        writeln!(missing, "name,x,y").unwrap();
        writeln!(missing, "a,1,2").unwrap();
        assert!(matches!(
            read_point_table(missing.path(), &PointTableOptions::default()),
            Err(FormatError::MissingColumn(c)) if c == "lon"
        ));

        let mut bad = NamedTempFile::new().unwrap();
        writeln!(bad, "lon,lat").unwrap();
        writeln!(bad, "1.0,north").unwrap();
        assert!(matches!(
            read_point_table(bad.path(), &PointTableOptions::default()),
            Err(FormatError::Parse { line: 2, .. })
        ));

        let mut empty = NamedTempFile::new().unwrap();
        writeln!(empty, "# nothing here").unwrap();
        writeln!(empty, "lon,lat").unwrap();
        assert!(matches!(
            read_point_table(empty.path(), &PointTableOptions::default()),
            Err(FormatError::Empty(_))
        ));
    }
}
