use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use crate::apportion::*;

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| path.to_string())
}

/// A CSV table read as strings, with trimmed headers and cells.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct RawTable {
    pub path: String,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    /// The line number of a row in the original file (the header is line 1).
    pub fn lineno(idx: usize) -> usize {
        idx + 2
    }

    pub fn column(&self, idx: usize) -> impl Iterator<Item = &str> {
        self.rows
            .iter()
            .map(move |row| row.get(idx).map(|s| s.as_str()).unwrap_or(""))
    }
}

pub fn read_table<R: Read>(rdr: R, path: &str) -> ApportionResult<RawTable> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(rdr);
    let headers: Vec<String> = reader
        .headers()
        .context(CsvLineParseSnafu { path, lineno: 1usize })?
        .iter()
        .map(|s| s.to_string())
        .collect();
    let mut rows: Vec<Vec<String>> = Vec::new();
    for (idx, line_r) in reader.records().enumerate() {
        let lineno = RawTable::lineno(idx);
        let line = line_r.context(CsvLineParseSnafu { path, lineno })?;
        rows.push(line.iter().map(|s| s.to_string()).collect());
    }
    debug!(
        "read_table: {}: headers: {:?}, {} rows",
        path,
        headers,
        rows.len()
    );
    Ok(RawTable {
        path: path.to_string(),
        headers,
        rows,
    })
}

pub fn open_table(path: &str) -> ApportionResult<RawTable> {
    let f = fs::File::open(path)
        .map_err(csv::Error::from)
        .context(OpeningCsvSnafu { path })?;
    read_table(f, path)
}

/// The index of the first header matching one of the names, ignoring case.
pub fn find_column(headers: &[String], names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim().eq_ignore_ascii_case(n)))
}

pub fn require_column(table: &RawTable, names: &[&str]) -> ApportionResult<usize> {
    find_column(&table.headers, names).context(MissingColumnSnafu {
        column: names.join("|"),
        path: table.path.clone(),
    })
}

pub fn create_dir(path: &str) -> ApportionResult<()> {
    fs::create_dir_all(path).context(CreatingDirectorySnafu { path })
}

/// The CSV files of a directory, sorted by name.
pub fn list_csv_files(dir: &str) -> ApportionResult<Vec<PathBuf>> {
    let mut res: Vec<PathBuf> = Vec::new();
    for entry in fs::read_dir(dir).context(ListingDirectorySnafu { path: dir })? {
        let p = entry.context(ListingDirectorySnafu { path: dir })?.path();
        let is_csv = p
            .extension()
            .map(|e| e.eq_ignore_ascii_case("csv"))
            .unwrap_or(false);
        if p.is_file() && is_csv {
            res.push(p);
        }
    }
    res.sort();
    Ok(res)
}

pub fn parse_number(s: &str) -> Option<f64> {
    s.trim().replace(',', "").parse::<f64>().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn table_and_columns() {
        let data = " State , Population\nKerala, 35699443\nGoa,1586250\n";
        let t = read_table(data.as_bytes(), "mem.csv").unwrap();
        assert_eq!(t.headers, vec!["State".to_string(), "Population".to_string()]);
        assert_eq!(t.rows[1], vec!["Goa".to_string(), "1586250".to_string()]);
        assert_eq!(find_column(&t.headers, &["state", "region"]), Some(0));
        assert_eq!(find_column(&t.headers, &["seats"]), None);
        assert!(matches!(
            require_column(&t, &["seats", "seat"]),
            Err(ApportionError::MissingColumn { .. })
        ));
        assert_eq!(t.column(1).collect::<Vec<&str>>(), vec!["35699443", "1586250"]);
    }

    #[test]
    fn file_names_and_numbers() {
        assert_eq!(
            simplify_file_name("data/outputs/alloc_proportional_543.csv"),
            "alloc_proportional_543.csv"
        );
        assert_eq!(parse_number(" 1,586,250 "), Some(1586250.0));
        assert_eq!(parse_number("3.5"), Some(3.5));
        assert_eq!(parse_number(""), None);
        assert_eq!(parse_number("n/a"), None);
    }
}
