//! File-backed signal extraction.

use crate::types::{SignalData, SignalRequest};
use crate::{SignalReader, SignalsError, SignalsResult};
use std::collections::HashMap;
use std::path::Path;

/// Reads signals from tool output files on the local filesystem.
///
/// Supported formats, inferred from the extension:
/// - `csv` / `csd`: comma-separated columns with a header line
/// - `tsv` / `txt`: whitespace-separated columns with a header line
/// - `json`: object mapping signal name to an array of numbers
#[derive(Clone, Copy, Debug, Default)]
pub struct FileSignalReader;

impl SignalReader for FileSignalReader {
    fn read_signals(
        &self,
        path: &Path,
        requests: &[SignalRequest],
    ) -> SignalsResult<HashMap<String, SignalData>> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().to_ascii_lowercase())
            .unwrap_or_default();
        let columns = match extension.as_str() {
            "csv" | "csd" => read_delimited(path, Separator::Comma)?,
            "tsv" | "txt" => read_delimited(path, Separator::Whitespace)?,
            "json" => read_json(path)?,
            _ => {
                return Err(SignalsError::UnknownFormat {
                    path: display(path),
                    extension,
                });
            }
        };

        let mut out = HashMap::new();
        for request in requests {
            let name = request.name.trim();
            let column = columns
                .get(name)
                .ok_or_else(|| SignalsError::MissingSignal {
                    path: display(path),
                    signal: name.to_string(),
                })?;
            out.insert(
                request.name.clone(),
                SignalData::from_column(column.clone(), request.hint),
            );
        }
        Ok(out)
    }
}

enum Separator {
    Comma,
    Whitespace,
}

fn read_delimited(path: &Path, sep: Separator) -> SignalsResult<HashMap<String, Vec<f64>>> {
    let content = std::fs::read_to_string(path).map_err(|source| SignalsError::Io {
        path: display(path),
        source,
    })?;
    let mut lines = content.lines().enumerate();

    let header = loop {
        match lines.next() {
            Some((_, line)) if line.trim().is_empty() => continue,
            Some((_, line)) => break line,
            None => {
                return Err(SignalsError::Parse {
                    path: display(path),
                    line: 0,
                    what: "empty file".to_string(),
                });
            }
        }
    };
    let names: Vec<String> = split(header, &sep)
        .map(|field| field.trim().to_string())
        .collect();

    let mut columns: Vec<Vec<f64>> = vec![Vec::new(); names.len()];
    for (index, line) in lines {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = split(line, &sep).collect();
        if fields.len() != names.len() {
            return Err(SignalsError::Parse {
                path: display(path),
                line: index + 1,
                what: format!("expected {} fields, found {}", names.len(), fields.len()),
            });
        }
        for (column, field) in columns.iter_mut().zip(&fields) {
            let value: f64 = field.trim().parse().map_err(|_| SignalsError::Parse {
                path: display(path),
                line: index + 1,
                what: format!("not a number: '{}'", field.trim()),
            })?;
            column.push(value);
        }
    }

    Ok(names.into_iter().zip(columns).collect())
}

fn split<'a>(line: &'a str, sep: &Separator) -> Box<dyn Iterator<Item = &'a str> + 'a> {
    match sep {
        Separator::Comma => Box::new(line.split(',')),
        Separator::Whitespace => Box::new(line.split_whitespace()),
    }
}

fn read_json(path: &Path) -> SignalsResult<HashMap<String, Vec<f64>>> {
    let content = std::fs::read_to_string(path).map_err(|source| SignalsError::Io {
        path: display(path),
        source,
    })?;
    let value: serde_json::Value =
        serde_json::from_str(&content).map_err(|source| SignalsError::Json {
            path: display(path),
            source,
        })?;
    let object = value.as_object().ok_or_else(|| SignalsError::Parse {
        path: display(path),
        line: 0,
        what: "expected a top-level object of signal arrays".to_string(),
    })?;

    let mut columns = HashMap::new();
    for (name, entry) in object {
        let array = entry.as_array().ok_or_else(|| SignalsError::Parse {
            path: display(path),
            line: 0,
            what: format!("signal '{name}' is not an array"),
        })?;
        let mut column = Vec::with_capacity(array.len());
        for item in array {
            let number = item.as_f64().ok_or_else(|| SignalsError::Parse {
                path: display(path),
                line: 0,
                what: format!("signal '{name}' has a non-numeric element"),
            })?;
            column.push(number);
        }
        columns.insert(name.clone(), column);
    }
    Ok(columns)
}

fn display(path: &Path) -> String {
    path.display().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ShapeHint;

    fn write(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn reads_csv_columns() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.csv", "time,V\n0.0,1.0\n0.5,1.5\n1.0,2.0\n");
        let reader = FileSignalReader;
        let signals = reader
            .read_signals(&path, &[SignalRequest::one_d("time"), SignalRequest::one_d("V")])
            .unwrap();
        assert_eq!(signals["time"], SignalData::OneD(vec![0.0, 0.5, 1.0]));
        assert_eq!(signals["V"], SignalData::OneD(vec![1.0, 1.5, 2.0]));
    }

    #[test]
    fn reads_whitespace_separated_txt() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.txt", "time  I\n0.0  3.0\n1.0  4.0\n");
        let signals = FileSignalReader
            .read_signals(&path, &[SignalRequest::two_d("I")])
            .unwrap();
        assert_eq!(signals["I"], SignalData::TwoD(vec![vec![3.0, 4.0]]));
    }

    #[test]
    fn reads_json_object() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.json", r#"{"V": [1.0, 2.0], "time": [0.0, 1.0]}"#);
        let signals = FileSignalReader
            .read_signals(&path, &[SignalRequest::one_d("V")])
            .unwrap();
        assert_eq!(signals["V"], SignalData::OneD(vec![1.0, 2.0]));
    }

    #[test]
    fn missing_signal_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.csv", "time,V\n0.0,1.0\n");
        let err = FileSignalReader
            .read_signals(&path, &[SignalRequest::one_d("missing")])
            .unwrap_err();
        assert!(matches!(err, SignalsError::MissingSignal { .. }));
    }

    #[test]
    fn unknown_extension_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.mat", "binary");
        let err = FileSignalReader
            .read_signals(&path, &[SignalRequest::one_d("V")])
            .unwrap_err();
        assert!(matches!(err, SignalsError::UnknownFormat { .. }));
    }

    #[test]
    fn ragged_row_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.csv", "time,V\n0.0\n");
        let err = FileSignalReader
            .read_signals(&path, &[SignalRequest::one_d("V")])
            .unwrap_err();
        assert!(matches!(err, SignalsError::Parse { .. }));
    }

    #[test]
    fn signal_names_are_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = write(&dir, "out.csv", "time, V(1)\n0.0, 1.0\n");
        let signals = FileSignalReader
            .read_signals(
                &path,
                &[SignalRequest {
                    name: " V(1)".to_string(),
                    hint: ShapeHint::OneD,
                }],
            )
            .unwrap();
        assert_eq!(signals[" V(1)"], SignalData::OneD(vec![1.0]));
    }
}
