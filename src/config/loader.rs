//! Config Loader Module
//! Reads chart definition documents (YAML or JSON) into typed options.

use crate::config::ChartOptions;
use serde_yaml::{Mapping, Value};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path} as YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("failed to parse {path} as JSON: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("{path}: 'charts' must be a list and 'defaults' a mapping")]
    Layout { path: PathBuf },
    #[error("{path}#{index}: {source}")]
    Chart {
        path: PathBuf,
        index: usize,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("{0}: no chart definitions found")]
    Empty(PathBuf),
}

/// Document syntax
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Yaml,
    Json,
}

impl DocumentFormat {
    /// `.json` files are JSON; everything else is read as YAML.
    pub fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => DocumentFormat::Json,
            _ => DocumentFormat::Yaml,
        }
    }
}

/// A chart definition together with where it came from.
#[derive(Debug, Clone)]
pub struct LoadedChart {
    pub source: PathBuf,
    pub index: usize,
    pub options: ChartOptions,
}

impl fmt::Display for LoadedChart {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.source.display(), self.index)
    }
}

/// One entry of a document; a bad entry does not affect its siblings.
pub type ChartEntry = Result<LoadedChart, LoadError>;

/// Load every chart definition in a file.
pub fn load_file(path: &Path) -> Result<Vec<ChartEntry>, LoadError> {
    let text = fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let charts = parse_document(&text, DocumentFormat::from_path(path), path)?;
    debug!("Loaded {} chart entry(ies) from {}", charts.len(), path.display());
    Ok(charts)
}

/// Parse a document holding one chart, a list of charts, or a
/// `charts:` list with shared `defaults:`.
///
/// Syntax and layout errors fail the whole document; each chart entry is
/// deserialized on its own.
pub fn parse_document(
    text: &str,
    format: DocumentFormat,
    source: &Path,
) -> Result<Vec<ChartEntry>, LoadError> {
    let root: Value = match format {
        DocumentFormat::Yaml => serde_yaml::from_str(text).map_err(|source_err| LoadError::Yaml {
            path: source.to_path_buf(),
            source: source_err,
        })?,
        DocumentFormat::Json => serde_json::from_str(text).map_err(|source_err| LoadError::Json {
            path: source.to_path_buf(),
            source: source_err,
        })?,
    };

    let (defaults, entries) = split_document(root, source)?;
    if entries.is_empty() {
        return Err(LoadError::Empty(source.to_path_buf()));
    }

    Ok(entries
        .into_iter()
        .enumerate()
        .map(|(index, entry)| {
            let merged = apply_defaults(entry, defaults.as_ref());
            serde_yaml::from_value::<ChartOptions>(merged)
                .map(|options| LoadedChart {
                    source: source.to_path_buf(),
                    index,
                    options,
                })
                .map_err(|source_err| LoadError::Chart {
                    path: source.to_path_buf(),
                    index,
                    source: source_err,
                })
        })
        .collect())
}

fn split_document(root: Value, source: &Path) -> Result<(Option<Mapping>, Vec<Value>), LoadError> {
    let layout_error = || LoadError::Layout {
        path: source.to_path_buf(),
    };

    match root {
        Value::Null => Ok((None, Vec::new())),
        Value::Sequence(entries) => Ok((None, entries)),
        Value::Mapping(mut map) if map.contains_key("charts") => {
            let charts = match map.remove("charts") {
                Some(Value::Sequence(entries)) => entries,
                _ => return Err(layout_error()),
            };
            let defaults = match map.remove("defaults") {
                None | Some(Value::Null) => None,
                Some(Value::Mapping(defaults)) => Some(defaults),
                Some(_) => return Err(layout_error()),
            };
            Ok((defaults, charts))
        }
        single => Ok((None, vec![single])),
    }
}

/// Chart keys win over default keys.
fn apply_defaults(entry: Value, defaults: Option<&Mapping>) -> Value {
    match (entry, defaults) {
        (Value::Mapping(chart), Some(defaults)) => {
            let mut merged = defaults.clone();
            for (key, value) in chart {
                merged.insert(key, value);
            }
            Value::Mapping(merged)
        }
        (entry, _) => entry,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{ChartKind, ImageFormat};
    use std::io::Write;

    fn parse_yaml(text: &str) -> Result<Vec<LoadedChart>, LoadError> {
        parse_document(text, DocumentFormat::Yaml, Path::new("charts.yaml"))?
            .into_iter()
            .collect()
    }

    #[test]
    fn single_chart_document() {
        let charts = parse_yaml("type: pie\nslicedata: [1, 2]\npath: out\nfilename: cpu\n").unwrap();

        assert_eq!(charts.len(), 1);
        assert_eq!(charts[0].options.kind, ChartKind::Pie);
        assert_eq!(charts[0].to_string(), "charts.yaml#0");
    }

    #[test]
    fn list_document() {
        let charts = parse_yaml(
            "- {type: pie, slicedata: [1], path: out, filename: a}\n- {type: bar, yaxis: [1], path: out, filename: b}\n",
        )
        .unwrap();

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[1].index, 1);
        assert_eq!(charts[1].options.filename, "b");
    }

    #[test]
    fn defaults_are_merged_under_charts() {
        let charts = parse_yaml(
            r#"
defaults:
  path: /tmp/chart_collection
  format: svg
  fontsize: 12
charts:
  - type: pie
    slicedata: [10, 50]
    filename: pie
  - type: donut
    slicedata: [10, 50]
    filename: donut
    fontsize: 20
"#,
        )
        .unwrap();

        assert_eq!(charts.len(), 2);
        assert_eq!(charts[0].options.format, ImageFormat::Svg);
        assert_eq!(charts[0].options.font_size, 12);
        assert_eq!(charts[1].options.font_size, 20);
        assert_eq!(
            charts[1].options.path,
            PathBuf::from("/tmp/chart_collection")
        );
    }

    #[test]
    fn reports_failing_chart_index() {
        let err = parse_yaml("- {type: pie, path: p, filename: a}\n- {type: pie, filename: b}\n")
            .unwrap_err();

        assert!(matches!(err, LoadError::Chart { index: 1, .. }));
        assert!(err.to_string().starts_with("charts.yaml#1"));
    }

    #[test]
    fn bad_entry_keeps_its_siblings() {
        let entries = parse_document(
            "- {type: pie, slicedata: [1], path: out, filename: good}\n- {type: pie, slicedata: [1], path: out, filename: bad, titlchart: typo}\n- {type: bar, yaxis: [1], path: out, filename: also_good}\n",
            DocumentFormat::Yaml,
            Path::new("b.yaml"),
        )
        .unwrap();

        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].as_ref().unwrap().options.filename, "good");
        let err = entries[1].as_ref().unwrap_err();
        assert!(matches!(err, LoadError::Chart { index: 1, .. }));
        assert!(err.to_string().contains("titlchart"));
        assert_eq!(entries[2].as_ref().unwrap().options.filename, "also_good");
    }

    #[test]
    fn rejects_bad_layout_and_empty_documents() {
        assert!(matches!(
            parse_yaml("charts: {type: pie}\n"),
            Err(LoadError::Layout { .. })
        ));
        assert!(matches!(parse_yaml("[]"), Err(LoadError::Empty(_))));
    }

    #[test]
    fn loads_json_files_by_extension() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("chart.json");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            r#"{{"type": "bar", "yaxis": [[1, 2], [3, 4]], "path": "out", "filename": "bars"}}"#
        )
        .unwrap();

        let charts = load_file(&path).unwrap();

        assert_eq!(charts.len(), 1);
        let chart = charts[0].as_ref().unwrap();
        assert_eq!(chart.options.kind, ChartKind::Bar);
        assert_eq!(chart.options.y_axis.series().len(), 2);
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = load_file(Path::new("/definitely/not/here.yaml")).unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
    }
}
