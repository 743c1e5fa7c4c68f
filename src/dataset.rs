/// Dataset descriptor handling
///
/// The detector's training tool reads a YAML descriptor with a `path` entry
/// (dataset root) and the class `names`. The descriptor ships with whatever
/// path it was created on, so before training the `path` entry is pointed at
/// the descriptor's own directory. Only that line is rewritten; comments and
/// key order stay as they were.
use std::fs;
use std::path::{Path, PathBuf};

use serde_yaml::{Mapping, Value};
use thiserror::Error;

#[allow(unused_imports)]
use log::{debug, info, warn};

use crate::settings::replace_yaml_value;

pub const DEFAULT_DATASET: &str = "VehicleLicense";

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("failed to access descriptor {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("descriptor {path:?} is not valid YAML: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("descriptor {0:?} must be a YAML mapping")]
    NotAMapping(PathBuf),
}

/// Default descriptor location for a dataset name, relative to the working directory
pub fn descriptor_path(dataset: &str) -> PathBuf {
    PathBuf::from("datasets").join(dataset).join(format!("{}.yaml", dataset))
}

#[derive(Debug, Clone)]
pub struct DatasetDescriptor {
    pub file: PathBuf,
    pub entries: Mapping,
}

impl DatasetDescriptor {
    pub fn load(file: &Path) -> Result<Self, DatasetError> {
        let content = fs::read_to_string(file).map_err(|source| DatasetError::Io {
            path: file.to_path_buf(),
            source,
        })?;
        Self::parse(file, &content)
    }

    fn parse(file: &Path, content: &str) -> Result<Self, DatasetError> {
        let value: Value = serde_yaml::from_str(content).map_err(|source| DatasetError::Yaml {
            path: file.to_path_buf(),
            source,
        })?;
        match value {
            Value::Mapping(entries) => Ok(Self { file: file.to_path_buf(), entries }),
            _ => Err(DatasetError::NotAMapping(file.to_path_buf())),
        }
    }

    pub fn path(&self) -> Option<&str> {
        self.entries.get("path").and_then(Value::as_str)
    }

    /// Class names, given either as a list or as an index -> name mapping
    pub fn names(&self) -> Vec<String> {
        match self.entries.get("names") {
            Some(Value::Sequence(items)) => items
                .iter()
                .filter_map(|v| v.as_str().map(str::to_string))
                .collect(),
            Some(Value::Mapping(map)) => {
                let mut indexed: Vec<(u64, String)> = map
                    .iter()
                    .filter_map(|(k, v)| Some((k.as_u64()?, v.as_str()?.to_string())))
                    .collect();
                indexed.sort_by_key(|(i, _)| *i);
                indexed.into_iter().map(|(_, name)| name).collect()
            }
            _ => Vec::new(),
        }
    }
}

/// Directory of the descriptor with forward slashes, as the training tool expects
pub fn unix_style_dir(file: &Path) -> String {
    let absolute = if file.is_absolute() {
        file.to_path_buf()
    } else {
        std::env::current_dir()
            .map(|cwd| cwd.join(file))
            .unwrap_or_else(|_| file.to_path_buf())
    };
    let dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();
    dir.to_string_lossy().replace('\\', "/")
}

/// Point the descriptor's `path` entry at its own directory.
/// Returns `Ok(false)` when the descriptor has no `path` key (nothing written).
///
/// The `path` line is replaced in place so comments survive. When the old value
/// spans more than that line, the in-place edit would not round-trip, and the
/// whole mapping is written back instead.
pub fn prepare_descriptor(file: &Path) -> Result<bool, DatasetError> {
    let content = fs::read_to_string(file).map_err(|source| DatasetError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    let descriptor = DatasetDescriptor::parse(file, &content)?;

    if !descriptor.entries.contains_key("path") {
        info!("Descriptor {:?} has no path entry, leaving it unchanged", file);
        return Ok(false);
    }
    let new_path = unix_style_dir(file);
    if descriptor.path() == Some(new_path.as_str()) {
        debug!("Descriptor path already {}", new_path);
        return Ok(true);
    }

    let updated = match rewrite_path_line(file, &content, &descriptor, &new_path) {
        Some(updated) => updated,
        None => {
            warn!("Path entry in {:?} spans several lines, rewriting the descriptor without comments", file);
            let mut entries = descriptor.entries.clone();
            entries.insert(Value::String("path".to_string()), Value::String(new_path.clone()));
            serde_yaml::to_string(&entries).map_err(|source| DatasetError::Yaml {
                path: file.to_path_buf(),
                source,
            })?
        }
    };
    fs::write(file, updated).map_err(|source| DatasetError::Io {
        path: file.to_path_buf(),
        source,
    })?;
    info!("Descriptor path {:?} -> {}", descriptor.entries.get("path"), new_path);
    Ok(true)
}

/// Line-level rewrite of `path`, kept only if it parses back to the same
/// entries with the new path.
fn rewrite_path_line(file: &Path, content: &str, old: &DatasetDescriptor, new_path: &str) -> Option<String> {
    let quoted = serde_yaml::to_string(&Value::String(new_path.to_string()))
        .ok()?
        .trim_end()
        .to_string();
    let updated = replace_yaml_value(content, "path", &quoted);

    let reparsed = DatasetDescriptor::parse(file, &updated).ok()?;
    let mut expected = old.entries.clone();
    expected.insert(Value::String("path".to_string()), Value::String(new_path.to_string()));
    (reparsed.entries == expected).then_some(updated)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DESCRIPTOR: &str = "# vehicle plates\npath: C:\\old\\place  # dataset root\ntrain: images/train\nval: images/val\n\nnc: 4\nnames: ['License_Plate', 'cars', 'motorcyle', 'truck']\n";

    #[test]
    fn test_descriptor_path_layout() {
        assert_eq!(
            descriptor_path("VehicleLicense"),
            PathBuf::from("datasets").join("VehicleLicense").join("VehicleLicense.yaml")
        );
    }

    #[test]
    fn test_rewrite_keeps_everything_else() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("VehicleLicense.yaml");
        fs::write(&file, DESCRIPTOR).unwrap();

        assert!(prepare_descriptor(&file).unwrap());

        let rewritten = fs::read_to_string(&file).unwrap();
        assert!(rewritten.starts_with("# vehicle plates\npath: "));
        assert!(rewritten.contains("train: images/train\nval: images/val\n\nnc: 4\n"));

        let descriptor = DatasetDescriptor::load(&file).unwrap();
        assert_eq!(descriptor.path().unwrap(), unix_style_dir(&file));
        assert!(!descriptor.path().unwrap().contains('\\'));
        assert_eq!(descriptor.names(), vec!["License_Plate", "cars", "motorcyle", "truck"]);

        let keys: Vec<&str> = descriptor.entries.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["path", "train", "val", "nc", "names"]);
    }

    #[test]
    fn test_no_path_entry_is_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("d.yaml");
        fs::write(&file, "train: images/train\n").unwrap();
        assert!(!prepare_descriptor(&file).unwrap());
        assert_eq!(fs::read_to_string(&file).unwrap(), "train: images/train\n");
    }

    #[test]
    fn test_empty_path_value_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("d.yaml");
        fs::write(&file, "# root\npath:\ntrain: images/train\n").unwrap();

        assert!(prepare_descriptor(&file).unwrap());
        let rewritten = fs::read_to_string(&file).unwrap();
        assert!(rewritten.starts_with("# root\npath: "));
        assert!(rewritten.ends_with("\ntrain: images/train\n"));
        assert_eq!(DatasetDescriptor::load(&file).unwrap().path().unwrap(), unix_style_dir(&file));
    }

    #[test]
    fn test_non_string_path_value_is_rewritten() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("d.yaml");
        fs::write(&file, "path: 42\ntrain: images/train\n").unwrap();

        assert!(prepare_descriptor(&file).unwrap());
        assert_eq!(DatasetDescriptor::load(&file).unwrap().path().unwrap(), unix_style_dir(&file));
    }

    #[test]
    fn test_path_on_continuation_line_stays_valid_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("d.yaml");
        fs::write(&file, "path:\n  old/dir\ntrain: images/train\nnames: [a, b]\n").unwrap();

        assert!(prepare_descriptor(&file).unwrap());
        let descriptor = DatasetDescriptor::load(&file).unwrap();
        assert_eq!(descriptor.path().unwrap(), unix_style_dir(&file));
        assert_eq!(descriptor.names(), vec!["a", "b"]);

        let keys: Vec<&str> = descriptor.entries.keys().filter_map(Value::as_str).collect();
        assert_eq!(keys, vec!["path", "train", "names"]);
        assert!(!fs::read_to_string(&file).unwrap().contains("old/dir"));
    }

    #[test]
    fn test_errors() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            prepare_descriptor(&dir.path().join("absent.yaml")),
            Err(DatasetError::Io { .. })
        ));

        let list = dir.path().join("list.yaml");
        fs::write(&list, "- a\n- b\n").unwrap();
        assert!(matches!(prepare_descriptor(&list), Err(DatasetError::NotAMapping(_))));

        let broken = dir.path().join("broken.yaml");
        fs::write(&broken, "path: [unclosed\n").unwrap();
        assert!(matches!(prepare_descriptor(&broken), Err(DatasetError::Yaml { .. })));
    }

    #[test]
    fn test_names_as_mapping() {
        let descriptor = DatasetDescriptor::parse(
            Path::new("d.yaml"),
            "names:\n  1: cars\n  0: License_Plate\n",
        )
        .unwrap();
        assert_eq!(descriptor.names(), vec!["License_Plate", "cars"]);
    }
}
