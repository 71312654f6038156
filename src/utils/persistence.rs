use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{de::DeserializeOwned, Serialize};

use crate::errors::WizardError;

const TMP_SUFFIX: &str = "tmp";

/// Serialises `value` as pretty JSON and writes it by staging to a temporary
/// sibling file, then renaming over the target.
pub fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<(), WizardError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let json = serde_json::to_string_pretty(value)?;
    let tmp = tmp_path(path);
    fs::write(&tmp, json)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Reads a JSON document, returning `None` when the file does not exist.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, WizardError> {
    if !path.exists() {
        return Ok(None);
    }
    let data = fs::read_to_string(path)?;
    Ok(Some(serde_json::from_str(&data)?))
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut tmp = path.to_path_buf();
    let ext = match path.extension().and_then(|ext| ext.to_str()) {
        Some(existing) => format!("{}.{}", existing, TMP_SUFFIX),
        None => TMP_SUFFIX.to_string(),
    };
    tmp.set_extension(ext);
    tmp
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use tempfile::TempDir;

    #[test]
    fn atomic_write_leaves_no_temp_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("data.json");
        let mut value = BTreeMap::new();
        value.insert("zipcode", "12345");

        write_json_atomic(&path, &value).unwrap();

        assert!(path.exists());
        assert!(!dir.path().join("nested").join("data.json.tmp").exists());
        let loaded: Option<BTreeMap<String, String>> = read_json(&path).unwrap();
        assert_eq!(loaded.unwrap().get("zipcode").unwrap(), "12345");
    }

    #[test]
    fn missing_file_reads_as_none() {
        let dir = TempDir::new().unwrap();
        let loaded: Option<BTreeMap<String, String>> =
            read_json(&dir.path().join("absent.json")).unwrap();
        assert!(loaded.is_none());
    }
}
