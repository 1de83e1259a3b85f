use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{info, warn};

pub fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let text = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))
}

/// Like [`read_json`], but a missing file is an empty list.
pub fn read_json_list<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>> {
    if !path.exists() {
        warn!("{} not found, continuing without it", path.display());
        return Ok(Vec::new());
    }
    read_json(path)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    }
    let text = serde_json::to_string_pretty(value)?;
    fs::write(path, text).with_context(|| format!("writing {}", path.display()))?;
    info!("Wrote {}", path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ProgramData;

    #[test]
    fn reads_fixture() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/programs-unrefined.json");
        let programs: Vec<ProgramData> = read_json(&path).unwrap();
        assert_eq!(programs.len(), 2);
    }

    #[test]
    fn missing_list_is_empty() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/does-not-exist.json");
        let list: Vec<ProgramData> = read_json_list(&path).unwrap();
        assert!(list.is_empty());
        assert!(read_json::<Vec<ProgramData>>(&path).is_err());
    }

    #[test]
    fn write_then_read() {
        let dir = std::env::temp_dir().join(format!("hbook-files-{}", std::process::id()));
        let path = dir.join("nested/links.json");
        write_json(&path, &vec!["a".to_string(), "b".to_string()]).unwrap();
        let back: Vec<String> = read_json(&path).unwrap();
        assert_eq!(back, ["a", "b"]);
        fs::remove_dir_all(&dir).unwrap();
    }
}
