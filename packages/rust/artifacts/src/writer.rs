//! Scoped output writes and removals.

use std::io::ErrorKind;
use std::path::Path;

use koaton_shared::{KoatonError, Result};
use tracing::debug;

/// What happened to a path scheduled for removal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    Removed,
    Missing,
}

/// Write `contents` to `path`, creating parent directories.
///
/// The file is written to a dot-prefixed temp sibling first and renamed into
/// place, so readers never observe a partial output.
pub async fn write_output(path: &Path, contents: impl AsRef<[u8]>) -> Result<()> {
    let parent = path
        .parent()
        .ok_or_else(|| KoatonError::validation(format!("output path {} has no parent", path.display())))?;
    tokio::fs::create_dir_all(parent)
        .await
        .map_err(|e| KoatonError::io(parent, e))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .ok_or_else(|| KoatonError::validation(format!("output path {} has no file name", path.display())))?;
    let temp = parent.join(format!(".{file_name}.tmp"));

    let contents = contents.as_ref();
    tokio::fs::write(&temp, contents)
        .await
        .map_err(|e| KoatonError::io(&temp, e))?;
    tokio::fs::rename(&temp, path)
        .await
        .map_err(|e| KoatonError::io(path, e))?;

    debug!(path = %path.display(), size = contents.len(), "wrote output");
    Ok(())
}

/// Delete a file or directory tree. A missing path is not an error.
pub async fn remove_output(path: &Path) -> Result<Removal> {
    let metadata = match tokio::fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Removal::Missing),
        Err(e) => return Err(KoatonError::io(path, e)),
    };

    let result = if metadata.is_dir() {
        tokio::fs::remove_dir_all(path).await
    } else {
        tokio::fs::remove_file(path).await
    };

    match result {
        Ok(()) => {
            debug!(path = %path.display(), "removed output");
            Ok(Removal::Removed)
        }
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(Removal::Missing),
        Err(e) => Err(KoatonError::io(path, e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("koaton-writer-test-{}", uuid::Uuid::now_v7()))
    }

    #[tokio::test]
    async fn write_creates_parents_and_leaves_no_temp_files() {
        let tmp = temp_dir();
        let target = tmp.join("public/css/main_abc.css");

        write_output(&target, ".a{color:red}").await.unwrap();

        assert_eq!(std::fs::read_to_string(&target).unwrap(), ".a{color:red}");
        for entry in std::fs::read_dir(target.parent().unwrap()).unwrap() {
            let name = entry.unwrap().file_name().to_string_lossy().to_string();
            assert!(!name.starts_with('.'), "temp file left behind: {name}");
        }

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn write_overwrites_existing_output() {
        let tmp = temp_dir();
        let target = tmp.join("0main.css");

        write_output(&target, "first").await.unwrap();
        write_output(&target, "second").await.unwrap();
        assert_eq!(std::fs::read_to_string(&target).unwrap(), "second");

        let _ = std::fs::remove_dir_all(&tmp);
    }

    #[tokio::test]
    async fn remove_reports_missing_and_removed() {
        let tmp = temp_dir();
        let file = tmp.join("js/app_123.js");
        write_output(&file, "x").await.unwrap();

        assert_eq!(remove_output(&file).await.unwrap(), Removal::Removed);
        assert!(!file.exists());
        assert_eq!(remove_output(&file).await.unwrap(), Removal::Missing);

        let dir = tmp.join("js");
        write_output(&dir.join("nested/a.js"), "y").await.unwrap();
        assert_eq!(remove_output(&dir).await.unwrap(), Removal::Removed);
        assert!(!dir.exists());

        let _ = std::fs::remove_dir_all(&tmp);
    }
}
