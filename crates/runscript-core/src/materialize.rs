//! Temporary script files
//!
//! A [`ScriptFile`] holds the script body on disk for exactly as long as one
//! call needs it. The file gets a random name inside the scratch directory,
//! owner-only permissions, and is removed when the handle is dropped, so
//! every exit path (including panics and timeouts) cleans up.

use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::{Builder, TempPath};
use tracing::{debug, warn};

use crate::error::{Error, Result};

const PREFIX: &str = "script-";
const SUFFIX: &str = ".sh";

/// Permission bits applied to every script file
#[cfg(unix)]
pub const SCRIPT_MODE: u32 = 0o700;

/// Materialize `content` in the system temp directory
pub fn materialize(content: &str) -> Result<ScriptFile> {
    ScriptFile::create_in(content, &std::env::temp_dir())
}

/// An owner-only script file that is deleted on drop
#[derive(Debug)]
pub struct ScriptFile {
    path: Option<TempPath>,
}

impl ScriptFile {
    /// Write `content` verbatim to a fresh file under `dir`
    pub fn create_in(content: &str, dir: &Path) -> Result<Self> {
        let mut file = Builder::new()
            .prefix(PREFIX)
            .suffix(SUFFIX)
            .tempfile_in(dir)
            .map_err(Error::CreateTemp)?;

        // Dropping `file` on any early return below removes it.
        write_body(&mut file, content)?;
        file.as_file().sync_all().map_err(Error::CloseTemp)?;

        let path = file.into_temp_path();
        restrict_permissions(&path)?;

        debug!(path = %path.display(), bytes = content.len(), "Materialized script");
        Ok(Self { path: Some(path) })
    }

    /// Location of the script on disk
    pub fn path(&self) -> &Path {
        self.path.as_deref().unwrap_or_else(|| Path::new(""))
    }

    /// Remove the file now, reporting any failure
    pub fn close(mut self) -> std::io::Result<()> {
        match self.path.take() {
            Some(path) => path.close(),
            None => Ok(()),
        }
    }
}

impl Drop for ScriptFile {
    fn drop(&mut self) {
        if let Some(path) = self.path.take() {
            let shown: PathBuf = path.to_path_buf();
            if let Err(e) = path.close() {
                warn!(path = %shown.display(), error = %e, "Failed to remove script file");
            }
        }
    }
}

fn write_body<W: Write>(out: &mut W, content: &str) -> Result<()> {
    out.write_all(content.as_bytes()).map_err(Error::WriteTemp)?;
    out.flush().map_err(Error::WriteTemp)
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    std::fs::set_permissions(path, std::fs::Permissions::from_mode(SCRIPT_MODE))
        .map_err(Error::Permissions)
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> Result<()> {
    // Temp files are already private to the creating user here.
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn writes_content_verbatim() {
        let dir = tempfile::tempdir().unwrap();
        let body = "#!/bin/sh\necho \"$HOME\" 'quoted' \\\n  && exit 3\n";

        let script = ScriptFile::create_in(body, dir.path()).unwrap();

        assert_eq!(std::fs::read_to_string(script.path()).unwrap(), body);
        assert!(script.path().starts_with(dir.path()));
        let name = script.path().file_name().unwrap().to_string_lossy().into_owned();
        assert!(name.starts_with(PREFIX) && name.ends_with(SUFFIX), "unexpected name {name}");
    }

    #[cfg(unix)]
    #[test]
    fn permissions_are_owner_only() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        let script = ScriptFile::create_in("true", dir.path()).unwrap();

        let mode = std::fs::metadata(script.path()).unwrap().permissions().mode();
        assert_eq!(mode & 0o777, SCRIPT_MODE);
    }

    #[test]
    fn drop_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = ScriptFile::create_in("true", dir.path()).unwrap();
        let path = script.path().to_path_buf();
        assert!(path.exists());

        drop(script);

        assert!(!path.exists());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }

    #[test]
    fn close_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let script = ScriptFile::create_in("true", dir.path()).unwrap();
        let path = script.path().to_path_buf();

        script.close().expect("close should succeed");

        assert!(!path.exists());
    }

    #[test]
    fn names_do_not_collide() {
        let dir = tempfile::tempdir().unwrap();
        let a = ScriptFile::create_in("echo a", dir.path()).unwrap();
        let b = ScriptFile::create_in("echo b", dir.path()).unwrap();

        assert_ne!(a.path(), b.path());
    }

    #[test]
    fn materialize_uses_system_temp_dir() {
        let script = materialize("echo temp").unwrap();

        assert!(script.path().starts_with(std::env::temp_dir()));
        assert!(script.path().exists());
    }

    #[cfg(target_os = "linux")]
    #[test]
    fn full_device_is_a_write_error() {
        let mut full = std::fs::OpenOptions::new()
            .write(true)
            .open("/dev/full")
            .unwrap();

        let err = write_body(&mut full, "echo never lands").unwrap_err();

        assert!(matches!(err, Error::WriteTemp(_)));
        assert!(err.to_string().starts_with("Failed to write to temporary file"));
    }

    #[cfg(unix)]
    #[test]
    fn vanished_file_is_a_permissions_error() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("script-removed.sh");

        let err = restrict_permissions(&gone).unwrap_err();

        assert!(matches!(err, Error::Permissions(_)));
        assert!(err.to_string().starts_with("Failed to make script executable"));
    }

    #[test]
    fn missing_directory_is_a_create_error() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("does-not-exist");

        let err = ScriptFile::create_in("true", &missing).unwrap_err();

        assert!(matches!(err, Error::CreateTemp(_)));
        assert!(err.to_string().starts_with("Failed to create temporary file"));
    }
}
