//! Executable path resolution

use std::env;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{Error, Result};

/// Absolute path of the running executable, as given by `argv[0]`
pub fn exe_path() -> Result<PathBuf> {
    let arg0 = env::args_os().next().ok_or_else(|| {
        Error::ExePath(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "empty argument list",
        ))
    })?;
    resolve_exe_path(Path::new(&arg0))
}

/// Resolve `prog` to an absolute path of an existing file
///
/// A path without extension that does not exist is retried with `.exe`
/// appended. Directories are rejected.
pub fn resolve_exe_path(prog: &Path) -> Result<PathBuf> {
    let path = absolute(prog)?;
    let err = match check_file(&path) {
        Ok(()) => return Ok(path),
        Err(e) => e,
    };
    if path.extension().is_none() {
        let mut with_ext = path.into_os_string();
        with_ext.push(".exe");
        let with_ext = PathBuf::from(with_ext);
        check_file(&with_ext)?;
        return Ok(with_ext);
    }
    Err(err)
}

/// Change the working directory to the directory holding the executable
pub fn set_exe_dir_as_working_dir() -> Result<PathBuf> {
    let exe = env::current_exe().map_err(Error::ExePath)?;
    change_to_parent_dir(&exe)
}

/// Change the working directory to the parent of `exe`
pub fn change_to_parent_dir(exe: &Path) -> Result<PathBuf> {
    let dir = exe
        .parent()
        .ok_or_else(|| {
            Error::WorkingDir(std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{} has no parent directory", exe.display()),
            ))
        })?
        .to_path_buf();
    env::set_current_dir(&dir).map_err(Error::WorkingDir)?;
    debug!(dir = %dir.display(), "Changed working directory");
    Ok(dir)
}

fn absolute(path: &Path) -> Result<PathBuf> {
    if path.is_absolute() {
        Ok(path.to_path_buf())
    } else {
        Ok(env::current_dir()?.join(path))
    }
}

fn check_file(path: &Path) -> Result<()> {
    let meta = std::fs::metadata(path)?;
    if meta.is_dir() {
        return Err(Error::IsDirectory {
            path: path.to_path_buf(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn test_existing_file() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("svc.bin");
        fs::write(&exe, b"").unwrap();

        assert_eq!(resolve_exe_path(&exe).unwrap(), exe);
    }

    #[test]
    fn test_exe_extension_appended() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("svc.exe"), b"").unwrap();

        let resolved = resolve_exe_path(&dir.path().join("svc")).unwrap();
        assert_eq!(resolved, dir.path().join("svc.exe"));
    }

    #[test]
    fn test_directory_rejected() {
        let dir = tempdir().unwrap();
        let sub = dir.path().join("svc.d");
        fs::create_dir(&sub).unwrap();

        let err = resolve_exe_path(&sub).unwrap_err();
        assert!(matches!(err, Error::IsDirectory { .. }));
        assert!(err.to_string().ends_with("svc.d is directory"));
    }

    #[test]
    fn test_directory_with_exe_fallback_rejected() {
        let dir = tempdir().unwrap();
        fs::create_dir(dir.path().join("svc.exe")).unwrap();

        let err = resolve_exe_path(&dir.path().join("svc")).unwrap_err();
        assert!(matches!(err, Error::IsDirectory { .. }));
    }

    #[test]
    fn test_missing_file() {
        let dir = tempdir().unwrap();
        let err = resolve_exe_path(&dir.path().join("absent.bin")).unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }
}
