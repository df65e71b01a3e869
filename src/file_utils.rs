use anyhow::{Context, Result, anyhow};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use walkdir::WalkDir;

// @module: File and directory utilities

// @struct: File operations utility
pub struct FileManager;

impl FileManager {
    // @checks: File existence
    pub fn file_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_file()
    }

    // @checks: Directory existence
    pub fn dir_exists<P: AsRef<Path>>(path: P) -> bool {
        path.as_ref().is_dir()
    }

    // @creates: Directory and parents if needed
    pub fn ensure_dir<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if !path.exists() {
            fs::create_dir_all(path).with_context(|| format!("Failed to create directory: {:?}", path))?;
        }
        Ok(())
    }

    /// Find the files with `extension` directly inside `dir`, sorted by name
    ///
    /// Subdirectories are not searched.
    pub fn find_files<P: AsRef<Path>>(dir: P, extension: &str) -> Result<Vec<PathBuf>> {
        let extension = extension.trim_start_matches('.');
        let mut result = Vec::new();

        for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1).follow_links(true) {
            let entry = entry.context("Failed to read directory entry")?;
            let path = entry.path();

            if path.is_file()
                && path
                    .extension()
                    .is_some_and(|ext| ext.to_string_lossy().eq_ignore_ascii_case(extension))
            {
                result.push(path.to_path_buf());
            }
        }

        result.sort();
        Ok(result)
    }

    /// Find the `.po` catalogs directly inside `dir`
    pub fn find_po_files<P: AsRef<Path>>(dir: P) -> Result<Vec<PathBuf>> {
        Self::find_files(dir, "po")
    }

    /// Walk up from `start` to the closest directory containing `.git`
    pub fn find_project_root<P: AsRef<Path>>(start: P) -> Option<PathBuf> {
        start
            .as_ref()
            .ancestors()
            .find(|dir| dir.join(".git").exists())
            .map(Path::to_path_buf)
    }

    /// Read a file to a string
    pub fn read_to_string<P: AsRef<Path>>(path: P) -> Result<String> {
        fs::read_to_string(&path).with_context(|| format!("Failed to read file: {:?}", path.as_ref()))
    }

    /// Write a string to a file
    pub fn write_to_file<P: AsRef<Path>>(path: P, content: &str) -> Result<()> {
        // Ensure the parent directory exists
        if let Some(parent) = path.as_ref().parent() {
            Self::ensure_dir(parent)?;
        }

        fs::write(&path, content).with_context(|| format!("Failed to write to file: {:?}", path.as_ref()))?;
        Ok(())
    }

    /// Write `content` to `path` unless the file exists and is non-empty
    ///
    /// Returns whether the file was written.
    pub fn write_if_missing<P: AsRef<Path>>(path: P, content: &str) -> Result<bool> {
        let path = path.as_ref();
        let present = fs::metadata(path).map(|m| m.is_file() && m.len() > 0).unwrap_or(false);
        if present {
            return Ok(false);
        }
        debug!("Creating default file {:?}", path);
        Self::write_to_file(path, content)?;
        Ok(true)
    }

    /// Open a file or directory with the platform's default application
    pub fn open_with_default_app<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        let mut command = if cfg!(target_os = "macos") {
            Command::new("open")
        } else if cfg!(target_os = "windows") {
            let mut command = Command::new("cmd");
            command.args(["/C", "start", ""]);
            command
        } else {
            Command::new("xdg-open")
        };

        command
            .arg(path)
            .spawn()
            .map(|_| ())
            .map_err(|e| anyhow!("Failed to open {:?}: {}", path, e))
    }
}
