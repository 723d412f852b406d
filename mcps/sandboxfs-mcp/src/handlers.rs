//! Filesystem operation handlers
//!
//! Each handler confines its path through the sandbox, runs exactly one
//! filesystem primitive and returns the text reported to the caller.

use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;
use tokio::fs;

use crate::params::*;
use crate::sandbox::{ConfinedPath, Sandbox};
use crate::types::{FsError, FsResult};

pub async fn read_file(sandbox: &Sandbox, params: ReadFileParams) -> FsResult<String> {
    let confined = sandbox.confine(&params.path)?;

    fs::read_to_string(&confined)
        .await
        .map_err(FsError::io("reading file"))
}

pub async fn write_file(sandbox: &Sandbox, params: WriteFileParams) -> FsResult<String> {
    let confined = sandbox.confine(&params.path)?;

    // The root is a directory; its parent lies outside the sandbox.
    if confined.as_path() == sandbox.root() {
        return Err(FsError::InvalidParams(
            "write_file: path resolves to the sandbox root directory".to_string(),
        ));
    }

    if let Some(parent) = confined.as_path().parent() {
        fs::create_dir_all(parent)
            .await
            .map_err(FsError::io("creating directory"))?;
    }

    replace_file(&confined, params.content.into_bytes())
        .await
        .map_err(FsError::io("writing file"))?;

    Ok(format!("Successfully wrote to file: {}", confined))
}

/// Write to a temp file in the target's directory, then persist it over the
/// target so the file is never observed half-written
async fn replace_file(target: &ConfinedPath, content: Vec<u8>) -> std::io::Result<()> {
    let path = target.as_path().to_path_buf();
    tokio::task::spawn_blocking(move || -> std::io::Result<()> {
        let parent = path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::InvalidInput, "path has no parent")
        })?;
        let mut tmp = NamedTempFile::new_in(parent)?;
        tmp.write_all(&content)?;
        tmp.persist(&path).map_err(|e| e.error)?;
        Ok(())
    })
    .await
    .map_err(std::io::Error::other)?
}

pub async fn list_directory(sandbox: &Sandbox, params: ListDirectoryParams) -> FsResult<String> {
    let confined = sandbox.confine(&params.path)?;

    let mut read_dir = fs::read_dir(&confined)
        .await
        .map_err(FsError::io("reading directory"))?;

    let mut entries = Vec::new();
    while let Some(entry) = read_dir
        .next_entry()
        .await
        .map_err(FsError::io("reading directory"))?
    {
        let mut name = entry.file_name().to_string_lossy().into_owned();
        let is_dir = entry
            .file_type()
            .await
            .map_err(FsError::io("reading directory"))?
            .is_dir();
        if is_dir {
            name.push('/');
        }
        entries.push(name);
    }

    Ok(format!("Directory contents:\n{}", entries.join("\n")))
}

pub async fn create_directory(
    sandbox: &Sandbox,
    params: CreateDirectoryParams,
) -> FsResult<String> {
    let confined = sandbox.confine(&params.path)?;

    fs::create_dir_all(&confined)
        .await
        .map_err(FsError::io("creating directory"))?;

    Ok(format!("Successfully created directory: {}", confined))
}

pub async fn delete_file(sandbox: &Sandbox, params: DeleteFileParams) -> FsResult<String> {
    let confined = sandbox.confine(&params.path)?;

    remove_all(confined.as_path())
        .await
        .map_err(FsError::io("deleting file/directory"))?;

    Ok(format!("Successfully deleted: {}", confined))
}

/// Remove a file, symlink or directory tree; a missing path is not an error
async fn remove_all(path: &Path) -> std::io::Result<()> {
    let metadata = match fs::symlink_metadata(path).await {
        Ok(metadata) => metadata,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path).await
    } else {
        fs::remove_file(path).await
    };

    match result {
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}
