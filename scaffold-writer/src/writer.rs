//! All-or-nothing tree emission and per-file atomic writes.
//!
//! ## Fresh destination
//!
//! 1. Write every file into a sibling staging directory `.<name>.scaffold.tmp`.
//! 2. Rename the staging directory onto the destination.
//! 3. On any failure remove the staging directory; the destination never
//!    appears half-written.
//!
//! ## Existing destination (`Overwrite` / `SkipExisting`)
//!
//! Each file goes through [`atomic_write`]: SHA-256 compare with the file on
//! disk, write `<path>.scaffold.tmp`, rename onto `<path>`.

use std::path::{Path, PathBuf};

use scaffold_renderer::OutputTree;

use crate::digest::content_digest;
use crate::error::{io_err, WriteError};

// ---------------------------------------------------------------------------
// Options and results
// ---------------------------------------------------------------------------

/// What to do when the destination directory already exists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ExistingPolicy {
    /// Refuse with [`WriteError::DestinationExists`].
    #[default]
    Fail,
    /// Replace files whose content differs.
    Overwrite,
    /// Leave files that already exist alone; write only missing ones.
    SkipExisting,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteOptions {
    pub policy: ExistingPolicy,
    pub dry_run: bool,
}

/// Outcome of an individual file write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteResult {
    /// File was written (content changed or did not previously exist).
    Written { path: PathBuf },
    /// On-disk content already matches; the file was not touched.
    Unchanged { path: PathBuf },
    /// File exists and `SkipExisting` was requested.
    Skipped { path: PathBuf },
    /// `--dry-run` mode: the file *would* have been written.
    WouldWrite { path: PathBuf },
}

impl WriteResult {
    pub fn path(&self) -> &Path {
        match self {
            WriteResult::Written { path }
            | WriteResult::Unchanged { path }
            | WriteResult::Skipped { path }
            | WriteResult::WouldWrite { path } => path,
        }
    }
}

/// Results of one [`write_tree`] call, in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WriteReport {
    pub destination: PathBuf,
    pub results: Vec<WriteResult>,
}

impl WriteReport {
    fn count(&self, pred: impl Fn(&WriteResult) -> bool) -> usize {
        self.results.iter().filter(|r| pred(r)).count()
    }

    pub fn written(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::Written { .. }))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::Unchanged { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::Skipped { .. }))
    }

    pub fn would_write(&self) -> usize {
        self.count(|r| matches!(r, WriteResult::WouldWrite { .. }))
    }
}

// ---------------------------------------------------------------------------
// write_tree
// ---------------------------------------------------------------------------

/// Emit `tree` under `destination` according to `options`.
pub fn write_tree(
    tree: &OutputTree,
    destination: &Path,
    options: &WriteOptions,
) -> Result<WriteReport, WriteError> {
    let exists = destination.exists();
    if exists && options.policy == ExistingPolicy::Fail {
        return Err(WriteError::DestinationExists {
            path: destination.to_path_buf(),
        });
    }

    let results = if !exists {
        if options.dry_run {
            tree.paths()
                .map(|rel| {
                    let path = destination.join(rel);
                    tracing::info!("[dry-run] would write: {}", path.display());
                    WriteResult::WouldWrite { path }
                })
                .collect()
        } else {
            write_fresh(tree, destination)?
        }
    } else {
        if !destination.is_dir() {
            return Err(io_err(
                destination,
                std::io::Error::other("destination exists and is not a directory"),
            ));
        }
        write_into_existing(tree, destination, options)?
    };

    Ok(WriteReport {
        destination: destination.to_path_buf(),
        results,
    })
}

/// `<parent>/.<name>.scaffold.tmp`
fn staging_dir(destination: &Path) -> Result<PathBuf, WriteError> {
    let Some(name) = destination.file_name() else {
        return Err(io_err(
            destination,
            std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                "destination has no directory name",
            ),
        ));
    };
    Ok(destination.with_file_name(format!(".{}.scaffold.tmp", name.to_string_lossy())))
}

fn write_fresh(tree: &OutputTree, destination: &Path) -> Result<Vec<WriteResult>, WriteError> {
    let staging = staging_dir(destination)?;
    if staging.exists() {
        tracing::debug!("removing stale staging dir {}", staging.display());
        std::fs::remove_dir_all(&staging).map_err(|e| io_err(&staging, e))?;
    }

    let staged = stage(tree, &staging).and_then(|()| {
        std::fs::rename(&staging, destination).map_err(|e| io_err(destination, e))
    });
    if let Err(e) = staged {
        let _ = std::fs::remove_dir_all(&staging);
        return Err(e);
    }

    Ok(tree
        .paths()
        .map(|rel| {
            let path = destination.join(rel);
            tracing::info!("wrote: {}", path.display());
            WriteResult::Written { path }
        })
        .collect())
}

fn stage(tree: &OutputTree, staging: &Path) -> Result<(), WriteError> {
    std::fs::create_dir_all(staging).map_err(|e| io_err(staging, e))?;
    for (rel, file) in tree.iter() {
        let path = staging.join(rel);
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }
        std::fs::write(&path, file.as_bytes()).map_err(|e| io_err(&path, e))?;
        if file.executable {
            set_executable(&path)?;
        }
    }
    Ok(())
}

fn write_into_existing(
    tree: &OutputTree,
    destination: &Path,
    options: &WriteOptions,
) -> Result<Vec<WriteResult>, WriteError> {
    let mut results = Vec::with_capacity(tree.len());
    for (rel, file) in tree.iter() {
        let path = destination.join(rel);
        if path.exists() && options.policy == ExistingPolicy::SkipExisting {
            tracing::debug!("skipped: {}", path.display());
            results.push(WriteResult::Skipped { path });
            continue;
        }
        results.push(atomic_write(&path, file.as_bytes(), file.executable, options.dry_run)?);
    }
    Ok(results)
}

// ---------------------------------------------------------------------------
// atomic_write
// ---------------------------------------------------------------------------

/// Atomically replace the file at `path` unless it already holds `content`
/// with the requested executable bit.
pub fn atomic_write(
    path: &Path,
    content: &[u8],
    executable: bool,
    dry_run: bool,
) -> Result<WriteResult, WriteError> {
    let tmp = PathBuf::from(format!("{}.scaffold.tmp", path.display()));
    atomic_write_with_tmp(path, content, executable, dry_run, &tmp)
}

fn atomic_write_with_tmp(
    path: &Path,
    content: &[u8],
    executable: bool,
    dry_run: bool,
    tmp: &Path,
) -> Result<WriteResult, WriteError> {
    if path.is_file() {
        let existing = std::fs::read(path).map_err(|e| io_err(path, e))?;
        if content_digest(&existing) == content_digest(content)
            && mode_matches(path, executable)?
        {
            tracing::debug!("unchanged: {}", path.display());
            return Ok(WriteResult::Unchanged {
                path: path.to_path_buf(),
            });
        }
    }

    if dry_run {
        tracing::info!("[dry-run] would write: {}", path.display());
        return Ok(WriteResult::WouldWrite {
            path: path.to_path_buf(),
        });
    }

    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if let Some(tmp_parent) = tmp.parent() {
        std::fs::create_dir_all(tmp_parent).map_err(|e| io_err(tmp_parent, e))?;
    }
    std::fs::write(tmp, content).map_err(|e| io_err(tmp, e))?;
    if executable {
        set_executable(tmp)?;
    }

    if let Err(e) = std::fs::rename(tmp, path) {
        let _ = std::fs::remove_file(tmp);
        return Err(io_err(path, e));
    }

    tracing::info!("wrote: {}", path.display());
    Ok(WriteResult::Written {
        path: path.to_path_buf(),
    })
}

#[cfg(unix)]
fn set_executable(path: &Path) -> Result<(), WriteError> {
    use std::os::unix::fs::PermissionsExt;
    std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o755))
        .map_err(|e| io_err(path, e))
}

#[cfg(not(unix))]
fn set_executable(_path: &Path) -> Result<(), WriteError> {
    Ok(())
}

#[cfg(unix)]
fn mode_matches(path: &Path, executable: bool) -> Result<bool, WriteError> {
    use std::os::unix::fs::PermissionsExt;
    let mode = std::fs::metadata(path)
        .map_err(|e| io_err(path, e))?
        .permissions()
        .mode();
    Ok((mode & 0o111 != 0) == executable)
}

#[cfg(not(unix))]
fn mode_matches(_path: &Path, _executable: bool) -> Result<bool, WriteError> {
    Ok(true)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
