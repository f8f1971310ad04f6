use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::Path;

/// Remove a file, symlink or directory tree.
///
/// A path that does not exist is not an error.
pub fn delete(path: &Path) -> io::Result<()> {
    let metadata = match fs::symlink_metadata(path) {
        Ok(m) => m,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
        Err(e) => return Err(e),
    };

    let result = if metadata.is_dir() {
        fs::remove_dir_all(path)
    } else {
        fs::remove_file(path)
    };

    match result {
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// True if something (including a dangling symlink) exists at `path`.
pub fn entry_exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}

/// Recursively copy a directory, preserving execute permissions.
///
/// Fails if `src` is not a directory.
pub fn copy_dir_recursive(src: &Path, dst: &Path) -> io::Result<()> {
    if !src.is_dir() {
        return Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("Source is not a directory: {}", src.display()),
        ));
    }

    fs::create_dir_all(dst)?;

    for entry in fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());
        let file_type = entry.file_type()?;

        if file_type.is_dir() {
            copy_dir_recursive(&src_path, &dst_path)?;
        } else if file_type.is_symlink() {
            copy_symlink(&src_path, &dst_path)?;
        } else {
            copy_file_with_permissions(&src_path, &dst_path)?;
        }
    }

    Ok(())
}

/// Copy a single file along with its permission bits.
pub fn copy_file_with_permissions(src: &Path, dst: &Path) -> io::Result<()> {
    // fs::copy carries permission bits over on every supported platform
    fs::copy(src, dst)?;
    Ok(())
}

#[cfg(unix)]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    let target = fs::read_link(src)?;
    std::os::unix::fs::symlink(target, dst)
}

#[cfg(not(unix))]
fn copy_symlink(src: &Path, dst: &Path) -> io::Result<()> {
    if src.is_dir() {
        copy_dir_recursive(src, dst)
    } else {
        copy_file_with_permissions(src, dst)
    }
}

/// Check whether `dir` is one of the entries of a PATH-style variable.
pub fn dir_on_search_path(dir: &Path, search_path: Option<&OsStr>) -> bool {
    match search_path {
        Some(value) => std::env::split_paths(value).any(|entry| entry == dir),
        None => false,
    }
}
