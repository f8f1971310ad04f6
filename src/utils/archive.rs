//! Zip packaging of a distribution directory.

use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Name of the distributable archive: `<product>-<version>-<platform>-<arch>.zip`.
pub fn archive_name(product: &str, version: &str, platform_id: &str, arch: &str) -> String {
    format!("{}-{}-{}-{}.zip", product, version, platform_id, arch)
}

/// Zip everything under `root_dir` into `archive_path`.
///
/// Entry names are relative to `root_dir`, so the directory itself is not
/// part of the archive. Returns the number of files written.
pub fn zip_directory(root_dir: &Path, archive_path: &Path) -> io::Result<usize> {
    let file = File::create(archive_path)?;
    let mut zip = ZipWriter::new(file);
    let count = add_directory_contents(&mut zip, root_dir, "")?;
    zip.finish().map_err(io::Error::other)?;
    Ok(count)
}

fn sorted_entries(dir: &Path) -> io::Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()?;
    entries.sort();
    Ok(entries)
}

fn options_for(metadata: &fs::Metadata) -> SimpleFileOptions {
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        options.unix_permissions(metadata.permissions().mode())
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        options
    }
}

/// Recursively add directory contents to the archive.
///
/// Symbolic links are never followed. On Unix they are stored as links;
/// elsewhere a link to a file is stored as a copy and a link to a
/// directory is skipped.
fn add_directory_contents(
    zip: &mut ZipWriter<File>,
    dir: &Path,
    prefix: &str,
) -> io::Result<usize> {
    let mut count = 0;
    for path in sorted_entries(dir)? {
        let file_name = match path.file_name() {
            Some(name) => name.to_string_lossy().into_owned(),
            None => continue,
        };
        let name = if prefix.is_empty() {
            file_name
        } else {
            format!("{}/{}", prefix, file_name)
        };

        let metadata = fs::symlink_metadata(&path)?;
        let file_type = metadata.file_type();
        if file_type.is_symlink() {
            count += add_symlink(zip, &path, &name)?;
        } else if file_type.is_dir() {
            zip.add_directory(name.as_str(), options_for(&metadata))
                .map_err(io::Error::other)?;
            count += add_directory_contents(zip, &path, &name)?;
        } else {
            add_file(zip, &path, &name, &metadata)?;
            count += 1;
        }
    }
    Ok(count)
}

fn add_file(
    zip: &mut ZipWriter<File>,
    path: &Path,
    name: &str,
    metadata: &fs::Metadata,
) -> io::Result<()> {
    zip.start_file(name, options_for(metadata))
        .map_err(io::Error::other)?;
    let mut source = File::open(path)?;
    io::copy(&mut source, zip)?;
    Ok(())
}

#[cfg(unix)]
fn add_symlink(zip: &mut ZipWriter<File>, path: &Path, name: &str) -> io::Result<usize> {
    let target = fs::read_link(path)?;
    zip.add_symlink(
        name,
        target.to_string_lossy().into_owned(),
        SimpleFileOptions::default(),
    )
    .map_err(io::Error::other)?;
    Ok(1)
}

#[cfg(not(unix))]
fn add_symlink(zip: &mut ZipWriter<File>, path: &Path, name: &str) -> io::Result<usize> {
    match fs::metadata(path) {
        Ok(metadata) if metadata.is_file() => {
            add_file(zip, path, name, &metadata)?;
            Ok(1)
        }
        _ => {
            log::warn!("Skipping directory link {}", path.display());
            Ok(0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::tempdir;
    use zip::ZipArchive;

    #[test]
    fn archive_name_joins_components() {
        assert_eq!(
            archive_name("PySteamAuth", "1.2.3", "linux", "x86_64"),
            "PySteamAuth-1.2.3-linux-x86_64.zip"
        );
    }

    #[test]
    fn zips_contents_relative_to_root() {
        let dist = tempdir().unwrap();
        let out = tempdir().unwrap();
        fs::create_dir_all(dist.path().join("PySteamAuth/lib")).unwrap();
        fs::write(dist.path().join("PySteamAuth/PySteamAuth"), b"exe").unwrap();
        fs::write(dist.path().join("PySteamAuth/lib/libqt.so"), b"qt").unwrap();

        let archive_path = out.path().join("pkg.zip");
        let count = zip_directory(dist.path(), &archive_path).unwrap();
        assert_eq!(count, 2);

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "PySteamAuth/",
                "PySteamAuth/PySteamAuth",
                "PySteamAuth/lib/",
                "PySteamAuth/lib/libqt.so",
            ]
        );

        let mut content = String::new();
        archive
            .by_name("PySteamAuth/lib/libqt.so")
            .unwrap()
            .read_to_string(&mut content)
            .unwrap();
        assert_eq!(content, "qt");
    }

    #[cfg(unix)]
    #[test]
    fn directory_links_are_stored_as_links() {
        use std::os::unix::fs::symlink;

        let dist = tempdir().unwrap();
        let out = tempdir().unwrap();
        let versions = dist.path().join("QtCore.framework/Versions");
        fs::create_dir_all(versions.join("5")).unwrap();
        fs::write(versions.join("5/QtCore"), b"lib").unwrap();
        symlink("5", versions.join("Current")).unwrap();
        symlink("..", versions.join("loop")).unwrap();

        let archive_path = out.path().join("pkg.zip");
        let count = zip_directory(dist.path(), &archive_path).unwrap();
        assert_eq!(count, 3);

        let mut archive = ZipArchive::new(File::open(&archive_path).unwrap()).unwrap();
        let mut names: Vec<String> = archive.file_names().map(str::to_string).collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "QtCore.framework/",
                "QtCore.framework/Versions/",
                "QtCore.framework/Versions/5/",
                "QtCore.framework/Versions/5/QtCore",
                "QtCore.framework/Versions/Current",
                "QtCore.framework/Versions/loop",
            ]
        );

        let mut link = archive.by_name("QtCore.framework/Versions/Current").unwrap();
        let mode = link.unix_mode().unwrap();
        assert_eq!(mode & 0o170000, 0o120000);
        let mut target = String::new();
        link.read_to_string(&mut target).unwrap();
        assert_eq!(target, "5");
    }

    #[test]
    fn missing_root_is_error() {
        let out = tempdir().unwrap();
        let result = zip_directory(&out.path().join("nope"), &out.path().join("a.zip"));
        assert!(result.is_err());
    }
}
