//! Windows installs under `Program Files` with a Start Menu shortcut.
//!
//! The shortcut is an Internet Shortcut (`.url`) file pointing at the
//! installed executable, which Explorer and the Start Menu treat as a launcher.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{BundleError, InstallContext, InstallOutcome, InstallReport, Packaging, assemble_flat};
use crate::config::Project;
use crate::platform::Platform;
use crate::utils::fs_ops;
use crate::utils::process::ToolRunner;

#[derive(Debug, Default, Clone, Copy)]
pub struct WindowsPackaging;

/// `Program Files`, or `Program Files (x86)` for 32-bit builds.
pub fn program_files_dir() -> &'static str {
    if cfg!(target_pointer_width = "32") {
        "Program Files (x86)"
    } else {
        "Program Files"
    }
}

impl Packaging for WindowsPackaging {
    fn platform(&self) -> Platform {
        Platform::Windows
    }

    fn assemble(
        &self,
        project: &Project,
        _version: &str,
        _runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BundleError> {
        assemble_flat(project)
    }

    fn built_artifact(&self, project: &Project) -> PathBuf {
        project.dist_dir().join(&project.product)
    }

    fn install(&self, project: &Project, ctx: &mut InstallContext<'_>) -> io::Result<InstallOutcome> {
        let artifact = self.built_artifact(project);
        let single_exe = project.dist_dir().join(exe_name(project));
        if !fs_ops::entry_exists(&artifact) && !single_exe.is_file() {
            return Ok(InstallOutcome::NotBuilt { expected: artifact });
        }

        let destination = ctx.rooted(&[program_files_dir()]).join(&project.product);
        let question = format!(
            "You already have a copy of {} at {}. Would you like to remove it and continue?",
            project.product,
            destination.display()
        );
        if !ctx.clear_previous(&destination, &question, &[destination.clone()])? {
            return Ok(InstallOutcome::Declined);
        }

        if artifact.is_dir() {
            fs_ops::copy_dir_recursive(&artifact, &destination)?;
        } else {
            let source = if artifact.is_file() { &artifact } else { &single_exe };
            fs::create_dir_all(&destination)?;
            fs_ops::copy_file_with_permissions(source, &destination.join(exe_name(project)))?;
        }

        let executable = destination.join(exe_name(project));
        let link = match &ctx.start_menu {
            Some(menu) => {
                fs::create_dir_all(menu)?;
                let shortcut = menu.join(format!("{}.url", project.product));
                fs::write(&shortcut, shortcut_contents(&executable))?;
                Some(shortcut)
            }
            None => {
                log::warn!("Could not locate the Start Menu; no shortcut created");
                None
            }
        };

        Ok(InstallOutcome::Installed(InstallReport {
            location: destination,
            link,
            not_on_path: None,
        }))
    }
}

fn exe_name(project: &Project) -> String {
    format!("{}.exe", project.product)
}

/// Internet Shortcut file launching `executable`.
pub fn shortcut_contents(executable: &Path) -> String {
    format!(
        "[InternetShortcut]\r\nURL={}\r\nIconFile={}\r\nIconIndex=0\r\n",
        file_url(executable),
        executable.display()
    )
}

fn file_url(path: &Path) -> String {
    let text = path.to_string_lossy().replace('\\', "/");
    let mut encoded = String::with_capacity(text.len());
    for byte in text.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'.' | b'_' | b'~' | b'/' | b':' => {
                encoded.push(char::from(byte))
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    if encoded.starts_with('/') {
        format!("file://{}", encoded)
    } else {
        format!("file:///{}", encoded)
    }
}
