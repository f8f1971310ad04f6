//! Per-platform bundle layout and install rules.
//!
//! Each platform implements [`Packaging`]; the implementation is chosen once
//! through [`Platform::packaging`](crate::platform::Platform::packaging).

mod linux;
mod macos;
mod windows;

pub use linux::LinuxPackaging;
pub use macos::MacOsPackaging;
pub use windows::WindowsPackaging;

use std::ffi::OsString;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Project;
use crate::platform::Platform;
use crate::utils::fs_ops;
use crate::utils::process::ToolRunner;
use crate::utils::prompt::Confirm;
use crate::utils::template::TemplateError;

/// Errors from assembling the distribution layout.
#[derive(Debug)]
pub enum BundleError {
    /// The native compiler did not leave its output directory behind.
    MissingCompilerOutput(PathBuf),
    /// The distribution path is already taken.
    DestinationExists(PathBuf),
    /// Failed to read the manifest template.
    TemplateRead { path: PathBuf, source: io::Error },
    /// The manifest template could not be fully resolved.
    Template(TemplateError),
    /// Failed to create, write or move a file.
    Filesystem { path: PathBuf, source: io::Error },
}

impl fmt::Display for BundleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BundleError::MissingCompilerOutput(path) => {
                write!(f, "compiler output not found at {}", path.display())
            }
            BundleError::DestinationExists(path) => {
                write!(f, "{} already exists; run clean first", path.display())
            }
            BundleError::TemplateRead { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            BundleError::Template(e) => write!(f, "bad manifest template: {}", e),
            BundleError::Filesystem { path, source } => {
                write!(f, "{}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BundleError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BundleError::TemplateRead { source, .. } => Some(source),
            BundleError::Template(e) => Some(e),
            BundleError::Filesystem { source, .. } => Some(source),
            _ => None,
        }
    }
}

impl From<TemplateError> for BundleError {
    fn from(e: TemplateError) -> Self {
        BundleError::Template(e)
    }
}

/// Attach the path an I/O error happened on.
pub(crate) fn at(path: &Path) -> impl FnOnce(io::Error) -> BundleError + '_ {
    move |source| BundleError::Filesystem {
        path: path.to_path_buf(),
        source,
    }
}

/// Everything an install needs besides the project itself.
pub struct InstallContext<'a> {
    /// Filesystem root the OS-conventional paths are placed under.
    pub root: PathBuf,
    /// Replace an existing install without asking.
    pub assume_yes: bool,
    pub confirm: &'a mut dyn Confirm,
    /// Value of `PATH` for the search-path warning.
    pub search_path: Option<OsString>,
    /// Directory receiving the Windows Start Menu shortcut.
    pub start_menu: Option<PathBuf>,
}

impl InstallContext<'_> {
    /// `root` joined with an absolute-style path given as components.
    pub fn rooted(&self, components: &[&str]) -> PathBuf {
        components
            .iter()
            .fold(self.root.clone(), |path, part| path.join(part))
    }

    /// Make room for a new install at `existing`.
    ///
    /// Returns `false` if something is there and the user declined to remove it.
    /// On acceptance every path in `remove` is deleted.
    pub fn clear_previous(
        &mut self,
        existing: &Path,
        question: &str,
        remove: &[PathBuf],
    ) -> io::Result<bool> {
        if !fs_ops::entry_exists(existing) {
            return Ok(true);
        }
        if !self.assume_yes && !self.confirm.confirm(question)? {
            return Ok(false);
        }
        for path in remove {
            log::info!("Removing {}", path.display());
            fs_ops::delete(path)?;
        }
        Ok(true)
    }
}

/// Where an install ended up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallReport {
    pub location: PathBuf,
    /// Symlink or shortcut pointing at the installed program.
    pub link: Option<PathBuf>,
    /// Install directory that is missing from the shell's search path.
    pub not_on_path: Option<PathBuf>,
}

/// Result of an install attempt that did not hit an I/O error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    Installed(InstallReport),
    /// No build for this platform exists yet.
    NotBuilt { expected: PathBuf },
    /// The user chose to keep the existing install.
    Declined,
    /// This platform has no install rules.
    Unsupported,
}

/// Packaging rules for one platform.
pub trait Packaging {
    fn platform(&self) -> Platform;

    /// Turn the compiler output into the distribution layout.
    ///
    /// Returns the path of the assembled artifact under `dist`.
    fn assemble(
        &self,
        project: &Project,
        version: &str,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BundleError>;

    /// Path a successful build leaves its artifact at.
    fn built_artifact(&self, project: &Project) -> PathBuf;

    /// Copy a previously built artifact into the OS-conventional location.
    fn install(&self, project: &Project, ctx: &mut InstallContext<'_>) -> io::Result<InstallOutcome>;
}

/// Move the compiler output to `dist/<product>` as is.
pub(crate) fn assemble_flat(project: &Project) -> Result<PathBuf, BundleError> {
    let output = project.compiler_output_dir();
    if !output.is_dir() {
        return Err(BundleError::MissingCompilerOutput(output));
    }

    let dist = project.dist_dir();
    fs::create_dir_all(&dist).map_err(at(&dist))?;

    let destination = dist.join(&project.product);
    if fs_ops::entry_exists(&destination) {
        return Err(BundleError::DestinationExists(destination));
    }
    fs::rename(&output, &destination).map_err(at(&destination))?;
    Ok(destination)
}

/// Layout rules for platforms without native packaging.
///
/// Builds use the flat layout; installs are refused.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnsupportedPackaging;

impl Packaging for UnsupportedPackaging {
    fn platform(&self) -> Platform {
        Platform::Unsupported
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

    fn install(&self, _project: &Project, _ctx: &mut InstallContext<'_>) -> io::Result<InstallOutcome> {
        Ok(InstallOutcome::Unsupported)
    }
}

/// The real filesystem root installs go under by default.
pub fn default_install_root() -> PathBuf {
    #[cfg(windows)]
    {
        let drive = std::env::var_os("SystemDrive").unwrap_or_else(|| OsString::from("C:"));
        let mut root = PathBuf::from(drive);
        root.push("\\");
        root
    }

    #[cfg(not(windows))]
    {
        PathBuf::from("/")
    }
}

/// The per-user Start Menu programs folder.
pub fn default_start_menu() -> Option<PathBuf> {
    dirs::data_dir().map(|dir| {
        dir.join("Microsoft")
            .join("Windows")
            .join("Start Menu")
            .join("Programs")
    })
}
