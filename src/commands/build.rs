//! Full build pipeline: clean, compile UI sources, compile the application
//! with Nuitka, assemble the platform layout and optionally zip it.

use std::fmt;
use std::fs;
use std::io;
use std::path::PathBuf;
use std::time::Instant;

use crate::commands::clean;
use crate::commands::ui_build::{self, UiBuildError};
use crate::config::Project;
use crate::packaging::{BundleError, Packaging};
use crate::platform::{self, Platform};
use crate::utils::archive;
use crate::utils::process::{Invocation, ToolError, ToolRunner};
use crate::utils::version;

/// Options for the `build` action.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BuildOptions {
    /// Skip removing previous outputs first.
    pub skip_clean: bool,
    /// Skip regenerating the Qt UI modules.
    pub skip_ui: bool,
    /// Ask the compiler to show its progress.
    pub verbose: bool,
    /// Zip the distribution into `pkg/`.
    pub zip: bool,
}

/// What a successful build produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildReport {
    pub version: String,
    pub artifact: PathBuf,
    pub archive: Option<PathBuf>,
}

/// Errors from the build pipeline. All of them abort the build.
#[derive(Debug)]
pub enum BuildError {
    /// Removing previous outputs failed.
    Clean(io::Error),
    /// Compiling the UI sources failed.
    Ui(UiBuildError),
    /// The build directory could not be created.
    BuildDir { path: PathBuf, source: io::Error },
    /// The native compiler is missing or exited unsuccessfully.
    Compile(ToolError),
    /// Assembling the platform layout failed.
    Bundle(BundleError),
    /// Writing the zip archive failed.
    Archive { path: PathBuf, source: io::Error },
}

impl fmt::Display for BuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BuildError::Clean(e) => write!(f, "clean failed: {}", e),
            BuildError::Ui(e) => write!(f, "UI build failed: {}", e),
            BuildError::BuildDir { path, source } => {
                write!(f, "failed to create {}: {}", path.display(), source)
            }
            BuildError::Compile(e) => write!(f, "Nuitka compilation failed: {}", e),
            BuildError::Bundle(e) => write!(f, "bundle assembly failed: {}", e),
            BuildError::Archive { path, source } => {
                write!(f, "failed to write {}: {}", path.display(), source)
            }
        }
    }
}

impl std::error::Error for BuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BuildError::Clean(e) => Some(e),
            BuildError::Ui(e) => Some(e),
            BuildError::BuildDir { source, .. } => Some(source),
            BuildError::Compile(e) => Some(e),
            BuildError::Bundle(e) => Some(e),
            BuildError::Archive { source, .. } => Some(source),
        }
    }
}

impl From<UiBuildError> for BuildError {
    fn from(e: UiBuildError) -> Self {
        BuildError::Ui(e)
    }
}

impl From<BundleError> for BuildError {
    fn from(e: BundleError) -> Self {
        BuildError::Bundle(e)
    }
}

/// The Nuitka command line for `platform`, run from the build directory.
pub fn compiler_invocation(project: &Project, platform: Platform, verbose: bool) -> Invocation {
    let entry_point = PathBuf::from("..").join(project.entry_point_relative());
    let invocation = Invocation::new(&project.python)
        .args(["-m", "nuitka", "--standalone", "--follow-imports"])
        .arg(format!("--plugin-enable=qt-plugins={}", platform.qt_plugins()))
        .arg(entry_point)
        .current_dir(project.build_dir());
    if verbose {
        invocation.arg("--show-progress")
    } else {
        invocation
    }
}

/// Run the native compiler and report how long it took.
pub fn compile(
    project: &Project,
    platform: Platform,
    runner: &dyn ToolRunner,
    verbose: bool,
) -> Result<(), BuildError> {
    let build_dir = project.build_dir();
    fs::create_dir_all(&build_dir).map_err(|source| BuildError::BuildDir {
        path: build_dir.clone(),
        source,
    })?;

    let invocation = compiler_invocation(project, platform, verbose);
    let started = Instant::now();
    runner.status(&invocation).map_err(BuildError::Compile)?;
    println!(
        "Nuitka compilation took {:.2} seconds",
        started.elapsed().as_secs_f64()
    );
    Ok(())
}

/// Run the whole pipeline with the given platform's packaging rules.
pub fn run(
    project: &Project,
    packaging: &dyn Packaging,
    runner: &dyn ToolRunner,
    options: BuildOptions,
) -> Result<BuildReport, BuildError> {
    let platform = packaging.platform();

    if !options.skip_clean {
        clean::run(project).map_err(BuildError::Clean)?;
    }
    if !options.skip_ui {
        ui_build::run(project, runner)?;
    }

    compile(project, platform, runner, options.verbose)?;

    let version = version::resolve_version(runner, &project.root, &project.default_version);
    log::info!("Packaging {} {} for {}", project.product, version, platform);

    let artifact = packaging.assemble(project, &version, runner)?;
    println!("Built {}", artifact.display());

    let archive = if options.zip {
        let path = write_archive(project, platform, &version)?;
        println!("Packaged {}", path.display());
        Some(path)
    } else {
        None
    };

    Ok(BuildReport {
        version,
        artifact,
        archive,
    })
}

fn write_archive(project: &Project, platform: Platform, version: &str) -> Result<PathBuf, BuildError> {
    let pkg_dir = project.pkg_dir();
    let name = archive::archive_name(&project.product, version, platform.id(), platform::machine());
    let path = pkg_dir.join(name);

    fs::create_dir_all(&pkg_dir)
        .and_then(|()| archive::zip_directory(&project.dist_dir(), &path))
        .map_err(|source| BuildError::Archive {
            path: path.clone(),
            source,
        })?;
    Ok(path)
}
