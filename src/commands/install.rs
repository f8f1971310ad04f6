use std::io;
use std::path::PathBuf;

use crate::config::Project;
use crate::packaging::{InstallContext, InstallOutcome, Packaging};

/// Result of the `install` action as seen by the user.
#[derive(Debug)]
pub enum InstallResult {
    Done(InstallOutcome),
    /// The install location is not writable by this user.
    PermissionDenied(io::Error),
}

/// Install the previous build for this platform.
///
/// Permission problems are reported rather than returned as errors; every
/// other I/O failure is returned.
pub fn run(
    project: &Project,
    packaging: &dyn Packaging,
    ctx: &mut InstallContext<'_>,
) -> io::Result<InstallResult> {
    match packaging.install(project, ctx) {
        Ok(outcome) => Ok(InstallResult::Done(outcome)),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => {
            Ok(InstallResult::PermissionDenied(e))
        }
        Err(e) => Err(e),
    }
}

/// Lines to show the user for an install result.
pub fn describe(result: &InstallResult, program: &str, project: &Project) -> Vec<String> {
    match result {
        InstallResult::Done(InstallOutcome::Installed(report)) => {
            let mut lines = Vec::new();
            let name = report
                .location
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| project.product.clone());
            let parent = report
                .location
                .parent()
                .map(PathBuf::from)
                .unwrap_or_else(|| report.location.clone());
            match &report.link {
                Some(link) => lines.push(format!(
                    "{} has been installed to {} and linked from {}.",
                    name,
                    report.location.display(),
                    link.display()
                )),
                None => lines.push(format!(
                    "{} has been installed to {}.",
                    name,
                    parent.display()
                )),
            }
            if let Some(dir) = &report.not_on_path {
                lines.push(format!("{} is not in your $PATH", dir.display()));
            }
            lines
        }
        InstallResult::Done(InstallOutcome::NotBuilt { .. }) => vec![format!(
            "You must build the program first, like so:\n    {} build",
            program
        )],
        InstallResult::Done(InstallOutcome::Declined) => vec!["Aborted.".to_string()],
        InstallResult::Done(InstallOutcome::Unsupported) => vec![format!(
            "Unrecognized OS. '{} build' will build the executable and put it in the 'dist' directory.",
            program
        )],
        InstallResult::PermissionDenied(_) => {
            let hint = if cfg!(windows) {
                "Permission denied; Try running as Administrator?"
            } else {
                "Permission denied; Try with sudo?"
            };
            vec![hint.to_string()]
        }
    }
}
