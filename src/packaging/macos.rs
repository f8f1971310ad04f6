//! macOS .app bundle assembly and installation.
//!
//! The bundle is staged in the build directory:
//!
//! ```text
//! <Product>.app/
//!   Contents/
//!     Info.plist     (rendered from build/Info.template.plist)
//!     MacOS/         (the compiler's standalone output)
//! ```
//!
//! and then moved into `dist`.

use std::fs;
use std::io;
use std::path::PathBuf;

use super::{BundleError, InstallContext, InstallOutcome, InstallReport, Packaging, at};
use crate::config::Project;
use crate::platform::Platform;
use crate::utils::fs_ops;
use crate::utils::process::ToolRunner;
use crate::utils::template;
use crate::utils::version;

pub const USERNAME_PLACEHOLDER: &str = "USERNAME";
pub const VERSION_PLACEHOLDER: &str = "VERSION";

#[derive(Debug, Default, Clone, Copy)]
pub struct MacOsPackaging;

impl Packaging for MacOsPackaging {
    fn platform(&self) -> Platform {
        Platform::MacOs
    }

    fn assemble(
        &self,
        project: &Project,
        version: &str,
        runner: &dyn ToolRunner,
    ) -> Result<PathBuf, BundleError> {
        let output = project.compiler_output_dir();
        if !output.is_dir() {
            return Err(BundleError::MissingCompilerOutput(output));
        }

        let template_path = project.plist_template();
        let template_text =
            fs::read_to_string(&template_path).map_err(|source| BundleError::TemplateRead {
                path: template_path.clone(),
                source,
            })?;
        let username = version::package_username(runner, &project.root, &project.default_username);
        let plist = template::render(
            &template_text,
            &[(USERNAME_PLACEHOLDER, username.as_str()), (VERSION_PLACEHOLDER, version)],
        )?;

        let dist = project.dist_dir();
        let destination = dist.join(project.bundle_name());
        if fs_ops::entry_exists(&destination) {
            return Err(BundleError::DestinationExists(destination));
        }

        let staging = project.staging_bundle_dir();
        let contents = staging.join("Contents");
        fs::create_dir(&staging).map_err(at(&staging))?;
        fs::create_dir(&contents).map_err(at(&contents))?;

        let plist_path = contents.join("Info.plist");
        fs::write(&plist_path, plist).map_err(at(&plist_path))?;

        let macos_dir = contents.join("MacOS");
        fs::rename(&output, &macos_dir).map_err(at(&macos_dir))?;

        fs::create_dir_all(&dist).map_err(at(&dist))?;
        fs::rename(&staging, &destination).map_err(at(&destination))?;

        Ok(destination)
    }

    fn built_artifact(&self, project: &Project) -> PathBuf {
        project.dist_dir().join(project.bundle_name())
    }

    fn install(&self, project: &Project, ctx: &mut InstallContext<'_>) -> io::Result<InstallOutcome> {
        let artifact = self.built_artifact(project);
        if !artifact.is_dir() {
            return Ok(InstallOutcome::NotBuilt { expected: artifact });
        }

        let applications = ctx.rooted(&["Applications"]);
        let destination = applications.join(project.bundle_name());
        let question = format!(
            "You already have a copy of {} installed. Would you like to remove it and continue?",
            project.product
        );
        if !ctx.clear_previous(&destination, &question, &[destination.clone()])? {
            return Ok(InstallOutcome::Declined);
        }

        fs::create_dir_all(&applications)?;
        fs_ops::copy_dir_recursive(&artifact, &destination)?;

        Ok(InstallOutcome::Installed(InstallReport {
            location: destination,
            link: None,
            not_on_path: None,
        }))
    }
}
