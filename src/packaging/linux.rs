//! Linux installs under `/usr/local`.
//!
//! A directory build goes to `/usr/local/opt/<Product>` with a symlink to its
//! executable in `/usr/local/bin`; a single-file build is copied straight into
//! `/usr/local/bin`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::{BundleError, InstallContext, InstallOutcome, InstallReport, Packaging, assemble_flat};
use crate::config::Project;
use crate::platform::Platform;
use crate::utils::fs_ops;
use crate::utils::process::ToolRunner;

/// Directory that is expected on the user's PATH.
pub const BIN_DIR: &str = "/usr/local/bin";

#[derive(Debug, Default, Clone, Copy)]
pub struct LinuxPackaging;

impl Packaging for LinuxPackaging {
    fn platform(&self) -> Platform {
        Platform::Linux
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
        if !fs_ops::entry_exists(&artifact) {
            return Ok(InstallOutcome::NotBuilt { expected: artifact });
        }

        let bin_dir = ctx.rooted(&["usr", "local", "bin"]);
        let opt_dir = ctx.rooted(&["usr", "local", "opt"]).join(&project.product);
        let bin_entry = bin_dir.join(&project.product);

        let question = format!(
            "You already have a copy of {} installed. Would you like to remove it and continue?",
            project.product
        );
        if !ctx.clear_previous(&bin_entry, &question, &[opt_dir.clone(), bin_entry.clone()])? {
            return Ok(InstallOutcome::Declined);
        }

        fs::create_dir_all(&bin_dir)?;
        let report = if artifact.is_dir() {
            fs_ops::copy_dir_recursive(&artifact, &opt_dir)?;
            link_executable(&opt_dir.join(&project.product), &bin_entry)?;
            InstallReport {
                location: opt_dir,
                link: Some(bin_entry),
                not_on_path: None,
            }
        } else {
            fs_ops::copy_file_with_permissions(&artifact, &bin_entry)?;
            InstallReport {
                location: bin_entry,
                link: None,
                not_on_path: None,
            }
        };

        let bin = Path::new(BIN_DIR);
        let not_on_path = if fs_ops::dir_on_search_path(bin, ctx.search_path.as_deref()) {
            None
        } else {
            Some(bin.to_path_buf())
        };

        Ok(InstallOutcome::Installed(InstallReport {
            not_on_path,
            ..report
        }))
    }
}

#[cfg(unix)]
fn link_executable(target: &Path, link: &Path) -> io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

#[cfg(not(unix))]
fn link_executable(target: &Path, link: &Path) -> io::Result<()> {
    fs_ops::copy_file_with_permissions(target, link)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::ffi::OsString;
    use tempfile::tempdir;

    fn built_dir(project: &Project, content: &[u8]) {
        let dist = project.dist_dir().join("PySteamAuth");
        fs::create_dir_all(dist.join("lib")).unwrap();
        fs::write(dist.join("PySteamAuth"), content).unwrap();
        fs::write(dist.join("lib/libpython.so"), b"lib").unwrap();
    }

    fn context<'a>(
        root: PathBuf,
        assume_yes: bool,
        confirm: &'a mut dyn crate::utils::prompt::Confirm,
    ) -> InstallContext<'a> {
        InstallContext {
            root,
            assume_yes,
            confirm,
            search_path: Some(OsString::from("/usr/bin:/usr/local/bin")),
            start_menu: None,
        }
    }

    #[test]
    fn installs_directory_build_into_opt_with_bin_link() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        built_dir(&project, b"v2");
        let mut confirm = |_: &str| -> io::Result<bool> { panic!("should not prompt") };
        let mut ctx = context(temp.path().join("root"), false, &mut confirm);

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();

        let opt = temp.path().join("root/usr/local/opt/PySteamAuth");
        let bin = temp.path().join("root/usr/local/bin/PySteamAuth");
        match outcome {
            InstallOutcome::Installed(report) => {
                assert_eq!(report.location, opt);
                assert_eq!(report.link, Some(bin.clone()));
            }
            other => panic!("Expected Installed, got {:?}", other),
        }
        assert_eq!(fs::read(opt.join("lib/libpython.so")).unwrap(), b"lib");
        assert_eq!(fs::read(&bin).unwrap(), b"v2");
    }

    #[test]
    fn installs_single_file_build_into_bin() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        fs::create_dir_all(project.dist_dir()).unwrap();
        fs::write(project.dist_dir().join("PySteamAuth"), b"onefile").unwrap();
        let mut confirm = |_: &str| -> io::Result<bool> { Ok(true) };
        let mut ctx = context(temp.path().join("root"), false, &mut confirm);

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();

        let bin = temp.path().join("root/usr/local/bin/PySteamAuth");
        assert!(matches!(outcome, InstallOutcome::Installed(ref r) if r.location == bin && r.link.is_none()));
        assert_eq!(fs::read(&bin).unwrap(), b"onefile");
        assert!(!temp.path().join("root/usr/local/opt").exists());
    }

    #[test]
    fn assume_yes_replaces_previous_install_without_prompt() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        built_dir(&project, b"v2");
        let opt = temp.path().join("root/usr/local/opt/PySteamAuth");
        let bin = temp.path().join("root/usr/local/bin/PySteamAuth");
        fs::create_dir_all(&opt).unwrap();
        fs::write(opt.join("stale.so"), b"old").unwrap();
        fs::create_dir_all(bin.parent().unwrap()).unwrap();
        fs::write(&bin, b"v1").unwrap();

        let mut confirm = |_: &str| -> io::Result<bool> { panic!("should not prompt") };
        let mut ctx = context(temp.path().join("root"), true, &mut confirm);

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();

        assert!(matches!(outcome, InstallOutcome::Installed(_)));
        assert!(!opt.join("stale.so").exists());
        assert_eq!(fs::read(&bin).unwrap(), b"v2");
    }

    #[test]
    fn declining_leaves_previous_install_untouched() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        built_dir(&project, b"v2");
        let bin = temp.path().join("root/usr/local/bin/PySteamAuth");
        fs::create_dir_all(bin.parent().unwrap()).unwrap();
        fs::write(&bin, b"v1").unwrap();

        let mut questions = Vec::new();
        let mut confirm = |q: &str| -> io::Result<bool> {
            questions.push(q.to_string());
            Ok(false)
        };
        let mut ctx = context(temp.path().join("root"), false, &mut confirm);

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();
        drop(ctx);

        assert_eq!(outcome, InstallOutcome::Declined);
        assert_eq!(fs::read(&bin).unwrap(), b"v1");
        assert!(!temp.path().join("root/usr/local/opt").exists());
        assert_eq!(questions.len(), 1);
        assert!(questions[0].contains("PySteamAuth"));
    }

    #[test]
    fn missing_build_performs_no_mutation() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        let mut confirm = |_: &str| -> io::Result<bool> { Ok(true) };
        let mut ctx = context(temp.path().join("root"), true, &mut confirm);

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();

        assert_eq!(
            outcome,
            InstallOutcome::NotBuilt {
                expected: temp.path().join("src/dist/PySteamAuth")
            }
        );
        assert!(!temp.path().join("root").exists());
    }

    #[test]
    fn warns_when_bin_dir_not_on_path() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path().join("src"), "python3");
        built_dir(&project, b"v2");
        let mut confirm = |_: &str| -> io::Result<bool> { Ok(true) };
        let mut ctx = context(temp.path().join("root"), false, &mut confirm);
        ctx.search_path = Some(OsString::from("/usr/bin"));

        let outcome = LinuxPackaging.install(&project, &mut ctx).unwrap();

        match outcome {
            InstallOutcome::Installed(report) => {
                assert_eq!(report.not_on_path, Some(PathBuf::from(BIN_DIR)));
            }
            other => panic!("Expected Installed, got {:?}", other),
        }
    }
}
