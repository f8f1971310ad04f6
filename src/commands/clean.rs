use std::io;
use std::path::PathBuf;

use walkdir::WalkDir;

use crate::config::Project;
use crate::utils::fs_ops::delete;

/// Remove build outputs, packages and Python bytecode caches.
///
/// The build directory itself is kept since it holds the bundle manifest
/// template. Running this twice in a row is a no-op the second time.
pub fn run(project: &Project) -> io::Result<()> {
    for target in fixed_targets(project) {
        delete(&target)?;
    }

    for target in bytecode_targets(project) {
        delete(&target)?;
    }

    Ok(())
}

fn fixed_targets(project: &Project) -> Vec<PathBuf> {
    vec![
        project.compile_scratch_dir(),
        project.compiler_output_dir(),
        project.staging_bundle_dir(),
        project.dist_dir(),
        project.pkg_dir(),
    ]
}

/// Every `__pycache__` directory and stray `*.pyc` file under the project root.
fn bytecode_targets(project: &Project) -> Vec<PathBuf> {
    let mut targets = Vec::new();
    let mut walker = WalkDir::new(&project.root).into_iter();

    while let Some(entry) = walker.next() {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                log::debug!("Skipping unreadable entry: {}", e);
                continue;
            }
        };

        let is_dir = entry.file_type().is_dir();
        if is_dir && entry.file_name() == "__pycache__" {
            targets.push(entry.into_path());
            walker.skip_current_dir();
        } else if !is_dir && entry.path().extension().is_some_and(|ext| ext == "pyc") {
            targets.push(entry.into_path());
        }
    }

    targets
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn populated_project() -> (tempfile::TempDir, Project) {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path(), "python3");

        fs::create_dir_all(project.compile_scratch_dir()).unwrap();
        fs::create_dir_all(project.compiler_output_dir().join("lib")).unwrap();
        fs::create_dir_all(project.staging_bundle_dir().join("Contents")).unwrap();
        fs::create_dir_all(project.dist_dir().join("PySteamAuth")).unwrap();
        fs::create_dir_all(project.pkg_dir()).unwrap();
        fs::write(project.plist_template(), "${VERSION}").unwrap();

        let app = project.app_dir();
        fs::create_dir_all(app.join("__pycache__")).unwrap();
        fs::write(app.join("__pycache__/PySteamAuth.cpython-311.pyc"), b"").unwrap();
        fs::create_dir_all(app.join("nested/deeper/__pycache__")).unwrap();
        fs::write(app.join("nested/legacy.pyc"), b"").unwrap();
        fs::write(app.join("PySteamAuth.py"), b"print()").unwrap();

        (temp, project)
    }

    #[test]
    fn removes_outputs_and_bytecode() {
        let (_temp, project) = populated_project();

        run(&project).unwrap();

        assert!(!project.compile_scratch_dir().exists());
        assert!(!project.compiler_output_dir().exists());
        assert!(!project.staging_bundle_dir().exists());
        assert!(!project.dist_dir().exists());
        assert!(!project.pkg_dir().exists());
        assert!(!project.app_dir().join("__pycache__").exists());
        assert!(!project.app_dir().join("nested/deeper/__pycache__").exists());
        assert!(!project.app_dir().join("nested/legacy.pyc").exists());
    }

    #[test]
    fn keeps_sources_and_template() {
        let (_temp, project) = populated_project();

        run(&project).unwrap();

        assert!(project.entry_point().exists());
        assert!(project.plist_template().exists());
        assert!(project.app_dir().join("nested/deeper").exists());
    }

    #[test]
    fn second_run_is_a_no_op() {
        let (_temp, project) = populated_project();

        run(&project).unwrap();
        run(&project).unwrap();

        assert!(!project.dist_dir().exists());
        assert!(!project.pkg_dir().exists());
    }

    #[test]
    fn empty_project_is_fine() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path(), "python3");
        run(&project).unwrap();
    }
}
