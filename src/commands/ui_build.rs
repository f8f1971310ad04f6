//! Compile Qt Designer sources into Python modules.
//!
//! `.ui` files go through pyuic, `.qrc` files through pyrcc. Output lands in
//! a freshly recreated generated-sources package whose `__init__.py` imports
//! every generated module in sorted order.

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::config::Project;
use crate::utils::fs_ops::delete;
use crate::utils::process::{Invocation, ToolError, ToolRunner};

pub const AGGREGATOR_FILENAME: &str = "__init__.py";

/// A kind of Qt source file and the compiler that handles it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UiSourceKind {
    /// Qt Designer form (`.ui`).
    Form,
    /// Qt resource collection (`.qrc`).
    Resource,
}

impl UiSourceKind {
    pub const ALL: [UiSourceKind; 2] = [UiSourceKind::Form, UiSourceKind::Resource];

    pub fn extension(self) -> &'static str {
        match self {
            UiSourceKind::Form => "ui",
            UiSourceKind::Resource => "qrc",
        }
    }

    /// Python module the compiler is run as.
    pub fn compiler_module(self) -> &'static str {
        match self {
            UiSourceKind::Form => "PyQt5.uic.pyuic",
            UiSourceKind::Resource => "PyQt5.pyrcc_main",
        }
    }

    /// Name of the generated module for a source with the given stem.
    pub fn module_name(self, stem: &str) -> String {
        match self {
            UiSourceKind::Form => stem.to_string(),
            UiSourceKind::Resource => format!("{}_rc", stem),
        }
    }
}

/// Errors from compiling UI sources.
#[derive(Debug)]
pub enum UiBuildError {
    /// The generated-sources directory could not be reset or written.
    Io { path: PathBuf, source: io::Error },
    /// Source discovery failed.
    Discovery(String),
    /// The interpreter driving the compilers could not be run.
    Tool(ToolError),
}

impl fmt::Display for UiBuildError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UiBuildError::Io { path, source } => write!(f, "{}: {}", path.display(), source),
            UiBuildError::Discovery(msg) => write!(f, "failed to find UI sources: {}", msg),
            UiBuildError::Tool(e) => write!(f, "UI compiler unavailable: {}", e),
        }
    }
}

impl std::error::Error for UiBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            UiBuildError::Io { source, .. } => Some(source),
            UiBuildError::Tool(e) => Some(e),
            UiBuildError::Discovery(_) => None,
        }
    }
}

fn io_at(path: &Path) -> impl FnOnce(io::Error) -> UiBuildError + '_ {
    move |source| UiBuildError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Sources of one kind in `dir`, sorted by path.
pub fn discover(dir: &Path, kind: UiSourceKind) -> Result<Vec<PathBuf>, UiBuildError> {
    let escaped = glob::Pattern::escape(&dir.to_string_lossy());
    let pattern = format!("{}/*.{}", escaped, kind.extension());
    let mut sources = glob::glob(&pattern)
        .map_err(|e| UiBuildError::Discovery(e.to_string()))?
        .filter_map(|entry| match entry {
            Ok(path) => Some(path),
            Err(e) => {
                log::warn!("Skipping unreadable UI source: {}", e);
                None
            }
        })
        .collect::<Vec<_>>();
    sources.sort();
    Ok(sources)
}

/// Text of the aggregating `__init__.py` for the given module names.
pub fn aggregator_source(modules: &[String]) -> String {
    let mut sorted = modules.to_vec();
    sorted.sort();
    sorted.dedup();
    if sorted.is_empty() {
        String::new()
    } else {
        format!("from . import {}", sorted.join(", "))
    }
}

/// Compile every UI and resource source and write the aggregator.
///
/// Returns the names of the generated modules, sorted. A source whose
/// compiler run fails is logged and left out.
pub fn run(project: &Project, runner: &dyn ToolRunner) -> Result<Vec<String>, UiBuildError> {
    let sources_dir = project.ui_sources_dir();
    let generated_dir = project.generated_ui_dir();

    delete(&generated_dir).map_err(io_at(&generated_dir))?;
    fs::create_dir_all(&generated_dir).map_err(io_at(&generated_dir))?;

    let mut modules = Vec::new();
    for kind in UiSourceKind::ALL {
        for source in discover(&sources_dir, kind)? {
            let stem = match source.file_stem() {
                Some(stem) => stem.to_string_lossy().into_owned(),
                None => continue,
            };
            let module = kind.module_name(&stem);
            let output = generated_dir.join(format!("{}.py", module));

            let invocation = Invocation::new(&project.python)
                .args(["-m", kind.compiler_module()])
                .arg(&source)
                .arg("-o")
                .arg(&output);

            match runner.status(&invocation) {
                Ok(()) => modules.push(module),
                Err(e @ ToolError::Failed { .. }) => {
                    log::warn!("Could not compile {}: {}", source.display(), e);
                }
                Err(e) => return Err(UiBuildError::Tool(e)),
            }
        }
    }

    modules.sort();
    let aggregator = generated_dir.join(AGGREGATOR_FILENAME);
    fs::write(&aggregator, aggregator_source(&modules)).map_err(io_at(&aggregator))?;

    println!("Built {} PyUI files.", modules.len());
    Ok(modules)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::testing::{failed, ScriptedRunner};
    use tempfile::tempdir;

    fn project_with_sources(files: &[&str]) -> (tempfile::TempDir, Project) {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path(), "python3");
        fs::create_dir_all(project.ui_sources_dir()).unwrap();
        for name in files {
            fs::write(project.ui_sources_dir().join(name), b"<ui/>").unwrap();
        }
        (temp, project)
    }

    /// Pretends to be pyuic/pyrcc by writing the `-o` target.
    fn writing_runner() -> ScriptedRunner {
        ScriptedRunner::new(|inv| {
            let out = inv.args.last().unwrap();
            fs::write(out, b"# generated").unwrap();
            Ok(String::new())
        })
    }

    #[test]
    fn aggregator_is_sorted_regardless_of_input_order() {
        let a = aggregator_source(&["Main".into(), "Icons_rc".into(), "About".into()]);
        let b = aggregator_source(&["About".into(), "Main".into(), "Icons_rc".into()]);
        assert_eq!(a, "from . import About, Icons_rc, Main");
        assert_eq!(a, b);
    }

    #[test]
    fn aggregator_for_nothing_is_empty() {
        assert_eq!(aggregator_source(&[]), "");
    }

    #[test]
    fn compiles_forms_and_resources() {
        let (_temp, project) = project_with_sources(&["Main.ui", "About.ui", "icons.qrc", "notes.txt"]);
        let runner = writing_runner();

        let modules = run(&project, &runner).unwrap();

        assert_eq!(modules, vec!["About", "Main", "icons_rc"]);
        let generated = project.generated_ui_dir();
        assert!(generated.join("About.py").exists());
        assert!(generated.join("Main.py").exists());
        assert!(generated.join("icons_rc.py").exists());
        assert_eq!(
            fs::read_to_string(generated.join(AGGREGATOR_FILENAME)).unwrap(),
            "from . import About, Main, icons_rc"
        );

        let lines = runner.call_lines();
        assert_eq!(lines.len(), 3);
        assert!(lines.iter().filter(|l| l.contains("-m PyQt5.uic.pyuic")).count() == 2);
        assert!(lines.iter().any(|l| l.contains("-m PyQt5.pyrcc_main")));
    }

    #[test]
    fn stale_generated_files_are_removed() {
        let (_temp, project) = project_with_sources(&["Main.ui"]);
        fs::create_dir_all(project.generated_ui_dir()).unwrap();
        fs::write(project.generated_ui_dir().join("Removed.py"), b"old").unwrap();

        run(&project, &writing_runner()).unwrap();

        assert!(!project.generated_ui_dir().join("Removed.py").exists());
        assert!(project.generated_ui_dir().join("Main.py").exists());
    }

    #[test]
    fn failed_source_is_left_out() {
        let (_temp, project) = project_with_sources(&["Broken.ui", "Main.ui"]);
        let runner = ScriptedRunner::new(|inv| {
            let out = inv.args.last().unwrap();
            if out.to_string_lossy().ends_with("Broken.py") {
                Err(failed(inv))
            } else {
                fs::write(out, b"# generated").unwrap();
                Ok(String::new())
            }
        });

        let modules = run(&project, &runner).unwrap();

        assert_eq!(modules, vec!["Main"]);
    }

    #[test]
    fn missing_interpreter_is_fatal() {
        let (_temp, project) = project_with_sources(&["Main.ui"]);
        let result = run(&project, &ScriptedRunner::missing_tools());
        assert!(matches!(result, Err(UiBuildError::Tool(ToolError::NotFound { .. }))));
    }

    #[test]
    fn no_sources_writes_empty_aggregator() {
        let temp = tempdir().unwrap();
        let project = Project::new(temp.path(), "python3");

        let modules = run(&project, &ScriptedRunner::missing_tools()).unwrap();

        assert!(modules.is_empty());
        assert_eq!(
            fs::read_to_string(project.generated_ui_dir().join(AGGREGATOR_FILENAME)).unwrap(),
            ""
        );
    }
}
