use crate::config::Project;
use crate::utils::process::{Invocation, ToolError, ToolRunner};

/// `<python> -m pip install -U -r <requirements>`, run in the project root.
pub fn pip_invocation(project: &Project) -> Invocation {
    Invocation::new(&project.python)
        .args(["-m", "pip", "install", "-U", "-r"])
        .arg(project.requirements_path())
        .current_dir(&project.root)
}

/// Install or upgrade the application's Python dependencies.
pub fn run(project: &Project, runner: &dyn ToolRunner) -> Result<(), ToolError> {
    runner.status(&pip_invocation(project))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::process::testing::{failed, ScriptedRunner};

    #[test]
    fn installs_from_requirements_file() {
        let project = Project::new("/src", "python3");
        let runner = ScriptedRunner::new(|_| Ok(String::new()));

        run(&project, &runner).unwrap();

        let calls = runner.calls.borrow();
        assert_eq!(calls.len(), 1);
        let line = calls[0].to_string();
        assert!(line.starts_with("python3 -m pip install -U -r "));
        assert!(line.ends_with("requirements.txt"));
        assert_eq!(calls[0].cwd.as_deref(), Some(std::path::Path::new("/src")));
    }

    #[test]
    fn pip_exit_code_is_passed_through() {
        let project = Project::new("/src", "python3");
        let runner = ScriptedRunner::new(|inv| Err(failed(inv)));

        let err = run(&project, &runner).unwrap_err();

        assert_eq!(err.exit_code(), Some(1));
    }
}
