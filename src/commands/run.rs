//! Launch the application from source.

use std::ffi::OsString;
use std::io;
use std::process::Command;

use crate::config::Project;

/// Flag that suppresses the UI rebuild; never forwarded to the application.
pub const NO_REBUILD_FLAG: &str = "--dont-rebuild-ui";

/// Split the arguments after `run` into the rebuild switch and the
/// arguments forwarded to the application.
pub fn split_args(args: Vec<OsString>) -> (bool, Vec<OsString>) {
    let mut skip_rebuild = false;
    let forwarded = args
        .into_iter()
        .filter(|arg| {
            if arg == NO_REBUILD_FLAG {
                skip_rebuild = true;
                false
            } else {
                true
            }
        })
        .collect();
    (skip_rebuild, forwarded)
}

/// `<python> <entry point> <args...>`
pub fn app_command(project: &Project, forwarded: &[OsString]) -> Command {
    let mut command = Command::new(&project.python);
    command.arg(project.entry_point()).args(forwarded);
    command
}

/// Hand control to the application.
///
/// On Unix the current process image is replaced and this only returns on
/// failure. Elsewhere the application runs as a child and its exit code is
/// returned.
pub fn hand_off(mut command: Command) -> io::Result<i32> {
    log::debug!("Launching {:?}", command);

    #[cfg(unix)]
    {
        use std::os::unix::process::CommandExt;
        Err(command.exec())
    }

    #[cfg(not(unix))]
    {
        let status = command.status()?;
        Ok(status.code().unwrap_or(1))
    }
}
