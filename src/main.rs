use std::ffi::OsString;
use std::fmt::Display;
use std::path::PathBuf;
use std::process;

use clap::error::ErrorKind;
use clap::{Parser, Subcommand};
use env_logger::Env;
use psa_make::commands::build::{BuildError, BuildOptions};
use psa_make::commands::{build, clean, deps, install, run, ui_build};
use psa_make::config::Project;
use psa_make::packaging::{self, InstallContext};
use psa_make::platform::Platform;
use psa_make::utils::process::SystemRunner;
use psa_make::utils::prompt::StdinConfirm;

const USAGE: &str = "Invalid option\n\
Possible options: build [--dont-clean] [--dont-build-qt] [-v] [--zip], install [-y], \
run [--dont-rebuild-ui], clean, deps, pyqt-build";

#[derive(Parser)]
#[command(name = "psa-make")]
#[command(about = "Build, package and install PySteamAuth")]
#[command(version)]
struct Cli {
    /// Project root containing the application package
    #[arg(long, global = true, default_value = ".")]
    project_dir: PathBuf,

    /// Python interpreter that drives pyuic, pyrcc, Nuitka and pip
    #[arg(long, global = true, env = "PSA_PYTHON")]
    python: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a standalone executable and assemble the distribution
    Build {
        /// Keep outputs of previous builds
        #[arg(long)]
        dont_clean: bool,
        /// Do not recompile the Qt UI files
        #[arg(long)]
        dont_build_qt: bool,
        /// Show compiler progress
        #[arg(short = 'v', long)]
        verbose: bool,
        /// Zip the distribution into pkg/
        #[arg(long)]
        zip: bool,
    },
    /// Install the last build into the system location
    Install {
        /// Replace an existing install without asking
        #[arg(short = 'y', long = "yes")]
        yes: bool,
        /// Stage the install under this directory instead of the filesystem root
        #[arg(long)]
        destdir: Option<PathBuf>,
    },
    /// Run the application from source
    Run {
        /// Do not recompile the Qt UI files first
        #[arg(long)]
        dont_rebuild_ui: bool,
        /// Arguments passed on to the application
        #[arg(trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<OsString>,
    },
    /// Remove build outputs and Python bytecode
    Clean,
    /// Install the application's Python dependencies
    Deps,
    /// Compile the Qt UI files only
    PyqtBuild,
}

/// Lowercase the action word so `BUILD` and `build` are the same action.
fn normalize_action(mut args: Vec<OsString>) -> Vec<OsString> {
    let mut index = 1;
    while index < args.len() {
        let arg = args[index].to_string_lossy().into_owned();
        if arg == "--project-dir" || arg == "--python" {
            index += 2;
            continue;
        }
        if !arg.starts_with('-') {
            args[index] = OsString::from(arg.to_lowercase());
            break;
        }
        index += 1;
    }
    args
}

fn fail(error: impl Display) -> ! {
    eprintln!("Error: {}", error);
    process::exit(1);
}

fn main() {
    env_logger::Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp(None)
        .format_target(false)
        .init();

    let args = normalize_action(std::env::args_os().collect());
    let program = args
        .first()
        .map(|a| a.to_string_lossy().into_owned())
        .unwrap_or_else(|| "psa-make".to_string());

    let cli = match Cli::try_parse_from(&args) {
        Ok(cli) => cli,
        Err(e) if e.kind() == ErrorKind::InvalidSubcommand => {
            println!("{}", USAGE);
            return;
        }
        Err(e) => e.exit(),
    };

    let Some(command) = cli.command else {
        println!("{}", USAGE);
        return;
    };

    let project = match Project::load(&cli.project_dir, cli.python) {
        Ok(project) => project,
        Err(e) => fail(e),
    };
    let runner = SystemRunner;
    let platform = Platform::current();

    match command {
        Commands::Build {
            dont_clean,
            dont_build_qt,
            verbose,
            zip,
        } => {
            let options = BuildOptions {
                skip_clean: dont_clean,
                skip_ui: dont_build_qt,
                verbose,
                zip,
            };
            let packaging = platform.packaging();
            match build::run(&project, packaging.as_ref(), &runner, options) {
                Ok(_) => {}
                Err(BuildError::Compile(e)) => {
                    println!("Nuitka compilation failed");
                    fail(e);
                }
                Err(e) => fail(e),
            }
        }
        Commands::Install { yes, destdir } => {
            let (root, start_menu) = match destdir {
                Some(dir) => {
                    let menu = dir.join("Start Menu").join("Programs");
                    (dir, Some(menu))
                }
                None => (
                    packaging::default_install_root(),
                    packaging::default_start_menu(),
                ),
            };
            let mut confirm = StdinConfirm;
            let mut ctx = InstallContext {
                root,
                assume_yes: yes,
                confirm: &mut confirm,
                search_path: std::env::var_os("PATH"),
                start_menu,
            };
            let packaging = platform.packaging();
            match install::run(&project, packaging.as_ref(), &mut ctx) {
                Ok(result) => {
                    for line in install::describe(&result, &program, &project) {
                        println!("{}", line);
                    }
                }
                Err(e) => fail(e),
            }
        }
        Commands::Run {
            dont_rebuild_ui,
            args,
        } => {
            let (flag_in_args, forwarded) = run::split_args(args);
            if !project.entry_point().is_file() {
                println!(
                    "Could not find {}; run this from the project root or pass --project-dir.",
                    project.entry_point().display()
                );
                return;
            }
            if !(dont_rebuild_ui || flag_in_args) {
                if let Err(e) = ui_build::run(&project, &runner) {
                    fail(e);
                }
            }
            match run::hand_off(run::app_command(&project, &forwarded)) {
                Ok(code) => process::exit(code),
                Err(e) => fail(e),
            }
        }
        Commands::Clean => {
            if let Err(e) = clean::run(&project) {
                fail(e);
            }
        }
        Commands::Deps => {
            if let Err(e) = deps::run(&project, &runner) {
                match e.exit_code() {
                    Some(code) => process::exit(code),
                    None => fail(e),
                }
            }
        }
        Commands::PyqtBuild => {
            if let Err(e) = ui_build::run(&project, &runner) {
                fail(e);
            }
        }
    }
}
