//! Project layout and settings.
//!
//! Paths are derived from the product name under a project root. An optional
//! `make.json` next to the application package overrides the defaults.

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::utils::version::{DEFAULT_USERNAME, DEFAULT_VERSION};

pub const DEFAULT_PRODUCT: &str = "PySteamAuth";
pub const PROJECT_FILENAME: &str = "make.json";
pub const REQUIREMENTS_FILENAME: &str = "requirements.txt";
pub const PLIST_TEMPLATE_FILENAME: &str = "Info.template.plist";

/// Optional overrides read from `make.json`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectFile {
    #[serde(default)]
    pub product: Option<String>,
    #[serde(default)]
    pub default_version: Option<String>,
    #[serde(default)]
    pub default_username: Option<String>,
    #[serde(default)]
    pub requirements: Option<PathBuf>,
}

impl ProjectFile {
    pub fn load(path: &Path) -> io::Result<ProjectFile> {
        let content = fs::read_to_string(path)?;
        serde_json::from_str(&content).map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
    }
}

/// Errors from loading project settings.
#[derive(Debug)]
pub enum ConfigError {
    /// `make.json` exists but could not be read or parsed.
    ProjectFile { path: PathBuf, source: io::Error },
    /// The product name cannot be used as a path component.
    InvalidProduct(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ProjectFile { path, source } => {
                write!(f, "failed to load {}: {}", path.display(), source)
            }
            ConfigError::InvalidProduct(name) => write!(f, "invalid product name: '{}'", name),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::ProjectFile { source, .. } => Some(source),
            ConfigError::InvalidProduct(_) => None,
        }
    }
}

/// Resolved settings and layout for one project checkout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Project {
    pub root: PathBuf,
    pub product: String,
    pub python: PathBuf,
    pub default_version: String,
    pub default_username: String,
    pub requirements: PathBuf,
}

impl Project {
    /// A project with built-in defaults.
    pub fn new(root: impl Into<PathBuf>, python: impl Into<PathBuf>) -> Self {
        Project {
            root: root.into(),
            product: DEFAULT_PRODUCT.to_string(),
            python: python.into(),
            default_version: DEFAULT_VERSION.to_string(),
            default_username: DEFAULT_USERNAME.to_string(),
            requirements: PathBuf::from(REQUIREMENTS_FILENAME),
        }
    }

    /// Load settings for `root`, applying `make.json` if present.
    pub fn load(root: &Path, python: Option<PathBuf>) -> Result<Project, ConfigError> {
        let python = python.unwrap_or_else(default_python);
        let mut project = Project::new(root, python);

        let path = root.join(PROJECT_FILENAME);
        if path.is_file() {
            let file = ProjectFile::load(&path).map_err(|source| ConfigError::ProjectFile {
                path: path.clone(),
                source,
            })?;
            log::debug!("Loaded project settings from {}", path.display());
            project.apply(file);
        }

        project.validate()?;
        Ok(project)
    }

    fn apply(&mut self, file: ProjectFile) {
        if let Some(product) = file.product {
            self.product = product;
        }
        if let Some(version) = file.default_version {
            self.default_version = version;
        }
        if let Some(username) = file.default_username {
            self.default_username = username;
        }
        if let Some(requirements) = file.requirements {
            self.requirements = requirements;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        let product = self.product.as_str();
        let bad = product.is_empty()
            || product == "."
            || product == ".."
            || product.contains(['/', '\\'])
            || product.contains(char::is_whitespace);
        if bad {
            Err(ConfigError::InvalidProduct(self.product.clone()))
        } else {
            Ok(())
        }
    }

    /// The application package directory, `<root>/<product>`.
    pub fn app_dir(&self) -> PathBuf {
        self.root.join(&self.product)
    }

    /// `<product>/<product>.py`, relative to the project root.
    pub fn entry_point_relative(&self) -> PathBuf {
        Path::new(&self.product).join(format!("{}.py", self.product))
    }

    pub fn entry_point(&self) -> PathBuf {
        self.root.join(self.entry_point_relative())
    }

    /// Qt Designer `.ui` and `.qrc` sources.
    pub fn ui_sources_dir(&self) -> PathBuf {
        self.app_dir().join("UIs")
    }

    /// Generated Python modules for the UI sources.
    pub fn generated_ui_dir(&self) -> PathBuf {
        self.app_dir().join("PyUIs")
    }

    pub fn build_dir(&self) -> PathBuf {
        self.root.join("build")
    }

    /// Nuitka's intermediate C sources.
    pub fn compile_scratch_dir(&self) -> PathBuf {
        self.build_dir().join(format!("{}.build", self.product))
    }

    /// Nuitka's standalone output.
    pub fn compiler_output_dir(&self) -> PathBuf {
        self.build_dir().join(format!("{}.dist", self.product))
    }

    /// Where the macOS bundle is assembled before moving into `dist`.
    pub fn staging_bundle_dir(&self) -> PathBuf {
        self.build_dir().join(self.bundle_name())
    }

    pub fn plist_template(&self) -> PathBuf {
        self.build_dir().join(PLIST_TEMPLATE_FILENAME)
    }

    pub fn dist_dir(&self) -> PathBuf {
        self.root.join("dist")
    }

    pub fn pkg_dir(&self) -> PathBuf {
        self.root.join("pkg")
    }

    /// `<product>.app`
    pub fn bundle_name(&self) -> String {
        format!("{}.app", self.product)
    }

    pub fn requirements_path(&self) -> PathBuf {
        self.root.join(&self.requirements)
    }
}

/// First Python interpreter found on PATH.
pub fn default_python() -> PathBuf {
    ["python3", "python"]
        .iter()
        .find_map(|name| which::which(name).ok())
        .unwrap_or_else(|| PathBuf::from("python3"))
}
