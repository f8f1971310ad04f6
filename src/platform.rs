//! Host platform detection.

use std::fmt;

use crate::packaging::{
    LinuxPackaging, MacOsPackaging, Packaging, UnsupportedPackaging, WindowsPackaging,
};

/// A platform this tool knows how to package for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    MacOs,
    Linux,
    Windows,
    Unsupported,
}

impl Platform {
    /// The platform this binary was compiled for.
    pub fn current() -> Platform {
        if cfg!(target_os = "macos") {
            Platform::MacOs
        } else if cfg!(target_os = "linux") {
            Platform::Linux
        } else if cfg!(target_os = "windows") {
            Platform::Windows
        } else {
            Platform::Unsupported
        }
    }

    /// Platform identifier used in archive names (Python's `sys.platform`).
    pub fn id(self) -> &'static str {
        match self {
            Platform::MacOs => "darwin",
            Platform::Linux => "linux",
            Platform::Windows => "win32",
            Platform::Unsupported => std::env::consts::OS,
        }
    }

    /// Value for Nuitka's `--plugin-enable=qt-plugins=` option.
    pub fn qt_plugins(self) -> &'static str {
        match self {
            Platform::Linux => "sensible,platformthemes",
            _ => "sensible,styles",
        }
    }

    /// Packaging rules for this platform.
    pub fn packaging(self) -> Box<dyn Packaging> {
        match self {
            Platform::MacOs => Box::new(MacOsPackaging),
            Platform::Linux => Box::new(LinuxPackaging),
            Platform::Windows => Box::new(WindowsPackaging),
            Platform::Unsupported => Box::new(UnsupportedPackaging),
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::MacOs => "macOS",
            Platform::Linux => "Linux",
            Platform::Windows => "Windows",
            Platform::Unsupported => std::env::consts::OS,
        };
        write!(f, "{}", name)
    }
}

/// Machine architecture used in archive names.
pub fn machine() -> &'static str {
    std::env::consts::ARCH
}
