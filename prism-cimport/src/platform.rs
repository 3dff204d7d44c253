//! Host platform table: front-end binary, implicit include directories, and
//! output directory naming.

use std::ffi::OsString;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Linux,
    MacOs,
    Windows,
}

impl Platform {
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else if cfg!(target_os = "macos") {
            Platform::MacOs
        } else {
            Platform::Linux
        }
    }

    /// Platform name as used in module configuration and output paths.
    pub fn name(self) -> &'static str {
        match self {
            Platform::Linux => "linux",
            Platform::MacOs => "macos",
            Platform::Windows => "windows",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "linux" => Some(Platform::Linux),
            "macos" => Some(Platform::MacOs),
            "windows" => Some(Platform::Windows),
            _ => None,
        }
    }

    /// Default C front-end binary.
    pub fn frontend_command(self) -> &'static str {
        match self {
            Platform::Linux => "clang-13",
            Platform::MacOs => "/opt/homebrew/opt/llvm@13/bin/clang",
            Platform::Windows => "clang",
        }
    }

    /// Implicit include arguments for the front-end. `platform_dir` is the
    /// per-platform output directory, which doubles as an include root for
    /// the Windows shim headers.
    pub fn include_args(self, platform_dir: &Path) -> Vec<OsString> {
        match self {
            Platform::Linux => vec![],
            Platform::MacOs => vec![
                OsString::from("-I/opt/homebrew/opt/libffi/include"),
                OsString::from("-I/opt/homebrew/include"),
            ],
            Platform::Windows => vec![
                OsString::from("--include-directory"),
                platform_dir.as_os_str().to_os_string(),
            ],
        }
    }
}
