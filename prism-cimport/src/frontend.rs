//! Invocation of the external C front-end and loading of its AST dump.

use std::collections::HashSet;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::{debug, info};

use crate::ast::{Node, TranslationUnit};
use crate::platform::Platform;

/// Run the front-end over `header`, dumping the AST as JSON to `json_path`.
pub fn dump_ast(
    platform: Platform,
    frontend: Option<&str>,
    header: &Path,
    include_paths: &[PathBuf],
    json_path: &Path,
) -> Result<()> {
    let program = frontend.unwrap_or_else(|| platform.frontend_command());
    let platform_dir = json_path.parent().unwrap_or_else(|| Path::new("."));

    let out = File::create(json_path)
        .with_context(|| format!("creating {}", json_path.display()))?;

    let mut cmd = Command::new(program);
    cmd.args(["-Xclang", "-ast-dump=json", "-fsyntax-only"]);
    cmd.args(platform.include_args(platform_dir));
    for include in include_paths {
        cmd.arg(format!("-I{}", include.display()));
    }
    cmd.arg(header);
    cmd.stdout(out);

    debug!(program, header = %header.display(), "running front-end");
    let status = cmd
        .status()
        .with_context(|| format!("spawning the C front-end `{program}`"))?;
    if !status.success() {
        bail!(
            "front-end exited with {status} for {}",
            header.display()
        );
    }
    info!(json = %json_path.display(), "front-end dump complete");
    Ok(())
}

/// Load a dumped AST and return its top-level declarations.
pub fn load_ast(json_path: &Path) -> Result<Vec<Node>> {
    let data = std::fs::read_to_string(json_path)
        .with_context(|| format!("reading {}", json_path.display()))?;
    let unit: TranslationUnit = serde_json::from_str(&data)
        .with_context(|| format!("parsing AST dump {}", json_path.display()))?;
    Ok(unit.inner)
}

/// Collect the names listed on `%EXCLUDE` directive lines of a header.
/// Directives are a plain line scan, independent of C preprocessing.
pub fn scan_exclusions(header: &Path) -> Result<HashSet<String>> {
    let text = std::fs::read_to_string(header)
        .with_context(|| format!("reading {}", header.display()))?;
    Ok(parse_exclusions(&text))
}

/// The line-scan behind [`scan_exclusions`], split out for testing.
pub fn parse_exclusions(text: &str) -> HashSet<String> {
    let mut excluded = HashSet::new();
    for line in text.lines() {
        if let Some(rest) = line.strip_prefix("%EXCLUDE") {
            excluded.extend(rest.split_whitespace().map(str::to_string));
        }
    }
    excluded
}
