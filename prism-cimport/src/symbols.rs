//! Exported-symbol enumeration for native libraries.
//!
//! The symbol table of a module is restricted to symbols its libraries
//! actually export. Only Windows has the tooling wired up (`vswhere` to
//! locate `dumpbin`, then `dumpbin /exports` against the SDK import
//! library); other platforms link everything and return an empty set.

use std::process::Command;

use anyhow::{Context, Result, bail};
use tracing::debug;

/// List the exported symbols of `lib`.
pub fn exported_symbols(lib: &str) -> Result<Vec<String>> {
    if !cfg!(windows) {
        return Ok(Vec::new());
    }
    windows_symbols(lib)
}

fn windows_symbols(lib: &str) -> Result<Vec<String>> {
    let vswhere = format!(
        "{}\\Microsoft Visual Studio\\Installer\\vswhere.exe",
        std::env::var("ProgramFiles(x86)").context("ProgramFiles(x86) is not set")?
    );
    let dumpbin = first_line(&run_capture(
        Command::new(&vswhere).args(["-latest", "-find", r"VC\Tools\**\x64\dumpbin.exe"]),
    )?)
    .context("vswhere found no dumpbin")?
    .to_string();
    let winsdk_bat = first_line(&run_capture(
        Command::new(&vswhere).args(["-latest", "-find", r"**\winsdk.bat"]),
    )?)
    .context("vswhere found no winsdk.bat")?
    .to_string();

    // winsdk.bat leaves the SDK location in the environment; run it through
    // the shell and read the variables back.
    let env_dump = run_capture(
        Command::new("cmd")
            .args(["/C", &format!("\"{winsdk_bat}\" > nul && set")])
            .env("VSCMD_ARG_HOST_ARCH", "x64")
            .env("VSCMD_ARG_TGT_ARCH", "x64"),
    )?;
    let sdk_dir = env_value(&env_dump, "WindowsSdkDir").context("WindowsSdkDir not reported")?;
    let sdk_version =
        env_value(&env_dump, "WindowsSDKVersion").context("WindowsSDKVersion not reported")?;

    let lib_path = format!("{sdk_dir}Lib\\{sdk_version}um\\x64\\{lib}");
    debug!(lib = %lib_path, "enumerating exports");
    let exports = run_capture(Command::new(&dumpbin).args(["/exports", &lib_path]))?;
    Ok(parse_exports(&exports))
}

/// Parse `dumpbin /exports` output: the column table that follows the
/// `ordinal ... name` header, up to the first blank line.
pub fn parse_exports(output: &str) -> Vec<String> {
    let mut symbols = Vec::new();
    let mut lines = output.lines();
    for line in lines.by_ref() {
        if line.contains("ordinal") && line.contains("name") {
            break;
        }
    }
    for line in lines.skip(1) {
        let line = line.trim();
        if line.is_empty() {
            // Blank lines before the body; the first one after it ends the
            // table.
            if symbols.is_empty() {
                continue;
            }
            break;
        }
        let mut columns = line.split("    ").map(str::trim).filter(|c| !c.is_empty());
        let first = columns.next();
        let symbol = columns.next().or(first);
        if let Some(symbol) = symbol {
            symbols.push(symbol.to_string());
        }
    }
    symbols
}

fn run_capture(cmd: &mut Command) -> Result<String> {
    let output = cmd
        .output()
        .with_context(|| format!("spawning {:?}", cmd.get_program()))?;
    if !output.status.success() {
        bail!("{:?} exited with {}", cmd.get_program(), output.status);
    }
    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn first_line(text: &str) -> Option<&str> {
    text.lines().map(str::trim).find(|line| !line.is_empty())
}

fn env_value<'a>(env_dump: &'a str, key: &str) -> Option<&'a str> {
    env_dump.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(str::trim)
    })
}
