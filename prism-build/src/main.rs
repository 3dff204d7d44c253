//! Build driver for the Prism bootstrap toolchain.
//!
//! Wraps the seed compiler: fetches a released binary, regenerates the C
//! bindings, rebuilds the compiler with itself, assembles release archives,
//! and runs the test suite. All the interesting work happens in child
//! processes; any of them exiting non-zero aborts the run.

use std::fs;
use std::path::Path;
use std::process::Command;

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::info;

/// prism-build — bootstrap and package the Prism compiler.
#[derive(Parser, Debug)]
#[command(name = "prism-build", version, about)]
struct Cli {
    #[command(subcommand)]
    command: Option<Cmd>,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Rebuild the compiler with the seed binary (the default).
    Build {
        /// Extra arguments passed through to the compiler.
        #[arg(trailing_var_arg = true)]
        extra: Vec<String>,
    },
    /// Two-stage rebuild, then assemble the release archive.
    Release,
    /// Build and run the test suite.
    Test {
        #[arg(trailing_var_arg = true)]
        extra: Vec<String>,
    },
    /// Remove build artifacts and archives.
    Clean,
    /// Fetch the seed compiler and regenerate the C bindings.
    Download,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    fs::create_dir_all("bin").context("creating bin/")?;
    fs::create_dir_all("build").context("creating build/")?;
    if !Path::new(&exe("bin/prism")).exists() {
        download()?;
    }

    match Cli::parse().command {
        None => build(&[]),
        Some(Cmd::Build { extra }) => build(&extra),
        Some(Cmd::Release) => release(),
        Some(Cmd::Test { extra }) => test(&extra),
        Some(Cmd::Clean) => clean(),
        Some(Cmd::Download) => download(),
    }
}

fn exe(name: &str) -> String {
    if cfg!(windows) {
        format!("{name}.exe")
    } else {
        name.to_string()
    }
}

/// The pinned seed compiler version, from the `version` file.
fn version() -> Result<String> {
    let text = fs::read_to_string("version").context("reading the version pin")?;
    text.split("VERSION=")
        .nth(1)
        .map(|v| v.trim().to_string())
        .context("version pin is malformed")
}

fn archive_name(version: &str) -> String {
    if cfg!(windows) {
        format!("prism-win32-{version}.zip")
    } else {
        format!("prism-{version}.tar.gz")
    }
}

/// Link flags the Windows toolchain needs for the compiler binaries.
const WIN_ARGS: [&str; 6] = [
    "-llibffi",
    "--link-flag",
    "/FORCE:UNRESOLVED",
    "--link-flag",
    "/STACK:67108864",
    "--clang=-gcodeview",
];

fn run_checked(program: &str, args: &[String]) -> Result<()> {
    info!(program, ?args, "running");
    let status = Command::new(program)
        .args(args)
        .status()
        .with_context(|| format!("spawning {program}"))?;
    if !status.success() {
        bail!("{program} exited with {status}");
    }
    Ok(())
}

fn compile(seed: &str, outfile: &str, main: &str, extra: &[String]) -> Result<()> {
    let mut args: Vec<String> = vec![
        "-d".to_string(),
        "-Isrc".to_string(),
        "--buildfolder=build".to_string(),
        "--outfile".to_string(),
        exe(outfile),
        main.to_string(),
    ];
    if cfg!(windows) {
        args.extend(WIN_ARGS.iter().map(|s| s.to_string()));
        if let Ok(lib_path) = std::env::var("LIBRARY_PATH") {
            args.push("--link-directory".to_string());
            args.push(lib_path);
        }
    }
    args.extend(extra.iter().cloned());
    run_checked(&exe(seed), &args)
}

fn build(extra: &[String]) -> Result<()> {
    compile("bin/prism", "bin/prism2", "src/main.pr", extra)
}

fn release() -> Result<()> {
    let version = version()?;

    info!("first compilation step");
    build(&[])?;
    info!("second compilation step");
    compile("bin/prism2", "bin/prism3", "src/main.pr", &[])?;

    let folder = format!("prism-{version}");
    fs::create_dir_all(format!("{folder}/bin"))?;
    fs::create_dir_all(format!("{folder}/include"))?;
    fs::copy(exe("bin/prism2"), format!("{folder}/{}", exe("bin/prism")))?;
    fs::copy("version", format!("{folder}/version"))?;
    fs::copy("cimport.toml", format!("{folder}/cimport.toml"))?;
    for entry in fs::read_dir("include")? {
        let entry = entry?;
        if entry.path().extension().is_some_and(|ext| ext == "h") {
            fs::copy(
                entry.path(),
                Path::new(&folder).join("include").join(entry.file_name()),
            )?;
        }
    }

    let archive = archive_name(&version);
    run_checked(
        "tar",
        &[
            "-czf".to_string(),
            archive.clone(),
            folder.clone(),
        ],
    )?;
    fs::remove_dir_all(&folder)?;
    info!(archive, "release assembled");
    Ok(())
}

fn test(extra: &[String]) -> Result<()> {
    if !Path::new(&exe("bin/prism2")).exists() {
        build(&[])?;
    }
    compile("bin/prism2", "bin/testsuite", "src/test/main.pr", extra)?;
    run_checked(&exe("bin/testsuite"), &[])
}

fn clean() -> Result<()> {
    if Path::new("build").exists() {
        fs::remove_dir_all("build")?;
    }
    for entry in fs::read_dir(".")? {
        let name = entry?.file_name();
        let name = name.to_string_lossy();
        if name.starts_with("prism-") && (name.ends_with(".tar.gz") || name.ends_with(".zip")) {
            fs::remove_file(name.as_ref())?;
        }
    }
    Ok(())
}

/// Fetch the pinned seed compiler release, install it under `bin/`, and
/// regenerate the C bindings with it in place.
fn download() -> Result<()> {
    let version = version()?;
    let archive = archive_name(&version);
    let url = format!(
        "https://github.com/prism-lang/prism/releases/download/v{version}-alpha/{archive}"
    );

    info!(url, "downloading seed compiler");
    let bytes = reqwest::blocking::get(&url)
        .and_then(|response| response.error_for_status())
        .with_context(|| format!("fetching {url}"))?
        .bytes()
        .context("reading release archive")?;
    fs::write(&archive, &bytes).with_context(|| format!("writing {archive}"))?;

    let unpack_dir = format!("bin/prism-{version}");
    fs::create_dir_all(&unpack_dir)?;
    run_checked(
        "tar",
        &[
            "-xf".to_string(),
            archive.clone(),
            "-C".to_string(),
            unpack_dir.clone(),
        ],
    )?;
    fs::copy(
        Path::new(&unpack_dir).join(exe("bin/prism")),
        exe("bin/prism"),
    )
    .context("installing the seed compiler")?;
    fs::remove_dir_all(&unpack_dir)?;
    fs::remove_file(&archive)?;

    info!("regenerating C bindings");
    prism_cimport::run(Path::new("cimport.toml"), None)
}
