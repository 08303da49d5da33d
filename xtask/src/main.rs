use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::Path;
use std::process::{Command, Stdio};

const EXTENSION_CRATE: &str = "extension";
const STATIC_DIR: &str = "extension/static";
const DIST_DIR: &str = "dist";

#[derive(Parser)]
#[command(name = "xtask")]
#[command(about = "LinkedIn to Airtable extension task runner", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the background worker to wasm (dist/pkg)
    Build {
        /// Build without optimisations
        #[arg(long)]
        dev: bool,
    },

    /// Build and assemble the unpacked extension in dist/
    Package {
        /// Build without optimisations
        #[arg(long)]
        dev: bool,
    },

    /// Run all Rust tests
    Test,

    /// Run clippy linter (native and wasm32)
    Clippy,

    /// Remove dist/
    Clean,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Build { dev } => build(dev),
        Commands::Package { dev } => package(dev),
        Commands::Test => test(),
        Commands::Clippy => clippy(),
        Commands::Clean => clean(),
    }
}

fn build(dev: bool) -> Result<()> {
    println!("🔨 Building background worker (wasm)...");
    let out_dir = format!("../{}/pkg", DIST_DIR);
    let args = wasm_pack_args(dev, &out_dir);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    run_cmd("wasm-pack", &args)?;
    Ok(())
}

fn wasm_pack_args(dev: bool, out_dir: &str) -> Vec<String> {
    let profile = if dev { "--dev" } else { "--release" };
    [
        "build",
        EXTENSION_CRATE,
        profile,
        "--target",
        "no-modules",
        "--no-typescript",
        "--out-dir",
        out_dir,
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

fn package(dev: bool) -> Result<()> {
    build(dev)?;

    println!("📦 Copying static assets into {}/...", DIST_DIR);
    let copied = copy_dir(Path::new(STATIC_DIR), Path::new(DIST_DIR))?;
    for file in &copied {
        println!("  ✅ {}", file);
    }

    // wasm-pack drops a .gitignore and package.json next to the bundle
    let _ = fs::remove_file(format!("{}/pkg/.gitignore", DIST_DIR));
    let _ = fs::remove_file(format!("{}/pkg/package.json", DIST_DIR));

    println!("\n✅ Unpacked extension ready: load {}/ in chrome://extensions", DIST_DIR);
    Ok(())
}

fn test() -> Result<()> {
    println!("🧪 Running all tests...");
    run_cmd("cargo", &["test", "--workspace"])?;
    Ok(())
}

fn clippy() -> Result<()> {
    println!("🔍 Running clippy on workspace (warnings as errors)...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "--workspace",
            "--all-targets",
            "--",
            "-D",
            "warnings",
        ],
    )?;

    println!("🔍 Running clippy on the wasm32 worker...");
    run_cmd(
        "cargo",
        &[
            "clippy",
            "-p",
            "airtable-sidepanel-extension",
            "--target",
            "wasm32-unknown-unknown",
            "--",
            "-D",
            "warnings",
        ],
    )?;
    Ok(())
}

fn clean() -> Result<()> {
    println!("🧹 Removing {}/...", DIST_DIR);
    if Path::new(DIST_DIR).exists() {
        fs::remove_dir_all(DIST_DIR).context("Failed to remove dist directory")?;
    }
    Ok(())
}

/// Copy the files of `from` (recursively) into `to`, returning the relative
/// paths copied
fn copy_dir(from: &Path, to: &Path) -> Result<Vec<String>> {
    let mut copied = Vec::new();
    copy_dir_into(from, from, to, &mut copied)?;
    copied.sort();
    Ok(copied)
}

fn copy_dir_into(root: &Path, dir: &Path, to: &Path, copied: &mut Vec<String>) -> Result<()> {
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_dir() {
            copy_dir_into(root, &path, to, copied)?;
            continue;
        }

        let relative = path.strip_prefix(root)?;
        let target = to.join(relative);
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }
        fs::copy(&path, &target)
            .with_context(|| format!("Failed to copy {}", path.display()))?;
        copied.push(relative.display().to_string());
    }
    Ok(())
}

// Helper functions
fn run_cmd(program: &str, args: &[&str]) -> Result<()> {
    let status = Command::new(program)
        .args(args)
        .stdin(Stdio::inherit())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .with_context(|| format!("Failed to run: {} {}", program, args.join(" ")))?;

    if !status.success() {
        anyhow::bail!("Command failed: {} {}", program, args.join(" "));
    }

    Ok(())
}
