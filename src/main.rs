//! qrsize - pick QR code parameters and write a placeholder symbol.

use anyhow::{Context, Result};
use clap::Parser;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use qrsize::{analyze, classify, generate, select_version, Mode, QrError, Version};

/// Chooses the data mode and version for a payload and writes a placeholder PNG of the
/// resulting symbol size.
#[derive(Parser)]
#[command(name = "qrsize")]
#[command(version)]
#[command(about = "Choose QR code mode and version, then render a placeholder PNG")]
struct Cli {
    /// Text to encode
    #[arg(default_value = "555-2368")]
    data: String,

    /// Force a version (1-40) instead of selecting the smallest one that fits
    #[arg(short = 's', long)]
    symbol_version: Option<u8>,

    /// Output PNG path
    #[arg(short, long, default_value = "qrcode.png")]
    output: PathBuf,
}

/// The version `length` characters need in `mode`, when that is larger than `forced`.
fn needed_version(mode: Mode, forced: Version, length: usize) -> Result<Option<Version>, QrError> {
    let fits = select_version(mode, length)?;
    Ok((fits > forced).then_some(fits))
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    let (mode, version) = match cli.symbol_version {
        Some(number) => {
            let version = Version::try_from(number).context("Invalid --symbol-version")?;
            let mode = classify(&cli.data);
            match needed_version(mode, version, cli.data.len()) {
                Ok(Some(fits)) => {
                    warn!(%mode, %version, %fits, "forced version is too small for the data");
                }
                Ok(None) => {}
                Err(err) => warn!(%mode, %version, "{err}"),
            }
            (mode, version)
        }
        None => {
            let analysis = analyze(&cli.data).context("Failed to select a version")?;
            (analysis.mode, analysis.version)
        }
    };

    let file = File::create(&cli.output)
        .with_context(|| format!("Failed to create {}", cli.output.display()))?;
    let mut writer = BufWriter::new(file);
    generate(&mut writer, &cli.data, version)
        .and_then(|()| writer.flush())
        .with_context(|| format!("Failed to write {}", cli.output.display()))?;

    println!("Mode:    {mode}");
    println!("Version: {version}");
    println!("Size:    {0}x{0} modules", version.pattern_size());
    println!("Written: {}", cli.output.display());

    Ok(())
}
