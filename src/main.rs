use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::error;
use tracing_subscriber::EnvFilter;

use dicom_dixon::config::{AdjustmentConfig, DisplayConfig, ExportJob};
use dicom_dixon::enums::{ExportFormat, NoiseReduction, PlaySpeed, WindowSize};
use dicom_dixon::error::{DixonError, Result};
use dicom_dixon::scan_index::ScanIndexer;
use dicom_dixon::session::Session;

#[derive(Parser)]
#[command(
    name = "dicom-dixon",
    version,
    about = "Two-point Dixon fat-water separation for paired DICOM MR acquisitions"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Index a folder tree and list the scan pairs found
    List { root: PathBuf },
    /// Run the pipeline and export the derived channels
    Export {
        root: PathBuf,
        out_dir: PathBuf,
        #[arg(long, value_enum, default_value_t = ExportFormat::Dicom)]
        format: ExportFormat,
        /// Scan index to export (still formats; GIF always spans all scans)
        #[arg(long, default_value_t = 0)]
        index: usize,
        /// Skip compression tuning for raster formats
        #[arg(long)]
        no_compression: bool,
        #[arg(long, default_value_t = 0.1)]
        fat_threshold: f32,
        #[arg(long, value_enum, default_value_t = NoiseReduction::None)]
        noise_reduction: NoiseReduction,
        /// Contrast slider value in [-50, 50]
        #[arg(long, default_value_t = 0)]
        contrast: i32,
        /// Brightness slider value in [-50, 50]
        #[arg(long, default_value_t = 0)]
        brightness: i32,
        /// Per-frame duration for animated export, in milliseconds
        #[arg(long, default_value_t = 500)]
        gif_duration_ms: u32,
        /// Encode animations without looping
        #[arg(long)]
        no_gif_loop: bool,
        #[arg(long, default_value_t = PlaySpeed::X1)]
        play_speed: PlaySpeed,
        #[arg(long, default_value_t = WindowSize::S400)]
        window_size: WindowSize,
    },
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::List { root } => list(&root),
        Command::Export {
            root,
            out_dir,
            format,
            index,
            no_compression,
            fat_threshold,
            noise_reduction,
            contrast,
            brightness,
            gif_duration_ms,
            no_gif_loop,
            play_speed,
            window_size,
        } => {
            let adjustment =
                AdjustmentConfig::new(fat_threshold, noise_reduction, contrast, brightness);
            let display = DisplayConfig {
                window_size,
                play_speed,
            };
            let job = ExportJob::new(format, !no_compression, gif_duration_ms, !no_gif_loop);

            let mut session = Session::new(adjustment, display);
            if session.load_folder(&root)? == 0 {
                return Err(DixonError::MissingPair { root });
            }
            session.seek(index)?;
            std::fs::create_dir_all(&out_dir)?;
            let written = session.export(&job, &out_dir)?;
            for path in written {
                println!("{}", path.display());
            }
            Ok(())
        }
    }
}

fn list(root: &Path) -> Result<()> {
    match ScanIndexer::index(root) {
        Ok(scans) => {
            for (index, pair) in scans.iter().enumerate() {
                println!(
                    "{index:4}  {}  |  {}",
                    pair.in_phase_file.display(),
                    pair.out_phase_file.display()
                );
            }
            println!("{} scan pair(s)", scans.len());
            Ok(())
        }
        Err(err @ DixonError::MissingPair { .. }) => {
            println!("no scan pairs found: {err}");
            Ok(())
        }
        Err(err) => Err(err),
    }
}
