use std::path::{Path, PathBuf};

use anyhow::{anyhow, Context, Result};
use appxforge_core::{detect_language, Texts};
use appxforge_pipeline::{PipelineRun, Toolchain};
use clap::{Parser, Subcommand};

mod render;
mod workers;


#[derive(Parser, Debug)]
#[command(name = "appxforge")]
#[command(about = "Repack and self-sign installed packaged applications", long_about = None)]
struct Cli {
    /// UI language code (falls back to APPXFORGE_LANG, then the system locale)
    #[arg(long)]
    lang: Option<String>,
    /// Directory holding makeappx/makecert/pvk2pfx/signtool
    #[arg(long)]
    bin_dir: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Enumerate installed packaged applications
    List {
        #[arg(long)]
        json: bool,
    },
    /// Repack one application and sign it with a throwaway certificate
    Pack {
        /// Package full name of the application to pack
        #[arg(long)]
        package: String,
        #[arg(long)]
        output_dir: PathBuf,
        /// Stop after producing the unsigned archive
        #[arg(long)]
        skip_sign: bool,
    },
    /// Report the packaging toolchain locations and their presence
    Doctor,
    /// List the embedded UI languages
    Locales,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    run_cli(cli)
}

fn run_cli(cli: Cli) -> Result<()> {
    let language = cli.lang.clone().unwrap_or_else(detect_language);
    let texts = Texts::load(&language)?;
    let toolchain = Toolchain::from_bin_dir(&resolve_bin_dir(cli.bin_dir)?);

    match cli.command {
        Commands::List { json } => {
            let entities = workers::run_enumeration(texts.clone());
            if json {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&entities)
                        .context("failed to serialize package list")?
                );
            } else if entities.is_empty() {
                println!("{}", texts.t("no_packages_found"));
            } else {
                for line in render::format_package_table(&entities) {
                    println!("{line}");
                }
            }
        }
        Commands::Pack {
            package,
            output_dir,
            skip_sign,
        } => {
            let entities = workers::run_enumeration(texts.clone());
            let entity = entities
                .into_iter()
                .find(|entity| entity.package_full_name == package)
                .ok_or_else(|| anyhow!("no installed package matches '{package}'"))?;

            let run = PipelineRun::new(entity, &output_dir, skip_sign);
            let appx = run.appx_path().display().to_string();
            let events = workers::spawn_packaging(run, toolchain, texts.clone());

            let progress = render::PackProgress::start(render::is_interactive(), skip_sign);
            let mut succeeded = false;
            for event in events {
                match event {
                    workers::PackEvent::Log(line) => progress.step(&line),
                    workers::PackEvent::Finished(outcome) => succeeded = outcome,
                }
            }
            progress.finish();

            if succeeded {
                println!(
                    "{}",
                    render::status_line(true, &texts.tf("pack_done", &[("file", &appx)]))
                );
            } else {
                eprintln!(
                    "{}",
                    render::status_line(false, texts.t("pack_failed_summary"))
                );
                return Err(anyhow!("packaging run failed for '{package}'"));
            }
        }
        Commands::Doctor => {
            println!("bin dir: {}", toolchain.bin_dir().display());
            for (name, path) in toolchain.tools() {
                let presence = if path.exists() { "present" } else { "missing" };
                println!("{name}: {} ({presence})", path.display());
            }
        }
        Commands::Locales => {
            for code in Texts::available() {
                let marker = if code == texts.language() { "*" } else { " " };
                println!("{marker} {code}  {}", Texts::display_name_for(code));
            }
        }
    }

    Ok(())
}

fn resolve_bin_dir(configured: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(dir) = configured {
        return Ok(dir);
    }
    let exe = std::env::current_exe().context("failed to locate the current executable")?;
    Ok(exe
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .join("bin"))
}
