use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use pipfold_resolver::lock_directory;
use tracing_subscriber::EnvFilter;

mod commands;
mod render;

use commands::{
    run_in_env, run_install, run_list, run_lock, run_show, run_sync, shell_program, PipSource,
};

#[derive(Parser, Debug)]
#[command(name = "pipfold")]
#[command(about = "Pipfile-driven dependency manager with reproducible lock files", long_about = None)]
struct Cli {
    #[arg(long, global = true, default_value = "Pipfile")]
    manifest: PathBuf,
    #[arg(long, global = true)]
    pip: Option<PathBuf>,
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    Install {
        #[arg(long)]
        dev: bool,
        #[arg(long)]
        save: bool,
        packages: Vec<String>,
    },
    Lock {
        #[arg(long)]
        no_install: bool,
    },
    Sync {
        #[arg(long)]
        dev: bool,
    },
    Shell,
    Run {
        #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
        args: Vec<String>,
    },
    Show {
        #[arg(required = true)]
        packages: Vec<String>,
    },
    List,
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    run_cli(cli)
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn run_cli(cli: Cli) -> Result<ExitCode> {
    let project_dir = lock_directory(&cli.manifest).to_path_buf();
    let pip = PipSource::new(cli.pip, &project_dir);

    match cli.command {
        Commands::Install {
            dev,
            save,
            packages,
        } => run_install(&cli.manifest, &pip, &packages, dev, save)?,
        Commands::Lock { no_install } => run_lock(&cli.manifest, &pip, no_install)?,
        Commands::Sync { dev } => run_sync(&project_dir, &pip, dev)?,
        Commands::Shell => return run_in_env(&pip.resolve()?, &shell_program(), &[]),
        Commands::Run { args } => {
            let (program, rest) = args
                .split_first()
                .ok_or_else(|| anyhow::anyhow!("run requires a command"))?;
            return run_in_env(&pip.resolve()?, program, rest);
        }
        Commands::Show { packages } => run_show(&pip, &packages)?,
        Commands::List => run_list(&pip)?,
    }

    Ok(ExitCode::SUCCESS)
}
