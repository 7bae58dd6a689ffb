use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::Context;
use clap::{Parser, Subcommand};
use fab_cfg::ConfigSet;
use fab_core::cfgs::{BUILD_FILENAME, ECHO_COMMANDS};
use fab_core::defs::GroupSpec;
use fab_core::engine::{Engine, Outcome};
use fab_core::filesystem::HostFilesystem;
use fab_core::observer::{Observer, TracingObserver};
use fab_core::runner::ShellRunner;
use fab_core::scope::{BuildTree, ResolvedRule};
use fab_types::Mtime;
use tracing_subscriber::EnvFilter;

/// A small, Make-like build tool.
#[derive(Debug, Parser)]
#[command(name = "fab", version)]
struct Args {
    /// Build description to read, defaults to the `build_filename` config in the directory.
    #[arg(short = 'f', long)]
    file: Option<PathBuf>,
    /// Directory to build in, defaults to the current directory.
    #[arg(short = 'C', long)]
    directory: Option<PathBuf>,
    /// Override a config, may be repeated.
    #[arg(long = "config", value_name = "NAME=VALUE")]
    configs: Vec<String>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Bring targets up to date, in order, stopping at the first failure.
    Build {
        #[arg(required = true)]
        targets: Vec<String>,
    },
    /// Print the rules, after all rewrites are applied.
    Rules,
    /// Print every config and its current value.
    Configs,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_ansi(!fab_ore::env::is_truthy("NO_COLOR"))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("fab: {err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Args) -> Result<(), anyhow::Error> {
    let configs = {
        let mut builder = ConfigSet::builder();
        fab_core::all_cfgs(&mut builder);
        builder.build()
    };
    for pair in &args.configs {
        configs
            .try_update_pair(pair)
            .with_context(|| format!("applying --config {pair}"))?;
    }

    let directory = match args.directory {
        Some(dir) => dir,
        None => std::env::current_dir().context("reading the current directory")?,
    };
    let file = args
        .file
        .unwrap_or_else(|| directory.join(BUILD_FILENAME.read(&configs).as_str()));

    match args.command {
        Command::Configs => print!("{configs}"),
        Command::Rules => {
            let tree = load_tree(&file)?;
            print!("{}", tree.pretty());
        }
        Command::Build { targets } => {
            let tree = load_tree(&file)?;
            let observer = CliObserver {
                echo: ECHO_COMMANDS.read(&configs),
            };
            let engine = Engine::new(&tree)
                .with_filesystem(HostFilesystem::rooted_at(&directory))
                .with_runner(ShellRunner::from_configs(&configs).in_dir(&directory))
                .with_observer(observer);

            for target in &targets {
                let mtime = engine
                    .build(target)
                    .with_context(|| format!("building '{target}'"))?;
                tracing::info!(%target, %mtime, "up to date");
            }
        }
    }

    Ok(())
}

/// Read the build description at `file` and set it up.
fn load_tree(file: &Path) -> Result<BuildTree, anyhow::Error> {
    let base_dir = file.parent().unwrap_or(Path::new("."));
    let tree = GroupSpec::from_file(file)?.into_group(base_dir)?.setup()?;
    Ok(tree)
}

/// Echoes commands like `make` does, and forwards everything to [`tracing`].
struct CliObserver {
    echo: bool,
}

impl Observer for CliObserver {
    fn considering(&self, rule: &ResolvedRule, name: &str) {
        TracingObserver.considering(rule, name);
    }

    fn dependency(&self, name: &str, dependency: &str) {
        TracingObserver.dependency(name, dependency);
    }

    fn implicit_dependency(&self, name: &str, idep: &str, mtime: Option<Mtime>) {
        TracingObserver.implicit_dependency(name, idep, mtime);
    }

    fn stale(&self, name: &str) {
        TracingObserver.stale(name);
    }

    fn command(&self, command: &str) {
        if self.echo {
            println!("{command}");
        } else {
            TracingObserver.command(command);
        }
    }

    fn finished(&self, name: &str, outcome: &Outcome) {
        TracingObserver.finished(name, outcome);
    }
}
