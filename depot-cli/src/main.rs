//! `depot`: a `clap`-derived CLI over `depot_core`, structured like
//! `cargo-dylint/src/main.rs` -- parse arguments into per-operation option structs, build a
//! `Runtime`, and dispatch into the engine. Supplies the only concrete collaborator
//! implementations (TOML I/O, a git provider, a filesystem downloader) since the registry
//! client, solver, and build runner remain external collaborators by design.

mod collaborators;
mod config;
mod git;
mod io;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use collaborators::{FsDownloader, IdentityResolver, ProcessBuildRunner};
use depot_core::collaborators::SilentProgress;
use depot_core::options::{AddOptions, FreeOptions, GcOptions, InstantiateOptions, Level, Mode, RmOptions, StatusOptions, TestOptions, UpOptions};
use depot_core::spec::{PackageId, PackageSpec, Tracking};
use depot_core::{Depot, Dispatcher, Runtime};
use git::Git2Provider;
use io::TomlProjectManifestIo;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[clap(name = "depot", version, about = "Package and artifact lifecycle manager")]
struct Opts {
    #[clap(long, value_name = "PATH", default_value = ".", global = true, help = "Project directory")]
    project_dir: PathBuf,

    #[clap(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[clap(about = "Add packages to the project")]
    Add { names: Vec<String> },

    #[clap(about = "Add a path-tracked package to the project")]
    Develop {
        name: String,
        #[clap(long)]
        path: PathBuf,
    },

    #[clap(about = "Remove packages from the project")]
    Rm { names: Vec<String> },

    #[clap(about = "Pin packages to their currently resolved version")]
    Pin { names: Vec<String> },

    #[clap(about = "Free packages from a pin")]
    Free { names: Vec<String> },

    #[clap(about = "Update dependencies to the latest permitted version")]
    Up {
        #[clap(long, default_value = "false")]
        update_registry: bool,
    },

    #[clap(about = "Re-resolve the manifest against the project, making no version changes")]
    Resolve,

    #[clap(about = "Show pending changes since the last write")]
    Status,

    #[clap(about = "Run garbage collection across one or more depots")]
    Gc {
        #[clap(long, value_name = "DAYS", default_value = "7")]
        collect_delay_days: i64,
        #[clap(long)]
        verbose: bool,
        depots: Vec<PathBuf>,
    },

    #[clap(about = "Precompile the dependency graph")]
    Precompile {
        #[clap(long, default_value = "4")]
        tasks: usize,
        #[clap(long, value_name = "PATH", help = "Depot to consult for cached-artefact staleness")]
        depot: Option<PathBuf>,
    },

    #[clap(about = "Re-run build scripts for one or more packages")]
    Build {
        #[clap(long, value_name = "PATH")]
        depot: PathBuf,
        names: Vec<String>,
    },

    #[clap(about = "Run test suites for one or more packages")]
    Test {
        #[clap(long, value_name = "PATH")]
        depot: PathBuf,
        #[clap(long)]
        coverage: bool,
        names: Vec<String>,
    },

    #[clap(about = "Materialise an environment from its manifest")]
    Instantiate {
        #[clap(long, value_name = "PATH")]
        depot: PathBuf,
        #[clap(long)]
        platform: Option<String>,
    },

    #[clap(about = "Undo the last environment mutation")]
    Undo,

    #[clap(about = "Redo a previously undone mutation")]
    Redo,
}

fn project_manifest_paths(project_dir: &std::path::Path) -> (PathBuf, PathBuf) {
    (project_dir.join("Project.toml"), project_dir.join("Manifest.toml"))
}

fn named_specs(names: &[String]) -> Vec<PackageSpec> {
    names.iter().map(|name| PackageSpec::named(name)).collect()
}

fn now_rfc3339() -> String {
    chrono::Utc::now().to_rfc3339()
}

fn main() -> Result<()> {
    env_logger::try_init().unwrap_or_else(|err| {
        log::debug!("`env_logger` already initialized: {err}");
    });

    let opts = Opts::parse();
    run(opts)
}

fn run(opts: Opts) -> Result<()> {
    let Opts { project_dir, command } = opts;
    let (project_file, manifest_file) = project_manifest_paths(&project_dir);

    let config_table = config::get(&project_dir);
    let toolchain_version = env!("CARGO_PKG_VERSION").to_owned();

    let io = TomlProjectManifestIo;
    let resolver = IdentityResolver;
    let downloader = FsDownloader { source_root: project_dir.join(".depot-sources") };
    let git_provider = Git2Provider;
    let build_runner = ProcessBuildRunner;
    let progress = SilentProgress;

    let suspended_file = Depot::new(depot_internal::home::depot_home().context("resolving depot home")?).suspended_log();

    let mut dispatcher = Dispatcher {
        io: &io,
        resolver: &resolver,
        downloader: &downloader,
        git: &git_provider,
        build_runner: &build_runner,
        progress: &progress,
        reserved_names: vec!["core".to_owned()],
        precompile_auto: config::precompile_auto(config_table, false),
        precompile_tasks: config::num_precompile_tasks(config_table, 4),
        suspended_file,
    };

    let mut runtime = Runtime::new(toolchain_version);
    let now = now_rfc3339();

    match command {
        Command::Add { names } => {
            let cache = dispatcher.add(&mut runtime, &project_file, &manifest_file, &named_specs(&names), &AddOptions::default(), &now)?;
            println!("{} direct dependencies", cache.project.deps.len());
        }
        Command::Develop { name, path } => {
            let spec = PackageSpec {
                id: PackageId { name: Some(name), uuid: None },
                version: None,
                tree_hash: None,
                pinned: false,
                mode: depot_core::spec::Mode::Project,
                tracking: Tracking::Path(path),
            };
            dispatcher.develop(&mut runtime, &project_file, &manifest_file, &[spec], &AddOptions::default(), &now)?;
        }
        Command::Rm { names } => {
            dispatcher.rm(&mut runtime, &project_file, &manifest_file, &named_specs(&names), &RmOptions::default(), &now)?;
        }
        Command::Pin { names } => {
            dispatcher.pin(&mut runtime, &project_file, &manifest_file, &named_specs(&names), &now)?;
        }
        Command::Free { names } => {
            dispatcher.free(&mut runtime, &project_file, &manifest_file, &named_specs(&names), &FreeOptions::default(), &now)?;
        }
        Command::Up { update_registry } => {
            let options = UpOptions { level: Level::Fixed, mode: Mode::Project, update_registry };
            dispatcher.up(&mut runtime, &project_file, &manifest_file, &[], &options, &now)?;
        }
        Command::Resolve => {
            dispatcher.resolve(&mut runtime, &project_file, &manifest_file, &now)?;
        }
        Command::Status => {
            let status = dispatcher.status(&project_file, &manifest_file, &StatusOptions::default())?;
            println!("{} packages displayed", status.displayed.len());
        }
        Command::Gc { collect_delay_days, verbose, depots } => {
            let depots: Vec<Depot> = if depots.is_empty() {
                vec![Depot::new(depot_internal::home::depot_home().context("resolving depot home")?)]
            } else {
                depots.into_iter().map(Depot::new).collect()
            };
            let options = GcOptions {
                collect_delay: chrono::Duration::days(collect_delay_days),
                verbose,
            };
            let summary = dispatcher.gc(&depots, &options, chrono::Utc::now())?;
            println!(
                "freed {} bytes ({} packages, {} artifacts, {} clones, {} scratchspaces)",
                summary.freed_bytes, summary.packages_deleted, summary.artifacts_deleted, summary.clones_deleted, summary.scratchspaces_deleted
            );
        }
        Command::Precompile { tasks, depot } => {
            dispatcher.precompile_tasks = tasks;
            let depot = depot.map(Depot::new);
            let report = dispatcher.precompile(
                &mut runtime,
                &project_file,
                &manifest_file,
                depot.as_ref(),
                true,
                depot_core::options::PrecompileOptions::default(),
            )?;
            println!(
                "compiled {}, already precompiled {}, skipped {}, circular {}",
                report.compiled.len(),
                report.already_precompiled.len(),
                report.skipped.len(),
                report.circular.len()
            );
        }
        Command::Build { depot, names } => {
            let depot = Depot::new(depot);
            dispatcher.build(&project_file, &manifest_file, &depot, &named_specs(&names))?;
        }
        Command::Test { depot, coverage, names } => {
            let depot = Depot::new(depot);
            let options = TestOptions { coverage, ..Default::default() };
            dispatcher.test(&project_file, &manifest_file, &depot, &named_specs(&names), &options)?;
        }
        Command::Instantiate { depot, platform } => {
            let depot = Depot::new(depot);
            let options = InstantiateOptions { platform, update_registry: false, verbose: false };
            dispatcher.instantiate(&mut runtime, &project_file, &manifest_file, &depot, &options)?;
        }
        Command::Undo => match dispatcher.undo(&mut runtime, &project_file) {
            Some(snapshot) => dispatcher.apply_snapshot(&project_file, &manifest_file, &snapshot)?,
            None => println!("nothing to undo"),
        },
        Command::Redo => match dispatcher.redo(&mut runtime, &project_file) {
            Some(snapshot) => dispatcher.apply_snapshot(&project_file, &manifest_file, &snapshot)?,
            None => println!("nothing to redo"),
        },
    }

    Ok(())
}
