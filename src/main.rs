// src/main.rs

use anyhow::Result;
use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use conary_updates::arch::ArchTable;
use conary_updates::config::ResolverConfig;
use conary_updates::db::models::InstalledPackage;
use conary_updates::packages::rpm::{RpmFiles, RpmPackage};
use conary_updates::packages::{PackageRef, PackageSource};
use conary_updates::repository::{self, RepositoryMetadata};
use conary_updates::resolver::{Problem, Resolution, UpdateResolver};
use serde::Serialize;
use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

const DEFAULT_DB_PATH: &str = "/var/lib/conary/installed.db";

/// Kinds of input accepted where available packages are expected
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum InputKind {
    /// A directory of .rpm files
    RpmDir,
    /// A single .rpm file
    Rpm,
    /// primary.xml or a JSON package list, possibly compressed
    Metadata,
}

#[derive(Parser)]
#[command(name = "conary-updates")]
#[command(author, version, about = "Find package updates and obsoletes for an RPM system", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the installed-package database
    Init {
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// Record installed packages from .rpm files or directories of them
    Record {
        #[arg(required = true)]
        paths: Vec<PathBuf>,
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// Record installed packages given as name-[epoch:]version-release.arch
    Add {
        #[arg(required = true)]
        packages: Vec<String>,
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// Forget an installed package
    Remove {
        /// name-[epoch:]version-release.arch
        package: String,
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// List installed packages
    Installed {
        /// Only show packages with this name
        name: Option<String>,
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// Show available updates and obsoletes for the installed packages
    CheckUpdate {
        /// primary.xml[.gz|.zst], JSON list, .rpm file or directory of .rpm files
        #[arg(short, long = "available", value_name = "FILE", required = true)]
        available: Vec<PathBuf>,
        /// Only report updating packages with this name
        #[arg(long)]
        name: Option<String>,
        /// Only report updating packages with this architecture
        #[arg(long)]
        filter_arch: Option<String>,
        /// Platform architecture (default: this machine's)
        #[arg(long)]
        arch: Option<String>,
        /// Let updates cross architectures
        #[arg(long)]
        any_arch: bool,
        /// Resolver configuration file (JSON)
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Print a JSON report instead of text
        #[arg(long)]
        json: bool,
        #[arg(short, long, default_value = DEFAULT_DB_PATH)]
        db_path: String,
    },
    /// Generate shell completion scripts
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Detect what an input path holds from its type, extension and magic bytes
fn detect_input_kind(path: &Path) -> Result<InputKind> {
    if path.is_dir() {
        return Ok(InputKind::RpmDir);
    }

    if path.extension().is_some_and(|ext| ext == "rpm") {
        return Ok(InputKind::Rpm);
    }

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if [".xml", ".xml.gz", ".xml.zst", ".json", ".json.gz", ".json.zst"]
        .iter()
        .any(|suffix| file_name.ends_with(suffix))
    {
        return Ok(InputKind::Metadata);
    }

    // Fallback to magic bytes detection
    let mut file = File::open(path)?;
    let mut magic = [0u8; 4];
    file.read_exact(&mut magic)?;

    // RPM lead magic
    if magic == [0xED, 0xAB, 0xEE, 0xDB] {
        return Ok(InputKind::Rpm);
    }

    Err(anyhow::anyhow!("Unable to detect input format for: {}", path.display()))
}

/// Read every available input into one package set
fn load_available(paths: &[PathBuf]) -> Result<RepositoryMetadata> {
    let mut available = RepositoryMetadata::default();

    for path in paths {
        let kind = detect_input_kind(path)?;
        info!("Reading available packages from {} ({:?})", path.display(), kind);

        match kind {
            InputKind::RpmDir => {
                let source = RpmFiles::from_dir(path)?;
                info!("Reading {}", source.describe());
                available.packages.extend(source.packages()?);
            }
            InputKind::Rpm => {
                available.packages.push(RpmPackage::parse(path)?.package_ref().clone());
            }
            InputKind::Metadata => available.merge(repository::load_metadata(path)?),
        }
    }

    Ok(available)
}

/// Expand record arguments into .rpm paths
fn rpm_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut rpms = Vec::new();
    for path in paths {
        if path.is_dir() {
            rpms.extend(RpmFiles::from_dir(path)?.paths().iter().cloned());
        } else {
            rpms.push(path.clone());
        }
    }
    Ok(rpms)
}

#[derive(Serialize)]
struct PairReport {
    available: String,
    installed: String,
}

#[derive(Serialize)]
struct CheckUpdateReport<'a> {
    platform_arch: &'a str,
    exact_arch: bool,
    updates: Vec<PairReport>,
    obsoletes: Vec<PairReport>,
    problems: Vec<Problem>,
}

fn pair_reports(pairs: Vec<(&PackageRef, &PackageRef)>) -> Vec<PairReport> {
    pairs
        .into_iter()
        .map(|(available, installed)| PairReport {
            available: available.to_string(),
            installed: installed.to_string(),
        })
        .collect()
}

fn print_text_report(resolution: &Resolution, name: Option<&str>, arch: Option<&str>) {
    let updates = resolution.list_updates(name, arch);
    let obsoletes = resolution.list_obsoletes(name, arch);

    if updates.is_empty() && obsoletes.is_empty() {
        println!("No updates available.");
        return;
    }

    for (available, installed) in updates {
        println!("{:<50} updates {}", available.to_string(), installed);
    }

    if !obsoletes.is_empty() {
        println!();
        println!("Obsoleting packages:");
        for (obsoleting, installed) in obsoletes {
            println!("{:<50} obsoletes {}", obsoleting.to_string(), installed);
        }
    }
}

fn main() -> Result<()> {
    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Init { db_path }) => {
            info!("Initializing database at: {}", db_path);
            conary_updates::db::init(&db_path)?;
            println!("Database initialized successfully at: {}", db_path);
            Ok(())
        }
        Some(Commands::Record { paths, db_path }) => {
            let mut conn = conary_updates::db::open(&db_path)?;
            let rpms = rpm_paths(&paths)?;

            let recorded = conary_updates::db::transaction(&mut conn, |tx| {
                let mut recorded = 0;
                for path in &rpms {
                    let rpm = RpmPackage::parse(path)?;
                    if InstalledPackage::find(tx, rpm.package_ref())?.is_some() {
                        warn!("{} is already recorded", rpm.package_ref());
                        continue;
                    }

                    let mut installed = InstalledPackage::from_package_ref(rpm.package_ref());
                    installed.source_rpm = Some(rpm.source_rpm().to_string());
                    installed.insert(tx)?;
                    println!("Recorded {}", rpm.package_ref());
                    recorded += 1;
                }
                Ok(recorded)
            })?;

            println!("Recorded {} package(s)", recorded);
            Ok(())
        }
        Some(Commands::Add { packages, db_path }) => {
            let refs = packages
                .iter()
                .map(|s| s.parse::<PackageRef>())
                .collect::<conary_updates::Result<Vec<_>>>()?;
            let mut conn = conary_updates::db::open(&db_path)?;

            conary_updates::db::transaction(&mut conn, |tx| {
                for pkg in &refs {
                    if InstalledPackage::find(tx, pkg)?.is_some() {
                        warn!("{} is already recorded", pkg);
                        continue;
                    }
                    InstalledPackage::from_package_ref(pkg).insert(tx)?;
                    println!("Recorded {}", pkg);
                }
                Ok(())
            })?;
            Ok(())
        }
        Some(Commands::Remove { package, db_path }) => {
            let pkg: PackageRef = package.parse()?;
            let conn = conary_updates::db::open(&db_path)?;

            let record = InstalledPackage::find(&conn, &pkg)?
                .ok_or_else(|| anyhow::anyhow!("Package {} is not recorded", pkg))?;
            if let Some(id) = record.id {
                InstalledPackage::delete(&conn, id)?;
            }
            println!("Removed {}", pkg);
            Ok(())
        }
        Some(Commands::Installed { name, db_path }) => {
            let conn = conary_updates::db::open(&db_path)?;
            let packages = match name {
                Some(name) => InstalledPackage::find_by_name(&conn, &name)?,
                None => InstalledPackage::list_all(&conn)?,
            };

            if packages.is_empty() {
                println!("No packages recorded.");
                return Ok(());
            }

            for record in &packages {
                let pkg = record.to_package_ref()?;
                match &record.installed_at {
                    Some(at) => println!("{:<50} {}", pkg.to_string(), at),
                    None => println!("{}", pkg),
                }
            }
            println!("\nTotal: {} package(s)", packages.len());
            Ok(())
        }
        Some(Commands::CheckUpdate {
            available,
            name,
            filter_arch,
            arch,
            any_arch,
            config,
            json,
            db_path,
        }) => {
            let mut resolver_config = match config {
                Some(path) => ResolverConfig::load(&path)?,
                None => ResolverConfig::default(),
            };
            if arch.is_some() {
                resolver_config.arch = arch;
            }
            if any_arch {
                resolver_config.exact_arch = false;
            }

            let platform_arch = resolver_config.platform_arch();
            ArchTable::new().require_known(&platform_arch)?;

            let conn = conary_updates::db::open(&db_path)?;
            let installed = conary_updates::db::installed_set(&conn)?;
            let metadata = load_available(&available)?;
            info!(
                "{} installed and {} available package(s)",
                installed.len(),
                metadata.packages.len()
            );

            let resolution = UpdateResolver::from_config(installed, metadata.packages, &resolver_config)
                .with_obsoletes(metadata.obsoletes)
                .resolve()?;

            for problem in resolution.problems() {
                warn!("{}", problem);
            }

            if json {
                let report = CheckUpdateReport {
                    platform_arch: &platform_arch,
                    exact_arch: resolver_config.exact_arch,
                    updates: pair_reports(
                        resolution.list_updates(name.as_deref(), filter_arch.as_deref()),
                    ),
                    obsoletes: pair_reports(
                        resolution.list_obsoletes(name.as_deref(), filter_arch.as_deref()),
                    ),
                    problems: resolution.problems(),
                };
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                print_text_report(&resolution, name.as_deref(), filter_arch.as_deref());
            }
            Ok(())
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "conary-updates", &mut io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("conary-updates v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'conary-updates --help' for usage information");
            Ok(())
        }
    }
}
