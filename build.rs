// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "/var/lib/conary/installed.db";

fn db_path_arg() -> Arg {
    Arg::new("db_path")
        .short('d')
        .long("db-path")
        .value_name("PATH")
        .default_value(DEFAULT_DB_PATH)
        .help("Database path")
}

fn build_cli() -> Command {
    Command::new("conary-updates")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Conary Contributors")
        .about("Find package updates and obsoletes for an RPM system")
        .subcommand_required(false)
        .subcommand(
            Command::new("init")
                .about("Initialize the installed-package database")
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("record")
                .about("Record installed packages from .rpm files or directories of them")
                .arg(
                    Arg::new("paths")
                        .required(true)
                        .num_args(1..)
                        .help(".rpm files or directories"),
                )
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("add")
                .about("Record installed packages given as name-[epoch:]version-release.arch")
                .arg(Arg::new("packages").required(true).num_args(1..))
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("remove")
                .about("Forget an installed package")
                .arg(
                    Arg::new("package")
                        .required(true)
                        .help("name-[epoch:]version-release.arch"),
                )
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("installed")
                .about("List installed packages")
                .arg(Arg::new("name").help("Only show packages with this name"))
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("check-update")
                .about("Show available updates and obsoletes for the installed packages")
                .arg(
                    Arg::new("available")
                        .short('a')
                        .long("available")
                        .value_name("FILE")
                        .required(true)
                        .action(ArgAction::Append)
                        .help("primary.xml[.gz|.zst], JSON list, .rpm file or directory of .rpm files"),
                )
                .arg(
                    Arg::new("name")
                        .long("name")
                        .help("Only report updating packages with this name"),
                )
                .arg(
                    Arg::new("filter_arch")
                        .long("filter-arch")
                        .help("Only report updating packages with this architecture"),
                )
                .arg(
                    Arg::new("arch")
                        .long("arch")
                        .help("Platform architecture (default: this machine's)"),
                )
                .arg(
                    Arg::new("any_arch")
                        .long("any-arch")
                        .action(ArgAction::SetTrue)
                        .help("Let updates cross architectures"),
                )
                .arg(
                    Arg::new("config")
                        .short('c')
                        .long("config")
                        .value_name("FILE")
                        .help("Resolver configuration file (JSON)"),
                )
                .arg(
                    Arg::new("json")
                        .long("json")
                        .action(ArgAction::SetTrue)
                        .help("Print a JSON report instead of text"),
                )
                .arg(db_path_arg()),
        )
        .subcommand(
            Command::new("completions")
                .about("Generate shell completion scripts")
                .arg(
                    Arg::new("shell")
                        .required(true)
                        .value_parser(["bash", "elvish", "fish", "powershell", "zsh"])
                        .help("Shell type"),
                ),
        )
}

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Create man directory
    let out_dir = PathBuf::from(env::var("CARGO_MANIFEST_DIR").unwrap());
    let man_dir = out_dir.join("man");
    fs::create_dir_all(&man_dir).expect("Failed to create man directory");

    // Generate main man page
    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("conary-updates.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");

    println!("cargo:warning=Man page generated at {}", man_path.display());
}
