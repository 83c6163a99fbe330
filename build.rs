// build.rs

use clap::{Arg, ArgAction, Command};
use clap_mangen::Man;
use std::env;
use std::fs;
use std::path::PathBuf;

fn package_args(cmd: Command) -> Command {
    cmd.arg(Arg::new("package").required(true).help("Package name"))
        .arg(Arg::new("distro").required(true).help("Distribution ID (e.g. arch, debian)"))
        .arg(Arg::new("version").required(true).help("Distribution release (e.g. 12, rolling)"))
}

fn build_cli() -> Command {
    Command::new("pkgscout")
        .version(env!("CARGO_PKG_VERSION"))
        .author("pkgscout Contributors")
        .about("Cross-distro package search, name translation and conflict checks")
        .subcommand_required(false)
        .arg(
            Arg::new("config")
                .short('c')
                .long("config")
                .global(true)
                .value_name("PATH")
                .help("Config file (default: ~/.config/pkgscout/config.toml)"),
        )
        .arg(
            Arg::new("json")
                .long("json")
                .global(true)
                .action(ArgAction::SetTrue)
                .help("Print machine-readable JSON instead of text"),
        )
        .subcommand(
            Command::new("init")
                .about("Initialize the pkgscout database")
                .arg(
                    Arg::new("db_path")
                        .short('d')
                        .long("db-path")
                        .value_name("PATH")
                        .help("Database path (default: <cache_dir>/pkgscout.db)"),
                ),
        )
        .subcommand(
            Command::new("search")
                .about("Search every available backend and rank the results")
                .arg(
                    Arg::new("terms")
                        .required(true)
                        .num_args(1..)
                        .help("Search terms; results for all terms are merged"),
                )
                .arg(
                    Arg::new("backend")
                        .short('b')
                        .long("backend")
                        .action(ArgAction::Append)
                        .value_parser([
                            "pacman", "yay", "paru", "apt", "dnf", "flatpak", "snap", "cargo",
                            "npm", "pip",
                        ])
                        .help("Only query these backends (repeatable)"),
                )
                .arg(
                    Arg::new("expand")
                        .short('e')
                        .long("expand")
                        .action(ArgAction::SetTrue)
                        .help("Also search the known spellings of each term"),
                )
                .arg(
                    Arg::new("limit")
                        .short('l')
                        .long("limit")
                        .help("Show at most this many results"),
                ),
        )
        .subcommand(
            Command::new("translate")
                .about("Translate a package name between distro families")
                .arg(Arg::new("name").required(true).help("Package name"))
                .arg(Arg::new("from").long("from").required(true).help("Source family"))
                .arg(Arg::new("to").long("to").required(true).help("Target family")),
        )
        .subcommand(
            Command::new("names")
                .about("Show every known spelling of a package")
                .arg(Arg::new("name").required(true).help("Package name")),
        )
        .subcommand(
            Command::new("suggest")
                .about("Suggest search terms for a query on a target family")
                .arg(Arg::new("query").required(true).help("Package name or query"))
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .help("Target family (default: detected)"),
                ),
        )
        .subcommand(
            Command::new("check")
                .about("Check a package for conflicts before installing it")
                .arg(Arg::new("package").required(true).help("Package to install"))
                .arg(
                    Arg::new("installed")
                        .short('i')
                        .long("installed")
                        .action(ArgAction::Append)
                        .help("Treat these as the installed set instead of asking the host"),
                )
                .arg(
                    Arg::new("choose")
                        .long("choose")
                        .help("Record this option (0-based) as the resolution of the first conflict"),
                ),
        )
        .subcommand(
            Command::new("resolutions")
                .about("Show how often each resolution was chosen for a package")
                .arg(Arg::new("package").required(true).help("Package name"))
                .arg(Arg::new("id").long("id").help("Logged resolution ID"))
                .arg(
                    Arg::new("outcome")
                        .long("outcome")
                        .value_parser(["success", "failure"])
                        .help("Outcome of the resolution given by --id"),
                ),
        )
        .subcommand(
            Command::new("categorize")
                .about("Group installed packages by what they are for")
                .arg(
                    Arg::new("packages")
                        .num_args(0..)
                        .help("Packages to categorize (default: everything installed)"),
                ),
        )
        .subcommand(Command::new("manifest").about("Print a portable manifest of this host's software"))
        .subcommand(
            Command::new("plan")
                .about("Show what a manifest would install on a target family")
                .arg(Arg::new("manifest").required(true).help("Manifest JSON file"))
                .arg(
                    Arg::new("target")
                        .short('t')
                        .long("target")
                        .required(true)
                        .help("Target family"),
                ),
        )
        .subcommand(
            Command::new("bundle")
                .about("Inspect and maintain the bundle cache")
                .subcommand_required(true)
                .subcommand(package_args(
                    Command::new("get").about("Look up the bundle for a package on a distro release"),
                ))
                .subcommand(
                    package_args(Command::new("put").about("Store a bundle, replacing any existing one"))
                        .arg(
                            Arg::new("packages")
                                .required(true)
                                .num_args(1..)
                                .help("Packages in the bundle"),
                        )
                        .arg(Arg::new("reasoning").short('r').long("reasoning"))
                        .arg(
                            Arg::new("generated")
                                .long("generated")
                                .action(ArgAction::SetTrue)
                                .help("Mark the bundle as generated rather than curated"),
                        ),
                )
                .subcommand(
                    package_args(Command::new("record").about("Count a use, success or failure of a bundle"))
                        .arg(
                            Arg::new("event")
                                .required(true)
                                .value_parser(["used", "success", "failure"]),
                        ),
                )
                .subcommand(
                    Command::new("popular").about("List the most used bundles").arg(
                        Arg::new("limit")
                            .short('l')
                            .long("limit")
                            .default_value("10"),
                    ),
                )
                .subcommand(Command::new("stats").about("Show cache-wide statistics")),
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

    let cmd = build_cli();
    let man = Man::new(cmd);
    let mut buffer = Vec::new();
    man.render(&mut buffer).expect("Failed to render man page");

    let man_path = man_dir.join("pkgscout.1");
    fs::write(&man_path, buffer).expect("Failed to write man page");
}
