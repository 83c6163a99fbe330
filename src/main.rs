// src/main.rs

use anyhow::{Context, Result};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use pkgscout::backends::{self, Backend, CommandRunner, PackageRecord, SystemRunner};
use pkgscout::bundle::BundleCache;
use pkgscout::config::Config;
use pkgscout::conflict::{self, ConflictOracle, DetectedConflict, ResolutionLog};
use pkgscout::db::models::{BundleData, Provenance};
use pkgscout::intent::{self, Manifest};
use pkgscout::profile::{HostProfile, SystemInfo};
use pkgscout::search::{self, SearchCoordinator};
use pkgscout::translate::{DistroFamily, Translator};
use std::collections::BTreeSet;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

#[derive(Parser)]
#[command(name = "pkgscout")]
#[command(author, version, about = "Cross-distro package search, name translation and conflict checks", long_about = None)]
struct Cli {
    /// Config file (default: ~/.config/pkgscout/config.toml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Print machine-readable JSON instead of text
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Initialize the pkgscout database
    Init {
        /// Database path (default: <cache_dir>/pkgscout.db)
        #[arg(short, long)]
        db_path: Option<String>,
    },
    /// Search every available backend and rank the results
    Search {
        /// Search terms; results for all terms are merged
        #[arg(required = true)]
        terms: Vec<String>,
        /// Only query these backends (repeatable)
        #[arg(short, long = "backend")]
        backends: Vec<Backend>,
        /// Also search the known spellings of each term on this host's family
        #[arg(short, long)]
        expand: bool,
        /// Show at most this many results
        #[arg(short, long)]
        limit: Option<usize>,
    },
    /// Translate a package name between distro families
    Translate {
        name: String,
        #[arg(long)]
        from: DistroFamily,
        #[arg(long)]
        to: DistroFamily,
    },
    /// Show every known spelling of a package
    Names { name: String },
    /// Suggest search terms for a query on a target family
    Suggest {
        query: String,
        /// Target family (default: detected)
        #[arg(short, long)]
        target: Option<DistroFamily>,
    },
    /// Check a package for conflicts before installing it
    Check {
        package: String,
        /// Treat these as the installed set instead of asking the host
        #[arg(short, long)]
        installed: Vec<String>,
        /// Record this option (0-based) as the resolution of the first conflict
        #[arg(long)]
        choose: Option<usize>,
    },
    /// Show how often each resolution was chosen for a package
    Resolutions {
        package: String,
        /// Report the outcome of a logged resolution
        #[arg(long, requires = "outcome")]
        id: Option<i64>,
        #[arg(long, requires = "id")]
        outcome: Option<Outcome>,
    },
    /// Group installed packages by what they are for
    Categorize {
        /// Packages to categorize (default: everything installed)
        packages: Vec<String>,
    },
    /// Print a portable manifest of this host's software
    Manifest,
    /// Show what a manifest would install on a target family
    Plan {
        manifest: PathBuf,
        #[arg(short, long)]
        target: DistroFamily,
    },
    /// Inspect and maintain the bundle cache
    Bundle {
        #[command(subcommand)]
        command: BundleCommands,
    },
    /// Generate shell completion scripts
    Completions { shell: Shell },
}

#[derive(Subcommand)]
enum BundleCommands {
    /// Look up the bundle for a package on a distro release
    Get {
        package: String,
        distro: String,
        version: String,
    },
    /// Store a bundle, replacing any existing one
    Put {
        package: String,
        distro: String,
        version: String,
        /// Packages in the bundle
        #[arg(required = true)]
        packages: Vec<String>,
        #[arg(short, long)]
        reasoning: Option<String>,
        /// Mark the bundle as generated rather than curated
        #[arg(long)]
        generated: bool,
    },
    /// Count a use, success or failure of a bundle
    Record {
        package: String,
        distro: String,
        version: String,
        #[arg(value_enum)]
        event: BundleEvent,
    },
    /// List the most used bundles
    Popular {
        #[arg(short, long, default_value_t = 10)]
        limit: usize,
    },
    /// Show cache-wide statistics
    Stats,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BundleEvent {
    Used,
    Success,
    Failure,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Outcome {
    Success,
    Failure,
}

fn runner() -> Arc<dyn CommandRunner> {
    Arc::new(SystemRunner::new())
}

/// Family whose package manager counts as native: configured, else detected
fn native_family(config: &Config, profile: &HostProfile) -> Option<DistroFamily> {
    config.native_family.or(profile.family)
}

/// Terms actually searched: each term, plus its known spellings when expanding
fn search_terms(terms: &[String], expand: bool, family: Option<DistroFamily>) -> Vec<String> {
    let translator = Translator::global();
    let mut seen = BTreeSet::new();
    let mut out = Vec::new();

    for term in terms {
        let expanded = match (expand, family) {
            (true, Some(family)) => translator.suggest_search_terms(term, family),
            _ => vec![term.clone()],
        };
        for candidate in expanded {
            if seen.insert(candidate.to_lowercase()) {
                out.push(candidate);
            }
        }
    }

    out
}

fn print_records(records: &[PackageRecord]) {
    if records.is_empty() {
        println!("No packages found.");
        return;
    }
    for record in records {
        println!("{}", record);
        if !record.description.is_empty() {
            println!("    {}", record.description);
        }
    }
    println!("\nTotal: {} result(s)", records.len());
}

fn render_conflict(conflict: &DetectedConflict) -> String {
    let mut out = format!(
        "[{}] {} conflict: {}",
        conflict.severity, conflict.kind, conflict.description
    );
    if let Some(installed) = &conflict.installed_package {
        out.push_str(&format!(" (installed: {})", installed));
    }
    if conflict.votes > 0 {
        out.push_str(&format!(" [{} votes]", conflict.votes));
    }
    for (idx, option) in conflict.options.iter().enumerate() {
        let marker = if idx == conflict.recommended { " (recommended)" } else { "" };
        out.push_str(&format!("\n    {}. {}{}", idx, option, marker));
    }
    out
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(cli.config.as_deref()).context("Failed to load configuration")?;

    // Initialize tracing subscriber for logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&config.log)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Commands::Init { db_path }) => {
            let db_path = db_path.unwrap_or_else(|| config.db_path_string());
            info!("Initializing pkgscout database at: {}", db_path);
            pkgscout::db::init(&db_path)?;
            println!("Database initialized successfully at: {}", db_path);
            Ok(())
        }
        Some(Commands::Search {
            terms,
            backends: only,
            expand,
            limit,
        }) => {
            let runner = runner();
            let profile = HostProfile::detect(runner.as_ref());
            let family = native_family(&config, &profile);

            let selected = if only.is_empty() { config.backends() } else { only };
            let adapters =
                backends::build_adapters(&selected, Arc::clone(&runner), &config.adapter_options());
            let coordinator = SearchCoordinator::new(adapters)
                .with_concurrency(config.concurrency)
                .with_timeout(config.search_timeout())
                .with_installed(&profile.installed);

            let queries = search_terms(&terms, expand, family);
            info!("Searching for {}", queries.join(", "));
            let records = coordinator.search_terms(&queries);

            let mut ranked = search::rank(records, &terms[0], family);
            if let Some(limit) = limit {
                ranked.truncate(limit);
            }

            if cli.json {
                print_json(&ranked)
            } else {
                print_records(&ranked);
                Ok(())
            }
        }
        Some(Commands::Translate { name, from, to }) => {
            match Translator::global().translate(&name, from, to) {
                Some(names) if cli.json => print_json(&names),
                Some(names) if names.is_empty() => {
                    println!("{} has no {} equivalent", name, to);
                    Ok(())
                }
                Some(names) => {
                    for name in names {
                        println!("{}", name);
                    }
                    Ok(())
                }
                None => Err(anyhow::anyhow!(
                    "No mapping for {} in the {} family",
                    name,
                    from
                )),
            }
        }
        Some(Commands::Names { name }) => {
            let names = Translator::global().get_all_known_names(&name);
            if cli.json {
                return print_json(&names);
            }
            for name in names {
                println!("{}", name);
            }
            Ok(())
        }
        Some(Commands::Suggest { query, target }) => {
            let target = match target.or(config.native_family) {
                Some(target) => target,
                None => HostProfile::detect(runner().as_ref())
                    .family
                    .ok_or_else(|| anyhow::anyhow!("Cannot detect distro family; pass --target"))?,
            };
            let terms = Translator::global().suggest_search_terms(&query, target);
            if cli.json {
                return print_json(&terms);
            }
            for term in terms {
                println!("{}", term);
            }
            Ok(())
        }
        Some(Commands::Check {
            package,
            installed,
            choose,
        }) => {
            let runner = runner();
            let (installed, system, family): (BTreeSet<String>, SystemInfo, Option<DistroFamily>) =
                if installed.is_empty() {
                    let profile = HostProfile::detect(runner.as_ref());
                    let family = native_family(&config, &profile);
                    (profile.installed, profile.system, family)
                } else {
                    let system = SystemInfo::detect(runner.as_ref());
                    (installed.into_iter().collect(), system, config.native_family)
                };

            let mut oracle = ConflictOracle::new(config.oracle_capabilities())
                .with_overlay_dir(&config.cache_dir)
                .with_resolution_log(ResolutionLog::new(config.db_path_string()));
            if let Some(family) = family {
                oracle = oracle.with_file_provider(backends::file_provider(family, Arc::clone(&runner)));
            }

            let conflicts = oracle.check_conflicts(&package, &installed, &system);

            if let Some(choice) = choose {
                let prompt = conflict::resolution_prompt(&conflicts)
                    .ok_or_else(|| anyhow::anyhow!("No conflicts to resolve for {}", package))?;
                let resolution = prompt.choose(choice)?;
                match oracle.log_resolution(&prompt.conflict, resolution) {
                    Some(id) => println!("Logged resolution {}: {}", id, resolution),
                    None => println!("Chose: {} (not logged)", resolution),
                }
                return Ok(());
            }

            if cli.json {
                return print_json(&conflicts);
            }
            if conflicts.is_empty() {
                println!("No conflicts detected for {}.", package);
            } else {
                for conflict in &conflicts {
                    println!("{}", render_conflict(conflict));
                }
                println!("\nTotal: {} conflict(s)", conflicts.len());
            }
            Ok(())
        }
        Some(Commands::Resolutions {
            package,
            id,
            outcome,
        }) => {
            let log = ResolutionLog::new(config.db_path_string());
            if let (Some(id), Some(outcome)) = (id, outcome) {
                let found = log.set_success(id, outcome == Outcome::Success)?;
                if !found {
                    return Err(anyhow::anyhow!("Resolution {} not found", id));
                }
                println!("Recorded outcome for resolution {}", id);
                return Ok(());
            }

            let counts = log.counts_for_package(&package)?;
            if cli.json {
                return print_json(&counts);
            }
            if counts.is_empty() {
                println!("No resolutions logged for {}.", package);
            } else {
                for count in &counts {
                    println!(
                        "  {} - chosen {}x ({} worked, {} failed)",
                        count.resolution, count.chosen, count.succeeded, count.failed
                    );
                }
            }
            Ok(())
        }
        Some(Commands::Categorize { packages }) => {
            let packages: BTreeSet<String> = if packages.is_empty() {
                HostProfile::detect(runner().as_ref()).installed
            } else {
                packages.into_iter().collect()
            };
            let categories = intent::categorize(&packages);
            if cli.json {
                return print_json(&categories);
            }
            for (category, names) in &categories {
                println!("{}:", category);
                for name in names {
                    println!("  {}", name);
                }
            }
            Ok(())
        }
        Some(Commands::Manifest) => {
            let profile = HostProfile::detect(runner().as_ref());
            let manifest =
                Manifest::from_installed(&profile.installed, &profile.distro, &profile.distro_version);
            println!("{}", manifest.to_json()?);
            Ok(())
        }
        Some(Commands::Plan { manifest, target }) => {
            let content = std::fs::read_to_string(&manifest)
                .with_context(|| format!("Failed to read {}", manifest.display()))?;
            let manifest = Manifest::from_json(&content)?;
            let plan = manifest.plan_for(target, Translator::global());
            if cli.json {
                return print_json(&plan);
            }
            println!("Plan for {} (from {}):", target, manifest.created_on_distro);
            for (category, names) in &plan {
                println!("  {}: {}", category, names.join(" "));
            }
            Ok(())
        }
        Some(Commands::Bundle { command }) => {
            run_bundle_command(command, &BundleCache::new(config.db_path_string()), cli.json)
        }
        Some(Commands::Completions { shell }) => {
            clap_complete::generate(shell, &mut Cli::command(), "pkgscout", &mut std::io::stdout());
            Ok(())
        }
        None => {
            // No command provided, show help
            println!("pkgscout v{}", env!("CARGO_PKG_VERSION"));
            println!("Run 'pkgscout --help' for usage information");
            Ok(())
        }
    }
}

fn run_bundle_command(command: BundleCommands, cache: &BundleCache, json: bool) -> Result<()> {
    match command {
        BundleCommands::Get {
            package,
            distro,
            version,
        } => match cache.get(&package, &distro, &version) {
            Some(bundle) if json => print_json(&bundle),
            Some(bundle) => {
                println!(
                    "{} on {} {} ({}, used {}x, {:.0}% success)",
                    bundle.package_name,
                    bundle.distro,
                    bundle.distro_version,
                    bundle.provenance.as_str(),
                    bundle.usage_count,
                    bundle.success_rate()
                );
                println!("  {}", bundle.data.packages.join(" "));
                if let Some(reasoning) = &bundle.data.reasoning {
                    println!("  {}", reasoning);
                }
                Ok(())
            }
            None => {
                println!("No bundle cached for {} on {} {}.", package, distro, version);
                Ok(())
            }
        },
        BundleCommands::Put {
            package,
            distro,
            version,
            packages,
            reasoning,
            generated,
        } => {
            let mut data = BundleData::new(packages);
            data.reasoning = reasoning;
            let provenance = if generated {
                Provenance::Generated
            } else {
                Provenance::Curated
            };
            let id = cache
                .upsert(&package, &distro, &version, data, provenance)
                .ok_or_else(|| anyhow::anyhow!("Failed to store bundle in {}", cache.db_path()))?;
            println!("Stored bundle {} for {} on {} {}", id, package, distro, version);
            Ok(())
        }
        BundleCommands::Record {
            package,
            distro,
            version,
            event,
        } => {
            let updated = match event {
                BundleEvent::Used => cache.increment_usage(&package, &distro, &version),
                BundleEvent::Success => cache.record_success(&package, &distro, &version),
                BundleEvent::Failure => cache.record_failure(&package, &distro, &version),
            };
            if !updated {
                return Err(anyhow::anyhow!(
                    "No bundle cached for {} on {} {}",
                    package,
                    distro,
                    version
                ));
            }
            Ok(())
        }
        BundleCommands::Popular { limit } => {
            let bundles = cache.popular(limit);
            if json {
                return print_json(&bundles);
            }
            if bundles.is_empty() {
                println!("Bundle cache is empty.");
            }
            for bundle in &bundles {
                println!(
                    "  {} [{} {}] used {}x, {:.0}% success",
                    bundle.package_name,
                    bundle.distro,
                    bundle.distro_version,
                    bundle.usage_count,
                    bundle.success_rate()
                );
            }
            Ok(())
        }
        BundleCommands::Stats => {
            let stats = cache.stats();
            if json {
                return print_json(&stats);
            }
            println!("Bundles:      {}", stats.total_bundles);
            println!("  curated:    {}", stats.curated_count);
            println!("  generated:  {}", stats.generated_count);
            println!("Total uses:   {}", stats.total_uses);
            println!("Avg success:  {:.1}%", stats.avg_success_rate);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pkgscout::conflict::{ConflictKind, Severity};

    #[test]
    fn test_cli_parses_search() {
        let cli = Cli::try_parse_from([
            "pkgscout", "search", "firefox", "librewolf", "-b", "pacman", "-b", "flatpak", "--json",
        ])
        .unwrap();
        assert!(cli.json);
        match cli.command {
            Some(Commands::Search { terms, backends, .. }) => {
                assert_eq!(terms, vec!["firefox", "librewolf"]);
                assert_eq!(backends, vec![Backend::Pacman, Backend::Flatpak]);
            }
            _ => panic!("expected search command"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_backend() {
        assert!(Cli::try_parse_from(["pkgscout", "search", "vim", "-b", "brew"]).is_err());
        assert!(Cli::try_parse_from(["pkgscout", "search"]).is_err());
    }

    #[test]
    fn test_cli_parses_translate_and_bundle() {
        let cli = Cli::try_parse_from([
            "pkgscout", "translate", "libssl-dev", "--from", "ubuntu", "--to", "arch",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Translate { from, to, .. }) => {
                assert_eq!(from, DistroFamily::Debian);
                assert_eq!(to, DistroFamily::Arch);
            }
            _ => panic!("expected translate command"),
        }

        let cli = Cli::try_parse_from([
            "pkgscout", "bundle", "record", "steam", "arch", "rolling", "success",
        ])
        .unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Bundle {
                command: BundleCommands::Record {
                    event: BundleEvent::Success,
                    ..
                }
            })
        ));
    }

    #[test]
    fn test_resolution_outcome_requires_id() {
        assert!(Cli::try_parse_from(["pkgscout", "resolutions", "nvidia", "--outcome", "success"]).is_err());
        assert!(Cli::try_parse_from([
            "pkgscout", "resolutions", "nvidia", "--id", "3", "--outcome", "failure"
        ])
        .is_ok());
    }

    #[test]
    fn test_search_terms_expansion() {
        let terms = vec!["libssl-dev".to_string(), "LIBSSL-DEV".to_string()];
        assert_eq!(search_terms(&terms, false, Some(DistroFamily::Arch)), vec!["libssl-dev"]);

        let expanded = search_terms(&terms[..1], true, Some(DistroFamily::Arch));
        assert_eq!(expanded[0], "libssl-dev");
        assert_eq!(expanded[1], "openssl");

        // Nothing to expand against without a family
        assert_eq!(search_terms(&terms[..1], true, None), vec!["libssl-dev"]);
    }

    #[test]
    fn test_render_conflict() {
        let conflict = DetectedConflict {
            kind: ConflictKind::Known,
            severity: Severity::Warning,
            conflicting_package: "pipewire".to_string(),
            installed_package: Some("pulseaudio".to_string()),
            description: "PipeWire and PulseAudio both manage audio".to_string(),
            options: vec!["Replace".to_string(), "Compat layer".to_string()],
            recommended: 1,
            votes: 5621,
            affected_users: 0,
        };

        let rendered = render_conflict(&conflict);
        assert!(rendered.starts_with("[warning] known conflict: PipeWire"));
        assert!(rendered.contains("(installed: pulseaudio)"));
        assert!(rendered.contains("[5621 votes]"));
        assert!(rendered.contains("1. Compat layer (recommended)"));
        assert!(!rendered.contains("0. Replace (recommended)"));
    }
}
