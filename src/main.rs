use clap::{ArgAction, Parser, Subcommand};
use devsuite_installer::{
    ArtifactFetcher, Component, ComponentEvent, ComponentState, DescriptorSet, EngineOptions,
    FetchOptions, InstallEngine, InstallOption, InstallSummary, LogReporter, Platform, Reporter,
    RequirementSet, SystemProbe, VersionWarning, VmDriver,
};
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

const EXIT_CONFIG: i32 = 2;

#[derive(Parser)]
#[command(name = "devsuite")]
#[command(author, version, long_about = None)]
#[command(about = "Detect and install the developer platform requirements")]
struct Cli {
    /// Increase verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Requirements document to use instead of the built-in one
    #[arg(long, value_name = "FILE", global = true)]
    requirements: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report which requirements are installed
    Detect {
        /// Detect as if running on another OS (win32, darwin, linux)
        #[arg(long)]
        platform: Option<Platform>,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Install the requirements that are missing or outdated
    Install {
        /// Directory downloads are cached in
        #[arg(long, value_name = "DIR")]
        cache_dir: Option<PathBuf>,

        /// Directory components are installed under
        #[arg(long, value_name = "DIR")]
        target_dir: Option<PathBuf>,

        /// Directory holding artifacts of an offline bundle
        #[arg(long, value_name = "DIR")]
        bundle_dir: Option<PathBuf>,

        /// Fail components whose download does not match its checksum
        #[arg(long)]
        strict_checksum: bool,

        /// Component key to leave alone (repeatable)
        #[arg(long, value_name = "KEY")]
        skip: Vec<String>,

        /// Extra download attempts after a network failure
        #[arg(long)]
        retries: Option<u32>,

        /// Do not re-detect components after their installer ran
        #[arg(long)]
        no_verify: bool,

        /// Hypervisor the CDK is set up for (hyperv, virtualbox, kvm)
        #[arg(long, value_name = "DRIVER")]
        vm_driver: Option<VmDriver>,
    },
}

fn setup_logger(verbose: u8) {
    let default = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn load_descriptors(path: Option<&PathBuf>) -> Result<DescriptorSet, String> {
    let descriptors = match path {
        Some(path) => DescriptorSet::from_path(path),
        None => DescriptorSet::builtin(),
    };
    descriptors.map_err(|e| format!("Error: {e}"))
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    setup_logger(cli.verbose);

    let descriptors = match load_descriptors(cli.requirements.as_ref()) {
        Ok(descriptors) => descriptors,
        Err(message) => {
            eprintln!("{message}");
            std::process::exit(EXIT_CONFIG);
        }
    };

    let code = match cli.command {
        Commands::Detect { platform, json } => detect(&descriptors, platform, json).await,
        Commands::Install {
            cache_dir,
            target_dir,
            bundle_dir,
            strict_checksum,
            skip,
            retries,
            no_verify,
            vm_driver,
        } => {
            let defaults = FetchOptions::default();
            let fetch_options = FetchOptions {
                cache_dir: cache_dir.unwrap_or(defaults.cache_dir.clone()),
                bundle_dir,
                strict_checksum,
                retries: retries.unwrap_or(defaults.retries),
                ..defaults
            };
            let defaults = EngineOptions::default();
            let engine_options = EngineOptions {
                target_dir: target_dir.unwrap_or(defaults.target_dir.clone()),
                verify_after_install: !no_verify,
                vm_driver,
                ..defaults
            };
            install(&descriptors, fetch_options, engine_options, &skip).await
        }
    };

    std::process::exit(code);
}

fn engine(
    platform: Platform,
    fetch_options: FetchOptions,
    options: EngineOptions,
) -> Result<InstallEngine<SystemProbe>, String> {
    let fetcher = ArtifactFetcher::new(fetch_options).map_err(|e| format!("Error: {e}"))?;
    Ok(InstallEngine::new(SystemProbe::with_platform(platform), fetcher, options))
}

async fn detect(descriptors: &DescriptorSet, platform: Option<Platform>, json: bool) -> i32 {
    let platform = platform.unwrap_or_else(Platform::current);
    let engine = match engine(platform, FetchOptions::default(), EngineOptions::default()) {
        Ok(engine) => engine,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_CONFIG;
        }
    };

    let mut set = RequirementSet::for_platform(descriptors, platform);
    engine.detect_all(&mut set, &LogReporter).await;

    if json {
        let report: Vec<_> = set.iter().map(component_json).collect();
        match serde_json::to_string_pretty(&report) {
            Ok(text) => println!("{text}"),
            Err(e) => {
                eprintln!("Error: {e}");
                return 1;
            }
        }
    } else {
        println!("Requirements on {platform}:");
        for component in &set {
            print_component(component);
        }
    }
    0
}

async fn install(
    descriptors: &DescriptorSet,
    fetch_options: FetchOptions,
    engine_options: EngineOptions,
    skip: &[String],
) -> i32 {
    let platform = Platform::current();
    let engine = match engine(platform, fetch_options, engine_options) {
        Ok(engine) => engine,
        Err(message) => {
            eprintln!("{message}");
            return EXIT_CONFIG;
        }
    };

    let mut set = RequirementSet::for_platform(descriptors, platform);
    engine.detect_all(&mut set, &LogReporter).await;

    for key in skip {
        if let Err(e) = set.select(key, InstallOption::Skip) {
            eprintln!("Error: {e}");
            return EXIT_CONFIG;
        }
    }

    let cancel = CancellationToken::new();
    let on_interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            debug!("interrupt received, cancelling");
            on_interrupt.cancel();
        }
    });

    let reporter = |event: ComponentEvent| {
        LogReporter.report(event.clone());
        if event.is_terminal() && event.state != ComponentState::NotApplicable {
            println!("{:<12} {}", event.key, event.state);
        }
    };
    let summary = engine.install(&mut set, &reporter, &cancel).await;
    print_summary(&summary);

    for component in &set {
        if let Some(message) = component.error_message() {
            error!(key = component.key(), "{message}");
        }
    }
    summary.exit_code()
}

fn print_component(component: &Component) {
    let version = component
        .installed_version()
        .map(ToString::to_string)
        .unwrap_or_else(|| "-".to_string());
    let warning = match component.warning() {
        Some(VersionWarning::Older) => " (older than recommended)",
        Some(VersionWarning::Newer) => " (newer than recommended)",
        None => "",
    };
    println!(
        "  {:<30} {:<20} {:<10} -> {}{}",
        component.spec().display_name(),
        component.state(),
        version,
        component.selected_option(),
        warning
    );
}

fn component_json(component: &Component) -> serde_json::Value {
    serde_json::json!({
        "key": component.key(),
        "state": component.state().name(),
        "installedVersion": component.installed_version().map(ToString::to_string),
        "recommendedVersion": component.spec().recommended().map(ToString::to_string),
        "warning": component.warning(),
        "selectedOption": component.selected_option(),
        "configured": component.is_configured(),
        "skipped": component.is_skipped(),
    })
}

fn print_summary(summary: &InstallSummary) {
    let list = |keys: &[String]| if keys.is_empty() { "-".to_string() } else { keys.join(", ") };
    println!();
    println!("Succeeded: {}", list(&summary.succeeded));
    println!("Failed:    {}", list(&summary.failed));
    println!("Skipped:   {}", list(&summary.skipped));
    if summary.cancelled {
        println!("Installation was cancelled.");
    }
}
