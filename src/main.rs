use std::process;
use std::sync::atomic::Ordering;

use clap::Parser;
use preimage_search::{
    display_hardware_info, format_info_header, magic_hash, Alphabet, ComputeDevice, ConsoleReporter,
    Coordinator, HostDevice, SearchConfig, SearchError, SearchMode, SearchOutcome, DEFAULT_CHUNK_SIZE,
};

#[derive(Parser)]
#[command(name = "preimage-search")]
#[command(
    about = "Search wildcard patterns for strings whose MD5 is a \"magic\" hash (0e followed by digits)",
    long_about = None
)]
struct Cli {
    /// Template string; every wildcard is replaced by characters from an alphabet
    #[arg(value_name = "PATTERN")]
    pattern: Option<String>,

    /// Wildcard character in the template
    #[arg(short = 'w', long, value_name = "CHAR", default_value = "?", value_parser = parse_wildcard)]
    wildcard: u8,

    /// One alphabet per wildcard, the last one covers all remaining wildcards.
    /// `=chars` lists the characters, `:lo:hi` is an inclusive byte range (decimal)
    #[arg(value_name = "ALPHABET")]
    alphabets: Vec<Alphabet>,

    /// Number of worker threads
    #[arg(short = 't', long, value_name = "N", default_value_t = 1)]
    threads: usize,

    /// Silent mode: print only matching strings
    #[arg(short = 's', long = "silent")]
    silent: bool,

    /// Keep going after the first match
    #[arg(short = 'a', long = "all")]
    all: bool,

    /// Offload to the compute device. Needs contiguous wildcards, a single
    /// contiguous alphabet and candidates of at most 55 bytes
    #[arg(short = 'c', long = "device")]
    device: bool,

    /// Work-items per device dispatch (multiple of 256)
    #[arg(long = "chunk-size", value_name = "N", default_value_t = DEFAULT_CHUNK_SIZE)]
    chunk_size: usize,

    /// Show hardware information
    #[arg(long = "info")]
    show_info: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.silent { "warn" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .format_timestamp(None)
        .init();

    if cli.show_info {
        display_hardware_info();
        if cli.pattern.is_none() {
            return;
        }
        println!();
    }

    let Some(pattern) = cli.pattern.clone() else {
        eprintln!("Error: a pattern and at least one alphabet are required");
        eprintln!("Example: {} 'abc????' :48:57", env!("CARGO_PKG_NAME"));
        process::exit(1);
    };

    let mode = if cli.all { SearchMode::CollectAll } else { SearchMode::FirstMatch };
    let config = SearchConfig::new(pattern, cli.alphabets.clone())
        .with_wildcard(cli.wildcard)
        .with_workers(cli.threads)
        .with_mode(mode)
        .with_device(cli.device)
        .with_verbose(!cli.silent)
        .with_chunk_size(cli.chunk_size);

    if let Err(e) = run(&config) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn parse_wildcard(s: &str) -> Result<u8, String> {
    match s.as_bytes() {
        [b] if b.is_ascii() => Ok(*b),
        _ => Err(format!("wildcard must be a single ASCII character, got {:?}", s)),
    }
}

fn run(config: &SearchConfig) -> Result<SearchOutcome, SearchError> {
    let coordinator = Coordinator::new(config, magic_hash, ConsoleReporter::new(config.verbose))?;
    if config.verbose {
        print!("{}", format_info_header(config, coordinator.space()));
    }

    let cancel = coordinator.cancel_handle();
    if let Err(e) = ctrlc::set_handler(move || {
        cancel.store(true, Ordering::SeqCst);
    }) {
        log::warn!("could not install Ctrl+C handler: {}", e);
    }

    let outcome = if config.use_device {
        let device = open_device()?;
        if config.verbose {
            println!("  Device: {}", device.name());
        }
        coordinator.run_device(device)?
    } else {
        coordinator.run_cpu()
    };

    coordinator.into_reporter().finish(&outcome);
    Ok(outcome)
}

#[cfg(all(feature = "gpu", target_os = "macos"))]
fn open_device() -> Result<Box<dyn ComputeDevice>, SearchError> {
    use preimage_search::gpu::MetalDevice;

    match MetalDevice::open() {
        Ok(device) => Ok(Box::new(device)),
        Err(e) => {
            log::warn!("{}; falling back to the host kernel", e);
            Ok(Box::new(HostDevice::new(magic_hash)))
        }
    }
}

#[cfg(not(all(feature = "gpu", target_os = "macos")))]
fn open_device() -> Result<Box<dyn ComputeDevice>, SearchError> {
    log::info!("built without Metal support, running the device kernel on the host");
    Ok(Box::new(HostDevice::new(magic_hash)))
}
