//! Print the sessions of capture files as JSON
//!
//! ```text
//! RUST_LOG=debug cargo run --example capture-sessions -- trace.pcapng
//! cargo run --features ip-api --example capture-sessions -- trace.pcap
//! ```

use pcap_sessions::*;
use std::env;
use std::error::Error;
use std::io::Write;

fn main() {
    env_logger::init();
    let mut failed = false;
    for arg in env::args().skip(1) {
        if let Err(e) = print_sessions(&arg) {
            eprintln!("{}: {}", arg, e);
            failed = true;
        }
    }
    if failed {
        std::process::exit(1);
    }
}

#[cfg(feature = "ip-api")]
fn print_sessions(arg: &str) -> Result<(), Box<dyn Error>> {
    let locator = geo::IpApiLocator::new(geo::IpApiConfig::default())?;
    let cache = GeoCache::new();
    let parser = CaptureParser::default()
        .with_locator(&locator)
        .with_cache(&cache);
    run(&parser, arg)
}

#[cfg(not(feature = "ip-api"))]
fn print_sessions(arg: &str) -> Result<(), Box<dyn Error>> {
    run(&CaptureParser::default(), arg)
}

fn run(parser: &CaptureParser, arg: &str) -> Result<(), Box<dyn Error>> {
    let mut progress = |percent: u8, phase: &str| {
        eprint!("\r{:>3}% {:<24}", percent, phase);
        let _ = std::io::stderr().flush();
    };
    let report = parser.parse_file_with_progress(arg, &mut progress)?;
    eprintln!();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
