//! `sqlorder`: prints a dependency-safe scripting order for the SQL Server
//! objects listed in a manifest, asking the catalog only when needed.

use std::io::{self, IsTerminal, Write};

use owo_colors::OwoColorize;
use sqlorder::cli::{self, CliArgs};
use sqlorder::commands;
use sqlorder::error::{self, ErrorKind};
use sqlorder::output::json;

fn main() {
    let args = cli::parse();
    init_logging(args.verbose);
    if let Err(err) = commands::dispatch(&args) {
        report(&args, &err);
        std::process::exit(1);
    }
}

/// Ordering errors go to stderr, as JSON when `--json` was requested.
fn report(args: &CliArgs, err: &anyhow::Error) {
    let message = format!("{:#}", err);
    let kind = error::classify_error(err);
    if args.output.json {
        let payload = json::error_json(&message, kind.as_str());
        if let Ok(body) = json::emit_json_value(&payload, true) {
            let _ = writeln!(io::stderr(), "{}", body);
        }
        return;
    }
    print_error(&message);
    if kind == ErrorKind::Cycle {
        let _ = writeln!(
            io::stderr(),
            "hint: the catalog reports objects that depend on each other; no order exists"
        );
    }
}

fn init_logging(verbose: u8) {
    let filter = match verbose {
        0 => "warn,tiberius=error",
        1 => "sqlorder=info,tiberius=warn",
        2 => "sqlorder=debug,tiberius=info",
        _ => "trace",
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(filter));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .try_init();
}

fn print_error(message: &str) {
    if should_color_stderr() {
        let line = format!("Error: {}", message);
        let _ = writeln!(io::stderr(), "{}", line.red());
    } else {
        let _ = writeln!(io::stderr(), "Error: {}", message);
    }
}

fn should_color_stderr() -> bool {
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    io::stderr().is_terminal()
}
