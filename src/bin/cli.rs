use std::io::{IsTerminal, Read};
use std::path::PathBuf;
use std::process;

use clap::{CommandFactory, Parser as ClapParser};
use tracing_subscriber::EnvFilter;

use reqhead::{
    format_debug, format_head, format_json, header_complete, HeadStatus, Parser, ParserConfig,
};

/// reqhead CLI: HTTP/1.x request-head parser.
///
/// Reads a raw request head from a file, --raw string, or stdin, runs it
/// through the same checks a server would, and prints the parsed request
/// or the status code it would be rejected with.
///
/// Escape sequences (\r, \n, \t, \\) in the --raw value are interpreted so
/// you can pass a full HTTP request as a single shell argument.
#[derive(ClapParser)]
#[command(name = "reqhead-cli", version, about, long_about = None)]
struct Cli {
    /// Path to a file containing a raw HTTP request.
    /// Reads from stdin when neither FILE nor --raw is given.
    #[arg(value_name = "FILE")]
    file: Option<PathBuf>,

    /// Raw HTTP request string (escape sequences \r \n \t \\ are expanded).
    #[arg(long)]
    raw: Option<String>,

    /// Output format.
    #[arg(short, long, default_value = "json", value_enum)]
    format: OutputFormat,

    /// Pretty-print JSON output (ignored for other formats).
    #[arg(short, long)]
    pretty: bool,

    /// Treat HTTP/1.1 requests as HTTP/1.0.
    #[arg(long)]
    http10_only: bool,

    /// Maximum POST body size in KiB (0 = unlimited).
    #[arg(long, default_value = "0", value_name = "KB")]
    max_request_size: u64,

    /// Position of this request on its connection (1 = first request).
    #[arg(long, default_value = "1")]
    request_count: usize,

    /// Log every request head.
    #[arg(long)]
    log_request_header: bool,

    /// Log the request head when it is rejected.
    #[arg(long)]
    log_request_header_on_error: bool,

    /// Increase log verbosity (-v info, -vv debug). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(clap::ValueEnum, Clone, Debug)]
enum OutputFormat {
    /// JSON output
    Json,
    /// Human-readable debug output
    Debug,
    /// Request line + headers only
    Head,
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    // When no input source is provided and stdin is a terminal (not piped),
    // show help instead of blocking.
    if cli.file.is_none() && cli.raw.is_none() && std::io::stdin().is_terminal() {
        Cli::command().print_help().ok();
        println!();
        process::exit(0);
    }

    let data = match read_input(&cli) {
        Ok(d) => d,
        Err(e) => {
            eprintln!("Error reading input: {e}");
            process::exit(1);
        }
    };

    if !header_complete(&data) {
        eprintln!("Error: incomplete request head (no blank line)");
        process::exit(2);
    }

    let config = ParserConfig {
        allow_http11: !cli.http10_only,
        max_request_size_kb: cli.max_request_size,
        log_request_header: cli.log_request_header,
        log_request_header_on_error: cli.log_request_header_on_error,
    };

    let mut parser = Parser::with_config(config);
    parser.set_request_count(cli.request_count.saturating_sub(1));

    let status = parser.parse(&data);
    if status == HeadStatus::Failed {
        eprintln!(
            "{} {} (keep-alive: {})",
            parser.http_status(),
            reason_phrase(parser.http_status()),
            parser.keep_alive()
        );
        process::exit(2);
    }

    let Some(request) = parser.request() else {
        eprintln!("Error: no request parsed");
        process::exit(2);
    };

    let output = match cli.format {
        OutputFormat::Json => format_json(request, cli.pretty),
        OutputFormat::Debug => format_debug(request),
        OutputFormat::Head => format_head(request),
    };

    print!("{output}");
    if !output.ends_with('\n') {
        println!();
    }
    match status {
        HeadStatus::ReadBody(n) => eprintln!("body: {n} bytes, keep-alive: {}", parser.keep_alive()),
        _ => eprintln!("body: none, keep-alive: {}", parser.keep_alive()),
    }
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn reason_phrase(status: u16) -> &'static str {
    match status {
        400 => "Bad Request",
        411 => "Length Required",
        413 => "Payload Too Large",
        417 => "Expectation Failed",
        501 => "Not Implemented",
        505 => "HTTP Version Not Supported",
        _ => "",
    }
}

/// Read raw HTTP bytes from --raw, a file, or stdin.
fn read_input(cli: &Cli) -> Result<Vec<u8>, std::io::Error> {
    if let Some(raw) = &cli.raw {
        return Ok(unescape(raw).into_bytes());
    }
    match &cli.file {
        Some(path) => std::fs::read(path),
        None => {
            let mut buf = Vec::new();
            std::io::stdin().read_to_end(&mut buf)?;
            Ok(buf)
        }
    }
}

/// Expand C-style escape sequences (`\r`, `\n`, `\t`, `\\`) in a string.
///
/// Any other `\X` sequence is kept as-is (both the backslash and `X`).
fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(ch) = chars.next() {
        if ch == '\\' {
            match chars.next() {
                Some('r') => out.push('\r'),
                Some('n') => out.push('\n'),
                Some('t') => out.push('\t'),
                Some('\\') => out.push('\\'),
                Some(other) => {
                    out.push('\\');
                    out.push(other);
                }
                None => out.push('\\'),
            }
        } else {
            out.push(ch);
        }
    }
    out
}
