//! # filmlog
//!
//! A CLI for keeping a photographic film roll log in a plain text file.
//!
//! ## Overview
//!
//! filmlog is built on top of filmloglib and reports on a hand-edited log of
//! film rolls: which stock was loaded in which camera and when, when the
//! roll went to the lab and came back, and which page of the scan archive
//! it landed on. Entries are addressed by short content-derived IDs, so
//! there is nothing to number by hand.
//!
//! ## Usage
//!
//! ```bash
//! # Show the full roll log from ./rolls.log
//! filmlog
//!
//! # Per-stock inventory: rolls available, shot and total
//! filmlog -m stock
//!
//! # One tag line per roll, for scripting and search
//! filmlog -m tags
//!
//! # Single entry by its short-ID, with color
//! filmlog --id 4c2ff -f pretty
//!
//! # Markdown or HTML tables
//! filmlog --md
//! filmlog --html
//!
//! # The raw dataset as JSON
//! filmlog --output json
//! ```

use std::fs::File;
use std::io::{self, BufReader, Write};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use clap::{Arg, ArgAction, ArgMatches, Command};
use filmloglib::report::{
    render_log, render_log_html, render_stock, render_stock_html, render_tags,
};
use filmloglib::{parse, Config};

/// Build the clap Command structure
fn build_command() -> Command {
    Command::new("filmlog")
        .version(env!("CARGO_PKG_VERSION"))
        .author("Arthur Debert")
        .about("Film roll logging and reporting from a plain text file")
        .arg(
            Arg::new("file")
                .help("Log file to read (defaults to ./rolls.log)")
                .default_value("./rolls.log"),
        )
        .arg(
            Arg::new("mode")
                .short('m')
                .long("mode")
                .value_parser(["log", "stock", "tags"])
                .default_value("log")
                .help("Report to produce"),
        )
        .arg(
            Arg::new("format")
                .short('f')
                .long("format")
                .value_parser(["plain", "pretty"])
                .default_value("plain")
                .help("Table style; pretty uses color and tighter spacing"),
        )
        .arg(
            Arg::new("separator")
                .short('s')
                .long("separator")
                .default_value(" \u{2502} ")
                .help("Column group separator"),
        )
        .arg(
            Arg::new("md")
                .long("md")
                .action(ArgAction::SetTrue)
                .help("Emit a markdown-compatible table"),
        )
        .arg(
            Arg::new("html")
                .long("html")
                .action(ArgAction::SetTrue)
                .help("Emit an HTML table"),
        )
        .arg(
            Arg::new("nh")
                .long("nh")
                .action(ArgAction::SetTrue)
                .help("Omit the header row"),
        )
        .arg(
            Arg::new("id")
                .long("id")
                .help("Only show the entry with this short-ID"),
        )
        .arg(
            Arg::new("output")
                .short('o')
                .long("output")
                .value_parser(["table", "json"])
                .default_value("table")
                .help("Output format: rendered table or the raw dataset as JSON"),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .action(ArgAction::SetTrue)
                .help("Print timing information on stderr"),
        )
}

/// Target table width: terminal columns minus a small margin, clamped to a
/// usable minimum. Zero (no stretching) for markdown/HTML output or when
/// the terminal size cannot be detected.
fn target_width(md: bool, html: bool) -> usize {
    if md || html {
        return 0;
    }
    match console::Term::stdout().size_checked() {
        Some((_, cols)) => (cols as usize).saturating_sub(5).max(80),
        None => 0,
    }
}

fn run(matches: &ArgMatches) -> anyhow::Result<()> {
    let path = matches
        .get_one::<String>("file")
        .map(|s| s.as_str())
        .unwrap_or("./rolls.log");
    let verbose = matches.get_flag("verbose");

    let start = Instant::now();
    let file = File::open(path).with_context(|| format!("cannot open log file '{}'", path))?;
    let db = parse(BufReader::new(file)).with_context(|| format!("parsing '{}'", path))?;
    if verbose {
        eprintln!(
            "parsed {} entries ({} stocks, {} cameras, {} labs) in {:?}",
            db.entries.len(),
            db.stocks.len(),
            db.cameras.len(),
            db.labs.len(),
            start.elapsed()
        );
    }

    let stdout = io::stdout();
    let mut w = stdout.lock();

    if matches.get_one::<String>("output").map(|s| s.as_str()) == Some("json") {
        writeln!(w, "{}", serde_json::to_string_pretty(&db)?)?;
        return Ok(());
    }

    let md = matches.get_flag("md");
    let html = matches.get_flag("html");
    let pretty = matches.get_one::<String>("format").map(|s| s.as_str()) == Some("pretty");

    let cfg = Config {
        id_filter: matches.get_one::<String>("id").cloned(),
        color: pretty && !md && !html,
        pretty,
        header: !matches.get_flag("nh"),
        header_sep: md,
        separator: if md {
            " | ".to_string()
        } else {
            matches
                .get_one::<String>("separator")
                .cloned()
                .unwrap_or_else(|| " \u{2502} ".to_string())
        },
        edge_separators: md,
        width: target_width(md, html),
    };

    match matches.get_one::<String>("mode").map(|s| s.as_str()) {
        Some("stock") => {
            if html {
                render_stock_html(&db, &mut w, &cfg)?;
            } else {
                render_stock(&db, &mut w, &cfg)?;
            }
        }
        Some("tags") => render_tags(&db, &mut w, cfg.id_filter.as_deref())?,
        _ => {
            if html {
                render_log_html(&db, &mut w, &cfg)?;
            } else {
                render_log(&db, &mut w, &cfg)?;
            }
        }
    }

    if verbose {
        eprintln!("rendered in {:?}", start.elapsed());
    }
    Ok(())
}

fn main() -> ExitCode {
    let matches = build_command().get_matches();
    match run(&matches) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
