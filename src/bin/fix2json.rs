//! Converts FIX log files into one JSON document per line, following an
//! external FIX Orchestra schema.

use std::fs;
use std::path::PathBuf;

use anyhow::Context;
use clap::Parser;
use fix_orchestra::{Message, Repository};
use regex::Regex;

/// Convert FIX message log files to JSON
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Log file(s) to parse
    #[arg(required = true)]
    file: Vec<PathBuf>,

    /// FIX Orchestra repository file
    #[arg(long)]
    repository: PathBuf,

    /// Suppress administrative (Session category) messages
    #[arg(short = 'n', long = "no-admin-messages")]
    no_admin_messages: bool,
}

/// Matches `fix_to_json.py`'s timestamped log-line shape: a leading
/// `YYYYMMDD-HH:MM:SS.` stamp with 2-9 fractional-second digits, a ` : `
/// separator, then the raw message.
fn line_parser() -> Regex {
    Regex::new(r"^(?P<timestamp>\d{8}-\d{2}:\d{2}:\d{2}\.\d{2,9}) : (?P<message>.*)$").expect("static regex is valid")
}

fn convert_file(path: &PathBuf, repo: &Repository, line_parser: &Regex, no_admin_messages: bool) -> anyhow::Result<()> {
    let contents = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    for (line_no, line) in contents.lines().enumerate() {
        let raw = match line_parser.captures(line) {
            Some(caps) => caps.name("message").unwrap().as_str().to_string(),
            None => line.to_string(),
        };
        let Some(message) = Message::parse(raw.as_bytes(), repo) else {
            eprintln!("{}:{}: no MsgType found, skipping", path.display(), line_no + 1);
            continue;
        };
        if no_admin_messages && message.is_admin() {
            continue;
        }
        println!("{}", message.to_json(repo));
    }
    Ok(())
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let repo = Repository::load(&args.repository)
        .with_context(|| format!("loading repository {}", args.repository.display()))?;
    let line_parser = line_parser();

    for file in &args.file {
        convert_file(file, &repo, &line_parser, args.no_admin_messages)?;
    }

    Ok(())
}
