//! Line-oriented driver for the symbol table.
//!
//! Reads commands from a file given as the first argument (or stdin when the
//! argument is absent or `-`) and applies them to one table, writing results
//! to stdout. Output is buffered unless the second argument is `nobuffer`.
//!
//! Commands: `put k v`, `get k [mustbenull|mustexist]`, `remove k`, `check`,
//! `dump`, `size`, `height`, and the timing markers `startintv`/`endintv`.
//! Malformed commands are reported on stderr and skipped.

use std::env;
use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;
use std::process;
use std::time::Instant;

use log::{LevelFilter, warn};
use simplelog::{Config, WriteLogger};

use rb_symtab::SymbolTable;

fn main() {
    let _ = WriteLogger::init(LevelFilter::Warn, Config::default(), io::stderr());

    let args: Vec<String> = env::args().skip(1).collect();
    let reader: Box<dyn BufRead> = match args.first().map(String::as_str) {
        None | Some("-") => Box::new(BufReader::new(io::stdin())),
        Some(path) => {
            if !Path::new(path).is_file() {
                eprintln!("file '{path}' does not exist or is not a file");
                process::exit(1);
            }
            match File::open(path) {
                Ok(file) => Box::new(BufReader::new(file)),
                Err(err) => {
                    eprintln!("cannot open '{path}': {err}");
                    process::exit(2);
                }
            }
        }
    };
    let buffered = args.get(1).map(String::as_str) != Some("nobuffer");

    if let Err(err) = run(reader, buffered) {
        eprintln!("i/o error: {err}");
        process::exit(3);
    }
}

struct Session {
    table: SymbolTable,
    interval_start: Instant,
}

fn run(reader: impl BufRead, buffered: bool) -> io::Result<()> {
    let mut out = BufWriter::new(io::stdout().lock());
    let mut session = Session {
        table: SymbolTable::new(),
        interval_start: Instant::now(),
    };

    for line in reader.lines() {
        let line = line?;
        let tokens = split_line(&line);
        apply(&mut session, &tokens, &mut out)?;
        if !buffered {
            out.flush()?;
        }
    }
    out.flush()
}

fn apply(session: &mut Session, tokens: &[String], out: &mut impl Write) -> io::Result<()> {
    let Some(command) = tokens.first().map(String::as_str) else {
        return Ok(());
    };

    match command {
        "put" => match (tokens.get(1), tokens.get(2)) {
            (Some(key), Some(value)) => {
                session.table.put(key, value);
            }
            (Some(_), None) => warn!("put: no value specified"),
            _ => warn!("put: no key specified"),
        },
        "get" => match tokens.get(1) {
            None => warn!("get: no key specified"),
            Some(key) => {
                let value = session.table.get(key);
                let status = match tokens.get(2).map(String::as_str) {
                    Some("mustbenull") => {
                        if value.is_none() {
                            "good"
                        } else {
                            "bad_should_be_null"
                        }
                    }
                    Some("mustexist") => {
                        if value.is_some() {
                            "good"
                        } else {
                            "bad_should_exist"
                        }
                    }
                    _ => "no_check",
                };
                let rendered = match value {
                    Some(v) => format!("'{v}'"),
                    None => String::from("null"),
                };
                writeln!(out, "Key: '{key}', value {rendered}, status: {status}")?;
            }
        },
        "remove" => match tokens.get(1) {
            None => warn!("remove: no key specified"),
            Some(key) => {
                let rendered = match session.table.remove(key) {
                    Some(v) => format!("'{v}'"),
                    None => String::from("null"),
                };
                writeln!(out, "Key: '{key}'; value = {rendered} removed")?;
            }
        },
        "check" => match session.table.check() {
            Ok(()) => writeln!(out, "check: tree is sound")?,
            Err(corruption) => writeln!(out, "check: tree is corrupt! {corruption}")?,
        },
        "dump" => writeln!(out, "{}", session.table.dump())?,
        "size" => writeln!(out, "{}", session.table.size())?,
        "height" => writeln!(out, "Height: {}", session.table.height())?,
        "startintv" => session.interval_start = Instant::now(),
        "endintv" => writeln!(
            out,
            "Finished t={:.7}",
            session.interval_start.elapsed().as_secs_f64()
        )?,
        other => warn!("unknown command '{other}'"),
    }
    Ok(())
}

/// Splits a command line into tokens. Whitespace separates tokens; a
/// single-quoted span keeps its spaces and the quotes themselves are
/// dropped, so `put 'a key' v` carries the key `a key`.
fn split_line(line: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current: Option<String> = None;
    let mut in_quotes = false;

    for ch in line.chars() {
        if in_quotes {
            if ch == '\'' {
                in_quotes = false;
            } else if let Some(token) = current.as_mut() {
                token.push(ch);
            }
        } else if ch == '\'' {
            in_quotes = true;
            current.get_or_insert_with(String::new);
        } else if ch.is_whitespace() {
            if let Some(token) = current.take() {
                tokens.push(token);
            }
        } else {
            current.get_or_insert_with(String::new).push(ch);
        }
    }
    if let Some(token) = current {
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use super::split_line;

    #[test]
    fn splits_on_whitespace() {
        assert_eq!(split_line("put a b"), ["put", "a", "b"]);
        assert_eq!(split_line("  size  "), ["size"]);
        assert_eq!(split_line("get\tk\tmustexist"), ["get", "k", "mustexist"]);
    }

    #[test]
    fn empty_lines_yield_no_tokens() {
        assert!(split_line("").is_empty());
        assert!(split_line("   \t ").is_empty());
    }

    #[test]
    fn quoted_spans_keep_their_spaces() {
        assert_eq!(split_line("put 'a key' 'some value'"), ["put", "a key", "some value"]);
        assert_eq!(split_line("get ''"), ["get", ""]);
    }

    #[test]
    fn quotes_splice_into_surrounding_token() {
        assert_eq!(split_line("ab'c d'e"), ["abc de"]);
    }

    #[test]
    fn unterminated_quote_runs_to_end_of_line() {
        assert_eq!(split_line("put 'dangling tail"), ["put", "dangling tail"]);
    }
}
