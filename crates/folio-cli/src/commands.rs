//! Command parsing and dispatch for the folio shell.
//!
//! The session owns the single "currently open database" slot; opening a
//! second database while one is open is rejected here, not in the engine.

use folio_common::{DatabaseConfig, DocSpan, Field, FolioError, Result};
use folio_engine::{ingest_xml, Database};
use std::io::{Read, Seek, SeekFrom};
use std::time::Instant;

/// Whether the loop should keep going after a command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Continue,
    Exit,
}

/// Shell state: configuration plus the open-database slot.
pub struct Session {
    config: DatabaseConfig,
    current: Option<Database>,
}

impl Session {
    pub fn new(config: DatabaseConfig) -> Self {
        Self {
            config,
            current: None,
        }
    }

    /// Parses and runs one input line, printing results and errors.
    pub fn execute(&mut self, line: &str) -> Outcome {
        let tokens = tokenize(line);
        let Some((command, args)) = tokens.split_first() else {
            return Outcome::Continue;
        };

        match self.dispatch(command, args) {
            Ok(outcome) => outcome,
            Err(FolioError::FileMissing { path }) => {
                eprintln!("Error: {}", FolioError::FileMissing { path });
                eprintln!("Create it first with `create [name]`.");
                Outcome::Continue
            }
            Err(e) => {
                eprintln!("Error: {}", e);
                Outcome::Continue
            }
        }
    }

    fn dispatch(&mut self, command: &str, args: &[String]) -> Result<Outcome> {
        match command {
            "create" => self.open_database(args, true)?,
            "open" => self.open_database(args, false)?,
            "close" => self.close()?,
            "read" => self.read(args)?,
            "find" => self.find(args)?,
            "search" => self.search(args)?,
            "select" => self.select(args)?,
            "top" => self.top(args)?,
            "whoami" => {
                let db = self.current.as_ref().ok_or(FolioError::NotOpen)?;
                println!("Who am I? Database {}!", db.name());
            }
            "help" => print_help(),
            "exit" => {
                self.current = None;
                println!("So long...");
                return Ok(Outcome::Exit);
            }
            unknown => println!("Command not found: {}", unknown),
        }
        Ok(Outcome::Continue)
    }

    /// Whether a database is currently open. Used by tests.
    #[cfg_attr(not(test), allow(dead_code))]
    pub fn is_open(&self) -> bool {
        self.current.is_some()
    }

    fn open_database(&mut self, args: &[String], create: bool) -> Result<()> {
        if let Some(db) = &self.current {
            return Err(FolioError::AlreadyOpen(db.name().to_string()));
        }
        let usage = if create { "create [name]" } else { "open [name]" };
        let name = expect_args::<1>(args, usage)?[0];

        let db = Database::open(name, create, &self.config)?;
        println!("Database {} is open.", db.name());
        self.current = Some(db);
        Ok(())
    }

    fn close(&mut self) -> Result<()> {
        let db = self.current.take().ok_or(FolioError::NotOpen)?;
        println!("Database {} is closed.", db.name());
        Ok(())
    }

    fn read(&mut self, args: &[String]) -> Result<()> {
        if args.len() > 1 {
            return Err(bad_args(1, args.len(), "read [file]"));
        }
        let path = args
            .first()
            .map(std::path::PathBuf::from)
            .unwrap_or_else(|| self.config.source_xml.clone());
        let capacity = self.config.topk_capacity;
        let db = self.current.as_mut().ok_or(FolioError::NotOpen)?;

        let start = Instant::now();
        let stats = ingest_xml(db, &path)?;
        db.topk().make_topk(capacity)?;
        println!(
            "READ OK: {} record(s), {} key(s) ({:.3} sec)",
            stats.records,
            stats.keys,
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn find(&mut self, args: &[String]) -> Result<()> {
        let usage = "find [title|author] [prefix]";
        let [field, prefix] = expect_args::<2>(args, usage)?;
        let field = parse_field(field, usage)?;
        if prefix.is_empty() {
            return Err(FolioError::EmptyQuery);
        }
        let db = self.current.as_ref().ok_or(FolioError::NotOpen)?;

        let start = Instant::now();
        let results = db.find(prefix, field)?;
        for (i, (span, key)) in results.iter().enumerate() {
            println!("[{}] {}", i + 1, key);
            self.print_excerpt(*span);
        }
        println!(
            "FIND OK: {} record(s) ({:.3} sec)",
            results.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn search(&mut self, args: &[String]) -> Result<()> {
        let db = self.current.as_ref().ok_or(FolioError::NotOpen)?;

        let start = Instant::now();
        let results = db.search(args)?;
        println!("Search for {}:", args.join(" + "));
        for (i, span) in results.iter().enumerate() {
            println!("[{}] {}", i + 1, span);
            self.print_excerpt(*span);
        }
        println!(
            "SEARCH OK: {} record(s) ({:.3} sec)",
            results.len(),
            start.elapsed().as_secs_f64()
        );
        Ok(())
    }

    fn select(&mut self, args: &[String]) -> Result<()> {
        let usage = "select [title|author]";
        let [field] = expect_args::<1>(args, usage)?;
        let field = parse_field(field, usage)?;
        let db = self.current.as_ref().ok_or(FolioError::NotOpen)?;

        let keys = db.list(field, 64)?;
        for (i, key) in keys.iter().enumerate() {
            println!("[{}] {}", i + 1, key);
        }
        if keys.len() == 64 {
            println!("...");
            println!("There may be more than 64 records, please use `find`.");
        }
        println!("SELECT OK");
        Ok(())
    }

    fn top(&mut self, args: &[String]) -> Result<()> {
        let [k] = expect_args::<1>(args, "top [number]")?;
        let k: usize = k
            .parse()
            .map_err(|_| bad_args(1, args.len(), "top [number]"))?;
        let db = self.current.as_mut().ok_or(FolioError::NotOpen)?;

        for (i, (name, count)) in db.topk().top(k).iter().enumerate() {
            println!("[{}] {} ({})", i + 1, name, count);
        }
        Ok(())
    }

    /// Re-reads a span from the source corpus and prints a short excerpt.
    fn print_excerpt(&self, span: DocSpan) {
        let Ok(mut file) = std::fs::File::open(&self.config.source_xml) else {
            println!("      {}", span);
            return;
        };
        let mut buf = vec![0u8; span.len as usize];
        let read = file
            .seek(SeekFrom::Start(span.pos as u64))
            .and_then(|_| file.read(&mut buf));
        if read.is_err() {
            println!("      {}", span);
            return;
        }

        let text = String::from_utf8_lossy(&buf);
        let mut line: String = text.split_whitespace().collect::<Vec<_>>().join(" ");
        if line.len() > 120 {
            line.truncate(120);
            line.push_str("...");
        }
        println!("      {}", line);
    }
}

/// Splits an input line into tokens, honouring double-quoted arguments.
fn tokenize(input: &str) -> Vec<String> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    for c in input.chars() {
        match c {
            '"' => {
                if in_quotes {
                    tokens.push(std::mem::take(&mut current));
                }
                in_quotes = !in_quotes;
            }
            c if c.is_whitespace() && !in_quotes => {
                if !current.is_empty() {
                    tokens.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        tokens.push(current);
    }
    tokens
}

fn parse_field(arg: &str, usage: &str) -> Result<Field> {
    match arg {
        "title" => Ok(Field::Title),
        "author" => Ok(Field::Author),
        _ => Err(bad_args(2, 2, usage)),
    }
}

fn expect_args<'a, const N: usize>(args: &'a [String], usage: &str) -> Result<[&'a str; N]> {
    if args.len() != N {
        return Err(bad_args(N, args.len(), usage));
    }
    let mut out = [""; N];
    for (slot, arg) in out.iter_mut().zip(args) {
        *slot = arg.as_str();
    }
    Ok(out)
}

fn bad_args(expected: usize, got: usize, usage: &str) -> FolioError {
    FolioError::BadArgCount {
        expected,
        got,
        usage: usage.to_string(),
    }
}

fn print_help() {
    println!("create a database:          create [name]");
    println!("open a database:            open [name]");
    println!("read from the xml corpus:   read [file]");
    println!("list keys of a table:       select [title|author]");
    println!("prefix search in a table:   find [title|author] [prefix]");
    println!("fuzzy search:               search [keyword...]");
    println!("authors with most articles: top [number]");
    println!("name of the open database:  whoami");
    println!("close the database:         close");
    println!("end the program:            exit");
}
