// src/cli.rs
use std::path::PathBuf;

use crate::config::consts::DEFAULT_CONFIG;
use crate::config::options::Options;
use crate::core::net::HttpSource;
use crate::error::{Error, Result};
use crate::load::{ensure_areas, load_vacancies, refresh_areas};
use crate::progress::Progress;
use crate::specs::areas::{clean_children, search_by_name};
use crate::store::{SqliteStore, table_columns};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Command {
    Areas,
    Search { names: Vec<String>, use_ids: bool },
    Vacancies,
    Columns,
    Sent(i64),
    Help,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Args {
    pub config: PathBuf,
    pub command: Command,
}

pub fn parse_args<I>(args: I) -> Result<Args>
where
    I: IntoIterator<Item = String>,
{
    let mut args = args.into_iter();
    let mut config = PathBuf::from(DEFAULT_CONFIG);
    let mut command: Option<Command> = None;

    while let Some(a) = args.next() {
        match a.as_str() {
            "-c" | "--config" => {
                config = PathBuf::from(args.next().ok_or_else(|| usage("missing value for --config"))?);
            }
            "-h" | "--help" => return Ok(Args { config, command: Command::Help }),
            "--use" => match &mut command {
                Some(Command::Search { use_ids, .. }) => *use_ids = true,
                _ => return Err(usage("--use only applies to search")),
            },
            word => {
                if command.is_none() {
                    command = Some(parse_command(word, &mut args)?);
                } else if let Some(Command::Search { names, .. }) = &mut command {
                    names.push(word.to_string());
                } else {
                    return Err(usage(&format!("unexpected argument: {word}")));
                }
            }
        }
    }

    let command = command.ok_or_else(|| usage("no command given (try --help)"))?;
    if let Command::Search { names, .. } = &command {
        if names.is_empty() {
            return Err(usage("search needs at least one name"));
        }
    }
    Ok(Args { config, command })
}

fn parse_command(word: &str, rest: &mut impl Iterator<Item = String>) -> Result<Command> {
    Ok(match word {
        "areas" => Command::Areas,
        "search" => Command::Search { names: Vec::new(), use_ids: false },
        "vacancies" => Command::Vacancies,
        "columns" => Command::Columns,
        "sent" => {
            let v = rest.next().ok_or_else(|| usage("missing vacancy id"))?;
            let id = v.parse().map_err(|_| usage(&format!("bad vacancy id: {v}")))?;
            Command::Sent(id)
        }
        other => return Err(usage(&format!("unknown command: {other}"))),
    })
}

fn usage(msg: &str) -> Error {
    Error::Usage(msg.to_string())
}

pub fn run(args: Args) -> Result<()> {
    if args.command == Command::Help {
        eprintln!(include_str!("cli_help.txt"));
        return Ok(());
    }

    let mut opts = Options::load(&args.config)?;
    let mut store = SqliteStore::open(&opts.database)?;

    match args.command {
        Command::Help => {}
        Command::Areas => {
            let source = HttpSource::new(&opts.api_url, &opts.headers)?;
            let stats = refresh_areas(&source, &mut store, &opts)?;
            println!("areas: {} records, {} new columns", stats.records, stats.columns_added);
        }
        Command::Search { names, use_ids } => {
            let source = HttpSource::new(&opts.api_url, &opts.headers)?;
            ensure_areas(&source, &mut store, &opts)?;
            let result = search_by_name(store.connection(), &opts.tables.areas, &names)?;
            for name in &result.not_found {
                println!("not found: {name}");
            }
            let cleaned = clean_children(&result.found);
            for area in &cleaned {
                println!("{}\t{}", area.id, area.name);
            }
            if use_ids {
                opts.url_params.area = cleaned.iter().map(|a| a.id.to_string()).collect();
                opts.save(&args.config)?;
                println!("url_params.area = {:?}", opts.url_params.area);
            }
        }
        Command::Vacancies => {
            let source = HttpSource::new(&opts.api_url, &opts.headers)?;
            let summary = load_vacancies(&source, &mut store, &opts, &mut StderrProgress)?;
            println!(
                "found: {}, got: {} ({:.2}%), records written: {}",
                summary.found,
                summary.got,
                summary.coverage(),
                summary.stats.records
            );
            if summary.found > summary.got {
                println!("narrow url_params or run more often to get the rest");
            }
            opts.url_params.date_from = Some(summary.started);
            export_columns(&mut store, &mut opts)?;
            opts.save(&args.config)?;
        }
        Command::Columns => {
            export_columns(&mut store, &mut opts)?;
            opts.save(&args.config)?;
            for (table, cols) in &opts.filters_columns {
                println!("{table}: {}", cols.join(", "));
            }
        }
        Command::Sent(id) => {
            let n = store.mark_sent(&opts.tables.vacancies, id)?;
            println!("{n} vacancy marked as sent");
        }
    }
    Ok(())
}

fn export_columns(store: &mut SqliteStore, opts: &mut Options) -> Result<()> {
    opts.filters_columns = table_columns(store, &opts.tables.all())?;
    Ok(())
}

struct StderrProgress;

impl Progress for StderrProgress {
    fn begin(&mut self, pages: u32) {
        eprintln!("{pages} pages");
    }

    fn log(&mut self, message: &str) {
        eprintln!("{message}");
    }

    fn page_done(&mut self, page: u32, records: usize) {
        eprintln!("  page {}: {records} vacancies", page + 1);
    }
}
