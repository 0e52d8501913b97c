//! # CLI Layer
//!
//! One possible client of the bulkops library. This is the only place that
//! reads stdin, prints, or decides exit codes.
//!
//! - `run()`: parse, set up logging and context, dispatch
//! - `handle_*()`: one per subcommand, call the API and print its result
//! - `print_*()` (in print.rs): output formatting

use super::print::{print_messages, print_outcome_json, print_records};
use super::setup::{Cli, Commands, SearchArgs};
use bulkops::api::{parse_value, CmdResult, ConfigAction, SearchRequest};
use bulkops::batch::BatchSize;
use bulkops::config::BulkConfig;
use bulkops::error::{BulkError, Result};
use bulkops::init::{initialize, BulkContext};
use clap::Parser;
use std::io::{IsTerminal, Read};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

struct AppContext {
    ctx: BulkContext,
    json: bool,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut app = init_context(&cli)?;

    match cli.command {
        Commands::Search { filter } => handle_search(&mut app, filter),
        Commands::Modify {
            filter,
            field,
            value,
            json_value,
        } => handle_modify(&mut app, filter, field, value, json_value),
        Commands::Create {
            doc_type,
            template,
            file,
        } => handle_create(&mut app, doc_type, template, file),
        Commands::Config { key, value } => handle_config(&mut app, key, value),
        Commands::Init => handle_init(&app),
    }
}

fn init_logging(verbose: u8) {
    let default_level = match verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("bulkops={}", default_level)));

    // A second init (tests driving `run` twice) is harmless, so the error is dropped.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut ctx = initialize(&cwd, cli.dataset.as_deref())?;

    if cli.dry_run {
        ctx.api = ctx.api.with_dry_run(true);
    }
    if let Some(size) = cli.batch_size {
        ctx.api = ctx.api.with_batch_size(BatchSize::new(size as usize)?);
    }

    Ok(AppContext {
        ctx,
        json: cli.json,
    })
}

fn search_request(filter: SearchArgs) -> SearchRequest {
    SearchRequest {
        doc_type: filter.doc_type,
        text: filter.search,
        custom_query: filter.query,
        max_documents: filter.limit.map(|n| n as usize),
    }
}

fn finish(app: &AppContext, result: &CmdResult) -> Result<()> {
    if app.json {
        if let Some(outcome) = &result.outcome {
            print_outcome_json(outcome)?;
        }
        return Ok(());
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_search(app: &mut AppContext, filter: SearchArgs) -> Result<()> {
    let result = app.ctx.api.search(search_request(filter))?;
    if !app.json {
        print_records(&result.records);
    }
    finish(app, &result)
}

fn handle_modify(
    app: &mut AppContext,
    filter: SearchArgs,
    field: String,
    raw_value: String,
    json_value: bool,
) -> Result<()> {
    let value = parse_value(&raw_value, json_value)?;

    let found = app.ctx.api.search(search_request(filter))?;
    if !app.json {
        print_messages(&found.messages);
    }

    let result = app.ctx.api.modify(&found.records, &field, value)?;
    finish(app, &result)
}

fn handle_create(
    app: &mut AppContext,
    doc_type: String,
    template: Option<String>,
    file: Option<PathBuf>,
) -> Result<()> {
    let template = read_template(template, file.as_deref())?;
    let result = app.ctx.api.create(&doc_type, &template)?;
    finish(app, &result)
}

/// Inline template, then file, then piped stdin.
fn read_template(inline: Option<String>, file: Option<&Path>) -> Result<String> {
    if let Some(template) = inline {
        return Ok(template);
    }
    if let Some(path) = file {
        return std::fs::read_to_string(path).map_err(BulkError::Io);
    }
    if !std::io::stdin().is_terminal() {
        let mut buffer = String::new();
        std::io::stdin()
            .read_to_string(&mut buffer)
            .map_err(BulkError::Io)?;
        if !buffer.trim().is_empty() {
            return Ok(buffer);
        }
    }
    Err(BulkError::InvalidInput(
        "provide a template with --template, --file, or on stdin".to_string(),
    ))
}

fn handle_config(app: &mut AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let action = match (key, value) {
        (None, _) => ConfigAction::ShowAll,
        (Some(k), None) => ConfigAction::ShowKey(k),
        (Some(k), Some(v)) => ConfigAction::Set(k, v),
    };

    let show_all = matches!(action, ConfigAction::ShowAll);
    let result = app.ctx.api.config_action(action)?;
    if let (true, Some(config)) = (show_all, &result.config) {
        for key in BulkConfig::KEYS {
            if let Some(value) = config.get(key) {
                println!("{} = {}", key, value);
            }
        }
    }
    print_messages(&result.messages);
    Ok(())
}

fn handle_init(app: &AppContext) -> Result<()> {
    let result = app.ctx.api.init()?;
    print_messages(&result.messages);
    Ok(())
}
