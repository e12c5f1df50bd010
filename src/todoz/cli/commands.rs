//! # CLI Layer
//!
//! One client of the todoz core. This is the only code that touches the
//! terminal: it parses arguments, reads and writes import/export files, asks for
//! confirmation and prints [`CmdResult`]s.
//!
//! ## Structure
//!
//! - `run()`: parse, set up logging and the runtime, dispatch
//! - `init_context()`: loads config and builds the [`TodoApi`]
//! - `handle_*()`: one per command; call the API, print the result

use super::print::{print_info, print_messages, print_todos};
use super::setup::{parse_cli, Cli, Commands};
use chrono::Utc;
use std::io::{BufRead, IsTerminal, Write};
use std::path::PathBuf;
use todoz::api::{Action, TodoApi};
use todoz::clipboard::ClipboardCommand;
use todoz::commands::export::{export_filename, ExportFormat};
use todoz::commands::import::ImportMode;
use todoz::commands::share::ShareTarget;
use todoz::commands::{CmdMessage, CmdResult};
use todoz::config::TodozConfig;
use todoz::dates::parse_date_local;
use todoz::error::{Result, TodoError};
use todoz::model::{NewTodo, Priority, TodoEdit, TodoId};
use todoz::view::{SortMode, StatusFilter, ViewQuery};
use tracing::debug;
use tracing_subscriber::EnvFilter;

struct AppContext {
    api: TodoApi,
}

pub fn run() -> Result<()> {
    let cli = parse_cli();
    init_logging(cli.verbose);

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()?;
    runtime.block_on(dispatch(cli))
}

fn init_logging(verbose: bool) {
    let default = if verbose { "todoz=debug" } else { "off" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn dispatch(cli: Cli) -> Result<()> {
    let ctx = init_context(&cli).await?;

    match cli.command {
        Some(Commands::List {
            status,
            categories,
            search,
            sort,
        }) => handle_list(&ctx, status, categories, search, sort),
        Some(Commands::Add {
            text,
            category,
            due,
            priority,
            notes,
        }) => handle_add(&ctx, text.join(" "), category, due, priority, notes).await,
        Some(Commands::Categories { query }) => handle_categories(&ctx, query),
        Some(Commands::Toggle { id }) => handle_toggle(&ctx, id).await,
        Some(Commands::Edit {
            id,
            text,
            category,
            due,
            priority,
            notes,
        }) => {
            let edit = TodoEdit {
                text,
                category,
                due,
                priority: priority.map(|p| p.to_string()),
                notes,
            };
            handle_edit(&ctx, id, edit).await
        }
        Some(Commands::Delete { id }) => handle_delete(&ctx, id).await,
        Some(Commands::Clear { completed, yes }) => handle_clear(&ctx, completed, yes).await,
        Some(Commands::ToggleAll) => handle_toggle_all(&ctx).await,
        Some(Commands::Import { file, replace, yes }) => {
            handle_import(&ctx, file, replace, yes).await
        }
        Some(Commands::Export { csv, output }) => handle_export(&ctx, csv, output),
        Some(Commands::Share { print }) => handle_share(&ctx, print),
        Some(Commands::Info) => {
            print_info(&ctx.api.info());
            Ok(())
        }
        None => handle_list(&ctx, StatusFilter::All, Vec::new(), None, SortMode::Default),
    }
}

async fn init_context(cli: &Cli) -> Result<AppContext> {
    let config = TodozConfig::load(cli.config.as_deref())?;
    debug!(?config, "loaded config");
    let api = TodoApi::from_config(&config);
    let backend = api.init().await?;
    debug!(backend = %backend, "storage ready");
    Ok(AppContext { api })
}

/// Print the action's failure notice for storage-side errors. Refusals
/// (locked, busy, unconfirmed, bad input) already say what went wrong.
fn report<T>(action: Action, result: Result<T>) -> Result<T> {
    if let Err(e) = &result {
        let refusal = matches!(
            e,
            TodoError::Locked(_)
                | TodoError::Busy(_)
                | TodoError::ConfirmationRequired(_)
                | TodoError::InvalidInput(_)
                | TodoError::ImportFormat(_)
        );
        if !refusal {
            print_messages(&[CmdMessage::error(action.failure_message())]);
        }
    }
    result
}

fn finish(result: CmdResult) -> Result<()> {
    print_messages(&result.messages);
    Ok(())
}

fn handle_list(
    ctx: &AppContext,
    status: StatusFilter,
    categories: Vec<String>,
    search: Option<String>,
    sort: SortMode,
) -> Result<()> {
    let query = ViewQuery {
        status,
        categories,
        search: search.unwrap_or_default(),
        sort,
    };
    let result = ctx.api.list(&query);
    print_todos(&result.listed, ctx.api.store().pending_count());
    print_messages(&result.messages);
    Ok(())
}

fn check_due(due: Option<&str>) -> Result<()> {
    match due {
        Some(raw) if !raw.trim().is_empty() && parse_date_local(raw).is_none() => Err(
            TodoError::InvalidInput(format!("'{}' is not a date (expected YYYY-MM-DD)", raw)),
        ),
        _ => Ok(()),
    }
}

async fn handle_add(
    ctx: &AppContext,
    text: String,
    category: Option<String>,
    due: Option<String>,
    priority: Option<Priority>,
    notes: Option<String>,
) -> Result<()> {
    check_due(due.as_deref())?;
    let input = NewTodo {
        text,
        category: category.unwrap_or_default(),
        due,
        priority: priority.map(|p| p.to_string()),
        notes: notes.unwrap_or_default(),
    };
    finish(report(Action::Add, ctx.api.add(input).await)?)
}

fn handle_categories(ctx: &AppContext, query: Option<String>) -> Result<()> {
    for name in ctx.api.categories(query.as_deref().unwrap_or("")) {
        println!("{}", name);
    }
    Ok(())
}

async fn handle_toggle(ctx: &AppContext, id: TodoId) -> Result<()> {
    finish(report(Action::Toggle, ctx.api.toggle(id).await)?)
}

async fn handle_edit(ctx: &AppContext, id: TodoId, edit: TodoEdit) -> Result<()> {
    check_due(edit.due.as_deref())?;
    finish(report(Action::Update, ctx.api.edit(id, edit).await)?)
}

async fn handle_delete(ctx: &AppContext, id: TodoId) -> Result<()> {
    finish(report(Action::Delete, ctx.api.delete(id).await)?)
}

async fn handle_clear(ctx: &AppContext, completed: bool, yes: bool) -> Result<()> {
    if completed {
        let confirmed = yes || confirm("Remove all completed todos?")?;
        finish(report(
            Action::ClearCompleted,
            ctx.api.clear_completed(confirmed).await,
        )?)
    } else {
        let confirmed = yes || confirm("Clear all todos? This cannot be undone.")?;
        finish(report(Action::ClearAll, ctx.api.clear_all(confirmed).await)?)
    }
}

async fn handle_toggle_all(ctx: &AppContext) -> Result<()> {
    finish(report(Action::ToggleAll, ctx.api.toggle_all().await)?)
}

async fn handle_import(ctx: &AppContext, file: PathBuf, replace: bool, yes: bool) -> Result<()> {
    let raw = std::fs::read_to_string(&file).map_err(|e| {
        TodoError::ImportFormat(format!("Import failed: cannot read {} ({})", file.display(), e))
    })?;
    let mode = if replace {
        let confirmed = yes || confirm("Replace all todos with the imported list?")?;
        ImportMode::Replace { confirmed }
    } else {
        ImportMode::Append
    };
    finish(report(Action::Import, ctx.api.import(&raw, mode).await)?)
}

fn handle_export(ctx: &AppContext, csv: bool, output: Option<PathBuf>) -> Result<()> {
    let format = if csv {
        ExportFormat::Csv
    } else {
        ExportFormat::Json
    };
    let result = ctx.api.export(format)?;
    let path = output.unwrap_or_else(|| PathBuf::from(export_filename(format, Utc::now())));
    let document = result.output.as_deref().unwrap_or_default();
    if let Err(e) = std::fs::write(&path, document) {
        print_messages(&[CmdMessage::error(format.failure_message())]);
        return Err(e.into());
    }
    println!("{}", path.display());
    finish(result)
}

fn handle_share(ctx: &AppContext, print: bool) -> Result<()> {
    if print {
        let text = todoz::commands::share::share_text(&ctx.api.store().todos());
        println!("{}", text);
        return Ok(());
    }
    let clipboard = ClipboardCommand::detect();
    let clipboard_target = clipboard.as_ref().map(|c| c as &dyn ShareTarget);
    let result = ctx.api.share(None, clipboard_target);
    finish(result)
}

/// Ask on the terminal. Off a terminal the answer is no, and the API reports
/// that confirmation is required.
fn confirm(question: &str) -> Result<bool> {
    let stdin = std::io::stdin();
    if !stdin.is_terminal() {
        print_messages(&[CmdMessage::warning("Re-run with --yes to confirm.")]);
        return Ok(false);
    }
    print!("{} [y/N] ", question);
    std::io::stdout().flush()?;
    let mut answer = String::new();
    stdin.lock().read_line(&mut answer)?;
    Ok(matches!(answer.trim(), "y" | "Y" | "yes"))
}
