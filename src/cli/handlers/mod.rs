use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::debug;

use crate::api::{BoardApi, CreateSectionRequest, CreateTaskRequest, HttpBoardApi};
use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io::{self, CONFIG_FILE};
use crate::model::{Applied, BoardAction, BoardConfig};
use crate::ops::check::{self, check_board};
use crate::ops::sort_index::allocate_sort_index;
use crate::ops::store::{BoardStore, SharedStore, lock, shared, system_clock};
use crate::sync::{BoardSession, SyncQueue};

type CmdResult = Result<(), Box<dyn std::error::Error>>;

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub async fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let config_path = resolve_config_path(cli.config.as_deref())?;
    debug!(config = ?config_path, "dispatch");

    if let Commands::Config(cmd) = cli.command {
        return cmd_config(cmd, config_path, json);
    }

    let ctx = Context::load(config_path.as_deref())?;
    match cli.command {
        // Read commands
        Commands::Board(args) => cmd_board(&ctx, args, json).await,
        Commands::Check => cmd_check(&ctx, json).await,

        // Write commands
        Commands::Add(args) => cmd_add(&ctx, args, json).await,
        Commands::Mv(args) => cmd_mv(&ctx, args, json).await,
        Commands::Reorder(args) => cmd_reorder(&ctx, args, json).await,
        Commands::Rm(args) => cmd_rm(&ctx, args).await,
        Commands::Status(args) => cmd_status(&ctx, args, json).await,
        Commands::Section(cmd) => cmd_section(&ctx, cmd, json).await,
        Commands::Sync => cmd_sync(&ctx, json).await,

        Commands::Config(_) => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

struct Context {
    config: BoardConfig,
    api: Arc<dyn BoardApi>,
}

impl Context {
    fn load(config_path: Option<&Path>) -> Result<Self, Box<dyn std::error::Error>> {
        let config = config_io::load_config(config_path)?;
        let api = HttpBoardApi::from_config(&config.api)?;
        Ok(Context {
            config,
            api: Arc::new(api),
        })
    }

    /// Fetch the board and seed a fresh store with it
    async fn load_store(&self) -> Result<SharedStore, Box<dyn std::error::Error>> {
        let columns = self.api.fetch_board().await?;
        Ok(shared(BoardStore::from_columns(columns)))
    }

    fn queue(&self, store: &SharedStore) -> SyncQueue {
        SyncQueue::new(store.clone(), self.api.clone(), self.config.sync.clone())
    }
}

/// `--config` if given, otherwise the nearest boardsync.toml above the
/// working directory.
fn resolve_config_path(explicit: Option<&str>) -> Result<Option<PathBuf>, Box<dyn std::error::Error>> {
    if let Some(path) = explicit {
        return Ok(Some(PathBuf::from(path)));
    }
    let cwd = std::env::current_dir()?;
    Ok(config_io::discover_config(&cwd))
}

fn print_json<T: serde::Serialize>(value: &T) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// ---------------------------------------------------------------------------
// Read command handlers
// ---------------------------------------------------------------------------

async fn cmd_board(ctx: &Context, args: BoardArgs, json: bool) -> CmdResult {
    let store = ctx.load_store().await?;
    let store = lock(&store);
    let board = store.board();
    if let Some(id) = &args.section
        && !board.is_container(id)
    {
        return Err(format!("section not found: {}", id).into());
    }

    if json {
        return print_json(&board_to_json(board, args.section.as_deref()));
    }
    for line in format_board(board, args.section.as_deref()) {
        println!("{}", line);
    }
    Ok(())
}

async fn cmd_check(ctx: &Context, json: bool) -> CmdResult {
    let store = ctx.load_store().await?;
    let result = check_board(lock(&store).board());

    if json {
        return print_json(&result);
    }
    if !result.errors.is_empty() {
        println!("Errors:");
        for err in &result.errors {
            match err {
                check::CheckError::DuplicateTask {
                    task_id,
                    container_ids,
                } => {
                    println!("  {} is listed in: {}", task_id, container_ids.join(", "));
                }
                check::CheckError::MissingTask {
                    container_id,
                    task_id,
                } => {
                    println!("  [{}] lists unknown task {}", container_id, task_id);
                }
                check::CheckError::OrphanTask { task_id } => {
                    println!("  {} is not in any section", task_id);
                }
                check::CheckError::ContainerMismatch {
                    task_id,
                    container_id,
                    listed_in,
                } => {
                    println!(
                        "  [{}] {} claims section {}",
                        listed_in, task_id, container_id
                    );
                }
            }
        }
    }
    if !result.warnings.is_empty() {
        if !result.errors.is_empty() {
            println!();
        }
        println!("Warnings:");
        for warn in &result.warnings {
            match warn {
                check::CheckWarning::UnorderedSortIndex { container_id } => {
                    println!("  [{}] sort indices out of order", container_id);
                }
                check::CheckWarning::StatusMismatch {
                    task_id,
                    status,
                    container_title,
                } => {
                    println!(
                        "  {} has status \"{}\" in section \"{}\"",
                        task_id, status, container_title
                    );
                }
            }
        }
    }
    if result.valid {
        println!("✓ board is valid");
    } else {
        println!("✗ board has errors");
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write command handlers
// ---------------------------------------------------------------------------

async fn cmd_add(ctx: &Context, args: AddArgs, json: bool) -> CmdResult {
    let priority = parse_priority(&args.priority)?;
    let store = ctx.load_store().await?;

    let request = {
        let store = lock(&store);
        let board = store.board();
        let container = board
            .container(&args.section)
            .ok_or_else(|| format!("section not found: {}", args.section))?;
        let existing = board.tasks_in(&container.id).into_iter().map(|t| t.sort_index);
        CreateTaskRequest {
            title: args.title.clone(),
            description: args.description.clone(),
            priority,
            status: container.title.clone(),
            container_id: container.id.clone(),
            created_by: ctx.config.user.id.clone(),
            sort_index: allocate_sort_index(existing, system_clock()),
        }
    };

    let mut created = ctx.api.create_task(&request).await?;
    if created.sort_index.is_none() {
        created.sort_index = Some(request.sort_index);
    }
    let task_id = created.id.clone();

    let mut store = lock(&store);
    store.dispatch(BoardAction::AddTask {
        container_id: request.container_id.clone(),
        task: created,
    });
    let task = store
        .board()
        .task(&task_id)
        .ok_or_else(|| format!("server returned a duplicate task id: {}", task_id))?;

    if json {
        return print_json(&task_to_json(task));
    }
    println!("{}", format_task_line(task, task.id.len()));
    Ok(())
}

async fn cmd_mv(ctx: &Context, args: MvArgs, json: bool) -> CmdResult {
    let store = ctx.load_store().await?;
    let mut session = BoardSession::new(store.clone(), ctx.api.clone(), ctx.config.sync.clone());

    if !session.drag_start(&args.id) {
        return Err(format!("task not found: {}", args.id).into());
    }
    let from = lock(&store)
        .board()
        .task(&args.id)
        .map(|t| t.container_id.clone())
        .unwrap_or_default();

    if session.drag_end(Some(args.onto.as_str())) == Applied::Unchanged {
        let store = lock(&store);
        let board = store.board();
        if !board.is_task(&args.onto) && !board.is_container(&args.onto) {
            return Err(format!("drop target not found: {}", args.onto).into());
        }
        println!("{} is already there", args.id);
        return Ok(());
    }

    session.queue().flush().await;
    let outcome = session.queue().last_outcome();

    let (to, index) = {
        let store = lock(&store);
        let board = store.board();
        let to = board
            .task(&args.id)
            .map(|t| t.container_id.clone())
            .unwrap_or_default();
        let index = board
            .container(&to)
            .and_then(|c| c.position(&args.id))
            .unwrap_or_default();
        (to, index)
    };

    if json {
        print_json(&MoveJson {
            task_id: args.id.clone(),
            from,
            to,
            index,
            sync: outcome.clone(),
        })?;
    } else {
        println!("moved {}: {} -> {}[{}]", args.id, from, to, index);
        if let Some(outcome) = &outcome {
            println!("{}", format_sync_outcome(outcome));
        }
    }

    match outcome {
        Some(outcome) if outcome.is_failed() => Err(format_sync_outcome(&outcome).into()),
        _ => Ok(()),
    }
}

async fn cmd_reorder(ctx: &Context, args: ReorderArgs, json: bool) -> CmdResult {
    let store = ctx.load_store().await?;
    let applied = {
        let mut store = lock(&store);
        let len = store
            .board()
            .container(&args.section)
            .ok_or_else(|| format!("section not found: {}", args.section))?
            .len();
        if args.from >= len {
            return Err(format!("position {} out of range (section has {} tasks)", args.from, len).into());
        }
        store.dispatch(BoardAction::MoveWithinContainer {
            container_id: args.section.clone(),
            from_index: args.from,
            to_index: args.to,
        })
    };
    if applied == Applied::Unchanged {
        println!("no change");
        return Ok(());
    }

    let response = ctx.queue(&store).sync_container(&args.section).await?;
    if json {
        return print_json(&response);
    }
    println!(
        "reordered {} ({} modified)",
        args.section, response.modified_count
    );
    Ok(())
}

async fn cmd_rm(ctx: &Context, args: RmArgs) -> CmdResult {
    let store = ctx.load_store().await?;
    let container_id = lock(&store)
        .board()
        .task(&args.id)
        .map(|t| t.container_id.clone())
        .ok_or_else(|| format!("task not found: {}", args.id))?;

    ctx.api.delete_task(&args.id).await?;
    lock(&store).dispatch(BoardAction::DeleteTask {
        container_id: container_id.clone(),
        task_id: args.id.clone(),
    });
    ctx.queue(&store).sync_container(&container_id).await?;
    println!("deleted {}", args.id);
    Ok(())
}

async fn cmd_status(ctx: &Context, args: StatusArgs, json: bool) -> CmdResult {
    let updated = ctx.api.update_task_status(&args.id, &args.status).await?;
    if json {
        return print_json(&updated);
    }
    println!(
        "{} status: {}",
        updated.id,
        updated.status.as_deref().unwrap_or(&args.status)
    );
    Ok(())
}

async fn cmd_section(ctx: &Context, cmd: SectionCmd, json: bool) -> CmdResult {
    match cmd.action {
        SectionAction::Add(args) => {
            let section = ctx
                .api
                .create_section(&CreateSectionRequest {
                    title: args.title,
                    color: args.color,
                })
                .await?;
            if json {
                return print_json(&section);
            }
            println!("created section {} ({})", section.title, section.id);
        }
        SectionAction::Rm(args) => {
            let response = ctx.api.delete_section(&args.id).await?;
            if json {
                return print_json(&response);
            }
            println!("deleted section {}", args.id);
        }
    }
    Ok(())
}

async fn cmd_sync(ctx: &Context, json: bool) -> CmdResult {
    let store = ctx.load_store().await?;
    let tasks = lock(&store).board().task_count();
    let response = ctx.queue(&store).sync_all().await?;
    if json {
        return print_json(&response);
    }
    println!(
        "synced {} tasks ({} modified)",
        tasks, response.modified_count
    );
    Ok(())
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

fn cmd_config(cmd: ConfigCmd, config_path: Option<PathBuf>, json: bool) -> CmdResult {
    match cmd.action {
        ConfigAction::Show => {
            let config = config_io::load_config(config_path.as_deref())?;
            if json {
                return print_json(&config);
            }
            match &config_path {
                Some(path) => println!("# {}", path.display()),
                None => println!("# defaults (no {} found)", CONFIG_FILE),
            }
            print!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set(args) => {
            let path = match config_path {
                Some(path) => path,
                None => std::env::current_dir()?.join(CONFIG_FILE),
            };
            let mut doc = if path.exists() {
                config_io::read_config(&path)?.1
            } else {
                toml_edit::DocumentMut::new()
            };
            config_io::set_value(&mut doc, &args.key, &args.value)?;
            config_io::write_config(&path, &doc)?;
            println!("{} = {}", args.key, args.value);
        }
    }
    Ok(())
}
