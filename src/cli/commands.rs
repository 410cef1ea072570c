use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "bsync", about = concat!("bsync v", env!("CARGO_PKG_VERSION"), " - kanban board ordering and sync"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use this config file instead of discovering boardsync.toml
    #[arg(long, global = true)]
    pub config: Option<String>,

    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show the board: sections, tasks and sort indices
    Board(BoardArgs),
    /// Validate the board's ordering invariants
    Check,
    /// Create a task at the end of a section
    Add(AddArgs),
    /// Move a task as if dropped onto a task or a section
    Mv(MvArgs),
    /// Reorder a task within its section
    Reorder(ReorderArgs),
    /// Delete a task
    Rm(RmArgs),
    /// Set a task's status
    Status(StatusArgs),
    /// Section management
    Section(SectionCmd),
    /// Push the whole board's ordering to the server
    Sync,
    /// Show or edit boardsync.toml
    Config(ConfigCmd),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct BoardArgs {
    /// Only show this section
    pub section: Option<String>,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct AddArgs {
    /// Section to add the task to
    pub section: String,
    /// Task title
    pub title: String,
    /// Priority (high, normal, low)
    #[arg(long, default_value = "normal")]
    pub priority: String,
    /// Task description
    #[arg(long)]
    pub description: Option<String>,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID
    pub id: String,
    /// Task or section ID to drop onto
    pub onto: String,
}

#[derive(Args)]
pub struct ReorderArgs {
    /// Section ID
    pub section: String,
    /// Current position (0-indexed)
    pub from: usize,
    /// New position (0-indexed)
    pub to: usize,
}

#[derive(Args)]
pub struct RmArgs {
    /// Task ID
    pub id: String,
}

#[derive(Args)]
pub struct StatusArgs {
    /// Task ID
    pub id: String,
    /// New status
    pub status: String,
}

// ---------------------------------------------------------------------------
// Section management
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct SectionCmd {
    #[command(subcommand)]
    pub action: SectionAction,
}

#[derive(Subcommand)]
pub enum SectionAction {
    /// Create a section
    Add(SectionAddArgs),
    /// Delete a section and its tasks
    Rm(SectionIdArg),
}

#[derive(Args)]
pub struct SectionAddArgs {
    /// Section title
    pub title: String,
    /// Accent color
    #[arg(long, default_value = "#8b8b8b")]
    pub color: String,
}

#[derive(Args)]
pub struct SectionIdArg {
    /// Section ID
    pub id: String,
}

// ---------------------------------------------------------------------------
// Config
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ConfigCmd {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,
    /// Set a value, e.g. `sync.debounce_ms 500`
    Set(ConfigSetArgs),
}

#[derive(Args)]
pub struct ConfigSetArgs {
    /// Dotted key (section.field)
    pub key: String,
    /// New value
    pub value: String,
}
