use clap::{CommandFactory, FromArgMatches, Parser, Subcommand};
use std::path::PathBuf;
use todoz::model::Priority;
use todoz::view::{SortMode, StatusFilter};

#[derive(Parser, Debug)]
#[command(name = "todoz", bin_name = "todoz", version)]
#[command(about = "A todo list that keeps working wherever it lands", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Debug logging to stderr
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,

    /// Config file to use instead of the default location
    #[arg(long, global = true, value_name = "PATH", help_heading = "Options")]
    pub config: Option<PathBuf>,
}

/// Command group definitions for help output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandGroup {
    Core,
    Item,
    Data,
    Misc,
}

impl CommandGroup {
    pub fn heading(&self) -> &'static str {
        match self {
            CommandGroup::Core => "Core Commands:",
            CommandGroup::Item => "Per-Todo Commands:",
            CommandGroup::Data => "Data Commands:",
            CommandGroup::Misc => "Miscellaneous:",
        }
    }

    pub fn for_command(name: &str) -> Option<Self> {
        match name {
            "list" | "add" | "categories" => Some(CommandGroup::Core),
            "toggle" | "edit" | "delete" => Some(CommandGroup::Item),
            "clear" | "toggle-all" | "import" | "export" | "share" => Some(CommandGroup::Data),
            "info" => Some(CommandGroup::Misc),
            _ => None,
        }
    }

    pub fn all() -> &'static [CommandGroup] {
        &[
            CommandGroup::Core,
            CommandGroup::Item,
            CommandGroup::Data,
            CommandGroup::Misc,
        ]
    }
}

/// Top-level help with commands listed by group.
pub fn get_grouped_help() -> String {
    let cmd = Cli::command();
    let version = cmd.get_version().unwrap_or("unknown");

    let mut output = String::new();
    output.push_str(&format!("todoz {version}\n"));
    output.push_str("A todo list that keeps working wherever it lands\n");
    output.push('\n');
    output.push_str("Usage: todoz [OPTIONS] [COMMAND]\n");

    let subcommands: Vec<_> = cmd.get_subcommands().collect();
    for group in CommandGroup::all() {
        let group_cmds: Vec<_> = subcommands
            .iter()
            .filter(|sc| CommandGroup::for_command(sc.get_name()) == Some(*group))
            .collect();
        if group_cmds.is_empty() {
            continue;
        }
        output.push('\n');
        output.push_str(&format!("{}\n", group.heading()));
        for sc in group_cmds {
            let about = sc.get_about().map(|s| s.to_string()).unwrap_or_default();
            output.push_str(&format!("  {:<12} {}\n", sc.get_name(), about));
        }
    }

    output.push('\n');
    output.push_str("Options:\n");
    output.push_str("  -v, --verbose        Debug logging to stderr\n");
    output.push_str("      --config <PATH>  Config file to use instead of the default location\n");
    output.push_str("  -h, --help           Print help\n");
    output.push_str("  -V, --version        Print version\n");
    output
}

/// Parse the process arguments, with the grouped layout for top-level help.
pub fn parse_cli() -> Cli {
    let matches = Cli::command()
        .override_help(get_grouped_help())
        .get_matches();
    Cli::from_arg_matches(&matches).unwrap_or_else(|e| e.exit())
}

#[derive(Subcommand, Debug, PartialEq)]
pub enum Commands {
    /// List todos (the default)
    #[command(alias = "ls", display_order = 1)]
    List {
        /// all, active or completed
        #[arg(long, default_value = "all")]
        status: StatusFilter,

        /// Only these categories (repeatable)
        #[arg(short, long = "category")]
        categories: Vec<String>,

        /// Case-insensitive text/category search
        #[arg(short, long)]
        search: Option<String>,

        /// default, due, created or priority
        #[arg(long, default_value = "default")]
        sort: SortMode,
    },

    /// Add a todo
    #[command(alias = "a", display_order = 2)]
    Add {
        /// Todo text (words are joined with spaces)
        #[arg(required = true, num_args = 1..)]
        text: Vec<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Due date, YYYY-MM-DD
        #[arg(short, long)]
        due: Option<String>,

        /// veryLow, low, medium, high or urgent
        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Show category options, optionally fuzzy-matched
    #[command(display_order = 3)]
    Categories { query: Option<String> },

    /// Mark a todo done, or open again
    #[command(alias = "done", display_order = 10)]
    Toggle { id: i64 },

    /// Change an open todo (blank text deletes it)
    #[command(alias = "e", display_order = 11)]
    Edit {
        id: i64,

        #[arg(short, long)]
        text: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Due date, YYYY-MM-DD; empty string clears it
        #[arg(short, long)]
        due: Option<String>,

        #[arg(short, long)]
        priority: Option<Priority>,

        #[arg(short, long)]
        notes: Option<String>,
    },

    /// Delete an open todo
    #[command(alias = "rm", display_order = 12)]
    Delete { id: i64 },

    /// Remove every todo, or only completed ones
    #[command(display_order = 20)]
    Clear {
        /// Only remove completed todos
        #[arg(long)]
        completed: bool,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Complete every todo, or reopen all if all are done
    #[command(display_order = 21)]
    ToggleAll,

    /// Import todos from a JSON file
    #[command(display_order = 22)]
    Import {
        file: PathBuf,

        /// Replace the whole list instead of appending
        #[arg(long)]
        replace: bool,

        /// Skip confirmation
        #[arg(long, short = 'y')]
        yes: bool,
    },

    /// Export the list as JSON, or CSV
    #[command(display_order = 23)]
    Export {
        #[arg(long)]
        csv: bool,

        /// Output file (defaults to a timestamped name in the current directory)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Share a text summary (copies to the clipboard)
    #[command(display_order = 24)]
    Share {
        /// Print the summary instead
        #[arg(long)]
        print: bool,
    },

    /// Storage tier and counts
    #[command(display_order = 30)]
    Info,
}
