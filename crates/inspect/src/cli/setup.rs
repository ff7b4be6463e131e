use clap::{Args, Parser, Subcommand};
use inspectapp::commands::list::RecordFilter;
use inspectapp::commands::Fields;
use inspectapp::model::Kind;
use std::path::PathBuf;

/// Returns the version string, including git hash and commit date for non-release builds.
fn get_version() -> &'static str {
    const VERSION: &str = env!("CARGO_PKG_VERSION");
    const GIT_HASH: &str = env!("GIT_HASH");
    const GIT_COMMIT_DATE: &str = env!("GIT_COMMIT_DATE");
    const IS_RELEASE: &str = env!("IS_RELEASE");

    use std::sync::OnceLock;
    static VERSION_STRING: OnceLock<String> = OnceLock::new();

    VERSION_STRING.get_or_init(|| {
        if IS_RELEASE == "true" || GIT_HASH.is_empty() {
            format!("v{}", VERSION)
        } else {
            format!("v{}\ndev: {} {}", VERSION, GIT_HASH, GIT_COMMIT_DATE)
        }
    })
}

#[derive(Parser, Debug)]
#[command(
    name = "inspect",
    bin_name = "inspect",
    version = get_version(),
    disable_help_subcommand = true,
    about = "Construction-site inspection records and NCRs",
    long_about = None
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to $INSPECT_DATA, then the OS data dir)
    #[arg(long, global = true, value_name = "DIR", help_heading = "Options")]
    pub data: Option<PathBuf>,

    /// Act as this inspector (defaults to `inspector_name` from the config)
    #[arg(long = "as", global = true, value_name = "NAME", help_heading = "Options")]
    pub actor: Option<String>,

    /// Verbose output (debug logs on stderr)
    #[arg(short, long, global = true, help_heading = "Options")]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Record counts per collection (default)
    #[command(alias = "d")]
    Dashboard,

    /// List records of one kind, newest first
    #[command(alias = "ls")]
    List {
        /// geodetic, civil, ncr, remark or daily
        kind: Kind,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// Show one record
    #[command(alias = "v")]
    Show { kind: Kind, id: u64 },

    /// Create a record from field values
    #[command(alias = "n")]
    New {
        kind: Kind,

        /// Field value as KEY=VALUE (repeatable)
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,
    },

    /// Change a record. Only the given non-empty fields change, unless --replace
    #[command(alias = "e")]
    Edit {
        kind: Kind,
        id: u64,

        /// Field value as KEY=VALUE (repeatable)
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Replace the whole record: fields not given are cleared
        #[arg(long)]
        replace: bool,
    },

    /// Delete a record permanently
    #[command(alias = "rm")]
    Delete { kind: Kind, id: u64 },

    /// Export records to a .tar.gz (TSV + JSON)
    Export {
        kind: Kind,

        /// Export only this record
        #[arg(long, conflicts_with_all = ["status", "decision", "priority", "author", "from", "to"])]
        id: Option<u64>,

        #[command(flatten)]
        filter: FilterArgs,
    },

    /// NCR lifecycle: numbering, signed scans, photos, closing
    #[command(subcommand)]
    Ncr(NcrCommand),

    /// Show the effective configuration and paths
    Config,
}

#[derive(Subcommand, Debug)]
pub enum NcrCommand {
    /// Print the number the next NCR will get
    NextNumber,

    /// Contractor and supervision company of the last NCR
    Defaults,

    /// Create an NCR
    New {
        /// Field value as KEY=VALUE, e.g. NCR_Description=... (repeatable)
        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Photo file to attach (repeatable)
        #[arg(short, long = "photo", value_name = "FILE")]
        photos: Vec<PathBuf>,
    },

    /// Update the given non-empty fields of an NCR
    Edit {
        id: u64,

        #[arg(short, long = "field", value_name = "KEY=VALUE", value_parser = parse_field)]
        fields: Vec<(String, String)>,

        /// Link to the signed scan
        #[arg(long, value_name = "URL")]
        scan: Option<String>,
    },

    /// Close an NCR (requires a signed scan)
    Close { id: u64 },

    /// Remove the signed scan link
    Unsign { id: u64 },

    /// Attach photo files
    AddPhoto {
        id: u64,
        #[arg(required = true)]
        files: Vec<PathBuf>,
    },

    /// Detach and delete a stored photo
    RemovePhoto { id: u64, name: String },
}

#[derive(Args, Debug, Default)]
pub struct FilterArgs {
    #[arg(long)]
    pub status: Option<String>,

    #[arg(long)]
    pub decision: Option<String>,

    #[arg(long)]
    pub priority: Option<String>,

    /// Daily report author (case-insensitive substring)
    #[arg(long)]
    pub author: Option<String>,

    /// Earliest date, YYYY-MM-DD (inclusive)
    #[arg(long, value_name = "DATE")]
    pub from: Option<String>,

    /// Latest date, YYYY-MM-DD (inclusive)
    #[arg(long, value_name = "DATE")]
    pub to: Option<String>,
}

impl From<FilterArgs> for RecordFilter {
    fn from(args: FilterArgs) -> Self {
        RecordFilter {
            status: args.status,
            decision: args.decision,
            priority: args.priority,
            author: args.author,
            date_from: args.from,
            date_to: args.to,
        }
    }
}

fn parse_field(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{}'", s))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("empty field name in '{}'", s));
    }
    Ok((key.to_string(), value.to_string()))
}

pub fn into_fields(pairs: Vec<(String, String)>) -> Fields {
    pairs.into_iter().collect()
}
