use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bulkops")]
#[command(version)]
#[command(about = "Search, bulk-modify and bulk-create documents in a content store", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Dataset directory (defaults to $BULKOPS_HOME, a .bulkops dir, or the user data dir)
    #[arg(long, global = true)]
    pub dataset: Option<PathBuf>,

    /// Simulate mutations without changing any document
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Documents per progress checkpoint (overrides config)
    #[arg(long, global = true, value_parser = clap::value_parser!(u64).range(1..))]
    pub batch_size: Option<u64>,

    /// Print the operation result as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Increase log verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Args, Debug, Clone, Default)]
pub struct SearchArgs {
    /// Restrict to one document type
    #[arg(short = 't', long = "type")]
    pub doc_type: Option<String>,

    /// Match this text in title or name
    #[arg(short, long)]
    pub search: Option<String>,

    /// Raw query, sent as-is (overrides --type and --search)
    #[arg(short, long)]
    pub query: Option<String>,

    /// Maximum number of documents (overrides config)
    #[arg(long, value_parser = clap::value_parser!(u64).range(1..))]
    pub limit: Option<u64>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Find documents
    #[command(alias = "s")]
    Search {
        #[command(flatten)]
        filter: SearchArgs,
    },

    /// Set one field on every matching document
    #[command(alias = "m")]
    Modify {
        #[command(flatten)]
        filter: SearchArgs,

        /// Field to set (dotted paths like seo.title are allowed)
        #[arg(short, long)]
        field: String,

        /// New value
        #[arg(long = "value", allow_hyphen_values = true)]
        value: String,

        /// Parse the value as JSON instead of treating it as a string
        #[arg(long)]
        json_value: bool,
    },

    /// Create documents from a JSON template (object or array)
    #[command(alias = "c")]
    Create {
        /// Type of the new documents
        #[arg(short = 't', long = "type")]
        doc_type: String,

        /// Inline template
        #[arg(long, conflicts_with = "file")]
        template: Option<String>,

        /// Read the template from a file
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Get or set configuration
    Config {
        /// Configuration key (document-types, batch-size, dry-run, max-documents)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },

    /// Create an empty dataset and default config
    Init,
}
