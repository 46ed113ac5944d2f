use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser)]
#[command(name = "mdbx")]
#[command(about = "Read-only Jet/ACE (.mdb/.accdb) database reader")]
#[command(version)]
pub struct Cli {
    /// Control colored output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Write output to a file instead of stdout
    #[arg(short, long, global = true)]
    pub output: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

#[derive(Subcommand)]
pub enum Commands {
    /// List the objects in the database catalog
    Tables {
        /// Path to the database file (.mdb/.accdb)
        #[arg(short, long)]
        file: String,

        /// Only list user tables
        #[arg(short, long)]
        user_only: bool,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Export a table as delimited text
    Export {
        /// Path to the database file (.mdb/.accdb)
        #[arg(short, long)]
        file: String,

        /// Name of the table to export
        #[arg(short, long)]
        table: String,

        /// Field delimiter
        #[arg(short, long, default_value = ";")]
        delimiter: String,

        /// Row delimiter
        #[arg(long, default_value = "\n")]
        row_delimiter: String,

        /// Suppress the header row
        #[arg(long)]
        no_header: bool,

        /// Text emitted for null values
        #[arg(long, default_value = "")]
        null_text: String,

        /// Text wrapped around every value
        #[arg(short, long)]
        quote: Option<String>,

        /// Also export rows flagged as deleted
        #[arg(long)]
        include_deleted: bool,

        /// Render booleans as TRUE/FALSE instead of 1/0
        #[arg(long)]
        boolean_words: bool,
    },

    /// Show database header information
    Info {
        /// Path to the database file (.mdb/.accdb)
        #[arg(short, long)]
        file: String,

        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Hex dump of a deobfuscated page
    Dump {
        /// Path to the database file (.mdb/.accdb)
        #[arg(short, long)]
        file: String,

        /// Page number to dump
        #[arg(short, long, default_value_t = 0)]
        page: u32,

        /// Number of bytes to dump (default: whole page)
        #[arg(short, long)]
        length: Option<usize>,

        /// Output raw binary bytes (no formatting)
        #[arg(long)]
        raw: bool,
    },
}
