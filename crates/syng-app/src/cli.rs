use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use syng_types::{NewEntry, RecordId};

#[derive(Parser, Debug)]
#[command(name = "syng", version, about = "Manage Syng bookmarks and vocabulary lists")]
pub struct Cli {
    /// Override the data directory (also `SYNG_DATA_DIR`)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show registered and loaded user lists
    Lists,
    /// Work with one user list
    #[command(subcommand)]
    List(ListCommand),
    /// Work with bookmarks
    #[command(subcommand)]
    Bookmarks(BookmarkCommand),
    /// Replace the notes of an entry
    Notes {
        /// `bookmarks` or a user list name
        target: String,
        id: RecordId,
        notes: String,
    },
    /// Read or change preferences
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Subcommand, Debug)]
pub enum ListCommand {
    Create { name: String },
    Remove { name: String },
    Show { name: String },
    Add {
        name: String,
        #[command(flatten)]
        word: WordArgs,
    },
    /// Remove one entry by id
    Drop { name: String, id: RecordId },
}

#[derive(Subcommand, Debug)]
pub enum BookmarkCommand {
    Show,
    Add {
        #[command(flatten)]
        word: WordArgs,
    },
    Remove { id: RecordId },
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum PrefsCommand {
    Show,
    Get { property: String },
    /// Value is parsed as JSON, falling back to a plain string
    Set { property: String, value: String },
}

#[derive(Args, Debug)]
pub struct WordArgs {
    pub simplified: String,
    /// Defaults to the simplified form
    #[arg(long)]
    pub traditional: Option<String>,
    #[arg(long, short)]
    pub pronunciation: String,
    #[arg(long = "definition", short)]
    pub definitions: Vec<String>,
    /// Tone numbers, e.g. `--tones 3,3`
    #[arg(long, value_delimiter = ',')]
    pub tones: Vec<u8>,
}

impl From<WordArgs> for NewEntry {
    fn from(word: WordArgs) -> Self {
        let traditional = word
            .traditional
            .unwrap_or_else(|| word.simplified.clone());

        NewEntry::new(
            word.simplified,
            traditional,
            word.pronunciation,
            word.definitions,
            word.tones,
        )
    }
}
