//! Command-line definitions. Dispatch lives in `main.rs`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[clap(
    name = "shelf",
    version = env!("CARGO_PKG_VERSION"),
    about = "Shelf used-book marketplace from the terminal."
)]
pub(crate) struct Cli {
    /// Path to client.toml (defaults to the platform config directory).
    #[clap(long, global = true)]
    pub config: Option<PathBuf>,

    /// Session token; overrides the configured one.
    #[clap(long, global = true)]
    pub token: Option<String>,

    /// Print view models as JSON instead of text.
    #[clap(long, global = true)]
    pub json: bool,

    #[clap(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// List the catalog
    Books {
        /// Only books of this category id
        #[clap(long)]
        category: Option<String>,
    },
    /// Show one book with its comments
    Book { id: String },
    /// Add one copy of a book to the cart
    Add { id: String },
    /// Comment on a book
    Comment { id: String, text: String },
    /// Show or edit the cart
    Cart {
        #[clap(subcommand)]
        command: Option<CartCommand>,
    },
    /// List categories
    Categories,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum CartCommand {
    /// Print the cart (default)
    Show,
    /// Remove a line
    Remove { id: String },
    /// Set a line's quantity; 0 removes it
    Set { id: String, quantity: i64 },
    /// Empty the cart
    Clear,
    /// Open or close the cart drawer
    Toggle,
}
