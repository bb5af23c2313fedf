//! # Shelf CLI
//!
//! Terminal front end for the marketplace client.
//!
//! ## Run Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. Initialize logging (stderr, RUST_LOG overrides the default filter)  │
//! │  2. Load client.toml, apply SHELF_* overrides, validate                 │
//! │  3. Connect: open the offline store, start the write queue              │
//! │  4. Restore the cart from the offline store                             │
//! │  5. Run the command, print its view                                     │
//! │  6. Shut down: drain queued writes, close the database                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cli;
mod render;

use clap::Parser;
use serde::Serialize;
use std::process::ExitCode;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use cli::{CartCommand, Cli, Command};
use shelf_client::{ClientConfig, ClientResult, ShelfClient};

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

/// Logs go to stderr so command output stays clean on stdout.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,shelf=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> ClientResult<()> {
    let mut config = ClientConfig::load(cli.config.clone())?;
    if let Some(token) = cli.token.clone() {
        config.api.token = Some(token).filter(|t| !t.is_empty());
    }

    let client = ShelfClient::connect(config).await?;
    if let Err(e) = client.cart().hydrate().await {
        warn!(error = %e, "Could not restore offline cart");
    }

    let result = execute(&client, &cli).await;

    // Queued writes are drained even when the command failed.
    client.shutdown().await?;
    result
}

async fn execute(client: &ShelfClient, cli: &Cli) -> ClientResult<()> {
    match &cli.command {
        Command::Books { category } => {
            let catalog = client.catalog();
            let mut view = catalog.load(&[]).await;
            if let Some(id) = category {
                catalog.select_category(id.clone());
                view = catalog.load(&catalog.filtered_books()).await;
            }
            print(cli.json, &view, render::catalog)
        }
        Command::Book { id } => {
            let state = client.detail(id.clone()).load().await;
            print(cli.json, &state, render::detail)
        }
        Command::Add { id } => {
            let change = client.detail(id.clone()).add_to_cart().await?;
            info!(book_id = %id, "Cart updated");
            println!(
                "Added {} (quantity {})",
                change.line().name,
                change.line().purchase_quantity
            );
            show_cart(client, cli.json)
        }
        Command::Comment { id, text } => {
            let detail = client.detail(id.clone());
            detail.set_draft(text.clone()).await;
            let state = detail.submit_comment().await?;
            print(cli.json, &state, render::detail)
        }
        Command::Cart { command } => {
            let cart = client.cart();
            match command.clone().unwrap_or(CartCommand::Show) {
                CartCommand::Show => {}
                CartCommand::Remove { id } => {
                    if !cart.remove(&id) {
                        println!("{} is not in your cart", id);
                    }
                }
                CartCommand::Set { id, quantity } => cart.set_quantity(&id, quantity)?,
                CartCommand::Clear => {
                    let removed = cart.clear();
                    println!("Removed {} line(s)", removed);
                }
                CartCommand::Toggle => {
                    cart.toggle();
                }
            }
            show_cart(client, cli.json)
        }
        Command::Categories => {
            let categories = client.catalog().load_categories().await?;
            print(cli.json, &categories, |c: &Vec<_>| render::categories(c))
        }
    }
}

fn show_cart(client: &ShelfClient, json: bool) -> ClientResult<()> {
    let cart = client.cart();
    let lines = cart.lines();
    if json {
        return print_json(&lines);
    }
    print!("{}", render::cart(&lines, &cart.totals(), cart.is_open()));
    Ok(())
}

fn print<T: Serialize>(json: bool, value: &T, text: impl Fn(&T) -> String) -> ClientResult<()> {
    if json {
        return print_json(value);
    }
    let out = text(value);
    if out.ends_with('\n') {
        print!("{}", out);
    } else {
        println!("{}", out);
    }
    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> ClientResult<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
