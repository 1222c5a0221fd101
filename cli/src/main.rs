//! Terminal front end for the to-do list.
//!
//! Every command selects a category filter (which fetches the list), runs
//! one `ListState` operation and prints the resulting view.

use std::io::{self, BufRead, Write};

use clap::{Parser, Subcommand};
use todo_core::{
    Category, CategoryFilter, ItemId, ListState, Outcome, TodoClient, UreqTransport,
};

#[derive(Debug, Parser)]
#[command(name = "todo", version, about = "Manage the to-do list from a terminal")]
struct Cli {
    /// Base URL of the to-do service.
    #[arg(long, env = "TODO_API_URL", default_value = "http://localhost:5000")]
    url: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show the items in a category.
    List {
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
    },
    /// Add an item.
    Add {
        text: String,
        #[arg(long)]
        category: Category,
    },
    /// Flip an item's completed flag.
    Toggle {
        id: ItemId,
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
    },
    /// Delete every item in a category.
    Clear {
        #[arg(long, default_value = "All")]
        category: CategoryFilter,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
}

impl Command {
    fn filter(&self) -> CategoryFilter {
        match self {
            Command::List { category }
            | Command::Toggle { category, .. }
            | Command::Clear { category, .. } => *category,
            Command::Add { category, .. } => CategoryFilter::Only(*category),
        }
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "todo_core=warn,todo=warn".into()),
        )
        .init();

    let cli = Cli::parse();
    let mut state = ListState::new(TodoClient::new(&cli.url), UreqTransport::new());

    check(state.set_category_filter(cli.command.filter()))?;
    let outcome = match cli.command {
        Command::List { .. } => Outcome::Applied,
        Command::Add { text, .. } => {
            state.set_draft_text(text);
            state.create()
        }
        Command::Toggle { id, .. } => state.toggle(id),
        Command::Clear { yes, .. } => state.delete_all_in_view(|count| yes || confirm(count)),
    };
    check(outcome)?;

    render(&state);
    Ok(())
}

/// Print notices and turn failed requests into an error exit.
fn check(outcome: Outcome) -> Result<(), Box<dyn std::error::Error>> {
    match outcome {
        Outcome::Applied => Ok(()),
        Outcome::Notice(notice) => {
            tracing::debug!(?notice, "action blocked before any request");
            eprintln!("{notice}");
            Ok(())
        }
        Outcome::Cancelled => {
            eprintln!("Nothing deleted.");
            Ok(())
        }
        Outcome::Failed(e) => {
            tracing::error!("request failed: {e}");
            Err(e.into())
        }
    }
}

fn confirm(count: usize) -> bool {
    print!("Delete ALL {count} tasks? This cannot be undone. [y/N] ");
    if io::stdout().flush().is_err() {
        return false;
    }
    let mut answer = String::new();
    if io::stdin().lock().read_line(&mut answer).is_err() {
        return false;
    }
    matches!(answer.trim(), "y" | "Y" | "yes")
}

fn render(state: &ListState<UreqTransport>) {
    println!("To-Do List ({})", state.filter());
    for item in state.visible_items() {
        let mark = if item.completed { "x" } else { " " };
        println!("[{mark}] {:<40} {:<10} {}", item.text, item.category, item.id);
    }
    println!("{} Items Total", state.active_count());
}
