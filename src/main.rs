//! listkeep CLI

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use listkeep::model::{format_minor, ShoppingItem, UserList};
use listkeep::{App, Captured, Config, Database, ParseContext};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "listkeep")]
#[command(about = "Offline-first lists, shopping and inbox capture", long_about = None)]
struct Cli {
    /// SQLite database file (`:memory:` for a throwaway one)
    #[arg(short, long, env = "LISTKEEP_DB", default_value = listkeep::config::DEFAULT_DATABASE)]
    database: PathBuf,

    /// Currency of the shopping list when it is first created
    #[arg(long, env = "LISTKEEP_CURRENCY", default_value = listkeep::config::DEFAULT_CURRENCY)]
    currency: String,

    /// Hide purchased items from the shopping list
    #[arg(long)]
    hide_purchased: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a line and print the result as JSON
    Parse {
        text: String,
        /// Parse as if typed on the shopping list
        #[arg(long)]
        shopping: bool,
        /// Parse as if typed on this list
        #[arg(long)]
        list: Option<String>,
    },

    /// Capture a line into the shopping list, a list or the inbox
    Add {
        text: String,
        #[arg(long)]
        shopping: bool,
        #[arg(long)]
        list: Option<String>,
    },

    /// Show the shopping list
    Items {
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Mark a shopping item purchased, or pending again
    Toggle { id: i64 },

    /// Show the inbox
    Inbox {
        /// Only inputs with this tag
        #[arg(short, long)]
        tag: Option<String>,
        #[arg(short, long)]
        query: Option<String>,
    },

    /// Show all lists, or the entries of one
    Lists {
        name: Option<String>,
        /// Create a list with this name
        #[arg(long)]
        new: Option<String>,
    },

    /// Apply pending migrations and print the schema version
    Migrate,

    /// Start interactive capture mode
    Repl,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config {
        database: cli.database,
        currency_code: cli.currency,
        hide_purchased: cli.hide_purchased,
    };

    match cli.command {
        Commands::Parse {
            text,
            shopping,
            list,
        } => print_parse(&text, &context_for(shopping, list)),
        Commands::Add {
            text,
            shopping,
            list,
        } => add(config, &text, &context_for(shopping, list)).await,
        Commands::Items { query } => show_items(config, query.as_deref()).await,
        Commands::Toggle { id } => toggle(config, id).await,
        Commands::Inbox { tag, query } => show_inbox(config, tag.as_deref(), query.as_deref()).await,
        Commands::Lists { name, new } => show_lists(config, name.as_deref(), new.as_deref()).await,
        Commands::Migrate => migrate(config),
        Commands::Repl => run_repl(config).await,
    }
}

fn context_for(shopping: bool, list: Option<String>) -> ParseContext {
    if shopping {
        ParseContext::shopping()
    } else {
        ParseContext {
            is_shopping_list: false,
            current_list_name: list,
        }
    }
}

fn print_parse(text: &str, context: &ParseContext) -> anyhow::Result<()> {
    let parsed = listkeep::parse(text, context);
    println!("{}", serde_json::to_string_pretty(&parsed)?);
    Ok(())
}

async fn add(config: Config, text: &str, context: &ParseContext) -> anyhow::Result<()> {
    let app = App::open(config).await?;
    let captured = app.capture(text, context).await?;
    print_captured(&captured);
    Ok(())
}

fn print_captured(captured: &Captured) {
    match captured {
        Captured::ShoppingItem(item) => println!("Added to shopping: {}", describe_item(item)),
        Captured::Entry { list, item } => {
            println!("Added to '{}': [{}] {}", list.name, item.id, item.title)
        }
        Captured::Inbox(input) => {
            println!("Added to inbox: [{}] {}", input.id, input.text);
        }
    }
}

fn describe_item(item: &ShoppingItem) -> String {
    let quantity = match &item.unit {
        Some(unit) => format!("{}{}", item.quantity, unit),
        None => item.quantity.to_string(),
    };
    let mut line = format!("[{}] {} {}", item.id, quantity, item.name);
    if let Some(total) = item.line_total_minor() {
        line.push_str(&format!("  {}", format_minor(total)));
    }
    line
}

async fn show_items(config: Config, query: Option<&str>) -> anyhow::Result<()> {
    let app = App::open(config).await?;
    if let Some(query) = query {
        app.shopping.set_query(query);
    }

    let state = app.shopping.snapshot();
    let currency = app
        .shopping
        .list()
        .map(|l| l.currency_code)
        .unwrap_or_default();

    if state.view.groups.is_empty() {
        println!("No items.");
    }
    for group in &state.view.groups {
        println!("--- {} ---", group.category.name);
        for item in &group.pending {
            println!("  [ ] {}", describe_item(item));
        }
        for item in &group.purchased {
            println!("  [x] {}", describe_item(item));
        }
    }

    let summary = &state.view.summary;
    println!();
    println!(
        "{} item(s), {} purchased. Pending {} {}, purchased {} {}",
        summary.item_count,
        summary.purchased_count,
        currency,
        format_minor(summary.pending_total_minor),
        currency,
        format_minor(summary.purchased_total_minor),
    );
    Ok(())
}

async fn toggle(config: Config, id: i64) -> anyhow::Result<()> {
    let app = App::open(config).await?;
    let item = app.shopping.toggle_item(id.into()).await?;
    let mark = if item.is_purchased() { "x" } else { " " };
    println!("[{}] {}", mark, describe_item(&item));
    Ok(())
}

async fn show_inbox(config: Config, tag: Option<&str>, query: Option<&str>) -> anyhow::Result<()> {
    let app = App::open(config).await?;
    app.inbox.set_tag_filter(tag)?;
    if let Some(query) = query {
        app.inbox.set_query(query);
    }

    let state = app.inbox.snapshot();
    if state.view.visible.is_empty() {
        println!("Inbox is empty.");
    }
    for input in &state.view.visible {
        println!(
            "[{}] {}  ({})",
            input.id,
            input.text,
            input.created_at.format("%Y-%m-%d %H:%M")
        );
    }

    if !state.view.tags.is_empty() {
        println!();
        println!("Tags:");
        for tag in &state.view.tags {
            println!("  #{} ({})", tag.name, tag.usage_count);
        }
    }
    Ok(())
}

async fn show_lists(config: Config, name: Option<&str>, new: Option<&str>) -> anyhow::Result<()> {
    let app = App::open(config).await?;

    if let Some(new) = new {
        let list = app.lists.create(new).await?;
        println!("List '{}' created.", list.name);
        return Ok(());
    }

    match name {
        Some(name) => {
            let list = app
                .lists
                .find_by_name(name)
                .ok_or_else(|| anyhow::anyhow!("no list named '{}'", name))?;
            print_entries(&app, &list).await
        }
        None => {
            let state = app.lists.snapshot();
            if state.view.visible.is_empty() {
                println!("No lists.");
            }
            for list in &state.view.visible {
                println!("  {}", list.name);
            }
            Ok(())
        }
    }
}

async fn print_entries(app: &App, list: &UserList) -> anyhow::Result<()> {
    app.open_list(list).await?;
    let state = app.items.snapshot();

    println!("--- {} ---", list.name);
    for item in &state.view.visible {
        let mark = if item.kind.is_complete() { "x" } else { " " };
        match item.kind.summary() {
            Some(detail) => println!("  [{}] {} ({}): {}", mark, item.title, item.kind.label(), detail),
            None => println!("  [{}] {} ({})", mark, item.title, item.kind.label()),
        }
    }
    println!(
        "({} of {} done)",
        state.view.completed_count, state.view.total
    );
    Ok(())
}

fn migrate(config: Config) -> anyhow::Result<()> {
    let db = if config.is_in_memory() {
        Database::open_in_memory()?
    } else {
        Database::open(&config.database)?
    };
    println!(
        "Schema version {} (latest {})",
        db.schema_version()?,
        listkeep::db::migrations::latest_version()
    );
    Ok(())
}

async fn run_repl(config: Config) -> anyhow::Result<()> {
    use std::io::{self, BufRead, Write};

    println!("listkeep interactive capture");
    println!("Type a line to capture it, 'help' for commands, 'exit' to quit.");
    println!();

    let app = App::open(config).await?;
    let mut context = ParseContext::default();

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    loop {
        let prompt = if context.is_shopping_list {
            "shopping".to_string()
        } else {
            context
                .current_list_name
                .clone()
                .unwrap_or_else(|| "inbox".to_string())
        };
        print!("{}> ", prompt);
        stdout.flush()?;

        let mut line = String::new();
        if stdin.lock().read_line(&mut line)? == 0 {
            break;
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        match line {
            "exit" | "quit" | "\\q" => break,
            "help" | "\\h" => {
                println!("Commands:");
                println!("  shop          - Capture into the shopping list");
                println!("  inbox         - Capture into the inbox");
                println!("  use <list>    - Capture into a named list");
                println!("  show          - Show what is on screen");
                println!("  undo          - Bring back the last deleted entry");
                println!();
                println!("Anything else is captured, e.g.");
                println!("  Leite 2L R$8,50 :Laticínios");
                println!("  ligar pro banco #financas");
                continue;
            }
            "shop" => {
                context = ParseContext::shopping();
                continue;
            }
            "inbox" => {
                context = ParseContext::default();
                continue;
            }
            "show" => {
                if let Err(e) = show_current(&app, &context).await {
                    println!("Error: {}", e);
                }
                continue;
            }
            "undo" => {
                let restored = if context.is_shopping_list {
                    app.shopping.undo_delete().await.map(|item| describe_item(&item))
                } else {
                    app.inbox.undo_delete().await.map(|input| input.text)
                };
                match restored {
                    Ok(text) => println!("Restored: {}", text),
                    Err(e) => println!("Error: {}", e),
                }
                continue;
            }
            _ => {}
        }

        if let Some(name) = line.strip_prefix("use ") {
            match app.lists.find_by_name(name.trim()) {
                Some(list) => context = ParseContext::in_list(list.name),
                None => println!("No list named '{}'", name.trim()),
            }
            continue;
        }

        match app.capture(line, &context).await {
            Ok(captured) => print_captured(&captured),
            Err(e) => {
                println!("Error: {}", e);
                if let Some(hint) = e.suggestion() {
                    println!("Hint: {}", hint);
                }
            }
        }
    }

    println!("Goodbye!");
    Ok(())
}

async fn show_current(app: &App, context: &ParseContext) -> anyhow::Result<()> {
    if context.is_shopping_list {
        for item in app.shopping.snapshot().records() {
            println!("  {}", describe_item(item));
        }
        return Ok(());
    }
    match context.current_list_name.as_deref() {
        Some(name) => {
            let list = app
                .lists
                .find_by_name(name)
                .ok_or_else(|| anyhow::anyhow!("no list named '{}'", name))?;
            print_entries(app, &list).await
        }
        None => {
            for input in &app.inbox.snapshot().view.visible {
                println!("  [{}] {}", input.id, input.text);
            }
            Ok(())
        }
    }
}
