mod app;
mod render;

use anyhow::bail;
use app::{App, EditOp};
use clap::{Parser, Subcommand};
use menu_core::config::MenuConfig;
use menu_core::{AdminCredential, Direction, Reconciled, Tag};
use std::path::PathBuf;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::{info, warn};

const RECONNECT_DELAY: Duration = Duration::from_secs(2);

#[derive(Parser)]
#[command(name = "menu-cli")]
#[command(about = "View and edit the shared restaurant menu")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Path to the record service socket (overrides sync.socket_path)
    #[arg(short, long, env = "MENUSYNC_SOCKET")]
    socket: Option<PathBuf>,

    /// Emit logs as JSON
    #[arg(long, env = "MENU_LOG_JSON")]
    json_logs: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the current menu - Default
    Show,
    /// Print the menu again on every remote change
    Watch,
    /// Log in, apply one change and save it
    Edit {
        /// Admin password; read from stdin when omitted
        #[arg(long, env = "MENU_ADMIN_PASSWORD", hide_env_values = true)]
        password: Option<String>,

        #[command(subcommand)]
        op: EditCommand,
    },
    /// Write the default menu to the record service
    Seed {
        /// Overwrite an existing menu
        #[arg(long)]
        force: bool,
    },
    /// Print the business contact card
    Contacts,
    /// Print an Argon2 hash to use as admin.password
    HashPassword { password: String },
    /// Show record service statistics
    Stats,
}

#[derive(Subcommand)]
enum EditCommand {
    /// Replace one price
    Price {
        section: String,
        item: usize,
        price: usize,
        value: String,
    },
    /// Flip the popular or spicy marker
    Tag {
        section: String,
        item: usize,
        /// popular | spicy
        tag: Tag,
    },
    /// Remove an item (cannot be undone)
    Delete {
        section: String,
        item: usize,
        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },
    /// Move an item one place
    Move {
        section: String,
        item: usize,
        /// up | down
        direction: Direction,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    menu_core::telemetry::init_telemetry(cli.json_logs);

    let socket = cli.socket;
    let load_app = || -> anyhow::Result<App> { Ok(App::new(MenuConfig::load()?, socket.clone())) };

    match cli.command.unwrap_or(Commands::Show) {
        Commands::Show => {
            let app = load_app()?;
            print!("{}", render::render_tree(&app.current_tree().await?));
        }
        Commands::Watch => watch(&load_app()?).await?,
        Commands::Edit { password, op } => {
            let op = into_edit_op(op)?;
            let app = load_app()?;
            let password = match password {
                Some(p) => p,
                None => prompt_password().await?,
            };
            let (tree, saved) = app.edit(password, op).await?;
            print!("{}", render::render_tree(&tree));
            println!("{}", if saved { "Saved." } else { "No change." });
        }
        Commands::Seed { force } => {
            if load_app()?.seed(force).await? {
                println!("Default menu written.");
            } else {
                println!("A menu already exists; use --force to overwrite it.");
            }
        }
        Commands::Contacts => print!("{}", render::render_contacts(&load_app()?.config.brand)),
        Commands::HashPassword { password } => println!("{}", AdminCredential::hash(&password)?),
        Commands::Stats => {
            let app = load_app()?;
            let mut client = menu_sync_client::Client::connect(&app.socket_path).await?;
            let s = client.stats().await?;
            println!("uptime_ms:        {}", s.uptime_ms);
            println!("records:          {}", s.records_count);
            println!("topics:           {}", s.pubsub_topics);
            println!("writes:           {}", s.writes_total);
            println!("events published: {}", s.events_published_total);
            println!("events lagged:    {}", s.events_lagged_total);
            println!("invalid keys:     {}", s.invalid_key_total);
        }
    }

    Ok(())
}

fn into_edit_op(cmd: EditCommand) -> anyhow::Result<EditOp> {
    Ok(match cmd {
        EditCommand::Price {
            section,
            item,
            price,
            value,
        } => EditOp::Price {
            section,
            item,
            price,
            value,
        },
        EditCommand::Tag { section, item, tag } => EditOp::Tag { section, item, tag },
        EditCommand::Delete { section, item, yes } => {
            if !yes {
                bail!("refusing to delete item {item} of {section} without --yes");
            }
            EditOp::Delete { section, item }
        }
        EditCommand::Move {
            section,
            item,
            direction,
        } => EditOp::Move {
            section,
            item,
            direction,
        },
    })
}

async fn prompt_password() -> anyhow::Result<String> {
    eprint!("Admin password: ");
    let mut line = String::new();
    BufReader::new(tokio::io::stdin())
        .read_line(&mut line)
        .await?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn watch(app: &App) -> anyhow::Result<()> {
    loop {
        let mut session = app.session()?;
        match app.open_settled(&mut session).await {
            Ok(()) => print!("{}", render::render_tree(session.tree())),
            Err(e) => warn!("{:#}", e),
        }

        while session.is_open() {
            tokio::select! {
                update = session.next_update() => match update {
                    Some(Reconciled::Replaced { .. }) => {
                        println!("---");
                        print!("{}", render::render_tree(session.tree()));
                    }
                    Some(other) => info!("Remote update: {:?}", other),
                    None => break,
                },
                _ = tokio::signal::ctrl_c() => return Ok(()),
            }
        }

        warn!("Lost record service, retrying in {:?}", RECONNECT_DELAY);
        tokio::select! {
            _ = tokio::time::sleep(RECONNECT_DELAY) => {}
            _ = tokio::signal::ctrl_c() => return Ok(()),
        }
    }
}
