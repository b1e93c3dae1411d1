use clap::{Parser, Subcommand};
use lib::api::ChatClient;
use lib::{ChatView, Message};
use std::sync::Arc;
use tokio::runtime::Handle;

#[derive(Parser)]
#[command(name = "seeker")]
#[command(about = "Seeker CLI", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Create the configuration directory and a default config.json.
    Init {
        /// Config file path (default: SEEKER_CONFIG_PATH or ~/.seeker/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },

    /// Chat with the backend (interactive). Type /exit or /quit to leave.
    Chat {
        /// Config file path (default: SEEKER_CONFIG_PATH or ~/.seeker/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Backend base URL (overrides config and SEEKER_BASE_URL)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },

    /// Send one message and print the reply. Exits with status 1 if the request failed.
    Send {
        /// Message text
        message: String,

        /// Config file path (default: SEEKER_CONFIG_PATH or ~/.seeker/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// Backend base URL (overrides config and SEEKER_BASE_URL)
        #[arg(long, value_name = "URL")]
        base_url: Option<String>,
    },
}

#[tokio::main]
async fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("seeker {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Init { config }) => {
            if let Err(e) = run_init(config) {
                log::error!("init failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Chat { config, base_url }) => {
            if let Err(e) = run_chat(config, base_url).await {
                log::error!("chat failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::Send {
            message,
            config,
            base_url,
        }) => match run_send(config, base_url, message).await {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                log::error!("send failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

fn run_init(config_path: Option<std::path::PathBuf>) -> anyhow::Result<()> {
    let path = config_path.unwrap_or_else(lib::config::default_config_path);
    let dir = lib::init::init_config_dir(&path)?;
    println!("initialized configuration at {}", dir.display());
    Ok(())
}

/// Build a ChatView bound to the configured endpoint on the current runtime.
fn open_chat_view(
    config_path: Option<std::path::PathBuf>,
    base_url: Option<String>,
) -> anyhow::Result<ChatView> {
    let (config, _) = lib::config::load_config(config_path)?;
    let endpoint = lib::config::resolve_endpoint(&config, base_url.as_deref());
    let client = ChatClient::from_config(&endpoint)?;
    log::info!("posting chat messages to {}", client.url());
    Ok(ChatView::new(Arc::new(client), Handle::current()))
}

async fn run_chat(
    config_path: Option<std::path::PathBuf>,
    base_url: Option<String>,
) -> anyhow::Result<()> {
    use std::io::{self, Write};

    let mut view = open_chat_view(config_path, base_url)?;
    let stdin = io::stdin();
    let mut stdout = io::stdout();
    let mut printed = 0;

    loop {
        write!(stdout, "> ")?;
        stdout.flush()?;
        let mut line = String::new();
        if stdin.read_line(&mut line)? == 0 {
            break;
        }
        let input = line.trim_end_matches(['\r', '\n']);
        let command = input.trim();
        if command.eq_ignore_ascii_case("/exit") || command.eq_ignore_ascii_case("/quit") {
            break;
        }

        view.set_draft_input(input);
        if view.submit().is_none() {
            continue;
        }
        view.wait_for_responses().await;

        for line in reply_lines(&view.messages()[printed..]) {
            println!("{}", line);
        }
        printed = view.messages().len();
    }

    Ok(())
}

/// Remote entries rendered for the terminal, text exactly as received.
fn reply_lines(messages: &[Message]) -> Vec<String> {
    messages
        .iter()
        .filter(|m| !m.is_user)
        .map(|m| format!("< {}", m.text))
        .collect()
}

/// Returns Ok(false) when the request failed.
async fn run_send(
    config_path: Option<std::path::PathBuf>,
    base_url: Option<String>,
    message: String,
) -> anyhow::Result<bool> {
    let mut view = open_chat_view(config_path, base_url)?;
    view.set_draft_input(message);
    if view.submit().is_none() {
        anyhow::bail!("message is empty");
    }
    view.wait_for_responses().await;

    match view.messages().last() {
        Some(m) if !m.is_user => {
            println!("{}", m.text);
            Ok(view.failed_requests() == 0)
        }
        _ => anyhow::bail!("no reply received"),
    }
}
