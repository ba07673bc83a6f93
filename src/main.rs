use clap::{Parser, Subcommand};
use telebot_client::{events, requests::MessageOptions, Client, Event};
use telebot_core::{config, types::ChatId};
use tracing::{error, info};

#[derive(Parser)]
#[command(name = "telebot", version, about = "Telegram Bot API client")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Path to config file.
    #[arg(short, long, default_value = "config.toml")]
    config: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll for updates, log messages and answer /echo until Ctrl-C.
    Run,
    /// Print the bot's identity.
    Me,
    /// Send a one-shot text message.
    Send {
        /// Numeric chat id or @channelusername.
        chat_id: String,
        #[arg(trailing_var_arg = true, required = true)]
        text: Vec<String>,
    },
    /// Register or remove the webhook.
    Webhook {
        /// HTTPS URL the API should push updates to.
        #[arg(long, conflicts_with = "delete")]
        url: Option<String>,
        /// Remove the current webhook.
        #[arg(long)]
        delete: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let cfg = config::load(&cli.config)?;

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&cfg.telebot.log_level)),
        )
        .init();

    let client = Client::new(cfg.client)?;

    match cli.command {
        Commands::Run => run(client).await?,
        Commands::Me => {
            let me = client.get_me().await?;
            println!(
                "{} (@{}) id={}",
                me.first_name,
                me.username.as_deref().unwrap_or("-"),
                me.id
            );
        }
        Commands::Send { chat_id, text } => {
            let sent = client
                .send_message(parse_chat_id(chat_id), &text.join(" "), MessageOptions::default())
                .await?;
            println!("sent message {} to chat {}", sent.message_id, sent.chat.id);
        }
        Commands::Webhook { url, delete } => match (url, delete) {
            (Some(url), false) => {
                client.set_webhook(&url).await?;
                println!("webhook set to {url}");
            }
            (None, true) => {
                client.delete_webhook().await?;
                println!("webhook removed");
            }
            _ => anyhow::bail!("pass either --url <url> or --delete"),
        },
    }

    Ok(())
}

async fn run(client: Client) -> anyhow::Result<()> {
    let me = client.get_me().await?;
    info!(
        "running as @{}",
        me.username.as_deref().unwrap_or(&me.first_name)
    );

    client.on(events::MESSAGE, |event| {
        if let Event::Message(msg) = event {
            info!(
                chat_id = msg.chat.id,
                edited = msg.is_edited(),
                "message: {}",
                msg.text.as_deref().unwrap_or("<no text>")
            );
        }
    });

    let echo = client.clone();
    client.on("echo", move |event| {
        let Event::Command { message, args, .. } = event else {
            return;
        };
        let reply = args.as_ref().map(|a| a.join(" ")).unwrap_or_default();
        if reply.is_empty() {
            return;
        }
        let client = echo.clone();
        let chat_id = message.chat.id;
        let message_id = message.message_id;
        tokio::spawn(async move {
            if let Err(e) = client
                .send_message(chat_id, &reply, MessageOptions::reply_to(message_id))
                .await
            {
                error!("echo to chat {chat_id} failed: {e}");
            }
        });
    });

    client.on(events::ERROR, |event| {
        if let Event::Error(e) = event {
            error!("poll error: {e}");
        }
    });

    client.start().await?;
    tokio::signal::ctrl_c().await?;
    info!("shutting down");
    client.stop();
    Ok(())
}

fn parse_chat_id(raw: String) -> ChatId {
    match raw.parse::<i64>() {
        Ok(id) => ChatId::Id(id),
        Err(_) => ChatId::Username(raw),
    }
}
