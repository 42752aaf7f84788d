use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use tracing::warn;

use inbox_assist::compose::OutgoingMail;
use inbox_assist::config::AssistConfig;
use inbox_assist::gmail::GmailClient;
use inbox_assist::llm::create_provider;
use inbox_assist::reader::MailReader;
use inbox_assist::reply::ReplySuggester;
use inbox_assist::sender::{MailSender, SendOutcome};
use inbox_assist::triage::Categorizer;

#[derive(Parser)]
#[command(name = "inbox-assist", version, about = "Triage recent Gmail messages")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    #[command(flatten)]
    list: ListArgs,
}

#[derive(Subcommand)]
enum Command {
    /// Send a new message
    Send(SendArgs),
    /// Reply to a message in its thread
    Reply(ReplyArgs),
}

/// Listing options, used when no subcommand is given.
#[derive(Args)]
struct ListArgs {
    /// How many recent messages to read
    #[arg(short = 'n', long, default_value_t = 5)]
    count: usize,

    /// Only messages sent from or to this address
    #[arg(short, long, value_name = "EMAIL")]
    address: Option<String>,

    /// Remove the UNREAD label from listed messages
    #[arg(long)]
    mark_read: bool,

    /// Draft two replies for the listed message at this index
    #[arg(long, value_name = "INDEX")]
    suggest: Option<usize>,
}

#[derive(Args)]
struct SendArgs {
    /// Recipient; repeat or separate with commas
    #[arg(long, required = true, value_name = "EMAIL", value_delimiter = ',')]
    to: Vec<String>,

    #[arg(long, default_value = "")]
    subject: String,

    #[arg(long)]
    body: String,

    /// File to attach; repeatable
    #[arg(long = "attach", value_name = "PATH")]
    attachments: Vec<PathBuf>,
}

#[derive(Args)]
struct ReplyArgs {
    /// Gmail id of the message to answer
    id: String,

    /// Send the reply only to this address instead of the original sender
    #[arg(long, value_name = "EMAIL")]
    to: Option<String>,

    /// Reply text
    #[arg(long, conflicts_with = "suggestion", required_unless_present = "suggestion")]
    text: Option<String>,

    /// Send drafted suggestion 1 (direct) or 2 (warm)
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u8).range(1..=2))]
    suggestion: Option<u8>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let config = AssistConfig::from_env()?;

    let mailbox = Arc::new(
        GmailClient::connect(&config.gmail)
            .await
            .context("Could not connect to Gmail")?,
    );
    let categorizer = Categorizer::from_config(config.llm.as_ref());
    eprintln!(
        "inbox-assist v{} ({} categorizer)",
        env!("CARGO_PKG_VERSION"),
        if categorizer.is_remote() { "model" } else { "keyword" }
    );

    match cli.command {
        None => list(&cli.list, &config, MailReader::new(mailbox, categorizer)).await,
        Some(Command::Send(args)) => {
            let mut mail = OutgoingMail::new(args.to, args.subject, args.body);
            mail.attachments = args.attachments;
            let outcome = MailSender::new(mailbox).send(&mail).await?;
            report_sent("Sent", &outcome);
            Ok(())
        }
        Some(Command::Reply(args)) => {
            let text = match (args.text, args.suggestion) {
                (Some(text), _) => text,
                (None, Some(n)) => {
                    let reader = MailReader::new(mailbox.clone(), categorizer);
                    let original = reader.fetch_one(&args.id).await?;
                    let suggester = suggester(&config)?;
                    let (direct, warm) = suggester
                        .suggest_two(&original.reply_context())
                        .await
                        .context("No suggestions available")?;
                    let chosen = if n == 1 { direct } else { warm };
                    println!("Suggestion {n}:\n{chosen}\n");
                    chosen
                }
                (None, None) => anyhow::bail!("Give --text or --suggestion"),
            };
            if text.trim().is_empty() {
                anyhow::bail!("Empty reply, nothing sent");
            }

            let sender = MailSender::new(mailbox);
            let outcome = match args.to.as_deref() {
                Some(address) => sender.reply_to_address(&args.id, address, &text).await?,
                None => sender.reply(&args.id, &text).await?,
            };
            report_sent("Reply sent", &outcome);
            Ok(())
        }
    }
}

async fn list(args: &ListArgs, config: &AssistConfig, reader: MailReader) -> anyhow::Result<()> {
    let messages = match args.address.as_deref() {
        Some(address) => {
            reader
                .fetch_last_n_by_address(address, args.count, args.mark_read)
                .await?
        }
        None => reader.fetch_last_n(args.count, args.mark_read).await?,
    };

    if messages.is_empty() {
        println!("No messages found.");
        return Ok(());
    }
    for message in &messages {
        println!("\n{message}");
    }

    let Some(index) = args.suggest else {
        return Ok(());
    };
    let Some(target) = messages.iter().find(|m| m.index == index) else {
        anyhow::bail!("No listed message with index {index}");
    };

    match suggester(config)?.suggest_two(&target.reply_context()).await {
        Ok((direct, warm)) => {
            println!("\nSuggestion 1 (direct):\n{direct}");
            println!("\nSuggestion 2 (warm):\n{warm}");
        }
        Err(e) => {
            warn!(error = %e, "Reply drafting failed");
            println!("\nNo suggestions available.");
        }
    }
    Ok(())
}

fn suggester(config: &AssistConfig) -> anyhow::Result<ReplySuggester> {
    let Some(llm_config) = config.llm.as_ref() else {
        anyhow::bail!("Reply drafting needs OPENAI_API_KEY or ANTHROPIC_API_KEY");
    };
    Ok(ReplySuggester::new(create_provider(llm_config)?))
}

fn report_sent(what: &str, outcome: &SendOutcome) {
    println!("{what}. Message ID: {}", outcome.id);
    for skipped in &outcome.skipped {
        println!("Skipped attachment {}: {}", skipped.path.display(), skipped.reason);
    }
}
