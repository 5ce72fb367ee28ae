//! CV_UP daemon: entry point for running the issuance service.

mod app;
mod config;
mod console;
mod error;

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tokio::io::BufReader;

use cvup_store::{QuestionStore, RequestStore};
use cvup_types::{EmailAddress, OwnerId, QuestionId, Timestamp};
use cvup_utils::LogFormat;

use crate::app::App;
use crate::config::DaemonConfig;

#[derive(Parser)]
#[command(name = "cvup-daemon", about = "CV_UP CV-request issuance service")]
struct Cli {
    /// Path to a TOML configuration file. If provided, file settings
    /// are used as the base; CLI flags and env vars override them.
    #[arg(long, env = "CVUP_CONFIG")]
    config: Option<PathBuf>,

    /// Directory holding the LMDB environment.
    #[arg(long, env = "CVUP_DATA_DIR")]
    data_dir: Option<PathBuf>,

    /// Log level: "trace", "debug", "info", "warn", "error".
    #[arg(long, env = "CVUP_LOG_LEVEL")]
    log_level: Option<String>,

    /// Log format: "human" or "json".
    #[arg(long, env = "CVUP_LOG_FORMAT")]
    log_format: Option<String>,

    /// Base URL of the verification service.
    #[arg(long, env = "CVUP_GATE_ENDPOINT")]
    gate_endpoint: Option<String>,

    /// Directory with the CV template files.
    #[arg(long, env = "CVUP_TEMPLATES_DIR")]
    templates_dir: Option<PathBuf>,

    /// Subcommand.
    #[command(subcommand)]
    command: Command,
}

#[derive(clap::Subcommand)]
enum Command {
    /// Open a CV request and print its verification code.
    Request {
        #[arg(long)]
        owner: u64,
        #[arg(long)]
        email: String,
        /// "junior" or "senior".
        #[arg(long = "type")]
        document_type: String,
    },
    /// Verify and deliver the request behind a code.
    Claim { code: String },
    /// List an owner's CV requests.
    History {
        #[arg(long)]
        owner: u64,
    },
    /// Chat with the assistant over stdin/stdout as one user.
    Console {
        #[arg(long, default_value_t = 1)]
        owner: u64,
        #[arg(long)]
        username: Option<String>,
    },
    /// Answer a pending user question.
    Answer { question: u64, text: String },
    /// Close a question.
    CloseQuestion { question: u64 },
    /// Run the storage integrity check.
    Check,
}

fn load_config(cli: &Cli) -> anyhow::Result<DaemonConfig> {
    let mut config = match &cli.config {
        Some(path) => DaemonConfig::from_toml_file(path)?,
        None => DaemonConfig::default(),
    };
    if let Some(data_dir) = &cli.data_dir {
        config.data_dir = data_dir.clone();
    }
    if let Some(level) = &cli.log_level {
        config.log_level = level.clone();
    }
    if let Some(format) = &cli.log_format {
        config.log_format = format.clone();
    }
    if let Some(endpoint) = &cli.gate_endpoint {
        config.gate.endpoint = endpoint.clone();
    }
    if let Some(dir) = &cli.templates_dir {
        config.templates_dir = dir.clone();
    }
    if let Ok(password) = std::env::var("CVUP_SMTP_PASSWORD") {
        config.smtp.password = password;
    }
    Ok(config)
}

async fn execute(app: &App, command: Command) -> anyhow::Result<()> {
    match command {
        Command::Request {
            owner,
            email,
            document_type,
        } => {
            let email = EmailAddress::parse(&email)?;
            let code = app
                .workflow()
                .request(OwnerId::new(owner), &email, &document_type)?;
            println!("{code}");
        }
        Command::Claim { code } => {
            let receipt = app.workflow().claim(&code).await?;
            println!(
                "delivered {} CV to {} ({})",
                receipt.document_type.title(),
                receipt.email,
                receipt.code
            );
        }
        Command::History { owner } => {
            for r in app.store().requests_for_owner(OwnerId::new(owner))? {
                println!(
                    "{}\t{}\t{}\t{}\t{}",
                    r.id, r.verification_code, r.document_type, r.status, r.email
                );
            }
        }
        Command::Console { owner, username } => {
            let bot = app.bot();
            let stdin = BufReader::new(tokio::io::stdin());
            let stdout = tokio::io::stdout();
            tokio::select! {
                res = console::run_console(&bot, OwnerId::new(owner), username, stdin, stdout) => {
                    let handled = res?;
                    tracing::info!(handled, "console session ended");
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("received SIGINT, ending console session");
                }
            }
        }
        Command::Answer { question, text } => {
            app.store()
                .answer_question(QuestionId::new(question), &text, Timestamp::now())?;
            println!("answered Q{question}");
        }
        Command::CloseQuestion { question } => {
            app.store().close_question(QuestionId::new(question))?;
            println!("closed Q{question}");
        }
        Command::Check => {
            let report = app.check_integrity()?;
            for (name, count) in &report.databases {
                println!("{name:<20} {count}");
            }
            println!("{:<20} {}", "total", report.total_entries);
            if !report.is_healthy() {
                for e in &report.errors {
                    eprintln!("error: {e}");
                }
                bail!("integrity check found {} problem(s)", report.errors.len());
            }
            println!("ok");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let format: LogFormat = config.log_format.parse()?;
    cvup_utils::init_tracing(format, &config.log_level)?;

    let app = App::open(config).context("failed to start the service")?;
    let outcome = execute(&app, cli.command).await;
    app.close()?;

    tracing::info!("CV_UP daemon exited cleanly");
    outcome
}
