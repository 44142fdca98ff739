use std::process::ExitCode;

use anyhow::{anyhow, Context};
use chrono::DateTime;
use clap::{Args, Parser, Subcommand};
use feedbase_app::utils::CompositeKey;
use feedbase_kernel::settings::Settings;
use feedbase_kernel::BootstrapError;
use mongodb::bson::oid::ObjectId;

#[derive(Parser)]
#[command(name = "feedbase", version, about = "Schema tooling for the feed database")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create the feed collections and indexes that are missing
    Bootstrap(ConnectArgs),
    /// Report feed collections and indexes missing from the database
    Check(ConnectArgs),
    /// Print the feed schema as JSON without touching the database
    Plan,
    /// Encode or decode a post pagination key
    #[command(subcommand)]
    CompositeKey(KeyCommand),
}

#[derive(Args)]
struct ConnectArgs {
    /// Database name, instead of MONGO_INITDB_DATABASE
    #[arg(long)]
    database: Option<String>,
    /// Connection string, instead of MONGO_URL
    #[arg(long)]
    uri: Option<String>,
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Build the key for a post
    Encode {
        #[arg(long)]
        comment_count: i32,
        /// Unix seconds of the latest comment (or post creation)
        #[arg(long)]
        last_comment_at: i64,
        /// Post ObjectId as 24 hex characters
        #[arg(long)]
        post_id: String,
    },
    /// Print the fields packed into a key
    Decode { key: String },
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli) {
        Ok(code) => code,
        Err(err) => {
            if let Some(failure) = err.downcast_ref::<BootstrapError>() {
                tracing::error!(
                    stage = ?failure.reached_stage(),
                    exit_code = failure.exit_code(),
                    error = %failure.diagnostic(),
                    "feedbase bootstrap failed"
                );
            }
            eprintln!("feedbase: {:#}", err);
            ExitCode::from(feedbase_app::exit_code(&err))
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<ExitCode> {
    match cli.command {
        Command::Plan => {
            let plan = feedbase_app::schema_plan();
            println!("{}", serde_json::to_string_pretty(&plan)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::CompositeKey(command) => composite_key(command),
        Command::Bootstrap(args) => {
            let settings = connect_settings(args)?;
            let report = runtime()?.block_on(feedbase_app::run_bootstrap(&settings))?;
            println!("{}", serde_json::to_string_pretty(&report)?);
            Ok(ExitCode::SUCCESS)
        }
        Command::Check(args) => {
            let settings = connect_settings(args)?;
            let result = runtime()?.block_on(feedbase_app::run_check(&settings))?;
            println!("{}", serde_json::to_string_pretty(&result)?);
            if result.is_complete() {
                Ok(ExitCode::SUCCESS)
            } else {
                Ok(ExitCode::FAILURE)
            }
        }
    }
}

fn connect_settings(args: ConnectArgs) -> anyhow::Result<Settings> {
    let mut settings =
        Settings::load().with_context(|| "failed to load feedbase settings")?;

    if let Some(database) = args.database {
        settings.database.name = Some(database);
    }
    if let Some(uri) = args.uri {
        settings.database.uri = uri;
    }

    feedbase_telemetry::init(&settings.telemetry)?;
    tracing::info!(
        env = ?settings.environment,
        db = %feedbase_db::redact_uri(&settings.database.uri),
        "feedbase settings loaded"
    );

    Ok(settings)
}

fn runtime() -> anyhow::Result<tokio::runtime::Runtime> {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .with_context(|| "failed to start async runtime")
}

fn composite_key(command: KeyCommand) -> anyhow::Result<ExitCode> {
    match command {
        KeyCommand::Encode {
            comment_count,
            last_comment_at,
            post_id,
        } => {
            let post_id = ObjectId::parse_str(&post_id)
                .with_context(|| format!("invalid post id '{}'", post_id))?;
            let last_comment_at = DateTime::from_timestamp(last_comment_at, 0)
                .ok_or_else(|| anyhow!("timestamp {} is out of range", last_comment_at))?;

            println!(
                "{}",
                CompositeKey::generate(comment_count, last_comment_at, &post_id)
            );
        }
        KeyCommand::Decode { key } => {
            let parts = CompositeKey::decode(&key)
                .with_context(|| format!("cannot decode '{}'", key))?;
            let decoded = serde_json::json!({
                "commentCount": parts.comment_count,
                "lastCommentAt": parts.last_comment_time().to_rfc3339(),
                "postIdPrefix": parts.post_id_prefix_hex(),
            });
            println!("{}", serde_json::to_string_pretty(&decoded)?);
        }
    }

    Ok(ExitCode::SUCCESS)
}
