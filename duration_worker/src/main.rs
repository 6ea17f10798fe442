use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use duration_worker::{
    build_handler, init_tracing, load_config, worker, Acknowledgement,
    WorkerError,
};
use md_queue::RedisQueue;
use types::Job;

#[derive(Parser, Debug)]
#[command(
    name = "duration_worker",
    version,
    about = "Resolves the playback duration of media files"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Consume jobs from the queue until interrupted (default)
    Run,
    /// Resolve the duration of a single local file and print the result
    Probe { file: PathBuf },
    /// Queue a job for a file and print its key
    Submit { file: String },
}

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    let cli = Cli::parse();

    let result = match cli.command.unwrap_or(Command::Run) {
        Command::Run => run().await,
        Command::Probe { file } => probe(file).await,
        Command::Submit { file } => submit(file).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run() -> Result<ExitCode, WorkerError> {
    let config = load_config()?;
    let handler = build_handler(&config)?;

    let redis_url =
        config.redis_url.as_deref().ok_or(WorkerError::MissingRedisUrl)?;
    let mut queue = RedisQueue::connect(
        redis_url,
        &config.queue_name,
        config.poll_timeout_secs,
    )
    .await?;

    let shutdown = worker::shutdown_on_ctrl_c();
    worker::run(&mut queue, &handler, &shutdown).await?;

    Ok(ExitCode::SUCCESS)
}

async fn probe(file: PathBuf) -> Result<ExitCode, WorkerError> {
    let config = load_config()?;
    let handler = build_handler(&config)?;

    let body = serde_json::to_vec(&Job {
        filename: file.to_string_lossy().into_owned(),
    })?;

    match handler.handle("cli", &body).await {
        Acknowledgement::Success(payload) => {
            println!("{}", String::from_utf8_lossy(&payload));
            Ok(ExitCode::SUCCESS)
        }
        Acknowledgement::Failure(message) => {
            eprintln!("{message}");
            Ok(ExitCode::FAILURE)
        }
    }
}

async fn submit(file: String) -> Result<ExitCode, WorkerError> {
    let config = load_config()?;

    let redis_url =
        config.redis_url.as_deref().ok_or(WorkerError::MissingRedisUrl)?;
    let mut queue = RedisQueue::connect(
        redis_url,
        &config.queue_name,
        config.poll_timeout_secs,
    )
    .await?;

    let body = serde_json::to_vec(&Job { filename: file })?;
    let key = queue.enqueue(&body).await?;

    println!("{key}");

    Ok(ExitCode::SUCCESS)
}
