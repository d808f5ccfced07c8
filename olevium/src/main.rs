use anyhow::{Context, Result};
use olevium::{parse_args, Command, Executor, PromptPassword, USAGE};
use olevium_api::Client;
use olevium_auth::{resume_session, Settings};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let command = match parse_args(std::env::args().skip(1)) {
        Ok(command) => command,
        Err(e) => {
            eprintln!("error: {}\n\n{}", e, USAGE);
            std::process::exit(2);
        }
    };
    if command == Command::Help {
        println!("{}", USAGE);
        return Ok(());
    }

    // Logging is best effort; a read-only home must not block the command
    let _log_guard = match olevium::logging::init_logging() {
        Ok((_path, guard)) => Some(guard),
        Err(e) => {
            eprintln!("warning: logging disabled: {}", e);
            None
        }
    };

    let settings = Settings::new().context("Failed to load configuration")?;
    settings
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    tracing::info!(api_url = %settings.api_url, "Starting olevium");

    let client = Client::new(resume_session(&settings).await?);
    let executor = Executor::new(&client, &PromptPassword);

    let mut stdout = std::io::stdout().lock();
    executor.execute(command, &mut stdout).await
}
