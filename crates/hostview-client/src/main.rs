//! hostview CLI entry point.

use std::io;
use std::process::ExitCode;

use clap::Parser;

use hostview_client::cli::{Cli, Command, ConfigAction};
use hostview_client::config::{ClientConfig, OutputFormat, OutputSettings, RunMode};
use hostview_client::error::ClientResult;
use hostview_client::{
    BatchRunner, InteractiveRunner, JsonSink, OutputSink, Session, TableSink, commands,
};

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    if let Err(e) = commands::init_logging(commands::tracing_preset(&cli)) {
        eprintln!("warning: {}", e);
    }

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> ClientResult<ExitCode> {
    let config_path = cli.config.clone().unwrap_or_else(ClientConfig::default_path);
    let mut config = if cli.config.is_some() {
        ClientConfig::load_from(&config_path)?
    } else {
        ClientConfig::load()?
    };
    config.apply_cli(&cli);

    match cli.command {
        Some(Command::Config { action }) => {
            match action {
                ConfigAction::Dump => commands::config::dump(&config, &config_path)?,
                ConfigAction::Validate => commands::config::validate(&config)?,
                ConfigAction::Path => commands::config::path(&config_path)?,
            }
            Ok(ExitCode::SUCCESS)
        }
        Some(Command::Server {
            bind,
            listen_port,
            data,
        }) => {
            let port = match listen_port {
                Some(port) => port,
                None => config.endpoint()?.port(),
            };
            commands::server::run(&bind, port, data.as_deref()).await?;
            Ok(ExitCode::SUCCESS)
        }
        None => fetch(&config).await,
    }
}

/// Runs the client in the configured mode.
///
/// An invalid endpoint or timeout fails here, before any connection attempt.
async fn fetch(config: &ClientConfig) -> ClientResult<ExitCode> {
    config.validate()?;
    let session = Session::new(config.endpoint()?).with_connect_timeout(config.connect_timeout());
    let mut sink = build_sink(&config.output);

    match config.mode {
        RunMode::Interactive => {
            let mut runner = InteractiveRunner::new(session, sink, config.reconnect_delay());
            runner.run_until_shutdown(commands::shutdown_signal()).await;
            Ok(ExitCode::SUCCESS)
        }
        RunMode::Batch => {
            let outcome = BatchRunner::new(session)
                .run_once(config.batch_timeout())
                .await;
            Ok(ExitCode::from(outcome.report(&mut sink)))
        }
    }
}

fn build_sink(output: &OutputSettings) -> Box<dyn OutputSink> {
    match output.format {
        OutputFormat::Table => Box::new(TableSink::new(io::stdout(), output.sort)),
        OutputFormat::Json => Box::new(JsonSink::new(io::stdout())),
    }
}
