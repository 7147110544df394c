use std::sync::Arc;

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use client_core::{EventHandle, EventService, RestClient, DEFAULT_API_URL};
use shared::domain::EventId;
use tokio::io::BufReader;

mod controller;
mod probe;
mod ui;

#[cfg(test)]
#[path = "tests/support.rs"]
mod test_support;

use controller::Controller;
use ui::{render, shell};

/// Console front end for the women-in-tech events API.
#[derive(Parser, Debug)]
struct Args {
    #[arg(long, env = "EVENTS_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print every event.
    List,
    /// Print one event with its activities.
    Show { id: i64 },
    /// Delete an event and its activities.
    Delete {
        id: i64,
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Probe the event list and each lookup endpoint.
    Check,
    /// Interactive shell (default).
    Shell,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();
    let client = RestClient::new(&args.api_url)?;

    if let Some(Command::Check) = args.command {
        let probes = probe::run_probes(&client, &client).await;
        print!("{}", probe::render_probes(client.base_url().as_str(), &probes));
        if !probe::all_ok(&probes) {
            bail!("one or more endpoints failed");
        }
        return Ok(());
    }

    let handle: Arc<dyn EventHandle> = Arc::new(EventService::over_rest(client));
    let mut controller = Controller::new(handle);

    match args.command.unwrap_or(Command::Shell) {
        Command::List => {
            let loaded = controller.refresh().await;
            print!("{}", render::render_event_list(controller.events()));
            finish(&controller, loaded)
        }
        Command::Show { id } => {
            let event = controller.fetch_event(EventId(id)).await;
            if let Some(event) = &event {
                print!("{}", render::render_event(event));
            }
            finish(&controller, event.is_some())
        }
        Command::Delete { id, yes } => {
            if !yes {
                bail!("refusing to delete event {id} without --yes");
            }
            let deleted = controller.delete(EventId(id)).await;
            finish(&controller, deleted)
        }
        Command::Shell | Command::Check => {
            shell::run(
                &mut controller,
                BufReader::new(tokio::io::stdin()),
                tokio::io::stdout(),
            )
            .await
        }
    }
}

fn finish(controller: &Controller, succeeded: bool) -> Result<()> {
    if let Some(banner) = controller.banner() {
        eprint!("{}", render::render_banner(banner));
    }
    if !succeeded {
        bail!("request failed");
    }
    Ok(())
}
