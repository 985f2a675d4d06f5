//! `lwn2email` -- deliver new LWN.net Weekly Editions by email.
//!
//! Intended to run from cron or a systemd timer. Exits 0 both after a
//! delivery and when there is nothing new; any failure exits 1 without
//! marking anything, so the next run retries.

use clap::Parser;
use lwn2email::config::{self, Overrides};
use lwn2email::mail::Sendmail;
use lwn2email::pipeline::{self, Outcome};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::{error, info};

/// Deliver new LWN.net Weekly Editions as email attachments.
#[derive(Debug, Parser)]
#[command(name = "lwn2email", version, about)]
struct Args {
    /// Directory where delivered editions are recorded
    #[arg(long)]
    marks_directory: Option<PathBuf>,

    /// Write the edition to stdout instead of mailing it
    #[arg(long)]
    no_email: bool,

    /// Destination address for the edition mail
    #[arg(long)]
    address: Option<String>,

    /// LWN.net account name
    #[arg(long)]
    username: Option<String>,

    /// LWN.net account password
    #[arg(long)]
    password: Option<String>,

    /// Path to the sendmail binary (default: search PATH)
    #[arg(long)]
    sendmail: Option<PathBuf>,

    /// Configuration file (default: $XDG_CONFIG_HOME/lwn2email.toml)
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Args {
    fn into_overrides(self) -> Overrides {
        Overrides {
            config_file: self.config,
            marks_directory: self.marks_directory,
            no_email: self.no_email,
            address: self.address,
            username: self.username,
            password: self.password,
            sendmail_path: self.sendmail,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let config = match config::resolve(args.into_overrides()) {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let transport = if config.no_email {
        // Stdout mode never invokes the transport.
        Sendmail::new(PathBuf::from("sendmail"))
    } else {
        let resolved = match &config.sendmail_path {
            Some(path) => Some(Sendmail::new(path.clone())),
            None => Sendmail::from_path(),
        };
        match resolved {
            Some(transport) => transport,
            None => {
                error!("sendmail not found in PATH; set sendmail_path or use --no-email");
                return ExitCode::FAILURE;
            }
        }
    };

    match pipeline::run(&config, &transport).await {
        Ok(Outcome::Delivered { title }) => {
            info!(%title, "done");
            ExitCode::SUCCESS
        }
        Ok(Outcome::UpToDate) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
