mod session;

use clap::{Parser, Subcommand};
use dialoguer::Input;
use hce::codec::{bytes_to_hex, hex_to_bytes};
use hce::dispatcher::Rejection;
use hce::{Aid, Applet, Config, DeactivationReason, Dispatcher, Echo, HostCardService, StatusWord};
use tracing::warn;
use tracing_subscriber::EnvFilter;

use crate::session::TracingLifecycle;

#[derive(Debug, thiserror::Error)]
enum Error {
    #[error("Invalid command APDU: {0}")]
    Codec(#[from] hce::codec::Error),

    #[error("Error occurred on reading the input: {0}")]
    Io(#[from] std::io::Error),

    #[error("Error occurred on writing the output: {0}")]
    Json(#[from] serde_json::Error),
}

type Result<T> = std::result::Result<T, Error>;

type Service = HostCardService<Box<dyn Applet>, TracingLifecycle>;

#[derive(Parser)]
#[command(name = "hce", version, about)]
struct Cli {
    /// AID the emulated card answers for, in hex.
    #[arg(long, global = true)]
    aid: Option<Aid>,

    /// Status word answered to an unsupported class, in hex.
    #[arg(long, global = true)]
    cla_not_supported: Option<StatusWord>,

    /// Echoes every command back instead of dispatching it.
    #[arg(long, global = true)]
    echo: bool,

    /// Prints the results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Sends the command APDUs to the card, printing a response for each.
    Dispatch {
        /// Command APDUs in hex. Whitespace is ignored.
        #[arg(required = true)]
        apdus: Vec<String>,
    },

    /// Reads command APDUs from a prompt until an empty line is entered.
    Shell,

    /// Prints the effective configuration.
    Config,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::default();
        if let Some(aid) = &self.aid {
            config = config.with_aid(aid.clone());
        }

        if let Some(sw) = self.cla_not_supported {
            config = config.with_cla_not_supported(sw);
        }

        config
    }

    fn service(&self, config: &Config) -> Service {
        let applet: Box<dyn Applet> = match self.echo {
            true => Box::new(Echo),
            _ => Box::new(Dispatcher::new(config.clone())),
        };

        HostCardService::with_lifecycle(applet, TracingLifecycle)
    }
}

/// Names the outcome the dispatcher reaches for a command.
fn describe(config: &Config, command: &[u8]) -> &'static str {
    match Dispatcher::new(config.clone()).classify(Some(command)) {
        Ok(()) => "success",
        Err(Rejection::UnsupportedClass(_)) => "class not supported",
        Err(Rejection::UnsupportedInstruction(_)) => "instruction not supported",
        Err(
            Rejection::NullOrMissingCommand | Rejection::TooShortCommand(_) | Rejection::AidMismatch,
        ) => "failed",
    }
}

fn exchange(cli: &Cli, config: &Config, service: &Service, apdu: &str) -> Result<()> {
    let apdu: String = apdu.chars().filter(|c| !c.is_whitespace()).collect();
    let command = hex_to_bytes(&apdu)?;
    let response = service.process_command_apdu(Some(&command), None);
    let outcome = match cli.echo {
        true => None,
        _ => Some(describe(config, &command)),
    };

    if cli.json {
        let line = serde_json::json!({
            "command": bytes_to_hex(&command),
            "response": bytes_to_hex(&response),
            "outcome": outcome,
        });

        println!("{}", serde_json::to_string(&line)?);
    } else {
        match outcome {
            Some(outcome) => println!(
                "{} -> {} ({})",
                bytes_to_hex(&command),
                bytes_to_hex(&response),
                outcome
            ),
            None => println!("{} -> {}", bytes_to_hex(&command), bytes_to_hex(&response)),
        }
    }

    Ok(())
}

fn run(cli: &Cli) -> Result<()> {
    let config = cli.config();

    match &cli.command {
        Command::Config => {
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
        Command::Dispatch { apdus } => {
            let service = cli.service(&config);
            service.start();

            for apdu in apdus {
                if let Err(e) = exchange(cli, &config, &service, apdu) {
                    warn!("Skipped {}", apdu);
                    eprintln!("{}", e);
                }
            }

            service.on_deactivated(DeactivationReason::LinkLoss.into());
        }
        Command::Shell => {
            let service = cli.service(&config);
            service.start();

            loop {
                let line: String = Input::new()
                    .with_prompt("APDU")
                    .allow_empty(true)
                    .interact_text()?;

                if line.trim().is_empty() {
                    break;
                }

                if let Err(e) = exchange(cli, &config, &service, &line) {
                    eprintln!("{}", e);
                }
            }

            service.on_deactivated(DeactivationReason::Deselected.into());
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    if let Err(e) = run(&cli) {
        eprintln!("{}", e);
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_describe() {
        let config = Config::default();

        assert_eq!(
            "success",
            describe(&config, &hex_to_bytes("00A4040C07A0000002471001").unwrap()),
        );
        assert_eq!(
            "failed",
            describe(&config, &hex_to_bytes("00A4040C07F0010203040506").unwrap()),
        );
        assert_eq!("failed", describe(&config, &[0x00, 0xA4]));
        assert_eq!(
            "class not supported",
            describe(&config, &hex_to_bytes("80A4040C07A0000002471001").unwrap()),
        );
        assert_eq!(
            "instruction not supported",
            describe(&config, &hex_to_bytes("00B0000000FF").unwrap()),
        );
    }

    #[test]
    fn test_describe_with_shared_status_word() {
        let cli = Cli::parse_from([
            "hce",
            "--cla-not-supported",
            "6D00",
            "dispatch",
            "00B0000000FF",
        ]);
        let config = cli.config();
        let command = hex_to_bytes("00B0000000FF").unwrap();
        let response = cli.service(&config).process_command_apdu(Some(&command), None);

        assert_eq!(vec![0x6D, 0x00], response);
        assert_eq!("instruction not supported", describe(&config, &command));
        assert_eq!(
            "class not supported",
            describe(&config, &hex_to_bytes("80A4040C07A0000002471001").unwrap()),
        );
    }

    #[test]
    fn test_config_from_args() {
        let cli = Cli::parse_from([
            "hce",
            "--aid",
            "F0010203040506",
            "--cla-not-supported",
            "6D00",
            "config",
        ]);
        let config = cli.config();

        assert_eq!("F0010203040506", config.aid.to_string());
        assert_eq!(StatusWord(0x6D00), config.status_words.cla_not_supported);
    }

    #[test]
    fn test_invalid_aid_is_rejected() {
        assert!(Cli::try_parse_from(["hce", "--aid", "A000", "config"]).is_err());
    }

    #[test]
    fn test_exchange_invalid_hex() {
        let cli = Cli::parse_from(["hce", "dispatch", "00"]);
        let config = cli.config();
        let service = cli.service(&config);

        assert!(matches!(
            exchange(&cli, &config, &service, "00A4 04 0"),
            Err(Error::Codec(_)),
        ));
        assert!(exchange(&cli, &config, &service, "00 A4 04 0C 07 A0 00 00 02 47 10 01").is_ok());
    }
}
