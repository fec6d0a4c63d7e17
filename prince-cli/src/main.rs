//! prince-install
//!
//! Fetches the PrinceXML distribution into the package directory, or
//! removes it again:
//!
//! ```text
//! prince-install install
//! prince-install uninstall
//! ```

mod progress;

use clap::{Parser, ValueEnum};
use prince_core::{InstallEvent, InstallOutcome, Provisioner, ResolveError};
use std::cell::OnceCell;
use std::process::ExitCode;

use progress::DownloadBar;

#[derive(Parser, Debug)]
#[command(name = "prince-install", version, about = "Install or remove the local PrinceXML distribution")]
struct Cli {
    /// What to do with the local distribution
    #[arg(value_enum)]
    command: Command,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum Command {
    /// Download and unpack PrinceXML unless prince(1) is already in PATH
    Install,
    /// Delete the locally unpacked distribution
    Uninstall,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("prince-install v{} running {:?}", prince_core::VERSION, cli.command);

    let provisioner = Provisioner::new();
    match cli.command {
        Command::Install => install(&provisioner).await,
        Command::Uninstall => uninstall(&provisioner).await,
    }
}

async fn install(provisioner: &Provisioner) -> ExitCode {
    // Created on the first progress update so it does not draw before the messages.
    let bar: OnceCell<DownloadBar> = OnceCell::new();

    let result = provisioner
        .install(|event| match event {
            InstallEvent::Checking => println!("++ checking for globally installed PrinceXML"),
            InstallEvent::Found(tool) => {
                println!("-- found prince(1) command: {}", tool.path.display());
                println!("-- found prince(1) version: {}", tool.version);
            }
            InstallEvent::Resolving => println!("++ downloading PrinceXML distribution"),
            InstallEvent::Downloading { url } => println!("-- download: {}", url),
            InstallEvent::Progress(progress) => bar.get_or_init(DownloadBar::new).update(&progress),
            InstallEvent::Downloaded { bytes } => {
                if let Some(bar) = bar.get() {
                    bar.finish();
                }
                println!("-- download: {} bytes received.", bytes);
            }
            InstallEvent::Unpacking => println!("++ locally unpacking PrinceXML distribution"),
        })
        .await;

    if let Some(bar) = bar.get() {
        bar.abandon();
    }

    match result {
        Ok(InstallOutcome::AlreadyInstalled(_)) => ExitCode::SUCCESS,
        Ok(InstallOutcome::Installed { dir }) => {
            tracing::info!("Unpacked into {}", dir.display());
            println!("-- OK: local PrinceXML installation now available");
            ExitCode::SUCCESS
        }
        Ok(InstallOutcome::InstallerFailed { stdout, stderr }) => {
            println!("** ERROR: failed to extract: installer reported failure");
            if !stdout.trim().is_empty() {
                println!("{}", stdout.trim_end());
            }
            if !stderr.trim().is_empty() {
                println!("{}", stderr.trim_end());
            }
            ExitCode::FAILURE
        }
        Err(e) => {
            match e.downcast_ref::<ResolveError>() {
                Some(ResolveError::UnsupportedPlatform(id)) => {
                    println!("ERROR: PrinceXML not available for platform \"{}\"", id);
                }
                _ => println!("** ERROR: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn uninstall(provisioner: &Provisioner) -> ExitCode {
    if !provisioner.settings().install_dir().exists() {
        return ExitCode::SUCCESS;
    }

    println!("++ deleting locally unpacked PrinceXML distribution");
    match provisioner.uninstall().await {
        Ok(_) => {
            println!("-- OK: done");
            ExitCode::SUCCESS
        }
        Err(e) => {
            println!("** ERROR: {:#}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_install() {
        let cli = Cli::try_parse_from(["prince-install", "install"]).unwrap();
        assert_eq!(cli.command, Command::Install);
    }

    #[test]
    fn test_parse_uninstall() {
        let cli = Cli::try_parse_from(["prince-install", "uninstall"]).unwrap();
        assert_eq!(cli.command, Command::Uninstall);
    }

    #[test]
    fn test_rejects_wrong_argument_count() {
        assert!(Cli::try_parse_from(["prince-install"]).is_err());
        assert!(Cli::try_parse_from(["prince-install", "install", "uninstall"]).is_err());
    }

    #[test]
    fn test_rejects_unknown_command() {
        assert!(Cli::try_parse_from(["prince-install", "upgrade"]).is_err());
    }

    #[test]
    fn test_cli_definition_is_valid() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
