use anyhow::Result;
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

mod cli;
mod commands;

use cli::{Cli, Command};
use commands::locate::LocateRequest;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging
    let directive = if cli.verbose {
        "patchport=debug"
    } else {
        "patchport=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(directive.parse()?))
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Some(Command::Fingerprint {
            game_code,
            module,
            patch_dir,
        }) => commands::fingerprint::run(&game_code, &module, patch_dir.as_deref()),
        Some(Command::Locate {
            old_module,
            new_module,
            offset,
            length,
            max_margin,
            min_margin,
            clamp,
        }) => commands::locate::run(&LocateRequest {
            old_module: &old_module,
            new_module: &new_module,
            offset: &offset,
            length,
            max_margin,
            min_margin,
            clamp,
        }),
        None => {
            let port = &cli.port;
            if port.game_code.is_none() || port.old_module.is_none() || port.new_module.is_none() {
                Cli::command()
                    .error(
                        ErrorKind::MissingRequiredArgument,
                        "expected <GAME_CODE> <OLD_MODULE> <NEW_MODULE>",
                    )
                    .exit();
            }
            commands::port::run(port)
        }
    }
}
