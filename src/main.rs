use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = rlboard::cli::Cli::parse();

    match cli.command.clone() {
        Some(rlboard::cli::CliCommand::Tui) | None => {
            if cli.log_filter.is_some() {
                let path = rlboard::config::default_log_path();
                rlboard::logging::init_file_tracing(cli.log_filter.clone(), &path)?;
            }
            let config = rlboard::config::from_cli(&cli)?;
            rlboard::tui::run(config)?;
        }
        Some(command) => {
            rlboard::logging::init_tracing(cli.log_filter.clone())?;
            let config = rlboard::config::from_cli(&cli)?;
            let stdout = std::io::stdout();
            let mut handle = stdout.lock();
            rlboard::commands::execute(&config, command, &mut handle)?;
        }
    }

    Ok(())
}
