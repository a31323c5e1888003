use std::path::PathBuf;

use clap::{value_parser, Args, Parser, Subcommand};

use crate::model::{ConfigFormat, TaskStatus};

#[derive(Parser, Debug, Clone)]
#[command(
    name = "rlboard",
    version,
    about = "Submit and monitor reinforcement-learning training tasks.",
    after_help = "Examples:\n  rlboard             Launch the TUI (same as `rlboard tui`)\n  rlboard list --json\n  rlboard submit --name \"CartPole Run\" --algorithm PPO --episodes 500\n  rlboard submit --name sweep --config-file sweep.yaml --format yaml\n  rlboard convert --from json --to yaml config.json"
)]
pub struct Cli {
    /// Session config file (defaults to RLBOARD_CONFIG, then the platform config dir)
    #[arg(long, value_name = "PATH", global = true)]
    pub config: Option<PathBuf>,

    /// Tracing filter (e.g. "info", "rlboard_core=debug"); the dashboard logs to rlboard.log
    /// in the platform data dir
    #[arg(long = "log", value_name = "DIRECTIVE", global = true)]
    pub log_filter: Option<String>,

    #[command(subcommand)]
    pub command: Option<CliCommand>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum CliCommand {
    /// Launch the keyboard-first terminal dashboard (default command)
    Tui,
    /// Print the task history, newest first
    List(ListArgs),
    /// Print one task and its configuration
    Show(ShowArgs),
    /// Submit a task to a session store seeded with the sample history
    Submit(SubmitArgs),
    /// Move a sample task to another status and print it
    Status(StatusArgs),
    /// Convert a configuration document between JSON and YAML
    Convert(ConvertArgs),
    /// Print the built-in example configuration
    Example(ExampleArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ListArgs {
    /// Emit the tasks as a JSON array
    #[arg(long)]
    pub json: bool,
}

#[derive(Args, Debug, Clone)]
pub struct ShowArgs {
    /// Task id
    #[arg(value_name = "ID")]
    pub id: String,

    /// Configuration format (defaults to the session default)
    #[arg(long, value_enum)]
    pub format: Option<ConfigFormat>,
}

#[derive(Args, Debug, Clone)]
pub struct SubmitArgs {
    /// Task display name
    #[arg(long)]
    pub name: String,

    /// Algorithm (PPO, DQN, SAC, or any other label)
    #[arg(long)]
    pub algorithm: Option<String>,

    /// Environment id (CartPole-v1, LunarLander-v2, Pendulum-v1, ...)
    #[arg(long)]
    pub environment: Option<String>,

    #[arg(long = "learning-rate", value_parser = value_parser!(f64))]
    pub learning_rate: Option<f64>,

    #[arg(long = "batch-size", value_parser = value_parser!(u32))]
    pub batch_size: Option<u32>,

    #[arg(long, value_parser = value_parser!(u32))]
    pub episodes: Option<u32>,

    /// Submit a full configuration document instead of the simple fields ("-" reads stdin)
    #[arg(long = "config-file", value_name = "PATH", conflicts_with_all = ["learning_rate", "batch_size", "episodes"])]
    pub config_file: Option<PathBuf>,

    /// Format of --config-file (defaults to the session default)
    #[arg(long, value_enum, requires = "config_file")]
    pub format: Option<ConfigFormat>,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(value_name = "ID")]
    pub id: String,

    #[arg(value_name = "STATUS", value_enum)]
    pub status: TaskStatus,
}

#[derive(Args, Debug, Clone)]
pub struct ConvertArgs {
    #[arg(long, value_enum)]
    pub from: ConfigFormat,

    #[arg(long, value_enum)]
    pub to: ConfigFormat,

    /// Input file ("-" or omitted reads stdin)
    #[arg(value_name = "PATH")]
    pub input: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct ExampleArgs {
    #[arg(long, value_enum)]
    pub format: Option<ConfigFormat>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_submit_with_simple_fields() {
        let cli = Cli::try_parse_from([
            "rlboard",
            "submit",
            "--name",
            "CartPole Run",
            "--learning-rate",
            "0.0003",
            "--batch-size",
            "64",
        ])
        .unwrap();
        match cli.command {
            Some(CliCommand::Submit(args)) => {
                assert_eq!(args.name, "CartPole Run");
                assert_eq!(args.learning_rate, Some(0.0003));
                assert_eq!(args.batch_size, Some(64));
                assert!(args.config_file.is_none());
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn format_requires_config_file() {
        let result =
            Cli::try_parse_from(["rlboard", "submit", "--name", "x", "--format", "yaml"]);
        assert!(result.is_err());
    }

    #[test]
    fn parses_status_values() {
        let cli = Cli::try_parse_from(["rlboard", "status", "2", "failed"]).unwrap();
        match cli.command {
            Some(CliCommand::Status(args)) => {
                assert_eq!(args.id, "2");
                assert_eq!(args.status, TaskStatus::Failed);
            }
            other => panic!("unexpected command {other:?}"),
        }
        assert!(Cli::try_parse_from(["rlboard", "status", "2", "paused"]).is_err());
    }

    #[test]
    fn global_config_flag_follows_subcommand() {
        let cli = Cli::try_parse_from(["rlboard", "list", "--config", "/tmp/rl.yaml"]).unwrap();
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/rl.yaml")));
    }
}
