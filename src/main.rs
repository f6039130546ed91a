use anyhow::Context;
use clap::{Parser, Subcommand};
use scaradraw::{app, init_logging, EventBus, SequencerState, BUILD_DATE, VERSION};
use std::path::PathBuf;
use std::sync::Arc;

/// CLI arguments
#[derive(Parser, Debug)]
#[command(name = "scaradraw", version)]
#[command(about = "Plan and play back drawings on a two-link SCARA arm")]
struct Cli {
    /// Configuration file (.toml or .json); defaults to the platform config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Compile traced contours into a trajectory and print a summary
    Plan {
        /// Contour file produced by the tracing step (JSON)
        contours: PathBuf,

        /// Write the trajectory as an `x,y,pen` text file
        #[arg(long)]
        export: Option<PathBuf>,
    },

    /// Compile traced contours and draw them
    Run {
        /// Contour file produced by the tracing step (JSON)
        contours: PathBuf,

        /// Serial port, overriding the configuration
        #[arg(long, conflicts_with = "simulate")]
        port: Option<String>,

        /// Play back against the simulated arm instead of hardware
        #[arg(long)]
        simulate: bool,
    },

    /// List serial ports that look like drawing controllers
    Ports,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_logging()?;
    tracing::debug!("scaradraw {} built {}", VERSION, BUILD_DATE);

    match cli.command {
        Command::Ports => app::print_ports(),
        Command::Plan { contours, export } => {
            let config = app::load_config(cli.config.as_deref())?;
            let pipeline = app::pipeline(&config, Arc::new(EventBus::new()))?;
            let trajectory = app::plan_file(&pipeline, &contours)?;
            println!("{}", app::summarize(&trajectory));

            if let Some(path) = export {
                pipeline
                    .export(&trajectory, &path)
                    .with_context(|| format!("exporting to {}", path.display()))?;
                println!("Trajectory written to {}", path.display());
            }
            Ok(())
        }
        Command::Run {
            contours,
            port,
            simulate,
        } => {
            let config = app::load_config(cli.config.as_deref())?;
            let events = Arc::new(EventBus::new());
            let pipeline = app::pipeline(&config, events.clone())?;
            let trajectory = app::plan_file(&pipeline, &contours)?;
            println!("{}", app::summarize(&trajectory));

            let sink = app::open_sink(&config, port.as_deref(), simulate);
            let report = app::play(trajectory.waypoints, sink, &config, events).await?;
            println!(
                "{}: {} of {} waypoints sent, {} skipped",
                report.state, report.sent, report.total, report.skipped
            );
            if report.state != SequencerState::Completed {
                std::process::exit(130);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_run() {
        let cli = Cli::try_parse_from([
            "scaradraw",
            "run",
            "cat.json",
            "--port",
            "/dev/ttyUSB0",
            "--config",
            "arm.toml",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("arm.toml")));
        match cli.command {
            Command::Run {
                contours,
                port,
                simulate,
            } => {
                assert_eq!(contours, PathBuf::from("cat.json"));
                assert_eq!(port.as_deref(), Some("/dev/ttyUSB0"));
                assert!(!simulate);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_cli_rejects_port_with_simulate() {
        assert!(Cli::try_parse_from(["scaradraw", "run", "cat.json", "--port", "COM3", "--simulate"]).is_err());
    }

    #[test]
    fn test_cli_command_definition() {
        use clap::CommandFactory;
        Cli::command().debug_assert();
    }
}
