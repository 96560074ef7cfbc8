use clap::Parser;
use form_builder::cli::commands::{cmd_chat, cmd_reconcile};
use form_builder::cli::config::{Cli, Commands, load_config, resolve_generator};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref());

    // Resolve generator settings: CLI > config > defaults
    let generator = resolve_generator(&config, cli.endpoint.as_deref(), cli.model.as_deref());

    match cli.command {
        Commands::Chat {
            backend,
            trace,
            replay,
        } => {
            let trace_path = trace.as_deref().or(config.trace.path.as_deref());
            cmd_chat(&generator, &backend, trace_path, replay.as_deref(), cli.verbose)?;
        }
        Commands::Reconcile {
            input,
            previous,
            output,
        } => {
            let report = cmd_reconcile(&input, previous.as_deref(), output.as_deref(), cli.verbose)?;
            if cli.verbose > 0 {
                eprintln!(
                    "{} new, {} carried over, {} dangling references",
                    report.minted.len(),
                    report.carried.len(),
                    report.dangling.len()
                );
            }
        }
    }

    Ok(())
}
