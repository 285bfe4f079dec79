use clap::Parser;
#[cfg(feature = "colored-output")]
use colored::*;
use modpipe::{
    cli::{Args, Commands, OutputFormat},
    commands::CommandExecutor,
    config::AppConfig,
    error::Result,
};
use std::{io::IsTerminal, process};
use tracing::{Level, error};
use tracing_subscriber::{filter::EnvFilter, fmt, prelude::*};

fn main() {
    let args = Args::parse();
    init_logging(args.verbose, args.quiet);

    let config = match AppConfig::load(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => exit_with_error(&e.to_string(), args.output.unwrap_or_default()),
    };
    let format = args.output.unwrap_or(config.output);

    match run(args, config, format) {
        Ok(output) => println!("{}", output.trim_end()),
        Err(e) => exit_with_error(&e.to_string(), format),
    }
}

fn run(args: Args, config: AppConfig, format: OutputFormat) -> Result<String> {
    let colored = std::io::stdout().is_terminal();
    let executor = CommandExecutor::new(config, args.catalog.as_deref(), colored)?;

    match args.command {
        Commands::Resolve {
            modules,
            pipeline,
            no_standard,
        } => executor.run_resolve(&modules, pipeline.as_deref(), no_standard, format),
        Commands::Standard => executor.run_standard(format),
        Commands::Modules { standard } => executor.run_modules(standard, format),
        Commands::Config => executor.run_config(),
    }
}

fn exit_with_error(message: &str, format: OutputFormat) -> ! {
    if format.is_json() {
        let error_json = serde_json::json!({
            "status": "error",
            "message": message,
        });
        println!("{}", error_json);
    } else {
        error!("Application error: {}", message);
        #[cfg(feature = "colored-output")]
        {
            eprintln!("{} {}", "Error:".red().bold(), message);
        }
        #[cfg(not(feature = "colored-output"))]
        {
            eprintln!("Error: {}", message);
        }
    }
    process::exit(1);
}

fn init_logging(verbose: bool, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env().add_directive(Level::INFO.into())
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(verbose)
                .with_writer(std::io::stderr),
        )
        .init();
}
