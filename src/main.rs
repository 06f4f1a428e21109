use clap::Parser;
use tarseal::cli::{commands, load_settings, Cli, Commands};

fn main() {
    let cli = Cli::parse();

    // Settings decide the log format, so they are loaded before logging
    // starts; a broken config file is still reported on stderr.
    let settings = match load_settings(&cli) {
        Ok(s) => s,
        Err(e) => {
            tarseal::cli::output::error(&e.to_string());
            std::process::exit(1);
        }
    };
    tarseal::logging::init(&settings.log_level, settings.log_format);

    let result = match cli.command {
        Commands::Encrypt { ref file } => commands::encrypt::execute(&cli, &settings, file),
        Commands::Decrypt { ref file } => commands::decrypt::execute(&cli, &settings, file),
        Commands::Verify { ref file } => commands::verify::execute(&cli, &settings, file),
    };

    if let Err(e) = result {
        tarseal::cli::output::error(&tarseal::redact::sanitize_log(&e.to_string()));
        std::process::exit(1);
    }
}
