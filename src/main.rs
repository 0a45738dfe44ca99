mod cli;

use clap::Parser;
use cli::{Args, Command};
use veo_studio::config::Config;

/// Load .env file before reading credentials.
///
/// Does not override existing environment variables.
fn load_env() {
    // dotenv::dotenv() returns Err if .env doesn't exist, which is fine
    let _ = dotenv::dotenv();
}

fn load_config(path: Option<&std::path::Path>) -> Config {
    let mut config = match Config::load(path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(1);
        }
    };
    config.apply_env();
    config
}

fn main() {
    load_env();

    let args = Args::parse();
    let config = load_config(args.config.as_deref());

    let result = match args.command {
        Command::Translate { text } => cli::run_translate(&config, &text),
        Command::Prompt {
            location,
            character1,
            dialogue1,
            character2,
            dialogue2,
            prompt_type,
        } => cli::run_prompt(
            &config,
            location,
            character1,
            dialogue1,
            character2,
            dialogue2,
            prompt_type,
        ),
        Command::Video {
            prompt,
            aspect_ratio,
            max_wait,
            download,
        } => cli::run_video(&config, &prompt, aspect_ratio, max_wait, download),
        Command::Config { action } => {
            cli::handle_config_action(&config, args.config.clone(), action);
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
