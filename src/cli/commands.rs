//! Subcommand handlers.
//!
//! Each handler builds its client from the loaded config, runs one operation
//! on a fresh tokio runtime, and reports through stdout/stderr.

use std::io::Write;
use std::path::PathBuf;
use std::time::Duration;

use super::args::ConfigAction;
use super::enums::{AspectRatio, PromptType};
use veo_studio::config::{default_path as get_config_path, Config, DEFAULT_CONFIG_TEMPLATE};
use veo_studio::genai::{
    PollOutcome, PromptFields, TextError, TextGenerationClient, VideoError, VideoJobClient,
    VideoOptions,
};

fn runtime() -> Result<tokio::runtime::Runtime, String> {
    tokio::runtime::Runtime::new().map_err(|e| format!("Failed to create async runtime: {}", e))
}

fn text_client(config: &Config) -> Result<TextGenerationClient, String> {
    TextGenerationClient::from_config(&config.text).map_err(|e| match e {
        TextError::MissingApiKey => "No text generation API keys configured.\n\n\
            Add keys to a .env file:\n    \
                echo 'GEMINI_API_KEYS=key1,key2' >> .env\n\n\
            Or list them under [text] api_keys in the config file."
            .to_string(),
        _ => format!("Failed to create text client: {}", e),
    })
}

/// Translate `text` and print the result.
pub fn run_translate(config: &Config, text: &str) -> Result<(), String> {
    if text.trim().is_empty() {
        return Err("Please enter Myanmar text to translate".to_string());
    }

    let mut client = text_client(config)?;
    let rt = runtime()?;
    let translation = rt
        .block_on(client.translate(text))
        .map_err(|e| e.to_string())?;

    println!("{}", translation);
    Ok(())
}

/// Author a prompt and print it.
pub fn run_prompt(
    config: &Config,
    location: String,
    character1: String,
    dialogue1: String,
    character2: Option<String>,
    dialogue2: Option<String>,
    prompt_type: PromptType,
) -> Result<(), String> {
    if [&location, &character1, &dialogue1]
        .iter()
        .any(|field| field.trim().is_empty())
    {
        return Err("Location, character1 and dialogue1 are required".to_string());
    }

    let mut fields = PromptFields::new(location, character1, dialogue1)
        .with_prompt_type(prompt_type.as_str());
    if prompt_type.allows_second_speaker() {
        if let Some(character2) = character2 {
            fields = fields.with_second(character2, dialogue2);
        }
    }

    let mut client = text_client(config)?;
    let rt = runtime()?;
    let prompt = rt.block_on(client.generate_structured_prompt(&fields));

    println!("{}", prompt);
    Ok(())
}

/// Generate a video, printing one dot per poll, then list (and optionally
/// download) the results.
pub fn run_video(
    config: &Config,
    prompt: &str,
    aspect_ratio: Option<AspectRatio>,
    max_wait: Option<u64>,
    download: Option<PathBuf>,
) -> Result<(), String> {
    let client = VideoJobClient::from_config(&config.video).map_err(|e| match e {
        VideoError::MissingApiKey => "KIE_API_KEY environment variable is not set.\n\n\
            To generate videos, add your API key to a .env file:\n    \
                echo 'KIE_API_KEY=your-api-key-here' >> .env\n\n\
            Get your API key at: https://kie.ai/"
            .to_string(),
        _ => format!("Failed to create video client: {}", e),
    })?;

    let mut options = VideoOptions::default();
    if let Some(ratio) = aspect_ratio {
        options = options.with_aspect_ratio(ratio.as_str());
    }
    let max_wait = Duration::from_secs(max_wait.unwrap_or(config.video.max_wait_secs));

    let rt = runtime()?;
    rt.block_on(async {
        println!("Generating video for: \"{}\"", prompt);
        println!();

        print!("Submitting... ");
        std::io::stdout().flush().ok();
        let mut job = client
            .submit(prompt, &options)
            .await
            .map_err(|e| format!("Failed to submit generation request: {}", e))?;
        println!("done");
        println!("  Task ID: {}", job.task_id);

        print!("Generating");
        std::io::stdout().flush().ok();
        let urls = client
            .wait_for_completion(&mut job, max_wait, |_, outcome| {
                if *outcome == PollOutcome::StillRunning {
                    print!(".");
                    std::io::stdout().flush().ok();
                }
            })
            .await
            .map_err(|e| format!("\n{}", e))?;
        println!(" done");

        if urls.is_empty() {
            println!("The job finished without result URLs.");
            return Ok(());
        }

        println!();
        for url in &urls {
            println!("  {}", url);
        }

        if let Some(dir) = download {
            println!();
            let paths = client
                .download_results(&job, &dir)
                .await
                .map_err(|e| format!("Failed to download video: {}", e))?;
            for path in paths {
                println!("Saved: {}", path.display());
            }
        }

        Ok(())
    })
}

/// Handle config subcommand actions.
pub fn handle_config_action(config: &Config, path: Option<PathBuf>, action: ConfigAction) {
    let config_path = path.unwrap_or_else(get_config_path);

    match action {
        ConfigAction::Show => {
            println!("Current configuration:");
            println!("  Text keys: {}", config.text.api_keys.len());
            println!("  Text model: {}", config.text.model);
            println!(
                "  Fallback: {} ({})",
                config.text.fallback.model,
                if config.text.fallback.api_key.is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!(
                "  Video key: {}",
                if config.video.api_key.is_some() {
                    "configured"
                } else {
                    "not configured"
                }
            );
            println!("  Video model: {}", config.video.model);
            println!("  Aspect ratio: {}", config.video.aspect_ratio);
            println!("  Poll interval: {}s", config.video.poll_interval_secs);
            println!("  Max wait: {}s", config.video.max_wait_secs);
            println!();

            if config_path.exists() {
                println!("Config file: {} (exists)", config_path.display());
            } else {
                println!("Config file: {} (not found)", config_path.display());
            }
        }
        ConfigAction::Init => {
            if config_path.exists() {
                eprintln!("Config file already exists: {}", config_path.display());
                eprintln!("Use 'veo-studio config show' to view current settings.");
                std::process::exit(1);
            }

            // Create parent directories if needed
            if let Some(parent) = config_path.parent() {
                if let Err(e) = std::fs::create_dir_all(parent) {
                    eprintln!("Error creating config directory: {}", e);
                    std::process::exit(1);
                }
            }

            if let Err(e) = std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE) {
                eprintln!("Error writing config file: {}", e);
                std::process::exit(1);
            }

            println!("Created config file: {}", config_path.display());
        }
    }
}
