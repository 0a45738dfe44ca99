//! CLI argument parsing with clap.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use super::enums::{AspectRatio, PromptType};

/// Myanmar video prompt studio: translation, prompt authoring and Veo generation
#[derive(Parser, Debug)]
#[command(name = "veo-studio")]
#[command(version, about = "Translate, author and render Burmese-language Veo videos", long_about = None)]
#[command(after_help = "ENVIRONMENT:
    GEMINI_API_KEYS    Comma-separated primary keys for translation and prompts
    DEEPSEEK_API_KEY   Optional fallback provider key
    KIE_API_KEY        Video generation key")]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Config file path
    #[arg(long, short, global = true)]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Translate Myanmar text to English dialogue
    Translate {
        /// Myanmar text to translate
        text: String,
    },
    /// Author a Veo video prompt from scene details
    Prompt {
        /// Where the scene takes place
        #[arg(long, short)]
        location: String,
        /// First character description
        #[arg(long)]
        character1: String,
        /// First character's line (English)
        #[arg(long)]
        dialogue1: String,
        /// Second character description
        #[arg(long)]
        character2: Option<String>,
        /// Second character's line (English)
        #[arg(long)]
        dialogue2: Option<String>,
        /// Scene type
        #[arg(long, short = 't', default_value = "interview")]
        prompt_type: PromptType,
    },
    /// Generate a video from a prompt and wait for the result
    Video {
        /// Prompt describing the video
        prompt: String,
        /// Frame shape
        #[arg(long, short)]
        aspect_ratio: Option<AspectRatio>,
        /// Give up after this many seconds (default from config)
        #[arg(long)]
        max_wait: Option<u64>,
        /// Download results into this directory
        #[arg(long, short)]
        download: Option<PathBuf>,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum ConfigAction {
    /// Show current configuration
    Show,
    /// Create default config file
    Init,
}
