//! CLI enum types for prompt type and aspect ratio options.

use clap::ValueEnum;

/// Kind of scene the authored prompt describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum PromptType {
    #[default]
    Interview,
    Conversation,
    Monologue,
    Documentary,
    News,
    Tutorial,
    Storytelling,
    Vlog,
    Testimonial,
    Presentation,
}

impl PromptType {
    /// Tag sent to the prompt author.
    pub fn as_str(self) -> &'static str {
        match self {
            PromptType::Interview => "interview",
            PromptType::Conversation => "conversation",
            PromptType::Monologue => "monologue",
            PromptType::Documentary => "documentary",
            PromptType::News => "news",
            PromptType::Tutorial => "tutorial",
            PromptType::Storytelling => "storytelling",
            PromptType::Vlog => "vlog",
            PromptType::Testimonial => "testimonial",
            PromptType::Presentation => "presentation",
        }
    }

    /// Only interview and conversation scenes have a second speaker.
    pub fn allows_second_speaker(self) -> bool {
        matches!(self, PromptType::Interview | PromptType::Conversation)
    }
}

/// Output frame shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum AspectRatio {
    /// 16:9 landscape, supports 1080p
    #[default]
    #[value(name = "16:9")]
    Landscape,
    /// 9:16 portrait, for mobile
    #[value(name = "9:16")]
    Portrait,
}

impl AspectRatio {
    pub fn as_str(self) -> &'static str {
        match self {
            AspectRatio::Landscape => "16:9",
            AspectRatio::Portrait => "9:16",
        }
    }
}
