//! Role-tagged messages, tuning presets and the two request builders.

use serde::{Deserialize, Serialize};

/// System instruction for Myanmar → English dialogue translation.
pub const TRANSLATION_SYSTEM_PROMPT: &str = "You are a Myanmar to English translator. \
Your task is to translate Myanmar text to natural English.
- Translate accurately while maintaining the natural flow and meaning
- Keep the conversational tone appropriate for video dialogue
- Return only the English translation, nothing else";

/// System instruction for authoring Veo video prompts.
pub const PROMPT_AUTHORING_SYSTEM_PROMPT: &str = "You are an expert at creating video generation \
prompts for Google Veo 2 and Veo 3.
Your task is to create professional prompts for Myanmar/Burmese language videos following this \
specific template:

TEMPLATE STRUCTURE:
✅ At [LOCATION]
✅ [CHARACTER DESCRIPTION(S)]
✅ Translate dialog to myanmar language and Speak with Burmese language and Burmese voice. \
Translation to Myanmar language:
✅ [CHARACTER] asks/speaks *in a clear Burmese language* \"[DIALOGUE IN ENGLISH]\"
✅ (If second character) [CHARACTER] replies *in clear Burmese language* \"[DIALOGUE IN ENGLISH]\"

IMPORTANT RULES:
- Always include \"in a clear Burmese language\" or \"in clear Burmese language\"
- Always end with \"Note that output audio must be in burmese language.\"
- Dialogue must be in English (not Myanmar script) because Veo doesn't support Myanmar text yet
- Make the prompt professional and detailed
- Focus on visual descriptions for characters and setting";

/// Prompt type used when the caller does not pick one.
pub const DEFAULT_PROMPT_TYPE: &str = "interview";

/// Author of a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    System,
    User,
}

/// One role-tagged message.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Message {
    pub role: Role,
    pub content: String,
}

impl Message {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: Role::System,
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            content: content.into(),
        }
    }
}

/// Sampling parameters. Same shape for every use case, different values.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuning {
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
}

impl Tuning {
    /// Low temperature, short output: translations should be literal.
    pub const TRANSLATION: Tuning = Tuning {
        temperature: 0.3,
        top_k: 20,
        top_p: 0.8,
        max_output_tokens: 512,
    };

    /// Looser sampling and a longer budget for prompt authoring.
    pub const PROMPT_AUTHORING: Tuning = Tuning {
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 1024,
    };
}

/// Messages plus tuning, handed unchanged to every provider in the chain.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub messages: Vec<Message>,
    pub tuning: Tuning,
}

impl GenerationRequest {
    /// Build the translation request for `source_text`.
    pub fn translation(source_text: &str) -> Self {
        Self {
            messages: vec![
                Message::system(TRANSLATION_SYSTEM_PROMPT),
                Message::user(format!(
                    "Translate this Myanmar text to English: \"{}\"",
                    source_text
                )),
            ],
            tuning: Tuning::TRANSLATION,
        }
    }

    /// Build the prompt authoring request for `fields`.
    pub fn prompt_authoring(fields: &PromptFields) -> Self {
        let user_prompt = format!(
            "Create a Veo 3 prompt with these details:\n\
             Location: {}\n\
             Character 1: {}\n\
             Character 2: {}\n\
             Dialogue 1: {}\n\
             Dialogue 2: {}\n\
             Prompt Type: {}\n\n\
             Follow the exact template structure and include all the required elements for \
             Myanmar language video generation.",
            fields.location,
            fields.character1,
            fields.second_character().unwrap_or("None"),
            fields.dialogue1,
            fields.second_dialogue().unwrap_or("None"),
            fields.prompt_type,
        );

        Self {
            messages: vec![
                Message::system(PROMPT_AUTHORING_SYSTEM_PROMPT),
                Message::user(user_prompt),
            ],
            tuning: Tuning::PROMPT_AUTHORING,
        }
    }

    /// Content of the first message with `role`, if any.
    pub fn content_for(&self, role: Role) -> Option<&str> {
        self.messages
            .iter()
            .find(|m| m.role == role)
            .map(|m| m.content.as_str())
    }
}

/// Scene description used to author a video prompt.
///
/// Required-field checks happen before this reaches the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptFields {
    pub location: String,
    pub character1: String,
    pub dialogue1: String,
    #[serde(default)]
    pub character2: Option<String>,
    #[serde(default)]
    pub dialogue2: Option<String>,
    #[serde(default = "default_prompt_type")]
    pub prompt_type: String,
}

fn default_prompt_type() -> String {
    DEFAULT_PROMPT_TYPE.to_string()
}

impl PromptFields {
    /// Fields for a single-speaker scene.
    pub fn new(
        location: impl Into<String>,
        character1: impl Into<String>,
        dialogue1: impl Into<String>,
    ) -> Self {
        Self {
            location: location.into(),
            character1: character1.into(),
            dialogue1: dialogue1.into(),
            character2: None,
            dialogue2: None,
            prompt_type: default_prompt_type(),
        }
    }

    /// Add a second speaker and their line.
    pub fn with_second(
        mut self,
        character2: impl Into<String>,
        dialogue2: Option<String>,
    ) -> Self {
        self.character2 = Some(character2.into());
        self.dialogue2 = dialogue2;
        self
    }

    pub fn with_prompt_type(mut self, prompt_type: impl Into<String>) -> Self {
        self.prompt_type = prompt_type.into();
        self
    }

    /// Second character, treating blank input as absent.
    pub fn second_character(&self) -> Option<&str> {
        non_blank(self.character2.as_deref())
    }

    /// Second dialogue line, treating blank input as absent.
    pub fn second_dialogue(&self) -> Option<&str> {
        non_blank(self.dialogue2.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
