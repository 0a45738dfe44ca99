//! Deterministic prompt used when every remote provider is down.

use super::request::PromptFields;

/// Closing line every Veo prompt must carry.
pub const AUDIO_NOTE: &str = "✅ Note that output audio must be in burmese language.";

/// Assemble a prompt from `fields` without any remote call.
///
/// The interview clause and the reply line only appear when a second
/// character is present (the reply line additionally needs a second dialogue).
pub fn local_prompt(fields: &PromptFields) -> String {
    let mut prompt = format!("✅ At {}\n\n", fields.location);

    match fields.second_character() {
        Some(character2) => {
            prompt.push_str(&format!(
                "✅ {} interviews {}.\n\n",
                fields.character1, character2
            ));
        }
        None => prompt.push_str(&format!("✅ {}\n\n", fields.character1)),
    }

    prompt.push_str(&format!(
        "✅ {} asks *in a clear Burmese language* \"{}\"\n\n",
        first_name(&fields.character1),
        fields.dialogue1
    ));

    if let (Some(character2), Some(dialogue2)) = (fields.second_character(), fields.second_dialogue())
    {
        prompt.push_str(&format!(
            "✅ {} replies *in clear Burmese language* \"{}\"\n\n",
            first_name(character2),
            dialogue2
        ));
    }

    prompt.push_str(AUDIO_NOTE);
    prompt
}

/// First whitespace-separated word of a character description.
fn first_name(description: &str) -> &str {
    description.split_whitespace().next().unwrap_or(description)
}
