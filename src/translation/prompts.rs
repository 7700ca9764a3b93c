//! Compile-time prompt template table (§9).
//!
//! "Reflection-based dynamic dispatch of prompt templates → prompt
//! templates are compile-time data indexed by {source_lang, target_lang,
//! purpose}; unsupported pairs fall back to a generic English-scaffolded
//! template."

/// What a prompt is being built for; each purpose gets a distinct
/// register and reasoning-effort hint (§6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Purpose {
    Realtime,
    History,
    Summary,
    Vocabulary,
    Report,
}

/// Minimal directory of language display names for natural-sounding
/// scaffolded prompts. Codes outside this table fall back to the raw
/// BCP-47-ish code string, which is still a valid (if blunter) prompt.
fn display_name(code: &str) -> &str {
    match code {
        "en" => "English",
        "ja" => "Japanese",
        "es" => "Spanish",
        "fr" => "French",
        "de" => "German",
        "zh" => "Chinese",
        "ko" => "Korean",
        "pt" => "Portuguese",
        other => other,
    }
}

/// Build the system prompt for a given source/target pair and purpose.
/// Every pair is "supported" in the sense that the generic scaffold
/// always produces a valid prompt; known pairs get phrasing tuned for
/// lecture-style content.
pub fn system_prompt(source_lang: &str, target_lang: &str, purpose: Purpose) -> String {
    let source = display_name(source_lang);
    let target = display_name(target_lang);

    match purpose {
        Purpose::Realtime => format!(
            "You are a simultaneous interpreter translating a live lecture from {source} to {target}. \
             Translate the given fragment as it streams in. Output only the {target} translation, \
             nothing else: no commentary, no alternatives, no explanation of your reasoning."
        ),
        Purpose::History => format!(
            "You are producing the definitive {target} translation of a completed sentence or \
             paragraph originally spoken in {source}, for a permanent lecture transcript. Favor \
             fidelity and natural {target} phrasing over speed. Output only the {target} translation."
        ),
        Purpose::Summary => format!(
            "Summarize the following {source} lecture excerpt concisely, preserving key claims, \
             terminology, and structure. Output only the {source} summary."
        ),
        Purpose::Vocabulary => format!(
            "Extract up to 10 salient technical or domain-specific terms from the following {source} \
             lecture excerpt. Respond with a JSON array of objects, each with \"term\", \"definition\", \
             and optionally \"context\" fields. Output only the JSON array."
        ),
        Purpose::Report => "Compose a polished Markdown report from the supplied lecture transcript, \
             summaries, and vocabulary list. Use headings, a narrative summary section, and a glossary \
             section. Output only the Markdown document."
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_pair_uses_display_names() {
        let prompt = system_prompt("en", "ja", Purpose::Realtime);
        assert!(prompt.contains("English"));
        assert!(prompt.contains("Japanese"));
    }

    #[test]
    fn unknown_pair_falls_back_to_raw_code() {
        let prompt = system_prompt("xx", "yy", Purpose::History);
        assert!(prompt.contains("xx"));
        assert!(prompt.contains("yy"));
    }
}
