//! Instruction templates for the rewriting stage

use serde::{Deserialize, Serialize};

const FINALIZATION: &str = include_str!("../../../prompts/finalization.txt");
const DIRECT_REDACTION: &str = include_str!("../../../prompts/direct_redaction.txt");

/// Slot the document text is interpolated into
const TEXT_SLOT: &str = "{text}";

/// Which instruction template the rewriter is given
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PromptTemplate {
    /// Input already carries entity placeholders; replace them with
    /// consistent fictitious values and repair leftovers
    Finalization,

    /// Only pattern placeholders are present; redact everything else directly
    DirectRedaction,
}

impl PromptTemplate {
    /// Raw template text
    pub fn template(&self) -> &'static str {
        match self {
            Self::Finalization => FINALIZATION,
            Self::DirectRedaction => DIRECT_REDACTION,
        }
    }

    /// Build the prompt for `text`
    pub fn render(&self, text: &str) -> String {
        self.template().replacen(TEXT_SLOT, text, 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_templates_have_single_slot() {
        for template in [PromptTemplate::Finalization, PromptTemplate::DirectRedaction] {
            assert_eq!(template.template().matches(TEXT_SLOT).count(), 1);
        }
    }

    #[test]
    fn test_render_interpolates_text_once() {
        // Braces in the document must survive untouched
        let text = "Истец [ЛИЦО-1] {text} тел. [ТЕЛЕФОН]";
        let prompt = PromptTemplate::Finalization.render(text);

        assert!(prompt.ends_with(text));
        assert!(!prompt.starts_with(text));
    }

    #[test]
    fn test_templates_differ() {
        let text = "[ЛИЦО-1]";
        assert_ne!(
            PromptTemplate::Finalization.render(text),
            PromptTemplate::DirectRedaction.render(text)
        );
        assert!(PromptTemplate::Finalization.template().contains("[ЛИЦО-N]"));
    }
}
