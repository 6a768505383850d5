//! crates/health_assistant_core/src/prompts.rs
//!
//! The prompt composer: one deterministic template per request kind.
//!
//! Templates are plain string contracts. Escaping or encoding for a particular
//! model backend is the generative adapter's job, not this module's.

use crate::context::ContextFact;

/// Extracted document text beyond this many characters is cut before prompting.
pub const MAX_DOCUMENT_CHARS: usize = 1000;

const CARETAKER_PERSONA: &str = "You are a Virtual Caretaker for chronically ill patients in India.";
const MEDICINE_PERSONA: &str = "You are a medicine recommender for chronically ill patients in India.";
const SYMPTOM_PERSONA: &str = "You are a symptom checker for chronically ill patients in India.";
const DOCUMENT_PERSONA: &str = "You are a medical document assistant for patients in India.";

/// The inputs for one prompt.
#[derive(Debug, Clone, Copy)]
pub enum PromptInput<'a> {
    CaretakerChat {
        message: &'a str,
        context: &'a ContextFact,
    },
    MedicineRecommendation {
        problem: &'a str,
    },
    SymptomCheck {
        symptoms: &'a str,
    },
    /// Text extracted from a document. Truncated to [`MAX_DOCUMENT_CHARS`].
    DocumentText {
        text: &'a str,
    },
    /// The image itself travels as an attachment, so the prompt carries no body.
    DocumentImage,
}

/// Builds the instruction string for a request.
pub fn compose(input: PromptInput<'_>) -> String {
    match input {
        PromptInput::CaretakerChat { message, context } => format!(
            "{CARETAKER_PERSONA} \
             Context: {context}. \
             Respond to the user's query: '{message}'. \
             Provide empathetic, actionable health advice (e.g., rest, hydration, vegan diet tips) in the Indian context. \
             Use Hindi phrases like 'Dhyaan rakhein' if appropriate. \
             Support Hindi queries if provided. \
             Keep responses concise, safe, and include a disclaimer to consult a doctor."
        ),
        PromptInput::MedicineRecommendation { problem } => format!(
            "{MEDICINE_PERSONA} \
             Based on the health problem: '{problem}', recommend appropriate medicines \
             (use Indian drug names, e.g., Paracetamol, per CDSCO guidelines) and preventions (e.g., diet, rest). \
             Provide clear, safe recommendations and note that patients should consult a doctor."
        ),
        PromptInput::SymptomCheck { symptoms } => format!(
            "{SYMPTOM_PERSONA} \
             Based on symptoms: '{symptoms}', provide possible causes and suggested actions (e.g., consult a doctor, rest). \
             Use Indian medical context and include a disclaimer to consult a doctor."
        ),
        PromptInput::DocumentText { text } => format!(
            "{DOCUMENT_PERSONA} \
             Summarize this medical document for a patient in India: '{}'. \
             Highlight key points (e.g., prescribed medicines, diagnosis) in simple language.",
            truncate_chars(text, MAX_DOCUMENT_CHARS)
        ),
        PromptInput::DocumentImage => format!(
            "{DOCUMENT_PERSONA} \
             Analyze this medical image (e.g., prescription, lab report) for a patient in India. \
             Summarize key details (e.g., medicines, diagnosis) in simple language."
        ),
    }
}

/// Returns at most `max_chars` characters of `text`, never splitting a character.
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
