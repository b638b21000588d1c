use std::fmt;

/// Represents the provider (backend) used for large language model (LLM) inference.
///
/// This enum distinguishes between different backends such as local Ollama,
/// OpenAI's API, or any other supported provider.
///
/// Adding more providers in the future (e.g., Anthropic Claude, Mistral API)
/// can be done by extending this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LlmProvider {
    /// Local Ollama runtime for on-device inference.
    Ollama,
    /// OpenAI's chat completions API.
    OpenAI,
}

impl fmt::Display for LlmProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LlmProvider::Ollama => write!(f, "Ollama"),
            LlmProvider::OpenAI => write!(f, "OpenAI"),
        }
    }
}
