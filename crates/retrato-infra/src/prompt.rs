//! Interview script loading.
//!
//! The interviewer persona ships inside the binary; `interview.system_prompt_file`
//! swaps it for a file on disk without a rebuild.

use retrato_core::interview::service::InterviewScript;
use retrato_types::config::InterviewConfig;

/// Persona prompt compiled into the binary.
pub const BUNDLED_SYSTEM_PROMPT: &str = include_str!("../../../assets/samantha_prompt.md");

/// Build the interview script from configuration.
///
/// A configured prompt file that cannot be read is a startup error, not a
/// silent fallback to the bundled persona.
pub async fn load_interview_script(config: &InterviewConfig) -> std::io::Result<InterviewScript> {
    let system_prompt = match &config.system_prompt_file {
        Some(path) => {
            let prompt = tokio::fs::read_to_string(path).await.map_err(|e| {
                std::io::Error::new(
                    e.kind(),
                    format!("failed to read system prompt {}: {e}", path.display()),
                )
            })?;
            tracing::info!("Using system prompt from {}", path.display());
            prompt
        }
        None => BUNDLED_SYSTEM_PROMPT.to_string(),
    };

    Ok(InterviewScript {
        system_prompt,
        opening_instruction: config.opening_instruction.clone(),
        opening_record: config.opening_record.clone(),
    })
}
