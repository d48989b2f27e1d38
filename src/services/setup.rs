use crate::core::config::Config;
use anyhow::{bail, Result};
use inquire::{Password, Text};

const GEMINI_KEY_ENV: &str = "GEMINI_API_KEY";

/// Fills in missing provider credentials, prompting when interactive.
pub fn run_setup(config: &mut Config) -> Result<()> {
    let mut needs_save = false;
    let unattended = config.unattended;
    let provider = config.llm.provider.clone();

    match provider.as_str() {
        "gemini" => {
            let cfg = config.llm.gemini.get_or_insert_with(Default::default);
            if cfg.api_key.trim().is_empty() {
                if let Ok(key) = std::env::var(GEMINI_KEY_ENV) {
                    cfg.api_key = key;
                } else {
                    require_interactive(unattended, "llm.gemini.api_key")?;
                    cfg.api_key = Password::new("Gemini API key:")
                        .without_confirmation()
                        .prompt()?;
                    needs_save = true;
                }
            }
        }
        "openai" => {
            let cfg = config.llm.openai.get_or_insert_with(Default::default);
            if cfg.api_key.trim().is_empty() {
                require_interactive(unattended, "llm.openai.api_key")?;
                cfg.api_key = Password::new("OpenAI API key:")
                    .without_confirmation()
                    .prompt()?;
                needs_save = true;
            }
            if cfg.model.trim().is_empty() {
                require_interactive(unattended, "llm.openai.model")?;
                cfg.model = Text::new("OpenAI model:")
                    .with_default("gpt-4o-mini")
                    .prompt()?;
                needs_save = true;
            }
        }
        "ollama" => {
            let cfg = config.llm.ollama.get_or_insert_with(Default::default);
            if cfg.model.trim().is_empty() {
                require_interactive(unattended, "llm.ollama.model")?;
                cfg.model = Text::new("Ollama model:").prompt()?;
                needs_save = true;
            }
        }
        other => bail!("Unknown LLM provider: {}", other),
    }

    if needs_save {
        config.save()?;
        println!("Configuration saved.");
    }

    Ok(())
}

fn require_interactive(unattended: bool, key: &str) -> Result<()> {
    if unattended {
        bail!("`{}` is not set in config.yml and unattended mode cannot prompt for it", key);
    }
    Ok(())
}
