//! Translate command implementation.

use crate::cli::preflight::{self, Operation};
use crate::cli::Output;
use crate::config::Settings;
use crate::translation::{OpenAiTranslator, Translator};
use anyhow::Result;

/// Run the translate command.
pub async fn run_translate(
    text: Option<String>,
    file: Option<String>,
    language: Option<String>,
    settings: Settings,
) -> Result<()> {
    if let Err(e) = preflight::check(Operation::Translate) {
        Output::error(&format!("{}", e));
        Output::info("Run 'tolk doctor' for detailed diagnostics.");
        return Err(e.into());
    }

    let text = read_text_input(text, file)?;
    let target = language.unwrap_or_else(|| settings.translation.default_target.clone());

    let translator = OpenAiTranslator::new(&settings.translation.model)?;

    let spinner = Output::spinner("Translating...");
    let translated = match translator.translate(&text, &target).await {
        Ok(t) => {
            spinner.finish_and_clear();
            t
        }
        Err(e) => {
            spinner.finish_and_clear();
            Output::error(&format!("Translation failed: {}", e));
            return Err(e.into());
        }
    };

    println!("{}", translated);

    Ok(())
}

/// Resolve the text argument: inline text, or the contents of --file.
fn read_text_input(text: Option<String>, file: Option<String>) -> Result<String> {
    match (text, file) {
        (Some(_), Some(_)) => Err(anyhow::anyhow!("Pass either TEXT or --file, not both")),
        (Some(text), None) => Ok(text),
        (None, Some(path)) => Ok(std::fs::read_to_string(&path)
            .map_err(|e| anyhow::anyhow!("Could not read {}: {}", path, e))?),
        (None, None) => Err(anyhow::anyhow!("Pass the text to translate, or --file")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_read_text_input_prefers_inline_text() {
        let text = read_text_input(Some("hei".to_string()), None).unwrap();
        assert_eq!(text, "hei");
    }

    #[test]
    fn test_read_text_input_rejects_both_sources() {
        let err = read_text_input(Some("hei".to_string()), Some("f.txt".to_string()));
        assert!(err.is_err());
    }

    #[test]
    fn test_read_text_input_requires_a_source() {
        assert!(read_text_input(None, None).is_err());
    }
}
