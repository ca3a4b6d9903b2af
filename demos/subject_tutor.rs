//! Ask a subject tutor a question and print the formatted HTML answer.

use std::sync::Arc;

use olevel_tutor::tutor::{subjects, EducationLevel, TutorSession};
use olevel_tutor::{GeminiProvider, GenerationConfig, GenerativeModel, ModelName};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("GEMINI_API_KEY")?;

    let provider = GeminiProvider::new(api_key)?;
    let model = GenerativeModel::new(Arc::new(provider), ModelName::default().as_str())
        .with_generation_config(GenerationConfig::tutor_defaults());

    let level = EducationLevel::OLevel;
    println!("Subjects at {}: {}", level.display_name(), subjects(level).join(", "));

    let tutor = TutorSession::new(model, level, "Combined Science (Physics/Chemistry)")?;
    let html = tutor
        .ask("Why does an ionic compound conduct electricity only when molten or dissolved?")
        .await?;
    println!("{html}");

    Ok(())
}
