//! Multi-turn chat: the session keeps history between messages.

use std::sync::Arc;

use olevel_tutor::{GeminiProvider, GenerationConfig, GenerativeModel};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();
    let api_key = std::env::var("GEMINI_API_KEY")?;

    let model = GenerativeModel::new(Arc::new(GeminiProvider::new(api_key)?), "gemini-2.0-flash-exp")
        .with_generation_config(GenerationConfig::tutor_defaults().with_max_output_tokens(1024))
        .with_system_instruction("You are a patient O-Level English tutor.");

    let mut chat = model.start_chat(Vec::new());

    let first = chat.send_message("Give me one tip for summary writing.").await?;
    println!("Tutor: {}", first.text());

    let second = chat.send_message("Show me that tip applied to a short passage.").await?;
    println!("Tutor: {}", second.text());

    println!("({} turns in history)", chat.history().len());
    Ok(())
}
