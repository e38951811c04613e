use fund_terminology_assistant::{
    completion::generator_from_config,
    config::AppConfig,
    conversational::{ChatSession, SUGGESTED_QUERIES},
    glossary::Glossary,
    memory::Message,
    reconciler::AnswerReconciler,
};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::info;
use tracing_subscriber::EnvFilter;

fn print_reply(message: &Message) {
    println!("\nassistant> {}", message.text);

    if let Some(entry) = &message.attached_definition {
        println!("  ✓ Verified Definition: {} [{}]", entry.term, entry.category);
        println!("    {}", entry.definition);
    }

    if !message.matched_terms.is_empty() {
        println!("  Related terms: {}", message.matched_terms.join(", "));
    }

    if message.is_error {
        println!("  ⚠ Error occurred");
    }

    println!("  ({})\n", message.created_at.format("%H:%M:%S"));
}

fn print_suggestions() {
    println!("Try asking about:");
    for query in SUGGESTED_QUERIES {
        println!("  - {}", query);
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv::dotenv().ok();

    // Keep the prompt readable: only warnings unless RUST_LOG says otherwise
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let config = AppConfig::from_env()?;
    let glossary = Glossary::load(config.glossary_path.as_deref())?;
    let generator = generator_from_config(&config)?;

    if generator.is_none() {
        println!("To enable AI responses, set GROQ_API_KEY (get a key at https://console.groq.com/keys).");
    }

    let reconciler = AnswerReconciler::new(glossary, generator)
        .with_timeout(config.completion_timeout);
    let mut session = ChatSession::new(Arc::new(reconciler));

    info!("Terminal chat started");

    if let Some(welcome) = session.log().all().first() {
        print_reply(welcome);
    }
    print_suggestions();
    println!("Commands: /suggest, /quit\n");

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    while let Some(line) = lines.next_line().await? {
        let input = line.trim();

        match input {
            "" => continue,
            "/quit" | "/exit" => break,
            "/suggest" => {
                print_suggestions();
                continue;
            }
            _ => {}
        }

        // The next line is only read once this reply is in the log
        let reply = session.send(input).await?;
        print_reply(reply);
    }

    info!(messages = session.log().len(), "Terminal chat ended");
    Ok(())
}
