use anyhow::Result;
use script2storyboard::core::config::Config;
use script2storyboard::core::io::NativeStorage;
use script2storyboard::services::llm::create_llm;
use script2storyboard::services::setup;
use script2storyboard::services::workflow::WorkflowManager;
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::init();

    // 1. Load Config
    let mut config = match Config::load() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Error loading config: {}", e);
            eprintln!("Please ensure 'config.yml' exists with valid LLM settings.");
            return Err(e);
        }
    };

    config.ensure_directories()?;

    // 2. Fill in missing credentials
    setup::run_setup(&mut config)?;

    // 3. Initialize LLM
    let llm = create_llm(&config.llm)?;

    // 4. Analyze every screenplay in the input folder
    let manager = WorkflowManager::new(config, llm, Arc::new(NativeStorage::new()));
    manager.run().await?;

    Ok(())
}
