//! Init command - first-run setup.

use crate::cli::Output;
use crate::config::Settings;
use crate::orchestrator::Pipeline;
use console::style;
use std::io::{self, Write};

/// Run the init command: directories, config file and default collection.
pub async fn run_init(settings: &Settings) -> anyhow::Result<()> {
    Output::header("mampfsearch Setup");
    println!();

    println!("{}", style("Step 1: Setting up directories").bold().cyan());
    println!();

    let data_dir = settings.data_dir();
    if !data_dir.exists() {
        std::fs::create_dir_all(&data_dir)?;
        Output::success(&format!("Created data directory: {}", data_dir.display()));
    } else {
        Output::info(&format!("Data directory exists: {}", data_dir.display()));
    }

    println!();

    println!("{}", style("Step 2: Configuration file").bold().cyan());
    println!();

    let config_path = Settings::default_config_path();
    if config_path.exists() {
        Output::info(&format!("Config file exists: {}", config_path.display()));
    } else if prompt_continue("Create default configuration file?")? {
        settings.save_to(&config_path)?;
        Output::success(&format!("Created config file: {}", config_path.display()));
    } else {
        Output::info("Skipped config file creation. Using defaults.");
    }

    println!();

    println!("{}", style("Step 3: Default collection").bold().cyan());
    println!();

    let pipeline = Pipeline::new(settings.clone())?;
    let status = pipeline
        .ensure_collection(&settings.vector_store.collection)
        .await?;
    if status.created {
        Output::success(&format!("Created collection: {}", status.name));
    } else {
        Output::info(&format!("Collection exists: {}", status.name));
    }

    println!();
    println!("{}", style("Setup Complete!").bold().green());
    println!();
    println!("Next steps:");
    println!("  {} Check service reachability", style("mampfsearch doctor").cyan());
    println!(
        "  {} Index a lecture",
        style("mampfsearch ingest lecture.srt --course <id>").cyan()
    );
    println!("  {} Search it", style("mampfsearch search \"<query>\"").cyan());

    Ok(())
}

/// Prompt user for yes/no confirmation.
pub(crate) fn prompt_continue(message: &str) -> io::Result<bool> {
    print!("{} {} ", style("?").cyan(), message);
    print!("{} ", style("[y/N]").dim());
    io::stdout().flush()?;

    let mut input = String::new();
    io::stdin().read_line(&mut input)?;

    let answer = input.trim().to_lowercase();
    Ok(answer == "y" || answer == "yes")
}
