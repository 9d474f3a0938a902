use crate::config::generate::generate_starter_config;
use std::fs;
use std::path::PathBuf;

pub fn init(stdout: bool) -> Result<(), Box<dyn std::error::Error>> {
    let config_content = generate_starter_config();

    if stdout {
        print!("{}", config_content);
        return Ok(());
    }

    let config_path = crate::config::user_config_path()
        .unwrap_or_else(|| PathBuf::from("/etc/logreceiver/config.yml"));

    if config_path.exists() {
        eprintln!(
            "Error: Config file already exists at {}",
            config_path.display()
        );
        eprintln!("Remove it first or use --stdout to print the config");
        std::process::exit(1);
    }

    if let Some(parent) = config_path.parent() {
        fs::create_dir_all(parent)?;
    }

    fs::write(&config_path, config_content)?;

    println!("Config file written to {}", config_path.display());
    Ok(())
}

pub fn validate(config_path: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    match &config_path {
        Some(path) => println!("Validating config file: {}", path.display()),
        None => println!("No config file found, validating defaults and environment"),
    }

    match crate::config::load_config(config_path.as_deref()) {
        Ok(config) => {
            println!("✓ Config is valid");
            println!("  listen:       {}", config.web.listen);
            println!("  app log:      {}", config.app_log_path().display());
            println!("  received log: {}", config.received_log_path().display());
            Ok(())
        }
        Err(e) => {
            eprintln!("✗ Config validation failed:\n{}", e);
            std::process::exit(1);
        }
    }
}
