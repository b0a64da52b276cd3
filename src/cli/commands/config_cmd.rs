//! Configuration management commands.

use std::path::Path;

use console::style;

use crate::config::{Config, Credentials};

/// Store credentials and the host they belong to.
pub async fn cmd_set_credentials(
    mut config: Config,
    path: &Path,
    client_id: String,
    client_secret: String,
    host: Option<String>,
) -> anyhow::Result<()> {
    if let Some(host) = &host {
        let parsed = url::Url::parse(host)
            .map_err(|e| anyhow::anyhow!("Invalid host URL '{}': {}", host, e))?;
        if parsed.scheme() != "https" && parsed.scheme() != "http" {
            anyhow::bail!("Host must be an http(s) URL: {}", host);
        }
    }

    config.credentials = Some(Credentials {
        client_id,
        client_secret,
    });
    if host.is_some() {
        config.ocean_host = host;
    }
    config.save(path).await?;

    println!(
        "{} Credentials saved to {}",
        style("✓").green(),
        path.display()
    );

    Ok(())
}

/// Persist the output-directory preference.
pub async fn cmd_set_output_dir(
    mut config: Config,
    path: &Path,
    dir: &Path,
) -> anyhow::Result<()> {
    config.output_dir = Some(dir.display().to_string());
    config.save(path).await?;

    println!(
        "{} Output directory set to {}",
        style("✓").green(),
        dir.display()
    );

    Ok(())
}

/// Show the resolved configuration, secret redacted.
pub fn cmd_show(config: &Config) -> anyhow::Result<()> {
    let settings = config.settings();

    println!("\n{}", style("letterfetch configuration").bold());
    println!("{}", "-".repeat(40));
    println!("{:<18} {}", "Ocean host:", settings.ocean_host);
    println!(
        "{:<18} {}",
        "Output directory:",
        settings.output_dir.display()
    );
    println!(
        "{:<18} {} ms",
        "Request delay:",
        settings.request_delay.as_millis()
    );
    println!(
        "{:<18} {} s",
        "Request timeout:",
        settings.request_timeout.as_secs()
    );

    match config.credentials() {
        Some(credentials) => {
            println!("{:<18} {}", "Client ID:", credentials.client_id);
            println!("{:<18} (set)", "Client secret:");
        }
        None => println!(
            "{:<18} {}",
            "Credentials:",
            style("not configured").yellow()
        ),
    }

    if let Some(source) = &config.source_path {
        println!("{:<18} {}", "Config file:", source.display());
    }

    Ok(())
}
