mod config;

use std::future::Future;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use chrono::{DateTime, Local};
use clap::Parser;
use mdnote_backup_core::{
    backup_name, parse_backup_name, split_document_name, BackupError, EndpointConfig,
};
use mdnote_backup_webdav::settings::{
    default_cache_dir, default_config_path, load_config, save_config, validate_endpoint,
};
use mdnote_backup_webdav::{webdav_client, WebDavBackupClient};
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::{Command, Config};

#[tokio::main]
async fn main() -> ExitCode {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = Config::parse();

    match run(config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            match e.downcast_ref::<BackupError>() {
                Some(err) if err.requires_configuration() => {
                    eprintln!("WebDAV is not configured yet.");
                    eprintln!(
                        "Run: mdnote-backup configure --url <URL> --username <USER> --password <PASSWORD>"
                    );
                }
                _ => eprintln!("Error: {:#}", e),
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(config: Config) -> anyhow::Result<()> {
    let config_path = config.config_path.unwrap_or_else(default_config_path);
    let cache_dir = config.cache_dir.unwrap_or_else(default_cache_dir);
    let timeout = Duration::from_secs(config.timeout_secs);

    match config.command {
        Command::Configure {
            url,
            username,
            password,
            remote_dir,
        } => configure(&config_path, url, username, password, remote_dir),
        Command::ShowConfig => {
            show_config(&config_path, &load_config(&config_path));
            Ok(())
        }
        Command::List => {
            let (client, endpoint) = connect(&config_path, timeout)?;
            list(client, endpoint).await
        }
        Command::Backup { file } => {
            let (client, endpoint) = connect(&config_path, timeout)?;
            backup(client, endpoint, &file).await
        }
        Command::Restore { name } => {
            let (client, endpoint) = connect(&config_path, timeout)?;
            restore(client, endpoint, name, cache_dir).await
        }
    }
}

fn connect(
    config_path: &Path,
    timeout: Duration,
) -> anyhow::Result<(Arc<WebDavBackupClient>, Arc<EndpointConfig>)> {
    let endpoint = load_config(config_path);
    info!("Using WebDAV endpoint {}", endpoint.effective_base_url());
    let client = webdav_client(timeout)?;
    Ok((Arc::new(client), Arc::new(endpoint)))
}

/// Run an operation on its own task and wait for the result.
async fn in_background<F, T>(operation: F) -> anyhow::Result<T>
where
    F: Future<Output = mdnote_backup_core::Result<T>> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::spawn(operation)
        .await
        .context("Background task failed")?;
    Ok(result?)
}

fn configure(
    path: &Path,
    url: String,
    username: String,
    password: String,
    remote_dir: String,
) -> anyhow::Result<()> {
    let endpoint = EndpointConfig::new(url, username, password).with_remote_dir(remote_dir);
    validate_endpoint(&endpoint)?;

    save_config(path, &endpoint)?;
    info!("Saved WebDAV config to {}", path.display());
    println!("Backups will go to {}", endpoint.effective_base_url());
    Ok(())
}

fn show_config(path: &Path, endpoint: &EndpointConfig) {
    let password = if endpoint.password.is_empty() {
        "(not set)"
    } else {
        "********"
    };
    println!("config file: {}", path.display());
    println!("url:         {}", endpoint.base_url);
    println!("username:    {}", endpoint.username);
    println!("password:    {}", password);
    println!("remote_dir:  {}", endpoint.remote_dir);
    if endpoint.is_configured() {
        println!("backups at:  {}", endpoint.effective_base_url());
    }
}

async fn list(client: Arc<WebDavBackupClient>, endpoint: Arc<EndpointConfig>) -> anyhow::Result<()> {
    let url = endpoint.effective_base_url();
    let documents = in_background(async move { client.list_documents(&endpoint).await }).await?;

    if documents.is_empty() {
        println!("No Markdown backups found at {}", url);
        return Ok(());
    }

    for document in &documents {
        match parse_backup_name(&document.display_name) {
            Some(backup) => println!(
                "{}\t{}\t{}",
                document.display_name,
                backup.stem,
                backup.timestamp.format("%Y-%m-%d %H:%M:%S")
            ),
            None => println!("{}", document.display_name),
        }
    }
    info!("{} backups at {}", documents.len(), url);
    Ok(())
}

async fn backup(
    client: Arc<WebDavBackupClient>,
    endpoint: Arc<EndpointConfig>,
    file: &Path,
) -> anyhow::Result<()> {
    let content = tokio::fs::read(file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;
    let now = Local::now();
    let (file_name, name) = backup_target(file, &now)?;

    let remote = in_background(async move {
        client
            .backup_document(&endpoint, &file_name, &content, now)
            .await
    })
    .await?;

    println!("Backed up {} as {}", file.display(), name);
    println!("{}", remote);
    Ok(())
}

/// The file name to back up and the remote name it will get at `now`.
fn backup_target(file: &Path, now: &DateTime<Local>) -> anyhow::Result<(String, String)> {
    let file_name = file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .with_context(|| format!("{} has no file name", file.display()))?;
    let (stem, extension) = split_document_name(&file_name);
    let name = backup_name(stem, extension, now);
    Ok((file_name, name))
}

async fn restore(
    client: Arc<WebDavBackupClient>,
    endpoint: Arc<EndpointConfig>,
    name: String,
    cache_dir: PathBuf,
) -> anyhow::Result<()> {
    let restored =
        in_background(async move { client.restore(&endpoint, &name, &cache_dir).await }).await?;

    println!(
        "Restored {} bytes to {}",
        restored.content.len(),
        restored.cache_path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_backup_target_names() {
        let now = Local.with_ymd_and_hms(2024, 1, 2, 3, 4, 5).unwrap();

        let (file_name, name) = backup_target(Path::new("/home/me/notes.md"), &now).unwrap();
        assert_eq!(file_name, "notes.md");
        assert_eq!(name, "notes_20240102030405.md");

        let (_, name) = backup_target(Path::new("todo"), &now).unwrap();
        assert_eq!(name, "todo_20240102030405");

        assert!(backup_target(Path::new("/"), &now).is_err());
    }

    #[test]
    fn test_configure_rejects_bad_url_without_saving() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("webdav_config.json");

        let result = configure(
            &path,
            "not a url".to_string(),
            "alice".to_string(),
            "secret".to_string(),
            String::new(),
        );

        assert!(result.is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_configure_saves_valid_endpoint() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("webdav_config.json");

        configure(
            &path,
            "https://dav.example.com/webdav/".to_string(),
            "alice".to_string(),
            "secret".to_string(),
            "notes".to_string(),
        )
        .unwrap();

        let saved = load_config(&path);
        assert_eq!(saved.base_url, "https://dav.example.com/webdav/");
        assert_eq!(saved.effective_base_url(), "https://dav.example.com/webdav/notes");
    }
}
