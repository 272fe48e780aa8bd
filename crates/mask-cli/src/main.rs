//! maskstore: MaskStore command-line interface
//!
//! Commands:
//!   key show            - run key setup; prints the vault key exactly once
//!   put <file>          - encrypt a file locally and pin it
//!   note <text>         - encrypt a short text note and pin it
//!   get <cid>           - fetch, decrypt, and save/preview an entry
//!   ls                  - list the vault ledger (most recent 5 entries)
//!   reset --yes         - wipe key state and ledger (orphans sealed content)
//!   config show         - display the active configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use secrecy::{ExposeSecret, SecretString};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use mask_core::config::MaskConfig;
use mask_core::types::PreviewKind;
use mask_storage::{JsonFileStore, Operator};
use mask_vault::{KeyVault, ProgressFn, VaultLedger};

// ── CLI structure ─────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "maskstore",
    version,
    about = "MaskStore client-side encrypted vault",
    long_about = "maskstore: seal files and notes locally with AES-256-GCM and pin the \
                  ciphertext to a content-addressable store. The key never leaves this machine."
)]
struct Cli {
    /// Path to maskstore.toml configuration file
    #[arg(long, short = 'c', env = "MASKSTORE_CONFIG", default_value = "maskstore.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Vault key management
    Key {
        #[command(subcommand)]
        action: KeyAction,
    },

    /// Encrypt a local file and pin it to the store
    ///
    /// Credentials are read from AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY
    /// environment variables.
    Put {
        /// Local file to seal (10 MiB max)
        file: PathBuf,
        /// Display name recorded in the ledger (default: file name)
        #[arg(long)]
        name: Option<String>,
        /// MIME type recorded in the ledger (default: guessed from extension)
        #[arg(long)]
        mime: Option<String>,
    },

    /// Encrypt a short text note and pin it to the store
    Note {
        /// Note text (5000 characters max)
        text: String,
        /// Optional codename for the note (default: timestamp-derived)
        #[arg(long)]
        name: Option<String>,
    },

    /// Fetch an entry by CID and decrypt it with a supplied key
    Get {
        /// Content identifier of the sealed entry
        cid: String,
        /// Base64 decryption key (prompted for if omitted)
        #[arg(long)]
        key: Option<String>,
        /// Write decrypted content here (default: ledger name in cwd)
        #[arg(long, short = 'o')]
        output: Option<PathBuf>,
    },

    /// List the vault ledger
    Ls,

    /// Wipe key state and ledger. Everything sealed so far becomes
    /// permanently unreadable unless you kept the key.
    Reset {
        /// Confirm the wipe
        #[arg(long)]
        yes: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum KeyAction {
    /// Generate the vault key if needed and show it (first run only)
    Show,
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();
    let cli = Cli::parse();
    let config = MaskConfig::load(&cli.config)?;

    match cli.command {
        Commands::Key { action: KeyAction::Show } => cmd_key_show(&config),
        Commands::Put { file, name, mime } => {
            cmd_put(&config, &file, name.as_deref(), mime.as_deref()).await
        }
        Commands::Note { text, name } => cmd_note(&config, &text, name.as_deref()).await,
        Commands::Get { cid, key, output } => {
            cmd_get(&config, &cid, key, output.as_deref()).await
        }
        Commands::Ls => cmd_ls(&config),
        Commands::Reset { yes } => cmd_reset(&config, yes),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &cli.config),
    }
}

fn init_logging() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

// ── Shared wiring ─────────────────────────────────────────────────────────────

type Store = Arc<Mutex<JsonFileStore>>;

fn open_state(config: &MaskConfig) -> Result<Store> {
    let store = JsonFileStore::open(&config.vault.state_file).with_context(|| {
        format!("opening vault state: {}", config.vault.state_file.display())
    })?;
    Ok(Arc::new(Mutex::new(store)))
}

/// Build an OpenDAL operator using credentials from environment variables.
///
/// Reads AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY (standard S3 env vars).
fn build_operator_from_env(config: &MaskConfig) -> Result<Operator> {
    let access_key = std::env::var("AWS_ACCESS_KEY_ID")
        .or_else(|_| std::env::var("MASKSTORE_ACCESS_KEY_ID"))
        .context(
            "store credentials not set\n\
             Set AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY environment variables.\n\
             Example:\n\
             \texport AWS_ACCESS_KEY_ID=your-key\n\
             \texport AWS_SECRET_ACCESS_KEY=your-secret",
        )?;
    let secret_key = std::env::var("AWS_SECRET_ACCESS_KEY")
        .or_else(|_| std::env::var("MASKSTORE_SECRET_ACCESS_KEY"))
        .context("AWS_SECRET_ACCESS_KEY environment variable not set")?;

    mask_storage::operator::build_from_config(&config.storage, &access_key, &secret_key)
        .context("building storage operator")
}

/// Run key setup and, on a first run, print the one-time disclosure.
/// Returns the encryption key handle either way.
fn ensure_and_load_key(keyvault: &KeyVault<JsonFileStore>) -> Result<mask_crypto::VaultKey> {
    if let Some(disclosed) = keyvault.ensure_key()? {
        print_disclosure(&disclosed);
    }
    Ok(keyvault.load_key_for_encryption()?)
}

fn print_disclosure(disclosed: &SecretString) {
    println!();
    println!("─── DECRYPTION KEY ─────────────────────────────────────────");
    println!("{}", disclosed.expose_secret());
    println!("────────────────────────────────────────────────────────────");
    println!("Copy and secure this key offline. It is shown ONCE and is the");
    println!("only way to reopen content sealed in this vault. There is no");
    println!("recovery path.");
    println!();
}

fn make_progress_bar(prefix: &str) -> ProgressBar {
    let pb = ProgressBar::new(100);
    pb.set_style(
        ProgressStyle::with_template("{prefix:.bold} [{bar:40.cyan/blue}] {pos}%")
            .unwrap()
            .progress_chars("=>-"),
    );
    pb.set_prefix(prefix.to_string());
    pb
}

fn percent_progress(pb: &ProgressBar) -> ProgressFn {
    let pb = pb.clone();
    Box::new(move |pct| pb.set_position(u64::from(pct)))
}

/// Guess a MIME type from the file extension. The declared type only picks
/// a preview strategy later, so an octet-stream fallback is always safe.
fn mime_for_path(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("txt") | Some("md") | Some("log") => "text/plain",
        Some("csv") => "text/csv",
        Some("html") | Some("htm") => "text/html",
        Some("json") => "application/json",
        Some("pdf") => "application/pdf",
        Some("png") => "image/png",
        Some("jpg") | Some("jpeg") => "image/jpeg",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        Some("svg") => "image/svg+xml",
        _ => "application/octet-stream",
    }
}

// ── `maskstore key show` ──────────────────────────────────────────────────────

fn cmd_key_show(config: &MaskConfig) -> Result<()> {
    let keyvault = KeyVault::new(open_state(config)?);

    match keyvault.ensure_key()? {
        Some(disclosed) => print_disclosure(&disclosed),
        None => {
            println!("The vault key was already shown once; it will not be shown again.");
            println!("If the key is lost or compromised, `maskstore reset --yes` wipes the");
            println!("vault and generates a fresh key on next use.");
        }
    }
    Ok(())
}

// ── `maskstore put` ───────────────────────────────────────────────────────────

async fn cmd_put(
    config: &MaskConfig,
    file: &Path,
    name: Option<&str>,
    mime: Option<&str>,
) -> Result<()> {
    let payload = std::fs::read(file).with_context(|| format!("reading {}", file.display()))?;

    let name = name.map(str::to_string).unwrap_or_else(|| {
        file.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "file".to_string())
    });
    let mime = mime.map(str::to_string).unwrap_or_else(|| mime_for_path(file).to_string());

    let store = open_state(config)?;
    let keyvault = KeyVault::new(Arc::clone(&store));
    let ledger = VaultLedger::new(store);
    let key = ensure_and_load_key(&keyvault)?;
    let op = build_operator_from_env(config)?;

    let pb = make_progress_bar("seal");
    let progress = percent_progress(&pb);

    let cid = mask_vault::upload_bytes(
        &op,
        &config.storage.prefix,
        &ledger,
        &key,
        &payload,
        &name,
        &mime,
        Some(&progress),
    )
    .await?;

    pb.finish_and_clear();
    println!("Sealed {} ({} bytes)", name, payload.len());
    println!("  type: {mime}");
    println!("  cid:  {cid}");
    Ok(())
}

// ── `maskstore note` ──────────────────────────────────────────────────────────

async fn cmd_note(config: &MaskConfig, text: &str, name: Option<&str>) -> Result<()> {
    if text.trim().is_empty() {
        anyhow::bail!("note is empty — nothing to seal");
    }

    let store = open_state(config)?;
    let keyvault = KeyVault::new(Arc::clone(&store));
    let ledger = VaultLedger::new(store);
    let key = ensure_and_load_key(&keyvault)?;
    let op = build_operator_from_env(config)?;

    let pb = make_progress_bar("seal");
    let progress = percent_progress(&pb);

    let cid = mask_vault::upload_note(
        &op,
        &config.storage.prefix,
        &ledger,
        &key,
        text,
        name,
        Some(&progress),
    )
    .await?;

    pb.finish_and_clear();
    println!("Note sealed.");
    println!("  cid: {cid}");
    Ok(())
}

// ── `maskstore get` ───────────────────────────────────────────────────────────

async fn cmd_get(
    config: &MaskConfig,
    cid: &str,
    key: Option<String>,
    output: Option<&Path>,
) -> Result<()> {
    let operator_key = match key {
        Some(k) => SecretString::from(k),
        None => SecretString::from(
            rpassword::prompt_password("Vault key: ").context("reading key from terminal")?,
        ),
    };

    let store = open_state(config)?;
    let ledger = VaultLedger::new(store);
    let op = build_operator_from_env(config)?;

    let retrieved =
        mask_vault::retrieve(&op, &config.storage.prefix, &ledger, cid, &operator_key).await?;

    println!(
        "Unlocked {} ({}, {} bytes)",
        retrieved.name,
        retrieved.mime,
        retrieved.plaintext.len()
    );

    match (output, retrieved.preview) {
        // Text previews print straight to the terminal unless redirected
        (None, PreviewKind::Text) => {
            println!();
            println!("{}", String::from_utf8_lossy(retrieved.plaintext.as_bytes()));
        }
        (dest, preview) => {
            let path = dest
                .map(Path::to_path_buf)
                .unwrap_or_else(|| sanitized_file_name(&retrieved.name));
            std::fs::write(&path, retrieved.plaintext.as_bytes())
                .with_context(|| format!("writing {}", path.display()))?;
            println!("  saved: {}", path.display());
            if preview == PreviewKind::Download {
                println!("  (no inline preview for this type)");
            }
        }
    }
    Ok(())
}

/// Reduce a ledger-supplied name to a bare file name for writing into the
/// current directory. Entry names come from persisted state, not from this
/// invocation's arguments; one carrying path components must not steer the
/// write outside the directory the user ran the command in.
fn sanitized_file_name(name: &str) -> PathBuf {
    match Path::new(name).file_name() {
        Some(base) => PathBuf::from(base),
        None => PathBuf::from("decrypted_file"),
    }
}

// ── `maskstore ls` ────────────────────────────────────────────────────────────

fn cmd_ls(config: &MaskConfig) -> Result<()> {
    let store = open_state(config)?;
    let ledger = VaultLedger::new(store);
    let entries = ledger.list()?;

    if entries.is_empty() {
        println!("No stored items yet. Seal something with `maskstore put` or `maskstore note`.");
        return Ok(());
    }

    println!("{} of {} ledger slots used", entries.len(), mask_vault::LEDGER_CAP);
    println!();
    for entry in entries {
        println!("{}", entry.name);
        println!("  type: {}", entry.mime);
        println!("  cid:  {}", entry.cid);
    }
    Ok(())
}

// ── `maskstore reset` ─────────────────────────────────────────────────────────

fn cmd_reset(config: &MaskConfig, yes: bool) -> Result<()> {
    if !yes {
        anyhow::bail!(
            "reset wipes the vault key and ledger; previously sealed content \
             becomes unreadable unless you kept the key. Re-run with --yes to confirm."
        );
    }

    let store = open_state(config)?;
    let keyvault = KeyVault::new(Arc::clone(&store));
    let ledger = VaultLedger::new(store);

    ledger.clear()?;
    keyvault.reset()?;

    println!("Vault state cleared. A fresh key will be generated on next use.");
    Ok(())
}

// ── `maskstore config show` ───────────────────────────────────────────────────

fn cmd_config_show(config: &MaskConfig, path: &Path) -> Result<()> {
    println!("# config file: {}", path.display());
    let rendered = toml::to_string_pretty(config).context("rendering config")?;
    println!("{rendered}");
    Ok(())
}
