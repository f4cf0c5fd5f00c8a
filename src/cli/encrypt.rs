//! Encryption CLI commands and password prompting
//!
//! Provides commands for enabling, disabling, and inspecting at-rest
//! encryption of the SQLite database, plus the password prompts used when
//! an encrypted ledger is opened.

use clap::Subcommand;
use tracing::warn;

use crate::config::{LedgerPaths, Settings, StorageEngine};
use crate::crypto::{Envelope, SecureString};
use crate::error::{LedgerError, LedgerResult};
use crate::session::Session;

/// How many times a wrong password may be entered before giving up
pub const MAX_PASSWORD_ATTEMPTS: usize = 3;

/// Minimum length for a new password
const MIN_PASSWORD_LEN: usize = 8;

/// Encryption management commands
#[derive(Subcommand, Debug)]
pub enum EncryptCommands {
    /// Encrypt the SQLite database at rest
    Enable,

    /// Decrypt the database and stop encrypting it (requires the password)
    Disable,

    /// Show encryption status
    Status,
}

/// Handle encryption commands
pub fn handle_encrypt_command(
    paths: &LedgerPaths,
    settings: &Settings,
    cmd: EncryptCommands,
) -> LedgerResult<()> {
    match cmd {
        EncryptCommands::Enable => enable_encryption(paths, settings),
        EncryptCommands::Disable => disable_encryption(paths, settings),
        EncryptCommands::Status => show_status(paths, settings),
    }
}

/// Open a session, prompting for the password when encryption is enabled
pub fn open_session(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<Session> {
    if !settings.encryption_enabled {
        return Session::open(paths.clone(), settings.clone(), None);
    }

    let first_use = !settings.encrypted_database_path(paths).exists();
    with_password_retries(
        MAX_PASSWORD_ATTEMPTS,
        || {
            if first_use {
                println!("No encrypted ledger yet; choose a password to protect it.");
                prompt_new_password()
            } else {
                prompt_password("Ledger password: ")
            }
        },
        |password| Session::open(paths.clone(), settings.clone(), Some(password)),
    )
}

/// Ask for a password and try `open` with it, re-prompting on recoverable errors
pub fn with_password_retries<T, P, O>(attempts: usize, mut prompt: P, mut open: O) -> LedgerResult<T>
where
    P: FnMut() -> LedgerResult<SecureString>,
    O: FnMut(SecureString) -> LedgerResult<T>,
{
    let mut attempt = 1;
    loop {
        match open(prompt()?) {
            Err(e) if e.is_recoverable() && attempt < attempts => {
                eprintln!("{} ({} of {} attempts)", e, attempt, attempts);
                attempt += 1;
            }
            result => return result,
        }
    }
}

/// Enable encryption on the database
fn enable_encryption(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<()> {
    if settings.encryption_enabled {
        println!("Encryption is already enabled.");
        return Ok(());
    }
    if settings.storage_engine != StorageEngine::Sqlite {
        return Err(LedgerError::Config(
            "Encryption requires the sqlite storage engine. Run 'ledger migrate' and set \
             storage_engine to \"sqlite\" first."
                .to_string(),
        ));
    }

    println!("Enable Encryption");
    println!("=================");
    println!();
    println!("The database will be encrypted with AES-256-GCM whenever the ledger is closed.");
    println!("IMPORTANT: If you forget your password, your data cannot be recovered!");
    println!();

    let password = prompt_new_password()?;
    println!("Deriving encryption key...");
    let encrypted = enable_with_password(paths, settings, password)?;

    println!();
    if encrypted {
        println!("Encryption enabled. The database is now stored encrypted.");
    } else {
        println!("Encryption enabled. The database will be encrypted when it is first created.");
    }
    Ok(())
}

/// Persist the encryption flag, then encrypt the database under `password`
///
/// Returns whether an existing database was encrypted. The flag is saved
/// before the database is locked, so a failed save leaves the plaintext
/// database untouched; a failed lock puts the flag back.
fn enable_with_password(
    paths: &LedgerPaths,
    settings: &Settings,
    password: SecureString,
) -> LedgerResult<bool> {
    let mut envelope = Envelope::from_settings(settings, paths);
    envelope.set_password(password)?;
    envelope.unlock()?;

    let mut stored = Settings::load_or_create(paths)?;
    stored.encryption_enabled = true;
    stored.save(paths)?;

    let locked = envelope.lock();
    envelope.clear_password();

    if locked.is_err() {
        stored.encryption_enabled = false;
        if let Err(e) = stored.save(paths) {
            warn!(error = %e, "could not reset encryption flag after a failed lock");
        }
    }
    locked
}

/// Disable encryption, leaving a plaintext database behind
fn disable_encryption(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<()> {
    if !settings.encryption_enabled {
        println!("Encryption is not enabled.");
        return Ok(());
    }

    let mut envelope = Envelope::from_settings(settings, paths);
    with_password_retries(
        MAX_PASSWORD_ATTEMPTS,
        || prompt_password("Current password: "),
        |password| {
            envelope.set_password(password)?;
            envelope.unlock()
        },
    )?;
    envelope.remove_artifact()?;
    envelope.clear_password();

    let mut stored = Settings::load_or_create(paths)?;
    stored.encryption_enabled = false;
    stored.save(paths)?;

    println!("Encryption disabled. The database is now stored unencrypted.");
    Ok(())
}

/// Show encryption status
fn show_status(paths: &LedgerPaths, settings: &Settings) -> LedgerResult<()> {
    let database = settings.database_path(paths);
    let artifact = settings.encrypted_database_path(paths);

    println!("Encryption Status");
    println!("=================");
    println!();
    println!("Status:          {}", if settings.encryption_enabled { "ENABLED" } else { "DISABLED" });
    println!("Storage engine:  {}", settings.storage_engine);
    println!("Database:        {} ({})", database.display(), presence(database.exists()));
    println!("Encrypted copy:  {} ({})", artifact.display(), presence(artifact.exists()));
    println!("Salt:            {}", settings.salt_path(paths).display());

    if settings.encryption_enabled {
        let params = settings.key_derivation;
        println!();
        println!("Key Derivation Parameters:");
        println!("  Algorithm: Argon2id");
        println!("  Memory Cost: {} KiB", params.memory_cost);
        println!("  Time Cost: {} iterations", params.time_cost);
        println!("  Parallelism: {} threads", params.parallelism);

        if database.exists() {
            println!();
            println!("WARNING: a plaintext database exists while encryption is enabled.");
            println!("It will be encrypted the next time the ledger is opened and closed.");
        }
    }

    Ok(())
}

fn presence(exists: bool) -> &'static str {
    if exists {
        "present"
    } else {
        "absent"
    }
}

/// Prompt for a new password with confirmation
fn prompt_new_password() -> LedgerResult<SecureString> {
    loop {
        let first = prompt_password("New password: ")?;

        if first.len() < MIN_PASSWORD_LEN {
            println!(
                "Password must be at least {} characters. Please try again.",
                MIN_PASSWORD_LEN
            );
            continue;
        }

        let second = prompt_password("Confirm password: ")?;

        if first.as_str() != second.as_str() {
            println!("Passwords do not match. Please try again.");
            continue;
        }

        return Ok(first);
    }
}

/// Prompt for a password (hidden input)
fn prompt_password(prompt: &str) -> LedgerResult<SecureString> {
    rpassword::prompt_password(prompt)
        .map(SecureString::from)
        .map_err(|e| LedgerError::Encryption(format!("Failed to read password: {}", e)))
}
