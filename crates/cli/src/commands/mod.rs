//! CLI subcommands.

pub mod migrate;
pub mod seed;
pub mod token;

use secrecy::SecretString;

/// Read the database URL, preferring `ELLECTRA_DATABASE_URL`.
fn database_url() -> Option<SecretString> {
    std::env::var("ELLECTRA_DATABASE_URL")
        .or_else(|_| std::env::var("DATABASE_URL"))
        .ok()
        .map(SecretString::from)
}
