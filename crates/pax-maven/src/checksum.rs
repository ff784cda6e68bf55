//! Checksum verification of downloaded artifacts against repository sidecars.

use md5::Md5;
use reqwest::blocking::Client;
use sha1::Sha1;
use sha2::{Digest, Sha256};

use pax_util::errors::PaxError;

use crate::download;
use crate::repository::MavenRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Algorithm {
    Sha256,
    Sha1,
    Md5,
}

impl Algorithm {
    /// Preference order when looking for sidecars.
    const ALL: [Algorithm; 3] = [Algorithm::Sha256, Algorithm::Sha1, Algorithm::Md5];

    fn extension(self) -> &'static str {
        match self {
            Algorithm::Sha256 => "sha256",
            Algorithm::Sha1 => "sha1",
            Algorithm::Md5 => "md5",
        }
    }

    fn digest(self, data: &[u8]) -> String {
        match self {
            Algorithm::Sha256 => hex(Sha256::digest(data)),
            Algorithm::Sha1 => hex(Sha1::digest(data)),
            Algorithm::Md5 => hex(Md5::digest(data)),
        }
    }
}

/// Check `data` fetched from `file_url` against the first sidecar the
/// repository offers. A repository with no sidecars only earns a warning.
pub fn verify(
    client: &Client,
    repo: &MavenRepository,
    file_url: &str,
    data: &[u8],
) -> miette::Result<()> {
    for algorithm in Algorithm::ALL {
        let sidecar = format!("{file_url}.{}", algorithm.extension());
        if let Some(expected) = download::download_text(client, repo, &sidecar)? {
            return check(algorithm, data, &expected, file_url);
        }
    }
    tracing::warn!("no checksum published for {file_url}");
    Ok(())
}

fn check(algorithm: Algorithm, data: &[u8], sidecar: &str, url: &str) -> miette::Result<()> {
    let expected = extract_hash(sidecar);
    let actual = algorithm.digest(data);
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{} ok for {url}", algorithm.extension());
        return Ok(());
    }
    Err(PaxError::Network {
        message: format!(
            "{} mismatch for {url}: expected {expected}, got {actual}",
            algorithm.extension()
        ),
    }
    .into())
}

/// Sidecars hold either the bare hash or `hash  filename`.
fn extract_hash(content: &str) -> &str {
    content.split_whitespace().next().unwrap_or("")
}

fn hex(bytes: impl AsRef<[u8]>) -> String {
    bytes.as_ref().iter().map(|b| format!("{b:02x}")).collect()
}
