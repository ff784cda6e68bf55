//! Blocking HTTP fetches from remote repositories.

use std::thread;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::StatusCode;

use pax_util::errors::PaxError;

use crate::auth;
use crate::repository::MavenRepository;

const MAX_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Shared client for repository downloads.
pub fn build_client() -> miette::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("pax-construct/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            PaxError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// GET `url` from `repo`, retrying server errors and connection failures.
///
/// `Ok(None)` means the repository answered 404.
pub fn download_bytes(
    client: &Client,
    repo: &MavenRepository,
    url: &str,
) -> miette::Result<Option<Vec<u8>>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_ATTEMPTS {
        if attempt > 0 {
            tracing::debug!("retrying {url} (attempt {})", attempt + 1);
            thread::sleep(RETRY_DELAY * attempt);
        }

        let request = auth::apply_auth(client.get(url), repo);
        match request.send() {
            Ok(resp) => {
                let status = resp.status();
                if status == StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(PaxError::Network {
                        message: format!("HTTP {status} fetching {url} from {}", repo.name),
                    }
                    .into());
                }
                let bytes = resp.bytes().map_err(|e| PaxError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                return Ok(Some(bytes.to_vec()));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = e.to_string();
            }
            Err(e) => {
                return Err(PaxError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(PaxError::Network {
        message: format!("Gave up on {url} after {MAX_ATTEMPTS} attempts: {last_err}"),
    }
    .into())
}

/// GET a text resource such as a POM or a checksum sidecar.
pub fn download_text(
    client: &Client,
    repo: &MavenRepository,
    url: &str,
) -> miette::Result<Option<String>> {
    Ok(download_bytes(client, repo, url)?.map(|bytes| String::from_utf8_lossy(&bytes).into_owned()))
}
