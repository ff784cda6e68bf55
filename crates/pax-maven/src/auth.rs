//! Repository authentication using credentials from `~/.pax/config.toml`.
//!
//! Credentials are matched to repositories by name:
//!
//! ```toml
//! [repositories]
//! nexus = "https://nexus.example.com/repository/osgi"
//!
//! [credentials.nexus]
//! username = "deployer"
//! password = "secret"
//! ```
//!
//! A password without a username is sent as a bearer token.

use reqwest::blocking::RequestBuilder;

use crate::repository::MavenRepository;

/// Apply authentication to a request if the repository has credentials.
pub fn apply_auth(request: RequestBuilder, repo: &MavenRepository) -> RequestBuilder {
    match (&repo.username, &repo.password) {
        (Some(user), Some(pass)) => request.basic_auth(user, Some(pass)),
        (Some(user), None) => request.basic_auth(user, None::<&str>),
        (None, Some(token)) => request.bearer_auth(token),
        (None, None) => request,
    }
}
