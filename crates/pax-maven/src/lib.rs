//! Maven side of pax: editable `pom.xml` documents, the resolved POM model,
//! repository access (download, checksums, auth, local repository) and
//! OSGi bundle detection.

pub mod auth;
pub mod bundle;
pub mod cache;
pub mod checksum;
pub mod document;
pub mod download;
pub mod pom;
pub mod repository;
pub mod source;
pub mod xml;
