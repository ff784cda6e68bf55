//! Deciding whether a resolved module is an OSGi bundle.

use std::io::Read;
use std::path::Path;

use pax_util::errors::PaxError;

use crate::source::{ArtifactSource, ResolvedModule};

const MANIFEST_ENTRY: &str = "META-INF/MANIFEST.MF";

pub trait BundleClassifier {
    /// `test_metadata` allows the classifier to look inside the artifact;
    /// without it only the module description is consulted.
    fn is_bundle(
        &self,
        module: &ResolvedModule,
        source: &dyn ArtifactSource,
        test_metadata: bool,
    ) -> miette::Result<bool>;
}

/// `bundle` packaging, or a `Bundle-SymbolicName` header in the jar manifest.
#[derive(Debug, Clone, Copy, Default)]
pub struct OsgiBundleClassifier;

impl BundleClassifier for OsgiBundleClassifier {
    fn is_bundle(
        &self,
        module: &ResolvedModule,
        source: &dyn ArtifactSource,
        test_metadata: bool,
    ) -> miette::Result<bool> {
        if module.packaging == "bundle" {
            return Ok(true);
        }
        if !test_metadata {
            return Ok(false);
        }
        let jar = source.artifact_file(&module.coordinate)?;
        let name = bundle_symbolic_name(&jar)?;
        if let Some(ref name) = name {
            tracing::debug!("{} carries Bundle-SymbolicName {name}", module.coordinate);
        }
        Ok(name.is_some())
    }
}

/// `Bundle-SymbolicName` of a jar, without directives. `None` for plain jars.
pub fn bundle_symbolic_name(jar: &Path) -> miette::Result<Option<String>> {
    let file = std::fs::File::open(jar).map_err(PaxError::Io)?;
    let mut archive = zip::ZipArchive::new(file).map_err(|e| PaxError::Resolution {
        message: format!("{} is not a readable jar: {e}", jar.display()),
    })?;
    let Ok(mut entry) = archive.by_name(MANIFEST_ENTRY) else {
        return Ok(None);
    };
    let mut manifest = String::new();
    entry
        .read_to_string(&mut manifest)
        .map_err(PaxError::Io)?;
    Ok(manifest_header(&manifest, "Bundle-SymbolicName")
        .map(|v| v.split(';').next().unwrap_or_default().trim().to_string())
        .filter(|v| !v.is_empty()))
}

/// Value of a main-section header, joining continuation lines.
fn manifest_header(manifest: &str, header: &str) -> Option<String> {
    let mut value: Option<String> = None;
    for line in manifest.lines() {
        let line = line.trim_end_matches('\r');
        if let Some(v) = value.as_mut() {
            match line.strip_prefix(' ') {
                Some(more) => {
                    v.push_str(more);
                    continue;
                }
                None => break,
            }
        }
        if line.is_empty() {
            // end of the main section
            break;
        }
        if let Some((name, rest)) = line.split_once(':') {
            if name.eq_ignore_ascii_case(header) {
                value = Some(rest.trim_start().to_string());
            }
        }
    }
    value
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;
    use std::io::Write;
    use std::path::PathBuf;

    use pax_core::coordinate::Coordinate;

    fn write_jar(path: &Path, manifest: Option<&str>) {
        let file = std::fs::File::create(path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        let options = zip::write::SimpleFileOptions::default();
        if let Some(manifest) = manifest {
            zip.start_file(MANIFEST_ENTRY, options).unwrap();
            zip.write_all(manifest.as_bytes()).unwrap();
        }
        zip.start_file("org/example/Foo.class", options).unwrap();
        zip.write_all(b"\xca\xfe\xba\xbe").unwrap();
        zip.finish().unwrap();
    }

    struct JarSource {
        jar: PathBuf,
        opened: Cell<usize>,
    }

    impl ArtifactSource for JarSource {
        fn resolve_module(&self, _: &Coordinate) -> miette::Result<ResolvedModule> {
            unreachable!()
        }

        fn artifact_file(&self, _: &Coordinate) -> miette::Result<PathBuf> {
            self.opened.set(self.opened.get() + 1);
            Ok(self.jar.clone())
        }
    }

    fn module(packaging: &str) -> ResolvedModule {
        ResolvedModule {
            coordinate: Coordinate::new("org.example", "lib", "1.0"),
            packaging: packaging.to_string(),
            name: "lib".to_string(),
            dependencies: Vec::new(),
        }
    }

    #[test]
    fn header_with_directive_and_continuation() {
        let mf = "Manifest-Version: 1.0\r\nBundle-SymbolicName: org.example.very.lo\r\n ng.name;singleton:=true\r\nBundle-Version: 1.0\r\n";
        assert_eq!(
            manifest_header(mf, "Bundle-SymbolicName").as_deref(),
            Some("org.example.very.long.name;singleton:=true")
        );
        assert_eq!(manifest_header(mf, "Export-Package"), None);
    }

    #[test]
    fn jar_with_symbolic_name_is_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let jar = tmp.path().join("lib.jar");
        write_jar(
            &jar,
            Some("Manifest-Version: 1.0\nBundle-SymbolicName: org.example.lib;singleton:=true\n"),
        );
        assert_eq!(
            bundle_symbolic_name(&jar).unwrap().as_deref(),
            Some("org.example.lib")
        );

        let source = JarSource { jar, opened: Cell::new(0) };
        assert!(OsgiBundleClassifier.is_bundle(&module("jar"), &source, true).unwrap());
    }

    #[test]
    fn plain_jar_is_not_bundle() {
        let tmp = tempfile::tempdir().unwrap();
        let jar = tmp.path().join("plain.jar");
        write_jar(&jar, Some("Manifest-Version: 1.0\nCreated-By: javac\n"));
        let source = JarSource { jar: jar.clone(), opened: Cell::new(0) };
        assert!(!OsgiBundleClassifier.is_bundle(&module("jar"), &source, true).unwrap());

        write_jar(&jar, None);
        assert_eq!(bundle_symbolic_name(&jar).unwrap(), None);
    }

    #[test]
    fn metadata_test_off_never_opens_artifact() {
        let source = JarSource {
            jar: PathBuf::from("/nonexistent.jar"),
            opened: Cell::new(0),
        };
        assert!(!OsgiBundleClassifier.is_bundle(&module("jar"), &source, false).unwrap());
        assert!(OsgiBundleClassifier.is_bundle(&module("bundle"), &source, false).unwrap());
        assert_eq!(source.opened.get(), 0);
    }
}
