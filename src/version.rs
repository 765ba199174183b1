//! Terraform version compatibility
//!
//! Terraform 0.12 introduced HCL2, which is what the parser understands. No upper
//! bound is set: only schema-related logic depends on the version, and the schema
//! format is version-checked where it is read.

use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use semver::{BuildMetadata, Prerelease, Version, VersionReq};

use crate::error::{Error, Result};
use crate::parser::Parser;
use crate::schema::SchemaReader;

/// Versions the parser supports
pub const PARSER_VERSION_CONSTRAINT: &str = ">= 0.12.0";

/// Assumed when the client does not report a Terraform version
pub const DEFAULT_TERRAFORM_VERSION: &str = "0.12.0";

/// Parse a Terraform version string.
///
/// Accepts the forms Terraform prints and users type: an optional leading `v`,
/// a missing minor or patch component (`0.12` is `0.12.0`), numeric segments
/// after the patch (ignored), and a prerelease with or without its hyphen
/// (`0.12.0beta1`).
pub fn parse_version(v: &str) -> Result<Version> {
    lazy_static! {
        static ref VERSION_RE: Regex = Regex::new(
            r"^v?(\d+)(?:\.(\d+))?(?:\.(\d+))?(?:\.\d+)*(?:-?([0-9A-Za-z][0-9A-Za-z.-]*))?(?:\+([0-9A-Za-z.-]+))?$"
        )
        .unwrap();
    }

    let invalid = || Error::InvalidVersion {
        version: v.to_string(),
    };

    let caps = VERSION_RE.captures(v.trim()).ok_or_else(invalid)?;
    let number = |i: usize| -> Result<u64> {
        caps.get(i)
            .map_or(Ok(0), |m| m.as_str().parse().map_err(|_| invalid()))
    };

    let mut version = Version::new(number(1)?, number(2)?, number(3)?);
    if let Some(pre) = caps.get(4) {
        version.pre = Prerelease::new(pre.as_str()).map_err(|_| invalid())?;
    }
    if let Some(build) = caps.get(5) {
        version.build = BuildMetadata::new(build.as_str()).map_err(|_| invalid())?;
    }

    Ok(version)
}

fn parser_constraint() -> VersionReq {
    lazy_static! {
        static ref CONSTRAINT: VersionReq = VersionReq::parse(PARSER_VERSION_CONSTRAINT).unwrap();
    }
    CONSTRAINT.clone()
}

/// Check that the parser can handle configuration for Terraform `v`
pub fn parser_supports_terraform(v: &str) -> Result<()> {
    let version = parse_version(v)?;
    let constraint = parser_constraint();

    if !constraint.matches(&version) {
        return Err(Error::UnsupportedVersion {
            component: "parser",
            version: v.to_string(),
            constraint,
        });
    }

    Ok(())
}

/// Find a parser compatible with Terraform `v`, so that it parses
/// configuration accurately
pub fn find_compatible_parser(
    v: &str,
    schema_reader: Option<Arc<dyn SchemaReader>>,
) -> Result<Parser> {
    parser_supports_terraform(v)?;
    Ok(Parser::new(schema_reader))
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn test_parse_version_forms() {
        assert_eq!(parse_version("0.12.24").unwrap(), Version::new(0, 12, 24));
        assert_eq!(parse_version("v1.5.7").unwrap(), Version::new(1, 5, 7));
        assert_eq!(parse_version("0.13").unwrap(), Version::new(0, 13, 0));
        assert_eq!(parse_version("1").unwrap(), Version::new(1, 0, 0));

        let pre = parse_version("0.12.0-beta1").unwrap();
        assert_eq!(pre.pre.as_str(), "beta1");
    }

    #[test]
    fn test_parse_loose_version_forms() {
        assert_eq!(parse_version("1.2.3.4").unwrap(), Version::new(1, 2, 3));

        let pre = parse_version("0.12.0beta1").unwrap();
        assert_eq!(pre.pre.as_str(), "beta1");
        assert_eq!((pre.major, pre.minor, pre.patch), (0, 12, 0));

        assert!(parser_supports_terraform("1.2.3.4").is_ok());
        assert_matches!(
            parser_supports_terraform("0.12.0beta1"),
            Err(Error::UnsupportedVersion { .. })
        );
    }

    #[test]
    fn test_invalid_version() {
        for v in ["", "abc", "0.12.x", "0.12.0-", "1.2.3-rc.01"] {
            let err = parse_version(v).unwrap_err();
            assert_matches!(err, Error::InvalidVersion { version } if version == v);
        }
    }

    #[test]
    fn test_supported_versions() {
        for v in ["0.12.0", "0.12.29", "0.13.5", "1.0.0", "1.9.3"] {
            assert!(parser_supports_terraform(v).is_ok(), "{} should be supported", v);
        }
    }

    #[test]
    fn test_unsupported_version() {
        let err = parser_supports_terraform("0.11.14").unwrap_err();
        assert_eq!(
            err.to_string(),
            "parser does not support Terraform 0.11.14 (requires >=0.12.0)"
        );
        assert_matches!(
            err,
            Error::UnsupportedVersion { component: "parser", version, .. } if version == "0.11.14"
        );
    }

    #[test]
    fn test_prerelease_below_bound_is_unsupported() {
        assert_matches!(
            parser_supports_terraform("0.12.0-beta1"),
            Err(Error::UnsupportedVersion { .. })
        );
    }

    #[test]
    fn test_find_compatible_parser() {
        let parser = find_compatible_parser("0.12.20", None).unwrap();
        assert_eq!(parser.registry().len(), 3);

        assert_matches!(
            find_compatible_parser("not-a-version", None),
            Err(Error::InvalidVersion { .. })
        );
        assert_matches!(
            find_compatible_parser("0.11.0", None),
            Err(Error::UnsupportedVersion { .. })
        );
    }

    #[test]
    fn test_default_version_is_supported() {
        assert!(parser_supports_terraform(DEFAULT_TERRAFORM_VERSION).is_ok());
    }
}
