// src/manifest.rs

use crate::models::{Directive, Manifest, ManifestEntry};
use crate::remote::{RemoteError, RemoteSource};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

/// The manifest could not be retrieved.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("manifest unavailable: {0}")]
    Io(#[from] RemoteError),
}

/// The manifest was retrieved but is not a flat string-valued object.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("malformed manifest: {0}")]
    Malformed(String),
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::Malformed(e.to_string())
    }
}

/// Downloads the raw manifest text. No retries.
pub async fn fetch_manifest<R>(remote: &R, url: &str) -> Result<String, FetchError>
where
    R: RemoteSource + ?Sized,
{
    info!(url, "fetching manifest");
    let raw = remote.fetch_text(url).await?;
    debug!(bytes = raw.len(), "manifest fetched");
    Ok(raw)
}

/// Decodes a flat JSON object of `modId -> url | "delete"`, keeping key order.
pub fn parse_manifest(raw: &str) -> Result<Manifest, ParseError> {
    let value: Value = serde_json::from_str(raw)?;
    let Value::Object(map) = value else {
        return Err(ParseError::Malformed("expected a JSON object".into()));
    };

    let mut entries = Vec::with_capacity(map.len());
    for (mod_id, value) in map {
        let Value::String(raw_directive) = value else {
            return Err(ParseError::Malformed(format!(
                "value for {mod_id:?} is not a string"
            )));
        };
        entries.push(ManifestEntry::new(mod_id, Directive::from_value(&raw_directive)));
    }

    let manifest = Manifest::new(entries);
    debug!(
        entries = manifest.len(),
        downloads = manifest.download_count(),
        deletes = manifest.delete_count(),
        "manifest parsed"
    );
    Ok(manifest)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::remote::tests::{MockRemote, MockResource};

    #[test]
    fn parses_in_declaration_order() {
        let manifest = parse_manifest(
            r#"{"zeta": "http://x/z.jar", "alpha": "delete", "mid": "http://x/m.jar"}"#,
        )
        .unwrap();
        let ids: Vec<_> = manifest.iter().map(|e| e.mod_id.as_str()).collect();
        assert_eq!(ids, vec!["zeta", "alpha", "mid"]);
        let directives: Vec<_> = manifest.iter().map(|e| e.directive.clone()).collect();
        assert_eq!(
            directives,
            vec![
                Directive::Download { url: "http://x/z.jar".into() },
                Directive::Delete,
                Directive::Download { url: "http://x/m.jar".into() },
            ]
        );
    }

    #[test]
    fn empty_object_is_empty_manifest() {
        assert!(parse_manifest("{}").unwrap().is_empty());
    }

    #[test]
    fn rejects_non_string_values() {
        assert!(matches!(
            parse_manifest(r#"{"a": 1}"#),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_manifest(r#"{"a": {"url": "http://x"}}"#),
            Err(ParseError::Malformed(_))
        ));
        assert!(matches!(
            parse_manifest(r#"{"a": null}"#),
            Err(ParseError::Malformed(_))
        ));
    }

    #[test]
    fn rejects_non_objects_and_bad_syntax() {
        assert!(matches!(parse_manifest(r#"["a"]"#), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_manifest("\"delete\""), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_manifest("{\"a\": "), Err(ParseError::Malformed(_))));
        assert!(matches!(parse_manifest(""), Err(ParseError::Malformed(_))));
    }

    #[test]
    fn unsafe_ids_do_not_fail_the_parse() {
        let manifest = parse_manifest(
            r#"{"good": "http://x/good.jar", "sub/evil": "http://x/e.jar", "..": "delete"}"#,
        )
        .unwrap();
        let ids: Vec<_> = manifest.iter().map(|e| e.mod_id.as_str()).collect();
        assert_eq!(ids, vec!["good", "sub/evil", ".."]);
        assert!(manifest.iter().next().unwrap().has_safe_id());
        assert!(manifest.iter().skip(1).all(|e| !e.has_safe_id()));
    }

    #[tokio::test]
    async fn fetch_wraps_remote_failures() {
        let remote = MockRemote::new().with("http://x/mods.json", MockResource::body("{}"));
        assert_eq!(fetch_manifest(&remote, "http://x/mods.json").await.unwrap(), "{}");
        assert!(matches!(
            fetch_manifest(&remote, "http://x/other.json").await,
            Err(FetchError::Io(RemoteError::Status { status: 404, .. }))
        ));
    }
}
