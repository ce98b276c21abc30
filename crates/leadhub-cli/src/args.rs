//! Parsing of `--field KEY=VALUE` and `--file PART=PATH` arguments.

use std::path::Path;

use anyhow::{Context, Result, bail};
use leadhub_core::record::{Attachment, Draft, DraftAttachment};
use serde_json::Value;

/// Splits `KEY=VALUE`. The value is read as JSON when it parses (numbers,
/// booleans, arrays, objects) and kept as a string otherwise.
pub fn parse_field(raw: &str) -> Result<(String, Value)> {
    let (key, value) = split_pair(raw, "KEY=VALUE")?;
    let value = match serde_json::from_str::<Value>(value) {
        Ok(Value::String(_)) | Err(_) => Value::String(value.to_string()),
        Ok(parsed) => parsed,
    };
    Ok((key.to_string(), value))
}

/// Reads `PART=PATH` into an in-memory attachment.
pub fn parse_file(raw: &str) -> Result<DraftAttachment> {
    let (part, path) = split_pair(raw, "PART=PATH")?;
    let path = Path::new(path);
    let bytes =
        std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    Ok(DraftAttachment {
        part: part.to_string(),
        attachment: Attachment::new(file_name, bytes),
    })
}

/// Builds a draft from raw field and file arguments.
pub fn build_draft(fields: &[String], files: &[String]) -> Result<Draft> {
    let mut draft = Draft::new();
    for raw in fields {
        let (key, value) = parse_field(raw)?;
        draft.set(key, value);
    }
    for raw in files {
        let file = parse_file(raw)?;
        draft.attach_many(file.part, file.attachment);
    }
    Ok(draft)
}

fn split_pair<'a>(raw: &'a str, shape: &str) -> Result<(&'a str, &'a str)> {
    match raw.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => Ok((key.trim(), value)),
        _ => bail!("Expected {}, got '{}'", shape, raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_field_values() {
        assert_eq!(parse_field("title=Hello").unwrap(), ("title".into(), json!("Hello")));
        assert_eq!(parse_field("year=2024").unwrap(), ("year".into(), json!(2024)));
        assert_eq!(parse_field("quote=\"x\"").unwrap(), ("quote".into(), json!("\"x\"")));
        assert_eq!(parse_field("url=a=b").unwrap(), ("url".into(), json!("a=b")));
        assert!(parse_field("novalue").is_err());
        assert!(parse_field("=x").is_err());
    }

    #[test]
    fn test_file_argument() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cover.png");
        std::fs::write(&path, [1u8, 2, 3]).unwrap();

        let file = parse_file(&format!("coverImage={}", path.display())).unwrap();
        assert_eq!(file.part, "coverImage");
        assert_eq!(file.attachment.file_name, "cover.png");
        assert_eq!(file.attachment.bytes, vec![1, 2, 3]);

        assert!(parse_file("image=/does/not/exist.png").is_err());
    }

    #[test]
    fn test_build_draft() {
        let draft = build_draft(&["title=A".to_string(), "tags=x, y".to_string()], &[]).unwrap();
        assert_eq!(draft.get("title"), Some(&json!("A")));
        assert_eq!(draft.get("tags"), Some(&json!("x, y")));
        assert!(draft.attachments().is_empty());
    }
}
