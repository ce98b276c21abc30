//! Required-field checks run before any submission.

use serde_json::{Map, Value};

use crate::collection::Requirement;
use crate::error::{HubError, Result};
use crate::record::{Draft, is_blank};

/// Names of requirements not met by `fields`.
///
/// `has_upload` tells whether a file is attached to a multipart part.
pub fn missing_fields(
    requirements: &[Requirement],
    fields: &Map<String, Value>,
    has_upload: impl Fn(&str) -> bool,
) -> Vec<String> {
    requirements
        .iter()
        .filter(|requirement| match requirement {
            Requirement::Field(field) => is_blank(fields.get(*field)),
            Requirement::FieldOrUpload { field, part } => {
                is_blank(fields.get(*field)) && !has_upload(part)
            }
        })
        .map(|requirement| requirement.name().to_string())
        .collect()
}

/// Validates a draft; fails with every missing field at once.
pub fn validate_draft(requirements: &[Requirement], draft: &Draft) -> Result<()> {
    validate_fields(requirements, draft.fields(), |part| draft.has_attachment(part))
}

pub fn validate_fields(
    requirements: &[Requirement],
    fields: &Map<String, Value>,
    has_upload: impl Fn(&str) -> bool,
) -> Result<()> {
    let missing = missing_fields(requirements, fields, has_upload);
    if missing.is_empty() {
        Ok(())
    } else {
        Err(HubError::validation(missing))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::collection::CollectionSpec;
    use crate::record::Attachment;

    #[test]
    fn test_event_requirements() {
        let spec = CollectionSpec::events();
        let draft = Draft::new().field("title", "Rally").field("description", "  ");
        let err = validate_draft(&spec.required, &draft).unwrap_err();
        assert_eq!(err.missing_fields(), ["date", "description"]);
    }

    #[test]
    fn test_gallery_image_by_upload_or_url() {
        let spec = CollectionSpec::gallery();
        let mut draft = Draft::new().field("title", "Visit").field("year", 2023);
        assert_eq!(
            validate_draft(&spec.required, &draft).unwrap_err().missing_fields(),
            ["image"]
        );

        draft.attach("image", Attachment::new("a.jpg", vec![1]));
        assert!(validate_draft(&spec.required, &draft).is_ok());

        let linked = Draft::new()
            .field("title", "Visit")
            .field("year", "2023")
            .field("image", "https://cdn/x.jpg");
        assert!(validate_draft(&spec.required, &linked).is_ok());
    }
}
