//! Flat equality filters for query and count.

use crate::document::Document;

/// Field/value pairs a document must carry to match.
///
/// `None` and an empty criteria both match every document.
pub type Criteria = Option<Document>;

/// Normalizes an empty criteria to `None`.
pub fn normalize(criteria: Criteria) -> Criteria {
    criteria.filter(|c| !c.is_empty())
}

/// True when every criteria field is present on `document` with an equal value.
pub fn matches(document: &Document, criteria: Option<&Document>) -> bool {
    let Some(criteria) = criteria else {
        return true;
    };

    criteria
        .iter()
        .all(|(field, expected)| document.get(field) == Some(expected))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        Document::try_from(value).unwrap()
    }

    #[test]
    fn test_no_criteria_matches_all() {
        let d = doc(json!({"id": "x1", "a": 1}));
        assert!(matches(&d, None));
        assert!(matches(&d, Some(&Document::new())));
    }

    #[test]
    fn test_all_fields_must_match() {
        let d = doc(json!({"id": "x2", "a": 2, "b": 1}));
        assert!(matches(&d, Some(&doc(json!({"a": 2})))));
        assert!(matches(&d, Some(&doc(json!({"a": 2, "b": 1})))));
        assert!(!matches(&d, Some(&doc(json!({"a": 2, "b": 2})))));
        assert!(!matches(&d, Some(&doc(json!({"c": 1})))));
    }

    #[test]
    fn test_strict_type_equality() {
        let d = doc(json!({"id": "x1", "a": 1, "n": null}));
        assert!(!matches(&d, Some(&doc(json!({"a": "1"})))));
        assert!(!matches(&d, Some(&doc(json!({"a": true})))));
        assert!(matches(&d, Some(&doc(json!({"n": null})))));
        // missing field is not the same as null
        assert!(!matches(&d, Some(&doc(json!({"m": null})))));
    }

    #[test]
    fn test_normalize() {
        assert_eq!(normalize(Some(Document::new())), None);
        assert!(normalize(Some(doc(json!({"a": 1})))).is_some());
    }
}
