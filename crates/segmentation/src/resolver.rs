//! Attribute resolution — one field namespace over built-in columns and the
//! custom-field map.

use audience_core::{CandidateEntity, FieldValue};

/// Resolve a field identifier against an entity.
///
/// Returns `None` when the field is absent entirely (not a built-in and no
/// custom-field entry) and `Some(FieldValue::Null)` when the field exists
/// but holds no value. The distinction matters to `is_empty`/`is_set`;
/// everywhere else an unknown field is simply a non-match, never an error,
/// so batch evaluation stays robust to schema drift.
pub fn resolve(entity: &CandidateEntity, field: &str) -> Option<FieldValue> {
    match field {
        "id" => Some(FieldValue::Text(entity.id.to_string())),
        "first_name" => Some(text_or_null(&entity.first_name)),
        "last_name" => Some(text_or_null(&entity.last_name)),
        "email" => Some(text_or_null(&entity.email)),
        "company" => Some(text_or_null(&entity.company)),
        "status" => Some(text_or_null(&entity.status)),
        "source" => Some(text_or_null(&entity.source)),
        "revenue" => Some(
            entity
                .revenue
                .map(FieldValue::Number)
                .unwrap_or(FieldValue::Null),
        ),
        "created_at" => Some(FieldValue::Text(entity.created_at.to_rfc3339())),
        "updated_at" => Some(FieldValue::Text(entity.updated_at.to_rfc3339())),
        _ => entity.custom_fields.get(field).cloned(),
    }
}

fn text_or_null(column: &Option<String>) -> FieldValue {
    match column {
        Some(s) => FieldValue::Text(s.clone()),
        None => FieldValue::Null,
    }
}

/// Human-readable label for preview rows: name, falling back to email, then
/// the record id.
pub fn display_name(entity: &CandidateEntity) -> String {
    let name = match (&entity.first_name, &entity.last_name) {
        (Some(first), Some(last)) => format!("{first} {last}"),
        (Some(first), None) => first.clone(),
        (None, Some(last)) => last.clone(),
        (None, None) => String::new(),
    };
    if !name.trim().is_empty() {
        return name;
    }
    if let Some(email) = &entity.email {
        return email.clone();
    }
    entity.id.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use audience_core::EntityKind;
    use uuid::Uuid;

    fn lead() -> CandidateEntity {
        let mut entity = CandidateEntity::new(Uuid::new_v4(), EntityKind::Lead);
        entity.first_name = Some("Dana".into());
        entity.last_name = Some("Reyes".into());
        entity.email = Some("dana@example.com".into());
        entity.status = Some("NEW".into());
        entity
            .custom_fields
            .insert("plan".into(), FieldValue::Text("pro".into()));
        entity
            .custom_fields
            .insert("mrr".into(), FieldValue::Number(129.0));
        entity
    }

    #[test]
    fn test_builtin_resolution() {
        let entity = lead();
        assert_eq!(
            resolve(&entity, "status"),
            Some(FieldValue::Text("NEW".into()))
        );
        assert_eq!(
            resolve(&entity, "email"),
            Some(FieldValue::Text("dana@example.com".into()))
        );
    }

    #[test]
    fn test_nullable_builtin_resolves_to_null() {
        let entity = lead();
        // `company` is a known column with no value: present-but-null.
        assert_eq!(resolve(&entity, "company"), Some(FieldValue::Null));
        assert_eq!(resolve(&entity, "revenue"), Some(FieldValue::Null));
    }

    #[test]
    fn test_custom_field_lookup() {
        let entity = lead();
        assert_eq!(resolve(&entity, "plan"), Some(FieldValue::Text("pro".into())));
        assert_eq!(resolve(&entity, "mrr"), Some(FieldValue::Number(129.0)));
    }

    #[test]
    fn test_unknown_field_is_absent() {
        let entity = lead();
        assert_eq!(resolve(&entity, "no_such_field"), None);
    }

    #[test]
    fn test_display_name_fallbacks() {
        let mut entity = lead();
        assert_eq!(display_name(&entity), "Dana Reyes");

        entity.first_name = None;
        entity.last_name = None;
        assert_eq!(display_name(&entity), "dana@example.com");

        entity.email = None;
        assert_eq!(display_name(&entity), entity.id.to_string());
    }
}
