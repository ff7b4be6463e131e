//! Create, replace, merge, show and delete for the record kinds without a
//! lifecycle of their own (geodetic, civil, remark, daily).
//!
//! Field values arrive as strings and are stored as such. The structured daily
//! report fields ([`JSON_FIELDS`]) are the exception: a JSON array or object
//! given for one of them is parsed, so the tables can be supplied inline.

use crate::commands::{CmdMessage, CmdResult, Fields};
use crate::error::{InspectError, Result};
use crate::model::{Author, PlainRecord, Record};
use crate::store::backend::StorageBackend;
use crate::store::RecordStore;
use serde_json::{Map, Value};

/// Keys the store or the acting inspector own; caller-supplied values are ignored.
pub const SYSTEM_KEYS: [&str; 5] = [
    "id",
    "created_at",
    "updated_at",
    "inspector_id",
    "inspector_name",
];

/// Fields whose values are tables or lists rather than text.
pub const JSON_FIELDS: [&str; 5] = [
    "equipment_data",
    "works_data",
    "materials_data",
    "quality_data",
    "photos_data",
];

pub fn is_system_key(key: &str) -> bool {
    SYSTEM_KEYS.contains(&key)
}

fn field_value(key: &str, raw: &str) -> Value {
    let trimmed = raw.trim();
    if JSON_FIELDS.contains(&key) && (trimmed.starts_with('[') || trimmed.starts_with('{')) {
        if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
            return value;
        }
    }
    Value::String(raw.to_string())
}

fn field_map(fields: &Fields, skip_empty: bool) -> Map<String, Value> {
    fields
        .iter()
        .filter(|(key, _)| !is_system_key(key))
        .filter(|(_, value)| !(skip_empty && value.trim().is_empty()))
        .map(|(key, value)| (key.clone(), field_value(key, value)))
        .collect()
}

/// Build a record of kind `T` from field values. Unknown keys land in `extra`.
pub fn build_record<T: Record>(fields: &Fields) -> Result<T> {
    serde_json::from_value(Value::Object(field_map(fields, false)))
        .map_err(|e| InspectError::Api(format!("Invalid {} fields: {}", T::LABEL, e)))
}

pub fn create<T: PlainRecord, B: StorageBackend>(
    store: &RecordStore<B>,
    fields: &Fields,
    author: &Author,
) -> Result<CmdResult<T>> {
    let mut record: T = build_record(fields)?;
    *record.author_mut() = author.clone();
    let record = store.add(record)?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!(
        "{} #{} created",
        T::LABEL,
        record.id()
    )));
    Ok(result.with_records(vec![record]))
}

/// Full replace: fields not supplied are cleared. Authorship is kept.
pub fn replace<T: PlainRecord, B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
    fields: &Fields,
) -> Result<CmdResult<T>> {
    let replacement: T = build_record(fields)?;
    let record = store.patch(id, move |current: &mut T| {
        let author = current.author().clone();
        *current = replacement;
        *current.author_mut() = author;
        Ok(())
    })?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("{} #{} replaced", T::LABEL, id)));
    Ok(result.with_records(vec![record]))
}

/// Overlay the non-empty supplied values onto the stored record.
pub fn merge<T: PlainRecord, B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
    fields: &Fields,
) -> Result<CmdResult<T>> {
    let overlay = field_map(fields, true);
    let record = store.patch(id, |current: &mut T| {
        let mut value = serde_json::to_value(&*current)?;
        if let Value::Object(map) = &mut value {
            map.extend(overlay);
        }
        *current = serde_json::from_value(value)
            .map_err(|e| InspectError::Api(format!("Invalid {} fields: {}", T::LABEL, e)))?;
        Ok(())
    })?;

    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("{} #{} updated", T::LABEL, id)));
    Ok(result.with_records(vec![record]))
}

pub fn show<T: Record, B: StorageBackend>(store: &RecordStore<B>, id: u64) -> Result<CmdResult<T>> {
    let record = store
        .get::<T>(id)
        .ok_or_else(|| InspectError::not_found(T::COLLECTION, id))?;
    Ok(CmdResult::default().with_records(vec![record]))
}

pub fn delete<T: PlainRecord, B: StorageBackend>(
    store: &RecordStore<B>,
    id: u64,
) -> Result<CmdResult<T>> {
    let removed = store.delete::<T>(id)?;
    let mut result = CmdResult::default();
    result.add_message(CmdMessage::success(format!("{} #{} deleted", T::LABEL, id)));
    Ok(result.with_records(vec![removed]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DailyReport, GeodeticInspection, RemarkReport};
    use crate::store::mem_backend::MemBackend;

    fn fields(pairs: &[(&str, &str)]) -> Fields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn store() -> RecordStore<MemBackend> {
        RecordStore::with_backend(MemBackend::new())
    }

    #[test]
    fn create_sets_author_from_actor_not_fields() {
        let store = store();
        let result = create::<GeodeticInspection, _>(
            &store,
            &fields(&[
                ("object", "Dam 2"),
                ("status", "Accepted"),
                ("inspector_name", "Forged"),
                ("id", "99"),
            ]),
            &Author::named("Madiyar"),
        )
        .unwrap();

        let record = &result.records[0];
        assert_eq!(record.id(), 1);
        assert_eq!(record.object, "Dam 2");
        assert_eq!(record.author.inspector_name.as_deref(), Some("Madiyar"));
        assert!(result.has_level(crate::commands::MessageLevel::Success));
    }

    #[test]
    fn unknown_fields_are_kept_in_extra() {
        let store = store();
        let result = create::<RemarkReport, _>(
            &store,
            &fields(&[("Status", "Open"), ("weather_note", "rain")]),
            &Author::default(),
        )
        .unwrap();
        assert_eq!(result.records[0].status, "Open");
        assert_eq!(
            result.records[0].extra.get("weather_note"),
            Some(&Value::String("rain".into()))
        );
    }

    #[test]
    fn daily_tables_parse_from_json_values() {
        let store = store();
        let result = create::<DailyReport, _>(
            &store,
            &fields(&[
                ("author", "Shift lead"),
                ("works_data", r#"{"areas": ["Dam"], "work_types": ["Fill"]}"#),
                ("remarks", "[not json"),
            ]),
            &Author::named("Said"),
        )
        .unwrap();
        let report = &result.records[0];
        assert_eq!(report.works_data.areas, vec!["Dam"]);
        assert_eq!(report.remarks, "[not json");
        assert_eq!(report.author, "Shift lead");
        assert_eq!(report.filed_by.inspector_name.as_deref(), Some("Said"));
    }

    #[test]
    fn text_fields_keep_json_looking_values() {
        let store = store();
        let result = create::<GeodeticInspection, _>(
            &store,
            &fields(&[("deviation_comments", "[1]"), ("work_name", "{axis A}")]),
            &Author::default(),
        )
        .unwrap();
        assert_eq!(result.records[0].deviation_comments, "[1]");
        assert_eq!(result.records[0].work_name, "{axis A}");

        let extra = create::<RemarkReport, _>(
            &store,
            &fields(&[("site_refs", "[\"A-1\"]")]),
            &Author::default(),
        )
        .unwrap();
        assert_eq!(
            extra.records[0].extra.get("site_refs"),
            Some(&Value::String("[\"A-1\"]".into()))
        );
    }

    #[test]
    fn invalid_field_shape_is_an_api_error() {
        let store = store();
        let err = create::<DailyReport, _>(
            &store,
            &fields(&[("works_data", "[1, 2]")]),
            &Author::default(),
        )
        .unwrap_err();
        assert!(matches!(err, InspectError::Api(_)));
        assert!(store.load::<DailyReport>().is_empty());
    }

    #[test]
    fn replace_drops_unlisted_fields_but_keeps_author() {
        let store = store();
        create::<GeodeticInspection, _>(
            &store,
            &fields(&[("object", "Dam 2"), ("decision", "Accepted")]),
            &Author::named("Madiyar"),
        )
        .unwrap();

        let replaced =
            replace::<GeodeticInspection, _>(&store, 1, &fields(&[("object", "Dam 3")])).unwrap();
        let record = &replaced.records[0];
        assert_eq!(record.object, "Dam 3");
        assert_eq!(record.decision, "");
        assert_eq!(record.author.inspector_name.as_deref(), Some("Madiyar"));
        assert!(record.meta.updated_at.is_some());
    }

    #[test]
    fn merge_ignores_empty_values() {
        let store = store();
        create::<GeodeticInspection, _>(
            &store,
            &fields(&[("object", "Dam 2"), ("decision", "Accepted")]),
            &Author::named("Madiyar"),
        )
        .unwrap();

        let merged = merge::<GeodeticInspection, _>(
            &store,
            1,
            &fields(&[("decision", ""), ("status", "Closed"), ("created_at", "1999")]),
        )
        .unwrap();
        let record = &merged.records[0];
        assert_eq!(record.decision, "Accepted");
        assert_eq!(record.status, "Closed");
        assert_eq!(record.object, "Dam 2");
        assert_ne!(record.meta.created_at, "1999");
    }

    #[test]
    fn missing_ids_are_not_found() {
        let store = store();
        assert!(show::<RemarkReport, _>(&store, 4).unwrap_err().is_not_found());
        assert!(merge::<RemarkReport, _>(&store, 4, &Fields::new())
            .unwrap_err()
            .is_not_found());
        assert!(delete::<RemarkReport, _>(&store, 4).unwrap_err().is_not_found());
    }

    #[test]
    fn delete_returns_the_removed_record() {
        let store = store();
        create::<RemarkReport, _>(&store, &fields(&[("Status", "Open")]), &Author::default())
            .unwrap();
        let removed = delete::<RemarkReport, _>(&store, 1).unwrap();
        assert_eq!(removed.records[0].status, "Open");
        assert!(store.load::<RemarkReport>().is_empty());
    }
}
