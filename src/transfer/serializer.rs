//! Generic, introspection-driven record serialization.
//!
//! Export and import never hand-write per-type field lists. Export walks an
//! entity's declared columns through [`serialize_model`]; import rebuilds an
//! active model from a JSON record through [`apply_record`], coercing values
//! to each column's declared type. Only declared columns are ever copied;
//! relationship keys and the preserved original id ride alongside and are
//! ignored here by construction.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ColumnType, EntityTrait, IdenStatic, Iterable, ModelTrait,
    PrimaryKeyToColumn, Value,
};
use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

use super::id_map::IdMap;
use super::{ORIGINAL_ID_KEY, RELATION_KEY_PREFIX};

/// True iff the wrapped column value is absent. sea-query 0.30 has no
/// `Value::is_null`; this mirrors the predicate later versions ship.
fn value_is_null(value: &Value) -> bool {
    matches!(
        value,
        Value::Bool(None)
            | Value::TinyInt(None)
            | Value::SmallInt(None)
            | Value::Int(None)
            | Value::BigInt(None)
            | Value::TinyUnsigned(None)
            | Value::SmallUnsigned(None)
            | Value::Unsigned(None)
            | Value::BigUnsigned(None)
            | Value::Float(None)
            | Value::Double(None)
            | Value::String(None)
            | Value::Char(None)
            | Value::Bytes(None)
            | Value::Json(None)
            | Value::ChronoDate(None)
            | Value::ChronoTime(None)
            | Value::ChronoDateTime(None)
            | Value::ChronoDateTimeUtc(None)
            | Value::ChronoDateTimeLocal(None)
            | Value::ChronoDateTimeWithTimeZone(None)
            | Value::TimeDate(None)
            | Value::TimeTime(None)
            | Value::TimeDateTime(None)
            | Value::TimeDateTimeWithTimeZone(None)
            | Value::Uuid(None)
            | Value::Decimal(None)
            | Value::BigDecimal(None)
    )
}

/// Map one database value to a JSON-safe value.
///
/// Timestamps and dates become ISO-8601 strings, uuids become strings,
/// decimals become floats. Types with no natural JSON shape fall back to
/// their debug representation; that fallback is lossy by design.
pub fn serialize_value(value: Value) -> JsonValue {
    if value_is_null(&value) {
        return JsonValue::Null;
    }
    match value {
        Value::Bool(Some(v)) => JsonValue::Bool(v),
        Value::TinyInt(Some(v)) => json!(v),
        Value::SmallInt(Some(v)) => json!(v),
        Value::Int(Some(v)) => json!(v),
        Value::BigInt(Some(v)) => json!(v),
        Value::TinyUnsigned(Some(v)) => json!(v),
        Value::SmallUnsigned(Some(v)) => json!(v),
        Value::Unsigned(Some(v)) => json!(v),
        Value::BigUnsigned(Some(v)) => json!(v),
        Value::Float(Some(v)) => json!(v),
        Value::Double(Some(v)) => json!(v),
        Value::String(Some(v)) => JsonValue::String(*v),
        Value::Char(Some(v)) => JsonValue::String(v.to_string()),
        Value::Json(Some(v)) => *v,
        Value::Uuid(Some(v)) => JsonValue::String(v.to_string()),
        Value::ChronoDate(Some(v)) => JsonValue::String(v.format("%Y-%m-%d").to_string()),
        Value::ChronoTime(Some(v)) => JsonValue::String(v.format("%H:%M:%S%.f").to_string()),
        Value::ChronoDateTime(Some(v)) => {
            JsonValue::String(v.format("%Y-%m-%dT%H:%M:%S%.f").to_string())
        }
        Value::ChronoDateTimeUtc(Some(v)) => JsonValue::String(v.to_rfc3339()),
        Value::ChronoDateTimeLocal(Some(v)) => JsonValue::String(v.to_rfc3339()),
        Value::ChronoDateTimeWithTimeZone(Some(v)) => JsonValue::String(v.to_rfc3339()),
        Value::Decimal(Some(v)) => match v.to_string().parse::<f64>() {
            Ok(f) => json!(f),
            Err(_) => JsonValue::String(v.to_string()),
        },
        Value::BigDecimal(Some(v)) => match v.to_string().parse::<f64>() {
            Ok(f) => json!(f),
            Err(_) => JsonValue::String(v.to_string()),
        },
        other => JsonValue::String(format!("{:?}", other)),
    }
}

/// Serialize every declared column of a model. Relationships are never
/// expanded here; descriptors add them one level deep under namespaced keys.
pub fn serialize_model<M: ModelTrait>(model: &M) -> Map<String, JsonValue> {
    let mut record = Map::new();
    for col in <<M as ModelTrait>::Entity as EntityTrait>::Column::iter() {
        record.insert(col.as_str().to_owned(), serialize_value(model.get(col)));
    }
    record
}

/// Stash the record's pre-export primary key under [`ORIGINAL_ID_KEY`].
pub fn stash_original_id(record: &mut Map<String, JsonValue>, id: &str) {
    record.insert(ORIGINAL_ID_KEY.to_owned(), JsonValue::String(id.to_owned()));
}

/// Namespace a relationship name so it can never collide with a column.
pub fn relation_key(relation_name: &str) -> String {
    format!("{}{}", RELATION_KEY_PREFIX, relation_name)
}

/// Guess the registry type name a `*_id` column references from its name
/// (`round_type_id` -> `RoundType`). Fallback only; descriptors carry an
/// explicit map for the columns that matter.
pub fn guess_referenced_type(field_name: &str) -> Option<String> {
    let base = field_name.strip_suffix("_id")?;
    if base.is_empty() {
        return None;
    }
    let mut out = String::with_capacity(base.len());
    for part in base.split('_') {
        let mut chars = part.chars();
        if let Some(first) = chars.next() {
            out.push(first.to_ascii_uppercase());
            out.extend(chars);
        }
    }
    Some(out)
}

/// Parse an ISO-8601 timestamp, normalizing a trailing `Z` designator to an
/// explicit offset first. Naive timestamps are taken as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let normalized = if let Some(stripped) = raw.strip_suffix('Z') {
        format!("{}+00:00", stripped)
    } else {
        raw.to_owned()
    };
    if let Ok(dt) = DateTime::parse_from_rfc3339(&normalized) {
        return Some(dt.with_timezone(&Utc));
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(raw, fmt) {
            return Some(Utc.from_utc_datetime(&naive));
        }
    }
    None
}

/// Parse a date, accepting either `YYYY-MM-DD` or a full timestamp.
pub fn parse_date(raw: &str) -> Option<NaiveDate> {
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return Some(date);
    }
    parse_timestamp(raw).map(|dt| dt.date_naive())
}

/// Coerce a JSON value to the database value a column of this declared type
/// stores. Returns `None` when the column should stay unset: JSON null, or a
/// value that cannot be represented in the column's type (an unparseable
/// timestamp degrades to an unset column instead of failing the import).
pub fn json_to_column_value(column_type: &ColumnType, value: &JsonValue) -> Option<Value> {
    if value.is_null() {
        return None;
    }
    Some(match column_type {
        ColumnType::String(_) | ColumnType::Text | ColumnType::Char(_) => match value {
            JsonValue::String(s) => s.clone().into(),
            other => other.to_string().into(),
        },
        ColumnType::TinyInteger => i8::try_from(integer_from_json(value)?).ok()?.into(),
        ColumnType::SmallInteger => i16::try_from(integer_from_json(value)?).ok()?.into(),
        ColumnType::Integer => i32::try_from(integer_from_json(value)?).ok()?.into(),
        ColumnType::BigInteger => integer_from_json(value)?.into(),
        ColumnType::Float => (float_from_json(value)? as f32).into(),
        ColumnType::Double => float_from_json(value)?.into(),
        ColumnType::Boolean => match value {
            JsonValue::Bool(b) => (*b).into(),
            JsonValue::Number(n) => (n.as_i64().unwrap_or(0) != 0).into(),
            JsonValue::String(s) => matches!(s.as_str(), "true" | "t" | "1").into(),
            _ => return None,
        },
        ColumnType::Date => parse_date(value.as_str()?)?.into(),
        ColumnType::DateTime | ColumnType::Timestamp | ColumnType::TimestampWithTimeZone => {
            parse_timestamp(value.as_str()?)?.into()
        }
        ColumnType::Json | ColumnType::JsonBinary => Value::Json(Some(Box::new(value.clone()))),
        ColumnType::Uuid => Uuid::parse_str(value.as_str()?).ok()?.into(),
        _ => match value {
            JsonValue::String(s) => s.clone().into(),
            _ => return None,
        },
    })
}

fn integer_from_json(value: &JsonValue) -> Option<i64> {
    match value {
        JsonValue::Number(n) => n.as_i64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

fn float_from_json(value: &JsonValue) -> Option<f64> {
    match value {
        JsonValue::Number(n) => n.as_f64(),
        JsonValue::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Rebuild an active model from a serialized record.
///
/// Only declared columns are consulted, so relationship keys and the
/// preserved original id are dropped by construction. Foreign keys are
/// rewritten through the id map when a mapping exists and left untouched
/// otherwise. The primary key always gets a fresh uuid and `user_id` is
/// forced to the importing user regardless of what the record says.
/// `created_at`/`updated_at` columns left unset by the record are filled
/// with the current time.
///
/// Returns the staged model, the generated primary key, and the record's
/// preserved original id if it carried one.
pub fn apply_record<A>(
    record: &Map<String, JsonValue>,
    foreign_keys: &[(&str, &str)],
    user_id: &str,
    id_map: &IdMap,
) -> (A, String, Option<String>)
where
    A: ActiveModelTrait,
{
    let original_id = record
        .get(ORIGINAL_ID_KEY)
        .and_then(JsonValue::as_str)
        .map(str::to_owned);

    let pk_col = <<A::Entity as EntityTrait>::PrimaryKey as Iterable>::iter()
        .next()
        .map(|pk| pk.into_column());
    let pk_name = pk_col.as_ref().map(|c| c.as_str());

    let mut active = <A as ActiveModelTrait>::default();

    for col in <A::Entity as EntityTrait>::Column::iter() {
        let name = col.as_str();

        if Some(name) == pk_name {
            continue;
        }
        if name == "user_id" {
            active.set(col, user_id.to_owned().into());
            continue;
        }
        let Some(raw) = record.get(name) else {
            continue;
        };

        if let Some(referenced) = referenced_type(name, foreign_keys) {
            if let Some(original) = raw.as_str() {
                if let Some(mapped) = id_map.get(&referenced, original) {
                    active.set(col, mapped.to_owned().into());
                    continue;
                }
            }
        }

        if let Some(value) = json_to_column_value(col.def().get_column_type(), raw) {
            active.set(col, value);
        }
    }

    let new_id = Uuid::new_v4().to_string();
    if let Some(pk) = pk_col {
        active.set(pk, new_id.clone().into());
    }

    for col in <A::Entity as EntityTrait>::Column::iter() {
        let name = col.as_str();
        if (name == "created_at" || name == "updated_at") && active.is_not_set(col) {
            active.set(col, Utc::now().into());
        }
    }

    (active, new_id, original_id)
}

fn referenced_type(field_name: &str, foreign_keys: &[(&str, &str)]) -> Option<String> {
    if let Some((_, referenced)) = foreign_keys.iter().find(|(field, _)| *field == field_name) {
        return Some((*referenced).to_owned());
    }
    if field_name.ends_with("_id") {
        return guess_referenced_type(field_name);
    }
    None
}
