//! Typed key/value settings with a read-through cache.
//!
//! Raw values are stored as strings and decoded per `setting_type` on read.
//! Decoded values sit in an in-process moka cache; every successful write
//! invalidates its key, and a startup warmup pre-loads the whole table.

use moka::future::Cache;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use sqlx::MySqlPool;
use std::str::FromStr;
use std::time::Duration;
use utoipa::ToSchema;

use crate::error::{HrmsError, HrmsResult};
use crate::model::setting::SettingType;

static SETTING_CACHE: Lazy<Cache<String, SettingValue>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(10_000)
        .time_to_live(Duration::from_secs(300))
        .build()
});

/// A decoded setting value. Serializes untagged, so a NUMBER comes out as a
/// JSON number, a BOOLEAN as a bool, and so on.
#[derive(Debug, Clone, PartialEq, Serialize, ToSchema)]
#[serde(untagged)]
pub enum SettingValue {
    String(String),
    Number(f64),
    Boolean(bool),
    Json(Value),
}

/// Decodes the persisted string form per the declared type.
pub fn decode(raw: &str, setting_type: SettingType) -> HrmsResult<SettingValue> {
    match setting_type {
        SettingType::String => Ok(SettingValue::String(raw.to_string())),
        SettingType::Number => raw
            .trim()
            .parse::<f64>()
            .map(SettingValue::Number)
            .map_err(|_| HrmsError::Validation(format!("'{raw}' is not a valid number"))),
        SettingType::Boolean => Ok(SettingValue::Boolean(raw.eq_ignore_ascii_case("true"))),
        SettingType::Json => serde_json::from_str(raw)
            .map(SettingValue::Json)
            .map_err(|_| HrmsError::Validation(format!("'{raw}' is not valid JSON"))),
    }
}

/// Validates an incoming JSON value against the declared type and returns
/// the string form to persist.
pub fn encode(value: &Value, setting_type: SettingType) -> HrmsResult<String> {
    match (setting_type, value) {
        (SettingType::String, Value::String(s)) => Ok(s.clone()),
        (SettingType::Number, Value::Number(n)) => Ok(n.to_string()),
        (SettingType::Boolean, Value::Bool(b)) => Ok(b.to_string()),
        (SettingType::Json, v) => Ok(v.to_string()),
        (expected, got) => Err(HrmsError::Validation(format!(
            "expected a {expected} value, got {got}"
        ))),
    }
}

fn parse_type(raw: &str) -> HrmsResult<SettingType> {
    SettingType::from_str(raw)
        .map_err(|_| HrmsError::Validation(format!("unknown setting type '{raw}'")))
}

/// Typed read, served from cache when possible.
pub async fn get_value(pool: &MySqlPool, key: &str) -> HrmsResult<SettingValue> {
    if let Some(hit) = SETTING_CACHE.get(key).await {
        return Ok(hit);
    }

    let row = sqlx::query_as::<_, (String, String)>(
        "SELECT setting_value, setting_type FROM system_settings WHERE setting_key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?
    .ok_or(HrmsError::NotFound { entity: "setting" })?;

    let value = decode(&row.0, parse_type(&row.1)?)?;
    SETTING_CACHE.insert(key.to_string(), value.clone()).await;
    Ok(value)
}

/// Typed write. Fails for a missing key, a read-only key, or a value that
/// does not match the declared type. Invalidates the cache entry.
pub async fn set_value(
    pool: &MySqlPool,
    key: &str,
    value: &Value,
    updated_by: u64,
) -> HrmsResult<SettingValue> {
    let row = sqlx::query_as::<_, (String, bool)>(
        "SELECT setting_type, is_editable FROM system_settings WHERE setting_key = ?",
    )
    .bind(key)
    .fetch_optional(pool)
    .await?
    .ok_or(HrmsError::NotFound { entity: "setting" })?;

    if !row.1 {
        return Err(HrmsError::ReadOnlySetting(key.to_string()));
    }

    let setting_type = parse_type(&row.0)?;
    let encoded = encode(value, setting_type)?;

    sqlx::query(
        "UPDATE system_settings SET setting_value = ?, updated_by = ? WHERE setting_key = ?",
    )
    .bind(&encoded)
    .bind(updated_by)
    .bind(key)
    .execute(pool)
    .await?;

    SETTING_CACHE.invalidate(key).await;
    decode(&encoded, setting_type)
}

/// One item of a bulk update/import report.
#[derive(Debug, Serialize, ToSchema)]
pub struct SettingOutcome {
    #[schema(example = "leave.auto_approve_threshold")]
    pub setting_key: String,
    pub success: bool,
    #[schema(nullable = true)]
    pub message: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SettingUpdate {
    pub setting_key: String,
    pub setting_value: Value,
}

/// Applies each update independently; one bad key never aborts the rest.
pub async fn update_many(
    pool: &MySqlPool,
    updates: &[SettingUpdate],
    updated_by: u64,
) -> Vec<SettingOutcome> {
    let mut report = Vec::with_capacity(updates.len());
    for update in updates {
        let outcome = match set_value(pool, &update.setting_key, &update.setting_value, updated_by)
            .await
        {
            Ok(_) => SettingOutcome {
                setting_key: update.setting_key.clone(),
                success: true,
                message: None,
            },
            Err(e) => SettingOutcome {
                setting_key: update.setting_key.clone(),
                success: false,
                message: Some(e.to_string()),
            },
        };
        report.push(outcome);
    }
    report
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ImportSetting {
    pub setting_key: String,
    pub setting_value: Value,
    pub setting_type: SettingType,
    #[serde(default = "default_category")]
    pub category: String,
    pub description: Option<String>,
    #[serde(default = "default_editable")]
    pub is_editable: bool,
}

fn default_category() -> String {
    "general".to_string()
}

fn default_editable() -> bool {
    true
}

/// Import upserts: existing keys go through the editable-guarded write path
/// (keeping their stored type), missing keys are created as declared.
pub async fn import_settings(
    pool: &MySqlPool,
    items: &[ImportSetting],
    updated_by: u64,
) -> Vec<SettingOutcome> {
    let mut report = Vec::with_capacity(items.len());
    for item in items {
        let result = import_one(pool, item, updated_by).await;
        report.push(match result {
            Ok(_) => SettingOutcome {
                setting_key: item.setting_key.clone(),
                success: true,
                message: None,
            },
            Err(e) => SettingOutcome {
                setting_key: item.setting_key.clone(),
                success: false,
                message: Some(e.to_string()),
            },
        });
    }
    report
}

async fn import_one(pool: &MySqlPool, item: &ImportSetting, updated_by: u64) -> HrmsResult<()> {
    let exists: bool = sqlx::query_scalar(
        "SELECT EXISTS(SELECT 1 FROM system_settings WHERE setting_key = ?)",
    )
    .bind(&item.setting_key)
    .fetch_one(pool)
    .await?;

    if exists {
        set_value(pool, &item.setting_key, &item.setting_value, updated_by).await?;
        return Ok(());
    }

    let encoded = encode(&item.setting_value, item.setting_type)?;
    sqlx::query(
        r#"
        INSERT INTO system_settings
            (setting_key, setting_value, setting_type, category, description, is_editable, updated_by)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&item.setting_key)
    .bind(&encoded)
    .bind(item.setting_type.to_string())
    .bind(&item.category)
    .bind(item.description.as_deref())
    .bind(item.is_editable)
    .bind(updated_by)
    .execute(pool)
    .await?;

    SETTING_CACHE.invalidate(&item.setting_key).await;
    Ok(())
}

/// Pre-loads every decodable setting into the cache. Rows that fail to
/// decode are logged and skipped; they will fail loudly on first real read.
pub async fn warmup(pool: &MySqlPool) -> Result<(), sqlx::Error> {
    let rows = sqlx::query_as::<_, (String, String, String)>(
        "SELECT setting_key, setting_value, setting_type FROM system_settings",
    )
    .fetch_all(pool)
    .await?;

    let mut loaded = 0usize;
    for (key, raw, type_raw) in rows {
        match parse_type(&type_raw).and_then(|t| decode(&raw, t)) {
            Ok(value) => {
                SETTING_CACHE.insert(key, value).await;
                loaded += 1;
            }
            Err(e) => tracing::warn!(error = %e, key, "undecodable setting skipped in warmup"),
        }
    }

    tracing::info!(loaded, "settings cache warmed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn number_decodes_via_float_parse() {
        assert_eq!(decode("2.5", SettingType::Number).unwrap(), SettingValue::Number(2.5));
        assert_eq!(decode(" 10 ", SettingType::Number).unwrap(), SettingValue::Number(10.0));
        assert!(decode("ten", SettingType::Number).is_err());
    }

    #[test]
    fn boolean_compare_is_case_insensitive() {
        assert_eq!(decode("TRUE", SettingType::Boolean).unwrap(), SettingValue::Boolean(true));
        assert_eq!(decode("true", SettingType::Boolean).unwrap(), SettingValue::Boolean(true));
        // Anything that is not "true" reads as false.
        assert_eq!(decode("yes", SettingType::Boolean).unwrap(), SettingValue::Boolean(false));
    }

    #[test]
    fn json_round_trips_through_parse() {
        let value = decode(r#"{"days":[1,2]}"#, SettingType::Json).unwrap();
        assert_eq!(value, SettingValue::Json(json!({"days": [1, 2]})));
        assert!(decode("{broken", SettingType::Json).is_err());
    }

    #[test]
    fn string_passes_through_untouched() {
        assert_eq!(
            decode("plain text", SettingType::String).unwrap(),
            SettingValue::String("plain text".to_string())
        );
    }

    #[test]
    fn encode_rejects_type_mismatches() {
        assert!(encode(&json!("abc"), SettingType::Number).is_err());
        assert!(encode(&json!(5), SettingType::Boolean).is_err());
        assert!(encode(&json!(true), SettingType::String).is_err());
    }

    #[test]
    fn encode_accepts_matching_types() {
        assert_eq!(encode(&json!("abc"), SettingType::String).unwrap(), "abc");
        assert_eq!(encode(&json!(2.5), SettingType::Number).unwrap(), "2.5");
        assert_eq!(encode(&json!(false), SettingType::Boolean).unwrap(), "false");
        assert_eq!(
            encode(&json!({"a": 1}), SettingType::Json).unwrap(),
            r#"{"a":1}"#
        );
    }
}
