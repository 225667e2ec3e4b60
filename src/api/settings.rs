use std::collections::BTreeMap;

use actix_web::{HttpRequest, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::core::settings_store::{
    self, ImportSetting, SettingOutcome, SettingUpdate,
};
use crate::error::HrmsError;
use crate::model::setting::SystemSetting;

const SETTING_COLUMNS: &str = "id, setting_key, setting_value, setting_type, category, \
     description, is_editable, updated_by, updated_at";

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct SettingsQuery {
    #[schema(example = "leave")]
    pub category: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct SetValueReq {
    pub setting_value: serde_json::Value,
}

/// List settings, optionally by category
#[utoipa::path(
    get,
    path = "/api/v1/settings",
    params(SettingsQuery),
    responses((status = 200, body = [SystemSetting])),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn list_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<SettingsQuery>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let settings = match &query.category {
        Some(category) => sqlx::query_as::<_, SystemSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM system_settings WHERE category = ? ORDER BY setting_key"
        ))
        .bind(category)
        .fetch_all(pool.get_ref())
        .await,
        None => sqlx::query_as::<_, SystemSetting>(&format!(
            "SELECT {SETTING_COLUMNS} FROM system_settings ORDER BY category, setting_key"
        ))
        .fetch_all(pool.get_ref())
        .await,
    }
    .map_err(HrmsError::Database)?;

    Ok(ok(settings))
}

/// Typed value for one key
#[utoipa::path(
    get,
    path = "/api/v1/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    responses(
        (status = 200, description = "Decoded value"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn get_setting(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
) -> actix_web::Result<impl Responder> {
    let key = path.into_inner();
    let value = settings_store::get_value(pool.get_ref(), &key).await?;
    Ok(ok(json!({ "setting_key": key, "setting_value": value })))
}

/// Update one editable setting
#[utoipa::path(
    put,
    path = "/api/v1/settings/{key}",
    params(("key" = String, Path, description = "Setting key")),
    request_body = SetValueReq,
    responses(
        (status = 200, description = "Setting updated"),
        (status = 403, description = "Setting is read-only"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn set_setting(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<String>,
    body: web::Json<SetValueReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let key = path.into_inner();
    let value =
        settings_store::set_value(pool.get_ref(), &key, &body.setting_value, auth.user_id).await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("setting.update", auth.user_id, "system_setting")
            .new_values(json!({ "setting_key": key, "setting_value": value }))
            .from_request(&req),
    )
    .await;

    Ok(ok(json!({ "setting_key": key, "setting_value": value })))
}

/// Bulk update; each key succeeds or fails on its own
#[utoipa::path(
    put,
    path = "/api/v1/settings",
    request_body = [SettingUpdate],
    responses((status = 200, body = [SettingOutcome])),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn bulk_update_settings(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<SettingUpdate>>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let report = settings_store::update_many(pool.get_ref(), &payload, auth.user_id).await;

    let applied = report.iter().filter(|o| o.success).count();
    audit::record(
        pool.get_ref(),
        AuditEntry::new("setting.bulk_update", auth.user_id, "system_setting")
            .new_values(json!({
                "requested": report.len(),
                "applied": applied,
            }))
            .from_request(&req),
    )
    .await;

    Ok(ok(report))
}

/// Import settings: updates existing editable keys, creates missing ones
#[utoipa::path(
    post,
    path = "/api/v1/settings/import",
    request_body = [ImportSetting],
    responses((status = 200, body = [SettingOutcome])),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn import_settings(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<Vec<ImportSetting>>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let report = settings_store::import_settings(pool.get_ref(), &payload, auth.user_id).await;

    let applied = report.iter().filter(|o| o.success).count();
    audit::record(
        pool.get_ref(),
        AuditEntry::new("setting.import", auth.user_id, "system_setting")
            .new_values(json!({ "requested": report.len(), "applied": applied }))
            .from_request(&req),
    )
    .await;

    Ok(ok(report))
}

/// Export all settings grouped by category
#[utoipa::path(
    get,
    path = "/api/v1/settings/export",
    responses((status = 200, description = "Settings grouped by category")),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn export_settings(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let settings = sqlx::query_as::<_, SystemSetting>(&format!(
        "SELECT {SETTING_COLUMNS} FROM system_settings ORDER BY category, setting_key"
    ))
    .fetch_all(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    let mut grouped: BTreeMap<String, Vec<SystemSetting>> = BTreeMap::new();
    for setting in settings {
        grouped.entry(setting.category.clone()).or_default().push(setting);
    }

    Ok(ok(grouped))
}

/// Refresh the in-process settings cache from the database
#[utoipa::path(
    post,
    path = "/api/v1/settings/refresh-cache",
    responses((status = 200, description = "Cache reloaded")),
    security(("bearer_auth" = [])),
    tag = "Settings"
)]
pub async fn refresh_cache(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    settings_store::warmup(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    Ok(ok_message("Settings cache reloaded"))
}
