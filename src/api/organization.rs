use actix_web::{HttpRequest, Responder, web};
use chrono::{NaiveDate, Utc};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::core::org_graph::{self, DEFAULT_MANAGER_LEVELS, DEFAULT_TEAM_LEVELS};
use crate::error::HrmsError;
use crate::model::organization::{Department, HierarchyNode, ManagerEdge};

#[derive(Deserialize, ToSchema)]
pub struct CreateDepartment {
    #[schema(example = "Engineering")]
    pub name: String,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateDepartment {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct AssignManagerReq {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = 1001)]
    pub manager_id: u64,
    /// Defaults to today
    #[schema(example = "2026-09-01", value_type = String, format = "date", nullable = true)]
    pub effective_from: Option<NaiveDate>,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct LevelsQuery {
    /// Traversal depth cap
    #[schema(example = 5)]
    pub max_levels: Option<u32>,
}

/// Create department
#[utoipa::path(
    post,
    path = "/api/v1/organization/departments",
    request_body = CreateDepartment,
    responses(
        (status = 201, description = "Department created"),
        (status = 409, description = "Name already in use")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn create_department(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.name.trim().is_empty() {
        return Err(HrmsError::Validation("department name must not be empty".to_string()).into());
    }

    let result = sqlx::query("INSERT INTO departments (name, description) VALUES (?, ?)")
        .bind(payload.name.trim())
        .bind(payload.description.as_deref())
        .execute(pool.get_ref())
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23000") => {
                HrmsError::Conflict(format!("department '{}' already exists", payload.name))
            }
            _ => HrmsError::Database(e),
        })?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("department.create", auth.user_id, "department")
            .entity(result.last_insert_id())
            .new_values(json!({ "name": payload.name }))
            .from_request(&req),
    )
    .await;

    Ok(created("Department created", json!({ "id": result.last_insert_id() })))
}

/// List active departments
#[utoipa::path(
    get,
    path = "/api/v1/organization/departments",
    responses((status = 200, body = [Department])),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn list_departments(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
) -> actix_web::Result<impl Responder> {
    let departments = sqlx::query_as::<_, Department>(
        "SELECT id, name, description, is_active FROM departments WHERE is_active = 1 ORDER BY name",
    )
    .fetch_all(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    Ok(ok(departments))
}

/// Update department (fetch-merge-update)
#[utoipa::path(
    put,
    path = "/api/v1/organization/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    request_body = UpdateDepartment,
    responses(
        (status = 200, description = "Department updated"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn update_department(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    body: web::Json<UpdateDepartment>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let department_id = path.into_inner();
    let current = sqlx::query_as::<_, Department>(
        "SELECT id, name, description, is_active FROM departments WHERE id = ?",
    )
    .bind(department_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?
    .ok_or(HrmsError::NotFound { entity: "department" })?;

    let name = body.name.clone().unwrap_or(current.name);
    let description = body.description.clone().or(current.description);

    sqlx::query("UPDATE departments SET name = ?, description = ? WHERE id = ?")
        .bind(&name)
        .bind(description.as_deref())
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("department.update", auth.user_id, "department")
            .entity(department_id)
            .new_values(json!({ "name": name }))
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Department updated"))
}

/// Soft-delete department
#[utoipa::path(
    delete,
    path = "/api/v1/organization/departments/{department_id}",
    params(("department_id" = u64, Path, description = "Department ID")),
    responses(
        (status = 200, description = "Department deactivated"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn delete_department(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_admin()?;

    let department_id = path.into_inner();
    let result = sqlx::query("UPDATE departments SET is_active = 0 WHERE id = ? AND is_active = 1")
        .bind(department_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "department" }.into());
    }

    audit::record(
        pool.get_ref(),
        AuditEntry::new("department.delete", auth.user_id, "department")
            .entity(department_id)
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Department deactivated"))
}

/// Assign a manager; retires the previous active edge atomically
#[utoipa::path(
    post,
    path = "/api/v1/organization/managers",
    request_body = AssignManagerReq,
    responses(
        (status = 200, description = "Manager assigned"),
        (status = 409, description = "Self-assignment rejected")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn assign_manager(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<AssignManagerReq>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let effective_from = payload.effective_from.unwrap_or_else(|| Utc::now().date_naive());
    org_graph::assign_manager(
        pool.get_ref(),
        payload.employee_id,
        payload.manager_id,
        effective_from,
    )
    .await?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("manager.assign", auth.user_id, "employee_manager")
            .entity(payload.employee_id)
            .new_values(json!({
                "manager_id": payload.manager_id,
                "effective_from": effective_from,
            }))
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Manager assigned"))
}

/// The employee's current active manager edge, if any
#[utoipa::path(
    get,
    path = "/api/v1/organization/managers/{employee_id}",
    params(("employee_id" = u64, Path, description = "Employee ID")),
    responses(
        (status = 200, body = ManagerEdge),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn current_manager(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let edge = sqlx::query_as::<_, ManagerEdge>(
        r#"
        SELECT id, employee_id, manager_id, effective_from, effective_to, is_active
        FROM employee_managers
        WHERE employee_id = ? AND is_active = 1
        "#,
    )
    .bind(employee_id)
    .fetch_optional(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?
    .ok_or(HrmsError::NotFound { entity: "manager assignment" })?;

    Ok(ok(edge))
}

/// Upward chain of managers, closest first
#[utoipa::path(
    get,
    path = "/api/v1/organization/hierarchy/{employee_id}",
    params(
        ("employee_id" = u64, Path, description = "Employee ID"),
        LevelsQuery
    ),
    responses(
        (status = 200, body = [HierarchyNode]),
        (status = 409, description = "Management chain contains a cycle")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn manager_hierarchy(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<LevelsQuery>,
) -> actix_web::Result<impl Responder> {
    let employee_id = path.into_inner();
    let max_levels = query.max_levels.unwrap_or(DEFAULT_MANAGER_LEVELS);

    let chain = org_graph::manager_hierarchy(pool.get_ref(), employee_id, max_levels).await?;
    Ok(ok(chain))
}

/// Direct and indirect reports, level by level
#[utoipa::path(
    get,
    path = "/api/v1/organization/team/{manager_id}",
    params(
        ("manager_id" = u64, Path, description = "Manager's employee ID"),
        LevelsQuery
    ),
    responses(
        (status = 200, body = [HierarchyNode]),
        (status = 409, description = "Management chain contains a cycle")
    ),
    security(("bearer_auth" = [])),
    tag = "Organization"
)]
pub async fn team_hierarchy(
    _auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
    query: web::Query<LevelsQuery>,
) -> actix_web::Result<impl Responder> {
    let manager_id = path.into_inner();
    let max_levels = query.max_levels.unwrap_or(DEFAULT_TEAM_LEVELS);

    let team = org_graph::team_hierarchy(pool.get_ref(), manager_id, max_levels).await?;
    Ok(ok(team))
}
