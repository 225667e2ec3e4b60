use actix_web::{HttpRequest, Responder, web};
use serde::Deserialize;
use serde_json::json;
use sqlx::MySqlPool;
use utoipa::{IntoParams, ToSchema};

use crate::api::{created, ok, ok_message};
use crate::audit::{self, AuditEntry};
use crate::auth::auth::AuthUser;
use crate::error::HrmsError;
use crate::model::document::Document;

const DOCUMENT_COLUMNS: &str = "id, employee_id, title, file_name, category, uploaded_by, created_at";

#[derive(Deserialize, ToSchema)]
pub struct CreateDocument {
    #[schema(example = 1000)]
    pub employee_id: u64,
    #[schema(example = "Employment contract")]
    pub title: String,
    #[schema(example = "contract-2026.pdf")]
    pub file_name: String,
    #[schema(example = "contract")]
    pub category: String,
}

#[derive(Deserialize, IntoParams, ToSchema)]
pub struct DocumentQuery {
    #[schema(example = 1000)]
    pub employee_id: Option<u64>,
    #[schema(example = "contract")]
    pub category: Option<String>,
}

/// Register document metadata
#[utoipa::path(
    post,
    path = "/api/v1/documents",
    request_body = CreateDocument,
    responses((status = 201, description = "Document registered")),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn create_document(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    payload: web::Json<CreateDocument>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    if payload.title.trim().is_empty() || payload.file_name.trim().is_empty() {
        return Err(
            HrmsError::Validation("title and file_name must not be empty".to_string()).into(),
        );
    }

    let result = sqlx::query(
        r#"
        INSERT INTO documents (employee_id, title, file_name, category, uploaded_by)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(payload.employee_id)
    .bind(payload.title.trim())
    .bind(payload.file_name.trim())
    .bind(&payload.category)
    .bind(auth.user_id)
    .execute(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?;

    audit::record(
        pool.get_ref(),
        AuditEntry::new("document.create", auth.user_id, "document")
            .entity(result.last_insert_id())
            .new_values(json!({
                "employee_id": payload.employee_id,
                "file_name": payload.file_name,
            }))
            .from_request(&req),
    )
    .await;

    Ok(created("Document registered", json!({ "id": result.last_insert_id() })))
}

/// List documents by employee and/or category
#[utoipa::path(
    get,
    path = "/api/v1/documents",
    params(DocumentQuery),
    responses((status = 200, body = [Document])),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn list_documents(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    query: web::Query<DocumentQuery>,
) -> actix_web::Result<impl Responder> {
    if let Some(employee_id) = query.employee_id {
        auth.require_self_or_hr(employee_id)?;
    } else {
        auth.require_hr_or_admin()?;
    }

    let mut sql = format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE 1=1");
    if query.employee_id.is_some() {
        sql.push_str(" AND employee_id = ?");
    }
    if query.category.is_some() {
        sql.push_str(" AND category = ?");
    }
    sql.push_str(" ORDER BY created_at DESC");

    let mut q = sqlx::query_as::<_, Document>(&sql);
    if let Some(employee_id) = query.employee_id {
        q = q.bind(employee_id);
    }
    if let Some(category) = &query.category {
        q = q.bind(category);
    }

    let documents = q.fetch_all(pool.get_ref()).await.map_err(HrmsError::Database)?;
    Ok(ok(documents))
}

#[utoipa::path(
    get,
    path = "/api/v1/documents/{document_id}",
    params(("document_id" = u64, Path, description = "Document ID")),
    responses(
        (status = 200, body = Document),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn get_document(
    auth: AuthUser,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    let document = sqlx::query_as::<_, Document>(&format!(
        "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"
    ))
    .bind(path.into_inner())
    .fetch_optional(pool.get_ref())
    .await
    .map_err(HrmsError::Database)?
    .ok_or(HrmsError::NotFound { entity: "document" })?;

    auth.require_self_or_hr(document.employee_id)?;
    Ok(ok(document))
}

/// Delete document metadata
#[utoipa::path(
    delete,
    path = "/api/v1/documents/{document_id}",
    params(("document_id" = u64, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document deleted"),
        (status = 404)
    ),
    security(("bearer_auth" = [])),
    tag = "Documents"
)]
pub async fn delete_document(
    auth: AuthUser,
    req: HttpRequest,
    pool: web::Data<MySqlPool>,
    path: web::Path<u64>,
) -> actix_web::Result<impl Responder> {
    auth.require_hr_or_admin()?;

    let document_id = path.into_inner();
    let result = sqlx::query("DELETE FROM documents WHERE id = ?")
        .bind(document_id)
        .execute(pool.get_ref())
        .await
        .map_err(HrmsError::Database)?;

    if result.rows_affected() == 0 {
        return Err(HrmsError::NotFound { entity: "document" }.into());
    }

    audit::record(
        pool.get_ref(),
        AuditEntry::new("document.delete", auth.user_id, "document")
            .entity(document_id)
            .from_request(&req),
    )
    .await;

    Ok(ok_message("Document deleted"))
}
