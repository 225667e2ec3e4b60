use crate::api::document::{CreateDocument, DocumentQuery};
use crate::api::holiday::{
    HolidayQuery, SeedDefaultsReq, UpdateHoliday, WorkingDayCheck, WorkingDaysQuery,
};
use crate::api::notification::{CreateNotification, NotificationQuery};
use crate::api::organization::{
    AssignManagerReq, CreateDepartment, LevelsQuery, UpdateDepartment,
};
use crate::api::performance::{
    CreateCycleReq, CreateReview, ReviewFilter, ReviewListResponse, UpdateReview,
};
use crate::api::policy::{
    AdjustBalanceReq, BalanceQuery, CreatePolicy, InitYearReq, PolicyQuery, UpdatePolicy,
    ValidateLeaveReq,
};
use crate::api::settings::{SetValueReq, SettingsQuery};
use crate::core::review_workflow::CycleOutcome;
use crate::core::settings_store::{ImportSetting, SettingOutcome, SettingUpdate, SettingValue};
use crate::model::document::Document;
use crate::model::holiday::{Holiday, NewHoliday};
use crate::model::leave::{EmployeeLeaveBalance, LeavePolicy};
use crate::model::notification::Notification;
use crate::model::organization::{Department, HierarchyNode, ManagerEdge};
use crate::model::performance::PerformanceReview;
use crate::model::setting::{SettingType, SystemSetting};
use utoipa::Modify;
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "HRM System API",
        version = "1.0.0",
        description = r#"
## Human Resource Management (HRM) System

This API powers a **Human Resource Management (HRM)** system designed to manage core HR operations within an organization.

### 🔹 Key Features
- **Leave Policies & Balances**
  - Configure leave policies, validate requests, and track yearly balances with carry-forward
- **Holiday Calendar**
  - Maintain the company holiday calendar and working-day calculations
- **Organization**
  - Departments, manager assignment, and hierarchy traversal
- **Performance Reviews**
  - DRAFT → SUBMITTED → REVIEWED → APPROVED workflow with weighted scoring
- **System Settings**
  - Typed key/value configuration with bulk update and import/export
- **Documents & Notifications**
  - Employee document metadata and in-app notifications

### 🔐 Security
Most endpoints are protected using **JWT Bearer authentication**.
Only authorized roles such as **Admin** or **HR** can access sensitive operations.

### 📦 Response Format
- JSON-based RESTful responses
- Pagination supported for list endpoints

---
Built with **Rust**, **Actix Web**, **SQLx**, and **Utoipa**.
"#,
    ),
    paths(
        crate::api::policy::create_policy,
        crate::api::policy::list_policies,
        crate::api::policy::get_policy,
        crate::api::policy::update_policy,
        crate::api::policy::delete_policy,
        crate::api::policy::validate_request,
        crate::api::policy::get_balance,
        crate::api::policy::adjust_balance,
        crate::api::policy::initialize_year,

        crate::api::holiday::list_holidays,
        crate::api::holiday::create_holiday,
        crate::api::holiday::bulk_create_holidays,
        crate::api::holiday::seed_default_holidays,
        crate::api::holiday::working_days_in_month,
        crate::api::holiday::is_working_day,
        crate::api::holiday::update_holiday,
        crate::api::holiday::delete_holiday,

        crate::api::organization::create_department,
        crate::api::organization::list_departments,
        crate::api::organization::update_department,
        crate::api::organization::delete_department,
        crate::api::organization::assign_manager,
        crate::api::organization::current_manager,
        crate::api::organization::manager_hierarchy,
        crate::api::organization::team_hierarchy,

        crate::api::performance::create_review,
        crate::api::performance::list_reviews,
        crate::api::performance::get_review,
        crate::api::performance::update_review,
        crate::api::performance::delete_review,
        crate::api::performance::submit_review,
        crate::api::performance::mark_reviewed,
        crate::api::performance::approve_review,
        crate::api::performance::create_cycle,

        crate::api::settings::list_settings,
        crate::api::settings::get_setting,
        crate::api::settings::set_setting,
        crate::api::settings::bulk_update_settings,
        crate::api::settings::import_settings,
        crate::api::settings::export_settings,
        crate::api::settings::refresh_cache,

        crate::api::document::create_document,
        crate::api::document::list_documents,
        crate::api::document::get_document,
        crate::api::document::delete_document,

        crate::api::notification::list_notifications,
        crate::api::notification::unread_count,
        crate::api::notification::mark_read,
        crate::api::notification::mark_all_read,
        crate::api::notification::create_notification
    ),
    components(
        schemas(
            LeavePolicy,
            EmployeeLeaveBalance,
            CreatePolicy,
            UpdatePolicy,
            PolicyQuery,
            ValidateLeaveReq,
            BalanceQuery,
            AdjustBalanceReq,
            InitYearReq,
            Holiday,
            NewHoliday,
            HolidayQuery,
            UpdateHoliday,
            WorkingDaysQuery,
            WorkingDayCheck,
            SeedDefaultsReq,
            Department,
            ManagerEdge,
            HierarchyNode,
            CreateDepartment,
            UpdateDepartment,
            AssignManagerReq,
            LevelsQuery,
            PerformanceReview,
            CreateReview,
            UpdateReview,
            ReviewFilter,
            ReviewListResponse,
            CreateCycleReq,
            CycleOutcome,
            SystemSetting,
            SettingType,
            SettingValue,
            SettingsQuery,
            SetValueReq,
            SettingUpdate,
            SettingOutcome,
            ImportSetting,
            Document,
            CreateDocument,
            DocumentQuery,
            Notification,
            CreateNotification,
            NotificationQuery
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Policies", description = "Leave policy and balance APIs"),
        (name = "Holidays", description = "Holiday calendar APIs"),
        (name = "Organization", description = "Department and hierarchy APIs"),
        (name = "Performance", description = "Performance review workflow APIs"),
        (name = "Settings", description = "System settings APIs"),
        (name = "Documents", description = "Document metadata APIs"),
        (name = "Notifications", description = "Notification APIs"),
    )
)]
pub struct ApiDoc;

pub struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
