pub mod holiday_calendar;
pub mod leave_policy;
pub mod org_graph;
pub mod review_workflow;
pub mod settings_store;
