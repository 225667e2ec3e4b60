pub mod document;
pub mod holiday;
pub mod leave;
pub mod notification;
pub mod organization;
pub mod performance;
pub mod role;
pub mod setting;
