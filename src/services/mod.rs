pub mod dashboard_service;
pub mod report_service;
pub mod task_service;
pub mod user_service;
