pub mod prelude;

pub mod checklist_item;
pub mod task;
pub mod task_attachment;
pub mod task_comment;
pub mod user;
