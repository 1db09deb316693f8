pub use super::checklist_item::Entity as ChecklistItem;
pub use super::task::Entity as Task;
pub use super::task_attachment::Entity as TaskAttachment;
pub use super::task_comment::Entity as TaskComment;
pub use super::user::Entity as User;
