pub mod notification;
pub mod resume;
pub mod upload;
