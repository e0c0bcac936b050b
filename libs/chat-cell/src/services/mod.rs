pub mod admin;
pub mod conversation;
pub mod live;

pub use admin::ChatAdminService;
pub use conversation::ChatService;
pub use live::stream_conversation;
