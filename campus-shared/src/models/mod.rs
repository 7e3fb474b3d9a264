pub mod errors;
pub mod message;
pub mod pagination;
pub mod timestamp;
pub mod user;
pub mod views;

pub use errors::{ErrorBody, FieldErrors};
pub use message::{Message, MessageId, SendMessageRequest};
pub use pagination::{
    DEFAULT_PER_PAGE, FilterSet, FilterValue, ListQuery, Page, PageLinks, PageMeta,
    PaginationState, last_page_for,
};
pub use timestamp::{Timestamp, TimestampError};
pub use user::{CurrentUser, Role, Session, UserId, UserRef};
pub use views::{DashboardStats, ProfileView};
