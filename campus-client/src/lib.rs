#![cfg_attr(not(test), forbid(unsafe_code))]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

//! Client core for Campus Admin: generation-gated resource controllers,
//! paginated lists, and conversation aggregation over the campus REST API.

pub mod error;
pub mod list;
pub mod messaging;
pub mod resource;
pub mod transport;

pub use error::{ApiError, ApiResult};
pub use list::{ListView, PaginatedListController};
pub use messaging::{Conversation, ConversationThread, Inbox, InboxEndpoints};
pub use resource::{
    MutationOutcome, ResourceController, ResourceLoader, ResourceState, ResourceStatus,
    ResourceView, RestResource, Ticket,
};
pub use transport::{ApiTransport, HttpTransport};
