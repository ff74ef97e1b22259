mod notification_dispatcher;
mod token_service;

pub use notification_dispatcher::{DispatchOutcome, NotificationDispatcher};
pub use token_service::{PushTokenService, PushTokenStore, UserProfileService, UserProfileStore};
