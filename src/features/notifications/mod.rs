pub mod clients;
pub mod services;

pub use clients::{FcmPushGateway, LogOnlyPushGateway, PushGateway};
pub use services::{
    NotificationDispatcher, PushTokenService, PushTokenStore, UserProfileService,
    UserProfileStore,
};
