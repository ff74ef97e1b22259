mod push_gateway;

pub use push_gateway::{
    FcmPushGateway, LogOnlyPushGateway, PushDelivery, PushGateway, PushMessage,
};
