pub mod validate_message_request;
pub mod validate_message_response;
pub mod validate_message_route;

pub use validate_message_route::validate_message_route;
