//! Request dispatch pipeline.
//!
//! Every inbound request flows through:
//! 1. `routes` — HTTP body (JSON or multipart) → `InboundRequest`
//! 2. `Dispatcher::handle()` — validation, file shortcut or classification
//! 3. `RouteTable::resolve()` — handler and payload shape, or rejection
//! 4. `HandlerClient::forward()` — single forwarding attempt, reply relayed verbatim

pub mod dispatcher;
pub mod forward;
pub mod routes;
pub mod types;

pub use dispatcher::Dispatcher;
pub use forward::{HandlerClient, HttpForwarder};
pub use routes::gateway_routes;
pub use types::{FileAttachment, ForwardPayload, HandlerResponse, InboundRequest};
