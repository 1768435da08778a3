//! Email delivery collaborator.
//!
//! Defines the [`EmailGateway`] trait the engine sends through, plus the
//! production [`HttpEmailGateway`] adapter that posts to the hosted
//! delivery service over HTTP.

pub mod gateway;
pub mod http;

pub use gateway::{Attribution, EmailGateway, GatewayError, SendReceipt, SendRequest};
pub use http::HttpEmailGateway;
