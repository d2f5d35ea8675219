// Types and helpers used on both sides of the contact endpoint:
// the site's contact form builds these payloads, the api crate receives them.
pub mod models;
pub mod utils;

pub use models::{ContactRequest, ContactResponse, ErrorBody};
