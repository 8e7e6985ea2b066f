//! # API Module
//!
//! Blocking HTTP runtime used by generated object wrappers.
//!
//! - [`Session`] carries the base url, default headers and connection pool.
//! - [`ObjectItem`] implements get/submit/delete for any [`V3Model`](crate::model::V3Model).
//! - [`ObjectCollection`] pages through a collection endpoint with a TQL filter.
//!
//! Every response body has the shape `{"data": ...}`; collection pages may
//! also carry a `next` link.

mod error;
mod object;
mod session;

pub use error::ApiError;
pub use object::{CollectionIter, ObjectCollection, ObjectItem, DEFAULT_RESULT_LIMIT};
pub use session::Session;
