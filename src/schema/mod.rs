//! Record schemas
//!
//! Every record kind knows how to read itself out of an untyped JSON payload
//! through a [`FieldReader`], which applies defaults and collects every
//! failing field. Validation is pure: nothing here touches the store.
//!
//! League, Registration and Announcement are served by the HTTP layer.
//! User and Product are templates with no collection and no endpoint.

mod announcement;
mod fields;
mod league;
mod registration;
mod templates;

pub use announcement::Announcement;
pub use fields::{is_valid_email, FieldError, FieldReader, ValidationError};
pub use league::{League, DEFAULT_DIVISIONS};
pub use registration::Registration;
pub use templates::{Product, User};

use serde::Serialize;
use serde_json::Value;

pub trait Record: Serialize + Sized {
    /// Human readable kind, used in logs
    const KIND: &'static str;

    /// Reads every field, returning placeholders for invalid ones.
    fn read(fields: &mut FieldReader<'_>) -> Self;

    fn validate(input: &Value) -> Result<Self, ValidationError> {
        let mut fields = FieldReader::new(input)?;
        let record = Self::read(&mut fields);
        fields.finish(record)
    }
}
