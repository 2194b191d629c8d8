use super::{FieldReader, Record};
use serde::Serialize;

/// League news item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Announcement {
    pub title: String,
    pub message: String,
    pub published: bool,
}

impl Record for Announcement {
    const KIND: &'static str = "announcement";

    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            title: fields.required_text("title"),
            message: fields.required_text("message"),
            published: fields.boolean("published", true),
        }
    }
}
