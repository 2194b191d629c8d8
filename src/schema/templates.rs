//! Record kinds kept as schema templates. Neither has a collection or a route.

use super::{FieldReader, Record};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub name: String,
    pub email: String,
    pub address: String,
    /// Age in years
    pub age: Option<i64>,
    pub is_active: bool,
}

impl Record for User {
    const KIND: &'static str = "user";

    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            name: fields.required_text("name"),
            // plain text here, unlike Registration
            email: fields.required_text("email"),
            address: fields.required_text("address"),
            age: fields.optional_integer("age", 0..=120),
            is_active: fields.boolean("is_active", true),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub title: String,
    pub description: Option<String>,
    /// Price in dollars
    pub price: f64,
    pub category: String,
    pub in_stock: bool,
}

impl Record for Product {
    const KIND: &'static str = "product";

    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            title: fields.required_text("title"),
            description: fields.optional_text("description"),
            price: fields.number_at_least("price", 0.0),
            category: fields.required_text("category"),
            in_stock: fields.boolean("in_stock", true),
        }
    }
}
