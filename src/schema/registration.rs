use super::{FieldReader, Record};
use serde::Serialize;

/// Player or team registration
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Registration {
    pub full_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub pronouns: Option<String>,
    /// Requested division or skill level
    pub division: Option<String>,
    /// Set when registering a whole team
    pub team_name: Option<String>,
    pub free_agent: bool,
    pub notes: Option<String>,
}

impl Record for Registration {
    const KIND: &'static str = "registration";

    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            full_name: fields.required_text("full_name"),
            email: fields.email("email"),
            phone: fields.optional_text("phone"),
            pronouns: fields.optional_text("pronouns"),
            division: fields.optional_text("division"),
            team_name: fields.optional_text("team_name"),
            free_agent: fields.boolean("free_agent", false),
            notes: fields.optional_text("notes"),
        }
    }
}
