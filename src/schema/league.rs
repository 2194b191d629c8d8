use super::{FieldReader, Record};
use chrono::NaiveDate;
use serde::Serialize;

pub const DEFAULT_DIVISIONS: [&str; 3] = ["Recreational", "Intermediate", "Advanced"];

/// League configuration and season info
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct League {
    pub name: String,
    pub city: Option<String>,
    pub season_start: Option<NaiveDate>,
    pub season_end: Option<NaiveDate>,
    pub divisions: Vec<String>,
    /// Players per team
    pub team_size: i64,
    /// Whether registration is open
    pub is_open: bool,
    pub description: Option<String>,
}

impl Record for League {
    const KIND: &'static str = "league";

    fn read(fields: &mut FieldReader<'_>) -> Self {
        Self {
            name: fields.required_text("name"),
            city: fields.optional_text("city"),
            season_start: fields.optional_date("season_start"),
            season_end: fields.optional_date("season_end"),
            divisions: fields.text_list("divisions", || {
                DEFAULT_DIVISIONS.iter().map(|d| d.to_string()).collect()
            }),
            team_size: fields.integer("team_size", 1..=12, 6),
            is_open: fields.boolean("is_open", true),
            description: fields.optional_text("description"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults_applied() {
        let league = League::validate(&json!({"name": "Miau Volleyball"})).unwrap();
        assert_eq!(league.name, "Miau Volleyball");
        assert_eq!(league.team_size, 6);
        assert!(league.is_open);
        assert_eq!(league.divisions, vec!["Recreational", "Intermediate", "Advanced"]);
        assert_eq!(league.city, None);
        assert_eq!(league.season_start, None);
    }

    #[test]
    fn test_full_payload() {
        let league = League::validate(&json!({
            "name": "Miau Volleyball",
            "city": "Lisbon",
            "season_start": "2025-03-01",
            "season_end": "2025-06-30",
            "divisions": ["Open"],
            "team_size": 4,
            "is_open": false,
            "description": "Beach league"
        }))
        .unwrap();

        assert_eq!(league.season_start, NaiveDate::from_ymd_opt(2025, 3, 1));
        assert_eq!(league.divisions, vec!["Open"]);
        assert_eq!(league.team_size, 4);
        assert!(!league.is_open);
    }

    #[test]
    fn test_team_size_bounds() {
        assert!(League::validate(&json!({"name": "L", "team_size": 1})).is_ok());
        assert!(League::validate(&json!({"name": "L", "team_size": 12})).is_ok());

        let err = League::validate(&json!({"name": "L", "team_size": 13})).unwrap_err();
        assert!(err.has_field("team_size"));
        let err = League::validate(&json!({"name": "L", "team_size": 0})).unwrap_err();
        assert!(err.has_field("team_size"));
    }

    #[test]
    fn test_reports_every_bad_field() {
        let err = League::validate(&json!({
            "city": 3,
            "season_start": "01/03/2025",
            "team_size": "six",
            "is_open": "yes"
        }))
        .unwrap_err();

        for field in ["name", "city", "season_start", "team_size", "is_open"] {
            assert!(err.has_field(field), "expected failure on {}", field);
        }
        assert_eq!(err.fields.len(), 5);
    }

    #[test]
    fn test_serialized_shape() {
        let league = League::validate(&json!({"name": "L", "season_end": "2025-06-30"})).unwrap();
        let value = serde_json::to_value(&league).unwrap();
        assert_eq!(value["season_end"], "2025-06-30");
        assert_eq!(value["season_start"], serde_json::Value::Null);
        assert_eq!(value["team_size"], 6);
    }
}
