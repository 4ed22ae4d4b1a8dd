//! Spell catalog entries

use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type SpellId = i32;

/// Search hit: id and display name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SpellSummary {
    pub id: SpellId,
    pub name: String,
}

/// Full casting metadata for one spell.
///
/// Field names follow the `spells` table columns, which is also the JSON shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct SpellAttributes {
    pub name: String,
    #[serde(rename = "type")]
    #[sqlx(rename = "type")]
    pub kind: Option<String>,
    pub casting_time: Option<String>,
    pub range: Option<String>,
    pub components: Option<String>,
    pub duration: Option<String>,
    pub primary_description: Option<String>,
    pub level: i32,
}

impl SpellAttributes {
    /// Minimal spell with only a name and required level.
    pub fn named(name: impl Into<String>, level: i32) -> Self {
        Self {
            name: name.into(),
            kind: None,
            casting_time: None,
            range: None,
            components: None,
            duration: None,
            primary_description: None,
            level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn kind_serializes_as_type() {
        let mut fireball = SpellAttributes::named("Fireball", 3);
        fireball.kind = Some("Evocation".into());
        fireball.casting_time = Some("1 action".into());

        let value = serde_json::to_value(&fireball).unwrap();
        assert_eq!(value["type"], json!("Evocation"));
        assert_eq!(value["casting_time"], json!("1 action"));
        assert_eq!(value["primary_description"], json!(null));
        assert_eq!(value["level"], json!(3));
    }
}
