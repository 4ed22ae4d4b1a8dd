//! Users and their known spells

use serde::{Deserialize, Serialize};

use super::spell_list::SpellList;

/// Stored user profile
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub spells: SpellList,
}

/// Canonical state returned after creating or editing a user's list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSpells {
    pub name: String,
    pub spells: SpellList,
}

impl From<User> for UserSpells {
    fn from(user: User) -> Self {
        Self {
            name: user.name,
            spells: user.spells,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn spells_serialize_as_array() {
        let state = UserSpells {
            name: "Alice".into(),
            spells: SpellList::from(vec![5]),
        };
        assert_eq!(
            serde_json::to_string(&state).unwrap(),
            r#"{"name":"Alice","spells":[5]}"#
        );
    }
}
