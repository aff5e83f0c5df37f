use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Private-field prefixes stripped before deriving an accessor name, longest first.
pub const FIELD_PREFIXES: [&str; 2] = ["m_", "_"];

/// Naming policy turning a declared member name into the column name used by sheet sources.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum NamingStrategy {
    #[default]
    #[serde(rename = "PascalCase", alias = "pascal")]
    PascalCase,
    #[serde(rename = "camelCase", alias = "camel")]
    CamelCase,
    #[serde(rename = "snake_case", alias = "snake")]
    SnakeCase,
    #[serde(rename = "kebab-case", alias = "kebab")]
    KebabCase,
}

impl NamingStrategy {
    pub const ALL: [NamingStrategy; 4] = [NamingStrategy::PascalCase, NamingStrategy::CamelCase, NamingStrategy::SnakeCase, NamingStrategy::KebabCase];

    pub const fn as_str(self) -> &'static str {
        match self {
            NamingStrategy::PascalCase => "PascalCase",
            NamingStrategy::CamelCase => "camelCase",
            NamingStrategy::SnakeCase => "snake_case",
            NamingStrategy::KebabCase => "kebab-case",
        }
    }

    fn case(self) -> Case {
        match self {
            NamingStrategy::PascalCase => Case::Pascal,
            NamingStrategy::CamelCase => Case::Camel,
            NamingStrategy::SnakeCase => Case::Snake,
            NamingStrategy::KebabCase => Case::Kebab,
        }
    }

    pub fn apply(self, name: &str) -> String {
        name.to_case(self.case())
    }

    /// Column name of a declared member under this strategy.
    pub fn wire_name(self, declared_name: &str) -> String {
        self.apply(&property_name(declared_name))
    }
}

impl fmt::Display for NamingStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NamingStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "PascalCase" | "pascal" => Ok(NamingStrategy::PascalCase),
            "camelCase" | "camel" => Ok(NamingStrategy::CamelCase),
            "snake_case" | "snake" => Ok(NamingStrategy::SnakeCase),
            "kebab-case" | "kebab" => Ok(NamingStrategy::KebabCase),
            other => Err(format!("unknown naming strategy `{other}`, expected PascalCase, camelCase, snake_case or kebab-case")),
        }
    }
}

/// Remainder of a member name after a recognized private prefix, `None` when there is no prefix.
pub fn strip_field_prefix(name: &str) -> Option<&str> {
    FIELD_PREFIXES
        .iter()
        .find_map(|prefix| name.strip_prefix(prefix))
        .filter(|rest| !rest.is_empty())
}

/// Logical member name: prefix stripped, remainder title-cased. `_max_hp` and `m_maxHp` both give `MaxHp`.
pub fn property_name(declared_name: &str) -> String {
    strip_field_prefix(declared_name).unwrap_or(declared_name).to_case(Case::Pascal)
}

/// Backing field name for a logical member, the inverse of [`property_name`].
pub fn field_name(property_name: &str) -> String {
    format!("_{}", property_name.to_case(Case::Snake))
}

pub fn getter_name(declared_name: &str) -> String {
    property_name(declared_name).to_case(Case::Snake)
}

pub fn setter_name(declared_name: &str) -> String {
    format!("set_{}", getter_name(declared_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_recognized_prefixes_only() {
        assert_eq!(strip_field_prefix("_hp"), Some("hp"));
        assert_eq!(strip_field_prefix("m_hp"), Some("hp"));
        assert_eq!(strip_field_prefix("model"), None);
        assert_eq!(strip_field_prefix("_"), None);
    }

    #[test]
    fn property_names_are_title_cased() {
        assert_eq!(property_name("_max_hp"), "MaxHp");
        assert_eq!(property_name("m_maxHp"), "MaxHp");
        assert_eq!(property_name("name"), "Name");
        assert_eq!(getter_name("_max_hp"), "max_hp");
        assert_eq!(setter_name("m_name"), "set_name");
    }

    #[test]
    fn prefixed_names_round_trip() {
        for name in ["_max_hp", "m_attack_speed", "_name", "m_level"] {
            let property = property_name(name);
            assert_eq!(property_name(&field_name(&property)), property);
            assert_eq!(property_name(&property), property);
        }
    }

    #[test]
    fn wire_names_are_idempotent() {
        for strategy in NamingStrategy::ALL {
            let wire = strategy.wire_name("_attack_speed");
            assert_eq!(strategy.apply(&wire), wire);
        }
        assert_eq!(NamingStrategy::PascalCase.wire_name("_attack_speed"), "AttackSpeed");
        assert_eq!(NamingStrategy::CamelCase.wire_name("_attack_speed"), "attackSpeed");
        assert_eq!(NamingStrategy::SnakeCase.wire_name("m_attackSpeed"), "attack_speed");
        assert_eq!(NamingStrategy::KebabCase.wire_name("attack_speed"), "attack-speed");
    }

    #[test]
    fn parses_strategy_names() {
        for strategy in NamingStrategy::ALL {
            assert_eq!(strategy.as_str().parse::<NamingStrategy>(), Ok(strategy));
        }
        assert!("Title".parse::<NamingStrategy>().is_err());
    }
}
