use serde::{Deserialize, Serialize};
use chrono::{DateTime, Utc};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "menu_type", rename_all = "SCREAMING_SNAKE_CASE")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MenuType {
    Food,
    Beverage,
    Other,
}

impl std::str::FromStr for MenuType {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "FOOD" => Ok(MenuType::Food),
            "BEVERAGE" => Ok(MenuType::Beverage),
            "OTHER" => Ok(MenuType::Other),
            _ => Err(()),
        }
    }
}

#[derive(Debug, sqlx::FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Menu {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub menu_type: MenuType,
    pub is_available: bool,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn menu_type_parses_case_insensitively() {
        assert_eq!("beverage".parse::<MenuType>(), Ok(MenuType::Beverage));
        assert_eq!("OTHER".parse::<MenuType>(), Ok(MenuType::Other));
        assert!("DRINK".parse::<MenuType>().is_err());
    }
}
