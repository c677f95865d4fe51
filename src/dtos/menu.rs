use serde::Deserialize;

use crate::models::menu::MenuType;

fn available_by_default() -> bool {
    true
}

/// Body of both `POST /menus` and `PUT /menus/{id}`; an update replaces every field.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuRequest {
    pub name: String,
    pub description: Option<String>,
    pub price: i64,
    pub menu_type: MenuType,
    #[serde(default = "available_by_default")]
    pub is_available: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuQuery {
    pub search: Option<String>,
    #[serde(rename = "type")]
    pub menu_type: Option<String>,
    pub available: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn availability_defaults_to_true() {
        let req: MenuRequest =
            serde_json::from_str(r#"{"name":"Es Teh","price":5000,"menuType":"BEVERAGE"}"#).unwrap();
        assert!(req.is_available);
        assert_eq!(req.menu_type, MenuType::Beverage);

        let req: MenuRequest = serde_json::from_str(
            r#"{"name":"Es Teh","price":5000,"menuType":"BEVERAGE","isAvailable":false}"#,
        )
        .unwrap();
        assert!(!req.is_available);
    }
}
