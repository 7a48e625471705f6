//! Linked items: one bank connection owning one or more accounts.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub institution_name: Option<String>,
}

impl Item {
    pub fn new(item_id: impl Into<String>) -> Self {
        Self {
            item_id: item_id.into(),
            user_id: None,
            institution_name: None,
        }
    }
}
