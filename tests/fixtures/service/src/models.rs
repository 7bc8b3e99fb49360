use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Member,
    ReadOnly,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Address {
    #[validate(required)]
    pub city: String,
    pub zip: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[validate(required)]
    pub id: u64,
    pub display_name: String,
    pub role: Role,
    pub address: Option<Address>,
    pub friends: Vec<User>,
    password_hash: String,
}

impl User {
    pub fn type_name() -> &'static str {
        "User"
    }
}

pub type Users = Vec<User>;

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub code: u16,
    pub message: String,
}
