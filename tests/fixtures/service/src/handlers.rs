use crate::models::{Address, Role};

pub struct Pagination {
    #[api(query = "page", default = "1")]
    pub page: Option<u32>,
    #[api(query = "per_page", default = "20")]
    pub per_page: Option<u32>,
}

pub struct ListUsers {
    #[serde(flatten)]
    pub pagination: Pagination,
    #[api(query = "role")]
    pub role: Option<Role>,
    #[api(header = "X-Request-Id")]
    pub request_id: Option<String>,
}

pub struct GetUser {
    #[api(path = "id")]
    pub id: u64,
}

pub struct CreateUser {
    #[validate(required)]
    pub display_name: String,
    #[api(enum = "admin,member")]
    pub role: Option<String>,
    pub address: Option<Address>,
}

pub struct UpdateUser {
    #[api(path = "id")]
    pub id: u64,
    #[serde(flatten)]
    pub user: CreateUser,
}
