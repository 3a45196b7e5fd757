use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub teacher: String,
    pub description: Option<String>,
    pub number_of_students: i64,
    pub created_at: String,
    pub updated_at: String,
}

/// Id and current name of a class, as resolved from a `class_name` supplied by a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct ClassRef {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewClassRequest {
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateClassRequest {
    pub name: Option<String>,
    pub teacher: Option<String>,
    pub description: Option<String>,
}
