use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// User record in the database.
///
/// The password is stored and compared as plaintext. No column carries a
/// uniqueness constraint besides `id`, so two rows may share a username.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
pub struct User {
    pub id: i64,                         // assigned by sqlite, never by callers
    pub username: Option<String>,
    #[serde(skip_serializing)]
    pub password: Option<String>,        // plaintext
    #[sqlx(rename = "firstName")]
    pub first_name: Option<String>,
    #[sqlx(rename = "lastName")]
    pub last_name: Option<String>,
    pub email: Option<String>,
    #[sqlx(rename = "contactNumber")]
    pub contact_number: Option<String>,
    pub address: Option<String>,
    #[sqlx(rename = "profilePicture")]
    pub profile_picture: Option<String>, // URL
}

/// Fields written by a registration. Carries no id.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub profile_picture: String,
}
