use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

use crate::auth::repo_types::NewUser;

/// In-memory form state, also cached as the `userInfo` session snapshot.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ProfileForm {
    pub username: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub contact_number: String,
    pub address: String,
    pub profile_picture: String,
}

/// One text input of the form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Username,
    Password,
    FirstName,
    LastName,
    Email,
    ContactNumber,
    Address,
    ProfilePicture,
}

impl Field {
    pub const ALL: [Field; 8] = [
        Field::Username,
        Field::Password,
        Field::FirstName,
        Field::LastName,
        Field::Email,
        Field::ContactNumber,
        Field::Address,
        Field::ProfilePicture,
    ];

    /// Key used in the cached snapshot and in the table.
    pub fn key(self) -> &'static str {
        match self {
            Field::Username => "username",
            Field::Password => "password",
            Field::FirstName => "firstName",
            Field::LastName => "lastName",
            Field::Email => "email",
            Field::ContactNumber => "contactNumber",
            Field::Address => "address",
            Field::ProfilePicture => "profilePicture",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Field::Username => "Username",
            Field::Password => "Password",
            Field::FirstName => "First Name",
            Field::LastName => "Last Name",
            Field::Email => "Email",
            Field::ContactNumber => "Contact Number",
            Field::Address => "Address",
            Field::ProfilePicture => "Profile Picture URL",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for Field {
    type Err = String;

    /// Accepts the snapshot key, case-insensitively.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Field::ALL
            .into_iter()
            .find(|f| f.key().eq_ignore_ascii_case(s))
            .ok_or_else(|| format!("unknown field: {s}"))
    }
}

impl ProfileForm {
    pub fn get(&self, field: Field) -> &str {
        match field {
            Field::Username => &self.username,
            Field::Password => &self.password,
            Field::FirstName => &self.first_name,
            Field::LastName => &self.last_name,
            Field::Email => &self.email,
            Field::ContactNumber => &self.contact_number,
            Field::Address => &self.address,
            Field::ProfilePicture => &self.profile_picture,
        }
    }

    pub fn set(&mut self, field: Field, value: impl Into<String>) {
        let slot = match field {
            Field::Username => &mut self.username,
            Field::Password => &mut self.password,
            Field::FirstName => &mut self.first_name,
            Field::LastName => &mut self.last_name,
            Field::Email => &mut self.email,
            Field::ContactNumber => &mut self.contact_number,
            Field::Address => &mut self.address,
            Field::ProfilePicture => &mut self.profile_picture,
        };
        *slot = value.into();
    }
}

impl From<&ProfileForm> for NewUser {
    fn from(form: &ProfileForm) -> Self {
        Self {
            username: form.username.clone(),
            password: form.password.clone(),
            first_name: form.first_name.clone(),
            last_name: form.last_name.clone(),
            email: form.email.clone(),
            contact_number: form.contact_number.clone(),
            address: form.address.clone(),
            profile_picture: form.profile_picture.clone(),
        }
    }
}
