use crate::auth::dto::{Field, ProfileForm};
use crate::error::AppError;

const LOGIN_REQUIRED: &[Field] = &[Field::Username, Field::Password];

const REGISTRATION_REQUIRED: &[Field] = &[
    Field::Username,
    Field::Password,
    Field::FirstName,
    Field::LastName,
    Field::Email,
    Field::ContactNumber,
    Field::Address,
];

fn require(form: &ProfileForm, fields: &[Field]) -> Result<(), AppError> {
    // whitespace counts as filled in
    let missing: Vec<Field> = fields
        .iter()
        .copied()
        .filter(|f| form.get(*f).is_empty())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation { missing })
    }
}

pub fn validate_login(form: &ProfileForm) -> Result<(), AppError> {
    require(form, LOGIN_REQUIRED)
}

/// Every field but the profile picture must be filled in.
pub fn validate_registration(form: &ProfileForm) -> Result<(), AppError> {
    require(form, REGISTRATION_REQUIRED)
}
