//! Field validation for request bodies.
//!
//! Text fields are trimmed before their length is checked, and the trimmed
//! value is what gets stored.

use ellectra_core::Price;

use crate::error::{AppError, Result};
use crate::models::catalog::{CategoryInput, NewCategory, NewProduct, ProductInput};
use crate::models::user::ProfileUpdate;

const PHONE_RANGE: std::ops::RangeInclusive<i64> = 1_000_000_000..=9_999_999_999;

/// Trim `value` and check its length in characters.
pub fn text(field: &str, value: &str, min: usize, max: usize) -> Result<String> {
    let value = value.trim();
    let len = value.chars().count();
    if (min..=max).contains(&len) {
        Ok(value.to_owned())
    } else {
        Err(AppError::BadRequest(format!(
            "{field} must be between {min} and {max} characters"
        )))
    }
}

fn optional_text(
    field: &str,
    value: Option<&str>,
    min: usize,
    max: usize,
) -> Result<Option<String>> {
    value.map(|v| text(field, v, min, max)).transpose()
}

/// Exactly six ASCII digits.
pub fn pincode(value: &str) -> Result<String> {
    let value = value.trim();
    if value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit()) {
        Ok(value.to_owned())
    } else {
        Err(AppError::BadRequest(
            "pincode must be exactly 6 digits".to_owned(),
        ))
    }
}

/// Validate every field present in a profile update.
pub fn profile(update: &ProfileUpdate) -> Result<ProfileUpdate> {
    if let Some(number) = update.user_number
        && !PHONE_RANGE.contains(&number)
    {
        return Err(AppError::BadRequest(
            "user_number must be a 10-digit phone number".to_owned(),
        ));
    }

    Ok(ProfileUpdate {
        user_name: optional_text("user_name", update.user_name.as_deref(), 2, 50)?,
        user_number: update.user_number,
        user_door_no: optional_text("user_door_no", update.user_door_no.as_deref(), 1, 20)?,
        user_address: optional_text("user_address", update.user_address.as_deref(), 5, 200)?,
        user_city: optional_text("user_city", update.user_city.as_deref(), 2, 50)?,
        user_pincode: update.user_pincode.as_deref().map(pincode).transpose()?,
        landmark: optional_text("landmark", update.landmark.as_deref(), 2, 100)?,
    })
}

/// Validate an admin category body.
pub fn category(input: &CategoryInput) -> Result<NewCategory> {
    Ok(NewCategory {
        name: text("cat_name", &input.cat_name, 2, 50)?,
        image: text("cat_img", &input.cat_img, 1, 2048)?,
    })
}

/// Validate an admin product body.
pub fn product(input: &ProductInput) -> Result<NewProduct> {
    let price = Price::parse(input.price.trim())
        .map_err(|e| AppError::BadRequest(format!("price: {e}")))?;

    Ok(NewProduct {
        cat_id: input.cat_id.clone(),
        name: text("product_name", &input.product_name, 2, 100)?,
        description: text("product_description", &input.product_description, 10, 500)?,
        price,
        image: text("product_img", &input.product_img, 1, 2048)?,
    })
}
