use crate::utils::error::{FeasibilityError, Result};
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_url(field_name: &str, url_str: &str) -> Result<()> {
    if url_str.is_empty() {
        return Err(FeasibilityError::invalid_input(
            field_name,
            url_str,
            "URL cannot be empty",
        ));
    }

    match Url::parse(url_str) {
        Ok(url) => match url.scheme() {
            "http" | "https" => Ok(()),
            scheme => Err(FeasibilityError::invalid_input(
                field_name,
                url_str,
                format!("Unsupported URL scheme: {}", scheme),
            )),
        },
        Err(e) => Err(FeasibilityError::invalid_input(
            field_name,
            url_str,
            format!("Invalid URL format: {}", e),
        )),
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(FeasibilityError::invalid_input(
            field_name,
            path,
            "Path cannot be empty",
        ));
    }

    if path.contains('\0') {
        return Err(FeasibilityError::invalid_input(
            field_name,
            path,
            "Path contains null bytes",
        ));
    }

    Ok(())
}

/// 嚴格大於零（NaN 也視為無效）
pub fn validate_positive(field_name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(FeasibilityError::invalid_input(
            field_name,
            value,
            "Value must be a finite number greater than 0",
        ));
    }
    Ok(())
}

pub fn validate_non_negative(field_name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value >= 0.0) {
        return Err(FeasibilityError::invalid_input(
            field_name,
            value,
            "Value must be a finite number greater than or equal to 0",
        ));
    }
    Ok(())
}

/// 比例須落在 (0, 1]
pub fn validate_ratio(field_name: &str, value: f64) -> Result<()> {
    if !(value.is_finite() && value > 0.0 && value <= 1.0) {
        return Err(FeasibilityError::invalid_input(
            field_name,
            value,
            "Ratio must be in (0, 1]",
        ));
    }
    Ok(())
}

pub fn validate_required_field<'a, T>(field_name: &str, value: &'a Option<T>) -> Result<&'a T> {
    value.as_ref().ok_or_else(|| FeasibilityError::MissingSection {
        section: field_name.to_string(),
    })
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(FeasibilityError::invalid_input(
            field_name,
            value,
            "Value cannot be empty or whitespace-only",
        ));
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(FeasibilityError::invalid_input(
            field_name,
            value,
            format!("Value must be between {} and {}", min, max),
        ));
    }
    Ok(())
}
