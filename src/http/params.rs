//! Query/body value parsing
//!
//! Malformed values are `ApiError::BadInput`, which the API reports with the
//! same 500 as provider failures.

use super::error::ApiError;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use std::collections::HashMap;
use std::fmt::Display;
use std::str::FromStr;

pub type QueryMap = HashMap<String, String>;

/// Integer parameter with a default when absent
pub fn int_or<T>(params: &QueryMap, key: &str, default: T) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    match params.get(key) {
        Some(value) => parse_int(key, value),
        None => Ok(default),
    }
}

/// Integer parameter that stays unset when absent or empty
pub fn opt_int<T>(params: &QueryMap, key: &str) -> Result<Option<T>, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    match params.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => parse_int(key, value).map(Some),
        _ => Ok(None),
    }
}

pub fn parse_int<T>(key: &str, value: &str) -> Result<T, ApiError>
where
    T: FromStr,
    T::Err: Display,
{
    value
        .trim()
        .parse()
        .map_err(|e| ApiError::BadInput(format!("Invalid value for '{}': {:?} ({})", key, value, e)))
}

/// Boolean parameter; absent or empty means false
pub fn flag(params: &QueryMap, key: &str) -> Result<bool, ApiError> {
    Ok(opt_flag(params, key)?.unwrap_or(false))
}

pub fn opt_flag(params: &QueryMap, key: &str) -> Result<Option<bool>, ApiError> {
    match params.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => parse_bool(value)
            .map(Some)
            .ok_or_else(|| ApiError::BadInput(format!("Invalid boolean for '{}': {:?}", key, value))),
        _ => Ok(None),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

/// ISO-8601 date parameter; values without an offset are taken as UTC
///
/// The provider carries dates as 32-bit unix seconds, so anything outside
/// 1901-12-13..2038-01-19 is rejected rather than wrapped.
pub fn opt_datetime(params: &QueryMap, key: &str) -> Result<Option<DateTime<Utc>>, ApiError> {
    let value = match params.get(key).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => value,
        _ => return Ok(None),
    };

    let date = parse_iso_datetime(value)
        .ok_or_else(|| ApiError::BadInput(format!("Invalid isoformat string: {:?}", value)))?;

    if i32::try_from(date.timestamp()).is_err() {
        return Err(ApiError::BadInput(format!(
            "Date out of range for '{}': {:?}",
            key, value
        )));
    }
    Ok(Some(date))
}

pub fn parse_iso_datetime(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(date) = DateTime::parse_from_rfc3339(value) {
        return Some(date.with_timezone(&Utc));
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f%:z", "%Y-%m-%d %H:%M:%S%.f%:z"] {
        if let Ok(date) = DateTime::parse_from_str(value, format) {
            return Some(date.with_timezone(&Utc));
        }
    }
    for format in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(date) = NaiveDateTime::parse_from_str(value, format) {
            return Some(date.and_utc());
        }
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|d| d.and_utc())
}
