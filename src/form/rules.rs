//! Field validation rules.
//!
//! A [`FieldRule`] is evaluated in a fixed order: required-check, pattern-check,
//! custom-check. The first failing stage reports the rule's message; when every
//! stage passes the optional normalizer produces the stored form of the value.

use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use once_cell::sync::Lazy;
use regex::Regex;

use crate::errors::ValidationError;
use crate::form::FieldValue;

pub type CustomCheck = Arc<dyn Fn(&str) -> bool + Send + Sync>;
pub type Normalizer = fn(&str) -> String;

pub static POSTAL_CODE_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{5}$").expect("valid postal code pattern"));

pub static PHONE_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\(?([0-9]{3})\)?[-. ]?([0-9]{3})[-. ]?([0-9]{4})$")
        .expect("valid phone pattern")
});

pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

pub static FULL_NAME_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z\s]{2,50}$").expect("valid name pattern"));

const BIRTH_DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%m/%d/%Y"];

/// Immutable validation contract for one field.
#[derive(Clone)]
pub struct FieldRule {
    pub field_name: &'static str,
    pub required: bool,
    pub pattern: Option<Regex>,
    pub custom_check: Option<CustomCheck>,
    pub normalize: Option<Normalizer>,
    pub message: String,
}

impl fmt::Debug for FieldRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldRule")
            .field("field_name", &self.field_name)
            .field("required", &self.required)
            .field("pattern", &self.pattern.as_ref().map(Regex::as_str))
            .field("custom_check", &self.custom_check.is_some())
            .field("normalize", &self.normalize.is_some())
            .field("message", &self.message)
            .finish()
    }
}

impl FieldRule {
    pub fn required(field_name: &'static str, message: impl Into<String>) -> Self {
        Self {
            field_name,
            required: true,
            pattern: None,
            custom_check: None,
            normalize: None,
            message: message.into(),
        }
    }

    pub fn with_pattern(mut self, pattern: &Regex) -> Self {
        self.pattern = Some(pattern.clone());
        self
    }

    pub fn with_custom_check(
        mut self,
        check: impl Fn(&str) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.custom_check = Some(Arc::new(check));
        self
    }

    pub fn with_normalizer(mut self, normalize: Normalizer) -> Self {
        self.normalize = Some(normalize);
        self
    }

    /// Validates `raw` against the rule. Pure: the result depends only on the
    /// rule and the value.
    pub fn check(&self, raw: &FieldValue) -> Result<String, ValidationError> {
        let value = raw.as_input();

        if value.is_empty() {
            return if self.required {
                Err(self.failure())
            } else {
                Ok(String::new())
            };
        }

        if let Some(pattern) = &self.pattern {
            if !pattern.is_match(value) {
                return Err(self.failure());
            }
        }

        if let Some(check) = &self.custom_check {
            if !check(value) {
                return Err(self.failure());
            }
        }

        Ok(match self.normalize {
            Some(normalize) => normalize(value),
            None => value.to_string(),
        })
    }

    fn failure(&self) -> ValidationError {
        ValidationError::new(self.field_name, self.message.clone())
    }
}

/// Renders a 3-3-4 phone number as `(###) ###-####`. Inputs that do not match
/// [`PHONE_PATTERN`] are returned unchanged.
pub fn normalize_phone(value: &str) -> String {
    match PHONE_PATTERN.captures(value) {
        Some(caps) => format!("({}) {}-{}", &caps[1], &caps[2], &caps[3]),
        None => value.to_string(),
    }
}

/// As-you-type phone formatting: keeps digits only and groups them once enough
/// have been typed. Input with more than ten digits is left as typed so the
/// phone rule can reject it.
pub fn format_phone_progressive(raw: &str) -> String {
    let digits: String = raw.chars().filter(char::is_ascii_digit).collect();
    match digits.len() {
        n if n > 10 => raw.to_string(),
        n if n >= 6 => format!("({}) {}-{}", &digits[..3], &digits[3..6], &digits[6..]),
        n if n >= 3 => format!("({}) {}", &digits[..3], &digits[3..]),
        _ => digits,
    }
}

pub fn parse_birth_date(value: &str) -> Option<NaiveDate> {
    BIRTH_DATE_FORMATS
        .iter()
        .find_map(|format| NaiveDate::parse_from_str(value.trim(), format).ok())
}

/// Whole calendar years between `birth` and `today`, one less when this year's
/// birthday has not been reached. Negative for future dates.
pub fn age_on(birth: NaiveDate, today: NaiveDate) -> i32 {
    let mut age = today.year() - birth.year();
    if (today.month(), today.day()) < (birth.month(), birth.day()) {
        age -= 1;
    }
    age
}

pub fn meets_minimum_age(value: &str, today: NaiveDate, minimum_age: u32) -> bool {
    parse_birth_date(value)
        .map(|birth| i64::from(age_on(birth, today)) >= i64::from(minimum_age))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text(value: &str) -> FieldValue {
        FieldValue::Text(value.to_string())
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn required_check_runs_before_pattern() {
        let rule = FieldRule::required("zipcode", "Please enter a valid 5-digit ZIP code")
            .with_pattern(&POSTAL_CODE_PATTERN);
        let err = rule.check(&text("   ")).unwrap_err();
        assert_eq!(err.field, "zipcode");
        assert_eq!(err.reason, "Please enter a valid 5-digit ZIP code");
    }

    #[test]
    fn optional_empty_value_skips_remaining_checks() {
        let rule = FieldRule {
            required: false,
            ..FieldRule::required("notes", "never shown")
        }
        .with_custom_check(|_| false);
        assert_eq!(rule.check(&text("")).unwrap(), "");
    }

    #[test]
    fn postal_code_requires_exactly_five_ascii_digits() {
        assert!(POSTAL_CODE_PATTERN.is_match("12345"));
        assert!(!POSTAL_CODE_PATTERN.is_match("1234"));
        assert!(!POSTAL_CODE_PATTERN.is_match("123456"));
        assert!(!POSTAL_CODE_PATTERN.is_match("١٢٣٤٥"));
    }

    #[test]
    fn custom_check_runs_after_pattern() {
        let rule = FieldRule::required("code", "bad")
            .with_pattern(&POSTAL_CODE_PATTERN)
            .with_custom_check(|value| value != "00000");
        assert!(rule.check(&text("00000")).is_err());
        assert_eq!(rule.check(&text(" 90210 ")).unwrap(), "90210");
    }

    #[test]
    fn phone_variants_normalize_to_canonical_form() {
        for raw in [
            "5551234567",
            "(555) 123-4567",
            "555-123-4567",
            "555.123.4567",
            "555 123 4567",
            "(555)123-4567",
        ] {
            assert!(PHONE_PATTERN.is_match(raw), "{raw} should match");
            assert_eq!(normalize_phone(raw), "(555) 123-4567");
        }
        assert!(!PHONE_PATTERN.is_match("555-1234"));
        assert!(!PHONE_PATTERN.is_match("+1 555 123 4567"));
    }

    #[test]
    fn progressive_phone_formatting_tracks_typed_digits() {
        assert_eq!(format_phone_progressive("55"), "55");
        assert_eq!(format_phone_progressive("555"), "(555) ");
        assert_eq!(format_phone_progressive("5551"), "(555) 1");
        assert_eq!(format_phone_progressive("555123"), "(555) 123-");
        assert_eq!(format_phone_progressive("5551234567"), "(555) 123-4567");
        assert_eq!(format_phone_progressive("(555) 123-45678"), "(555) 123-45678");
        assert_eq!(format_phone_progressive("+1 555 123 4567"), "+1 555 123 4567");
    }

    #[test]
    fn overlong_phone_input_is_left_for_the_rule_to_reject() {
        for raw in ["555123456789", "+1 555 123 4567"] {
            let typed = format_phone_progressive(raw);
            assert!(!PHONE_PATTERN.is_match(&typed), "{typed} should not match");
        }
    }

    #[test]
    fn email_check_is_permissive_syntax_only() {
        assert!(EMAIL_PATTERN.is_match("jane@example.com"));
        assert!(EMAIL_PATTERN.is_match("a@b.c"));
        assert!(!EMAIL_PATTERN.is_match("jane@example"));
        assert!(!EMAIL_PATTERN.is_match("jane doe@example.com"));
        assert!(!EMAIL_PATTERN.is_match("@example.com"));
    }

    #[test]
    fn full_name_allows_letters_and_spaces_within_bounds() {
        assert!(FULL_NAME_PATTERN.is_match("Jane Doe"));
        assert!(!FULL_NAME_PATTERN.is_match("J"));
        assert!(!FULL_NAME_PATTERN.is_match("O'Brien"));
        assert!(!FULL_NAME_PATTERN.is_match(&"a".repeat(51)));
    }

    #[test]
    fn age_accounts_for_birthday_not_yet_reached() {
        let today = date(2026, 10, 18);
        assert_eq!(age_on(date(2008, 10, 18), today), 18);
        assert_eq!(age_on(date(2008, 10, 19), today), 17);
        assert_eq!(age_on(date(2008, 11, 1), today), 17);
        assert_eq!(age_on(date(2030, 1, 1), today), -4);
    }

    #[test]
    fn leap_day_birthday_counts_from_march_first() {
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 2, 28)), 17);
        assert_eq!(age_on(date(2008, 2, 29), date(2026, 3, 1)), 18);
    }

    #[test]
    fn birth_date_accepts_iso_and_us_formats() {
        assert_eq!(parse_birth_date("2000-01-31"), Some(date(2000, 1, 31)));
        assert_eq!(parse_birth_date("01/31/2000"), Some(date(2000, 1, 31)));
        assert_eq!(parse_birth_date("31.01.2000"), None);
        assert!(!meets_minimum_age("not a date", date(2026, 1, 1), 18));
    }

    #[test]
    fn huge_minimum_age_never_admits_a_newborn() {
        let today = date(2026, 10, 18);
        assert!(!meets_minimum_age("2026-10-01", today, 3_000_000_000));
        assert!(!meets_minimum_age("1900-01-01", today, u32::MAX));
    }
}
