//! Canonical rule table for the four-step auto-insurance quote form.

use chrono::{Datelike, NaiveDate};

use crate::config::WizardConfig;
use crate::form::rules::{
    format_phone_progressive, meets_minimum_age, normalize_phone, EMAIL_PATTERN,
    FULL_NAME_PATTERN, PHONE_PATTERN, POSTAL_CODE_PATTERN,
};
use crate::form::{ChoiceOption, FieldDescriptor, FieldRule, FormDescriptor, StepDescriptor};

pub const ZIPCODE: &str = "zipcode";
pub const CURRENTLY_INSURED: &str = "currently_insured";
pub const VEHICLE_YEAR: &str = "vehicle_year";
pub const VEHICLE_MAKE: &str = "vehicle_make";
pub const DOB: &str = "dob";
pub const GENDER: &str = "gender";
pub const MARITAL_STATUS: &str = "marital_status";
pub const FULL_NAME: &str = "full_name";
pub const PHONE: &str = "phone";
pub const EMAIL: &str = "email";

const VEHICLE_YEAR_SPAN: i32 = 30;

const VEHICLE_MAKES: [&str; 16] = [
    "Acura",
    "BMW",
    "Chevrolet",
    "Chrysler",
    "Dodge",
    "Ford",
    "GMC",
    "Honda",
    "Hyundai",
    "Jeep",
    "Kia",
    "Mazda",
    "Nissan",
    "Subaru",
    "Tesla",
    "Toyota",
];

/// Builds the quote form. `today` anchors both the age check and the range of
/// vehicle model years.
pub fn quote_form(config: &WizardConfig, today: NaiveDate) -> FormDescriptor {
    let minimum_age = config.minimum_age;

    let coverage = StepDescriptor {
        index: 1,
        title: "Where do you live?",
        fields: vec![
            FieldDescriptor::text(
                ZIPCODE,
                "ZIP code",
                FieldRule::required(ZIPCODE, "Please enter a valid 5-digit ZIP code")
                    .with_pattern(&POSTAL_CODE_PATTERN),
            ),
            FieldDescriptor::choice(
                CURRENTLY_INSURED,
                "Currently insured?",
                vec![ChoiceOption::new("yes", "Yes"), ChoiceOption::new("no", "No")],
                FieldRule::required(
                    CURRENTLY_INSURED,
                    "Please select if you are currently insured",
                ),
            ),
        ],
    };

    let vehicle = StepDescriptor {
        index: 2,
        title: "Tell us about your vehicle",
        fields: vec![
            FieldDescriptor::choice(
                VEHICLE_YEAR,
                "Vehicle year",
                vehicle_years(today),
                FieldRule::required(VEHICLE_YEAR, "Please select your vehicle year"),
            ),
            FieldDescriptor::choice(
                VEHICLE_MAKE,
                "Vehicle make",
                vehicle_makes(),
                FieldRule::required(VEHICLE_MAKE, "Please select your vehicle make"),
            ),
        ],
    };

    let driver = StepDescriptor {
        index: 3,
        title: "About the driver",
        fields: vec![
            FieldDescriptor::text(
                DOB,
                "Date of birth",
                FieldRule::required(
                    DOB,
                    format!("You must be at least {} years old", minimum_age),
                )
                .with_custom_check(move |value| meets_minimum_age(value, today, minimum_age)),
            )
            .immediate()
            .with_help("Use YYYY-MM-DD or MM/DD/YYYY."),
            FieldDescriptor::choice(
                GENDER,
                "Gender",
                vec![
                    ChoiceOption::new("male", "Male"),
                    ChoiceOption::new("female", "Female"),
                    ChoiceOption::new("other", "Other"),
                ],
                FieldRule::required(GENDER, "Please select your gender"),
            ),
            FieldDescriptor::choice(
                MARITAL_STATUS,
                "Marital status",
                vec![
                    ChoiceOption::new("single", "Single"),
                    ChoiceOption::new("married", "Married"),
                    ChoiceOption::new("divorced", "Divorced"),
                    ChoiceOption::new("widowed", "Widowed"),
                ],
                FieldRule::required(MARITAL_STATUS, "Please select your marital status"),
            ),
        ],
    };

    let contact = StepDescriptor {
        index: 4,
        title: "Where should we send your quotes?",
        fields: vec![
            FieldDescriptor::text(
                FULL_NAME,
                "Full name",
                FieldRule::required(
                    FULL_NAME,
                    "Please enter a valid full name (2-50 characters, letters only)",
                )
                .with_pattern(&FULL_NAME_PATTERN),
            ),
            FieldDescriptor::text(
                PHONE,
                "Phone number",
                FieldRule::required(PHONE, "Please enter a valid phone number")
                    .with_pattern(&PHONE_PATTERN)
                    .with_normalizer(normalize_phone),
            )
            .with_live_format(format_phone_progressive),
            FieldDescriptor::text(
                EMAIL,
                "Email address",
                FieldRule::required(EMAIL, "Please enter a valid email address")
                    .with_pattern(&EMAIL_PATTERN),
            ),
        ],
    };

    FormDescriptor::new("auto_insurance_quote", vec![coverage, vehicle, driver, contact])
}

fn vehicle_years(today: NaiveDate) -> Vec<ChoiceOption> {
    let newest = today.year() + 1;
    (0..=VEHICLE_YEAR_SPAN)
        .map(|offset| {
            let year = (newest - offset).to_string();
            ChoiceOption::new(year.clone(), year)
        })
        .collect()
}

fn vehicle_makes() -> Vec<ChoiceOption> {
    VEHICLE_MAKES
        .iter()
        .map(|make| ChoiceOption::new(make.to_ascii_lowercase(), *make))
        .chain(std::iter::once(ChoiceOption::new("other", "Other")))
        .collect()
}
