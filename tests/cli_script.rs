use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use tempfile::TempDir;

const COMPLETE_FORM: &str = "\
zipcode=90210
currently_insured=yes
next
vehicle_year=2020
set vehicle_make Toyota
next
dob=1985-03-02
gender=male
marital_status=single
next
set full_name \"Jane Doe\"
phone=5551234567
email=jane@example.com
submit
exit
";

fn script_command(home: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("quote_wizard").unwrap();
    cmd.env("QUOTE_WIZARD_CLI_SCRIPT", "1")
        .env("QUOTE_WIZARD_HOME", home.path())
        .env("NO_COLOR", "1");
    cmd
}

#[test]
fn script_mode_completes_a_quote_request() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin(COMPLETE_FORM)
        .assert()
        .success()
        .stdout(contains("Step 4 of 4 (100%)"))
        .stdout(contains("Quote request received"));

    let snapshot = home.path().join("snapshots").join("insurance_form_data.json");
    let json = std::fs::read_to_string(snapshot).unwrap();
    assert!(json.contains("\"(555) 123-4567\""));
    assert!(json.contains("\"Jane Doe\""));
}

#[test]
fn script_mode_reports_invalid_fields_and_stays_put() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("zipcode=1234\nnext\nstatus\nexit\n")
        .assert()
        .success()
        .stdout(contains("Please enter a valid 5-digit ZIP code"))
        .stdout(contains("Please fix 2 field(s)"))
        .stdout(contains("Step 1 of 4"));
}

#[test]
fn script_mode_retries_after_backend_failure() {
    let home = TempDir::new().unwrap();
    let input = COMPLETE_FORM.replace("submit\n", "submit\nretry\n");
    script_command(&home)
        .env("QUOTE_WIZARD_FAIL_SUBMISSIONS", "1")
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Quote request failed."))
        .stdout(contains("Quote request received"));
}

#[test]
fn script_mode_refuses_an_overlong_phone_number() {
    let home = TempDir::new().unwrap();
    let input = COMPLETE_FORM.replace("phone=5551234567", "phone=555123456789");
    script_command(&home)
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains("Please enter a valid phone number"))
        .stdout(contains("Please fix 1 field(s) before submitting"))
        .stdout(contains("Quote request received").not());

    assert!(!home
        .path()
        .join("snapshots")
        .join("insurance_form_data.json")
        .exists());
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = TempDir::new().unwrap();
    script_command(&home)
        .write_stdin("nxt\nexit\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `nxt`"))
        .stdout(contains("Suggestion: `next`?"));
}

#[test]
fn invalid_config_file_is_rejected() {
    let home = TempDir::new().unwrap();
    let config = home.path().join("custom.json");
    std::fs::write(&config, r#"{ "minimum_age": 0 }"#).unwrap();
    script_command(&home)
        .arg("--config")
        .arg(&config)
        .write_stdin("exit\n")
        .assert()
        .failure()
        .stderr(contains("minimum_age"));
}
