/// Integration tests for the barberia-agenda binary.
///
/// These tests spawn the compiled binary via assert_cmd and verify
/// the JSON stdin/stdout protocol for the booking screens' key scenarios.
///
/// Run with: cargo test --manifest-path crates/engine/Cargo.toml
use assert_cmd::Command;
use predicates::str::contains;

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn cmd() -> Command {
    Command::cargo_bin("barberia-agenda").unwrap()
}

fn run_ok(input: &str) -> serde_json::Value {
    let output = cmd()
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains(r#""ok":true"#))
        .get_output()
        .stdout
        .clone();
    let text = String::from_utf8(output).unwrap();
    serde_json::from_str(&text).unwrap()
}

/// Works Monday (backend field names) and Thursday (English), default lunch.
const BARBER: &str = r#"{
    "id": 1,
    "nombre": "Carlos",
    "diasLaborales": {
        "lunes": { "activo": true },
        "thursday": { "active": true }
    }
}"#;

// ---------------------------------------------------------------------------
// Test 1: slots_early_week
// Monday window 11:00-21:00, last slot 21:00-21:30.
// ---------------------------------------------------------------------------

#[test]
fn slots_early_week() {
    let parsed = run_ok(
        r#"{ "command": "slots", "date": "2025-06-02", "now": "2025-06-01T08:00:00" }"#,
    );
    let slots = parsed["data"].as_array().unwrap();
    assert_eq!(slots.len(), 21);
    assert_eq!(slots[0]["startTime"], "11:00");
    assert_eq!(slots[0]["displayLabel"], "11:00 AM - 11:30 AM");
    let last = slots.last().unwrap();
    assert_eq!(last["startTime"], "21:00");
    assert_eq!(last["endTime"], "21:30");
}

// ---------------------------------------------------------------------------
// Test 2: slots_today_trimmed
// On the day itself, slots that already started are gone.
// ---------------------------------------------------------------------------

#[test]
fn slots_today_trimmed() {
    let parsed = run_ok(
        r#"{ "command": "slots", "date": "2025-06-05", "now": "2025-06-05T18:10:00" }"#,
    );
    let slots = parsed["data"].as_array().unwrap();
    assert_eq!(slots[0]["startTime"], "18:30");
    assert_eq!(slots.last().unwrap()["startTime"], "22:30");
}

// ---------------------------------------------------------------------------
// Test 3: availability_reasons
// Lunch, operating window, and an open slot on a future Monday.
// ---------------------------------------------------------------------------

#[test]
fn availability_reasons() {
    let ask = |start: &str| {
        run_ok(&format!(
            r#"{{ "command": "availability", "barber": {}, "date": "2025-06-02", "startTime": "{}" }}"#,
            BARBER, start
        ))
    };

    let lunch = ask("13:30");
    assert_eq!(lunch["data"]["available"], false);
    assert_eq!(lunch["data"]["reason"], "lunchBreak");
    assert_eq!(lunch["data"]["message"], "Lunch break");

    let early = ask("10:00");
    assert_eq!(early["data"]["reason"], "outsideOperatingHours");

    let open = ask("11:00");
    assert_eq!(open["data"]["available"], true);
    assert!(open["data"]["reason"].is_null());
}

// ---------------------------------------------------------------------------
// Test 4: availability_with_decimal_agenda
// A backend agenda entry at 15.0 blocks the 15:00 slot.
// ---------------------------------------------------------------------------

#[test]
fn availability_with_decimal_agenda() {
    let input = format!(
        r#"{{
            "command": "availability",
            "barber": {},
            "date": "2025-06-02",
            "startTime": "15:00",
            "agendas": [ {{ "barberId": 1, "appointments": [ {{ "id": 8, "start": 15.0, "end": 15.75 }} ] }} ]
        }}"#,
        BARBER
    );
    let parsed = run_ok(&input);
    assert_eq!(parsed["data"]["available"], false);
    assert_eq!(parsed["data"]["reason"], "alreadyBooked");
}

// ---------------------------------------------------------------------------
// Test 5: availability_exception_day
// ---------------------------------------------------------------------------

#[test]
fn availability_exception_day() {
    let input = r#"{
        "command": "availability",
        "barber": {
            "id": 1,
            "workingDays": { "monday": { "active": true } },
            "exceptions": [ { "date": "2025-06-02", "active": false } ]
        },
        "date": "2025-06-02",
        "startTime": "11:00"
    }"#;
    let parsed = run_ok(input);
    assert_eq!(parsed["data"]["reason"], "exceptionDay");
}

// ---------------------------------------------------------------------------
// Test 6: day_summary
// Barber 2 has no Monday entry; barber 1 does.
// ---------------------------------------------------------------------------

#[test]
fn day_summary() {
    let input = format!(
        r#"{{
            "command": "daySummary",
            "barbers": [ {}, {{ "id": 2, "workingDays": {{ "friday": {{ "active": true }} }} }} ],
            "date": "2025-06-02",
            "now": "2025-06-01T09:00:00"
        }}"#,
        BARBER
    );
    let parsed = run_ok(&input);
    let days = parsed["data"].as_array().unwrap();
    assert_eq!(days[0]["barberId"], 1);
    assert_eq!(days[0]["available"], true);
    assert_eq!(days[1]["barberId"], 2);
    assert_eq!(days[1]["available"], false);
}

// ---------------------------------------------------------------------------
// Test 7: agenda_lists_reasons
// ---------------------------------------------------------------------------

#[test]
fn agenda_lists_reasons() {
    let input = format!(
        r#"{{
            "command": "agenda",
            "barber": {},
            "date": "2025-06-05",
            "now": "2025-06-01T09:00:00",
            "appointments": [
                {{ "id": 3, "barberId": 1, "date": "2025-06-05", "startTime": "09:30:00", "endTime": "10:00:00", "status": "pendiente" }}
            ]
        }}"#,
        BARBER
    );
    let parsed = run_ok(&input);
    let agenda = parsed["data"].as_array().unwrap();
    assert_eq!(agenda[0]["startTime"], "09:00");
    assert_eq!(agenda[0]["available"], true);
    assert_eq!(agenda[1]["reason"], "alreadyBooked");
    let lunch = agenda.iter().find(|s| s["startTime"] == "13:00").unwrap();
    assert_eq!(lunch["reason"], "lunchBreak");
}

// ---------------------------------------------------------------------------
// Test 8: book_builds_payload
// 00:45:00 service at 10:00 on a Thursday ends at 10:45.
// ---------------------------------------------------------------------------

#[test]
fn book_builds_payload() {
    let input = format!(
        r#"{{
            "command": "book",
            "barbers": [ {} ],
            "now": "2025-06-01T09:00:00",
            "request": {{
                "barberId": 1,
                "service": {{ "id": 4, "name": "Barba", "price": 80, "nominalDuration": "00:45:00" }},
                "client": {{ "kind": "temporary", "name": "Luis", "phone": "5551234" }},
                "date": "2025-06-05",
                "startTime": "10:00"
            }}
        }}"#,
        BARBER
    );
    let parsed = run_ok(&input);
    let data = &parsed["data"];
    assert_eq!(data["startTime"], "10:00:00");
    assert_eq!(data["endTime"], "10:45:00");
    assert_eq!(data["durationRounded"], "00:45");
    assert_eq!(data["durationSource"], "parsed");
    assert_eq!(data["status"], "pending");
    assert_eq!(data["location"], "Barbería");
    assert_eq!(data["client"]["name"], "Luis");
}

// ---------------------------------------------------------------------------
// Test 9: book_missing_client_fails
// ---------------------------------------------------------------------------

#[test]
fn book_missing_client_fails() {
    let input = format!(
        r#"{{
            "command": "book",
            "barbers": [ {} ],
            "now": "2025-06-01T09:00:00",
            "request": {{
                "barberId": 1,
                "service": {{ "id": 4, "nominalDuration": 30 }},
                "date": "2025-06-05",
                "startTime": "10:00"
            }}
        }}"#,
        BARBER
    );
    cmd()
        .write_stdin(input)
        .assert()
        .failure()
        .stdout(contains(r#""ok":false"#))
        .stdout(contains("client"));
}

// ---------------------------------------------------------------------------
// Test 10: transition_and_terminal_error
// ---------------------------------------------------------------------------

#[test]
fn transition_and_terminal_error() {
    let appointment = |status: &str| {
        format!(
            r#"{{ "id": 12, "barberId": 1, "date": "2025-06-02", "startTime": "11:00", "endTime": "11:30", "status": "{}" }}"#,
            status
        )
    };

    let parsed = run_ok(&format!(
        r#"{{ "command": "transition", "appointment": {}, "action": "complete", "today": "2025-06-02" }}"#,
        appointment("pending")
    ));
    assert_eq!(parsed["data"]["status"], "completed");
    assert_eq!(parsed["data"]["appointment"]["status"], "completed");

    cmd()
        .write_stdin(format!(
            r#"{{ "command": "transition", "appointment": {}, "action": "cancel", "today": "2025-06-02" }}"#,
            appointment("completed")
        ))
        .assert()
        .failure()
        .stdout(contains(r#""ok":false"#))
        .stdout(contains("cannot change status"));

    cmd()
        .write_stdin(format!(
            r#"{{ "command": "transition", "appointment": {}, "action": "expire", "trigger": "automatic", "today": "2025-06-03" }}"#,
            appointment("pending")
        ))
        .assert()
        .failure()
        .stdout(contains("2025-06-05"));

    for action in ["complete", "cancel"] {
        cmd()
            .write_stdin(format!(
                r#"{{ "command": "transition", "appointment": {}, "action": "{}", "trigger": "automatic", "today": "2025-06-20" }}"#,
                appointment("pending"),
                action
            ))
            .assert()
            .failure()
            .stdout(contains("must be requested manually"));
    }
}

// ---------------------------------------------------------------------------
// Test 11: expiration_check
// ---------------------------------------------------------------------------

#[test]
fn expiration_check() {
    let input = r#"{
        "command": "expirationCheck",
        "today": "2025-06-10",
        "appointments": [
            { "id": 1, "barberId": 1, "date": "2025-06-01", "startTime": "11:00", "endTime": "11:30", "status": "pending" },
            { "id": 2, "barberId": 1, "date": "2025-06-09", "startTime": "11:00", "endTime": "11:30", "status": "pending" },
            { "id": 3, "barberId": 1, "date": "2025-06-01", "startTime": "12:00", "endTime": "12:30", "status": "completed" }
        ]
    }"#;
    let parsed = run_ok(input);
    assert_eq!(parsed["data"], serde_json::json!([1]));
}

// ---------------------------------------------------------------------------
// Test 12: validate_schedule_reports
// ---------------------------------------------------------------------------

#[test]
fn validate_schedule_reports() {
    let input = r#"{
        "command": "validateSchedule",
        "schedule": {
            "workingDays": { "someday": { "active": true } },
            "lunchBreak": { "start": "15:00", "end": "14:00" }
        }
    }"#;
    cmd()
        .write_stdin(input)
        .assert()
        .success()
        .stdout(contains(r#""ok":true"#))
        .stdout(contains("someday"))
        .stdout(contains("ends before it starts"));
}

// ---------------------------------------------------------------------------
// Test 13: time_helpers
// ---------------------------------------------------------------------------

#[test]
fn time_helpers() {
    let end = run_ok(r#"{ "command": "endTime", "startTime": "10:00", "duration": "01:30:00" }"#);
    assert_eq!(end["data"]["endTime"], "11:30");
    assert_eq!(end["data"]["duration"]["minutes"], 90);

    let defaulted = run_ok(r#"{ "command": "endTime", "startTime": "10:00" }"#);
    assert_eq!(defaulted["data"]["endTime"], "11:00");
    assert_eq!(defaulted["data"]["duration"]["source"], "defaulted");

    let converted = run_ok(r#"{ "command": "convertTime", "time": "2:30 PM" }"#);
    assert_eq!(converted["data"]["time24"], "14:30");
    assert_eq!(converted["data"]["time12"], "2:30 PM");
    assert_eq!(converted["data"]["decimalHours"], 14.5);

    cmd()
        .write_stdin(r#"{ "command": "convertTime", "time": "14h30" }"#)
        .assert()
        .failure()
        .stdout(contains("neither HH:MM nor h:MM AM/PM"));
}

// ---------------------------------------------------------------------------
// Test 14: invalid_json_returns_error
// ---------------------------------------------------------------------------

#[test]
fn invalid_json_returns_error() {
    cmd()
        .write_stdin("not json")
        .assert()
        .failure()
        .stdout(contains(r#""ok":false"#))
        .stdout(contains("Invalid JSON input"));
}
