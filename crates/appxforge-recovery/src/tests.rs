use serde_json::{json, Value};

use super::*;

#[test]
fn empty_input_yields_no_payload() {
    assert_eq!(recover(""), None);
    assert_eq!(recover("   \r\n\t "), None);
}

#[test]
fn input_without_any_payload_yields_none() {
    assert_eq!(recover("WARNING: none of this is structured output"), None);
}

#[test]
fn clean_payload_decodes_directly() {
    let recovered = recover(r#"[{"Name":"App","Architecture":9}]"#).expect("must recover");
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0]["Name"], json!("App"));
}

#[test]
fn payload_among_ansi_noise_matches_direct_decode() {
    let payload = r#"[{"Name":"App One","Version":"1.2.3.0"},{"Name":"App Two","Version":"4.0.0.0"}]"#;
    let noisy = format!(
        "\x1b[32mloading module...\x1b[0m\r\nsome diagnostic line\n{payload}\ntrailing noise\x1b[1;31m!\x1b[0m"
    );
    let direct: Value = serde_json::from_str(payload).expect("payload is valid");
    let recovered = recover(&noisy).expect("must recover");
    assert_eq!(Value::Array(recovered), direct);
}

#[test]
fn delimiters_inside_quoted_strings_do_not_break_the_walk() {
    let raw = r#"noise [{"Name":"Weird ]}{[ name","Path":"C:\\apps\\{guid}"}] more noise"#;
    let recovered = recover(raw).expect("must recover");
    assert_eq!(recovered[0]["Name"], json!("Weird ]}{[ name"));
    assert_eq!(recovered[0]["Path"], json!("C:\\apps\\{guid}"));
}

#[test]
fn escaped_quotes_inside_strings_are_honored() {
    let raw = r#"[{"Name":"quote \" and bracket ]"}]"#;
    let recovered = recover(raw).expect("must recover");
    assert_eq!(recovered[0]["Name"], json!("quote \" and bracket ]"));
}

#[test]
fn truncated_payload_yields_partial_decode_or_fails_cleanly() {
    // cut off mid-element, as a timed-out process would leave it; the loose
    // fallback still salvages the first complete object
    let raw = r#"header line [{"Name":"App One","Version":"1.0"},{"Name":"App"#;
    let recovered = recover(raw).expect("first complete element is salvageable");
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0]["Name"], json!("App One"));

    // nothing complete at all: fails cleanly
    assert_eq!(recover(r#"header [{"Name":"App On"#), None);
}

#[test]
fn truncation_after_last_closer_recovers_via_outer_span() {
    // the balanced walk sees an unbalanced array, the outer-span fallback
    // still finds a decodable object between the delimiters
    let raw = r#"[ garbage {"Name":"App"} "#;
    let recovered = recover(raw).expect("outer or loose span must recover");
    assert_eq!(recovered[0]["Name"], json!("App"));
}

#[test]
fn mismatched_delimiter_kinds_fall_through_cleanly() {
    assert_eq!(recover("prefix [1, 2} suffix"), None);
}

#[test]
fn single_object_is_wrapped_into_a_sequence() {
    let recovered = recover(r#"log: {"Name":"Solo"} end"#).expect("must recover");
    assert_eq!(recovered.len(), 1);
    assert_eq!(recovered[0]["Name"], json!("Solo"));
}

#[test]
fn encoded_records_round_trip_through_recovery() {
    let records = json!([
        {"Name": "Alpha", "Architecture": 9, "InstallLocation": "C:\\a"},
        {"Name": "Beta", "Architecture": 5, "InstallLocation": ""}
    ]);
    let encoded = serde_json::to_string_pretty(&records).expect("must encode");
    let recovered = recover(&encoded).expect("must recover");
    assert_eq!(Value::Array(recovered), records);
}

#[test]
fn control_characters_collapse_to_whitespace() {
    let cleaned = clean_control_text("a\rb\nc\td\x07e");
    assert_eq!(cleaned, "a b c de");
}

#[test]
fn preview_is_bounded_and_char_safe() {
    let raw = "汉".repeat(2000);
    let preview = bounded_preview(&raw);
    assert_eq!(preview.chars().count(), 1000);
    assert!(raw.starts_with(preview));
    assert_eq!(bounded_preview("short"), "short");
}
