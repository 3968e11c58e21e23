use appxforge_identity::StartAppsTable;
use serde_json::json;

use super::*;

#[test]
fn noisy_single_record_output_maps_to_one_entity() {
    let payload = r#"[{"Name":"ms-resource:Key/Text","PackageFullName":"App_1.0.0.0_x64__abc","Architecture":9,"InstallLocation":""}]"#;
    let raw = format!("\x1b[33mloading...\x1b[0m noise before\n{payload}\ntrailing-noise");
    let values = recover(&raw).expect("payload must be recoverable");
    let entities = entities_from_values(&values, &StartAppsTable::new());

    assert_eq!(entities.len(), 1);
    let entity = &entities[0];
    assert_eq!(entity.architecture, Architecture::X64);
    assert_eq!(entity.package_full_name, "App_1.0.0.0_x64__abc");
    // install location is empty and nothing matches in the secondary table,
    // so the name derives from the full-name prefix
    assert_eq!(entity.display_name, "App");
    assert!(!entity.selected);
}

#[test]
fn plain_names_are_kept_as_is() {
    let values = vec![json!({
        "Name": "Calculator",
        "PackageFullName": "Microsoft.Calculator_11.0.0.0_x64__8wekyb3d8bbwe",
        "PackageFamilyName": "Microsoft.Calculator_8wekyb3d8bbwe",
        "Version": "11.0.0.0",
        "Architecture": 9,
        "InstallLocation": "C:/Program Files/WindowsApps/Calc"
    })];
    let entities = entities_from_values(&values, &StartAppsTable::new());
    assert_eq!(entities[0].display_name, "Calculator");
    assert_eq!(entities[0].version, "11.0.0.0");
    assert_eq!(
        entities[0].install_path,
        "C:/Program Files/WindowsApps/Calc"
    );
}

#[test]
fn missing_name_falls_back_to_the_full_name() {
    let values = vec![json!({
        "PackageFullName": "Vendor.App_2.0.0.0_arm__hash",
        "Architecture": 5
    })];
    let entities = entities_from_values(&values, &StartAppsTable::new());
    assert_eq!(entities[0].display_name, "Vendor.App_2.0.0.0_arm__hash");
    assert_eq!(entities[0].architecture, Architecture::Arm);
}

#[test]
fn unknown_or_absent_architecture_codes_map_to_unknown() {
    let values = vec![
        json!({"Name": "A", "PackageFullName": "A_1", "Architecture": 7}),
        json!({"Name": "B", "PackageFullName": "B_1"}),
        json!({"Name": "C", "PackageFullName": "C_1", "Architecture": "x64"}),
    ];
    let entities = entities_from_values(&values, &StartAppsTable::new());
    assert!(entities
        .iter()
        .all(|entity| entity.architecture == Architecture::Unknown));
}

#[test]
fn indirect_names_consult_the_start_apps_table() {
    let mut table = StartAppsTable::new();
    table.insert(
        "vendor.app_hash!main".to_string(),
        "Vendor App".to_string(),
    );
    let values = vec![json!({
        "Name": "ms-resource:AppTitle",
        "PackageFullName": "Vendor.App_2.0.0.0_x64__hash",
        "PackageFamilyName": "Vendor.App_hash",
        "Architecture": 9,
        "InstallLocation": ""
    })];
    let entities = entities_from_values(&values, &table);
    assert_eq!(entities[0].display_name, "Vendor App");
}

#[test]
fn enumeration_on_a_host_without_the_command_degrades_to_empty() {
    // no powershell on the test host: the failure must be soft
    if cfg!(windows) {
        return;
    }
    let texts = Texts::load("en_US").expect("embedded locale must load");
    assert!(enumerate(&texts).is_empty());
}
