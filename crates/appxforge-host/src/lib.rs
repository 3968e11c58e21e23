use std::process::Command;
use std::time::Duration;

use appxforge_core::{Architecture, PackageEntity, Texts};
use appxforge_exec::{capture, CapturedOutput, ExecError};
use appxforge_identity::{resolve_display_name, IdentityRequest, StartAppsTable};
use appxforge_recovery::{bounded_preview, recover};
use serde_json::Value;

#[cfg(test)]
mod tests;

const POWERSHELL: &str = "powershell";
const ENUMERATION_TIMEOUT: Duration = Duration::from_secs(60);
const START_APPS_TIMEOUT: Duration = Duration::from_secs(20);

const ENUMERATION_SCRIPT: &str = r#"
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
$items = @(
    Get-AppxPackage | ForEach-Object {
        $pkg = $_
        if ([string]::IsNullOrEmpty($pkg.InstallLocation)) { return }
        try {
            $manifest = Get-AppxPackageManifest -Package $pkg.PackageFullName -ErrorAction SilentlyContinue
            $dispName = if ($manifest -and $manifest.Package.Properties.DisplayName) {
                              $manifest.Package.Properties.DisplayName
                        } else { $pkg.Name }
        } catch {
            $dispName = $pkg.Name
        }
        [PSCustomObject]@{
            Name        = $dispName
            PackageFullName = $pkg.PackageFullName
            PackageFamilyName = $pkg.PackageFamilyName
            Version     = $pkg.Version
            Architecture= $pkg.Architecture
            InstallLocation = $pkg.InstallLocation
        }
    }
)
$items | ConvertTo-Json -Depth 4
"#;

const START_APPS_SCRIPT: &str = r#"
[Console]::OutputEncoding = [System.Text.Encoding]::UTF8
Get-StartApps | Select-Object AppID,Name | ConvertTo-Json -Depth 2
"#;

// Everything here degrades to an empty result; enumeration failure means "no
// applications found", never a user-facing error.
pub fn enumerate(texts: &Texts) -> Vec<PackageEntity> {
    let output = match run_powershell(ENUMERATION_SCRIPT, ENUMERATION_TIMEOUT) {
        Ok(output) => output,
        Err(ExecError::Timeout { seconds, .. }) => {
            log::warn!(
                "{}",
                texts.tf("enum_timeout", &[("seconds", &seconds.to_string())])
            );
            return Vec::new();
        }
        Err(err) => {
            log::warn!("{err}");
            return Vec::new();
        }
    };
    if !output.success() {
        log::warn!(
            "{} {}",
            texts.t("enum_stderr_prefix"),
            bounded_preview(output.stderr.trim())
        );
    }

    let raw = output.combined_text();
    let Some(values) = recover(raw) else {
        log::warn!(
            "{} {}",
            texts.t("unable_extract_json_preview"),
            bounded_preview(raw.trim())
        );
        return Vec::new();
    };

    let start_apps = start_apps_table();
    entities_from_values(&values, &start_apps)
}

// AppID -> friendly name from the Start menu; any failure yields an empty
// table rather than an error.
pub fn start_apps_table() -> StartAppsTable {
    let mut table = StartAppsTable::new();
    let output = match run_powershell(START_APPS_SCRIPT, START_APPS_TIMEOUT) {
        Ok(output) => output,
        Err(err) => {
            log::debug!("start apps lookup failed: {err}");
            return table;
        }
    };
    let Some(values) = recover(output.combined_text()) else {
        return table;
    };
    for value in values {
        let app_id = string_field(&value, "AppID").to_lowercase();
        if app_id.is_empty() {
            continue;
        }
        table.insert(app_id, string_field(&value, "Name"));
    }
    table
}

pub fn entities_from_values(values: &[Value], start_apps: &StartAppsTable) -> Vec<PackageEntity> {
    values
        .iter()
        .map(|record| entity_from_value(record, start_apps))
        .collect()
}

fn entity_from_value(record: &Value, start_apps: &StartAppsTable) -> PackageEntity {
    let package_full_name = string_field(record, "PackageFullName");
    let package_family_name = string_field(record, "PackageFamilyName");
    let install_path = string_field(record, "InstallLocation");
    let mut raw_name = string_field(record, "Name");
    if raw_name.is_empty() {
        raw_name = package_full_name.clone();
    }
    let architecture = record
        .get("Architecture")
        .and_then(Value::as_i64)
        .map(Architecture::from_code)
        .unwrap_or(Architecture::Unknown);

    let display_name = resolve_display_name(
        IdentityRequest {
            raw_name: &raw_name,
            package_full_name: &package_full_name,
            package_family_name: &package_family_name,
            install_path: &install_path,
        },
        start_apps,
    );

    PackageEntity {
        display_name,
        package_full_name,
        package_family_name,
        version: string_field(record, "Version"),
        architecture,
        install_path,
        selected: false,
    }
}

fn string_field(record: &Value, key: &str) -> String {
    record
        .get(key)
        .and_then(Value::as_str)
        .unwrap_or("")
        .to_string()
}

fn run_powershell(script: &str, timeout: Duration) -> Result<CapturedOutput, ExecError> {
    let mut command = Command::new(POWERSHELL);
    command
        .arg("-NoLogo")
        .arg("-NonInteractive")
        .arg("-OutputFormat")
        .arg("Text")
        .arg("-Command")
        .arg(script);
    capture(&mut command, Some(timeout))
}
