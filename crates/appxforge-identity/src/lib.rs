use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;


pub const INDIRECT_REFERENCE_MARKER: &str = "ms-resource";

const MANIFEST_FILE: &str = "AppxManifest.xml";
const STRINGS_SUBTREE: &str = "Strings";
const RESOURCE_EXTENSION: &str = "resw";
const APPX_2010_MANIFEST_NS: &str = "http://schemas.microsoft.com/appx/2010/manifest";

pub type StartAppsTable = BTreeMap<String, String>;

#[derive(Debug, Clone, Copy)]
pub struct IdentityRequest<'a> {
    pub raw_name: &'a str,
    pub package_full_name: &'a str,
    pub package_family_name: &'a str,
    pub install_path: &'a str,
}

struct Resolution<'a> {
    request: IdentityRequest<'a>,
    lookup_key: Option<String>,
    start_apps: &'a StartAppsTable,
}

type ResolutionStrategy = for<'a> fn(&Resolution<'a>) -> Option<String>;

// Ordered fallback chain; the final derivation always yields a value, so the
// chain as a whole is total.
const STRATEGIES: &[ResolutionStrategy] = &[
    resource_file_value,
    manifest_display_name,
    start_apps_entry,
    derived_fallback,
];

pub fn resolve_display_name(request: IdentityRequest<'_>, start_apps: &StartAppsTable) -> String {
    if !request
        .raw_name
        .to_lowercase()
        .contains(INDIRECT_REFERENCE_MARKER)
    {
        return request.raw_name.to_string();
    }
    let resolution = Resolution {
        lookup_key: reference_lookup_key(request.raw_name.trim()),
        request,
        start_apps,
    };
    for strategy in STRATEGIES {
        if let Some(resolved) = strategy(&resolution) {
            return resolved;
        }
    }
    request.raw_name.to_string()
}

// Trailing segment of the reference: the part after the last '/' of whatever
// follows the scheme delimiter. "ms-resource:Resources/AppTitle" -> "AppTitle".
fn reference_lookup_key(reference: &str) -> Option<String> {
    let after_scheme = reference
        .split_once(':')
        .map(|(_, rest)| rest)
        .unwrap_or(reference);
    let key = after_scheme.rsplit('/').next().unwrap_or("").trim();
    if key.is_empty() {
        None
    } else {
        Some(key.to_string())
    }
}

fn resource_file_value(resolution: &Resolution<'_>) -> Option<String> {
    let key = resolution.lookup_key.as_deref()?;
    let base = existing_install_dir(resolution.request.install_path)?;

    let mut candidates = resource_files_under(&base.join(STRINGS_SUBTREE));
    for broader in resource_files_under(&base) {
        if !candidates.contains(&broader) {
            candidates.push(broader);
        }
    }
    candidates
        .iter()
        .find_map(|path| resource_entry_value(path, key))
}

fn resource_files_under(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter(|entry| {
            entry
                .path()
                .extension()
                .is_some_and(|ext| ext.eq_ignore_ascii_case(RESOURCE_EXTENSION))
        })
        .map(|entry| entry.into_path())
        .collect()
}

fn resource_entry_value(path: &Path, key: &str) -> Option<String> {
    let raw = fs::read_to_string(path).ok()?;
    let document = roxmltree::Document::parse(&raw).ok()?;
    document
        .descendants()
        .filter(|node| node.tag_name().name() == "data")
        .find(|node| node.attribute("name") == Some(key))
        .and_then(|data| {
            data.children()
                .find(|child| child.is_element() && child.tag_name().name() == "value")
        })
        .and_then(|value| value.text())
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .map(str::to_string)
}

fn manifest_display_name(resolution: &Resolution<'_>) -> Option<String> {
    resolution.lookup_key.as_deref()?;
    let base = existing_install_dir(resolution.request.install_path)?;
    let raw = fs::read_to_string(base.join(MANIFEST_FILE)).ok()?;
    let document = roxmltree::Document::parse(&raw).ok()?;

    let qualified = document.descendants().find(|node| {
        node.tag_name().name() == "DisplayName"
            && node.tag_name().namespace() == Some(APPX_2010_MANIFEST_NS)
    });
    let element = qualified.or_else(|| {
        document
            .descendants()
            .find(|node| node.tag_name().name() == "DisplayName")
    })?;
    element
        .text()
        .map(str::trim)
        .filter(|text| !text.is_empty())
        .filter(|text| !text.to_lowercase().contains(INDIRECT_REFERENCE_MARKER))
        .map(str::to_string)
}

fn start_apps_entry(resolution: &Resolution<'_>) -> Option<String> {
    let family = resolution.request.package_family_name.trim();
    if family.is_empty() {
        return None;
    }
    let family_lower = family.to_lowercase();
    resolution
        .start_apps
        .iter()
        .find(|(app_id, name)| app_id.contains(&family_lower) && !name.is_empty())
        .map(|(_, name)| name.clone())
}

// Always produces something: full-name prefix, install-path leaf, or the raw
// reference itself.
fn derived_fallback(resolution: &Resolution<'_>) -> Option<String> {
    let full_prefix = resolution
        .request
        .package_full_name
        .split('_')
        .next()
        .unwrap_or("")
        .trim();
    if !full_prefix.is_empty() {
        return Some(full_prefix.to_string());
    }
    let leaf = install_path_leaf(resolution.request.install_path);
    if !leaf.is_empty() {
        return Some(leaf);
    }
    Some(resolution.request.raw_name.to_string())
}

// Last path segment, tolerant of either separator; the install path comes
// from a Windows host even when this code does not run on one.
pub fn install_path_leaf(install_path: &str) -> String {
    install_path
        .trim()
        .trim_end_matches(['/', '\\'])
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or("")
        .trim()
        .to_string()
}

fn existing_install_dir(install_path: &str) -> Option<PathBuf> {
    if install_path.trim().is_empty() {
        return None;
    }
    let path = PathBuf::from(install_path);
    if path.exists() {
        Some(path)
    } else {
        None
    }
}
