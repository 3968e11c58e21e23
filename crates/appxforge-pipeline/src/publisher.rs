use std::fs;
use std::path::Path;

const MANIFEST_FILE: &str = "AppxManifest.xml";
const APPX_FOUNDATION_NS: &str =
    "http://schemas.microsoft.com/appx/manifest/foundation/windows10";

pub const PLACEHOLDER_PUBLISHER: &str = "CN=TempUWPExtractCert";

// Identity@Publisher from the package manifest. Absent manifest, malformed
// XML, or a missing attribute all yield None; the pipeline substitutes the
// placeholder subject instead of failing the run.
pub fn publisher_from_manifest(install_path: &Path) -> Option<String> {
    let raw = fs::read_to_string(install_path.join(MANIFEST_FILE)).ok()?;
    let document = roxmltree::Document::parse(&raw).ok()?;
    let qualified = document.descendants().find(|node| {
        node.tag_name().name() == "Identity"
            && node.tag_name().namespace() == Some(APPX_FOUNDATION_NS)
    });
    qualified
        .and_then(|identity| identity.attribute("Publisher"))
        .map(str::trim)
        .filter(|publisher| !publisher.is_empty())
        .map(str::to_string)
}
