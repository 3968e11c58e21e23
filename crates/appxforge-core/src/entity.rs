use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Architecture {
    X86,
    Arm,
    X64,
    Arm64,
    Unknown,
}

impl Architecture {
    pub fn from_code(code: i64) -> Self {
        match code {
            0 => Self::X86,
            5 => Self::Arm,
            9 => Self::X64,
            11 | 12 => Self::Arm64,
            _ => Self::Unknown,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::X86 => "x86",
            Self::Arm => "arm",
            Self::X64 => "x64",
            Self::Arm64 => "arm64",
            Self::Unknown => "unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntity {
    pub display_name: String,
    pub package_full_name: String,
    pub package_family_name: String,
    pub version: String,
    pub architecture: Architecture,
    pub install_path: String,
    #[serde(default)]
    pub selected: bool,
}
