use std::collections::BTreeMap;

use anyhow::{Context, Result};

const EMBEDDED_LOCALES: &[(&str, &str)] = &[
    ("en_US", include_str!("../locales/en_US.json")),
    ("zh_CN", include_str!("../locales/zh_CN.json")),
];

const FALLBACK_LANGUAGE: &str = "en_US";

#[derive(Debug, Clone)]
pub struct Texts {
    language: String,
    entries: BTreeMap<String, String>,
}

impl Texts {
    pub fn load(language: &str) -> Result<Self> {
        let code = language.strip_suffix(".json").unwrap_or(language);
        let &(code, raw) = EMBEDDED_LOCALES
            .iter()
            .find(|(name, _)| *name == code)
            .or_else(|| {
                EMBEDDED_LOCALES
                    .iter()
                    .find(|(name, _)| *name == FALLBACK_LANGUAGE)
            })
            .context("no embedded locale tables available")?;
        let entries: BTreeMap<String, String> = serde_json::from_str(raw)
            .with_context(|| format!("failed to parse embedded locale table '{code}'"))?;
        Ok(Self {
            language: code.to_string(),
            entries,
        })
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn available() -> Vec<&'static str> {
        EMBEDDED_LOCALES.iter().map(|(name, _)| *name).collect()
    }

    pub fn display_name_for(code: &str) -> String {
        match Self::load(code) {
            Ok(texts) if texts.language == code => texts.t("language_display").to_string(),
            _ => code.to_string(),
        }
    }

    pub fn t<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    pub fn tf(&self, key: &str, params: &[(&str, &str)]) -> String {
        let mut rendered = self.t(key).to_string();
        for (name, value) in params {
            rendered = rendered.replace(&format!("{{{name}}}"), value);
        }
        rendered
    }
}

pub fn detect_language() -> String {
    if let Ok(lang) = std::env::var("APPXFORGE_LANG") {
        let trimmed = lang.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let system = std::env::var("LC_ALL")
        .or_else(|_| std::env::var("LANG"))
        .unwrap_or_default()
        .to_lowercase();
    if system.starts_with("zh") {
        "zh_CN".to_string()
    } else {
        FALLBACK_LANGUAGE.to_string()
    }
}
