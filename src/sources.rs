//! # Source Registry
//!
//! Ordered list of federal and provincial government websites polled on every
//! query. Declaration order is the fetch order, so it also decides which copy
//! of a duplicated fragment survives and which updates fit under the cap.
//!
//! The built-in list can be replaced by a file named in `$SOURCES_PATH`
//! (TOML `[[sources]]` tables or a JSON array of `{name, url}` objects).

use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_SOURCES_PATH: &str = "SOURCES_PATH";

/// One polled website.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    pub name: String,
    pub url: String,
}

impl Source {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
        }
    }
}

const BUILTIN: &[(&str, &str)] = &[
    ("PID", "http://pid.gov.pk/"),
    ("PM Office", "https://pmo.gov.pk/"),
    ("President House", "https://president.gov.pk/"),
    ("National Assembly", "https://na.gov.pk/"),
    ("Senate of Pakistan", "https://senate.gov.pk/"),
    ("Supreme Court", "https://www.supremecourt.gov.pk/"),
    ("Ministry of Finance", "https://www.finance.gov.pk/"),
    ("Ministry of Health", "https://nhsrc.gov.pk/"),
    ("Ministry of IT", "https://moitt.gov.pk/"),
    ("Ministry of Foreign Affairs", "https://mofa.gov.pk/"),
    ("Ministry of Education", "https://www.mofept.gov.pk/"),
    ("Ministry of Law", "http://molaw.gov.pk/"),
    ("Ministry of Energy", "https://www.mowp.gov.pk/"),
    ("Ministry of Human Rights", "http://mohr.gov.pk/"),
    ("Ministry of Climate Change", "https://mocc.gov.pk/"),
    ("Ministry of Industries", "https://moip.gov.pk/"),
    ("Ministry of Railways", "https://railways.gov.pk/"),
    ("Ministry of Defence", "https://mod.gov.pk/"),
    ("Ministry of Religious Affairs", "https://mora.gov.pk/"),
    ("NDMA", "http://www.ndma.gov.pk/"),
    ("ECP", "https://www.ecp.gov.pk/"),
    ("FBR", "https://fbr.gov.pk/"),
    ("NADRA", "https://www.nadra.gov.pk/"),
    ("PTA", "https://pta.gov.pk/"),
    ("HEC", "https://hec.gov.pk/"),
    ("Punjab Govt", "https://punjab.gov.pk/"),
    ("Sindh Govt", "https://sindh.gov.pk/"),
    ("KP Govt", "https://kp.gov.pk/"),
    ("Balochistan Govt", "https://balochistan.gov.pk/"),
];

/// Built-in registry in declaration order.
pub fn builtin_sources() -> Vec<Source> {
    BUILTIN
        .iter()
        .map(|(name, url)| Source::new(*name, *url))
        .collect()
}

/// Load a registry file. Supports TOML or JSON formats.
pub fn load_sources_from(path: &Path) -> Result<Vec<Source>> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("reading sources from {}", path.display()))?;
    let ext = path
        .extension()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_ascii_lowercase();
    let sources = parse_sources(&content, ext.as_str())?;
    if sources.is_empty() {
        return Err(anyhow!("source registry {} is empty", path.display()));
    }
    Ok(sources)
}

/// $SOURCES_PATH when set, otherwise the built-in registry.
pub fn load_sources_default() -> Result<Vec<Source>> {
    match std::env::var(ENV_SOURCES_PATH) {
        Ok(p) => {
            let pb = PathBuf::from(p);
            if !pb.exists() {
                return Err(anyhow!("SOURCES_PATH points to non-existent path"));
            }
            load_sources_from(&pb)
        }
        Err(_) => Ok(builtin_sources()),
    }
}

fn parse_sources(s: &str, hint_ext: &str) -> Result<Vec<Source>> {
    if hint_ext == "json" {
        return parse_json(s);
    }
    if let Ok(v) = parse_toml(s) {
        return Ok(v);
    }
    parse_json(s).map_err(|_| anyhow!("unsupported source registry format"))
}

fn parse_toml(s: &str) -> Result<Vec<Source>> {
    #[derive(Deserialize)]
    struct TomlRegistry {
        sources: Vec<Source>,
    }
    let v: TomlRegistry = toml::from_str(s)?;
    Ok(clean_list(v.sources))
}

fn parse_json(s: &str) -> Result<Vec<Source>> {
    let v: Vec<Source> = serde_json::from_str(s)?;
    Ok(clean_list(v))
}

/// Trim fields, drop blank entries and repeated names (first wins), keep order.
fn clean_list(items: Vec<Source>) -> Vec<Source> {
    let mut out: Vec<Source> = Vec::with_capacity(items.len());
    for it in items {
        let name = it.name.trim();
        let url = it.url.trim();
        if name.is_empty() || url.is_empty() {
            continue;
        }
        if out.iter().any(|s| s.name == name) {
            continue;
        }
        out.push(Source::new(name, url));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn builtin_registry_keeps_declaration_order() {
        let all = builtin_sources();
        assert_eq!(all.len(), 29);
        assert_eq!(all[0].name, "PID");
        assert_eq!(all[21].name, "FBR");
        assert_eq!(all[28].url, "https://balochistan.gov.pk/");
    }

    #[test]
    fn toml_and_json_formats_are_cleaned() {
        let toml = r#"
[[sources]]
name = " FBR "
url = "https://fbr.gov.pk/"

[[sources]]
name = ""
url = "https://nowhere/"

[[sources]]
name = "FBR"
url = "https://dup/"
"#;
        let v = parse_sources(toml, "toml").unwrap();
        assert_eq!(v, vec![Source::new("FBR", "https://fbr.gov.pk/")]);

        let json = r#"[{"name":"PTA","url":" https://pta.gov.pk/ "}]"#;
        let v = parse_sources(json, "json").unwrap();
        assert_eq!(v, vec![Source::new("PTA", "https://pta.gov.pk/")]);
    }

    #[serial_test::serial]
    #[test]
    fn default_uses_env_then_builtin() {
        env::remove_var(ENV_SOURCES_PATH);
        assert_eq!(load_sources_default().unwrap().len(), 29);

        let tmp = tempfile::tempdir().unwrap();
        let p = tmp.path().join("sources.json");
        fs::write(&p, r#"[{"name":"X","url":"http://x.test/"}]"#).unwrap();
        env::set_var(ENV_SOURCES_PATH, p.display().to_string());
        let v = load_sources_default().unwrap();
        assert_eq!(v, vec![Source::new("X", "http://x.test/")]);

        env::set_var(ENV_SOURCES_PATH, tmp.path().join("missing.toml").display().to_string());
        assert!(load_sources_default().is_err());
        env::remove_var(ENV_SOURCES_PATH);
    }
}
