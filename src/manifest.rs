use std::fs;
use std::path::Path;

use serde_json::{Map, Value};

use crate::error::Result;

/// The file that marks a directory as a project.
pub const MANIFEST_FILE: &str = "package.json";

/// Substrings that make a script name look launchable.
///
/// Matching is by substring on the lowercased key, so `predev` or
/// `start:android` qualify. False positives like `devtools-check` are accepted.
pub const RUNNABLE_KEYWORDS: [&str; 7] = ["start", "dev", "serve", "run", "watch", "android", "ios"];

/// Script name to command string, in the order the manifest declares them.
pub type Scripts = Map<String, Value>;

/// The parts of a `package.json` the panel cares about.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Manifest {
    pub scripts: Scripts,
}

impl Manifest {
    /// Parse manifest text. Anything other than a JSON object under
    /// `scripts` is treated as no scripts at all.
    pub fn parse(content: &str) -> Result<Self> {
        let doc: Value = serde_json::from_str(content)?;
        let scripts = match doc.get("scripts") {
            Some(Value::Object(map)) => map.clone(),
            Some(Value::Null) | None => Map::new(),
            Some(other) => {
                tracing::debug!("ignoring non-object scripts field: {other}");
                Map::new()
            }
        };
        Ok(Manifest { scripts })
    }

    pub fn read(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Self::parse(&content)
    }

    pub fn is_runnable(&self) -> bool {
        self.scripts.keys().any(|key| is_runnable_script(key))
    }
}

/// True if the script name contains one of [`RUNNABLE_KEYWORDS`], ignoring case.
pub fn is_runnable_script(name: &str) -> bool {
    let lower = name.to_lowercase();
    RUNNABLE_KEYWORDS.iter().any(|kw| lower.contains(kw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_keeps_declaration_order() {
        let m = Manifest::parse(r#"{"scripts": {"zeta": "z", "alpha": "a", "dev": "vite"}}"#)
            .expect("valid manifest");
        let keys: Vec<&str> = m.scripts.keys().map(String::as_str).collect();
        assert_eq!(keys, ["zeta", "alpha", "dev"]);
    }

    #[test]
    fn missing_scripts_is_empty() {
        let m = Manifest::parse(r#"{"name": "lib"}"#).expect("valid manifest");
        assert!(m.scripts.is_empty());
        assert!(!m.is_runnable());
    }

    #[test]
    fn non_object_scripts_is_empty() {
        let m = Manifest::parse(r#"{"scripts": "npm start"}"#).expect("valid manifest");
        assert!(m.scripts.is_empty());
        let m = Manifest::parse(r#"{"scripts": null}"#).expect("valid manifest");
        assert!(m.scripts.is_empty());
    }

    #[test]
    fn top_level_array_has_no_scripts() {
        let m = Manifest::parse("[1, 2, 3]").expect("valid json");
        assert!(!m.is_runnable());
    }

    #[test]
    fn invalid_json_is_an_error() {
        assert!(Manifest::parse("{ \"scripts\": ").is_err());
    }

    // -----------------------------------------------------------------------
    // runnability
    // -----------------------------------------------------------------------

    #[test]
    fn substring_match_qualifies() {
        assert!(is_runnable_script("predev"));
        assert!(is_runnable_script("start:android"));
        assert!(is_runnable_script("devtools-check"));
        assert!(is_runnable_script("IOS"));
        assert!(is_runnable_script("Serve"));
    }

    #[test]
    fn build_and_test_do_not_qualify() {
        let m = Manifest::parse(r#"{"scripts": {"build": "tsc", "test": "jest"}}"#)
            .expect("valid manifest");
        assert!(!m.is_runnable());
    }

    #[test]
    fn one_qualifying_key_is_enough() {
        let m = Manifest::parse(r#"{"scripts": {"build": "tsc", "watch": "tsc -w"}}"#)
            .expect("valid manifest");
        assert!(m.is_runnable());
    }
}
