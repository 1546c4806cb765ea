//! Profile auto-suggestion
//!
//! A profile is suggested for a project directory when it carries at
//! least one detect rule and every rule matches. Candidates are tried in
//! name order; the first match wins.

use std::path::Path;

use super::types::Profile;

/// Suggest a profile for a project directory
#[must_use]
pub fn suggest<'a>(profiles: &'a [Profile], dir: &Path) -> Option<&'a Profile> {
    profiles
        .iter()
        .find(|p| !p.detect.is_empty() && p.detect.iter().all(|rule| rule.matches(dir)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::types::DetectRule;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn profile_with_rules(name: &str, rules: Vec<DetectRule>) -> Profile {
        let mut profile = Profile::new(name.into());
        profile.detect = rules;
        profile
    }

    #[test]
    fn test_all_rules_must_match() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let profiles = vec![profile_with_rules(
            "rust",
            vec![
                DetectRule::FileExists { path: PathBuf::from("Cargo.toml") },
                DetectRule::FileExists { path: PathBuf::from("rust-toolchain.toml") },
            ],
        )];
        assert!(suggest(&profiles, dir.path()).is_none());

        std::fs::write(dir.path().join("rust-toolchain.toml"), "").unwrap();
        assert_eq!(suggest(&profiles, dir.path()).unwrap().name, "rust");
    }

    #[test]
    fn test_rule_less_profiles_never_suggested() {
        let dir = TempDir::new().unwrap();
        let profiles = vec![Profile::new("anything".into())];
        assert!(suggest(&profiles, dir.path()).is_none());
    }

    #[test]
    fn test_first_match_wins() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("Cargo.toml"), "[package]").unwrap();

        let rule = DetectRule::FileExists { path: PathBuf::from("Cargo.toml") };
        let profiles = vec![
            profile_with_rules("alpha", vec![rule.clone()]),
            profile_with_rules("beta", vec![rule]),
        ];
        assert_eq!(suggest(&profiles, dir.path()).unwrap().name, "alpha");
    }
}
