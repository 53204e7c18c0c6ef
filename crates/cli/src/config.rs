use std::path::PathBuf;

/// Tool configuration loaded from environment variables.
///
/// | Env Var                       | Default              |
/// |-------------------------------|----------------------|
/// | `RESTNS_MANIFEST`             | `rest-manifest.json` |
/// | `RESTNS_VIEWER_ADMIN`         | `true`               |
/// | `RESTNS_EXISTING_NAMESPACES`  | (empty)              |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliConfig {
    /// Path of the JSON manifest to install.
    pub manifest_path: PathBuf,
    /// Whether the simulated viewer holds the administrator capability,
    /// which decides if admin notices are rendered.
    pub viewer_is_admin: bool,
    /// Namespace keys the simulated host already serves, parsed from a
    /// comma-separated list.
    pub existing_namespaces: Vec<String>,
}

impl CliConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup; unset keys fall back to defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let manifest_path = lookup("RESTNS_MANIFEST")
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "rest-manifest.json".into())
            .into();

        let viewer_is_admin = lookup("RESTNS_VIEWER_ADMIN")
            .map(|v| parse_flag(&v))
            .unwrap_or(true);

        let existing_namespaces = lookup("RESTNS_EXISTING_NAMESPACES")
            .unwrap_or_default()
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        Self {
            manifest_path,
            viewer_is_admin,
            existing_namespaces,
        }
    }
}

fn parse_flag(value: &str) -> bool {
    !matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off"
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_unset() {
        let config = CliConfig::from_lookup(lookup(&[]));
        assert_eq!(config.manifest_path, PathBuf::from("rest-manifest.json"));
        assert!(config.viewer_is_admin);
        assert!(config.existing_namespaces.is_empty());
    }

    #[test]
    fn reads_all_keys() {
        let config = CliConfig::from_lookup(lookup(&[
            ("RESTNS_MANIFEST", "/etc/restns/routes.json"),
            ("RESTNS_VIEWER_ADMIN", "off"),
            ("RESTNS_EXISTING_NAMESPACES", "wp/v2, oembed/1.0,,"),
        ]));
        assert_eq!(config.manifest_path, PathBuf::from("/etc/restns/routes.json"));
        assert!(!config.viewer_is_admin);
        assert_eq!(config.existing_namespaces, vec!["wp/v2", "oembed/1.0"]);
    }

    #[test]
    fn unknown_flag_values_count_as_true() {
        assert!(parse_flag("yes"));
        assert!(parse_flag("1"));
        assert!(!parse_flag(" FALSE "));
    }
}
