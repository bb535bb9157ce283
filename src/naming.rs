use std::str::FromStr;

use anyhow::anyhow;
use regex::Regex;

/// Applied before the user supplied replacements. A user replacement with the same pattern takes
/// the built-in's place.
const BUILTIN_REPLACEMENTS: [(&str, &str); 2] = [("_", "-"), (" ", "-")];

#[derive(Debug, Clone)]
pub struct Replacement {
    pattern: Regex,
    replacement: String,
}

impl Replacement {
    pub fn new(pattern: &str, replacement: &str) -> anyhow::Result<Self> {
        let pattern = Regex::new(pattern)
            .map_err(|e| anyhow!("invalid replacement pattern `{}`: {}", pattern, e))?;
        Ok(Replacement {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    pub fn pattern(&self) -> &str {
        self.pattern.as_str()
    }

    pub fn apply(&self, name: &str) -> String {
        self.pattern
            .replace_all(name, self.replacement.as_str())
            .into_owned()
    }
}

/// Parses the `pattern,replacement` form used on the command line.
impl FromStr for Replacement {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.split_once(',') {
            Some((pattern, replacement)) if !replacement.contains(',') => {
                Replacement::new(pattern, replacement)
            }
            _ => Err(anyhow!(
                "Expected values in the form 'pattern,replacement', got: '{}'",
                s
            )),
        }
    }
}

/// Ordered regex substitutions turning `<account>-<role>` into a profile name.
#[derive(Debug, Clone)]
pub struct ProfileNamer {
    replacements: Vec<Replacement>,
}

impl ProfileNamer {
    /// A pattern given more than once keeps its first position and its last replacement.
    pub fn new(user_replacements: Vec<Replacement>) -> anyhow::Result<Self> {
        let mut replacements = BUILTIN_REPLACEMENTS
            .iter()
            .map(|(pattern, replacement)| Replacement::new(pattern, replacement))
            .collect::<anyhow::Result<Vec<_>>>()?;

        for user in user_replacements {
            match replacements.iter_mut().find(|r| r.pattern() == user.pattern()) {
                Some(slot) => *slot = user,
                None => replacements.push(user),
            }
        }
        Ok(ProfileNamer { replacements })
    }

    pub fn profile_name(&self, account_name: &str, role_name: &str) -> String {
        self.replacements.iter().fold(
            format!("{}-{}", account_name, role_name),
            |name, replacement| replacement.apply(&name),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(pattern: &str, replacement: &str) -> Replacement {
        Replacement::new(pattern, replacement).unwrap()
    }

    #[test]
    fn builtins_normalize_separators() {
        let namer = ProfileNamer::new(Vec::new()).unwrap();
        assert_eq!(
            namer.profile_name("Shared Services", "Read_Only"),
            "Shared-Services-Read-Only"
        );
    }

    #[test]
    fn replacements_apply_in_order() {
        let forward = ProfileNamer::new(vec![r("Sandbox-", "sbx-"), r("^sbx-", "play-")]).unwrap();
        let reversed = ProfileNamer::new(vec![r("^sbx-", "play-"), r("Sandbox-", "sbx-")]).unwrap();

        assert_eq!(forward.profile_name("Sandbox", "Admin"), "play-Admin");
        assert_eq!(reversed.profile_name("Sandbox", "Admin"), "sbx-Admin");
    }

    #[test]
    fn builtins_run_before_user_replacements() {
        let namer = ProfileNamer::new(vec![r("^Sandbox_", "sbx-")]).unwrap();
        assert_eq!(namer.profile_name("Sandbox_Team", "Admin"), "Sandbox-Team-Admin");

        let namer = ProfileNamer::new(vec![r("^Sandbox-", "sbx-")]).unwrap();
        assert_eq!(namer.profile_name("Sandbox_Team", "Admin"), "sbx-Team-Admin");
    }

    #[test]
    fn user_pattern_takes_the_builtin_slot() {
        let namer = ProfileNamer::new(vec![r(" ", "_"), r("_", ".")]).unwrap();
        assert_eq!(
            namer.profile_name("my_account", "Power User"),
            "my.account-Power_User"
        );
    }

    #[test]
    fn repeated_user_pattern_keeps_last_replacement() {
        let namer = ProfileNamer::new(vec![r("-Admin$", "-a"), r("^prod", "p"), r("-Admin$", "-admin")])
            .unwrap();
        assert_eq!(namer.profile_name("prod", "Admin"), "p-admin");
    }

    #[test]
    fn replacement_supports_capture_groups() {
        let namer = ProfileNamer::new(vec![r(r"^(\w+)-AWSAdministratorAccess$", "$1-admin")]).unwrap();
        assert_eq!(
            namer.profile_name("prod", "AWSAdministratorAccess"),
            "prod-admin"
        );
    }

    #[test]
    fn parse_requires_exactly_one_comma() {
        let parsed: Replacement = "Sandbox-,sbx-".parse().unwrap();
        assert_eq!(parsed.pattern(), "Sandbox-");
        assert_eq!(parsed.apply("Sandbox-Admin"), "sbx-Admin");

        assert!("no-comma".parse::<Replacement>().is_err());
        assert!("a,b,c".parse::<Replacement>().is_err());
    }

    #[test]
    fn parse_rejects_invalid_regex() {
        let err = "(unclosed,x".parse::<Replacement>().unwrap_err();
        assert!(err.to_string().contains("invalid replacement pattern"));
    }
}
