use regex::Regex;
use std::sync::OnceLock;
use tracing::{debug, warn};

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\$\{(\w+)\}|\$(\w+)").expect("placeholder pattern is valid"))
}

/// Substitute environment variables in the format ${VAR_NAME} or $VAR_NAME
///
/// Unset variables keep their placeholder so validation can report them.
pub fn substitute_env_vars(content: &str) -> String {
    substitute_with(content, |name| std::env::var(name).ok())
}

/// Substitute placeholders using `lookup` to resolve variable names
pub fn substitute_with<F>(content: &str, lookup: F) -> String
where
    F: Fn(&str) -> Option<String>,
{
    let mut missing_vars = Vec::new();

    let result = placeholder_regex().replace_all(content, |caps: &regex::Captures<'_>| {
        let name = caps
            .get(1)
            .or_else(|| caps.get(2))
            .map(|m| m.as_str())
            .unwrap_or_default();

        match lookup(name) {
            Some(value) => {
                debug!("Substituting environment variable: {} = \"{}\"", name, value);
                value
            }
            None => {
                warn!("Environment variable '{}' not set", name);
                missing_vars.push(name.to_string());
                caps[0].to_string()
            }
        }
    });

    if !missing_vars.is_empty() {
        debug!(
            "Environment variables not set (left as placeholders): {:?}",
            missing_vars
        );
    }

    result.into_owned()
}

/// Check if a string contains unresolved environment variable placeholders
pub fn has_unresolved_env_vars(content: &str) -> bool {
    placeholder_regex().is_match(content)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "SPANNER_PROJECT_ID" => Some("test-project".to_string()),
            "SPANNER_INSTANCE_ID" => Some("test-instance".to_string()),
            _ => None,
        }
    }

    #[test]
    fn test_substitutes_both_forms() {
        let content = "project_id: ${SPANNER_PROJECT_ID}\ninstance_id: $SPANNER_INSTANCE_ID\n";
        assert_eq!(
            substitute_with(content, lookup),
            "project_id: test-project\ninstance_id: test-instance\n"
        );
    }

    #[test]
    fn test_unset_variables_keep_placeholder() {
        let content = "database_id: ${SPANNER_DATABASE_ID}";
        let result = substitute_with(content, lookup);
        assert_eq!(result, content);
        assert!(has_unresolved_env_vars(&result));
    }

    #[test]
    fn test_plain_text_is_untouched() {
        assert!(!has_unresolved_env_vars("emulator-config"));
        assert_eq!(substitute_with("emulator-config", lookup), "emulator-config");
    }
}
