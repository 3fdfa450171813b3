//! Rendering stored facts into prompt context

use crate::db::Fact;

/// Render all facts into a single natural-language string for prompt
/// injection: `"<key> is <value>"` entries joined with `". "`.
///
/// An empty store yields an empty string; the downstream prompt simply
/// omits the context block content.
#[must_use]
pub fn format_context(facts: &[Fact]) -> String {
    facts
        .iter()
        .map(|f| format!("{} is {}", f.key, f.value))
        .collect::<Vec<_>>()
        .join(". ")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fact(key: &str, value: &str) -> Fact {
        Fact {
            key: key.to_string(),
            value: value.to_string(),
        }
    }

    #[test]
    fn test_empty_store() {
        assert_eq!(format_context(&[]), "");
    }

    #[test]
    fn test_single_fact() {
        let facts = vec![fact("dog_name", "Buster")];
        assert_eq!(format_context(&facts), "dog_name is Buster");
    }

    #[test]
    fn test_multiple_facts_joined() {
        let facts = vec![
            fact("spouse_name", "Sarah"),
            fact("dog_name", "Buster"),
        ];
        assert_eq!(
            format_context(&facts),
            "spouse_name is Sarah. dog_name is Buster"
        );
    }
}
