/// The three keyword buckets the scanner classifies text against (§4.2,
/// §4.3). Ordering here doubles as priority ordering: dangerous commands
/// outrank prompt manipulation, which outranks sensitive data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeywordCategory {
    DangerousCommands,
    PromptManipulation,
    SensitiveData,
}

impl KeywordCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeywordCategory::DangerousCommands => "dangerous_commands",
            KeywordCategory::PromptManipulation => "prompt_manipulation",
            KeywordCategory::SensitiveData => "sensitive_data",
        }
    }
}

/// SQL verbs that require context-sensitive matching rather than plain
/// substring matching, to avoid false positives like "dropdown menu".
pub const SQL_VERBS: &[&str] = &[
    "drop", "delete", "truncate", "alter", "create", "insert", "update", "select", "exec",
    "shutdown", "format", "eval",
];

pub const SQL_CONTEXT_TERMS: &[&str] = &[
    "table", "database", "schema", "column", "index", "view", "function", "procedure",
    "trigger", "sql", "query", "db", "command", "statement",
];

pub const SQL_SYNTAX_TERMS: &[&str] = &[
    "select", "from", "where", "alter", "create", "insert", "update", "delete", ";", "--",
    "/*", "*/",
];

pub const EXECUTION_INTENT_TERMS: &[&str] = &[
    "command", "run", "execute", "shell", "terminal", "bash", "cmd", "powershell", "executing",
];

fn default_sensitive_data() -> Vec<&'static str> {
    vec!["password", "api_key", "token", "secret", "ssn", "credit card"]
}

fn default_dangerous_commands() -> Vec<&'static str> {
    vec!["drop table", "delete from", "rm -rf", "exec(", "system(", "eval("]
}

fn default_prompt_manipulation() -> Vec<&'static str> {
    vec!["ignore previous", "disregard", "bypass", "jailbreak", "hack", "exploit"]
}

/// A loaded, lowercase-normalized keyword set for one category.
///
/// `dangerous_commands` is special: it always includes the bare SQL verbs in
/// both original and upper case, on top of whatever configuration supplies,
/// because SQL-verb detection depends on their presence (§4.3).
#[derive(Debug, Clone, Default)]
pub struct KeywordSet {
    words: Vec<String>,
}

impl KeywordSet {
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.words.iter().map(|s| s.as_str())
    }

    pub fn len(&self) -> usize {
        self.words.len()
    }

    pub fn is_empty(&self) -> bool {
        self.words.is_empty()
    }

    /// Build the sensitive-data set: configured keywords (or defaults),
    /// lower-cased for matching.
    pub fn sensitive_data(configured: &[String]) -> Self {
        let source: Vec<String> = if configured.is_empty() {
            default_sensitive_data().into_iter().map(String::from).collect()
        } else {
            configured.to_vec()
        };
        let words = source.into_iter().map(|k| k.to_lowercase()).collect();
        KeywordSet { words }
    }

    /// Build the prompt-manipulation set: configured keywords (or defaults),
    /// lower-cased for matching.
    pub fn prompt_manipulation(configured: &[String]) -> Self {
        let source: Vec<String> = if configured.is_empty() {
            default_prompt_manipulation().into_iter().map(String::from).collect()
        } else {
            configured.to_vec()
        };
        let words = source.into_iter().map(|k| k.to_lowercase()).collect();
        KeywordSet { words }
    }

    /// Build the dangerous-commands set: the fixed SQL verbs (original and
    /// uppercase), plus configured commands (or defaults) in original,
    /// lower, and upper case.
    pub fn dangerous_commands(configured: &[String]) -> Self {
        let mut words: Vec<String> = Vec::new();
        let mut push_unique = |w: String| {
            if !words.contains(&w) {
                words.push(w);
            }
        };

        for verb in SQL_VERBS {
            push_unique(verb.to_string());
            push_unique(verb.to_uppercase());
        }

        let source: Vec<String> = if configured.is_empty() {
            default_dangerous_commands().into_iter().map(String::from).collect()
        } else {
            configured.to_vec()
        };

        for cmd in source {
            let lower = cmd.to_lowercase();
            let upper = cmd.to_uppercase();
            if cmd != lower {
                push_unique(lower.clone());
            }
            if cmd != upper {
                push_unique(upper);
            }
            push_unique(cmd);
        }

        KeywordSet { words }
    }
}
