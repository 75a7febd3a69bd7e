use std::fmt;

use serde::{Serialize, Serializer};

/// The label assigned to a page.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Category {
    /// A category defined by a rule; holds the rule name.
    Rule(String),
    /// No rule matched and there was nothing to inherit from.
    Other,
    /// The page was detected as blank.
    Blank,
}

impl Category {
    pub fn rule(name: impl Into<String>) -> Self {
        Category::Rule(name.into())
    }

    /// Names taken by the built-in categories; no rule may use them.
    #[must_use]
    pub fn is_reserved(name: &str) -> bool {
        matches!(name, "Other" | "Blank")
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        matches!(self, Category::Blank)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Category::Rule(name) => name,
            Category::Other => "Other",
            Category::Blank => "Blank",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Category {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}
