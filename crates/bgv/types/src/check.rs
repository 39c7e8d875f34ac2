//! Checks and the catalog an organization has purchased

use serde::{Deserialize, Serialize};

// ── Check Identifier ─────────────────────────────────────────────────

/// String key naming a single verification activity (e.g. `PAN`, `CREDIT`)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CheckId(pub String);

impl CheckId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CheckId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for CheckId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ── Category ─────────────────────────────────────────────────────────

/// How a check is carried out
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CheckCategory {
    /// Automated lookup against a provider API
    Api,
    /// Performed by a human reviewer
    Manual,
    /// AI-assisted analysis
    Ai,
}

impl CheckCategory {
    /// Whether an operator records the verdict by hand
    pub fn accepts_manual_verdict(&self) -> bool {
        matches!(self, Self::Manual | Self::Ai)
    }
}

impl std::fmt::Display for CheckCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Api => write!(f, "API"),
            Self::Manual => write!(f, "MANUAL"),
            Self::Ai => write!(f, "AI"),
        }
    }
}

// ── Offered Check ────────────────────────────────────────────────────

/// A check as offered to an organization
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OfferedCheck {
    pub check: CheckId,
    pub category: CheckCategory,
    /// Unit price, when the service discloses it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
}

impl OfferedCheck {
    pub fn new(check: impl Into<String>, category: CheckCategory) -> Self {
        Self {
            check: CheckId::new(check),
            category,
            price: None,
        }
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = Some(price);
        self
    }
}

// ── Catalog ──────────────────────────────────────────────────────────

/// Read-only, ordered list of checks an organization has purchased.
///
/// Order is whatever the service returned; pickers render in this order.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CheckCatalog {
    checks: Vec<OfferedCheck>,
}

impl CheckCatalog {
    /// Build a catalog, dropping later duplicates of the same check id
    pub fn new(offered: Vec<OfferedCheck>) -> Self {
        let mut checks: Vec<OfferedCheck> = Vec::with_capacity(offered.len());
        for item in offered {
            if !checks.iter().any(|c| c.check == item.check) {
                checks.push(item);
            }
        }
        Self { checks }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn get(&self, check: &CheckId) -> Option<&OfferedCheck> {
        self.checks.iter().find(|c| &c.check == check)
    }

    pub fn contains(&self, check: &CheckId) -> bool {
        self.get(check).is_some()
    }

    pub fn category_of(&self, check: &CheckId) -> Option<CheckCategory> {
        self.get(check).map(|c| c.category)
    }

    /// Check ids in catalog order
    pub fn ids(&self) -> impl Iterator<Item = &CheckId> {
        self.checks.iter().map(|c| &c.check)
    }

    pub fn iter(&self) -> impl Iterator<Item = &OfferedCheck> {
        self.checks.iter()
    }

    pub fn len(&self) -> usize {
        self.checks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checks.is_empty()
    }
}

impl FromIterator<OfferedCheck> for CheckCatalog {
    fn from_iter<I: IntoIterator<Item = OfferedCheck>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
