use std::fmt;

use recommender_common::model::Product;

/// Trimmed, non-empty search text. The only way to issue a search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query(String);

impl Query {
    /// Returns `None` for empty or whitespace-only input.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        Some(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequence number of an issued search. Strictly increasing per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SearchSeq(u64);

impl SearchSeq {
    pub const INITIAL: SearchSeq = SearchSeq(0);

    pub fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SearchSeq {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity of a result list: the search that produced it.
///
/// Positions are only meaningful relative to one list, so every per-item
/// request is tagged with the list it was issued against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListId(SearchSeq);

impl ListId {
    /// The empty list a session starts with.
    pub const INITIAL: ListId = ListId(SearchSeq::INITIAL);
}

impl From<SearchSeq> for ListId {
    fn from(seq: SearchSeq) -> Self {
        Self(seq)
    }
}

impl fmt::Display for ListId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "list#{}", self.0)
    }
}

/// A displayed product match plus its optional generated description.
#[derive(Debug, Clone, PartialEq)]
pub struct ResultItem {
    pub uniq_id: String,
    pub title: String,
    pub categories: String,
    pub price: Option<f64>,
    pub description: String,
    /// Set at most once, by a successful generation for this item.
    pub generated: Option<String>,
}

impl From<Product> for ResultItem {
    fn from(p: Product) -> Self {
        Self {
            uniq_id: p.uniq_id,
            title: p.title,
            categories: p.categories,
            price: p.price,
            description: p.description,
            generated: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_rejects_blank_input() {
        assert_eq!(Query::parse(""), None);
        assert_eq!(Query::parse("   \t\n"), None);
    }

    #[test]
    fn test_query_trims() {
        let q = Query::parse("  wireless mouse ").unwrap();
        assert_eq!(q.as_str(), "wireless mouse");
        assert_eq!(q.to_string(), "wireless mouse");
    }

    #[test]
    fn test_search_seq_increases() {
        let first = SearchSeq::INITIAL.next();
        let second = first.next();
        assert!(second > first);
        assert_ne!(ListId::from(first), ListId::from(second));
        assert_ne!(ListId::from(first), ListId::INITIAL);
    }
}
