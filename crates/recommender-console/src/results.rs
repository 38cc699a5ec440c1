//! The current result list and the per-item augmentation state bound to it.
//!
//! `AugmentationState` lives inside `ResultList`, so the two share a
//! lifetime: building a new list is the only way to replace results, and a
//! new list always starts with nothing in flight.

use std::collections::BTreeSet;

use recommender_common::error::ClientError;
use tracing::{debug, info, warn};

use crate::model::{ListId, ResultItem};

/// Positions of the current list with a generation request outstanding.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AugmentationState {
    in_flight: BTreeSet<usize>,
}

impl AugmentationState {
    pub fn is_in_flight(&self, position: usize) -> bool {
        self.in_flight.contains(&position)
    }

    pub fn is_empty(&self) -> bool {
        self.in_flight.is_empty()
    }

    pub fn in_flight(&self) -> impl Iterator<Item = usize> + '_ {
        self.in_flight.iter().copied()
    }

    fn begin(&mut self, position: usize) -> bool {
        self.in_flight.insert(position)
    }

    fn release(&mut self, position: usize) {
        self.in_flight.remove(&position);
    }
}

/// A generation request issued against one item of one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerateTicket {
    pub list: ListId,
    pub position: usize,
    pub uniq_id: String,
}

/// What happened when a generation completion was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerateApplied {
    /// The item now carries generated text.
    Generated,
    /// The request failed; the item keeps its original description.
    Failed,
    /// The ticket belongs to a list that has since been replaced.
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultList {
    id: ListId,
    items: Vec<ResultItem>,
    augmentation: AugmentationState,
}

impl ResultList {
    pub fn empty() -> Self {
        Self::new(ListId::INITIAL, Vec::new())
    }

    pub(crate) fn new(id: ListId, items: Vec<ResultItem>) -> Self {
        Self {
            id,
            items,
            augmentation: AugmentationState::default(),
        }
    }

    pub fn id(&self) -> ListId {
        self.id
    }

    pub fn items(&self) -> &[ResultItem] {
        &self.items
    }

    pub fn get(&self, position: usize) -> Option<&ResultItem> {
        self.items.get(position)
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn augmentation(&self) -> &AugmentationState {
        &self.augmentation
    }

    pub fn is_in_flight(&self, position: usize) -> bool {
        self.augmentation.is_in_flight(position)
    }

    /// Mark `position` in flight and return the request to issue.
    ///
    /// No-op for positions out of range, already in flight, or already
    /// carrying generated text.
    pub fn begin_generate(&mut self, position: usize) -> Option<GenerateTicket> {
        let item = self.items.get(position)?;
        if item.generated.is_some() {
            debug!(position, uniq_id = %item.uniq_id, "description already generated");
            return None;
        }
        let uniq_id = item.uniq_id.clone();
        if !self.augmentation.begin(position) {
            debug!(position, uniq_id = %uniq_id, "generation already in flight");
            return None;
        }
        info!(list = %self.id, position, uniq_id = %uniq_id, "generating description");
        Some(GenerateTicket {
            list: self.id,
            position,
            uniq_id,
        })
    }

    /// Apply a finished generation. Releases the in-flight flag whatever the
    /// outcome; only a success for the same list and item touches the item.
    pub fn finish_generate(
        &mut self,
        ticket: &GenerateTicket,
        outcome: Result<String, ClientError>,
    ) -> GenerateApplied {
        if ticket.list != self.id {
            debug!(
                ticket_list = %ticket.list,
                current_list = %self.id,
                position = ticket.position,
                "discarding generation for replaced list"
            );
            return GenerateApplied::Stale;
        }
        self.augmentation.release(ticket.position);

        let text = match outcome {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    error = %e,
                    position = ticket.position,
                    uniq_id = %ticket.uniq_id,
                    "description generation failed, keeping original description"
                );
                return GenerateApplied::Failed;
            }
        };

        match self.items.get_mut(ticket.position) {
            Some(item) if item.uniq_id == ticket.uniq_id => {
                item.generated = Some(text);
                GenerateApplied::Generated
            }
            _ => {
                warn!(
                    position = ticket.position,
                    uniq_id = %ticket.uniq_id,
                    "generated description does not match the item at its position"
                );
                GenerateApplied::Failed
            }
        }
    }
}

impl Default for ResultList {
    fn default() -> Self {
        Self::empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::SearchSeq;
    use recommender_common::error::StatusCode;

    fn item(id: &str) -> ResultItem {
        ResultItem {
            uniq_id: id.to_string(),
            title: format!("Product {id}"),
            categories: "['Electronics']".to_string(),
            price: Some(9.99),
            description: format!("Description of {id}"),
            generated: None,
        }
    }

    fn list(ids: &[&str]) -> ResultList {
        ResultList::new(
            ListId::from(SearchSeq::INITIAL.next()),
            ids.iter().map(|id| item(id)).collect(),
        )
    }

    fn upstream_failure() -> ClientError {
        ClientError::Upstream {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: "model unavailable".to_string(),
        }
    }

    #[test]
    fn test_begin_marks_only_that_position() {
        let mut results = list(&["a", "b", "c"]);
        let ticket = results.begin_generate(1).unwrap();
        assert_eq!(ticket.uniq_id, "b");
        assert!(results.is_in_flight(1));
        assert!(!results.is_in_flight(0));
        assert!(!results.is_in_flight(2));
    }

    #[test]
    fn test_begin_rejects_out_of_range_and_duplicates() {
        let mut results = list(&["a"]);
        assert!(results.begin_generate(3).is_none());
        assert!(results.begin_generate(0).is_some());
        assert!(results.begin_generate(0).is_none());
        assert_eq!(results.augmentation().in_flight().collect::<Vec<_>>(), vec![0]);
    }

    #[test]
    fn test_success_patches_only_target_item() {
        let mut results = list(&["a", "b", "c"]);
        let before = results.clone();
        let ticket = results.begin_generate(2).unwrap();

        let applied = results.finish_generate(&ticket, Ok("Shiny new text".to_string()));
        assert_eq!(applied, GenerateApplied::Generated);
        assert_eq!(results.get(2).unwrap().generated.as_deref(), Some("Shiny new text"));
        assert_eq!(results.get(0), before.get(0));
        assert_eq!(results.get(1), before.get(1));
        assert!(results.augmentation().is_empty());
    }

    #[test]
    fn test_failure_releases_flag_and_keeps_item() {
        let mut results = list(&["a", "b", "abc123"]);
        let before = results.get(2).cloned();
        let ticket = results.begin_generate(2).unwrap();

        let applied = results.finish_generate(&ticket, Err(upstream_failure()));
        assert_eq!(applied, GenerateApplied::Failed);
        assert!(!results.is_in_flight(2));
        assert_eq!(results.get(2).cloned(), before);
    }

    #[test]
    fn test_concurrent_generations_are_independent() {
        let mut results = list(&["a", "b", "c"]);
        let t0 = results.begin_generate(0).unwrap();
        let t2 = results.begin_generate(2).unwrap();

        results.finish_generate(&t2, Err(upstream_failure()));
        assert!(results.is_in_flight(0));
        assert!(!results.is_in_flight(2));

        results.finish_generate(&t0, Ok("zero".to_string()));
        assert_eq!(results.get(0).unwrap().generated.as_deref(), Some("zero"));
        assert_eq!(results.get(2).unwrap().generated, None);
    }

    #[test]
    fn test_generated_is_set_once() {
        let mut results = list(&["a"]);
        let ticket = results.begin_generate(0).unwrap();
        results.finish_generate(&ticket, Ok("first".to_string()));
        assert!(results.begin_generate(0).is_none());
        assert_eq!(results.get(0).unwrap().generated.as_deref(), Some("first"));
    }

    #[test]
    fn test_stale_ticket_is_ignored() {
        let mut old = list(&["a"]);
        let ticket = old.begin_generate(0).unwrap();

        let mut fresh = ResultList::new(
            ListId::from(SearchSeq::INITIAL.next().next()),
            vec![item("z")],
        );
        let applied = fresh.finish_generate(&ticket, Ok("leak".to_string()));
        assert_eq!(applied, GenerateApplied::Stale);
        assert_eq!(fresh.get(0).unwrap().generated, None);
    }

    #[test]
    fn test_mismatched_uniq_id_is_not_applied() {
        let mut results = list(&["a"]);
        let mut ticket = results.begin_generate(0).unwrap();
        ticket.uniq_id = "someone-else".to_string();

        let applied = results.finish_generate(&ticket, Ok("wrong".to_string()));
        assert_eq!(applied, GenerateApplied::Failed);
        assert!(!results.is_in_flight(0));
        assert_eq!(results.get(0).unwrap().generated, None);
    }
}
