use std::sync::Arc;

use crate::model::{ItineraryEntry, Payload};
use crate::notify::Notifier;
use crate::storage::KeyValueStore;

pub const STORAGE_KEY: &str = "travel-itinerary";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddOutcome {
    Added { id: String },
    Duplicate { existing_id: String },
}

/// The user's selected flights, hotels and activities, in the order added.
///
/// Constructed only through [`Itinerary::load`], so a value of this type is
/// always hydrated. Every mutation is written back to storage; a failed write
/// is logged and the in-memory list stays authoritative.
pub struct Itinerary {
    entries: Vec<ItineraryEntry>,
    storage: Arc<dyn KeyValueStore>,
    notifier: Arc<dyn Notifier>,
}

impl Itinerary {
    pub fn load(storage: Arc<dyn KeyValueStore>, notifier: Arc<dyn Notifier>) -> Self {
        let entries = match storage.get(STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Vec<ItineraryEntry>>(&raw) {
                Ok(entries) => entries,
                Err(e) => {
                    tracing::warn!(error = %e, "stored itinerary is unreadable, starting empty");
                    Vec::new()
                }
            },
            Ok(None) => Vec::new(),
            Err(e) => {
                tracing::warn!(error = %e, "could not read stored itinerary, starting empty");
                Vec::new()
            }
        };

        tracing::debug!(entries = entries.len(), "itinerary loaded");
        Self {
            entries,
            storage,
            notifier,
        }
    }

    pub fn list(&self) -> &[ItineraryEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&ItineraryEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    fn find_equivalent(&self, payload: &Payload) -> Option<&ItineraryEntry> {
        self.entries
            .iter()
            .find(|existing| existing.payload.is_duplicate_of(payload))
    }

    pub fn contains_equivalent(&self, payload: &Payload) -> bool {
        self.find_equivalent(payload).is_some()
    }

    pub fn add(&mut self, entry: ItineraryEntry) -> AddOutcome {
        if let Some(existing) = self.find_equivalent(&entry.payload) {
            let existing_id = existing.id.clone();
            tracing::debug!(kind = %entry.kind(), %existing_id, "rejected duplicate itinerary entry");
            self.notifier.notify(
                "Already Added!",
                "This item is already in your itinerary.",
            );
            return AddOutcome::Duplicate { existing_id };
        }

        let mut entry = entry;
        while self.get(&entry.id).is_some() {
            entry.id = ItineraryEntry::new(entry.payload.clone()).id;
        }

        let id = entry.id.clone();
        let kind = entry.kind();
        let label = entry.payload.label();
        self.entries.push(entry);
        self.persist();

        self.notifier.notify(
            &format!("{} Added!", kind.title()),
            &format!("{label} has been added to your itinerary."),
        );
        AddOutcome::Added { id }
    }

    pub fn add_payload(&mut self, payload: Payload) -> AddOutcome {
        self.add(ItineraryEntry::new(payload))
    }

    pub fn remove(&mut self, id: &str) -> Option<ItineraryEntry> {
        let removed = self
            .entries
            .iter()
            .position(|e| e.id == id)
            .map(|idx| self.entries.remove(idx));
        self.persist();

        if let Some(ref entry) = removed {
            self.notifier.notify(
                &format!("{} Removed!", entry.kind().title()),
                &format!("{} has been removed from your itinerary.", entry.payload.label()),
            );
        }
        removed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.persist();
        self.notifier.notify(
            "Itinerary Cleared!",
            "All items have been removed from your itinerary.",
        );
    }

    fn persist(&self) {
        let serialized = match serde_json::to_string(&self.entries) {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!(error = %e, "could not serialize itinerary");
                return;
            }
        };
        if let Err(e) = self.storage.set(STORAGE_KEY, &serialized) {
            tracing::warn!(error = %e, "could not save itinerary, keeping changes in memory");
        }
    }
}
