use std::collections::VecDeque;
use thiserror::Error;
use tracing::{debug, info};

use super::track::Track;

/// La cola de la guild alcanzó su capacidad máxima.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("la cola está llena (máximo {max} canciones)")]
pub struct QueueFull {
    pub max: usize,
}

/// Cola FIFO de pistas pendientes de una guild.
///
/// Nunca contiene la pista que está sonando: el coordinador la saca con
/// [`TrackQueue::pop_front`] antes de entregarla al transporte.
#[derive(Debug)]
pub struct TrackQueue<S> {
    items: VecDeque<Track<S>>,
    max_size: usize,
}

impl<S> TrackQueue<S> {
    pub fn new(max_size: usize) -> Self {
        Self {
            items: VecDeque::new(),
            max_size,
        }
    }

    /// Agrega una pista al final y devuelve su posición (empezando en 1)
    pub fn push(&mut self, track: Track<S>) -> Result<usize, QueueFull> {
        if self.items.len() >= self.max_size {
            return Err(QueueFull { max: self.max_size });
        }

        info!("➕ Agregado a la cola: {}", track.title());
        self.items.push_back(track);

        Ok(self.items.len())
    }

    /// Saca la siguiente pista (estricto FIFO)
    pub fn pop_front(&mut self) -> Option<Track<S>> {
        let next = self.items.pop_front();
        match &next {
            Some(track) => info!("➡️ Siguiente en cola (FIFO): {}", track.title()),
            None => debug!("📭 Cola vacía, no hay siguiente track"),
        }
        next
    }

    /// Vacía la cola; las pistas descartadas liberan su stream aquí mismo.
    pub fn clear(&mut self) -> usize {
        let removed = self.items.len();
        self.items.clear();
        if removed > 0 {
            info!("🗑️ Cola limpiada ({} canciones)", removed);
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Títulos en orden de reproducción, recortados a `limit`.
    pub fn listing(&self, limit: usize) -> QueueListing {
        let entries = self
            .items
            .iter()
            .take(limit)
            .map(|track| track.title().to_owned())
            .collect();

        QueueListing {
            entries,
            overflow: self.items.len().saturating_sub(limit),
        }
    }
}

/// Vista de la cola para `/queue`: primeros títulos y cuántos quedan fuera.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueListing {
    pub entries: Vec<String>,
    pub overflow: usize,
}

impl QueueListing {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty() && self.overflow == 0
    }

    pub fn total(&self) -> usize {
        self.entries.len() + self.overflow
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn track(title: &str) -> Track<()> {
        Track::new(title, ())
    }

    #[test]
    fn push_reports_one_based_positions_and_pops_in_order() {
        let mut queue = TrackQueue::new(10);
        assert_eq!(queue.push(track("a")), Ok(1));
        assert_eq!(queue.push(track("b")), Ok(2));
        assert_eq!(queue.push(track("c")), Ok(3));

        let order: Vec<String> = std::iter::from_fn(|| queue.pop_front())
            .map(|t| t.title().to_owned())
            .collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!(queue.is_empty());
    }

    #[test]
    fn full_queue_rejects_without_touching_existing_items() {
        let mut queue = TrackQueue::new(2);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();

        assert_eq!(queue.push(track("c")), Err(QueueFull { max: 2 }));
        assert_eq!(queue.listing(10).entries, vec!["a", "b"]);
    }

    #[test]
    fn listing_caps_entries_and_counts_overflow() {
        let mut queue = TrackQueue::new(100);
        for i in 1..=13 {
            queue.push(track(&format!("song {i}"))).unwrap();
        }

        let listing = queue.listing(10);
        assert_eq!(listing.entries.len(), 10);
        assert_eq!(listing.entries[0], "song 1");
        assert_eq!(listing.entries[9], "song 10");
        assert_eq!(listing.overflow, 3);
        assert_eq!(listing.total(), 13);
    }

    #[test]
    fn clear_drops_everything() {
        let mut queue = TrackQueue::new(10);
        queue.push(track("a")).unwrap();
        queue.push(track("b")).unwrap();

        assert_eq!(queue.clear(), 2);
        assert!(queue.listing(10).is_empty());
        assert_eq!(queue.clear(), 0);
    }
}
