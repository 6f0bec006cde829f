use crate::error::BotError;
use crate::models::Position;
use crate::Result;

/// Open positions in insertion order (index 0 is the oldest)
#[derive(Debug, Clone, Default)]
pub struct PositionQueue {
    positions: Vec<Position>,
}

impl PositionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restore a queue from persisted positions, keeping their order
    pub fn with_positions(positions: Vec<Position>) -> Self {
        tracing::info!("Restored {} open positions", positions.len());
        Self { positions }
    }

    pub fn append(&mut self, position: Position) {
        self.positions.push(position);
    }

    /// Remove the position at `index`, shifting later positions down
    pub fn remove_at(&mut self, index: usize) -> Result<Position> {
        if index >= self.positions.len() {
            return Err(BotError::IndexOutOfRange {
                index,
                len: self.positions.len(),
            });
        }
        Ok(self.positions.remove(index))
    }

    pub fn get(&self, index: usize) -> Result<&Position> {
        self.positions.get(index).ok_or(BotError::IndexOutOfRange {
            index,
            len: self.positions.len(),
        })
    }

    /// Owned snapshot, safe to iterate while the queue is later mutated
    pub fn all(&self) -> Vec<Position> {
        self.positions.clone()
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }
}
