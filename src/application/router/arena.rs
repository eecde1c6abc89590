//! Append-only output arena for one router execution.

use crate::domain::{Backing, Output};
use crate::error::RouterError;

#[derive(Debug, Clone, Copy)]
struct Slot {
    output: Output,
    backing: Backing,
    consumed: bool,
}

/// Outputs produced so far, addressed by index.
///
/// Reads past the end are rejected, so an instruction can only see outputs
/// produced before it ran.
#[derive(Debug, Default)]
pub struct OutputArena {
    slots: Vec<Slot>,
}

impl OutputArena {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an output whose tokens the router holds. Returns its index.
    pub fn push(&mut self, output: Output) -> usize {
        self.append(output, Backing::Custody)
    }

    /// Append a declared output with nothing behind it yet. Returns its index.
    pub fn push_virtual(&mut self, output: Output) -> usize {
        self.append(output, Backing::Virtual)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Read an output without consuming it.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfBounds`] for forward references.
    pub fn peek(&self, instruction: usize, index: usize) -> Result<Output, RouterError> {
        self.slot(instruction, index).map(|slot| slot.output)
    }

    /// Backing of an output.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfBounds`] for forward references.
    pub fn backing(&self, instruction: usize, index: usize) -> Result<Backing, RouterError> {
        self.slot(instruction, index).map(|slot| slot.backing)
    }

    /// Take an output for a consuming reader. Each output is consumed at most once.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::IndexOutOfBounds`], [`RouterError::AlreadyConsumed`]
    /// or [`RouterError::UnbackedOutput`].
    pub fn consume(&mut self, instruction: usize, index: usize) -> Result<Output, RouterError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(RouterError::IndexOutOfBounds {
                instruction,
                index,
                len,
            })?;
        if slot.consumed {
            return Err(RouterError::AlreadyConsumed { index });
        }
        if slot.backing == Backing::Virtual {
            return Err(RouterError::UnbackedOutput { index });
        }
        slot.consumed = true;
        Ok(slot.output)
    }

    /// Mark a virtual output as backed by custody.
    ///
    /// # Errors
    ///
    /// Returns [`RouterError::AlreadyBacked`] when the output already holds tokens.
    pub fn back(&mut self, instruction: usize, index: usize) -> Result<Output, RouterError> {
        let len = self.slots.len();
        let slot = self
            .slots
            .get_mut(index)
            .ok_or(RouterError::IndexOutOfBounds {
                instruction,
                index,
                len,
            })?;
        if slot.backing == Backing::Custody {
            return Err(RouterError::AlreadyBacked { index });
        }
        slot.backing = Backing::Custody;
        Ok(slot.output)
    }

    /// Final outputs in index order.
    #[must_use]
    pub fn into_outputs(self) -> Vec<Output> {
        self.slots.into_iter().map(|slot| slot.output).collect()
    }

    fn append(&mut self, output: Output, backing: Backing) -> usize {
        self.slots.push(Slot {
            output,
            backing,
            consumed: false,
        });
        self.slots.len() - 1
    }

    fn slot(&self, instruction: usize, index: usize) -> Result<&Slot, RouterError> {
        self.slots.get(index).ok_or(RouterError::IndexOutOfBounds {
            instruction,
            index,
            len: self.slots.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::{Address, U256};

    fn output(amount: u64) -> Output {
        Output::new(U256::from(amount), Address::repeat_byte(1), Address::repeat_byte(2))
    }

    #[test]
    fn forward_reference_is_rejected() {
        let mut arena = OutputArena::new();
        arena.push(output(1));
        assert_eq!(
            arena.peek(3, 1),
            Err(RouterError::IndexOutOfBounds {
                instruction: 3,
                index: 1,
                len: 1
            })
        );
    }

    #[test]
    fn outputs_are_consumed_once() {
        let mut arena = OutputArena::new();
        let idx = arena.push(output(5));
        assert_eq!(arena.consume(0, idx).unwrap().amount, U256::from(5));
        assert_eq!(
            arena.consume(1, idx),
            Err(RouterError::AlreadyConsumed { index: idx })
        );
        // non-consuming reads still work
        assert!(arena.peek(2, idx).is_ok());
    }

    #[test]
    fn virtual_outputs_need_backing() {
        let mut arena = OutputArena::new();
        let idx = arena.push_virtual(output(9));
        assert_eq!(
            arena.consume(0, idx),
            Err(RouterError::UnbackedOutput { index: idx })
        );
        arena.back(1, idx).unwrap();
        assert_eq!(arena.back(2, idx), Err(RouterError::AlreadyBacked { index: idx }));
        assert!(arena.consume(3, idx).is_ok());
    }
}
