//! Static layout check of an instruction list.
//!
//! Every instruction declares the index it reads and how many outputs it
//! appends, so the arena shape is known before anything runs.

use std::collections::HashSet;
use std::ops::Range;

use serde::Serialize;

use crate::domain::Instruction;
use crate::error::RouterError;

/// Shape of one instruction within a layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LayoutStep {
    pub instruction: usize,
    pub kind: &'static str,
    /// Index read, if any.
    pub reads: Option<usize>,
    /// True when the read consumes the output.
    pub consumes: bool,
    /// Arena indices this instruction appends.
    pub appends: Range<usize>,
}

/// Result of a successful layout check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Layout {
    pub seeds: usize,
    pub steps: Vec<LayoutStep>,
    /// Arena length after the last instruction.
    pub final_len: usize,
}

/// True when the instruction consumes the output it reads.
#[must_use]
pub fn consumes_input(instruction: &Instruction) -> bool {
    match instruction {
        Instruction::PushToken { .. } => true,
        Instruction::Protocol { op, .. } => op.action.consumes_tokens(),
        _ => false,
    }
}

/// Check that every read index exists when its instruction runs, that
/// consuming instructions have an input, and that no output is consumed twice.
///
/// `seeds` is the number of outputs pre-populated before the first instruction.
///
/// # Errors
///
/// Returns the first [`RouterError`] found.
pub fn validate_layout(instructions: &[Instruction], seeds: usize) -> Result<Layout, RouterError> {
    let mut len = seeds;
    let mut consumed = HashSet::new();
    let mut steps = Vec::with_capacity(instructions.len());

    for (i, instruction) in instructions.iter().enumerate() {
        if let Instruction::Protocol { op, .. } = instruction {
            if op.action.consumes_tokens() && op.input.is_none() {
                return Err(RouterError::MissingInput {
                    instruction: i,
                    kind: op.action.as_str(),
                });
            }
        }

        let reads = instruction.input();
        let consumes = consumes_input(instruction);
        if let Some(index) = reads {
            if index >= len {
                return Err(RouterError::IndexOutOfBounds {
                    instruction: i,
                    index,
                    len,
                });
            }
            if consumes && !consumed.insert(index) {
                return Err(RouterError::AlreadyConsumed { index });
            }
        }

        let appended = instruction.appended_outputs();
        steps.push(LayoutStep {
            instruction: i,
            kind: instruction.kind(),
            reads,
            consumes,
            appends: len..len + appended,
        });
        len += appended;
    }

    Ok(Layout {
        seeds,
        steps,
        final_len: len,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{LendingAction, LendingOp};
    use alloy_primitives::{Address, U256};

    const USER: Address = Address::repeat_byte(0xaa);
    const TOKEN: Address = Address::repeat_byte(0x01);

    fn pull() -> Instruction {
        Instruction::PullToken {
            amount: U256::from(10),
            token: TOKEN,
            user: USER,
        }
    }

    #[test]
    fn counts_follow_declared_outputs() {
        let list = vec![
            pull(),
            Instruction::approve(0, "venue"),
            Instruction::protocol(
                "venue",
                LendingOp::from_input(LendingAction::Repay, TOKEN, USER, 0),
            ),
            Instruction::PushToken {
                input: 2,
                recipient: USER,
            },
        ];
        let layout = validate_layout(&list, 0).unwrap();
        assert_eq!(layout.final_len, 3);
        assert_eq!(layout.steps[2].appends, 2..3);
        assert!(layout.steps[3].consumes);
    }

    #[test]
    fn seeds_shift_indices() {
        let list = vec![Instruction::PushToken {
            input: 1,
            recipient: USER,
        }];
        assert!(validate_layout(&list, 1).is_err());
        assert_eq!(validate_layout(&list, 2).unwrap().final_len, 2);
    }

    #[test]
    fn rejects_forward_reference() {
        let list = vec![
            Instruction::PushToken {
                input: 0,
                recipient: USER,
            },
            pull(),
        ];
        assert_eq!(
            validate_layout(&list, 0),
            Err(RouterError::IndexOutOfBounds {
                instruction: 0,
                index: 0,
                len: 0
            })
        );
    }

    #[test]
    fn rejects_double_consumption() {
        let push = Instruction::PushToken {
            input: 0,
            recipient: USER,
        };
        let list = vec![pull(), push.clone(), push];
        assert_eq!(
            validate_layout(&list, 0),
            Err(RouterError::AlreadyConsumed { index: 0 })
        );
    }

    #[test]
    fn consuming_protocol_needs_input() {
        let list = vec![Instruction::protocol(
            "venue",
            LendingOp::new(LendingAction::Repay, TOKEN, USER, U256::from(1)),
        )];
        assert!(matches!(
            validate_layout(&list, 0),
            Err(RouterError::MissingInput { instruction: 0, .. })
        ));
    }
}
