//! Instruction planning and ordering validation
//!
//! An operation's instructions come from three sources: the triad program,
//! the token/system programs, and the swap routing service. The plan keeps
//! each instruction tagged with the segment it belongs to so the final
//! ordering can be checked before compilation:
//! 1. Account initialisation (only at the very start)
//! 2. Swap setup, before any swap instruction
//! 3. Swap instructions
//! 4. Swap cleanup, after the swap
//!
//! Core program instructions and settlement transfers may sit before or
//! after the swap leg depending on the operation.

use crate::swap::SwapPlan;
use crate::tx_builder::errors::TransactionBuilderError;
use solana_sdk::{compute_budget::ComputeBudgetInstruction, instruction::Instruction};

/// Role of an instruction inside a plan
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Segment {
    AccountInit,
    Core,
    SwapSetup,
    ComputeBudget,
    Swap,
    SwapCleanup,
    Transfer,
}

/// Ordered instructions of one operation, with segment tags
#[derive(Debug, Clone, Default)]
pub struct InstructionPlan {
    steps: Vec<(Segment, Instruction)>,
}

impl InstructionPlan {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, segment: Segment, instruction: Instruction) -> &mut Self {
        self.steps.push((segment, instruction));
        self
    }

    pub fn push_account_init(&mut self, instruction: Instruction) -> &mut Self {
        self.push(Segment::AccountInit, instruction)
    }

    pub fn push_core(&mut self, instruction: Instruction) -> &mut Self {
        self.push(Segment::Core, instruction)
    }

    pub fn push_transfer(&mut self, instruction: Instruction) -> &mut Self {
        self.push(Segment::Transfer, instruction)
    }

    /// Append setup and swap instructions of `swap`.
    ///
    /// `compute_unit_limit` goes between setup and swap when set. Cleanup is
    /// appended separately with [`push_swap_cleanup`](Self::push_swap_cleanup)
    /// so callers can put a core instruction between the swap and its cleanup.
    pub fn push_swap(&mut self, swap: &SwapPlan, compute_unit_limit: Option<u32>) -> &mut Self {
        for ix in &swap.setup {
            self.push(Segment::SwapSetup, ix.clone());
        }
        if let Some(units) = compute_unit_limit {
            self.push(
                Segment::ComputeBudget,
                ComputeBudgetInstruction::set_compute_unit_limit(units),
            );
        }
        for ix in &swap.swap {
            self.push(Segment::Swap, ix.clone());
        }
        self
    }

    pub fn push_swap_cleanup(&mut self, swap: &SwapPlan) -> &mut Self {
        if let Some(ix) = &swap.cleanup {
            self.push(Segment::SwapCleanup, ix.clone());
        }
        self
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn segments(&self) -> impl Iterator<Item = Segment> + '_ {
        self.steps.iter().map(|(segment, _)| *segment)
    }

    pub fn instructions(&self) -> impl Iterator<Item = &Instruction> + '_ {
        self.steps.iter().map(|(_, ix)| ix)
    }

    /// Consume the plan, returning instructions in execution order
    pub fn into_instructions(self) -> Vec<Instruction> {
        self.steps.into_iter().map(|(_, ix)| ix).collect()
    }

    /// Check the ordering rules described in the module docs.
    pub fn validate(&self) -> Result<(), TransactionBuilderError> {
        if self.steps.is_empty() {
            return Err(TransactionBuilderError::invalid_order("Instruction list is empty"));
        }
        if !self.segments().any(|s| s == Segment::Core) {
            return Err(TransactionBuilderError::invalid_order("Plan has no core instruction"));
        }

        let init_prefix = self.segments().take_while(|s| *s == Segment::AccountInit).count();
        if self.segments().skip(init_prefix).any(|s| s == Segment::AccountInit) {
            return Err(TransactionBuilderError::invalid_order(
                "Account initialisation must precede every other instruction",
            ));
        }

        let first = |segment: Segment| self.segments().position(|s| s == segment);
        let last = |segment: Segment| {
            self.steps
                .iter()
                .rposition(|(s, _)| *s == segment)
        };

        if let (Some(setup), Some(swap)) = (last(Segment::SwapSetup), first(Segment::Swap)) {
            if setup > swap {
                return Err(TransactionBuilderError::invalid_order(
                    "Swap setup must precede the swap",
                ));
            }
        }

        if let Some(cleanup) = first(Segment::SwapCleanup) {
            match last(Segment::Swap) {
                Some(swap) if swap < cleanup => {}
                _ => {
                    return Err(TransactionBuilderError::invalid_order(
                        "Swap cleanup must follow the swap",
                    ))
                }
            }
            if self.segments().filter(|s| *s == Segment::SwapCleanup).count() > 1 {
                return Err(TransactionBuilderError::invalid_order(
                    "At most one swap cleanup instruction",
                ));
            }
        }

        Ok(())
    }
}
