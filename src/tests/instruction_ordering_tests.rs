//! Instruction Ordering Tests
//!
//! Plan validation for the segment order every operation relies on:
//! - Positive: the open-order and fee-collection layouts
//! - Negative: misplaced account init, setup, cleanup, missing core

use solana_sdk::{
    compute_budget::ComputeBudgetInstruction,
    instruction::{AccountMeta, Instruction},
    pubkey::Pubkey,
};

use super::test_helpers::swap_plan_fixture;
use crate::tx_builder::{InstructionPlan, Segment, TransactionBuilderError};

fn ix(tag: u8) -> Instruction {
    Instruction::new_with_bytes(Pubkey::new_unique(), &[tag], vec![AccountMeta::new(Pubkey::new_unique(), false)])
}

fn assert_invalid(plan: &InstructionPlan, fragment: &str) {
    match plan.validate() {
        Err(TransactionBuilderError::InvalidInstructionOrder(reason)) => {
            assert!(reason.contains(fragment), "unexpected reason: {}", reason)
        }
        other => panic!("expected invalid order, got {:?}", other),
    }
}

#[test]
fn test_open_order_layout_is_valid() {
    let user = Pubkey::new_unique();
    let swap = swap_plan_fixture(&user, 2, true, 0, 1);

    let mut plan = InstructionPlan::new();
    plan.push_account_init(ix(0));
    plan.push_swap(&swap, None);
    plan.push_core(ix(1));
    plan.push_swap_cleanup(&swap);

    assert!(plan.validate().is_ok());
    assert_eq!(
        plan.segments().collect::<Vec<_>>(),
        vec![
            Segment::AccountInit,
            Segment::SwapSetup,
            Segment::SwapSetup,
            Segment::Swap,
            Segment::Core,
            Segment::SwapCleanup,
        ]
    );
}

#[test]
fn test_fee_collection_layout_is_valid() {
    let user = Pubkey::new_unique();
    let swap = swap_plan_fixture(&user, 1, true, 0, 1);

    let mut plan = InstructionPlan::new();
    plan.push_core(ix(1));
    plan.push_swap(&swap, Some(500_000));
    plan.push_swap_cleanup(&swap);
    plan.push_transfer(ix(2));

    assert!(plan.validate().is_ok());
    let instructions = plan.into_instructions();
    assert_eq!(instructions.len(), 6);
    assert_eq!(instructions[2], ComputeBudgetInstruction::set_compute_unit_limit(500_000));
}

#[test]
fn test_plan_without_swap_cleanup_is_untouched() {
    let swap = swap_plan_fixture(&Pubkey::new_unique(), 0, false, 0, 1);
    let mut plan = InstructionPlan::new();
    plan.push_swap(&swap, None);
    plan.push_core(ix(1));
    plan.push_swap_cleanup(&swap);

    assert_eq!(plan.len(), 2);
    assert!(plan.validate().is_ok());
}

#[test]
fn test_empty_plan_is_rejected() {
    assert_invalid(&InstructionPlan::new(), "empty");
}

#[test]
fn test_plan_needs_a_core_instruction() {
    let mut plan = InstructionPlan::new();
    plan.push_transfer(ix(1));
    assert_invalid(&plan, "no core");
}

#[test]
fn test_account_init_must_lead() {
    let mut plan = InstructionPlan::new();
    plan.push_core(ix(1));
    plan.push_account_init(ix(0));
    assert_invalid(&plan, "initialisation");
}

#[test]
fn test_setup_after_swap_is_rejected() {
    let mut plan = InstructionPlan::new();
    plan.push(Segment::Swap, ix(1));
    plan.push(Segment::SwapSetup, ix(2));
    plan.push_core(ix(3));
    assert_invalid(&plan, "setup");
}

#[test]
fn test_cleanup_needs_a_preceding_swap() {
    let mut plan = InstructionPlan::new();
    plan.push(Segment::SwapCleanup, ix(1));
    plan.push_core(ix(2));
    assert_invalid(&plan, "cleanup must follow");

    let mut plan = InstructionPlan::new();
    plan.push_core(ix(2));
    plan.push(Segment::SwapCleanup, ix(1));
    plan.push(Segment::Swap, ix(3));
    assert_invalid(&plan, "cleanup must follow");
}

#[test]
fn test_single_cleanup_only() {
    let mut plan = InstructionPlan::new();
    plan.push(Segment::Swap, ix(1));
    plan.push_core(ix(2));
    plan.push(Segment::SwapCleanup, ix(3));
    plan.push(Segment::SwapCleanup, ix(4));
    assert_invalid(&plan, "At most one");
}
