//! State management for orders.
//!
//! This module provides the status transition engine: unguarded status
//! assignment for staff, and table-checked advancement for the courier
//! pipeline.

pub mod order;

pub use order::{is_valid_courier_transition, OrderStateMachine};
