//! Workflow coordinators.
//!
//! Coordinators sit between the interactive surfaces and the authority: they
//! run the local guards and validation a call needs, dispatch it as one
//! coarse-grained unit of work, and on confirmation apply the result to the
//! shared caches. No coordinator mutates local state before the authority
//! confirms.

pub mod matching;
pub mod scheduling;
