//! Engine modules: translate the frozen configuration into ordered operations.
//!
//! The engine layer sits between configuration (what the operator chose) and
//! execution (which commands run). It generates ordered, validated plans and
//! performs no I/O.

pub mod storage;
