//! Tripwire: hashing, enumeration and baseline reconciliation.

pub mod hasher;
pub mod reconcile;
pub mod walk;
