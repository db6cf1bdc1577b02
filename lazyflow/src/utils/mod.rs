//! Internal data structures.
//!
//! This module provides the [`Slab`] used by the subject to keep track of
//! suspended waiters with stable, reusable keys.

mod slab;

pub(crate) use slab::Slab;
