//! Synchronization primitives for lazyflow.
//!
//! This module provides the bridge between externally driven events and
//! units of work:
//! - [`SingleValueSubject`]: a one-shot gate resolved by a producer and
//!   awaited by any number of consumers.
//!
//! ## Design notes
//!
//! - The subject does not spawn tasks; waiters are suspended on their own
//!   task and woken when the subject resolves.
//! - All state transitions are serialized by a blocking mutex that is only
//!   held for short, non-suspending critical sections.
//! - Subjects are cheap handles and are shared by cloning.

mod subject;

pub use subject::{SingleValueSubject, Wait};
