//! # lazyflow
//!
//! **lazyflow** provides lazy, composable units of asynchronous work for the
//! **Nebula** ecosystem, together with the bridge needed to feed
//! callback-driven events into them.
//!
//! It builds on top of an existing tokio runtime rather than scheduling
//! anything itself, and offers:
//!
//! - **Units of work** ([`UnitOfWork`], [`DeferredTask`]) that do nothing until
//!   started and rerun their whole chain on every start
//! - **Combinators** such as `map`, `try_map`, `materialize`, `flat_map`,
//!   `catch`, `retry`, `timeout` and `delay`
//! - **Single-value subjects** ([`SingleValueSubject`]) resolved exactly once by
//!   a producer and awaited by any number of consumers
//! - **Sequence operators** ([`SequenceExt`]) to delay elements and observe
//!   the lifecycle of a stream
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use lazyflow::{SingleValueSubject, UnitOfWork, deferred};
//!
//! #[tokio::main]
//! async fn main() {
//!     let subject = SingleValueSubject::<u32>::new();
//!
//!     // Nothing runs until the chain is started.
//!     let greeting = subject.clone().map(|id| format!("user #{id}"));
//!
//!     deferred(move || {
//!         let subject = subject.clone();
//!         async move { subject.send(7) }
//!     })
//!     .run();
//!
//!     assert_eq!(greeting.start().await.unwrap(), "user #7");
//! }
//! ```
//!
//! ## Modules
//!
//! - [`work`]: The unit-of-work trait and its combinators
//! - [`sync`]: Single-value subjects
//! - [`sequence`]: Sequence adapters and operators

mod error;
mod run;
mod state;
mod utils;

pub mod sequence;
pub mod sync;
pub mod work;

pub use error::{SharedError, SubjectError, TimeoutError};
pub use run::Runner;
pub use sequence::{EventHooks, SequenceExt};
pub use state::ResultState;
pub use sync::SingleValueSubject;
pub use work::{DeferredTask, UnitOfWork, deferred};
