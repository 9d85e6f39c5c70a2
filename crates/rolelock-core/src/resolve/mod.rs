//! Version resolution
//!
//! A [`ResolutionPlan`] is built from merged declarations without touching the
//! network; the [`Resolver`] then resolves every entity of the plan
//! concurrently under a shared [`ResolveContext`].

pub mod context;
pub mod plan;
pub mod resolver;

pub use context::{CancelToken, Canceller, ResolveContext, RetryPolicy, cancellation};
pub use plan::ResolutionPlan;
pub use resolver::{Resolution, ResolvedEntry, Resolver, UNRESOLVED};
