//! Portfolio version-control core.
//!
//! A portfolio's content evolves only by creating immutable versions and
//! repointing the portfolio's `current_version_id`:
//!
//! - `generate`  — first version, committed, created by `ai`
//! - `refine`    — AI rewrite, new draft, nothing deleted
//! - `confirm`   — copy latest into a committed version, prune all others
//! - `revert`    — copy an arbitrary prior version, prune all others
//! - `edit`      — field-level manual patch, committed, history preserved
//!
//! Version numbers are strictly increasing per portfolio and never reused:
//! the next number is always max(existing) + 1, and pruning always keeps the
//! highest-numbered version alive. Every mutating transition runs in a single
//! transaction holding a `FOR UPDATE` lock on the portfolio row, so at most
//! one transition per portfolio is in flight at a time.

pub mod handlers;
pub mod merge;
pub mod store;
pub mod transitions;
