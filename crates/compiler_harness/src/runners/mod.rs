//! Interop runners.
//!
//! One file per fixture in `interop/`, each registering a function named after the fixture with
//! [register_runner!].  A runner gets an [crate::assertions::Assertions] and the live instance; see [add] for the
//! shape of one.
mod add;
mod identity;
