//! Shared leaf types for the Sable compiler.
//!
//! This crate holds the types every other compiler crate agrees on:
//! byte-offset source spans and diagnostic severities. It has no
//! compiler logic of its own.

pub mod span;

pub use span::Span;

/// Severity of a reported diagnostic.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Severity {
    /// A defect that makes the program ill-formed.
    Error,
    /// A suspicious construct that does not make the program ill-formed.
    Warning,
}
