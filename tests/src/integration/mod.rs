//! # Integration Tests
//!
//! Every component wired exactly as the node runtime wires it, with the
//! HTTP surface driven through the router and the queues drained by hand.

#[cfg(test)]
mod harness;

#[cfg(test)]
mod dead_letter;
#[cfg(test)]
mod invariants;
#[cfg(test)]
mod scenarios;
