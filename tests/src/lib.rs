//! End-to-end tests for the auth service, driven through the real router
//! against the in-memory database with a recording mail transport.

#[cfg(test)]
mod support;

#[cfg(test)]
mod auth_flow;

#[cfg(test)]
mod auth_gate;
