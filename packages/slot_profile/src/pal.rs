//! Platform abstraction layer for the clock used to time spans.
//!
//! This module provides a platform abstraction that allows switching between
//! the real monotonic clock and a fake clock for testing purposes.

mod abstractions;
mod facade;
#[cfg(test)]
mod fake;
mod real;

pub(crate) use abstractions::Platform;
pub(crate) use facade::PlatformFacade;
#[cfg(test)]
pub(crate) use fake::FakePlatform;
pub(crate) use real::RealPlatform;
