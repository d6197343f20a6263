use crate::{DEFAULT_STAGGER, DEFAULT_WORKERS};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// What a writer does when a single insert fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FailurePolicy {
    /// Log the error and carry on with the next iteration.
    #[default]
    Resilient,
    /// Log the error and stop this writer only.
    FailFast,
}

#[derive(Debug, Error)]
#[error("unknown failure policy `{0}` (expected `resilient` or `fail-fast`)")]
pub struct ParsePolicyError(String);

impl FromStr for FailurePolicy {
    type Err = ParsePolicyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "resilient" => Ok(Self::Resilient),
            "fail-fast" | "failfast" => Ok(Self::FailFast),
            other => Err(ParsePolicyError(other.to_string())),
        }
    }
}

impl fmt::Display for FailurePolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Resilient => write!(f, "resilient"),
            Self::FailFast => write!(f, "fail-fast"),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HammerConfig {
    pub workers: usize,
    pub stagger: Duration,
    pub policy: FailurePolicy,
}

impl Default for HammerConfig {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            stagger: DEFAULT_STAGGER,
            policy: FailurePolicy::default(),
        }
    }
}

impl fmt::Display for HammerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "workers={}, stagger={}, on-error={}",
            self.workers,
            humantime::format_duration(self.stagger),
            self.policy
        )
    }
}
