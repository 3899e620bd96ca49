//! Time left before a run's deadline.

use std::time::{Duration, Instant};

use anyhow::{Result, anyhow};

/// Time left until `deadline`, handed to the reasoner as its request timeout.
///
/// Fails once the deadline has passed so the loop stops before sending
/// another request.
pub fn remaining_budget(deadline: Instant) -> Result<Duration> {
    let remaining = deadline
        .checked_duration_since(Instant::now())
        .unwrap_or(Duration::from_secs(0));
    if remaining.is_zero() {
        return Err(anyhow!("run deadline exceeded"));
    }
    Ok(remaining)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn past_deadline_is_an_error() {
        let err = remaining_budget(Instant::now()).expect_err("deadline passed");
        assert!(err.to_string().contains("deadline exceeded"));
    }

    #[test]
    fn future_deadline_leaves_budget() {
        let remaining =
            remaining_budget(Instant::now() + Duration::from_secs(60)).expect("budget left");
        assert!(remaining > Duration::from_secs(30));
    }
}
