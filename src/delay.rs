//! Wait planning between attempts: exponential backoff, server `Retry-After`
//! overrides and full jitter.

use std::time::Duration;

use chrono::{DateTime, NaiveDateTime, Utc};
use rand::Rng;

// 2^16 keeps `base * 2^n` far away from overflow for any sane base delay.
const MAX_BACKOFF_EXPONENT: u32 = 16;

/// Parsed `Retry-After` header value.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RetryAfter {
    /// `delay-seconds` form.
    Delay(Duration),
    /// `HTTP-date` form.
    At(DateTime<Utc>),
}

impl RetryAfter {
    /// Parses a raw header value. Unparseable values yield `None` and are
    /// treated as if the header were absent.
    pub fn parse(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }

        if let Ok(seconds) = trimmed.parse::<u64>() {
            return Some(Self::Delay(Duration::from_secs(seconds)));
        }

        parse_http_date(trimmed).map(Self::At)
    }

    /// Wait requested by the server relative to `now`. A date that is not
    /// strictly in the future yields `None`.
    pub fn resolve(&self, now: DateTime<Utc>) -> Option<Duration> {
        match self {
            Self::Delay(delay) => Some(*delay),
            Self::At(at) => (*at - now).to_std().ok().filter(|delay| !delay.is_zero()),
        }
    }
}

// IMF-fixdate first, then the two obsolete forms HTTP/1.1 still accepts.
fn parse_http_date(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc2822(value) {
        return Some(parsed.with_timezone(&Utc));
    }
    ["%A, %d-%b-%y %H:%M:%S GMT", "%a %b %e %H:%M:%S %Y"]
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

/// Computes the wait before the next attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DelayPlanner {
    base: Duration,
}

impl DelayPlanner {
    pub fn new(base: Duration) -> Self {
        Self { base }
    }

    /// `base * 2^(attempt - 1)`, where `attempt` is the 1-based attempt that
    /// just failed.
    pub fn backoff(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(MAX_BACKOFF_EXPONENT);
        self.base.saturating_mul(1u32 << exp)
    }

    /// Upper bound of the next wait before jitter: the server hint when it
    /// resolves to a positive duration, the exponential backoff otherwise.
    pub fn ceiling(&self, attempt: u32, retry_after: Option<&str>, now: DateTime<Utc>) -> Duration {
        retry_after
            .and_then(RetryAfter::parse)
            .and_then(|hint| hint.resolve(now))
            .unwrap_or_else(|| self.backoff(attempt))
    }

    /// Jittered wait. Transport failures pass `None` for `retry_after` and go
    /// through the same jitter as server-directed retries.
    pub fn next_delay<R: Rng + ?Sized>(
        &self,
        attempt: u32,
        retry_after: Option<&str>,
        now: DateTime<Utc>,
        rng: &mut R,
    ) -> Duration {
        full_jitter(self.ceiling(attempt, retry_after, now), rng)
    }
}

/// Uniform sample from `[0, ceiling]`.
pub fn full_jitter<R: Rng + ?Sized>(ceiling: Duration, rng: &mut R) -> Duration {
    let factor: f64 = rng.gen_range(0.0..=1.0);
    Duration::try_from_secs_f64(ceiling.as_secs_f64() * factor)
        .map_or(ceiling, |delay| delay.min(ceiling))
}
