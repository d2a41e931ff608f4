use std::time::Duration;

/// Configures per-attempt timeout and retry behavior.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct RetryOptions {
    /// Per-attempt timeout in milliseconds.
    pub timeout_ms: u64,
    /// Maximum number of attempts, the initial one included.
    pub max_attempts: u32,
    /// Base retry backoff in milliseconds (exponential strategy).
    pub base_delay_ms: u64,
}

impl Default for RetryOptions {
    fn default() -> Self {
        Self {
            timeout_ms: 5_000,
            max_attempts: 4,
            base_delay_ms: 300,
        }
    }
}

impl RetryOptions {
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn with_base_delay_ms(mut self, base_delay_ms: u64) -> Self {
        self.base_delay_ms = base_delay_ms;
        self
    }

    /// Reads options from the environment, falling back to defaults for
    /// unset variables.
    ///
    /// Reads:
    /// - `RESILIENT_HTTP_TIMEOUT_MS`
    /// - `RESILIENT_HTTP_MAX_ATTEMPTS`
    /// - `RESILIENT_HTTP_BASE_DELAY_MS`
    ///
    /// Returns an error if a variable is set but is not a non-negative integer.
    pub fn from_env() -> std::result::Result<Self, String> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`RetryOptions::from_env`], reading variables through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> std::result::Result<Self, String>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            timeout_ms: parse_or(&lookup, "RESILIENT_HTTP_TIMEOUT_MS", defaults.timeout_ms)?,
            max_attempts: parse_or(
                &lookup,
                "RESILIENT_HTTP_MAX_ATTEMPTS",
                defaults.max_attempts,
            )?,
            base_delay_ms: parse_or(
                &lookup,
                "RESILIENT_HTTP_BASE_DELAY_MS",
                defaults.base_delay_ms,
            )?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn base_delay(&self) -> Duration {
        Duration::from_millis(self.base_delay_ms)
    }

    /// Attempt budget actually enforced. The first try always happens, so a
    /// configured zero counts as one.
    pub fn attempt_budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

fn parse_or<T, F>(lookup: &F, name: &str, default: T) -> std::result::Result<T, String>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match lookup(name) {
        Some(raw) if raw.trim().is_empty() => Err(format!("{name} is set but empty")),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| format!("{name} must be a non-negative integer, got '{raw}'")),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::RetryOptions;

    #[test]
    fn defaults_match_documented_values() {
        let opts = RetryOptions::default();
        assert_eq!(opts.timeout_ms, 5_000);
        assert_eq!(opts.max_attempts, 4);
        assert_eq!(opts.base_delay_ms, 300);
    }

    #[test]
    fn zero_attempts_still_allows_first_try() {
        let opts = RetryOptions::default().with_max_attempts(0);
        assert_eq!(opts.attempt_budget(), 1);
    }

    #[test]
    fn lookup_overrides_defaults() {
        let opts = RetryOptions::from_lookup(|name| {
            (name == "RESILIENT_HTTP_MAX_ATTEMPTS").then(|| " 7 ".to_owned())
        })
        .expect("valid values must parse");
        assert_eq!(opts.max_attempts, 7);
        assert_eq!(opts.timeout_ms, 5_000);
        assert_eq!(opts.base_delay_ms, 300);
    }

    #[test]
    fn lookup_rejects_garbage_and_empty_values() {
        let err = RetryOptions::from_lookup(|name| {
            (name == "RESILIENT_HTTP_BASE_DELAY_MS").then(|| "abc".to_owned())
        })
        .expect_err("garbage delay must be rejected");
        assert!(err.contains("RESILIENT_HTTP_BASE_DELAY_MS"));

        let err = RetryOptions::from_lookup(|name| {
            (name == "RESILIENT_HTTP_TIMEOUT_MS").then(String::new)
        })
        .expect_err("empty timeout must be rejected");
        assert!(err.contains("set but empty"));
    }

    #[test]
    fn nothing_set_yields_defaults() {
        let opts = RetryOptions::from_lookup(|_| None).expect("defaults");
        assert_eq!(opts, RetryOptions::default());
    }
}
