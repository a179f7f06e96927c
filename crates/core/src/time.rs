use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};

/// Length of a freshly created attendance session.
#[must_use]
pub fn default_session_length() -> Duration {
    Duration::hours(1)
}

/// Wall-clock source for services; fixed in tests so created sessions are predictable.
#[derive(Debug, Clone, Copy, Default)]
pub enum Clock {
    #[default]
    System,
    Fixed(DateTime<Utc>),
}

impl Clock {
    #[must_use]
    pub fn system() -> Self {
        Self::System
    }

    #[must_use]
    pub fn fixed(at: DateTime<Utc>) -> Self {
        Self::Fixed(at)
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        match self {
            Clock::System => Utc::now(),
            Clock::Fixed(t) => *t,
        }
    }

    /// Calendar date (UTC) according to the clock.
    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.now().date_naive()
    }

    /// Start/end pair for a session created right now.
    #[must_use]
    pub fn session_window(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        let starts_at = self.now();
        (starts_at, starts_at + default_session_length())
    }

    /// If this is a fixed clock, advance it by the given duration.
    ///
    /// Has no effect on `Clock::System`.
    pub fn advance(&mut self, delta: Duration) {
        if let Clock::Fixed(t) = self {
            *t += delta;
        }
    }
}

/// Deterministic timestamp for tests: 2024-03-01T08:00:00Z, a school-day morning.
///
/// # Panics
///
/// Panics if the fixed timestamp cannot be represented.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0)
        .single()
        .expect("fixed timestamp should be valid")
}

#[must_use]
pub fn fixed_clock() -> Clock {
    Clock::fixed(fixed_now())
}
