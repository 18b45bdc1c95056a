//! Resend cooldown for one-time passwords

use std::time::Duration;

/// Seconds a user waits before another OTP may be requested
pub const RESEND_COOLDOWN: Duration = Duration::from_secs(60);

/// Countdown driven by one-second ticks from the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OtpResendTimer {
    remaining: Duration,
}

impl Default for OtpResendTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl OtpResendTimer {
    /// Starts a full cooldown; a fresh overlay cannot resend immediately
    pub fn new() -> Self {
        Self {
            remaining: RESEND_COOLDOWN,
        }
    }

    pub fn remaining(&self) -> Duration {
        self.remaining
    }

    pub fn can_resend(&self) -> bool {
        self.remaining.is_zero()
    }

    /// Advances the countdown by `elapsed`, saturating at zero
    pub fn tick(&mut self, elapsed: Duration) {
        self.remaining = self.remaining.saturating_sub(elapsed);
    }

    /// Called after a resend request goes out
    pub fn restart(&mut self) {
        self.remaining = RESEND_COOLDOWN;
    }

    /// Button caption
    pub fn label(&self) -> String {
        if self.can_resend() {
            "Resend OTP".to_string()
        } else {
            format!("Resend in {}s", self.remaining.as_secs())
        }
    }
}
