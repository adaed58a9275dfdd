/// Process-wide suppression of outbound traffic after a remote 429.
///
/// While active, calls are skipped locally rather than sent. The state is a
/// resume timestamp evaluated lazily against the caller's clock; there is no
/// timer that clears it. Already-dispatched requests are not cancelled.
#[derive(Debug, Default)]
pub struct RateLimitState {
  resume_at: Option<i64>,
}

impl RateLimitState {
  pub fn new() -> Self {
    Self { resume_at: None }
  }

  /// True while outbound calls should be skipped.
  pub fn suppressed(&self, now: i64) -> bool {
    matches!(self.resume_at, Some(at) if now < at)
  }

  /// Engage suppression until the given unix timestamp.
  pub fn engage(&mut self, resume_at: i64) {
    self.resume_at = Some(resume_at);
  }

  /// Seconds until outbound traffic resumes, if currently suppressed.
  pub fn resume_in(&self, now: i64) -> Option<i64> {
    self.resume_at.filter(|at| now < *at).map(|at| at - now)
  }
}
