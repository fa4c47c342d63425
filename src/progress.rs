/// Phase names reported through [`Progress::update`]
pub const PHASE_DETECT: &str = "Detecting format";
pub const PHASE_DECODE: &str = "Decoding packets";
pub const PHASE_RESOLVE: &str = "Resolving locations";
pub const PHASE_COMPLETE: &str = "Complete";

/// Receiver of progress notifications
///
/// `percent` is in `0..=100` and never decreases during a parse. Notifications have no effect on
/// the parse result.
pub trait Progress {
    fn update(&mut self, percent: u8, phase: &str);
}

/// Discard all notifications
#[derive(Clone, Copy, Debug, Default)]
pub struct NoProgress;

impl Progress for NoProgress {
    fn update(&mut self, _percent: u8, _phase: &str) {}
}

impl<F> Progress for F
where
    F: FnMut(u8, &str),
{
    fn update(&mut self, percent: u8, phase: &str) {
        self(percent, phase)
    }
}

/// Maps a position in `0..=total` into the percentage range `start..=end`, rate-limited by a
/// minimum step
pub(crate) struct ProgressScale {
    start: u8,
    end: u8,
    step: u8,
    last: Option<u8>,
}

impl ProgressScale {
    pub(crate) fn new(start: u8, end: u8, step: u8) -> ProgressScale {
        ProgressScale {
            start,
            end: end.max(start),
            step: step.max(1),
            last: None,
        }
    }

    /// Returns the percentage to report for `position`, or `None` if it did not move by at least
    /// one step since the last report
    pub(crate) fn advance(&mut self, position: u64, total: u64) -> Option<u8> {
        let span = u64::from(self.end - self.start);
        let fraction = if total == 0 {
            span
        } else {
            (u128::from(position.min(total)) * u128::from(span) / u128::from(total)) as u64
        };
        let percent = self.start + fraction as u8;
        match self.last {
            Some(last) if percent < last.saturating_add(self.step) && percent != self.end => None,
            Some(last) if percent <= last => None,
            _ => {
                self.last = Some(percent);
                Some(percent)
            }
        }
    }
}
