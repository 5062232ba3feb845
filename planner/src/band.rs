/// A 5-band priority, ordered so `Critical > High > Normal > Low > Background`
/// (§4.6). Mirrors `aperture_dns::Priority`'s band set; kept as a separate type
/// since the two crates' band semantics (DNS urgency vs. fetch scheduling) are
/// conceptually distinct even though the scale is identical.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum PriorityBand {
    /// lowest band
    Background,
    /// demoted/backoff band
    Low,
    /// default band for most resources
    Normal,
    /// bumped band (in-viewport, render-blocking, or user-pinned)
    High,
    /// highest band
    Critical,
}

impl PriorityBand {
    /// One band higher, saturating at `Critical`.
    pub fn bump(self) -> Self {
        match self {
            PriorityBand::Background => PriorityBand::Low,
            PriorityBand::Low => PriorityBand::Normal,
            PriorityBand::Normal => PriorityBand::High,
            PriorityBand::High | PriorityBand::Critical => PriorityBand::Critical,
        }
    }

    /// This band, or `High` if it is currently lower than `High` (§4.6:
    /// "render-blocking (floor at High)").
    pub fn floor_at_high(self) -> Self {
        self.max(PriorityBand::High)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bump_saturates_at_critical() {
        assert_eq!(PriorityBand::Critical.bump(), PriorityBand::Critical);
        assert_eq!(PriorityBand::Normal.bump(), PriorityBand::High);
    }

    #[test]
    fn floor_at_high_leaves_high_and_critical_untouched() {
        assert_eq!(PriorityBand::Low.floor_at_high(), PriorityBand::High);
        assert_eq!(PriorityBand::Critical.floor_at_high(), PriorityBand::Critical);
    }

    #[test]
    fn ordering() {
        assert!(PriorityBand::Critical > PriorityBand::High);
        assert!(PriorityBand::Normal > PriorityBand::Low);
    }
}
