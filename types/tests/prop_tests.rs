use proptest::prelude::*;

use e2totp_types::{TimeStep, Timestamp};

proptest! {
    /// The step never exceeds the elapsed seconds and brackets `now`.
    #[test]
    fn time_step_brackets_now(epoch in 0u64..1_000_000, elapsed in 0u64..10_000_000_000, step in 1u64..86_400) {
        let now = epoch + elapsed;
        let t = TimeStep::at(Timestamp::new(epoch), Timestamp::new(now), step).unwrap();
        prop_assert!(t.value() * step <= elapsed);
        prop_assert!(elapsed < (t.value() + 1) * step);
    }

    /// Timestamps within the same step share a TimeStep.
    #[test]
    fn same_window_same_step(base in 0u64..1_000_000, offset in 0u64..60) {
        let start = base * 60;
        let a = TimeStep::at(Timestamp::EPOCH, Timestamp::new(start), 60).unwrap();
        let b = TimeStep::at(Timestamp::EPOCH, Timestamp::new(start + offset), 60).unwrap();
        prop_assert_eq!(a, b);
    }

    /// Any `now` before the epoch is rejected.
    #[test]
    fn before_epoch_rejected(epoch in 1u64..u64::MAX, back in 1u64..1_000) {
        let now = epoch.saturating_sub(back);
        prop_assume!(now < epoch);
        prop_assert!(TimeStep::at(Timestamp::new(epoch), Timestamp::new(now), 30).is_none());
    }
}
