use effort_state::{
    guard::{estimate_runtime, DEFAULT_THRESHOLD},
    BalanceGuard, InsufficientFunds, RunEstimate,
};
use effort_types::AccountInfo;
use test_case::test_case;

#[test]
fn default_threshold() {
    assert_eq!(BalanceGuard::default().threshold, 1_000_000);
    assert_eq!(DEFAULT_THRESHOLD, 1_000_000);
}

#[test_case(900_000, 0, false ; "below threshold")]
#[test_case(1_000_000, 0, true ; "at threshold")]
#[test_case(1_100_000, 200_000, false ; "reserve counts against balance")]
#[test_case(50, 100, false ; "reserve above balance")]
#[test_case(5_000_000, 100_000, true ; "well funded")]
fn may_proceed(amount: u64, min_balance: u64, expected: bool) {
    let account = AccountInfo {
        amount,
        min_balance,
        ..Default::default()
    };
    assert_eq!(
        BalanceGuard::default().may_proceed(account.spendable()),
        expected
    );
}

#[test]
fn check_reports_shortfall() {
    let guard = BalanceGuard::new(1_000_000);
    assert_eq!(
        guard.check(900_000),
        Err(InsufficientFunds {
            spendable: 900_000,
            threshold: 1_000_000
        })
    );
    assert_eq!(guard.check(1_000_000), Ok(()));
}

#[test]
fn startup_check_is_strict() {
    let guard = BalanceGuard::new(1_000_000);
    assert_eq!(
        guard.check_exceeds(1_000_000),
        Err(InsufficientFunds {
            spendable: 1_000_000,
            threshold: 1_000_000
        })
    );
    assert_eq!(guard.check_exceeds(1_000_001), Ok(()));
}

#[test_case(1, 2_000, 10_000_000, 83, 20 ; "one per minute")]
#[test_case(60, 1_000, 3_600_000, 1, 0 ; "one per second")]
#[test_case(30, 2_000, 1_000, 0, 0 ; "under a minute")]
fn runtime(tpm: u64, fee: u64, spendable: u64, hours: u64, minutes: u64) {
    assert_eq!(
        estimate_runtime(tpm, fee, spendable),
        Some(RunEstimate { hours, minutes })
    );
}

#[test]
fn runtime_without_spending() {
    assert_eq!(estimate_runtime(0, 2_000, 1_000_000), None);
    assert_eq!(estimate_runtime(10, 0, 1_000_000), None);
}

#[test]
fn runtime_display() {
    let estimate = RunEstimate {
        hours: 3,
        minutes: 7,
    };
    assert_eq!(estimate.to_string(), "3 hours and 7 minutes");
}
