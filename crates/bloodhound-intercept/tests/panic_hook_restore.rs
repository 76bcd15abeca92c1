//! A guard dropped during unwinding must not wedge hook ownership.
//!
//! The hook is process-wide, so everything lives in one test.

use std::sync::Arc;
use std::thread;

use bloodhound_core::{ProcessHost, RecordingHost, RecoveryPolicy};
use bloodhound_intercept::{FaultInterceptor, PanicHookGuard};
use bloodhound_observe::ReportAssembler;

fn explode() {
    panic!("configuration missing");
}

fn interceptor(host: &Arc<RecordingHost>) -> Arc<FaultInterceptor> {
    Arc::new(
        FaultInterceptor::new(ReportAssembler::new("hook_restore").unwrap())
            .with_policy(RecoveryPolicy::Terminate)
            .with_host(Arc::clone(host) as Arc<dyn ProcessHost>),
    )
}

#[test]
fn test_guard_dropped_while_panicking_releases_ownership() {
    let host = Arc::new(RecordingHost::new());
    let first = interceptor(&host);

    // The guard is dropped by the unwind its own panic started.
    let hooked = Arc::clone(&first);
    let result = thread::spawn(move || {
        let _guard = PanicHookGuard::install(hooked).unwrap();
        explode();
    })
    .join();
    assert!(result.is_err());
    assert!(first.has_fired());
    assert!(!PanicHookGuard::is_installed());

    // A new guard can take over and sees panics.
    let second = interceptor(&host);
    let guard = PanicHookGuard::install(Arc::clone(&second)).unwrap();
    let result = thread::spawn(explode).join();
    assert!(result.is_err());
    assert!(second.has_fired());
    assert_eq!(first.stats().faults_received, 1);

    // Uninstalling restores the original hook, not the stale one.
    guard.uninstall();
    assert!(!PanicHookGuard::is_installed());
    let result = thread::spawn(explode).join();
    assert!(result.is_err());
    assert_eq!(first.stats().faults_received, 1);
    assert_eq!(second.stats().faults_received, 1);
    assert_eq!(host.terminations(), 2);
}
