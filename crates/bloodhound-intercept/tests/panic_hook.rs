//! Exercises the real process panic hook.
//!
//! The hook is process-wide, so everything lives in one test.

use std::sync::Arc;
use std::thread;

use bloodhound_core::{HostAction, ProcessHost, RecordingHost, RecoveryPolicy};
use bloodhound_intercept::{FaultInterceptor, InterceptError, PanicHookGuard};
use bloodhound_observe::{CollectingObserver, EventObserver, FaultOrigin, ReportAssembler};

fn explode() {
    panic!("index out of range");
}

#[test]
fn test_panic_hook_lifecycle() {
    let host = Arc::new(RecordingHost::new());
    let observer = Arc::new(CollectingObserver::default());
    let interceptor = Arc::new(
        FaultInterceptor::new(ReportAssembler::new("panic_hook").unwrap())
            .with_observer(Some(Arc::clone(&observer) as Arc<dyn EventObserver>))
            .with_policy(RecoveryPolicy::Terminate)
            .with_host(Arc::clone(&host) as Arc<dyn ProcessHost>)
            .with_exit_code(3)
            .with_primary_context(Some("main".to_string())),
    );

    let guard = PanicHookGuard::install(Arc::clone(&interceptor)).unwrap();
    assert!(PanicHookGuard::is_installed());
    assert!(matches!(
        PanicHookGuard::install(Arc::clone(&interceptor)),
        Err(InterceptError::HookAlreadyInstalled)
    ));

    // Two panicking threads; only the first produces a report.
    for name in ["worker-1", "worker-2"] {
        let result = thread::Builder::new()
            .name(name.to_string())
            .spawn(explode)
            .unwrap()
            .join();
        assert!(result.is_err());
    }

    let reports = observer.reports();
    assert_eq!(reports.len(), 1);
    let report = &reports[0];
    assert_eq!(report.origin, FaultOrigin::Panic);
    assert_eq!(report.faulting_task_name, "worker-1");
    assert_eq!(report.primary_context_name, "main");
    assert_eq!(report.fault_kind, "panic");
    assert!(report.raw_text.contains("index out of range"));
    assert_eq!(host.actions(), vec![HostAction::Terminate(3)]);

    let stats = interceptor.stats();
    assert_eq!(stats.faults_received, 2);
    assert_eq!(stats.faults_suppressed, 1);

    guard.uninstall();
    assert!(!PanicHookGuard::is_installed());

    // After uninstalling, panics no longer reach the interceptor.
    interceptor.reset();
    let result = thread::spawn(explode).join();
    assert!(result.is_err());
    assert!(!interceptor.has_fired());
    assert_eq!(observer.len(), 1);
}
