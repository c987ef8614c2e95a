#![allow(dead_code)]

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use devloop::engine::WatchLoop;
use devloop::project::FileSet;
use devloop::types::ProcessSpec;

pub use devloop_test_utils::builders::{ProjectBuilder, file_set, sh_spec, write_file};
pub use devloop_test_utils::fakes::{
    FakeSupervisor, ObserverHandle, RecordingReporter, ScriptedObserver, StaticResolver,
    SupervisorCall, SupervisorProbe,
};
pub use devloop_test_utils::{init_tracing, with_timeout};

pub type FakeLoop = WatchLoop<StaticResolver, ScriptedObserver, FakeSupervisor>;

/// Everything a loop test needs to drive and inspect a fake loop.
pub struct Harness {
    pub watch_loop: FakeLoop,
    pub observer: ObserverHandle,
    pub probe: SupervisorProbe,
    pub reporter: RecordingReporter,
    pub resolver: StaticResolver,
    pub cancel: CancellationToken,
}

pub fn default_set() -> FileSet {
    file_set(&["/p/src/main.rs", "/p/app.devproj"])
}

pub fn fake_spec() -> ProcessSpec {
    ProcessSpec::new("fake-app", "/p", vec!["--serve".to_string()])
}

pub fn harness(resolver: StaticResolver, supervisor: (FakeSupervisor, SupervisorProbe)) -> Harness {
    let (observer, handle) = ScriptedObserver::new();
    let (supervisor, probe) = supervisor;
    let reporter = RecordingReporter::new();
    let cancel = CancellationToken::new();

    let watch_loop = WatchLoop::new(
        resolver.clone(),
        observer,
        supervisor,
        fake_spec(),
        Arc::new(reporter.clone()),
        cancel.clone(),
    );

    Harness {
        watch_loop,
        observer: handle,
        probe,
        reporter,
        resolver,
        cancel,
    }
}
