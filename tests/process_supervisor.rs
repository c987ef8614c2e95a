#![cfg(unix)]

mod common;
use crate::common::*;

use std::error::Error;
use std::path::Path;
use std::time::{Duration, Instant};

use devloop::exec::{ChildSupervisor, ProcessSupervisor, TreeScope};

type TestResult = Result<(), Box<dyn Error>>;

/// Whether `pid` is gone (or only a zombie nobody reaped yet).
fn is_gone(pid: i32) -> bool {
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    if kill(Pid::from_raw(pid), None).is_err() {
        return true;
    }
    // Containers without an init process leave orphans as zombies.
    std::fs::read_to_string(format!("/proc/{pid}/stat"))
        .map(|stat| {
            stat.rsplit(')')
                .next()
                .is_some_and(|rest| rest.trim_start().starts_with('Z'))
        })
        .unwrap_or(true)
}

#[tokio::test]
async fn cooperative_child_stops_within_grace_period() -> TestResult {
    init_tracing();

    let mut sup = ChildSupervisor::new(Duration::from_secs(5));
    sup.start(
        &sh_spec("trap 'exit 0' TERM; while true; do sleep 0.1; done"),
        1,
    )
    .await?;
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    with_timeout(sup.stop()).await?;
    assert!(
        started.elapsed() < Duration::from_secs(4),
        "graceful stop took {:?}",
        started.elapsed()
    );
    assert!(sup.pid().is_none());
    Ok(())
}

/// Start a child that ignores SIGTERM and keeps a grandchild; returns the
/// grandchild's pid once it is known.
async fn start_stubborn_tree(
    sup: &mut ChildSupervisor,
    dir: &Path,
) -> Result<i32, Box<dyn Error>> {
    let pid_file = dir.join("grandchild.pid");
    let script = format!(
        "trap '' TERM; sleep 30 & echo $! > '{}'; while true; do sleep 0.1; done",
        pid_file.display()
    );
    sup.start(&sh_spec(&script), 1).await?;

    let grandchild = with_timeout(async {
        loop {
            if let Ok(text) = std::fs::read_to_string(&pid_file) {
                if let Ok(pid) = text.trim().parse() {
                    return pid;
                }
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await;
    Ok(grandchild)
}

async fn wait_until_gone(pid: i32) {
    with_timeout(async {
        while !is_gone(pid) {
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await;
}

#[tokio::test]
async fn stubborn_child_tree_is_killed_after_grace_period() -> TestResult {
    init_tracing();

    for scope in [TreeScope::Group, TreeScope::Descendants] {
        let tmp = tempfile::tempdir()?;
        let grace = Duration::from_millis(300);
        let mut sup = ChildSupervisor::new(grace).with_scope(scope);
        let grandchild = start_stubborn_tree(&mut sup, tmp.path()).await?;

        let started = Instant::now();
        with_timeout(sup.stop()).await?;
        assert!(started.elapsed() >= grace, "{scope:?}: stopped before the grace period");

        wait_until_gone(grandchild).await;
    }
    Ok(())
}

#[tokio::test]
async fn abandoned_stop_still_kills_the_tree() -> TestResult {
    init_tracing();

    for scope in [TreeScope::Group, TreeScope::Descendants] {
        let tmp = tempfile::tempdir()?;
        let mut sup = ChildSupervisor::new(Duration::from_secs(10)).with_scope(scope);
        let grandchild = start_stubborn_tree(&mut sup, tmp.path()).await?;

        // A forced exit drops the stop while it waits out the grace period.
        let abandoned = tokio::time::timeout(Duration::from_millis(300), sup.stop()).await;
        assert!(abandoned.is_err(), "{scope:?}: stop finished inside the grace period");
        drop(sup);

        wait_until_gone(grandchild).await;
    }
    Ok(())
}

#[tokio::test]
async fn interactive_child_shares_our_process_group() -> TestResult {
    use nix::unistd::{Pid, getpgid};

    let ours = getpgid(None)?;

    let mut shared = ChildSupervisor::default().with_scope(TreeScope::Descendants);
    let pid = shared.start(&sh_spec("sleep 30"), 1).await?;
    assert_eq!(getpgid(Some(Pid::from_raw(pid as i32)))?, ours);
    shared.stop().await?;

    let mut grouped = ChildSupervisor::default().with_scope(TreeScope::Group);
    let pid = grouped.start(&sh_spec("sleep 30"), 1).await?;
    assert_eq!(getpgid(Some(Pid::from_raw(pid as i32)))?, Pid::from_raw(pid as i32));
    grouped.stop().await?;
    Ok(())
}

#[tokio::test]
async fn exit_code_and_watch_environment_reach_the_caller() -> TestResult {
    let mut sup = ChildSupervisor::default();
    let spec = sh_spec(r#"test "$DEVLOOP_WATCH" = 1 && test "$EXTRA" = yes && exit "$DEVLOOP_WATCH_ITERATION""#)
        .with_env(vec![("EXTRA".to_string(), "yes".to_string())]);

    sup.start(&spec, 7).await?;
    let code = with_timeout(sup.wait_for_exit()).await?;
    assert_eq!(code, Some(7));

    sup.stop().await?;
    Ok(())
}

#[tokio::test]
async fn wait_for_exit_is_cancel_safe() -> TestResult {
    let mut sup = ChildSupervisor::default();
    sup.start(&sh_spec("sleep 0.3; exit 4"), 1).await?;

    // Losing a race must not disturb the child.
    let early = tokio::time::timeout(Duration::from_millis(50), sup.wait_for_exit()).await;
    assert!(early.is_err());
    assert!(sup.pid().is_some());

    let code = with_timeout(sup.wait_for_exit()).await?;
    assert_eq!(code, Some(4));
    Ok(())
}

#[tokio::test]
async fn restart_replaces_the_child() -> TestResult {
    let mut sup = ChildSupervisor::default();

    let first = sup.start(&sh_spec("sleep 30"), 1).await?;
    sup.stop().await?;
    let second = sup.start(&sh_spec("sleep 30"), 2).await?;

    assert_ne!(first, second);
    assert!(is_gone(first as i32));
    assert_eq!(sup.pid(), Some(second));

    sup.stop().await?;
    Ok(())
}
