//! `Dispatcher::gc` wiring onto `gc::run`. The grace-period/reachability semantics themselves are
//! exercised directly in `src/gc.rs`'s own unit tests; this only checks that the dispatcher passes
//! `GcOptions::collect_delay` through and returns the driver's summary unchanged.

mod common;

use common::{MemoryIo, StubBuildRunner, StubDownloader, StubGit, StubResolver};
use chrono::{Duration, TimeZone, Utc};
use depot_core::collaborators::SilentProgress;
use depot_core::options::GcOptions;
use depot_core::{Depot, Dispatcher};

#[test]
fn an_unreferenced_package_survives_its_first_sweep_and_is_gone_after_the_grace_period() {
    let io = MemoryIo::default();
    let resolver = StubResolver;
    let downloader = StubDownloader;
    let git = StubGit;
    let build_runner = StubBuildRunner::default();
    let progress = SilentProgress;

    let dir = tempfile::tempdir().unwrap();

    let dispatcher = Dispatcher {
        io: &io,
        resolver: &resolver,
        downloader: &downloader,
        git: &git,
        build_runner: &build_runner,
        progress: &progress,
        reserved_names: vec!["core".to_owned()],
        precompile_auto: false,
        precompile_tasks: 4,
        suspended_file: dir.path().join("suspended.toml"),
    };

    let depot = Depot::new(dir.path());
    let pkg_dir = depot.package_dir("Foo", "abcdef0123456789abcdef0123456789abcdef01");
    std::fs::create_dir_all(&pkg_dir).unwrap();
    std::fs::create_dir_all(depot.logs_dir()).unwrap();

    let options = GcOptions { collect_delay: Duration::days(7), verbose: false };
    let t0 = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    let summary = dispatcher.gc(&[depot.clone()], &options, t0).unwrap();
    assert_eq!(summary.packages_deleted, 0);
    assert!(pkg_dir.exists());

    let t1 = t0 + Duration::days(8);
    let summary = dispatcher.gc(&[depot], &options, t1).unwrap();
    assert_eq!(summary.packages_deleted, 1);
    assert!(!pkg_dir.exists());
}
