use assert_cmd::prelude::*;
use predicates::prelude::*;
use predicates::str::contains;
use std::process::Command;

fn demo() -> Command {
    Command::cargo_bin("taskpool-demo").unwrap()
}

// `taskpool-demo` with no args runs the default batch on worker threads.
#[test]
fn cli_defaults() {
    demo()
        .assert()
        .success()
        .stdout(contains("In thread: pool-worker-").count(10));
}

#[test]
fn cli_version() {
    demo()
        .arg("-V")
        .assert()
        .success()
        .stdout(contains(env!("CARGO_PKG_VERSION")));
}

#[test]
fn cli_runs_every_task() {
    demo()
        .args(["4", "25", "--max-queue", "2"])
        .assert()
        .success()
        .stdout(contains("In thread:").count(25))
        .stderr(contains("Completed 25 of 25 tasks"));
}

// Zero workers run every task on the main thread.
#[test]
fn cli_inline_mode() {
    demo()
        .args(["0", "5"])
        .assert()
        .success()
        .stdout(contains("In thread: main").count(5))
        .stdout(contains("pool-worker").not());
}

#[test]
fn cli_burden_preset() {
    demo()
        .args(["--burden", "default", "-v"])
        .assert()
        .success()
        .stderr(contains("64 workers, queue capacity 256"));
}

#[test]
fn cli_invalid_args() {
    demo().arg("many").assert().failure();
    demo().args(["1", "2", "3"]).assert().failure();
    demo().args(["--burden", "crushing"]).assert().failure();
}
