use std::fs;

use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use tempfile::tempdir;

#[test]
fn schema_lists_counter_methods() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["schema", "--pretty"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"name\": \"SimpleContract\""))
        .stdout(predicate::str::contains("\"signature\": \"setCount(uint256)\""))
        .stdout(predicate::str::contains("\"signature\": \"incrementCount()\""))
        .stdout(predicate::str::contains("\"selector\": \"0x"));
}

#[test]
fn count_reads_simulated_chain() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["count", "--simulate", "--initial-count", "5"])
        .assert()
        .success()
        .stdout("5\n");
}

#[test]
fn increment_prints_refreshed_count() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["increment", "--simulate", "--initial-count", "5"])
        .assert()
        .success()
        .stdout("6\n")
        .stderr(predicate::str::contains("Mined in block 1"));
}

#[test]
fn set_writes_new_value() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["set", "42", "--simulate"])
        .assert()
        .success()
        .stdout("42\n");
}

#[test]
fn set_rejects_non_numeric_input() {
    let tmp = tempdir().expect("tempdir");

    for input in ["abc", "0", "-4"] {
        cargo_bin_cmd!("counter-dapp")
            .current_dir(tmp.path())
            .args(["set", "--simulate", "--", input])
            .assert()
            .failure()
            .stdout("")
            .stderr(predicate::str::contains(format!("invalid input '{input}'")));
    }
}

#[test]
fn send_submits_named_method() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["send", "setCount", "7", "--simulate"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("0x").and(predicate::str::ends_with("01\n")));
}

#[test]
fn send_refuses_views_and_bad_arity() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["send", "count", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("is a view method"));

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["send", "setCount", "--simulate"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expects 1 argument(s), got 0"));
}

#[test]
fn watch_stops_after_requested_updates() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args([
            "watch",
            "--simulate",
            "--initial-count",
            "9",
            "--updates",
            "1",
        ])
        .assert()
        .success()
        .stdout("9\n");
}

#[test]
fn config_file_supplies_settings() {
    let tmp = tempdir().expect("tempdir");
    let config = concat!(
        "contract_address = \"0x00000000000000000000000000000000000000aa\"\n",
        "poll_interval_ms = 50\n",
    );
    fs::write(tmp.path().join("counter-dapp.toml"), config).expect("write config");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["count", "--simulate", "--initial-count", "3"])
        .assert()
        .success()
        .stdout("3\n")
        .stderr(predicate::str::contains(
            "0x00000000000000000000000000000000000000aa",
        ));
}

#[test]
fn explicit_config_must_exist() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .args(["count", "--simulate", "--config", "missing.toml"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("config file not found"));
}

#[test]
fn node_mode_needs_a_contract_address() {
    let tmp = tempdir().expect("tempdir");

    cargo_bin_cmd!("counter-dapp")
        .current_dir(tmp.path())
        .arg("count")
        .assert()
        .failure()
        .stderr(predicate::str::contains("contract_address"));
}

#[test]
fn initial_count_requires_simulation() {
    cargo_bin_cmd!("counter-dapp")
        .args(["count", "--initial-count", "2"])
        .assert()
        .failure();
}

#[test]
fn completions_generate_for_bash() {
    cargo_bin_cmd!("counter-dapp")
        .args(["completions", "bash"])
        .assert()
        .success()
        .stdout(predicate::str::contains("counter-dapp"));
}
