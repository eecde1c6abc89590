//! CLI integration tests.

use std::io::Write;

use alloy_primitives::{Address, B256};
use assert_cmd::cargo::cargo_bin_cmd;
use assert_cmd::Command;
use lendflow::application::hooks::Hook;
use lendflow::domain::{order_hash, AppData, Instruction, LendingAction, LendingOp};
use lendflow::testkit::scenario::{Scenario, MANAGER};
use predicates::prelude::*;
use tempfile::NamedTempFile;

fn lendflow() -> Command {
    cargo_bin_cmd!("lendflow")
}

fn temp_file(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

const CONFIG: &str = r#"
chain_id = 1

[deployment]
router = "0x00000000000000000000000000000000000f0001"
order_manager = "0x00000000000000000000000000000000000f0002"
hooks_trampoline = "0x00000000000000000000000000000000000f0003"
settlement = "0x9008d19f58aabd9ed0d60971565aa8510560ab41"
"#;

#[test]
fn test_help() {
    lendflow()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("lendflow"))
        .stdout(predicate::str::contains("check-config"))
        .stdout(predicate::str::contains("order-hash"))
        .stdout(predicate::str::contains("plan"));
}

#[test]
fn test_check_config_valid() {
    let file = temp_file(CONFIG);

    lendflow()
        .arg("check-config")
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains("Configuration file is valid"))
        .stdout(predicate::str::contains("1800"));
}

#[test]
fn test_check_config_invalid_exits_nonzero() {
    let file = temp_file(&CONFIG.replace(
        "0x00000000000000000000000000000000000f0003",
        "0x00000000000000000000000000000000000f0001",
    ));

    lendflow()
        .arg("check-config")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("hooks_trampoline"));
}

#[test]
fn test_order_hash() {
    let user = Address::repeat_byte(0xaa);
    let salt = B256::repeat_byte(0x01);

    lendflow()
        .args(["order-hash", "--user"])
        .arg(user.to_string())
        .arg("--salt")
        .arg(salt.to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains(order_hash(user, salt).to_string()));
}

#[test]
fn test_trigger_encode_matches_library() {
    let params = Scenario::ltv_params(2_500, 2_202, 50, 3);
    let file = temp_file(&serde_json::to_string(&params).unwrap());

    lendflow()
        .args(["trigger", "encode"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(params.encode().to_string()));
}

#[test]
fn test_trigger_decode_prints_fields() {
    let params = Scenario::ltv_params(2_500, 2_202, 50, 3);

    lendflow()
        .args(["--json", "trigger", "decode"])
        .arg(params.encode().to_string())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"type\":\"trigger_params\""))
        .stdout(predicate::str::contains("\"targetLtvBps\":2202"));
}

#[test]
fn test_trigger_decode_rejects_garbage() {
    lendflow()
        .args(["trigger", "decode", "0xdeadbeef"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("trigger failed"));
}

#[test]
fn test_app_data_hash_matches_library() {
    let hook = Hook::pre_hook(MANAGER, Address::repeat_byte(0xaa), B256::ZERO, 500_000);
    let app_data = AppData::new("lendflow").with_pre_hook(hook.target, hook.call_data, 500_000);
    let file = temp_file(&serde_json::to_string(&app_data).unwrap());

    lendflow()
        .args(["app-data", "hash"])
        .arg(file.path())
        .assert()
        .success()
        .stdout(predicate::str::contains(app_data.hash().unwrap().to_string()));
}

#[test]
fn test_plan_shows_slots() {
    let user = Address::repeat_byte(0xaa);
    let token = Address::repeat_byte(0x01);
    let list = vec![
        Instruction::approve(0, "venue"),
        Instruction::protocol(
            "venue",
            LendingOp::from_input(LendingAction::Repay, token, user, 0),
        ),
        Instruction::PushToken {
            input: 2,
            recipient: user,
        },
    ];
    let file = temp_file(&serde_json::to_string(&list).unwrap());

    lendflow()
        .arg("plan")
        .arg(file.path())
        .args(["--seeds", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("consumes 0"))
        .stdout(predicate::str::contains("Layout is valid"));
}

#[test]
fn test_plan_rejects_forward_reference() {
    let list = vec![Instruction::PushToken {
        input: 0,
        recipient: Address::repeat_byte(0xaa),
    }];
    let file = temp_file(&serde_json::to_string(&list).unwrap());

    lendflow()
        .arg("plan")
        .arg(file.path())
        .assert()
        .failure()
        .stderr(predicate::str::contains("reads output 0"));
}
