//! End-to-end tests driving the CLI commands directly (no subprocess), the
//! way the teacher's `snapshot_roundtrip.rs` exercises command structs in
//! process rather than spawning the binary.

use std::io::Write;

use snn_cli::commands::run::RunCommand;
use snn_cli::commands::train::TrainCommand;

fn write(path: &std::path::Path, text: &str) {
    let mut f = std::fs::File::create(path).unwrap();
    f.write_all(text.as_bytes()).unwrap();
}

#[test]
fn run_command_writes_json_with_winner_and_accuracy() {
    let dir = tempfile::tempdir().unwrap();
    let net_path = dir.path().join("xor.net");
    let seq_path = dir.path().join("both.seq");
    let out_path = dir.path().join("out.json");

    write(
        &net_path,
        "NEURON S0 1.0 1.0 0.0\n\
         NEURON O0 1.0 1.0 0.0\n\
         CONNECTION S0 O0 2.0\n",
    );
    write(&seq_path, "LOOP true\n0 S0 1.0\n");

    let cmd = RunCommand {
        net: net_path,
        seq: seq_path,
        target: Some("O0".to_string()),
        warmup: Some(0),
        window: Some(20),
        output: Some(out_path.clone()),
    };
    cmd.execute().unwrap();

    let text = std::fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["details"][0]["winner"], "O0");
    assert_eq!(value["accuracy"], 1.0);
}

#[test]
fn train_command_produces_per_epoch_history() {
    let dir = tempfile::tempdir().unwrap();
    let net_path = dir.path().join("net.net");
    let seq_path = dir.path().join("ep0.seq");
    let manifest_path = dir.path().join("dataset.txt");
    let out_path = dir.path().join("history.json");

    write(
        &net_path,
        "NEURON S0 1.0 1.0 0.0\n\
         NEURON O0 1.0 1.0 0.0\n\
         CONNECTION S0 O0 2.0\n",
    );
    write(&seq_path, "LOOP true\n0 S0 1.0\n");
    write(&manifest_path, "ep0.seq O0\n");

    let cmd = TrainCommand {
        net: net_path,
        dataset: manifest_path,
        epochs: 3,
        seed: 1,
        training_config: None,
        save_net: None,
        output: Some(out_path.clone()),
    };
    cmd.execute().unwrap();

    let text = std::fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["epochs"], 3);
    assert_eq!(value["accuracy"].as_array().unwrap().len(), 3);
    assert_eq!(value["margin"].as_array().unwrap().len(), 3);
}

#[test]
fn train_command_with_empty_dataset_is_a_harmless_no_op() {
    let dir = tempfile::tempdir().unwrap();
    let net_path = dir.path().join("net.net");
    let manifest_path = dir.path().join("dataset.txt");
    let out_path = dir.path().join("history.json");

    write(&net_path, "NEURON O0 1.0 1.0 0.0\n");
    write(&manifest_path, "# nothing here\n");

    let cmd = TrainCommand {
        net: net_path,
        dataset: manifest_path,
        epochs: 2,
        seed: 0,
        training_config: None,
        save_net: None,
        output: Some(out_path.clone()),
    };
    cmd.execute().unwrap();

    let text = std::fs::read_to_string(&out_path).unwrap();
    let value: serde_json::Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value["accuracy"], serde_json::json!([0.0, 0.0]));
}
