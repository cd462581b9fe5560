//! End-to-end tests for the ti-core binary.

use arrow::array::{Array, Int64Array, StringArray};
use assert_cmd::Command;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use predicates::prelude::*;
use std::fs::File;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use ti_common::{ColumnSchema, StreamId, TableName};
use ti_config::{CatalogBundle, StreamDef};
use ti_wire::{WireEncoder, WireType, RECORD_TAG};

struct Fixture {
    dir: TempDir,
    catalog: PathBuf,
}

impl Fixture {
    fn new() -> Self {
        let dir = tempfile::tempdir().unwrap();
        let bundle = CatalogBundle::new(vec![StreamDef {
            stream: StreamId::new("host.cpu"),
            table: Some(TableName::parse("cpu").unwrap()),
            columns: ColumnSchema::from_pairs([
                ("host", "string"),
                ("cores", "uint32"),
                ("load", "double"),
                ("bytes", "uint64"),
                ("at", "timestamp"),
            ]),
        }])
        .unwrap();
        let catalog = dir.path().join("catalog.json");
        std::fs::write(&catalog, bundle.to_json().unwrap()).unwrap();
        Fixture { dir, catalog }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.dir.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ti-core").unwrap();
        cmd.env_remove("TI_CONFIG")
            .env_remove("TI_CATALOG")
            .env_remove("TI_OUTPUT_DIR")
            .env_remove("RUST_LOG")
            .env("XDG_CONFIG_HOME", self.dir.path());
        cmd
    }

    fn write_rows(&self, name: &str, lines: &[&str]) -> PathBuf {
        let path = self.path(name);
        std::fs::write(&path, lines.join("\n")).unwrap();
        path
    }

    fn encode(&self, rows: &Path, output: &Path) {
        self.cmd()
            .args(["encode", "--stream", "host.cpu", "--catalog"])
            .arg(&self.catalog)
            .arg("--rows")
            .arg(rows)
            .arg("--output")
            .arg(output)
            .assert()
            .success();
    }
}

#[test]
fn types_lists_registry() {
    let fx = Fixture::new();
    fx.cmd()
        .arg("types")
        .assert()
        .success()
        .stdout(predicate::str::contains("timestamp"))
        .stdout(predicate::str::contains("DATETIME(6)"))
        .stdout(predicate::str::contains("sfixed64"));
}

#[test]
fn schema_prints_layout_and_ddl() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["schema", "--stream", "host.cpu", "--catalog"])
        .arg(&fx.catalog)
        .assert()
        .success()
        .stdout(predicate::str::contains("CREATE TABLE IF NOT EXISTS `cpu`"))
        .stdout(predicate::str::contains("`bytes` BIGINT NOT NULL"));
}

#[test]
fn schema_json_output() {
    let fx = Fixture::new();
    let output = fx
        .cmd()
        .args(["schema", "--json", "--stream", "host.cpu", "--catalog"])
        .arg(&fx.catalog)
        .output()
        .unwrap();
    assert!(output.status.success());
    let json: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(json["layout"]["table"], "cpu");
    assert_eq!(json["layout"]["columns"][4]["wire"], "length_delimited");
}

#[test]
fn encode_then_ingest_jsonl() {
    let fx = Fixture::new();
    let rows = fx.write_rows(
        "rows.jsonl",
        &[
            r#"["db1", 8, 0.75, 1024, "2024-01-02T03:04:05.5Z"]"#,
            r#"["", 0, 0, 0, null]"#,
        ],
    );
    let buf = fx.path("buf.bin");
    fx.encode(&rows, &buf);

    let output = fx
        .cmd()
        .args(["ingest", "--stream", "host.cpu", "--format", "jsonl", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .output()
        .unwrap();
    assert!(output.status.success());

    let stdout = String::from_utf8(output.stdout).unwrap();
    let lines: Vec<serde_json::Value> = stdout
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["_table"], "cpu");
    assert_eq!(lines[0]["host"], "db1");
    assert_eq!(lines[0]["cores"], 8);
    assert_eq!(lines[0]["at"], "2024-01-02T03:04:05.500Z");
    assert_eq!(lines[1]["host"], "");
    assert_eq!(lines[1]["at"], "1970-01-01T00:00:00Z");
}

#[test]
fn ingest_reads_stdin() {
    let fx = Fixture::new();
    let rows = fx.write_rows("rows.jsonl", &[r#"["a", 1, 1.0, 1, 1]"#]);
    let buf = fx.path("buf.bin");
    fx.encode(&rows, &buf);

    fx.cmd()
        .args(["ingest", "--stream", "host.cpu", "--input", "-", "--format", "json", "--catalog"])
        .arg(&fx.catalog)
        .write_stdin(std::fs::read(&buf).unwrap())
        .assert()
        .success()
        .stdout(predicate::str::contains("\"host\": \"a\""));
}

#[test]
fn ingest_to_parquet() {
    let fx = Fixture::new();
    let rows = fx.write_rows(
        "rows.jsonl",
        &[
            r#"["db1", 8, 0.75, 18446744073709551615, 10]"#,
            r#"["db2", 4, 0.5, 2, 20]"#,
        ],
    );
    let buf = fx.path("buf.bin");
    fx.encode(&rows, &buf);
    let out_dir = fx.path("out");

    let output = fx
        .cmd()
        .args(["ingest", "--stream", "host.cpu", "--format", "parquet", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .arg("--out-dir")
        .arg(&out_dir)
        .output()
        .unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["summary"]["records"], 2);
    let file = report["files"][0].as_str().unwrap();
    assert!(Path::new(file).starts_with(out_dir.join("cpu")));

    let reader = ParquetRecordBatchReaderBuilder::try_new(File::open(file).unwrap())
        .unwrap()
        .build()
        .unwrap();
    let batches: Vec<_> = reader.collect::<Result<Vec<_>, _>>().unwrap();
    let batch = &batches[0];
    assert_eq!(batch.num_rows(), 2);
    let hosts = batch.column(0).as_any().downcast_ref::<StringArray>().unwrap();
    assert_eq!(hosts.value(1), "db2");
    let cores = batch.column(1).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(cores.value(0), 8);
    let bytes = batch.column(3).as_any().downcast_ref::<Int64Array>().unwrap();
    assert_eq!(bytes.value(0), -1);
}

#[test]
fn malformed_input_exits_with_decode_error() {
    let fx = Fixture::new();
    let buf = fx.path("bad.bin");
    // Record key followed by a length running past the end.
    std::fs::write(&buf, [0x0au8, 0x05, 0x01]).unwrap();
    fx.cmd()
        .args(["ingest", "--stream", "host.cpu", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .assert()
        .code(11)
        .stderr(predicate::str::contains("error [20]"));
}

#[test]
fn failed_json_ingest_without_rows_prints_nothing() {
    let fx = Fixture::new();
    let buf = fx.path("bad.bin");
    std::fs::write(&buf, [0x0au8, 0x05, 0x01]).unwrap();
    fx.cmd()
        .args(["ingest", "--stream", "host.cpu", "--format", "json", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .assert()
        .code(11)
        .stdout(predicate::str::is_empty());
}

#[test]
fn failure_after_committed_rows_is_partial() {
    let fx = Fixture::new();
    let mut enc = WireEncoder::new();
    let mut good = WireEncoder::new();
    good.field_str(1, "db1");
    let mut bad = WireEncoder::new();
    bad.field_varint(6, 1);
    for rec in [good.as_bytes(), bad.as_bytes()] {
        enc.encode_key(WireType::LengthDelimited, RECORD_TAG);
        enc.encode_bytes(rec);
    }
    let buf = fx.path("partial.bin");
    std::fs::write(&buf, enc.as_bytes()).unwrap();

    fx.cmd()
        .args(["ingest", "--stream", "host.cpu", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .assert()
        .code(3)
        .stdout(predicate::str::contains("db1"))
        .stderr(predicate::str::contains("1 rows committed"));
}

#[test]
fn unknown_stream_exits_with_schema_error() {
    let fx = Fixture::new();
    let buf = fx.path("empty.bin");
    std::fs::write(&buf, b"").unwrap();
    fx.cmd()
        .args(["ingest", "--stream", "host.disk", "--catalog"])
        .arg(&fx.catalog)
        .arg("--input")
        .arg(&buf)
        .assert()
        .code(12)
        .stderr(predicate::str::contains("unknown stream"));
}

#[test]
fn missing_catalog_exits_with_config_error() {
    let fx = Fixture::new();
    fx.cmd()
        .args(["schema", "--stream", "host.cpu"])
        .assert()
        .code(10);
}

#[test]
fn catalog_from_env_and_config_file() {
    let fx = Fixture::new();
    fx.cmd()
        .env("TI_CATALOG", &fx.catalog)
        .args(["schema", "--stream", "host.cpu"])
        .assert()
        .success();

    let config = fx.path("ti.toml");
    std::fs::write(
        &config,
        format!("[catalog]\npath = {:?}\n", fx.catalog.display().to_string()),
    )
    .unwrap();
    fx.cmd()
        .arg("--config")
        .arg(&config)
        .args(["schema", "--stream", "host.cpu"])
        .assert()
        .success();
}

#[test]
fn encode_rejects_bad_rows() {
    let fx = Fixture::new();
    let rows = fx.write_rows("rows.jsonl", &[r#"["db1", -1, 0, 0, null]"#]);
    fx.cmd()
        .args(["encode", "--stream", "host.cpu", "--catalog"])
        .arg(&fx.catalog)
        .arg("--rows")
        .arg(&rows)
        .arg("--output")
        .arg(fx.path("out.bin"))
        .assert()
        .code(14)
        .stderr(predicate::str::contains("cores"));
}
