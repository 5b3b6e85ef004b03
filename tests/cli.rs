mod util;

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use predicates::prelude::*;
use serde_json::Value;
use std::process::Command;

use ortotrack::core::DocxPackage;
use util::{docx_fixture, main_part};

/// Binary run inside `dir`, isolated from any config in the environment
fn ortk(dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("ortk").expect("ortk binary");
    cmd.current_dir(dir).env_remove("RUST_LOG").env_remove("ORTOTRACK__REVISION__AUTHOR");
    cmd
}

fn stdout_json(output: &std::process::Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("valid json")
}

#[test]
fn analyze_json_lists_candidates() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más", "El  software llegó."]);
    let output = ortk(tmp.path()).args(["analyze", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());

    let v = stdout_json(&output);
    assert_eq!(v["total"], 3);
    assert_eq!(v["counts"]["typography"], 2);
    assert_eq!(v["counts"]["foreign_word"], 1);
    assert_eq!(v["candidates"][0]["original_span"], "25 %");
}

#[test]
fn analyze_category_filter() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más", "El  software llegó."]);
    let output = ortk(tmp.path())
        .args(["analyze", "--json", "--category", "foreign-word"])
        .arg(&path)
        .output()
        .unwrap();
    let v = stdout_json(&output);
    assert_eq!(v["total"], 1);
    assert_eq!(v["candidates"][0]["category"], "foreign_word");
}

#[test]
fn analyze_table_output() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    ortk(tmp.path())
        .args(["--no-color", "analyze"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Ortotipografía"))
        .stdout(predicate::str::contains("#0"));
}

#[test]
fn session_then_apply_selected_ids() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más", "Llegó el Lunes."]);
    let session = tmp.child("sesion.json");

    ortk(tmp.path())
        .args(["--quiet", "analyze", "--session"])
        .arg(session.path())
        .arg(&path)
        .assert()
        .success();
    session.assert(predicate::str::contains("\"fingerprint\""));

    let out = tmp.path().join("salida.docx");
    let output = ortk(tmp.path())
        .args(["apply", "--json", "--approve", "1", "--author", "Editora", "--session"])
        .arg(session.path())
        .arg("-o")
        .arg(&out)
        .arg(&path)
        .output()
        .unwrap();
    assert!(output.status.success(), "{}", String::from_utf8_lossy(&output.stderr));
    let v = stdout_json(&output);
    assert_eq!(v["report"]["corrections_applied"], serde_json::json!([1]));

    let xml = main_part(&out);
    assert!(xml.contains("w:author=\"Editora\""));
    let texts: Vec<String> =
        DocxPackage::open(&out).unwrap().paragraphs().iter().map(|p| p.text()).collect();
    assert_eq!(texts, ["Cuesta 25 % más", "Llegó el lunes."]);
}

#[test]
fn apply_rejects_stale_session() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    let session = tmp.child("sesion.json");
    ortk(tmp.path()).args(["--quiet", "analyze", "--session"]).arg(session.path()).arg(&path).assert().success();

    util::write_docx(&path, &util::document_xml(&util::paragraph("Otro texto 25 % más")));
    ortk(tmp.path())
        .args(["apply", "--all", "--session"])
        .arg(session.path())
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("different version"));
}

#[test]
fn apply_default_output_names() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    ortk(tmp.path()).args(["--quiet", "apply", "--all"]).arg(&path).assert().success();
    tmp.child("doc_tc.docx").assert(predicate::path::exists());

    ortk(tmp.path()).args(["--quiet", "apply", "--all", "--untracked"]).arg(&path).assert().success();
    tmp.child("doc_corregido.docx").assert(predicate::path::exists());
    let xml = main_part(&tmp.path().join("doc_corregido.docx"));
    assert!(!xml.contains("<w:ins"));
}

#[test]
fn apply_unknown_id_fails_without_output() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    ortk(tmp.path())
        .args(["apply", "--approve", "0,42"])
        .arg(&path)
        .assert()
        .failure()
        .stderr(predicate::str::contains("unknown candidate ids: 42"));
    tmp.child("doc_tc.docx").assert(predicate::path::missing());
}

#[test]
fn dry_run_writes_nothing() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    ortk(tmp.path())
        .args(["--dry-run", "--no-color", "apply", "--all"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("DRY RUN"));
    tmp.child("doc_tc.docx").assert(predicate::path::missing());
}

#[test]
fn preview_shows_split() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    let output = ortk(tmp.path()).args(["preview", "--all", "--json"]).arg(&path).output().unwrap();
    assert!(output.status.success());
    let v = stdout_json(&output);
    let first = &v["paragraphs"][0];
    assert_eq!(first["prefix"], "Cuesta 25");
    assert_eq!(first["deleted"], " ");
    assert_eq!(first["inserted"], "\u{a0}");
    assert_eq!(first["suffix"], "% más");
}

#[test]
fn clean_accepts_revisions() {
    let (tmp, path) = util::docx_with_body(
        "<w:p><w:r><w:t xml:space=\"preserve\">Texto </w:t></w:r>\
         <w:ins w:id=\"1\" w:author=\"A\"><w:r><w:t>nuevo</w:t></w:r></w:ins></w:p>",
    );
    ortk(tmp.path())
        .args(["--no-color", "clean"])
        .arg(&path)
        .assert()
        .success()
        .stdout(predicate::str::contains("Accepted 1 revisions"));
    let cleaned = tmp.path().join("doc_limpio.docx");
    assert!(!main_part(&cleaned).contains("<w:ins"));
}

#[test]
fn config_author_is_used() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    tmp.child("ortotrack.toml").write_str("[revision]\nauthor = \"Desde config\"\n").unwrap();
    ortk(tmp.path()).args(["--quiet", "apply", "--all"]).arg(&path).assert().success();
    assert!(main_part(&tmp.path().join("doc_tc.docx")).contains("w:author=\"Desde config\""));
}

#[test]
fn init_writes_config_once() {
    let tmp = assert_fs::TempDir::new().unwrap();
    ortk(tmp.path()).args(["init"]).assert().success();
    tmp.child("ortotrack.toml").assert(predicate::str::contains("[revision]"));

    ortk(tmp.path())
        .args(["init"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("--force"));
    ortk(tmp.path()).args(["init", "--force"]).assert().success();
}

#[test]
fn completions_to_stdout() {
    let tmp = assert_fs::TempDir::new().unwrap();
    ortk(tmp.path())
        .args(["completions", "bash", "--stdout"])
        .assert()
        .success()
        .stdout(predicate::str::contains("ortk"));
}

#[test]
fn open_failure_names_the_file() {
    let tmp = assert_fs::TempDir::new().unwrap();
    tmp.child("roto.docx").write_str("no es un zip").unwrap();
    ortk(tmp.path())
        .args(["analyze", "roto.docx"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("roto.docx"));
}

#[test]
fn env_color_keeps_leading_zeros() {
    let (tmp, path) = docx_fixture(&["Cuesta 25 % más"]);
    ortk(tmp.path())
        .env("ORTOTRACK__REVISION__INSERT_COLOR", "000000")
        .args(["--quiet", "apply", "--all"])
        .arg(&path)
        .assert()
        .success();
    assert!(main_part(&tmp.path().join("doc_tc.docx")).contains("<w:color w:val=\"000000\"/>"));
}
