mod common;

use std::path::{Path, PathBuf};
use std::time::Duration;

use common::TempDir;
use pdfconv::config::ConverterConfig;
use pdfconv::convert::{ConvertError, Converter, ScratchDir};

fn converter(binary: PathBuf, work_dir: &Path) -> Converter {
    Converter::new(&ConverterConfig {
        binary,
        timeout: Duration::from_secs(5),
        work_dir: work_dir.to_path_buf(),
    })
}

fn input_file(dir: &Path, name: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, b"PK fake docx").unwrap();
    path
}

#[test]
fn output_path_uses_input_stem() {
    let out = Converter::output_path(Path::new("/tmp/in/report.final.docx"), Path::new("/srv/out"));
    assert_eq!(out, PathBuf::from("/srv/out/report.final.pdf"));

    let out = Converter::output_path(Path::new("notes.docx"), Path::new("out"));
    assert_eq!(out, PathBuf::from("out/notes.pdf"));
}

#[tokio::test]
async fn convert_writes_pdf_next_to_input() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let work = TempDir::new("pdfconv-conv-work");
    let conv = converter(common::write_script(bin.path(), "soffice", common::CONVERTER_OK), work.path());

    let input = input_file(work.path(), "report.docx");
    let pdf = conv.convert(&input, work.path()).await.unwrap();

    assert_eq!(pdf, work.path().join("report.pdf"));
    let data = std::fs::read(&pdf).unwrap();
    assert!(data.starts_with(b"%PDF"));
}

#[tokio::test]
async fn version_reports_binary_output() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let conv = converter(
        common::write_script(bin.path(), "soffice", common::CONVERTER_OK),
        bin.path(),
    );

    let version = conv.version().await.unwrap();
    assert!(version.starts_with("LibreOffice"), "version: {version}");
}

#[tokio::test]
async fn missing_binary_is_reported() {
    let work = TempDir::new("pdfconv-conv-work");
    let binary = work.path().join("no-such-soffice");
    let conv = converter(binary.clone(), work.path());

    let input = input_file(work.path(), "report.docx");
    match conv.convert(&input, work.path()).await {
        Err(ConvertError::BinaryNotFound(path)) => assert_eq!(path, binary),
        other => panic!("expected BinaryNotFound, got {other:?}"),
    }
    assert!(matches!(conv.version().await, Err(ConvertError::BinaryNotFound(_))));
}

#[tokio::test]
async fn nonzero_exit_carries_code_and_stderr() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let work = TempDir::new("pdfconv-conv-work");
    let conv = converter(
        common::write_script(bin.path(), "soffice", common::CONVERTER_FAILS),
        work.path(),
    );

    let input = input_file(work.path(), "report.docx");
    match conv.convert(&input, work.path()).await {
        Err(ConvertError::Failed { code, stderr }) => {
            assert_eq!(code, Some(77));
            assert!(stderr.contains("could not be loaded"), "stderr: {stderr}");
        }
        other => panic!("expected Failed, got {other:?}"),
    }
}

#[tokio::test]
async fn clean_exit_without_pdf_is_output_missing() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let work = TempDir::new("pdfconv-conv-work");
    let conv = converter(
        common::write_script(bin.path(), "soffice", common::CONVERTER_NO_OUTPUT),
        work.path(),
    );

    let input = input_file(work.path(), "report.docx");
    match conv.convert(&input, work.path()).await {
        Err(ConvertError::OutputMissing(path)) => {
            assert!(path.ends_with("report.pdf"), "path: {}", path.display());
        }
        other => panic!("expected OutputMissing, got {other:?}"),
    }
}

#[tokio::test]
async fn timeout_kills_slow_converter() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let work = TempDir::new("pdfconv-conv-work");
    let conv = converter(
        common::write_script(bin.path(), "soffice", "#!/bin/sh\nsleep 30\n"),
        work.path(),
    );

    let input = input_file(work.path(), "report.docx");
    let started = std::time::Instant::now();
    let result = tokio::time::timeout(
        Duration::from_millis(300),
        conv.convert(&input, work.path()),
    )
    .await;

    assert!(result.is_err(), "expected the wait to time out");
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn scratch_dir_is_removed_on_drop() {
    let root = TempDir::new("pdfconv-scratch");

    let path = {
        let scratch = ScratchDir::create(root.path(), "job-1").await.unwrap();
        std::fs::write(scratch.path().join("input.docx"), b"data").unwrap();
        std::fs::create_dir(scratch.path().join(".lo-profile")).unwrap();
        assert!(scratch.path().is_absolute());
        scratch.path().to_path_buf()
    };

    assert!(!path.exists());
    assert!(root.path().exists());
}

/// Like `CONVERTER_OK`, and also records the profile argument it was given.
const CONVERTER_RECORDS_PROFILE: &str = r#"#!/bin/sh
outdir=""
input=""
profile=""
while [ $# -gt 0 ]; do
  case "$1" in
    --outdir) outdir="$2"; shift ;;
    --convert-to) shift ;;
    -env:UserInstallation=*) profile="$1" ;;
    -*) ;;
    *) input="$1" ;;
  esac
  shift
done
printf '%s' "$profile" > "$outdir/profile-arg"
name=$(basename "$input")
printf '%%PDF-1.4\n' > "$outdir/${name%.*}.pdf"
"#;

#[tokio::test]
async fn profile_argument_is_a_percent_encoded_file_url() {
    let bin = TempDir::new("pdfconv-conv-bin");
    let work = TempDir::new("pdfconv my work%dir");
    let conv = converter(
        common::write_script(bin.path(), "soffice", CONVERTER_RECORDS_PROFILE),
        work.path(),
    );

    let input = input_file(work.path(), "report.docx");
    let pdf = conv.convert(&input, work.path()).await.unwrap();
    assert!(pdf.exists());

    let arg = std::fs::read_to_string(work.path().join("profile-arg")).unwrap();
    let url = arg.strip_prefix("-env:UserInstallation=").unwrap();
    assert!(url.starts_with("file:///"), "arg: {arg}");
    assert!(url.contains("pdfconv%20my%20work%25dir"), "arg: {arg}");
    assert!(url.trim_end_matches('/').ends_with("/.lo-profile"), "arg: {arg}");
    assert!(!url.contains(' '), "arg: {arg}");
}
