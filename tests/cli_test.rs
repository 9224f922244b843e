use std::fs;
use std::net::TcpListener;
use std::process::{Command, Output};

use anyhow::Result;
use tempfile::TempDir;

fn ggedit(args: &[&str]) -> Result<Output> {
    Ok(Command::new(env!("CARGO_BIN_EXE_ggedit"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()?)
}

/// A base URL nobody is listening on.
fn dead_server() -> Result<String> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = listener.local_addr()?;
    drop(listener);
    Ok(format!("http://{}", addr))
}

#[test]
fn help_lists_the_modes() -> Result<()> {
    let out = ggedit(&["--help"])?;
    assert!(out.status.success());
    let text = String::from_utf8_lossy(&out.stdout);
    for flag in ["--run", "--save", "--show", "--replot", "--image", "--file"] {
        assert!(text.contains(flag), "missing {} in help:\n{}", flag, text);
    }
    Ok(())
}

#[test]
fn run_needs_a_script() -> Result<()> {
    let out = ggedit(&["--run"])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("needs a SCRIPT"));
    Ok(())
}

#[test]
fn empty_code_is_rejected_locally() -> Result<()> {
    let dir = TempDir::new()?;
    let script = dir.path().join("empty.R");
    fs::write(&script, "   \n")?;
    let server = dead_server()?;
    let out = ggedit(&["--run", script.to_str().unwrap(), "--server", &server])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("Cannot execute empty code"));
    Ok(())
}

#[test]
fn unreachable_server_is_reported_as_a_failure() -> Result<()> {
    let dir = TempDir::new()?;
    let script = dir.path().join("plot.R");
    let data = dir.path().join("d.csv");
    fs::write(&script, "ggplot(read.csv('d'), aes(x, y)) + geom_point()\n")?;
    fs::write(&data, "x,y\n1,2\n")?;
    let server = dead_server()?;
    let file_arg = format!("d={}", data.display());

    let out = ggedit(&["--run", script.to_str().unwrap(), "--file", &file_arg, "--server", &server])?;
    assert_eq!(out.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&out.stderr).contains("request failed"));
    Ok(())
}

#[test]
fn show_rejects_garbage_ids() -> Result<()> {
    let out = ggedit(&["--show", "../../etc", "--server", "http://127.0.0.1:9"])?;
    assert!(!out.status.success());
    assert!(String::from_utf8_lossy(&out.stderr).contains("neither a plot id"));
    Ok(())
}

#[test]
fn image_requires_an_output_path() -> Result<()> {
    let out = ggedit(&["--image", "abc12", "--format", "png"])?;
    assert_eq!(out.status.code(), Some(2));
    Ok(())
}
