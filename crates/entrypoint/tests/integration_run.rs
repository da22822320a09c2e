//! End-to-end test for the run subcommand
//!
//! Drives the real binary against a fake server script that speaks the
//! same log protocol as the managed process: it prints the startup marker,
//! then on SIGTERM prints the termination marker and exits. The test
//! delivers SIGTERM to the entrypoint the way a container runtime would
//! and expects a clean, supervised shutdown.
#![cfg(unix)]

use std::fs;
use std::io::{BufRead, BufReader};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};
use tempfile::TempDir;

const READY_LINE: &str =
    "INFO [main] org.apache.catalina.startup.Catalina.start Server startup in [2162] milliseconds";
const TERMINATED_LINE: &str =
    "INFO [main] org.apache.coyote.AbstractProtocol.destroy Destroying ProtocolHandler [http-nio-8095]";

#[test]
fn test_run_full_lifecycle_with_fake_server() {
    let dir = TempDir::new().unwrap();

    let server_script = dir.path().join("fake-server.sh");
    fs::write(
        &server_script,
        format!(
            "#!/bin/sh\n\
             trap 'echo \"{TERMINATED_LINE}\"; exit 0' TERM\n\
             echo '{READY_LINE}'\n\
             while true; do sleep 0.2; done\n"
        ),
    )
    .unwrap();

    let mut entrypoint = Command::new(env!("CARGO_BIN_EXE_crowd-entrypoint"))
        .arg("run")
        .arg("--install-dir")
        .arg(dir.path())
        .arg("--command")
        .arg(format!("sh {}", server_script.display()))
        .args(["--startup-timeout", "10", "--shutdown-timeout", "10"])
        .env("ATL_TOMCAT_PORT", "9090")
        .stdout(Stdio::piped())
        .spawn()
        .unwrap();

    // The server log is relayed on the entrypoint's stdout; readiness is
    // observable there just as it is in a container's log stream.
    let mut lines = BufReader::new(entrypoint.stdout.take().unwrap()).lines();
    let mut saw_ready = false;
    for line in lines.by_ref() {
        if line.unwrap().contains("Catalina.start Server startup") {
            saw_ready = true;
            break;
        }
    }
    assert!(saw_ready, "startup marker never relayed");

    // By readiness the config files must be in place.
    let server_xml =
        fs::read_to_string(dir.path().join("apache-tomcat/conf/server.xml")).unwrap();
    assert!(server_xml.contains("port=\"9090\""));
    assert!(dir
        .path()
        .join("crowd-webapp/WEB-INF/classes/crowd-init.properties")
        .exists());

    // Shut down the way a container runtime does.
    let kill = Command::new("kill")
        .args(["-TERM", &entrypoint.id().to_string()])
        .status()
        .unwrap();
    assert!(kill.success());

    let mut saw_terminated = false;
    for line in lines {
        if line.unwrap().contains("Destroying ProtocolHandler") {
            saw_terminated = true;
        }
    }
    assert!(saw_terminated, "termination marker never relayed");

    let status = wait_with_deadline(&mut entrypoint, Duration::from_secs(15));
    assert!(status.success(), "entrypoint exited with {status}");
}

fn wait_with_deadline(child: &mut std::process::Child, deadline: Duration) -> std::process::ExitStatus {
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait().unwrap() {
            return status;
        }
        if started.elapsed() > deadline {
            child.kill().ok();
            panic!("entrypoint did not exit within {deadline:?}");
        }
        std::thread::sleep(Duration::from_millis(50));
    }
}
