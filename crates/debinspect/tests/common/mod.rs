//! Shared fixtures: a scripted stand-in for dpkg-deb and dpkg.

#![allow(dead_code)]

use async_trait::async_trait;
use debinspect::{CommandRunner, InspectError, Invocation, ProcessOutput};
use indoc::indoc;
use std::collections::HashMap;
use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tempfile::TempDir;

pub const HELLO_CONTENTS: &str = indoc! {"
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/bin/
    -rwxr-xr-x root/root     31136 2016-04-16 00:57 ./usr/bin/hello
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/share/
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/share/doc/
    drwxr-xr-x root/root         0 2016-04-16 00:57 ./usr/share/doc/hello/
    -rw-r--r-- root/root      2264 2014-11-16 17:21 ./usr/share/doc/hello/copyright
    lrwxrwxrwx root/root         0 2016-04-16 00:57 ./usr/bin/hi -> hello
"};

// Built with concat! because each line's leading space is significant
pub const HELLO_INFO: &str = concat!(
    " new Debian package, version 2.0.\n",
    " size 28180 bytes: control archive=1840 bytes.\n",
    "     695 bytes,    13 lines      control              \n",
    "    1656 bytes,    24 lines      md5sums              \n",
    " Package: hello\n",
    " Version: 2.10-1build1\n",
    " Architecture: amd64\n",
    " Maintainer: Ubuntu Developers <ubuntu-devel-discuss@lists.ubuntu.com>\n",
    " Depends: libc6 (>= 2.14)\n",
    " Description: example package based on GNU hello\n",
    "  The GNU hello program produces a familiar, friendly greeting.\n",
);

/// Fake tool runner that answers from canned data and records calls.
pub struct ScriptedRunner {
    pub contents: String,
    pub info: String,
    /// (filename, text, mode) written for `--control`
    pub control_files: Vec<(String, String, u32)>,
    /// (relative path, text) written for `--extract`
    pub extracted_files: Vec<(String, String)>,
    /// Operation flag to fail, with exit code and stderr
    pub failure: Option<(String, i32, String)>,
    calls: Mutex<HashMap<String, usize>>,
    invocations: Mutex<Vec<Invocation>>,
}

impl ScriptedRunner {
    pub fn hello() -> Self {
        Self {
            contents: HELLO_CONTENTS.to_string(),
            info: HELLO_INFO.to_string(),
            control_files: vec![
                (
                    "control".to_string(),
                    "Package: hello\nVersion: 2.10-1build1\n".to_string(),
                    0o644,
                ),
                (
                    "postinst".to_string(),
                    "#!/bin/sh\necho I run after installation\n".to_string(),
                    0o755,
                ),
            ],
            extracted_files: vec![
                ("usr/bin/hello".to_string(), "#!/bin/sh\necho hello\n".to_string()),
                (
                    "usr/share/doc/hello/copyright".to_string(),
                    "GNU General Public License\n".to_string(),
                ),
            ],
            failure: None,
            calls: Mutex::new(HashMap::new()),
            invocations: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(operation: &str, exit_code: i32, stderr: &str) -> Self {
        Self {
            failure: Some((operation.to_string(), exit_code, stderr.to_string())),
            ..Self::hello()
        }
    }

    /// Number of times an operation flag was run.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(operation)
            .copied()
            .unwrap_or(0)
    }

    pub fn invocations(&self) -> Vec<Invocation> {
        self.invocations.lock().unwrap().clone()
    }
}

#[async_trait]
impl CommandRunner for ScriptedRunner {
    async fn run(&self, invocation: &Invocation) -> Result<ProcessOutput, InspectError> {
        let operation = invocation.args[0].to_string_lossy().into_owned();
        *self
            .calls
            .lock()
            .unwrap()
            .entry(operation.clone())
            .or_insert(0) += 1;
        self.invocations.lock().unwrap().push(invocation.clone());

        if let Some((failing, code, stderr)) = &self.failure {
            if *failing == operation {
                return Ok(ProcessOutput::failure(*code, stderr.clone()));
            }
        }

        match operation.as_str() {
            "--contents" => Ok(ProcessOutput::success(self.contents.clone())),
            "--info" => Ok(ProcessOutput::success(self.info.clone())),
            "--control" => {
                let dir = PathBuf::from(&invocation.args[2]);
                fs::create_dir_all(&dir)?;
                for (name, text, mode) in &self.control_files {
                    let path = dir.join(name);
                    fs::write(&path, text)?;
                    fs::set_permissions(&path, fs::Permissions::from_mode(*mode))?;
                }
                Ok(ProcessOutput::success(Vec::new()))
            }
            "--extract" => {
                let dest = PathBuf::from(&invocation.args[2]);
                for (relative, text) in &self.extracted_files {
                    let path = dest.join(relative);
                    if let Some(parent) = path.parent() {
                        fs::create_dir_all(parent)?;
                    }
                    fs::write(&path, text)?;
                }
                Ok(ProcessOutput::success(Vec::new()))
            }
            other => Ok(ProcessOutput::failure(2, format!("unknown option {}", other))),
        }
    }
}

/// Creates a placeholder package file; the scripted runner never reads it.
pub fn package_file(dir: &TempDir) -> PathBuf {
    let path = dir.path().join("hello_2.10-1build1_amd64.deb");
    fs::write(&path, b"!<arch>\n").expect("Failed to write package file");
    path
}

pub fn exists(path: &Path) -> bool {
    fs::symlink_metadata(path).is_ok()
}
