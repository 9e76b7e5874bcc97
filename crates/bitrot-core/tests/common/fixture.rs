//! Test fixture: a scratch directory, a scripted change-time source and a
//! helper that runs a full check and captures its output.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use bitrot_core::check::{run_check_with, CheckOptions, CheckSummary};
use bitrot_core::{ChangeTimeSource, FlaggedPolicy, Hasher};
use tempfile::TempDir;

/// Change times set explicitly per path so tests never depend on real
/// filesystem timestamps. Unknown paths report `default`.
#[derive(Default)]
pub struct ScriptedClock {
    times: Mutex<HashMap<PathBuf, i64>>,
    default: i64,
}

impl ScriptedClock {
    pub fn with_default(default: i64) -> Self {
        Self {
            times: Mutex::new(HashMap::new()),
            default,
        }
    }

    pub fn set(&self, path: &Path, change_time: i64) {
        self.times
            .lock()
            .unwrap()
            .insert(path.to_path_buf(), change_time);
    }
}

impl ChangeTimeSource for ScriptedClock {
    fn change_time(&self, _file: &File, path: &Path) -> io::Result<i64> {
        let times = self.times.lock().unwrap();
        Ok(times.get(path).copied().unwrap_or(self.default))
    }
}

/// Output captured from one run.
pub struct RunOutput {
    pub summary: CheckSummary,
    pub stdout: String,
    pub stderr: String,
}

pub struct Fixture {
    pub dir: TempDir,
    pub hasher: Hasher<ScriptedClock>,
    pub opts: CheckOptions,
}

impl Fixture {
    pub fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let opts = CheckOptions {
            baseline_path: dir.path().join("state").join("sums.csv"),
            chunk_size: 7,
            jobs: 1,
            policy: FlaggedPolicy::Advance,
        };
        Self {
            dir,
            hasher: Hasher::with_clock(7, ScriptedClock::with_default(1000)),
            opts,
        }
    }

    pub fn clock(&self) -> &ScriptedClock {
        self.hasher.clock()
    }

    pub fn write(&self, name: &str, content: &str) -> PathBuf {
        let p = self.dir.path().join(name);
        std::fs::write(&p, content).unwrap();
        p
    }

    pub fn run(&self, paths: &[&Path]) -> RunOutput {
        let mut input = Vec::new();
        for p in paths {
            input.extend_from_slice(p.to_str().unwrap().as_bytes());
            input.push(0);
        }
        let mut stdout = Vec::new();
        let mut stderr = Vec::new();
        let summary =
            run_check_with(&self.opts, &self.hasher, &input[..], &mut stdout, &mut stderr)
                .expect("check run");
        RunOutput {
            summary,
            stdout: String::from_utf8(stdout).unwrap(),
            stderr: String::from_utf8(stderr).unwrap(),
        }
    }
}
