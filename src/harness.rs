//! Runs the built subject over every sample and reports a verdict per sample.
//!
//! Subjects run one at a time and are waited on without a timeout: a subject
//! that never exits stalls the whole run.

use crate::oracle::Expected;
use crate::suite::{Suite, MISSING_SAMPLE};
use crate::VERBOSE;
use anyhow::{Context, Result};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Stdio};
use std::sync::atomic::Ordering;
use walkdir::WalkDir;

/// The compiled program under test.
#[derive(Clone, Debug)]
pub struct Subject {
    binary: PathBuf,
    workdir: PathBuf,
}

#[derive(Clone, Debug)]
pub struct CmdOutput {
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

impl Subject {
    pub fn new(binary: PathBuf, workdir: PathBuf) -> Self {
        Self { binary, workdir }
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn workdir(&self) -> &Path {
        &self.workdir
    }

    /// Runs the subject with `sample` as its only argument. The exit status
    /// is recorded but never judged.
    pub fn run(&self, sample: &Path) -> Result<CmdOutput> {
        // The child resolves a relative program path after entering workdir.
        let program = std::path::absolute(&self.binary)
            .with_context(|| format!("resolving {:?}", self.binary))?;
        let output = Command::new(program)
            .arg(sample)
            .current_dir(&self.workdir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .with_context(|| format!("spawning {:?}", self.binary))?;
        Ok(CmdOutput {
            status: output.status,
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Verdict {
    Passed,
    Failed,
}

/// Trimmed oracle answer next to the trimmed subject output.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Comparison {
    pub expected: String,
    pub actual: String,
    pub stderr: String,
}

impl Comparison {
    pub fn new(expected: &Expected, output: &CmdOutput) -> Self {
        Self {
            expected: expected.text().trim().to_string(),
            actual: output.stdout.trim().to_string(),
            stderr: output.stderr.trim().to_string(),
        }
    }

    pub fn verdict(&self) -> Verdict {
        if self.expected == self.actual {
            Verdict::Passed
        } else {
            Verdict::Failed
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Tally {
    pub passed: usize,
    pub total: usize,
}

pub struct Harness {
    subject: Subject,
    suite: Suite,
    data_dir: PathBuf,
    filter: Option<String>,
}

impl Harness {
    pub fn new(subject: Subject, suite: Suite, data_dir: PathBuf, filter: Option<String>) -> Self {
        Self {
            subject,
            suite,
            data_dir,
            filter,
        }
    }

    /// Sample paths as handed to the subject: relative to the working
    /// directory when possible, ordered by file name.
    pub fn samples(&self) -> Result<Vec<PathBuf>> {
        let workdir = self.subject.workdir();
        let root = workdir.join(&self.data_dir);
        let mut samples = Vec::new();
        for entry in WalkDir::new(&root)
            .min_depth(1)
            .max_depth(1)
            .sort_by_file_name()
        {
            let entry = entry.with_context(|| format!("listing {}", root.display()))?;
            if entry.file_type().is_dir() {
                continue;
            }
            let path = entry.path();
            let shown = path.strip_prefix(workdir).unwrap_or(path);
            samples.push(shown.to_path_buf());
        }
        Ok(samples)
    }

    /// The subject runs even when the oracle cannot answer, so every sample
    /// gets exactly one process result.
    pub fn check(&self, sample: &Path) -> Result<Comparison> {
        let expected = self.suite.oracle.expected(self.subject.workdir(), sample);
        let output = self.subject.run(sample)?;
        if VERBOSE.load(Ordering::Relaxed) {
            println!(
                "[CMD ] {:?} {:?} -> status {:?}, stdout {}B, stderr {}B",
                self.subject.binary(),
                sample,
                output.status.code(),
                output.stdout.len(),
                output.stderr.len()
            );
        }
        Ok(Comparison::new(&expected?, &output))
    }

    /// Checks every sample, then the missing-file probe when the suite asks
    /// for it. Mismatches and per-sample errors are only reported.
    pub fn run(&self, out: &mut impl Write) -> Result<Tally> {
        let mut cases = self.samples()?;
        if self.suite.probe_missing {
            cases.push(PathBuf::from(MISSING_SAMPLE));
        }

        let mut tally = Tally::default();
        for sample in cases {
            if let Some(f) = &self.filter {
                if !sample.to_string_lossy().contains(f.as_str()) {
                    continue;
                }
            }
            if VERBOSE.load(Ordering::Relaxed) {
                println!("[RUN ] {}", sample.display());
            }
            tally.total += 1;
            let result = self.check(&sample);
            if self.report(out, &sample, &result)? == Verdict::Passed {
                tally.passed += 1;
            }
        }
        Ok(tally)
    }

    pub fn report(
        &self,
        out: &mut impl Write,
        sample: &Path,
        result: &Result<Comparison>,
    ) -> Result<Verdict> {
        let comparison = match result {
            Ok(comparison) => comparison,
            Err(e) => {
                writeln!(out, "FAILED {}", sample.display())?;
                writeln!(out, "    Error: {e:#}")?;
                return Ok(Verdict::Failed);
            }
        };
        let verdict = comparison.verdict();
        match verdict {
            Verdict::Passed => writeln!(out, "PASSED {}", sample.display())?,
            Verdict::Failed => {
                writeln!(out, "FAILED {}", sample.display())?;
                writeln!(out, "    Correct is '{}'", comparison.expected)?;
                writeln!(out, "    {} '{}'", self.suite.output_label, comparison.actual)?;
                if self.suite.show_stderr && !comparison.stderr.is_empty() {
                    writeln!(out, "    Standard Error is:\n")?;
                    writeln!(out, "{}", comparison.stderr)?;
                }
            }
        }
        Ok(verdict)
    }
}
