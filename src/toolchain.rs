use crate::harness::Subject;
use crate::suite::Suite;
use crate::VERBOSE;
use anyhow::{bail, Context, Result};
use std::path::{Path, PathBuf};
use std::process::Command;
use std::sync::atomic::Ordering;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Platform {
    Posix,
    Windows,
}

impl Platform {
    pub fn host() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Posix
        }
    }
}

/// One compiler invocation producing the subject binary.
#[derive(Clone, Debug)]
pub struct Toolchain {
    pub program: String,
    pub args: Vec<String>,
    /// Artifact location, relative to the working directory.
    pub binary: PathBuf,
}

impl Toolchain {
    pub fn for_suite(suite: &Suite, platform: Platform) -> Self {
        let sources = suite.sources.iter().map(|s| s.to_string());
        match platform {
            Platform::Posix => {
                let mut args = vec!["-g".to_string()];
                if suite.sanitize {
                    args.push("-fsanitize=address".into());
                }
                args.push("-Wno-nullability-completeness".into());
                args.extend(["-o".to_string(), suite.posix_binary.to_string()]);
                args.extend(sources);
                Self {
                    program: "clang".into(),
                    args,
                    binary: PathBuf::from(suite.posix_binary),
                }
            }
            Platform::Windows => {
                let mut args = vec!["-Zi".to_string(), "-W3".to_string()];
                if suite.sanitize {
                    args.push("-fsanitize=address".into());
                }
                args.extend(suite.cl_defines.iter().map(|d| format!("-D{d}")));
                args.extend(sources);
                // cl.exe names the executable after the first source file.
                let stem = suite
                    .sources
                    .first()
                    .and_then(|s| Path::new(s).file_stem())
                    .and_then(|s| s.to_str())
                    .unwrap_or(suite.posix_binary);
                Self {
                    program: "cl.exe".into(),
                    args,
                    binary: PathBuf::from(format!("{stem}.exe")),
                }
            }
        }
    }

    /// Compiles inside `workdir`. Any failure here aborts the whole run.
    pub fn build(&self, workdir: &Path) -> Result<Subject> {
        let compiler = which::which(&self.program)
            .with_context(|| format!("compiler {} not found", self.program))?;
        if VERBOSE.load(Ordering::Relaxed) {
            println!("[build] {} {}", compiler.display(), self.args.join(" "));
        }
        let mut cmd = Command::new(compiler);
        cmd.current_dir(workdir).args(&self.args);
        run_status(cmd)?;

        let binary = workdir.join(&self.binary);
        ensure_executable(&binary)?;
        Ok(Subject::new(binary, workdir.to_path_buf()))
    }
}

#[cfg(unix)]
fn ensure_executable(binary: &Path) -> Result<()> {
    use nix::unistd::{access, AccessFlags};
    access(binary, AccessFlags::X_OK)
        .with_context(|| format!("{} is not an executable", binary.display()))
}

#[cfg(not(unix))]
fn ensure_executable(binary: &Path) -> Result<()> {
    if !binary.is_file() {
        bail!("{} was not produced", binary.display());
    }
    Ok(())
}

fn run_status(mut cmd: Command) -> Result<()> {
    let status = cmd
        .status()
        .with_context(|| format!("spawning {:?}", cmd.get_program()))?;
    if !status.success() {
        bail!("command failed ({status}): {:?}", cmd);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::suite::Lab;

    #[test]
    fn posix_strsplit_links_both_sources_with_asan() {
        let tc = Toolchain::for_suite(&Lab::Strsplit.suite(), Platform::Posix);
        assert_eq!(tc.program, "clang");
        assert_eq!(
            tc.args,
            [
                "-g",
                "-fsanitize=address",
                "-Wno-nullability-completeness",
                "-o",
                "mystringtest",
                "mystringtest.c",
                "mystring.c"
            ]
        );
        assert_eq!(tc.binary, PathBuf::from("mystringtest"));
    }

    #[test]
    fn posix_wc_outputs_mywc() {
        let tc = Toolchain::for_suite(&Lab::Wc.suite(), Platform::Posix);
        assert_eq!(
            tc.args,
            ["-g", "-Wno-nullability-completeness", "-o", "mywc", "wc.c"]
        );
        assert_eq!(tc.binary, PathBuf::from("mywc"));
    }

    #[test]
    fn windows_binary_follows_first_source() {
        let tc = Toolchain::for_suite(&Lab::Longest.suite(), Platform::Windows);
        assert_eq!(tc.program, "cl.exe");
        assert_eq!(tc.args, ["-Zi", "-W3", "longest.c"]);
        assert_eq!(tc.binary, PathBuf::from("longest.exe"));

        let tc = Toolchain::for_suite(&Lab::Strsplit.suite(), Platform::Windows);
        assert_eq!(
            tc.args,
            [
                "-Zi",
                "-W3",
                "-fsanitize=address",
                "-D_CRT_SECURE_NO_WARNINGS",
                "mystringtest.c",
                "mystring.c"
            ]
        );
        assert_eq!(tc.binary, PathBuf::from("mystringtest.exe"));
    }

    #[test]
    fn cl_defines_do_not_depend_on_sanitizer() {
        let mut suite = Lab::Wc.suite();
        suite.cl_defines = &["LAB_DEBUG"];
        let tc = Toolchain::for_suite(&suite, Platform::Windows);
        assert_eq!(tc.args, ["-Zi", "-W3", "-DLAB_DEBUG", "wc.c"]);

        let mut suite = Lab::Strsplit.suite();
        suite.cl_defines = &[];
        let tc = Toolchain::for_suite(&suite, Platform::Windows);
        assert_eq!(
            tc.args,
            ["-Zi", "-W3", "-fsanitize=address", "mystringtest.c", "mystring.c"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn relative_workdir_subject_runs_from_there() {
        let dir = tempfile::TempDir::new_in(".").unwrap();
        let tc = Toolchain {
            program: "sh".into(),
            args: vec![
                "-c".into(),
                "printf '#!/bin/sh\\necho built\\n' > out && chmod +x out".into(),
            ],
            binary: PathBuf::from("out"),
        };
        let subject = tc.build(dir.path()).unwrap();
        let output = subject.run(Path::new("whatever")).unwrap();
        assert_eq!(output.stdout, "built\n");
    }

    #[test]
    fn missing_compiler_fails_the_build() {
        let dir = tempfile::TempDir::new().unwrap();
        let tc = Toolchain {
            program: "no-such-compiler-on-this-path".into(),
            args: vec![],
            binary: PathBuf::from("out"),
        };
        assert!(tc.build(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn nonzero_status_fails_the_build() {
        let dir = tempfile::TempDir::new().unwrap();
        let tc = Toolchain {
            program: "sh".into(),
            args: vec!["-c".into(), "exit 3".into()],
            binary: PathBuf::from("out"),
        };
        let err = tc.build(dir.path()).unwrap_err();
        assert!(format!("{err:#}").contains("command failed"));
    }

    #[cfg(unix)]
    #[test]
    fn non_executable_artifact_fails_the_build() {
        let dir = tempfile::TempDir::new().unwrap();
        let tc = Toolchain {
            program: "sh".into(),
            args: vec!["-c".into(), "echo data > out".into()],
            binary: PathBuf::from("out"),
        };
        assert!(tc.build(dir.path()).is_err());
    }

    #[cfg(unix)]
    #[test]
    fn successful_build_yields_subject_in_workdir() {
        let dir = tempfile::TempDir::new().unwrap();
        let tc = Toolchain {
            program: "sh".into(),
            args: vec![
                "-c".into(),
                "printf '#!/bin/sh\\n' > out && chmod +x out".into(),
            ],
            binary: PathBuf::from("out"),
        };
        let subject = tc.build(dir.path()).unwrap();
        assert_eq!(subject.binary(), dir.path().join("out"));
    }
}
