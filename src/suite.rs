use crate::oracle::Oracle;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Lab {
    Strsplit,
    Wc,
    Longest,
}

/// Everything that differs between the lab testers.
#[derive(Clone, Debug)]
pub struct Suite {
    pub name: &'static str,
    pub sources: &'static [&'static str],
    /// Output name passed to clang with `-o`.
    pub posix_binary: &'static str,
    pub sanitize: bool,
    /// Preprocessor defines for cl.exe builds.
    pub cl_defines: &'static [&'static str],
    pub oracle: Oracle,
    /// Also run the subject on a path that does not exist.
    pub probe_missing: bool,
    /// Print captured stderr under failed cases.
    pub show_stderr: bool,
    /// Label in front of the subject's output on a failed case.
    pub output_label: &'static str,
}

pub const MISSING_SAMPLE: &str = "file_does_not_exist";

impl Lab {
    pub fn suite(self) -> Suite {
        match self {
            Lab::Strsplit => Suite {
                name: "strsplit",
                sources: &["mystringtest.c", "mystring.c"],
                posix_binary: "mystringtest",
                sanitize: true,
                cl_defines: &["_CRT_SECURE_NO_WARNINGS"],
                oracle: Oracle::Strsplit,
                probe_missing: false,
                show_stderr: true,
                output_label: "Output  is",
            },
            Lab::Wc => Suite {
                name: "wc",
                sources: &["wc.c"],
                posix_binary: "mywc",
                sanitize: false,
                cl_defines: &[],
                oracle: Oracle::Wc,
                probe_missing: true,
                show_stderr: false,
                output_label: "Output    is",
            },
            Lab::Longest => Suite {
                name: "longest",
                sources: &["longest.c"],
                posix_binary: "mylongest",
                sanitize: false,
                cl_defines: &[],
                oracle: Oracle::Longest,
                probe_missing: true,
                show_stderr: false,
                output_label: "Output  is",
            },
        }
    }
}
