//! Resolution of the runtime data directory and file names.

use std::path::{Path, PathBuf};

/// Environment variable overriding the data directory.
pub const DATA_DIR_ENV: &str = "bk_data_dir";

/// Environment variable overriding the input file name.
pub const INPUT_FILE_ENV: &str = "bk_data_input";

/// Environment variable overriding the output file name.
pub const OUTPUT_FILE_ENV: &str = "bk_data_output";

/// Default input file name.
pub const DEFAULT_INPUT_FILE: &str = "input.json";

/// Default output file name.
pub const DEFAULT_OUTPUT_FILE: &str = "output.json";

/// Fixed name of the secrets/identity file inside the data directory.
pub const SECRETS_FILE: &str = ".sdk.json";

/// Locations the runtime reads from and writes to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuntimePaths {
    /// Directory holding input, output and secrets files
    pub data_dir: PathBuf,

    /// Input file name, relative to `data_dir`
    pub input_file: String,

    /// Output file name, relative to `data_dir`
    pub output_file: String,
}

impl RuntimePaths {
    /// Resolve paths from the process environment.
    ///
    /// Never fails: unset or blank variables fall back to the current
    /// directory, `input.json` and `output.json`.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Resolve paths through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_blank = |key: &str| {
            lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
        };

        let data_dir = non_blank(DATA_DIR_ENV).map(PathBuf::from).unwrap_or_else(|| {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        });

        Self {
            data_dir,
            input_file: non_blank(INPUT_FILE_ENV).unwrap_or_else(|| DEFAULT_INPUT_FILE.to_string()),
            output_file: non_blank(OUTPUT_FILE_ENV)
                .unwrap_or_else(|| DEFAULT_OUTPUT_FILE.to_string()),
        }
    }

    /// Paths rooted at `data_dir` with default file names.
    pub fn in_dir(data_dir: impl AsRef<Path>) -> Self {
        Self {
            data_dir: data_dir.as_ref().to_path_buf(),
            input_file: DEFAULT_INPUT_FILE.to_string(),
            output_file: DEFAULT_OUTPUT_FILE.to_string(),
        }
    }

    pub fn input_path(&self) -> PathBuf {
        self.data_dir.join(&self.input_file)
    }

    pub fn output_path(&self) -> PathBuf {
        self.data_dir.join(&self.output_file)
    }

    pub fn secrets_path(&self) -> PathBuf {
        self.data_dir.join(SECRETS_FILE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| ((*k).to_string(), (*v).to_string())).collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults_when_unset() {
        let paths = RuntimePaths::from_lookup(lookup(&[]));
        assert_eq!(paths.input_file, "input.json");
        assert_eq!(paths.output_file, "output.json");
        assert_eq!(paths.data_dir, std::env::current_dir().unwrap());
    }

    #[test]
    fn test_overrides_are_trimmed() {
        let paths = RuntimePaths::from_lookup(lookup(&[
            (DATA_DIR_ENV, " /data/ws "),
            (INPUT_FILE_ENV, "in.json"),
            (OUTPUT_FILE_ENV, "  out.json\n"),
        ]));
        assert_eq!(paths.data_dir, PathBuf::from("/data/ws"));
        assert_eq!(paths.input_path(), PathBuf::from("/data/ws/in.json"));
        assert_eq!(paths.output_path(), PathBuf::from("/data/ws/out.json"));
        assert_eq!(paths.secrets_path(), PathBuf::from("/data/ws/.sdk.json"));
    }

    #[test]
    fn test_blank_values_fall_back() {
        let paths = RuntimePaths::from_lookup(lookup(&[(INPUT_FILE_ENV, "   ")]));
        assert_eq!(paths.input_file, DEFAULT_INPUT_FILE);
    }

    #[test]
    #[serial]
    fn test_from_env_reads_process_environment() {
        std::env::set_var(DATA_DIR_ENV, "/tmp/atom-data");
        std::env::set_var(OUTPUT_FILE_ENV, "result.json");
        let paths = RuntimePaths::from_env();
        std::env::remove_var(DATA_DIR_ENV);
        std::env::remove_var(OUTPUT_FILE_ENV);

        assert_eq!(paths.data_dir, PathBuf::from("/tmp/atom-data"));
        assert_eq!(paths.output_file, "result.json");
        assert_eq!(paths.input_file, DEFAULT_INPUT_FILE);
    }
}
