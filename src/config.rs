// Construction-time configuration: every resource bound and startup
// tunable named by the embeddable API is collected here rather than
// consulted from scattered constants, so an embedder gets one place to
// tune the interpreter and the core never reaches for a process-wide
// default.

use crate::error::ForthError;
use crate::internals::messages::DebugLevel;
use ::clap::{arg, Command};

pub const VERSION: &str = "0.1.0";

pub const DEFAULT_DICT_SIZE: usize = 64 * 1024;
pub const DEFAULT_DS_SIZE: usize = 1024;
pub const DEFAULT_RS_SIZE: usize = 1024;
pub const DEFAULT_STREAM_DEPTH: usize = 32;
pub const DEFAULT_BASE: u32 = 10;

/// Options accepted by [`crate::runtime::Interpreter::new`]. Mirrors the
/// `{ dict_size, ds_size, rs_size, base, traces, quiet }` shape named in
/// the embeddable API.
#[derive(Debug, Clone)]
pub struct Config {
    pub dict_size: usize,
    pub ds_size: usize,
    pub rs_size: usize,
    pub stream_depth: usize,
    pub base: u32,
    pub traces: bool,
    pub quiet: bool,
    pub debug_level: DebugLevel,
    pub core_file: Option<String>,
    pub loaded_file: Option<String>,
}

impl Default for Config {
    fn default() -> Config {
        Config {
            dict_size: DEFAULT_DICT_SIZE,
            ds_size: DEFAULT_DS_SIZE,
            rs_size: DEFAULT_RS_SIZE,
            stream_depth: DEFAULT_STREAM_DEPTH,
            base: DEFAULT_BASE,
            traces: false,
            quiet: false,
            debug_level: DebugLevel::Warning,
            core_file: None,
            loaded_file: None,
        }
    }
}

impl Config {
    pub fn new() -> Config {
        Config::default()
    }

    /// Validates that every capacity is usable and `base` is in range,
    /// returning a `Config` error rather than letting construction panic
    /// on a bad value.
    pub fn validate(&self) -> Result<(), ForthError> {
        if self.dict_size == 0 {
            return Err(ForthError::Config {
                field: "dict_size".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        if self.ds_size == 0 {
            return Err(ForthError::Config {
                field: "ds_size".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        if self.rs_size == 0 {
            return Err(ForthError::Config {
                field: "rs_size".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        if self.stream_depth == 0 {
            return Err(ForthError::Config {
                field: "stream_depth".to_string(),
                reason: "must be non-zero".to_string(),
            });
        }
        if !(2..=36).contains(&self.base) {
            return Err(ForthError::Config {
                field: "base".to_string(),
                reason: "must be in 2..=36".to_string(),
            });
        }
        Ok(())
    }

    /// Parses the standalone front-end's command-line arguments into a
    /// `Config`. Option parsing itself is out of scope for the core; this
    /// exists only to drive `main.rs`.
    pub fn process_args(&mut self) -> &Config {
        let arguments = Command::new("simforth")
            .version(VERSION)
            .author("Tim Barnes")
            .about("A threaded-code Forth interpreter core")
            .arg(
                arg!(--debuglevel <VALUE>)
                    .required(false)
                    .value_parser(["error", "warning", "info", "debug"]),
            )
            .arg(arg!(-l --library <VALUE>).required(false))
            .arg(arg!(-f --file <VALUE>).required(false))
            .arg(arg!(-n --nocore).required(false))
            .arg(arg!(-q --quiet).required(false))
            .arg(arg!(-t --traces).required(false))
            .get_matches();

        if let Some(level) = arguments.get_one::<String>("debuglevel") {
            self.debug_level = match level.as_str() {
                "debug" => DebugLevel::Debug,
                "info" => DebugLevel::Info,
                "warning" => DebugLevel::Warning,
                _ => DebugLevel::Error,
            };
        }
        if let Some(lib) = arguments.get_one::<String>("library") {
            self.core_file = Some(lib.clone());
        }
        if arguments.get_flag("nocore") {
            self.core_file = None;
        }
        if let Some(file) = arguments.get_one::<String>("file") {
            self.loaded_file = Some(file.clone());
        }
        if arguments.get_flag("quiet") {
            self.quiet = true;
        }
        if arguments.get_flag("traces") {
            self.traces = true;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_validates() {
        assert!(Config::default().validate().is_ok());
    }

    #[test]
    fn test_zero_dict_size_rejected() {
        let mut cfg = Config::default();
        cfg.dict_size = 0;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn test_out_of_range_base_rejected() {
        let mut cfg = Config::default();
        cfg.base = 37;
        assert!(cfg.validate().is_err());
    }
}
