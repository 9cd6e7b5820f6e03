// Wed Jan 15 2026 - Alex

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "memscope")]
#[command(author = "Alex")]
#[command(version = "1.0.0")]
#[command(about = "Inspect the memory of a running process", long_about = None)]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Process to attach to
    #[arg(short, long, global = true)]
    pub pid: Option<i32>,

    /// Engine configuration (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true, default_value = "warn")]
    pub log_level: String,

    #[arg(long, global = true)]
    pub no_color: bool,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print the target's memory map
    Maps,
    /// Read one typed value
    Read(ReadArgs),
    /// Print the program entry point
    Entry,
}

#[derive(Parser, Debug)]
pub struct ReadArgs {
    /// Address, `module:0xOFFSET`, `module:symbol` or `symbol`
    pub key: String,

    #[arg(short = 'a', long = "as", value_enum, default_value = "uint64")]
    pub kind: ReadKind,

    /// Byte count for `--as bytes`
    #[arg(short = 'n', long, default_value = "16")]
    pub len: u64,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadKind {
    Int8,
    Uint8,
    Int16,
    Uint16,
    Int32,
    Uint32,
    Int64,
    Uint64,
    Pointer,
    Float,
    Double,
    Bytes,
    Utf8,
    Utf16,
}

impl Args {
    pub fn validate(&self) -> Result<(), String> {
        match self.pid {
            Some(pid) if pid <= 0 => Err(format!("Invalid pid {}", pid)),
            _ => Ok(()),
        }
    }
}

impl ReadArgs {
    pub fn validate(&self) -> Result<(), String> {
        if self.kind == ReadKind::Bytes && self.len == 0 {
            return Err("--len must be at least 1".to_string());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_read() {
        let args = Args::try_parse_from(["memscope", "--pid", "42", "read", "libc:0x10", "--as", "int32"]).unwrap();
        assert_eq!(args.pid, Some(42));
        match args.command {
            Command::Read(read) => {
                assert_eq!(read.key, "libc:0x10");
                assert_eq!(read.kind, ReadKind::Int32);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_validate() {
        let args = Args::try_parse_from(["memscope", "--pid", "0", "maps"]).unwrap();
        assert!(args.validate().is_err());

        let read = ReadArgs {
            key: "main".to_string(),
            kind: ReadKind::Bytes,
            len: 0,
        };
        assert!(read.validate().is_err());
    }
}
