// Wed Jan 15 2026 - Alex

use crate::memory::{MemoryError, Protection};
use crate::target::{RawFile, RawRange};
use once_cell::sync::Lazy;
use regex::Regex;

static MAPS_LINE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^([0-9a-f]+)-([0-9a-f]+)\s+([rwxsp-]{4})\s+([0-9a-f]+)\s+\S+\s+(\d+)\s*(.*)$")
        .expect("maps line regex")
});

/// Parses one `/proc/<pid>/maps` line. Pseudo mappings such as `[heap]`
/// and anonymous mappings come back without a file.
pub fn parse_maps_line(line: &str) -> Result<RawRange, MemoryError> {
    let caps = MAPS_LINE
        .captures(line.trim_end())
        .ok_or_else(|| MemoryError::InvalidRange(format!("unparseable maps line '{}'", line)))?;

    let hex = |i: usize| {
        u64::from_str_radix(&caps[i], 16)
            .map_err(|e| MemoryError::InvalidRange(format!("bad number in maps line '{}': {}", line, e)))
    };

    let start = hex(1)?;
    let end = hex(2)?;
    let offset = hex(4)?;
    let inode: u64 = caps[5].parse().unwrap_or(0);
    let path = caps[6].trim();

    if end <= start {
        return Err(MemoryError::InvalidRange(format!("inverted maps line '{}'", line)));
    }

    let protection: Protection = caps[3].parse().map_err(MemoryError::InvalidRange)?;
    let file = (inode != 0 && !path.is_empty() && !path.starts_with('[')).then(|| RawFile {
        path: path.trim_end_matches(" (deleted)").to_string(),
        offset,
    });

    Ok(RawRange {
        base: start,
        size: end - start,
        protection: protection.triple(),
        file,
    })
}

pub fn parse_maps(contents: &str) -> Vec<RawRange> {
    contents
        .lines()
        .filter(|l| !l.trim().is_empty())
        .filter_map(|l| match parse_maps_line(l) {
            Ok(range) => Some(range),
            Err(e) => {
                log::debug!("{}", e);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = "\
55d4c3a00000-55d4c3a01000 r--p 00000000 08:01 1311 /tmp/bins/basic_one
55d4c3a01000-55d4c3a02000 r-xp 00001000 08:01 1311 /tmp/bins/basic_one
55d4c3c01000-55d4c3c02000 rw-p 00001000 08:01 1311 /tmp/bins/basic_one
55d4c4a3e000-55d4c4a5f000 rw-p 00000000 00:00 0 [heap]
7f3e1c000000-7f3e1c028000 r--p 00000000 08:01 2244 /usr/lib/x86_64-linux-gnu/libc.so.6
7f3e1c028000-7f3e1c1bd000 r-xp 00028000 08:01 2244 /usr/lib/x86_64-linux-gnu/libc.so.6
7f3e1c216000-7f3e1c218000 rw-p 00215000 08:01 2244 /usr/lib/x86_64-linux-gnu/libc.so.6
7f3e1c218000-7f3e1c225000 rw-p 00000000 00:00 0
garbage line
ffffffffff600000-ffffffffff601000 --xp 00000000 00:00 0 [vsyscall]
";

    #[test]
    fn test_parse_sample() {
        let ranges = parse_maps(SAMPLE);
        assert_eq!(ranges.len(), 9);

        assert_eq!(ranges[1].protection, "r-x");
        assert_eq!(ranges[1].file.as_ref().unwrap().offset, 0x1000);
        assert!(ranges[3].file.is_none());
        assert!(ranges[7].file.is_none());
        assert_eq!(ranges[8].protection, "--x");
        assert_eq!(
            ranges[5].file.as_ref().unwrap().path,
            "/usr/lib/x86_64-linux-gnu/libc.so.6"
        );
    }

    #[test]
    fn test_parse_deleted_and_spaces() {
        let r = parse_maps_line("7f00-8f00 rw-s 00000010 00:05 77 /dev/shm/my file (deleted)").unwrap();
        assert_eq!(r.file.unwrap().path, "/dev/shm/my file");
        assert!(parse_maps_line("8f00-7f00 rw-p 00000000 00:00 0").is_err());
    }
}
