// Tue Jan 13 2026 - Alex

use bitflags::bitflags;
use std::fmt;
use std::str::FromStr;

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Protection: u8 {
        const READ = 0b001;
        const WRITE = 0b010;
        const EXECUTE = 0b100;
    }
}

impl Protection {
    pub fn from_flags(flags: u32) -> Self {
        Self::from_bits_truncate((flags & 7) as u8)
    }

    pub fn can_read(self) -> bool {
        self.contains(Self::READ)
    }

    pub fn can_write(self) -> bool {
        self.contains(Self::WRITE)
    }

    pub fn can_execute(self) -> bool {
        self.contains(Self::EXECUTE)
    }

    pub fn triple(self) -> String {
        let mut s = String::with_capacity(3);
        s.push(if self.can_read() { 'r' } else { '-' });
        s.push(if self.can_write() { 'w' } else { '-' });
        s.push(if self.can_execute() { 'x' } else { '-' });
        s
    }
}

impl fmt::Display for Protection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.triple())
    }
}

impl FromStr for Protection {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let chars: Vec<char> = s.chars().collect();
        if chars.len() != 3 && chars.len() != 4 {
            return Err(format!("bad protection string '{}'", s));
        }

        let mut prot = Self::empty();
        for (i, (flag, letter)) in [(Self::READ, 'r'), (Self::WRITE, 'w'), (Self::EXECUTE, 'x')]
            .into_iter()
            .enumerate()
        {
            match chars[i] {
                c if c == letter => prot |= flag,
                '-' => {}
                other => return Err(format!("unexpected '{}' in protection string '{}'", other, s)),
            }
        }

        if let Some(&share) = chars.get(3) {
            if !matches!(share, 'p' | 's' | '-') {
                return Err(format!("unexpected sharing flag '{}' in '{}'", share, s));
            }
        }

        Ok(prot)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_protection_triples() {
        assert_eq!(Protection::empty().to_string(), "---");
        assert_eq!((Protection::READ | Protection::WRITE).to_string(), "rw-");
        assert_eq!((Protection::READ | Protection::EXECUTE).to_string(), "r-x");
        assert_eq!(Protection::all().to_string(), "rwx");
        assert_eq!(Protection::from_flags(5).to_string(), "r-x");
    }

    #[test]
    fn test_protection_parse() {
        assert_eq!("r--".parse::<Protection>().unwrap(), Protection::READ);
        assert_eq!("r-xp".parse::<Protection>().unwrap(), Protection::READ | Protection::EXECUTE);
        assert_eq!("rw-s".parse::<Protection>().unwrap(), Protection::READ | Protection::WRITE);
        assert!("wr-".parse::<Protection>().is_err());
        assert!("rwxpq".parse::<Protection>().is_err());
    }
}
