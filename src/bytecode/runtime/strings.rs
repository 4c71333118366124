//! String table. Constant pool, persistent zone strings and temporary strings share one index space.
//!
//! * `0 <= index < constant size` addresses a NUL terminated string in the constant pool.
//! * `constant size + n` addresses zone slot `n`.
//! * negative indices `!n` address temporary string `n`. Temporary strings live until the call that created
//!   them returns.

use std::borrow::Cow;

/// Strings visible to a running program.
#[derive(Debug, Clone)]
pub struct Strings {
    constants   : Vec<u8>,
    zone        : Vec<Option<String>>,
    temp        : Vec<String>,
}

impl Strings {
    /// Creates a string table from a compiled constant pool.
    pub fn new(constants: Vec<u8>) -> Self {
        Self { constants, zone: Vec::new(), temp: Vec::new() }
    }
    /// Size of the constant pool in bytes.
    pub fn constant_size(self: &Self) -> usize {
        self.constants.len()
    }
    /// Returns the string at the given index. Indices outside all regions yield a placeholder.
    pub fn get(self: &Self, index: i32) -> Cow<'_, str> {
        if index < 0 {
            if let Some(string) = self.temp.get(!index as usize) {
                return Cow::Borrowed(string);
            }
        } else if (index as usize) < self.constants.len() {
            let start = index as usize;
            let end = self.constants[start..].iter().position(|&b| b == 0).map_or(self.constants.len(), |p| start + p);
            return String::from_utf8_lossy(&self.constants[start..end]);
        } else if let Some(Some(string)) = self.zone.get(index as usize - self.constants.len()) {
            return Cow::Borrowed(string);
        }
        Cow::Owned(format!("<invalid string ({index})>"))
    }
    /// Stores a temporary string and returns its (negative) index.
    pub fn temp(self: &mut Self, string: String) -> i32 {
        self.temp.push(string);
        !((self.temp.len() - 1) as i32)
    }
    /// Number of live temporary strings.
    pub fn temp_len(self: &Self) -> usize {
        self.temp.len()
    }
    /// Releases the temporary strings created after the first `mark` ones. If `keep` addresses one of the released
    /// strings, it survives as the temporary string directly above the mark and its new index is returned.
    pub fn release_temp(self: &mut Self, mark: usize, keep: i32) -> Option<i32> {
        let kept = if keep < 0 && ((!keep) as usize) >= mark && ((!keep) as usize) < self.temp.len() {
            Some(self.temp.swap_remove(!keep as usize))
        } else {
            None
        };
        self.temp.truncate(mark);
        kept.map(|string| self.temp(string))
    }
    /// Copies a string into the zone and returns its index. Freed zone slots are reused.
    pub fn zone(self: &mut Self, string: String) -> i32 {
        let slot = match self.zone.iter().position(|s| s.is_none()) {
            Some(slot) => {
                self.zone[slot] = Some(string);
                slot
            },
            None => {
                self.zone.push(Some(string));
                self.zone.len() - 1
            }
        };
        (self.constants.len() + slot) as i32
    }
    /// Frees a zone string. Returns whether the index addressed a live zone string.
    pub fn unzone(self: &mut Self, index: i32) -> bool {
        if index < 0 || (index as usize) < self.constants.len() {
            return false;
        }
        match self.zone.get_mut(index as usize - self.constants.len()) {
            Some(slot) if slot.is_some() => {
                *slot = None;
                true
            },
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> Vec<u8> {
        b"\0hello\0world\0".to_vec()
    }

    #[test]
    fn constants() {
        let strings = Strings::new(pool());
        assert_eq!(strings.get(0), "");
        assert_eq!(strings.get(1), "hello");
        assert_eq!(strings.get(3), "llo");
        assert_eq!(strings.get(7), "world");
    }

    #[test]
    fn zone_reuses_slots() {
        let mut strings = Strings::new(pool());
        let a = strings.zone("a".to_string());
        let b = strings.zone("b".to_string());
        assert_eq!(a, 13);
        assert_eq!(b, 14);
        assert!(strings.unzone(a));
        assert!(!strings.unzone(a));
        assert!(!strings.unzone(1));
        assert_eq!(strings.zone("c".to_string()), a);
        assert_eq!(strings.get(a), "c");
        assert_eq!(strings.get(b), "b");
    }

    #[test]
    fn temp_strings() {
        let mut strings = Strings::new(pool());
        let first = strings.temp("x".to_string());
        let second = strings.temp("y".to_string());
        assert_eq!(first, -1);
        assert_eq!(second, -2);
        assert_eq!(strings.get(second), "y");
        let kept = strings.release_temp(0, second);
        assert_eq!(kept, Some(-1));
        assert_eq!(strings.temp_len(), 1);
        assert_eq!(strings.get(-1), "y");
        assert_eq!(strings.release_temp(0, 0), None);
        assert_eq!(strings.temp_len(), 0);
    }

    #[test]
    fn release_keeps_temps_below_mark() {
        let mut strings = Strings::new(pool());
        let caller = strings.temp("caller".to_string());
        let mark = strings.temp_len();
        strings.temp("scratch".to_string());
        let result = strings.temp("result".to_string());
        assert_eq!(strings.release_temp(mark, result), Some(-2));
        assert_eq!(strings.get(caller), "caller");
        assert_eq!(strings.get(-2), "result");
        assert_eq!(strings.temp_len(), 2);
        assert_eq!(strings.release_temp(mark, caller), None);
        assert_eq!(strings.get(caller), "caller");
        assert_eq!(strings.temp_len(), 1);
    }

    #[test]
    fn invalid_indices_yield_placeholder() {
        let strings = Strings::new(pool());
        assert_eq!(strings.get(-5), "<invalid string (-5)>");
        assert_eq!(strings.get(99), "<invalid string (99)>");
    }
}
