//! Glob patterns selecting which host interfaces the gateway manages.
use crate::protocol::transport::iface_name::IfaceName;

/// Maximum comma-separated patterns in one set.
pub const MAX_PATTERNS: usize = 4;

#[derive(Clone, Copy, Debug)]
/// A parsed, anchored pattern list such as `"can*,vcan?"`.
pub struct PatternSet {
    patterns: [IfaceName; MAX_PATTERNS],
    len: usize,
}

impl PatternSet {
    /// Parse a comma-separated pattern list. Whitespace around entries is
    /// trimmed, empty entries are skipped, and entries beyond
    /// [`MAX_PATTERNS`] are dropped.
    pub fn parse(list: &str) -> Self {
        let mut patterns = [IfaceName::EMPTY; MAX_PATTERNS];
        let mut len = 0;
        for entry in list.split(',') {
            let entry = entry.trim();
            if entry.is_empty() || len == MAX_PATTERNS {
                continue;
            }
            patterns[len] = IfaceName::new(entry);
            len += 1;
        }
        Self { patterns, len }
    }

    /// Whether any pattern matches the whole name.
    pub fn matches(&self, name: &IfaceName) -> bool {
        self.patterns[..self.len]
            .iter()
            .any(|pattern| glob_match(pattern.as_str(), name.as_str()))
    }
}

/// Anchored glob match: `*` spans any run of bytes, `?` exactly one.
fn glob_match(pattern: &str, name: &str) -> bool {
    let pattern = pattern.as_bytes();
    let name = name.as_bytes();
    let (mut p, mut n) = (0, 0);
    // Backtrack targets for the most recent `*`.
    let mut star: Option<(usize, usize)> = None;

    while n < name.len() {
        match pattern.get(p) {
            Some(b'*') => {
                star = Some((p, n));
                p += 1;
            }
            Some(b'?') => {
                p += 1;
                n += 1;
            }
            Some(&c) if c == name[n] => {
                p += 1;
                n += 1;
            }
            _ => match star {
                // Grow the span matched by the last `*` and retry.
                Some((sp, sn)) => {
                    p = sp + 1;
                    n = sn + 1;
                    star = Some((sp, sn + 1));
                }
                None => return false,
            },
        }
    }
    // Only trailing stars may remain unconsumed.
    pattern[p..].iter().all(|&c| c == b'*')
}
