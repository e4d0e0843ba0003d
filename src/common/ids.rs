//! Deterministic fingerprints for feature schemas and other small identifiers.

/// FNV-1a style hash; stable across platforms and releases.
#[derive(Copy, Clone, Debug)]
pub struct Fingerprint(u32);

impl Fingerprint {
    /// Create a new hash state with the FNV offset basis.
    pub fn new() -> Self {
        Self(2_166_136_261)
    }

    /// Feed bytes into the hash function.
    pub fn update(&mut self, bytes: &[u8]) {
        for b in bytes {
            self.0 = (self.0 ^ u32::from(*b)).wrapping_mul(16_777_619);
        }
    }

    /// Feed an ordered list of names, separated so `["ab","c"]` differs from `["a","bc"]`.
    pub fn update_names<S: AsRef<str>>(&mut self, names: &[S]) {
        for name in names {
            self.update(name.as_ref().as_bytes());
            self.update(&[0x1f]);
        }
    }

    /// Finalise the hash and return a 32-bit value.
    pub fn finish32(&self) -> u32 {
        self.0
    }

    /// Finalise the hash and return an 8-character lowercase hex string.
    pub fn finish_hex(&self) -> String {
        format!("{:08x}", self.0)
    }
}

impl Default for Fingerprint {
    fn default() -> Self {
        Self::new()
    }
}

/// Fingerprint of an ordered field list.
pub fn fingerprint_names<S: AsRef<str>>(names: &[S]) -> String {
    let mut hash = Fingerprint::new();
    hash.update_names(names);
    hash.finish_hex()
}
