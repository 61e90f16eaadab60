//! SH-016: Content digests — SHA-256, BLAKE3, and MD5 over streams and files.
//!
//! MD5 is accepted for older recipes that only publish MD5 sums.

use md5::Md5;
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Read;
use std::path::Path;

const STREAM_BUF_SIZE: usize = 65536;

/// Digest algorithms a `checksum` step may name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DigestAlgorithm {
    Sha256,
    Blake3,
    Md5,
}

impl DigestAlgorithm {
    pub fn prefix(self) -> &'static str {
        match self {
            Self::Sha256 => "sha256",
            Self::Blake3 => "blake3",
            Self::Md5 => "md5",
        }
    }

    pub fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            "md5" => Some(Self::Md5),
            _ => None,
        }
    }

    /// Length of the hex digest.
    pub fn hex_len(self) -> usize {
        match self {
            Self::Sha256 | Self::Blake3 => 64,
            Self::Md5 => 32,
        }
    }
}

impl fmt::Display for DigestAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.prefix())
    }
}

/// A digest written as `<algorithm>:<hex>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExpectedDigest {
    pub algorithm: DigestAlgorithm,
    /// Lowercase hex of `algorithm.hex_len()` characters
    pub hex: String,
}

impl ExpectedDigest {
    pub fn parse(s: &str) -> Result<Self, String> {
        let (prefix, hex) = s
            .split_once(':')
            .ok_or_else(|| format!("digest '{}' must be <algorithm>:<hex>", s))?;
        let algorithm = DigestAlgorithm::from_prefix(prefix)
            .ok_or_else(|| {
                format!(
                    "unsupported digest algorithm '{}' (use sha256, blake3, or md5)",
                    prefix
                )
            })?;
        if hex.len() != algorithm.hex_len() || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(format!(
                "{} digest must be {} hex characters",
                algorithm,
                algorithm.hex_len()
            ));
        }
        Ok(Self {
            algorithm,
            hex: hex.to_ascii_lowercase(),
        })
    }
}

impl fmt::Display for ExpectedDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Hash everything `reader` yields. Returns lowercase hex.
pub fn hash_reader(algorithm: DigestAlgorithm, reader: &mut dyn Read) -> std::io::Result<String> {
    match algorithm {
        DigestAlgorithm::Sha256 => digest_stream::<Sha256>(reader),
        DigestAlgorithm::Md5 => digest_stream::<Md5>(reader),
        DigestAlgorithm::Blake3 => {
            let mut buf = vec![0u8; STREAM_BUF_SIZE];
            let mut hasher = blake3::Hasher::new();
            loop {
                let n = reader.read(&mut buf)?;
                if n == 0 {
                    break;
                }
                hasher.update(&buf[..n]);
            }
            Ok(hasher.finalize().to_hex().to_string())
        }
    }
}

/// Hash a file. Returns `"<algorithm>:<hex>"`.
pub fn hash_file(algorithm: DigestAlgorithm, path: &Path) -> Result<String, String> {
    let mut file =
        std::fs::File::open(path).map_err(|e| format!("cannot open {}: {}", path.display(), e))?;
    let hex = hash_reader(algorithm, &mut file)
        .map_err(|e| format!("read error {}: {}", path.display(), e))?;
    Ok(format!("{}:{}", algorithm, hex))
}

fn digest_stream<D: Digest>(reader: &mut dyn Read) -> std::io::Result<String> {
    let mut buf = vec![0u8; STREAM_BUF_SIZE];
    let mut hasher = D::new();
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(to_hex(&hasher.finalize()))
}

fn to_hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    #[test]
    fn test_sh016_sha256_known_vector() {
        let hex = hash_reader(DigestAlgorithm::Sha256, &mut "abc".as_bytes()).unwrap();
        assert_eq!(hex, ABC_SHA256);
    }

    #[test]
    fn test_sh016_blake3_matches_oneshot() {
        let hex = hash_reader(DigestAlgorithm::Blake3, &mut "hello".as_bytes()).unwrap();
        assert_eq!(hex, blake3::hash(b"hello").to_hex().to_string());
    }

    #[test]
    fn test_sh016_md5_known_vector() {
        let hex = hash_reader(DigestAlgorithm::Md5, &mut "abc".as_bytes()).unwrap();
        assert_eq!(hex, "900150983cd24fb0d6963f7d28e17f72");
    }

    #[test]
    fn test_sh016_hash_file() {
        let dir = tempfile::tempdir().unwrap();
        let f = dir.path().join("abc.txt");
        std::fs::write(&f, "abc").unwrap();
        assert_eq!(
            hash_file(DigestAlgorithm::Sha256, &f).unwrap(),
            format!("sha256:{}", ABC_SHA256)
        );
        assert!(hash_file(DigestAlgorithm::Sha256, &dir.path().join("nope")).is_err());
    }

    #[test]
    fn test_sh016_large_stream_crosses_buffer() {
        let data = vec![7u8; STREAM_BUF_SIZE * 2 + 17];
        let streamed = hash_reader(DigestAlgorithm::Blake3, &mut data.as_slice()).unwrap();
        assert_eq!(streamed, blake3::hash(&data).to_hex().to_string());
    }

    #[test]
    fn test_sh016_parse_expected() {
        let d = ExpectedDigest::parse(&format!("sha256:{}", ABC_SHA256.to_uppercase())).unwrap();
        assert_eq!(d.algorithm, DigestAlgorithm::Sha256);
        assert_eq!(d.hex, ABC_SHA256);
        assert_eq!(d.to_string(), format!("sha256:{}", ABC_SHA256));
    }

    #[test]
    fn test_sh016_parse_md5() {
        let d = ExpectedDigest::parse("md5:D41D8CD98F00B204E9800998ECF8427E").unwrap();
        assert_eq!(d.algorithm, DigestAlgorithm::Md5);
        assert_eq!(d.hex, "d41d8cd98f00b204e9800998ecf8427e");
    }

    #[test]
    fn test_sh016_parse_rejects() {
        assert!(ExpectedDigest::parse("abc").is_err());
        assert!(ExpectedDigest::parse("crc32:d41d8cd9").is_err());
        assert!(ExpectedDigest::parse("sha256:abcd").is_err());
        assert!(ExpectedDigest::parse(&format!("md5:{}", ABC_SHA256)).is_err());
        assert!(ExpectedDigest::parse(&format!("blake3:{}", "z".repeat(64))).is_err());
    }
}
