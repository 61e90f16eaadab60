//! SH-024: `checksum` — verify a downloaded file before it is used.

use super::input_path;
use crate::collaborators::fs::FsError;
use crate::core::context::{InstallContext, Scope};
use crate::core::error::{ExecutionError, FailureKind};
use crate::journal::hasher::{hash_reader, ExpectedDigest};
use schemars::JsonSchema;
use serde::Deserialize;
use tracing::debug;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, JsonSchema)]
#[serde(deny_unknown_fields)]
pub struct ChecksumParams {
    /// File to verify; relative paths are under the cache directory
    pub file: String,
    /// `sha256:<hex>`, `blake3:<hex>`, or `md5:<hex>`
    pub hash: String,
}

/// A checksum step with its digest already parsed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumCheck {
    pub file: String,
    pub expected: ExpectedDigest,
}

impl TryFrom<ChecksumParams> for ChecksumCheck {
    type Error = String;

    fn try_from(p: ChecksumParams) -> Result<Self, Self::Error> {
        Ok(Self {
            expected: ExpectedDigest::parse(p.hash.trim())?,
            file: p.file,
        })
    }
}

pub(crate) fn apply(
    c: &ChecksumCheck,
    scope: &Scope,
    ctx: &InstallContext,
) -> Result<(), ExecutionError> {
    let path = input_path(&c.file, scope, ctx);
    let mut reader = ctx.fs().open(&path)?;
    let actual = hash_reader(c.expected.algorithm, &mut reader)
        .map_err(|e| ExecutionError::from(FsError::from_io(&path, e)))?;
    debug!(file = %path.display(), %actual, "checksum");
    if actual == c.expected.hex {
        Ok(())
    } else {
        Err(ExecutionError::new(
            FailureKind::Checksum,
            format!(
                "checksum mismatch for {}: expected {}, got {}:{}",
                path.display(),
                c.expected,
                c.expected.algorithm,
                actual
            ),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::context::GameIdentity;
    use crate::testing::{FakeFilesystem, FakeRunner, MemoryStore};

    const ABC_SHA256: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";

    fn check(file: &str, hash: &str) -> ChecksumCheck {
        ChecksumCheck::try_from(ChecksumParams {
            file: file.into(),
            hash: hash.into(),
        })
        .unwrap()
    }

    #[test]
    fn test_sh024_match() {
        let fs = FakeFilesystem::new().with_file("/cache/abc.bin", b"abc");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cache_dir("/cache");
        let scope = Scope::new(GameIdentity::default(), &ctx);
        apply(&check("abc.bin", &format!("sha256:{}", ABC_SHA256)), &scope, &ctx).unwrap();
    }

    #[test]
    fn test_sh024_mismatch() {
        let fs = FakeFilesystem::new().with_file("/cache/abc.bin", b"abd");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cache_dir("/cache");
        let scope = Scope::new(GameIdentity::default(), &ctx);
        let err = apply(&check("abc.bin", &format!("sha256:{}", ABC_SHA256)), &scope, &ctx)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Checksum);
        assert!(err.message.contains("mismatch"));
    }

    #[test]
    fn test_sh024_blake3() {
        let fs = FakeFilesystem::new().with_file("/cache/hello", b"hello");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cache_dir("/cache");
        let scope = Scope::new(GameIdentity::default(), &ctx);
        let digest = blake3::hash(b"hello").to_hex().to_string();
        apply(&check("$CACHE/hello", &format!("blake3:{}", digest)), &scope, &ctx).unwrap();
    }

    #[test]
    fn test_sh024_md5_from_older_recipes() {
        let fs = FakeFilesystem::new().with_file("/cache/abc.bin", b"abc");
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store).with_cache_dir("/cache");
        let scope = Scope::new(GameIdentity::default(), &ctx);
        apply(&check("abc.bin", "md5:900150983cd24fb0d6963f7d28e17f72"), &scope, &ctx).unwrap();
        let err = apply(&check("abc.bin", "md5:d41d8cd98f00b204e9800998ecf8427e"), &scope, &ctx)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::Checksum);
    }

    #[test]
    fn test_sh024_missing_file() {
        let fs = FakeFilesystem::new();
        let (runner, store) = (FakeRunner::installed("linux"), MemoryStore::default());
        let ctx = InstallContext::new("/g", &fs, &runner, &store);
        let scope = Scope::new(GameIdentity::default(), &ctx);
        let err = apply(&check("/nope", &format!("sha256:{}", ABC_SHA256)), &scope, &ctx)
            .unwrap_err();
        assert_eq!(err.kind, FailureKind::NotFound);
    }

    #[test]
    fn test_sh024_try_from_rejects() {
        let bad = ChecksumCheck::try_from(ChecksumParams {
            file: "a".into(),
            hash: "crc32:deadbeef".into(),
        });
        assert!(bad.is_err());
    }
}
