//! SH-011: Archive unpacking — tar (plain, gzip, bzip2, zstd) and zip.

use super::fs::FsError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use tracing::debug;

/// Supported archive formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum ArchiveFormat {
    #[serde(rename = "tar")]
    Tar,
    #[serde(rename = "tar.gz", alias = "tgz")]
    TarGz,
    #[serde(rename = "tar.bz2", alias = "tbz2")]
    TarBz2,
    #[serde(rename = "tar.zst", alias = "tzst")]
    TarZst,
    #[serde(rename = "zip")]
    Zip,
}

impl fmt::Display for ArchiveFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Tar => "tar",
            Self::TarGz => "tar.gz",
            Self::TarBz2 => "tar.bz2",
            Self::TarZst => "tar.zst",
            Self::Zip => "zip",
        };
        write!(f, "{}", s)
    }
}

/// Infer the format from the file name.
pub fn detect_format(path: &Path) -> Option<ArchiveFormat> {
    let name = path.file_name()?.to_string_lossy().to_ascii_lowercase();
    if name.ends_with(".tar.gz") || name.ends_with(".tgz") {
        Some(ArchiveFormat::TarGz)
    } else if name.ends_with(".tar.bz2") || name.ends_with(".tbz2") {
        Some(ArchiveFormat::TarBz2)
    } else if name.ends_with(".tar.zst") || name.ends_with(".tzst") {
        Some(ArchiveFormat::TarZst)
    } else if name.ends_with(".tar") {
        Some(ArchiveFormat::Tar)
    } else if name.ends_with(".zip") {
        Some(ArchiveFormat::Zip)
    } else {
        None
    }
}

/// Unpack `archive` into the existing directory `dst`.
pub fn unpack(archive: &Path, dst: &Path, format: ArchiveFormat) -> Result<(), FsError> {
    debug!(archive = %archive.display(), dst = %dst.display(), %format, "unpack");
    let file = File::open(archive).map_err(|e| FsError::from_io(archive, e))?;
    let reader = BufReader::new(file);

    match format {
        ArchiveFormat::Tar => unpack_tar(reader, archive, dst),
        ArchiveFormat::TarGz => unpack_tar(flate2::read::GzDecoder::new(reader), archive, dst),
        ArchiveFormat::TarBz2 => unpack_tar(bzip2::read::BzDecoder::new(reader), archive, dst),
        ArchiveFormat::TarZst => {
            let decoder =
                zstd::stream::read::Decoder::new(reader).map_err(|e| FsError::from_io(archive, e))?;
            unpack_tar(decoder, archive, dst)
        }
        ArchiveFormat::Zip => {
            let mut zip =
                zip::ZipArchive::new(reader).map_err(|e| zip_error(archive, e))?;
            zip.extract(dst).map_err(|e| zip_error(archive, e))
        }
    }
}

fn unpack_tar<R: Read>(reader: R, archive: &Path, dst: &Path) -> Result<(), FsError> {
    tar::Archive::new(reader)
        .unpack(dst)
        .map_err(|e| FsError::from_io(archive, e))
}

fn zip_error(archive: &Path, err: zip::result::ZipError) -> FsError {
    match err {
        zip::result::ZipError::Io(e) => FsError::from_io(archive, e),
        other => FsError::Io {
            path: archive.to_path_buf(),
            source: io::Error::new(io::ErrorKind::InvalidData, other),
        },
    }
}
