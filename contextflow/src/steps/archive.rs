//! Tar archive access behind the [`Archiver`] trait.

use crate::errors::ArchiveError;
use std::fmt::{self, Debug};
use std::fs::{self, File};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::Path;
use tracing::debug;

const GZIP_MAGIC: &[u8] = &[0x1f, 0x8b];
const XZ_MAGIC: &[u8] = &[0xfd, b'7', b'z', b'X', b'Z', 0x00];
const BZIP2_MAGIC: &[u8] = b"BZh";
const XZ_PRESET: u32 = 6;

/// Compression applied to a tar stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Compression {
    /// Detect from the stream's magic bytes. Read-only.
    Auto,
    /// Plain tar.
    None,
    /// gzip.
    Gzip,
    /// xz.
    Xz,
    /// bzip2.
    Bzip2,
}

impl Compression {
    /// Parses the scheme part of a mode string.
    ///
    /// # Errors
    ///
    /// Returns `UnsupportedCompression` for an unknown scheme.
    pub fn from_scheme(scheme: &str) -> Result<Self, ArchiveError> {
        match scheme {
            "*" => Ok(Self::Auto),
            "" => Ok(Self::None),
            "gz" | "gzip" => Ok(Self::Gzip),
            "xz" => Ok(Self::Xz),
            "bz2" | "bzip2" => Ok(Self::Bzip2),
            other => Err(ArchiveError::UnsupportedCompression {
                scheme: other.to_string(),
            }),
        }
    }

    /// Detects the compression of a stream from its first bytes.
    #[must_use]
    pub fn detect(header: &[u8]) -> Self {
        if header.starts_with(GZIP_MAGIC) {
            Self::Gzip
        } else if header.starts_with(XZ_MAGIC) {
            Self::Xz
        } else if header.starts_with(BZIP2_MAGIC) {
            Self::Bzip2
        } else {
            Self::None
        }
    }

    /// The scheme as written in a mode string.
    #[must_use]
    pub fn scheme(self) -> &'static str {
        match self {
            Self::Auto => "*",
            Self::None => "",
            Self::Gzip => "gz",
            Self::Xz => "xz",
            Self::Bzip2 => "bz2",
        }
    }
}

/// A parsed `r:<scheme>` or `w:<scheme>` mode string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveMode {
    /// Read an archive.
    Read(Compression),
    /// Write an archive.
    Write(Compression),
}

impl ArchiveMode {
    /// Parses a mode string.
    ///
    /// # Errors
    ///
    /// Returns `InvalidMode` when the direction is not `r` or `w`, and
    /// `UnsupportedCompression` for an unknown scheme or `w:*`.
    pub fn parse(mode: &str) -> Result<Self, ArchiveError> {
        let invalid = || ArchiveError::InvalidMode {
            mode: mode.to_string(),
        };
        let (direction, scheme) = mode.split_once(':').ok_or_else(invalid)?;
        let compression = Compression::from_scheme(scheme)?;
        match (direction, compression) {
            ("r", compression) => Ok(Self::Read(compression)),
            ("w", Compression::Auto) => Err(ArchiveError::UnsupportedCompression {
                scheme: scheme.to_string(),
            }),
            ("w", compression) => Ok(Self::Write(compression)),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ArchiveMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Read(c) => write!(f, "r:{}", c.scheme()),
            Self::Write(c) => write!(f, "w:{}", c.scheme()),
        }
    }
}

/// Reads and writes tar archives.
pub trait Archiver: Send + Sync + Debug {
    /// Extracts `archive` into the `destination` directory.
    ///
    /// # Errors
    ///
    /// Returns an `ArchiveError` for a bad mode or a failed read.
    fn extract(&self, archive: &Path, destination: &Path, mode: &str) -> Result<(), ArchiveError>;

    /// Archives the contents of the `source` directory into `archive`.
    ///
    /// # Errors
    ///
    /// Returns an `ArchiveError` for a bad mode or a failed write.
    fn archive(&self, source: &Path, archive: &Path, mode: &str) -> Result<(), ArchiveError>;
}

/// [`Archiver`] over the local filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct TarArchiver;

impl TarArchiver {
    /// Creates a new archiver.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Archiver for TarArchiver {
    fn extract(&self, archive: &Path, destination: &Path, mode: &str) -> Result<(), ArchiveError> {
        let ArchiveMode::Read(compression) = ArchiveMode::parse(mode)? else {
            return Err(ArchiveError::InvalidMode {
                mode: mode.to_string(),
            });
        };
        let at = |err: io::Error| ArchiveError::io(archive.display().to_string(), err);

        let mut reader = BufReader::new(File::open(archive).map_err(at)?);
        let compression = match compression {
            Compression::Auto => Compression::detect(reader.fill_buf().map_err(at)?),
            explicit => explicit,
        };
        debug!(archive = %archive.display(), ?compression, "extracting archive");

        match compression {
            Compression::Gzip => unpack(flate2::read::GzDecoder::new(reader), destination),
            Compression::Xz => unpack(xz2::read::XzDecoder::new(reader), destination),
            Compression::Bzip2 => unpack(bzip2::read::BzDecoder::new(reader), destination),
            Compression::None | Compression::Auto => unpack(reader, destination),
        }
        .map_err(at)
    }

    fn archive(&self, source: &Path, archive: &Path, mode: &str) -> Result<(), ArchiveError> {
        let ArchiveMode::Write(compression) = ArchiveMode::parse(mode)? else {
            return Err(ArchiveError::InvalidMode {
                mode: mode.to_string(),
            });
        };
        let at = |err: io::Error| ArchiveError::io(archive.display().to_string(), err);

        if let Some(parent) = archive.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(at)?;
        }
        let file = File::create(archive).map_err(at)?;
        debug!(archive = %archive.display(), ?compression, "writing archive");

        let result = match compression {
            Compression::Gzip => pack(
                flate2::write::GzEncoder::new(file, flate2::Compression::default()),
                source,
            )
            .and_then(flate2::write::GzEncoder::finish)
            .map(drop),
            Compression::Xz => pack(xz2::write::XzEncoder::new(file, XZ_PRESET), source)
                .and_then(xz2::write::XzEncoder::finish)
                .map(drop),
            Compression::Bzip2 => pack(
                bzip2::write::BzEncoder::new(file, bzip2::Compression::default()),
                source,
            )
            .and_then(bzip2::write::BzEncoder::finish)
            .map(drop),
            Compression::None | Compression::Auto => {
                pack(file, source).and_then(|mut file| file.flush())
            }
        };
        result.map_err(at)
    }
}

fn unpack<R: Read>(reader: R, destination: &Path) -> io::Result<()> {
    fs::create_dir_all(destination)?;
    tar::Archive::new(reader).unpack(destination)
}

/// Writes the contents of `source` as `.` and returns the inner writer.
fn pack<W: Write>(writer: W, source: &Path) -> io::Result<W> {
    let mut builder = tar::Builder::new(writer);
    builder.append_dir_all(".", source)?;
    builder.into_inner()
}
