//! Gradle Wrapper configuration (`gradle-wrapper.properties`).
//!
//! [`WrapperConfig`] keeps the text it was parsed from. Serializing splices the
//! two fields the updater owns (`distributionUrl` and `distributionSha256Sum`)
//! back into that text, so a diff of the old and new file only ever touches
//! those lines.

use std::fs;
use std::path::{Path, PathBuf};

use crate::distribution::{DistType, DistributionUrl};
use crate::errors::{Result, UpdateError};
use crate::properties::{EscapeStyle, PropertiesDocument, escape_value};

pub const DISTRIBUTION_URL_KEY: &str = "distributionUrl";
pub const DISTRIBUTION_CHECKSUM_KEY: &str = "distributionSha256Sum";

/// Character encoding of a backing file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FileEncoding {
    #[default]
    Utf8,
    /// ISO-8859-1, the encoding `java.util.Properties` reads files with.
    Latin1,
}

impl FileEncoding {
    /// Decode `bytes` as UTF-8, or byte-per-char as ISO-8859-1 when invalid.
    pub fn decode(bytes: Vec<u8>) -> (String, Self) {
        match String::from_utf8(bytes) {
            Ok(text) => (text, Self::Utf8),
            Err(e) => (
                e.into_bytes().into_iter().map(char::from).collect(),
                Self::Latin1,
            ),
        }
    }

    /// Encode `text` back. Characters outside ISO-8859-1 become `\uXXXX`.
    pub fn encode(self, text: &str) -> Vec<u8> {
        match self {
            Self::Utf8 => text.as_bytes().to_vec(),
            Self::Latin1 => {
                let mut out = Vec::with_capacity(text.len());
                for ch in text.chars() {
                    match u8::try_from(u32::from(ch)) {
                        Ok(byte) => out.push(byte),
                        Err(_) => {
                            let mut units = [0u16; 2];
                            for unit in ch.encode_utf16(&mut units) {
                                out.extend(format!("\\u{unit:04X}").bytes());
                            }
                        }
                    }
                }
                out
            }
        }
    }
}

/// One wrapper's pinned distribution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WrapperConfig {
    path: PathBuf,
    pub distribution_url: DistributionUrl,
    pub distribution_checksum: Option<String>,
    source: String,
    document: PropertiesDocument,
    encoding: FileEncoding,
}

impl WrapperConfig {
    /// Read and parse the properties file at `path`.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let bytes = fs::read(&path).map_err(|e| UpdateError::MalformedConfig {
            path: path.clone(),
            reason: format!("cannot read file: {e}"),
        })?;
        Self::from_bytes(path, bytes)
    }

    /// Parse raw file bytes, falling back to ISO-8859-1 when they are not UTF-8.
    pub fn from_bytes(path: impl Into<PathBuf>, bytes: Vec<u8>) -> Result<Self> {
        let (content, encoding) = FileEncoding::decode(bytes);
        let mut config = Self::parse(path, content)?;
        config.encoding = encoding;
        Ok(config)
    }

    /// Parse properties `content` that backs the file at `path`.
    pub fn parse(path: impl Into<PathBuf>, content: impl Into<String>) -> Result<Self> {
        let path = path.into();
        let source = content.into();
        let malformed = |reason: String| UpdateError::MalformedConfig {
            path: path.clone(),
            reason,
        };

        let document = PropertiesDocument::parse(&source).map_err(|e| malformed(e.to_string()))?;
        let url = document
            .get(DISTRIBUTION_URL_KEY)
            .ok_or_else(|| malformed(format!("missing {DISTRIBUTION_URL_KEY}")))?;
        let distribution_url = DistributionUrl::parse(&url.value).map_err(|e| malformed(e.to_string()))?;
        let distribution_checksum = document
            .get(DISTRIBUTION_CHECKSUM_KEY)
            .map(|entry| entry.value.clone());

        Ok(Self {
            path,
            distribution_url,
            distribution_checksum,
            source,
            document,
            encoding: FileEncoding::Utf8,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Pinned Gradle version.
    pub fn version(&self) -> &str {
        self.distribution_url.version()
    }

    pub fn dist_type(&self) -> DistType {
        self.distribution_url.dist_type()
    }

    /// Project root owning this wrapper (`<root>/gradle/wrapper/<file>`).
    pub fn project_dir(&self) -> PathBuf {
        self.path
            .ancestors()
            .nth(3)
            .filter(|dir| !dir.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }

    pub fn encoding(&self) -> FileEncoding {
        self.encoding
    }

    /// [`WrapperConfig::serialize`] encoded like the original file.
    pub fn to_bytes(&self) -> Vec<u8> {
        self.encoding.encode(&self.serialize())
    }

    /// Text the config was parsed from.
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Render the config back to text, editing the original in place.
    pub fn serialize(&self) -> String {
        let mut edits: Vec<(std::ops::Range<usize>, String)> = Vec::new();

        let url = self.distribution_url.to_string();
        // Parse guarantees the key exists.
        let url_entry = self.document.get(DISTRIBUTION_URL_KEY);
        if let Some(entry) = url_entry
            && entry.value != url
        {
            let style = EscapeStyle::detect(entry.raw_value(&self.source));
            edits.push((entry.value_span.clone(), escape_value(&url, style)));
        }

        let current = self.document.get(DISTRIBUTION_CHECKSUM_KEY);
        match (current, &self.distribution_checksum) {
            (Some(entry), Some(checksum)) if entry.value != *checksum => {
                edits.push((entry.value_span.clone(), escape_value(checksum, EscapeStyle::default())));
            }
            (Some(_), None) => {
                for entry in self.document.all(DISTRIBUTION_CHECKSUM_KEY) {
                    edits.push((entry.line_span.clone(), String::new()));
                }
            }
            (None, Some(checksum)) => {
                if let Some(anchor) = url_entry {
                    let eol = self.document.line_ending().as_str();
                    let mut line = String::new();
                    if !anchor.is_terminated(&self.source) {
                        line.push_str(eol);
                    }
                    line.push_str(DISTRIBUTION_CHECKSUM_KEY);
                    line.push('=');
                    line.push_str(&escape_value(checksum, EscapeStyle::default()));
                    if anchor.is_terminated(&self.source) {
                        line.push_str(eol);
                    }
                    let at = anchor.line_span.end;
                    edits.push((at..at, line));
                }
            }
            _ => {}
        }

        if edits.is_empty() {
            return self.source.clone();
        }

        // Splice from the back so earlier spans stay valid.
        edits.sort_by(|a, b| b.0.start.cmp(&a.0.start).then(b.0.end.cmp(&a.0.end)));
        let mut out = self.source.clone();
        for (span, replacement) in edits {
            out.replace_range(span, &replacement);
        }
        out
    }
}
