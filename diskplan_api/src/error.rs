use std::fmt::{Debug, Write};
use std::{borrow::Cow, panic::Location};

use serde::{ser::SerializeStruct, Deserialize, Serialize};
use strum_macros::IntoStaticStr;

/// The raw partition configuration has the wrong shape or types.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum ConfigParseError {
    #[error("Failed to parse '{path}': {reason}")]
    Deserialize { path: String, reason: String },

    #[error("Field '{path}' is required but was not provided")]
    MissingField { path: String },

    #[error("Field '{path}' has invalid value '{value}': {reason}")]
    InvalidValue {
        path: String,
        value: String,
        reason: String,
    },
}

/// The partition configuration is well formed but internally inconsistent, or
/// inconsistent with the drives available on the server.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum ValidationError {
    #[error("Partition disk_partitions[{index}] for mount '{mount}' must set exactly one of 'size' or 'size_percent', but neither was set")]
    SizeNotSpecified { index: usize, mount: String },

    #[error("Partition disk_partitions[{index}] for mount '{mount}' must set exactly one of 'size' or 'size_percent', but both were set")]
    ConflictingSizes { index: usize, mount: String },

    #[error("Partition for mount '{mount}' has size_percent {percent}, but it must be greater than 0 and at most 100")]
    InvalidSizePercent { mount: String, percent: f64 },

    #[error("Partition for mount '{mount}' has size {size}, but it must be positive or -1 to use the remaining space")]
    InvalidAbsoluteSize { mount: String, size: i64 },

    #[error("RAID group '{name}' is defined more than once")]
    DuplicateRaidGroup { name: String },

    #[error("Mount point '{mount}' is defined more than once")]
    DuplicateMountPoint { mount: String },

    #[error("Mount '{mount}' references RAID group '{raid}', which is not defined in soft_raid_config")]
    RaidNotFound { mount: String, raid: String },

    #[error("No drive of type '{disk_type}' is available for mount '{mount}' on RAID group '{raid}'")]
    NoDriveForMount {
        mount: String,
        raid: String,
        disk_type: String,
    },

    #[error("Drive '{drive_id}' reports capacity {capacity}, so percent-based size for mount '{mount}' cannot be computed")]
    InvalidDriveSize {
        drive_id: String,
        capacity: i64,
        mount: String,
    },
}

/// Automatic partitioning could not proceed because of missing server or OS
/// data.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum PreconditionError {
    #[error("No local drives are available for automatic partitioning")]
    NoLocalDrives,

    #[error("Operating system does not provide a default '/boot' partition to synthesize from")]
    NoDefaultBootPartition,

    #[error("No RAID group is declared that could host the '/boot' partition")]
    NoRaidGroupForBoot,
}

/// Failures outside of the user's control.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum InfrastructureError {
    #[error("Failed to generate a unique node identifier")]
    IdGeneration,

    #[error("Failed to encode partition graph as {format}")]
    EncodeGraph { format: String },

    #[error("Failed to write output to '{path}'")]
    WriteOutput { path: String },

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Input files handed to the tool could not be used.
#[derive(Debug, thiserror::Error, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum InvalidInputError {
    #[error("Failed to read input file '{path}'")]
    ReadInputFile { path: String },

    #[error("Failed to parse input file '{path}'")]
    ParseInputFile { path: String },

    #[error("Operating system '{name}' is not present in the inventory")]
    UnknownOperatingSystem { name: String },
}

/// Each variant of `ErrorKind` corresponds to a different category of error,
/// so that the caller can decide how to report it to the end user.
#[derive(Debug, thiserror::Error, IntoStaticStr, PartialEq)]
#[strum(serialize_all = "kebab-case")]
pub enum ErrorKind {
    /// Malformed shapes or types in the user's partition configuration.
    #[error(transparent)]
    ConfigParse(#[from] ConfigParseError),

    /// Inconsistent partition configuration.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Missing drives or OS defaults required to build a layout.
    #[error(transparent)]
    Precondition(#[from] PreconditionError),

    /// Id generation or output failures.
    #[error(transparent)]
    Infrastructure(#[from] InfrastructureError),

    /// Unusable input files.
    #[error(transparent)]
    InvalidInput(#[from] InvalidInputError),
}

#[derive(Debug)]
struct DiskplanErrorInner {
    kind: ErrorKind,
    location: &'static Location<'static>,
    source: Option<anyhow::Error>,
    context: Vec<(Cow<'static, str>, &'static Location<'static>)>,
}

pub struct DiskplanError(Box<DiskplanErrorInner>);
impl DiskplanError {
    #[track_caller]
    pub fn new(kind: impl Into<ErrorKind>) -> Self {
        DiskplanError(Box::new(DiskplanErrorInner {
            kind: kind.into(),
            location: Location::caller(),
            source: None,
            context: Vec::new(),
        }))
    }

    /// Returns a reference to the inner ErrorKind.
    pub fn kind(&self) -> &ErrorKind {
        &self.0.kind
    }
}

pub trait ReportError<T, K> {
    /// Convert this error into a structured DiskplanError.
    fn structured(self, kind: K) -> Result<T, DiskplanError>;
}

impl<T, K> ReportError<T, K> for Option<T>
where
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, DiskplanError> {
        match self {
            Some(t) => Ok(t),
            None => Err(DiskplanError(Box::new(DiskplanErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: None,
                context: Vec::new(),
            }))),
        }
    }
}

impl<T, E, K> ReportError<T, K> for Result<T, E>
where
    E: Into<anyhow::Error>,
    K: Into<ErrorKind>,
{
    #[track_caller]
    fn structured(self, kind: K) -> Result<T, DiskplanError> {
        match self {
            Ok(o) => Ok(o),
            Err(e) => Err(DiskplanError(Box::new(DiskplanErrorInner {
                kind: kind.into(),
                location: Location::caller(),
                source: Some(e.into()),
                context: Vec::new(),
            }))),
        }
    }
}

pub trait DiskplanResultExt<T> {
    /// Attach a context message to the error.
    fn message(self, context: impl Into<Cow<'static, str>>) -> Result<T, DiskplanError>;
}
impl<T> DiskplanResultExt<T> for Result<T, DiskplanError> {
    #[track_caller]
    fn message(mut self, context: impl Into<Cow<'static, str>>) -> Result<T, DiskplanError> {
        if let Err(ref mut e) = self {
            e.0.context.push((context.into(), Location::caller()));
        }
        self
    }
}

impl Serialize for DiskplanError {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("diskplan-error", 5)?;
        state.serialize_field("message", &self.0.kind.to_string())?;
        match self.0.kind {
            ErrorKind::ConfigParse(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Validation(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Precondition(ref e) => state.serialize_field("error", e)?,
            ErrorKind::Infrastructure(ref e) => state.serialize_field("error", e)?,
            ErrorKind::InvalidInput(ref e) => state.serialize_field("error", e)?,
        }
        state.serialize_field("category", <&str>::from(&self.0.kind))?;
        state.serialize_field(
            "location",
            &format!("{}:{}", self.0.location.file(), self.0.location.line()),
        )?;
        match self.0.source {
            Some(ref e) => state.serialize_field("cause", &Some(format!("{:?}", e)))?,
            None => state.serialize_field("cause", &None::<String>)?,
        }
        state.end()
    }
}

impl Debug for DiskplanError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} at {}:{}",
            self.0.kind,
            self.0.location.file(),
            self.0.location.line()
        )?;

        if !self.0.context.is_empty() {
            writeln!(f, "\n\nContext:")?;
            for (i, (context, location)) in self.0.context.iter().enumerate() {
                for (j, line) in context.split('\n').enumerate() {
                    if j == 0 {
                        write!(f, "{: >5}: ", i)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                writeln!(f, " at {}:{}", location.file(), location.line())?;
            }
        }

        if let Some(ref source) = self.0.source {
            writeln!(f, "\n\nCaused by:")?;
            let mut index = 0;
            let mut source: Option<&dyn std::error::Error> = Some(source.as_ref());
            while let Some(e) = source {
                for (i, line) in e.to_string().split('\n').enumerate() {
                    if i == 0 {
                        write!(f, "{: >5}: ", index)?;
                    } else {
                        f.write_str("\n       ")?;
                    }
                    f.write_str(line)?;
                }
                f.write_char('\n')?;
                source = e.source();
                index += 1;
            }
        }
        Ok(())
    }
}
