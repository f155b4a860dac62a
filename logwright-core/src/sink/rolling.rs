use super::Sink;
use crate::sync::lock;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;
use tracing_appender::rolling::{InitError, RollingFileAppender, Rotation};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum FileRotation {
    Minutely,
    Hourly,
    #[default]
    Daily,
    Never,
}

impl From<FileRotation> for Rotation {
    fn from(r: FileRotation) -> Self {
        match r {
            FileRotation::Minutely => Rotation::MINUTELY,
            FileRotation::Hourly => Rotation::HOURLY,
            FileRotation::Daily => Rotation::DAILY,
            FileRotation::Never => Rotation::NEVER,
        }
    }
}

/// Appends lines to time-rotated files under one directory.
pub struct RollingFileSink {
    name: String,
    appender: Mutex<RollingFileAppender>,
}

impl RollingFileSink {
    pub fn new(
        directory: impl AsRef<Path>,
        prefix: &str,
        rotation: FileRotation,
        max_files: Option<usize>,
    ) -> Result<Self, InitError> {
        let mut builder = RollingFileAppender::builder()
            .rotation(rotation.into())
            .filename_prefix(prefix);
        if let Some(max) = max_files {
            builder = builder.max_log_files(max);
        }

        Ok(Self {
            name: format!("file:{prefix}"),
            appender: Mutex::new(builder.build(directory)?),
        })
    }
}

impl Sink for RollingFileSink {
    fn name(&self) -> &str {
        &self.name
    }

    fn write(&self, line: &[u8]) -> io::Result<()> {
        lock(&self.appender).write_all(line)
    }

    fn flush(&self) -> io::Result<()> {
        lock(&self.appender).flush()
    }
}
