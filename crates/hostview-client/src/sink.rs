//! Presentation of snapshots, status lines and faults.

use std::io::Write;

use chrono::Local;
use serde::Serialize;
use tracing::warn;

use hostview_core::{Record, SortKey, format_table};

/// Receives everything the runners want shown to the user.
pub trait OutputSink {
    /// A fresh snapshot, replacing the previous one.
    fn on_records(&mut self, records: &[Record]);
    /// A connection status change.
    fn on_status(&mut self, status: &str);
    /// A transport failure.
    fn on_fault(&mut self, reason: &str);
}

impl<S: OutputSink + ?Sized> OutputSink for Box<S> {
    fn on_records(&mut self, records: &[Record]) {
        (**self).on_records(records);
    }

    fn on_status(&mut self, status: &str) {
        (**self).on_status(status);
    }

    fn on_fault(&mut self, reason: &str) {
        (**self).on_fault(reason);
    }
}

/// Aligned text table per snapshot; timestamped status and fault lines.
pub struct TableSink<W> {
    out: W,
    sort: SortKey,
    timestamps: bool,
}

impl<W: Write> TableSink<W> {
    pub fn new(out: W, sort: SortKey) -> Self {
        Self {
            out,
            sort,
            timestamps: true,
        }
    }

    /// Builder: omit the local time prefix on status and fault lines.
    pub fn without_timestamps(mut self) -> Self {
        self.timestamps = false;
        self
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_line(&mut self, text: &str) {
        let result = if self.timestamps {
            writeln!(self.out, "[{}] {}", Local::now().format("%H:%M:%S"), text)
        } else {
            writeln!(self.out, "{text}")
        };
        if let Err(e) = result.and_then(|()| self.out.flush()) {
            warn!(error = %e, "failed to write output");
        }
    }
}

impl<W: Write> OutputSink for TableSink<W> {
    fn on_records(&mut self, records: &[Record]) {
        let table = format_table(records, self.sort);
        if let Err(e) = self
            .out
            .write_all(table.as_bytes())
            .and_then(|()| self.out.flush())
        {
            warn!(error = %e, "failed to write output");
        }
    }

    fn on_status(&mut self, status: &str) {
        self.write_line(status);
    }

    fn on_fault(&mut self, reason: &str) {
        self.write_line(&format!("error: {reason}"));
    }
}

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum Message<'a> {
    Records { records: &'a [Record] },
    Status { message: &'a str },
    Fault { message: &'a str },
}

/// One JSON object per line, for scripts.
pub struct JsonSink<W> {
    out: W,
}

impl<W: Write> JsonSink<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, message: &Message<'_>) {
        let result = serde_json::to_writer(&mut self.out, message)
            .map_err(std::io::Error::from)
            .and_then(|()| writeln!(self.out))
            .and_then(|()| self.out.flush());
        if let Err(e) = result {
            warn!(error = %e, "failed to write output");
        }
    }
}

impl<W: Write> OutputSink for JsonSink<W> {
    fn on_records(&mut self, records: &[Record]) {
        self.emit(&Message::Records { records });
    }

    fn on_status(&mut self, status: &str) {
        self.emit(&Message::Status { message: status });
    }

    fn on_fault(&mut self, reason: &str) {
        self.emit(&Message::Fault { message: reason });
    }
}
