//! Text projection of host records.
//!
//! The table mirrors what a tree view with three columns would show: one row
//! per record, columns sized to their widest cell.
//!
//! ```rust
//! use hostview_core::{Record, SortKey, format_table};
//!
//! let table = format_table(&[Record::new("10.0.0.1", "gw", "router")], SortKey::None);
//! assert!(table.starts_with("IP"));
//! ```

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::record::Record;

const HEADERS: [&str; 3] = ["IP", "Name", "Description"];
const COLUMN_GAP: &str = "  ";
const EMPTY_TEXT: &str = "(no records)";

/// Column used to order table rows.
///
/// Sorting is a presentation choice; decoded sequences keep server order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    /// Keep the order the server sent.
    #[default]
    None,
    /// Sort by address.
    Ip,
    /// Sort by host name.
    Name,
    /// Sort by description.
    Description,
}

impl SortKey {
    /// Returns the configuration name of this key.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Ip => "ip",
            Self::Name => "name",
            Self::Description => "description",
        }
    }

    fn column(&self) -> Option<usize> {
        match self {
            Self::None => None,
            Self::Ip => Some(0),
            Self::Name => Some(1),
            Self::Description => Some(2),
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(Self::None),
            "ip" => Ok(Self::Ip),
            "name" => Ok(Self::Name),
            "description" => Ok(Self::Description),
            other => Err(format!(
                "unknown sort key '{other}' (expected none, ip, name or description)"
            )),
        }
    }
}

/// Renders records as an aligned text table.
///
/// Every line ends with a newline and carries no trailing whitespace.
pub fn format_table(records: &[Record], sort: SortKey) -> String {
    let mut rows: Vec<[&str; 3]> = records.iter().map(Record::columns).collect();
    if let Some(column) = sort.column() {
        // Stable sort keeps server order among equal cells.
        rows.sort_by(|a, b| a[column].cmp(b[column]));
    }

    let mut widths = HEADERS.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &HEADERS, &widths);
    let rule = widths.map(|w| "-".repeat(w));
    push_row(&mut out, &rule.each_ref().map(String::as_str), &widths);

    if rows.is_empty() {
        out.push_str(EMPTY_TEXT);
        out.push('\n');
    }
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[&str; 3], widths: &[usize; 3]) {
    let mut line = String::new();
    for (i, (cell, width)) in cells.iter().zip(widths).enumerate() {
        if i > 0 {
            line.push_str(COLUMN_GAP);
        }
        line.push_str(cell);
        let pad = width.saturating_sub(cell.chars().count());
        line.extend(std::iter::repeat_n(' ', pad));
    }
    out.push_str(line.trim_end());
    out.push('\n');
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Vec<Record> {
        vec![
            Record::new("192.168.0.2", "host-b", ""),
            Record::new("192.168.0.1", "host-a", "primary node"),
        ]
    }

    #[test]
    fn table_keeps_server_order() {
        let output = format_table(&sample(), SortKey::None);
        insta::assert_snapshot!(output, @r"
        IP           Name    Description
        -----------  ------  ------------
        192.168.0.2  host-b
        192.168.0.1  host-a  primary node
        ");
    }

    #[test]
    fn table_sorted_by_ip() {
        let output = format_table(&sample(), SortKey::Ip);
        let lines: Vec<&str> = output.lines().collect();
        assert!(lines[2].starts_with("192.168.0.1"));
        assert!(lines[3].starts_with("192.168.0.2"));
    }

    #[test]
    fn empty_table() {
        let output = format_table(&[], SortKey::None);
        insta::assert_snapshot!(output, @r"
        IP  Name  Description
        --  ----  -----------
        (no records)
        ");
    }

    #[test]
    fn no_trailing_whitespace() {
        let output = format_table(&sample(), SortKey::Name);
        assert!(output.lines().all(|l| l == l.trim_end()));
        assert!(output.ends_with('\n'));
    }

    #[test]
    fn sort_key_parsing() {
        assert_eq!("IP".parse::<SortKey>(), Ok(SortKey::Ip));
        assert_eq!("none".parse::<SortKey>(), Ok(SortKey::None));
        assert!("size".parse::<SortKey>().is_err());
        assert_eq!(SortKey::Description.to_string(), "description");
    }
}
