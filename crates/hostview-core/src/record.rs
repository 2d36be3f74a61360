//! Host records as delivered by the inventory server.

use serde::{Deserialize, Serialize};

/// One entry of a server response.
///
/// Every field is a plain string. Fields the server omitted are empty rather
/// than absent, so consumers never deal with partial records.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Record {
    /// Host address, usually an IPv4 or IPv6 literal.
    pub ip: String,
    /// Short host name.
    pub name: String,
    /// Free-form description, often empty.
    pub description: String,
}

impl Record {
    /// Creates a record from its three fields.
    pub fn new(
        ip: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self {
            ip: ip.into(),
            name: name.into(),
            description: description.into(),
        }
    }

    /// Returns the field values in column order (ip, name, description).
    pub fn columns(&self) -> [&str; 3] {
        [&self.ip, &self.name, &self.description]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_fields_deserialize_as_empty() {
        let record: Record = serde_json::from_str(r#"{"ip":"10.0.0.1"}"#).unwrap();
        assert_eq!(record, Record::new("10.0.0.1", "", ""));
    }

    #[test]
    fn serializes_all_fields() {
        let record = Record::new("10.0.0.1", "gw", "");
        let json = serde_json::to_string(&record).unwrap();
        assert_eq!(json, r#"{"ip":"10.0.0.1","name":"gw","description":""}"#);
    }

    #[test]
    fn columns_follow_display_order() {
        let record = Record::new("1.2.3.4", "a", "b");
        assert_eq!(record.columns(), ["1.2.3.4", "a", "b"]);
    }
}
