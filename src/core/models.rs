use std::collections::BTreeMap;

use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value, json};

use crate::errors::DatasourceError;

/// One column of a caller-declared schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub length: Option<u32>,
    #[serde(default)]
    pub null: bool,
}

impl FieldSpec {
    pub fn new(name: &str, kind: &str) -> Self {
        Self {
            name: name.to_string(),
            kind: kind.to_string(),
            length: None,
            null: false,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Schema(pub Vec<FieldSpec>);

impl Schema {
    /// The columns every received message exposes.
    pub fn message() -> Self {
        Self(vec![
            FieldSpec::new("body", "text"),
            FieldSpec::new("message_id", "string"),
            FieldSpec::new("receipt_handle", "string"),
        ])
    }
}

/// The ORM model a datasource call is made on behalf of.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Model {
    pub alias: String,
    pub schema: Schema,
}

impl Model {
    pub fn new(alias: &str, schema: Schema) -> Self {
        Self {
            alias: alias.to_string(),
            schema,
        }
    }
}

/// Ordered field/value pairs that become a single message body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a field, replacing an earlier value with the same name in place.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name.to_string(), value)),
        }
    }

    /// Pair parallel field and value lists by position.
    ///
    /// # Errors
    ///
    /// Returns `FieldCountMismatch` if the lists differ in length.
    pub fn from_columns<S: AsRef<str>>(
        fields: &[S],
        values: &[Value],
    ) -> Result<Self, DatasourceError> {
        if fields.len() != values.len() {
            return Err(DatasourceError::FieldCountMismatch {
                fields: fields.len(),
                values: values.len(),
            });
        }

        let mut record = Self::new();
        for (field, value) in fields.iter().zip(values) {
            record.set(field.as_ref(), value.clone());
        }
        Ok(record)
    }

    /// Rebuild a record from a JSON object message body.
    ///
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object.
    pub fn from_payload(body: &str) -> Result<Self, DatasourceError> {
        let object: Map<String, Value> = serde_json::from_str(body)
            .map_err(|e| DatasourceError::ParseError(format!("message body: {e}")))?;
        Ok(Self {
            fields: object.into_iter().collect(),
        })
    }

    /// # Errors
    ///
    /// Returns `SerializationError` if the record cannot be rendered as JSON text.
    pub fn to_payload(&self) -> Result<String, DatasourceError> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl Serialize for Record {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// A received message presented as a table row.
///
/// `receipt_handle` identifies this particular delivery and is what
/// deletion needs; it changes every time the message is redelivered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PseudoRow {
    pub body: String,
    pub message_id: String,
    pub receipt_handle: String,
}

impl PseudoRow {
    /// # Errors
    ///
    /// Returns an error if the body is not a JSON object.
    pub fn record(&self) -> Result<Record, DatasourceError> {
        Record::from_payload(&self.body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasedRow {
    pub alias: String,
    pub row: PseudoRow,
}

/// Delete/update conditions, keyed either `Alias.field` or `field`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Conditions(BTreeMap<String, Value>);

impl Conditions {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    /// Look up a non-empty scalar for `field`, preferring the alias-qualified key.
    ///
    /// `""`, `"0"` and numeric zero count as absent.
    pub fn value_for(&self, alias: &str, field: &str) -> Option<String> {
        let qualified = format!("{alias}.{field}");
        [qualified.as_str(), field]
            .into_iter()
            .filter_map(|key| self.0.get(key))
            .find_map(|value| match value {
                Value::String(s) if !s.is_empty() && s != "0" => Some(s.clone()),
                Value::Number(n) if n.as_f64() != Some(0.0) => Some(n.to_string()),
                _ => None,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<BTreeMap<String, Value>> for Conditions {
    fn from(map: BTreeMap<String, Value>) -> Self {
        Self(map)
    }
}

/// What a read should do, decided before the datasource is called.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    FetchMessages { limit: Option<u32> },
    MeasureDepth,
}

/// Field selection as the ORM expresses it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fields {
    #[default]
    All,
    List(Vec<String>),
    Count,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryOptions {
    pub fields: Fields,
    pub limit: Option<u32>,
}

impl From<QueryOptions> for Query {
    fn from(options: QueryOptions) -> Self {
        match options.fields {
            Fields::Count => Query::MeasureDepth,
            // A zero limit means "not set", same as leaving it out.
            Fields::All | Fields::List(_) => Query::FetchMessages {
                limit: options.limit.filter(|l| *l > 0),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadResult {
    Rows(Vec<AliasedRow>),
    Count(u64),
}

impl ReadResult {
    /// Render in the ORM's nested result shape.
    ///
    /// Rows become `[{"Alias": {..}}, ..]`; a depth measurement becomes
    /// `[[{"count": n}]]`.
    pub fn to_json(&self) -> Value {
        match self {
            ReadResult::Count(count) => json!([[{ "count": count }]]),
            ReadResult::Rows(rows) => Value::Array(
                rows.iter()
                    .map(|r| {
                        let mut keyed = Map::new();
                        keyed.insert(r.alias.clone(), json!(r.row));
                        Value::Object(keyed)
                    })
                    .collect(),
            ),
        }
    }

    pub fn rows(&self) -> &[AliasedRow] {
        match self {
            ReadResult::Rows(rows) => rows,
            ReadResult::Count(_) => &[],
        }
    }

    pub fn count(&self) -> Option<u64> {
        match self {
            ReadResult::Count(count) => Some(*count),
            ReadResult::Rows(_) => None,
        }
    }
}
