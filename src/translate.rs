//! Translation of bibliographic works into Notion page-creation payloads.
//!
//! A [`PropertyMapping`] says, for each column of the target database, which
//! work field feeds it and what Notion property type the column has.
//!
//! This is library API for clients that hold [`Work`] records: the relay's
//! HTTP surface accepts ready-made page bodies, and [`translate_work`] is how
//! such a body is produced before it is handed to
//! [`upload_works`](crate::upload::upload_works).
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::collections::BTreeMap;

use crate::model::UploadItem;

/// Notion rejects rich text content longer than this.
pub const MAX_TEXT_LEN: usize = 2000;
const MAX_FILE_NAME_LEN: usize = 100;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Work {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subtitle: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub authors: Vec<Author>,
    #[serde(rename = "abstract", default, skip_serializing_if = "Option::is_none")]
    pub abstract_text: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub subjects: Vec<String>,
    #[serde(rename = "DOI", default, skip_serializing_if = "Option::is_none")]
    pub doi: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub platform_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub author_comments: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publish_info: Option<PublishInfo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referenced_by_count: Option<i64>,
    /// Crossref work type, e.g. `journal-article`.
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub work_type: Option<String>,
    #[serde(rename = "ISBN", default, skip_serializing_if = "Vec::is_empty")]
    pub isbn: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub digital_resources: Vec<DigitalResource>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub clinical_trial: Vec<ClinicalTrial>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub references: Vec<Work>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Author {
    #[serde(default)]
    pub family_name: Option<String>,
    #[serde(default)]
    pub given_name: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(rename = "ORCID", default)]
    pub orcid: Option<String>,
}

impl Author {
    pub fn display_name(&self) -> Option<String> {
        if let Some(full) = self.full_name.as_deref().filter(|n| !n.trim().is_empty()) {
            return Some(full.to_string());
        }
        let parts: Vec<&str> = [self.given_name.as_deref(), self.family_name.as_deref()]
            .into_iter()
            .flatten()
            .filter(|p| !p.trim().is_empty())
            .collect();
        (!parts.is_empty()).then(|| parts.join(" "))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublishInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub publisher: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub container_title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub issue: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pages: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<u32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DigitalResource {
    pub url: String,
    #[serde(default)]
    pub content_type: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ClinicalTrial {
    pub id: String,
    pub registry: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PropertyType {
    Title,
    RichText,
    Select,
    Status,
    MultiSelect,
    Url,
    Checkbox,
    Number,
    Date,
    Files,
}

impl PropertyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PropertyType::Title => "title",
            PropertyType::RichText => "rich_text",
            PropertyType::Select => "select",
            PropertyType::Status => "status",
            PropertyType::MultiSelect => "multi_select",
            PropertyType::Url => "url",
            PropertyType::Checkbox => "checkbox",
            PropertyType::Number => "number",
            PropertyType::Date => "date",
            PropertyType::Files => "files",
        }
    }

    /// Column types a work field can reasonably be written into.
    pub fn is_compatible(&self) -> bool {
        !matches!(self, PropertyType::Status | PropertyType::Checkbox)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapping {
    /// Work field name (camelCase), or one of the derived fields `date`,
    /// `resourceLink`, `publisher`, `containerTitle`, `pages`, `volume`,
    /// `issue`, `year`.
    pub work_field: String,
    pub property_type: PropertyType,
}

/// Database column name -> source field.
pub type PropertyMapping = BTreeMap<String, FieldMapping>;

/// Build the page-creation payload for `work` in `database_id`. Columns whose
/// source value is missing or cannot be expressed in the column type are left
/// out.
pub fn translate_work(mapping: &PropertyMapping, work: &Work, database_id: &str) -> UploadItem {
    let raw = serde_json::to_value(work).unwrap_or(Value::Null);
    let mut properties = Map::new();

    for (column, field) in mapping {
        let Some(source) = field_value(work, &raw, &field.work_field) else {
            continue;
        };
        if let Some(value) = property_value(field.property_type, source, work) {
            properties.insert(column.clone(), value);
        }
    }

    let mut body = Map::new();
    body.insert("parent".into(), json!({ "database_id": database_id }));
    body.insert("properties".into(), Value::Object(properties));
    UploadItem::new(body)
}

fn field_value(work: &Work, raw: &Value, name: &str) -> Option<Value> {
    let info = work.publish_info.as_ref();
    match name {
        "date" => publication_date(work).map(Value::String),
        "publisher" => info.and_then(|i| i.publisher.clone()).map(Value::String),
        "containerTitle" => info.and_then(|i| i.container_title.clone()).map(Value::String),
        "pages" => info.and_then(|i| i.pages.clone()).map(Value::String),
        "volume" => info.and_then(|i| i.volume.clone()).map(Value::String),
        "issue" => info.and_then(|i| i.issue.clone()).map(Value::String),
        "year" => info.and_then(|i| i.year).map(Value::from),
        "resourceLink" => work
            .digital_resources
            .first()
            .map(|r| Value::String(r.url.clone())),
        "authors" => {
            let names: Vec<Value> = work
                .authors
                .iter()
                .filter_map(Author::display_name)
                .map(Value::String)
                .collect();
            (!names.is_empty()).then_some(Value::Array(names))
        }
        other => raw.get(other).filter(|v| !v.is_null()).cloned(),
    }
}

/// `YYYY-MM-DD` from the publish info; month and day default to 1.
fn publication_date(work: &Work) -> Option<String> {
    let info = work.publish_info.as_ref()?;
    let year = info.year?;
    let month = info.month.filter(|m| *m > 0).unwrap_or(1);
    let day = info.day.filter(|d| *d > 0).unwrap_or(1);
    NaiveDate::from_ymd_opt(year, month, day).map(|d| d.format("%Y-%m-%d").to_string())
}

fn property_value(kind: PropertyType, source: Value, work: &Work) -> Option<Value> {
    let key = kind.as_str();
    let source = match source {
        Value::String(s) => Value::String(truncate(&s, MAX_TEXT_LEN)),
        other => other,
    };

    match kind {
        PropertyType::Title | PropertyType::RichText => {
            let text = match &source {
                Value::String(s) => s.clone(),
                Value::Number(n) => n.to_string(),
                Value::Array(items) if items.iter().all(Value::is_string) => {
                    let joined = items
                        .iter()
                        .filter_map(Value::as_str)
                        .collect::<Vec<_>>()
                        .join(";\n");
                    truncate(&joined, MAX_TEXT_LEN)
                }
                _ => return None,
            };
            (!text.is_empty()).then(|| json!({ key: [{ "text": { "content": text } }] }))
        }
        PropertyType::Select | PropertyType::Status => {
            let name = scalar_text(&source)?;
            Some(json!({ key: { "name": name } }))
        }
        PropertyType::MultiSelect => {
            let names: Vec<Value> = source
                .as_array()?
                .iter()
                .filter_map(scalar_text)
                .map(|name| json!({ "name": name }))
                .collect();
            Some(json!({ key: names }))
        }
        PropertyType::Url | PropertyType::Checkbox => Some(json!({ key: source })),
        PropertyType::Number => {
            let number = match &source {
                Value::Number(n) => n.as_f64()?,
                Value::String(s) => s.trim().parse::<f64>().ok()?,
                _ => return None,
            };
            Some(json!({ key: number }))
        }
        PropertyType::Date => {
            let start = source.as_str()?;
            Some(json!({ key: { "start": start } }))
        }
        PropertyType::Files => {
            let url = source.as_str()?;
            let name = truncate(work.title.as_deref().unwrap_or(url), MAX_FILE_NAME_LEN);
            Some(json!({ key: [{ "name": name, "external": { "url": url } }] }))
        }
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn truncate(s: &str, max_chars: usize) -> String {
    s.chars().take(max_chars).collect()
}
