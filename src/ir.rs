use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer, Serialize};

use crate::theme::Rgba;

/// Box kind as written in a document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceType {
    #[default]
    Resource,
    Group,
    HorizontalStack,
    VerticalStack,
}

/// Per-side override; unset sides keep the kind's default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spacing {
    pub top: Option<i32>,
    pub right: Option<i32>,
    pub bottom: Option<i32>,
    pub left: Option<i32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BorderChildSpec {
    pub position: String,
    pub resource: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSpec {
    #[serde(rename = "type", default)]
    pub kind: ResourceType,
    pub icon: Option<String>,
    pub label: Option<String>,
    pub label_color: Option<Rgba>,
    pub label_font: Option<String>,
    pub border_color: Option<Rgba>,
    pub fill_color: Option<Rgba>,
    pub width: Option<i32>,
    pub height: Option<i32>,
    pub margin: Option<Spacing>,
    pub padding: Option<Spacing>,
    pub direction: Option<String>,
    pub align: Option<String>,
    #[serde(default)]
    pub children: Vec<String>,
    #[serde(default)]
    pub border_children: Vec<BorderChildSpec>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArrowHeadSpec {
    #[serde(default = "default_arrow_width")]
    pub width: String,
    #[serde(default = "default_arrow_length")]
    pub length: i32,
}

fn default_arrow_width() -> String {
    "default".to_string()
}

fn default_arrow_length() -> i32 {
    10
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelsSpec {
    pub source_left: Option<String>,
    pub source_right: Option<String>,
    pub target_left: Option<String>,
    pub target_right: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkSpec {
    pub source: String,
    pub target: String,
    pub source_position: Option<String>,
    pub target_position: Option<String>,
    /// Absent: no head. `null` is accepted and means the same.
    #[serde(default, deserialize_with = "present")]
    pub source_arrow_head: Option<Option<ArrowHeadSpec>>,
    /// Absent: the default head. `null`: no head.
    #[serde(default, deserialize_with = "present")]
    pub target_arrow_head: Option<Option<ArrowHeadSpec>>,
    pub line_width: Option<i32>,
    pub line_color: Option<Rgba>,
    #[serde(rename = "type")]
    pub style: Option<String>,
    #[serde(default)]
    pub labels: LabelsSpec,
}

/// Distinguishes an explicit `null` from a missing key.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// A whole diagram document: named boxes, the root to draw, connectors.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    pub root: String,
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceSpec>,
    #[serde(default)]
    pub links: Vec<LinkSpec>,
}
