//! Typed findings produced from raw detector records.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Detector impact. Labels outside the five known buckets are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Impact {
    High,
    Medium,
    Low,
    Informational,
    Optimization,
    Unknown,
    Other(String),
}

impl Impact {
    /// Buckets counted in the summary, in reporting order
    pub const BUCKETS: [Impact; 5] = [
        Impact::High,
        Impact::Medium,
        Impact::Low,
        Impact::Informational,
        Impact::Optimization,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Impact::High => "High",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
            Impact::Informational => "Informational",
            Impact::Optimization => "Optimization",
            Impact::Unknown => "Unknown",
            Impact::Other(label) => label,
        }
    }

    /// Severity label shared with the rest of an audit report
    pub fn unified_severity(&self) -> &'static str {
        match self {
            Impact::High => "Critical",
            Impact::Medium => "Medium",
            Impact::Low => "Low",
            Impact::Informational => "Informational",
            Impact::Optimization => "Gas Optimization",
            Impact::Unknown | Impact::Other(_) => "Unknown",
        }
    }
}

// Exact, case-sensitive match; "high" is not High
impl From<String> for Impact {
    fn from(label: String) -> Self {
        match label.as_str() {
            "High" => Impact::High,
            "Medium" => Impact::Medium,
            "Low" => Impact::Low,
            "Informational" => Impact::Informational,
            "Optimization" => Impact::Optimization,
            "Unknown" => Impact::Unknown,
            _ => Impact::Other(label),
        }
    }
}

impl From<Impact> for String {
    fn from(impact: Impact) -> Self {
        impact.as_str().to_string()
    }
}

impl fmt::Display for Impact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Confidence {
    High,
    Medium,
    Low,
    Unknown,
    Other(String),
}

impl Confidence {
    pub fn as_str(&self) -> &str {
        match self {
            Confidence::High => "High",
            Confidence::Medium => "Medium",
            Confidence::Low => "Low",
            Confidence::Unknown => "Unknown",
            Confidence::Other(label) => label,
        }
    }
}

impl From<String> for Confidence {
    fn from(label: String) -> Self {
        match label.as_str() {
            "High" => Confidence::High,
            "Medium" => Confidence::Medium,
            "Low" => Confidence::Low,
            "Unknown" => Confidence::Unknown,
            _ => Confidence::Other(label),
        }
    }
}

impl From<Confidence> for String {
    fn from(confidence: Confidence) -> Self {
        confidence.as_str().to_string()
    }
}

/// One reported issue instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub check: String,
    pub impact: Impact,
    pub confidence: Confidence,
    pub description: String,
    #[serde(default)]
    pub markdown: String,
    #[serde(default)]
    pub first_markdown_element: String,
    /// Engine-specific element records, passed through untouched
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub swc_id: Option<String>,
}

impl Finding {
    /// Build a finding from one raw detector record, defaulting whatever is missing
    pub fn from_detector(record: &Value) -> Self {
        let text = |key: &str| record.get(key).and_then(Value::as_str);

        let check = text("check").unwrap_or("unknown").to_string();
        let swc_id = swc_for_check(&check).map(str::to_string);

        Self {
            impact: Impact::from(text("impact").unwrap_or("Unknown").to_string()),
            confidence: Confidence::from(text("confidence").unwrap_or("Unknown").to_string()),
            description: text("description").unwrap_or_default().to_string(),
            markdown: text("markdown").unwrap_or_default().to_string(),
            first_markdown_element: text("first_markdown_element")
                .unwrap_or_default()
                .to_string(),
            elements: record
                .get("elements")
                .and_then(Value::as_array)
                .cloned()
                .unwrap_or_default(),
            id: text("id").map(str::to_string),
            check,
            swc_id,
        }
    }

    /// `file (lines a-b)` locations of elements that carry a source mapping
    pub fn locations(&self) -> Vec<(String, u64, u64)> {
        self.elements
            .iter()
            .filter_map(|element| {
                let mapping = element.get("source_mapping")?;
                let file = mapping.get("filename_relative")?.as_str()?;
                let lines = mapping.get("lines")?.as_array()?;
                let first = lines.first()?.as_u64()?;
                let last = lines.last()?.as_u64()?;
                Some((file.to_string(), first, last))
            })
            .collect()
    }
}

// Detector check name -> SWC registry id
const SWC_TABLE: &[(&str, &str)] = &[
    ("reentrancy-eth", "SWC-107"),
    ("reentrancy-no-eth", "SWC-107"),
    ("reentrancy-benign", "SWC-107"),
    ("reentrancy-events", "SWC-107"),
    ("unchecked-lowlevel", "SWC-104"),
    ("unchecked-send", "SWC-104"),
    ("unprotected-upgrade", "SWC-105"),
    ("suicidal", "SWC-106"),
    ("tx-origin", "SWC-115"),
    ("uninitialized-storage", "SWC-109"),
    ("uninitialized-state", "SWC-109"),
    ("uninitialized-local", "SWC-109"),
    ("timestamp", "SWC-116"),
    ("shadowing-state", "SWC-119"),
    ("shadowing-local", "SWC-119"),
    ("controlled-delegatecall", "SWC-112"),
    ("arbitrary-send-erc20", "SWC-105"),
    ("arbitrary-send-eth", "SWC-105"),
    ("locked-ether", "SWC-132"),
    ("incorrect-equality", "SWC-132"),
    ("write-after-write", "SWC-110"),
];

pub fn swc_for_check(check: &str) -> Option<&'static str> {
    SWC_TABLE
        .iter()
        .find(|(name, _)| *name == check)
        .map(|(_, swc)| *swc)
}
