//! The atom's result object, written to the output file on termination.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::SdkResult;
use crate::serde_ext::null_as_default;

/// Output type tag used until quality data is added.
pub const OUTPUT_TYPE_DEFAULT: &str = "default";

/// Output type tag for results that carry quality gate data.
pub const OUTPUT_TYPE_QUALITY: &str = "quality";

/// Logical outcome of the atom.
///
/// Unknown strings are preserved so a result file written by a newer worker
/// round-trips unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Status {
    Success,
    Failure,
    Error,
    Other(String),
}

impl Status {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Success => "success",
            Self::Failure => "failure",
            Self::Error => "error",
            Self::Other(s) => s,
        }
    }
}

impl From<String> for Status {
    fn from(s: String) -> Self {
        match s.as_str() {
            "success" => Self::Success,
            "failure" => Self::Failure,
            "error" => Self::Error,
            _ => Self::Other(s),
        }
    }
}

impl From<&str> for Status {
    fn from(s: &str) -> Self {
        Self::from(s.to_string())
    }
}

impl From<Status> for String {
    fn from(s: Status) -> Self {
        s.as_str().to_string()
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who is to blame for a failed run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorType {
    /// Bad input or configuration from the pipeline user
    User,
    /// A third-party service misbehaved
    ThirdParty,
    /// A defect in the plugin itself
    Plugin,
}

impl ErrorType {
    /// Wire code of the error type.
    pub const fn code(self) -> u8 {
        match self {
            Self::User => 1,
            Self::ThirdParty => 2,
            Self::Plugin => 3,
        }
    }

    pub const fn from_code(code: u8) -> Option<Self> {
        match code {
            1 => Some(Self::User),
            2 => Some(Self::ThirdParty),
            3 => Some(Self::Plugin),
            _ => None,
        }
    }
}

/// `errorType` is an integer on the wire, 0 when unset.
mod error_type_code {
    use super::ErrorType;
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &Option<ErrorType>, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_u8(value.map_or(0, ErrorType::code))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Option<ErrorType>, D::Error> {
        Ok(ErrorType::from_code(u8::deserialize(d)?))
    }
}

/// A single quality gate value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QualityDatum {
    pub value: String,
}

impl QualityDatum {
    pub fn new(value: impl Into<String>) -> Self {
        Self { value: value.into() }
    }
}

impl fmt::Display for QualityDatum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.value)
    }
}

/// Result object accumulated during execution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputResult {
    pub status: Status,
    pub message: String,
    pub error_code: i64,
    #[serde(with = "error_type_code", default)]
    pub error_type: Option<ErrorType>,
    #[serde(rename = "type")]
    pub output_type: String,
    pub data: Map<String, Value>,
    pub quality_data: BTreeMap<String, QualityDatum>,
    pub platform_code: String,
    pub platform_error_code: i64,
}

impl Default for OutputResult {
    fn default() -> Self {
        Self {
            status: Status::Success,
            message: "success".to_string(),
            error_code: 0,
            error_type: None,
            output_type: OUTPUT_TYPE_DEFAULT.to_string(),
            data: Map::new(),
            quality_data: BTreeMap::new(),
            platform_code: String::new(),
            platform_error_code: 0,
        }
    }
}

impl OutputResult {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set an output value. Later writes to the same key win.
    pub fn add_data(&mut self, key: impl Into<String>, value: impl Serialize) -> SdkResult<()> {
        self.data.insert(key.into(), serde_json::to_value(value)?);
        Ok(())
    }

    pub fn get_data(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    pub fn remove_data(&mut self, key: &str) -> Option<Value> {
        self.data.remove(key)
    }

    /// Record a quality gate value and mark the result as quality-bearing.
    pub fn add_quality_data(&mut self, key: impl Into<String>, datum: QualityDatum) {
        self.output_type = OUTPUT_TYPE_QUALITY.to_string();
        self.quality_data.insert(key.into(), datum);
    }

    pub fn get_quality_data(&self, key: &str) -> Option<&QualityDatum> {
        self.quality_data.get(key)
    }

    pub fn remove_quality_data(&mut self, key: &str) -> Option<QualityDatum> {
        self.quality_data.remove(key)
    }

    pub fn set_output_type(&mut self, output_type: impl Into<String>) {
        self.output_type = output_type.into();
    }

    pub fn set_platform_code(&mut self, code: impl Into<String>) {
        self.platform_code = code.into();
    }

    pub fn set_platform_error_code(&mut self, code: i64) {
        self.platform_error_code = code;
    }
}

/// Kind tag of a typed output value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataType {
    String,
    Artifact,
    Report,
}

/// Plain string output variable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StringData {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub value: String,
}

impl StringData {
    pub fn new(value: impl Into<String>) -> Self {
        Self { data_type: DataType::String, value: value.into() }
    }
}

/// Where archived artifacts are stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ArtifactRepo {
    /// The pipeline's own artifact repository
    Pipeline,
    /// A user-chosen directory in the custom repository
    CustomDir,
}

/// Files to archive once the atom finishes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactData {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub value: Vec<String>,
    #[serde(rename = "artifactoryType")]
    pub repo: ArtifactRepo,
    pub path: String,
}

impl Default for ArtifactData {
    fn default() -> Self {
        Self {
            data_type: DataType::Artifact,
            value: Vec::new(),
            repo: ArtifactRepo::Pipeline,
            path: String::new(),
        }
    }
}

impl ArtifactData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Archive a file into the pipeline repository.
    pub fn add_artifact(&mut self, artifact: impl Into<String>) {
        self.value.push(artifact.into());
        self.repo = ArtifactRepo::Pipeline;
    }

    pub fn add_artifacts<I, S>(&mut self, artifacts: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value.extend(artifacts.into_iter().map(Into::into));
        self.repo = ArtifactRepo::Pipeline;
    }

    /// Archive a file into `custom_path` of the custom repository.
    pub fn add_artifact_to_custom_repo(
        &mut self,
        artifact: impl Into<String>,
        custom_path: impl Into<String>,
    ) {
        self.value.push(artifact.into());
        self.repo = ArtifactRepo::CustomDir;
        self.path = custom_path.into();
    }

    pub fn add_artifacts_to_custom_repo<I, S>(&mut self, artifacts: I, custom_path: impl Into<String>)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.value.extend(artifacts.into_iter().map(Into::into));
        self.repo = ArtifactRepo::CustomDir;
        self.path = custom_path.into();
    }
}

/// Checksums of an archived file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FileChecksums {
    #[serde(deserialize_with = "null_as_default")]
    pub sha1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub md5: String,
}

/// Metadata of a file in the artifact repository.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FileDetail {
    #[serde(deserialize_with = "null_as_default")]
    pub name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub full_path: String,
    /// Bytes
    #[serde(deserialize_with = "null_as_default")]
    pub size: f64,
    /// Milliseconds since the epoch
    #[serde(deserialize_with = "null_as_default")]
    pub create_time: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub modified_time: f64,
    #[serde(deserialize_with = "null_as_default")]
    pub checksums: FileChecksums,
    #[serde(deserialize_with = "null_as_default")]
    pub meta: Map<String, Value>,
}

/// Whether a report is a file in the workspace or an external link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ReportType {
    Internal,
    Thirdparty,
}

/// A report shown on the build page.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportData {
    #[serde(rename = "type")]
    pub data_type: DataType,
    pub label: String,
    pub path: String,
    pub url: String,
    pub target: String,
    pub report_type: ReportType,
}

impl ReportData {
    /// Report rendered from `target` inside the workspace directory `path`.
    pub fn internal(
        label: impl Into<String>,
        path: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            data_type: DataType::Report,
            label: label.into(),
            path: path.into(),
            url: String::new(),
            target: target.into(),
            report_type: ReportType::Internal,
        }
    }

    /// Report hosted elsewhere, linked by URL.
    pub fn third_party(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            data_type: DataType::Report,
            label: label.into(),
            path: String::new(),
            url: url.into(),
            target: String::new(),
            report_type: ReportType::Thirdparty,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_defaults() {
        let output = OutputResult::new();
        assert_eq!(output.status, Status::Success);
        assert_eq!(output.message, "success");
        assert_eq!(output.output_type, OUTPUT_TYPE_DEFAULT);
        assert!(output.error_type.is_none());
    }

    #[test]
    fn test_wire_shape() {
        let mut output = OutputResult::new();
        output.error_type = Some(ErrorType::Plugin);
        output.error_code = 2189503;

        let value = serde_json::to_value(&output).unwrap();
        assert_eq!(value["status"], "success");
        assert_eq!(value["errorType"], 3);
        assert_eq!(value["errorCode"], 2189503);
        assert_eq!(value["type"], "default");
        assert_eq!(value["platformErrorCode"], 0);
        assert!(value["qualityData"].as_object().unwrap().is_empty());
    }

    #[test]
    fn test_data_and_quality_round_trip() {
        let mut output = OutputResult::new();
        output.add_data("k1", "v1").unwrap();
        output.add_quality_data("q1", QualityDatum::new("5"));

        let text = serde_json::to_string(&output).unwrap();
        let parsed: OutputResult = serde_json::from_str(&text).unwrap();

        assert_eq!(parsed.data.get("k1"), Some(&json!("v1")));
        assert_eq!(parsed.data.len(), 1);
        assert_eq!(parsed.get_quality_data("q1"), Some(&QualityDatum::new("5")));
        assert_eq!(parsed.quality_data.len(), 1);
        assert_eq!(parsed.output_type, OUTPUT_TYPE_QUALITY);
    }

    #[test]
    fn test_last_write_wins_and_remove() {
        let mut output = OutputResult::new();
        output.add_data("k", 1).unwrap();
        output.add_data("k", StringData::new("two")).unwrap();
        assert_eq!(output.get_data("k"), Some(&json!({"type": "string", "value": "two"})));

        assert!(output.remove_data("k").is_some());
        assert!(output.get_data("k").is_none());

        output.add_quality_data("q", QualityDatum::new("1"));
        assert_eq!(output.remove_quality_data("q").map(|d| d.value), Some("1".to_string()));
        assert!(output.get_quality_data("q").is_none());
    }

    #[test]
    fn test_unknown_status_round_trips() {
        let status: Status = serde_json::from_str("\"cancelled\"").unwrap();
        assert_eq!(status, Status::Other("cancelled".into()));
        assert_eq!(serde_json::to_string(&status).unwrap(), "\"cancelled\"");
        assert_eq!(Status::from("failure"), Status::Failure);
    }

    #[test]
    fn test_artifact_data() {
        let mut artifacts = ArtifactData::new();
        artifacts.add_artifact("dist/app.tar.gz");
        artifacts.add_artifacts(["a.log", "b.log"]);
        assert_eq!(artifacts.value.len(), 3);
        assert_eq!(artifacts.repo, ArtifactRepo::Pipeline);

        artifacts.add_artifact_to_custom_repo("c.bin", "/releases");
        let value = serde_json::to_value(&artifacts).unwrap();
        assert_eq!(value["type"], "artifact");
        assert_eq!(value["artifactoryType"], "CUSTOM_DIR");
        assert_eq!(value["path"], "/releases");
    }

    #[test]
    fn test_file_detail() {
        let detail: FileDetail = serde_json::from_value(json!({
            "name": "app.tar.gz",
            "fullName": "dist/app.tar.gz",
            "fullPath": "/p-1/b-1/dist/app.tar.gz",
            "size": 2048.0,
            "createTime": 1700000000000.0,
            "modifiedTime": null,
            "checksums": {"sha1": "da39a3ee", "md5": null},
            "meta": {"owner": "ci"}
        }))
        .unwrap();

        assert_eq!(detail.full_name, "dist/app.tar.gz");
        assert_eq!(detail.size, 2048.0);
        assert_eq!(detail.modified_time, 0.0);
        assert_eq!(detail.checksums, FileChecksums { sha1: "da39a3ee".into(), md5: String::new() });
        assert_eq!(detail.meta["owner"], "ci");

        let value = serde_json::to_value(&detail).unwrap();
        assert_eq!(value["fullPath"], "/p-1/b-1/dist/app.tar.gz");
    }

    #[test]
    fn test_report_data() {
        let report = ReportData::internal("Coverage", "reports/", "index.html");
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["type"], "report");
        assert_eq!(value["reportType"], "INTERNAL");
        assert_eq!(value["target"], "index.html");

        let link = ReportData::third_party("Dashboard", "https://dash.example.com");
        assert_eq!(link.report_type, ReportType::Thirdparty);
        assert!(link.path.is_empty());
    }

    #[test]
    fn test_platform_codes() {
        let mut output = OutputResult::new();
        output.set_platform_code("sonar");
        output.set_platform_error_code(42);
        output.set_output_type("custom");
        assert_eq!(output.platform_code, "sonar");
        assert_eq!(output.platform_error_code, 42);
        assert_eq!(output.output_type, "custom");
    }
}
