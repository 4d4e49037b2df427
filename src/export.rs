//! YAML/JSONL training-data export.
//!
//! Successful extractions become `TrainingData` records carrying the
//! document text plus provenance metadata (container facts, extraction
//! method, crawl metadata when a mapping file is supplied). Failures go
//! to a separate JSONL log so batch runs stay auditable.

use crate::batch::BatchResult;
use crate::error::Result;
use crate::extract::ExtractResult;
use serde::Serialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

/// One exportable corpus record.
#[derive(Debug, Clone, Serialize)]
pub struct TrainingData {
    /// Original file path
    pub source: String,
    /// Corpus category
    pub category: String,
    /// Document title
    pub title: String,
    /// Extracted text
    pub content: String,
    /// Provenance metadata (`hwp`, `extraction`, `crawl`)
    pub metadata: Value,
}

/// Maps source files to externally collected (crawl) metadata.
///
/// The mapping file is JSONL; records are keyed by `article_id` or
/// `filename`. File names like `133695_0.hwp` look up key `133695`.
#[derive(Debug, Default)]
pub struct MetadataMapper {
    mapping: HashMap<String, Value>,
}

impl MetadataMapper {
    /// Loads a mapper from a JSONL file, skipping unparseable lines.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let mut mapper = Self::default();
        let file = std::fs::File::open(path)?;

        for line in BufReader::new(file).lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<Value>(line) else {
                continue;
            };
            if let Some(key) = Self::make_key(&value) {
                mapper.mapping.insert(key, value);
            }
        }

        Ok(mapper)
    }

    fn make_key(value: &Value) -> Option<String> {
        if let Some(id) = value.get("article_id") {
            return Some(match id {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            });
        }
        value
            .get("filename")
            .and_then(|v| v.as_str())
            .map(|s| s.to_string())
    }

    /// Looks up metadata for a file path.
    pub fn get(&self, filepath: &str) -> Option<&Value> {
        let filename = Path::new(filepath)
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        // "133695_0.hwp" → "133695"
        let base = filename
            .split('_')
            .next()
            .unwrap_or(&filename)
            .split('.')
            .next()
            .unwrap_or(&filename)
            .to_string();

        self.mapping.get(&base).or_else(|| self.mapping.get(&filename))
    }
}

/// Writes extraction results as per-document YAML or batch JSONL.
pub struct YamlExporter {
    output_dir: PathBuf,
    category_detector: Box<dyn Fn(&str) -> String + Send + Sync>,
}

impl YamlExporter {
    /// Creates an exporter, creating the output directory if needed.
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir)?;
        Ok(Self {
            output_dir,
            category_detector: Box::new(default_category),
        })
    }

    /// Replaces the path-based category detector.
    pub fn with_category_detector<F>(mut self, detector: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        self.category_detector = Box::new(detector);
        self
    }

    /// Converts a successful result into a TrainingData record.
    ///
    /// Returns None for failed or empty extractions.
    pub fn training_data(
        &self,
        result: &ExtractResult,
        external: Option<&Value>,
    ) -> Option<TrainingData> {
        let text = result.text.as_deref()?;
        if !result.success || text.is_empty() {
            return None;
        }

        Some(TrainingData {
            source: result.filepath.clone(),
            category: (self.category_detector)(&result.filepath),
            title: extract_title(result, external),
            content: text.to_string(),
            metadata: merge_metadata(result, external),
        })
    }

    /// Writes one result as `<stem>.yaml` in the output directory.
    pub fn export_single(
        &self,
        result: &ExtractResult,
        external: Option<&Value>,
    ) -> Result<Option<PathBuf>> {
        let Some(data) = self.training_data(result, external) else {
            return Ok(None);
        };

        let stem = Path::new(&result.filepath)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| "document".to_string());
        let path = self.output_dir.join(format!("{}.yaml", stem));

        let yaml = serde_yaml::to_string(&data)
            .map_err(|e| crate::error::Error::Corrupt(format!("yaml: {}", e)))?;
        std::fs::write(&path, yaml)?;

        Ok(Some(path))
    }

    /// Writes every successful batch result as a YAML file.
    pub fn export_batch(
        &self,
        batch: &BatchResult,
        mapper: Option<&MetadataMapper>,
    ) -> Result<Vec<PathBuf>> {
        let mut saved = Vec::new();

        for result in &batch.results {
            if !result.success {
                continue;
            }
            let external = mapper.and_then(|m| m.get(&result.filepath));
            if let Some(path) = self.export_single(result, external)? {
                saved.push(path);
            }
        }

        Ok(saved)
    }

    /// Writes successful batch results as JSONL, one record per line.
    pub fn export_batch_jsonl(
        &self,
        batch: &BatchResult,
        output_file: impl AsRef<Path>,
        mapper: Option<&MetadataMapper>,
    ) -> Result<usize> {
        let mut file = std::fs::File::create(output_file)?;
        let mut count = 0;

        for result in &batch.results {
            if !result.success {
                continue;
            }
            let external = mapper.and_then(|m| m.get(&result.filepath));
            if let Some(data) = self.training_data(result, external) {
                serde_json::to_writer(&mut file, &data)
                    .map_err(|e| crate::error::Error::Corrupt(format!("json: {}", e)))?;
                file.write_all(b"\n")?;
                count += 1;
            }
        }

        Ok(count)
    }

    /// Writes a JSONL log of every failed result.
    pub fn export_failed_log(
        &self,
        batch: &BatchResult,
        output_file: impl AsRef<Path>,
    ) -> Result<usize> {
        let mut file = std::fs::File::create(output_file)?;
        let mut count = 0;

        for result in &batch.results {
            if result.success {
                continue;
            }
            let entry = json!({
                "filepath": result.filepath,
                "error": result.error,
                "method": result.method.to_string(),
                "timestamp": result.extracted_at,
            });
            serde_json::to_writer(&mut file, &entry)
                .map_err(|e| crate::error::Error::Corrupt(format!("json: {}", e)))?;
            file.write_all(b"\n")?;
            count += 1;
        }

        Ok(count)
    }
}

/// Path-substring category detection.
fn default_category(filepath: &str) -> String {
    let lower = filepath.to_lowercase();
    if lower.contains("disputes") || lower.contains("분쟁") {
        "disputes".to_string()
    } else if lower.contains("materials") || lower.contains("보도") {
        "materials".to_string()
    } else {
        "unknown".to_string()
    }
}

/// Title preference: external metadata, then file name, then first line.
fn extract_title(result: &ExtractResult, external: Option<&Value>) -> String {
    if let Some(title) = external
        .and_then(|v| v.get("title"))
        .and_then(|v| v.as_str())
    {
        return title.to_string();
    }

    let filename = Path::new(&result.filepath)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let title = filename.replace('_', " ").trim().to_string();

    if title.chars().count() < 5 {
        if let Some(first_line) = result
            .text
            .as_deref()
            .and_then(|t| t.lines().next())
            .map(|l| l.trim())
            .filter(|l| !l.is_empty())
        {
            return first_line.chars().take(100).collect();
        }
    }

    title
}

/// Builds the nested provenance metadata object.
fn merge_metadata(result: &ExtractResult, external: Option<&Value>) -> Value {
    let mut metadata = Map::new();

    if let Some(meta) = &result.metadata {
        metadata.insert(
            "hwp".to_string(),
            json!({
                "version": meta.version,
                "compressed": meta.is_compressed,
                "file_size_bytes": meta.file_size_bytes,
            }),
        );
    }

    metadata.insert(
        "extraction".to_string(),
        json!({
            "method": result.method.to_string(),
            "char_count": result.char_count,
            "extracted_at": result.extracted_at,
        }),
    );

    if let Some(Value::Object(obj)) = external {
        // Body fields stay out; the record already carries the content
        let crawl: Map<String, Value> = obj
            .iter()
            .filter(|(k, _)| !matches!(k.as_str(), "content" | "text" | "body"))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        metadata.insert("crawl".to_string(), Value::Object(crawl));
    }

    Value::Object(metadata)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::Method;

    fn ok_result(filepath: &str, text: &str) -> ExtractResult {
        ExtractResult {
            filepath: filepath.to_string(),
            success: true,
            text: Some(text.to_string()),
            method: Method::Bodytext,
            error: None,
            metadata: None,
            char_count: text.chars().count(),
            extracted_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn failed_result(filepath: &str) -> ExtractResult {
        ExtractResult {
            filepath: filepath.to_string(),
            success: false,
            text: None,
            method: Method::Failed,
            error: Some("not an HWP document: bad magic".to_string()),
            metadata: None,
            char_count: 0,
            extracted_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    fn batch_of(results: Vec<ExtractResult>) -> BatchResult {
        let success = results.iter().filter(|r| r.success).count();
        let failed = results.len() - success;
        BatchResult {
            total: results.len(),
            success,
            failed,
            results,
            started_at: "2026-01-01T00:00:00Z".to_string(),
            finished_at: "2026-01-01T00:00:01Z".to_string(),
            duration_secs: 1.0,
        }
    }

    #[test]
    fn test_default_category() {
        assert_eq!(default_category("/data/disputes/a.hwp"), "disputes");
        assert_eq!(default_category("/data/materials/b.hwp"), "materials");
        assert_eq!(default_category("/data/etc/c.hwp"), "unknown");
    }

    #[test]
    fn test_title_from_filename() {
        let result = ok_result("/data/monthly_report_2026.hwp", "body");
        assert_eq!(extract_title(&result, None), "monthly report 2026");
    }

    #[test]
    fn test_title_falls_back_to_first_line() {
        let result = ok_result("/data/a1.hwp", "보험 분쟁 조정 결정\n본문 내용");
        assert_eq!(extract_title(&result, None), "보험 분쟁 조정 결정");
    }

    #[test]
    fn test_title_prefers_external_metadata() {
        let result = ok_result("/data/a1.hwp", "body");
        let external = json!({"title": "크롤링 제목"});
        assert_eq!(extract_title(&result, Some(&external)), "크롤링 제목");
    }

    #[test]
    fn test_training_data_none_for_failure() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = YamlExporter::new(dir.path().join("out")).unwrap();
        assert!(exporter.training_data(&failed_result("/a.hwp"), None).is_none());
    }

    #[test]
    fn test_crawl_metadata_excludes_body_fields() {
        let result = ok_result("/a.hwp", "body");
        let external = json!({"article_id": "7", "content": "huge body", "date": "2026-01-01"});
        let metadata = merge_metadata(&result, Some(&external));

        let crawl = metadata.get("crawl").unwrap();
        assert!(crawl.get("content").is_none());
        assert_eq!(crawl.get("article_id").unwrap(), "7");
        assert_eq!(metadata["extraction"]["method"], "bodytext");
    }

    #[test]
    fn test_export_jsonl_and_failed_log() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = YamlExporter::new(dir.path().join("out")).unwrap();
        let batch = batch_of(vec![
            ok_result("/data/one.hwp", "first document"),
            failed_result("/data/two.hwp"),
        ]);

        let jsonl = dir.path().join("out/training.jsonl");
        let count = exporter.export_batch_jsonl(&batch, &jsonl, None).unwrap();
        assert_eq!(count, 1);
        let content = std::fs::read_to_string(&jsonl).unwrap();
        let record: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(record["content"], "first document");

        let failed = dir.path().join("out/failed.jsonl");
        let count = exporter.export_failed_log(&batch, &failed).unwrap();
        assert_eq!(count, 1);
        let content = std::fs::read_to_string(&failed).unwrap();
        let entry: Value = serde_json::from_str(content.lines().next().unwrap()).unwrap();
        assert_eq!(entry["filepath"], "/data/two.hwp");
        assert_eq!(entry["method"], "failed");
    }

    #[test]
    fn test_export_single_writes_yaml() {
        let dir = tempfile::tempdir().unwrap();
        let exporter = YamlExporter::new(dir.path().join("out")).unwrap();
        let result = ok_result("/data/doc_42.hwp", "내용");

        let path = exporter.export_single(&result, None).unwrap().unwrap();
        assert!(path.ends_with("doc_42.yaml"));
        let yaml = std::fs::read_to_string(path).unwrap();
        assert!(yaml.contains("content: 내용"));
    }

    #[test]
    fn test_metadata_mapper_lookup() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("meta.jsonl");
        std::fs::write(
            &path,
            concat!(
                "{\"article_id\": \"133695\", \"title\": \"결정문\"}\n",
                "not json\n",
                "{\"filename\": \"plain.hwp\", \"title\": \"보도자료\"}\n",
            ),
        )
        .unwrap();

        let mapper = MetadataMapper::load(&path).unwrap();
        let hit = mapper.get("/data/133695_0.hwp").unwrap();
        assert_eq!(hit["title"], "결정문");
        let by_name = mapper.get("/data/plain.hwp").unwrap();
        assert_eq!(by_name["title"], "보도자료");
        assert!(mapper.get("/data/999.hwp").is_none());
    }
}
