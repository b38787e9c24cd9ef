//! Persistence for analysis result documents.
//!
//! A single JSON file holds an array of documents; integer `_id`s are
//! assigned on insert. The file is rewritten atomically (temp + rename).

use std::path::{Path, PathBuf};

use crate::error::{AnalysisError, Result};
use crate::report::AnalysisResult;

/// 解析結果の永続化先
pub trait AnalysisStore {
    /// ドキュメントを保存してidを返す
    fn insert(&mut self, result: &AnalysisResult) -> Result<u64>;
}

/// JSONファイル1つに配列で追記していくストア
pub struct JsonFileStore {
    path: PathBuf,
}

impl JsonFileStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load_documents(&self) -> Result<Vec<AnalysisResult>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .map_err(|e| AnalysisError::OutputWrite(format!("read {}: {}", self.path.display(), e)))?;
        if content.trim().is_empty() {
            return Ok(Vec::new());
        }
        serde_json::from_str(&content)
            .map_err(|e| AnalysisError::OutputWrite(format!("parse {}: {}", self.path.display(), e)))
    }
}

impl AnalysisStore for JsonFileStore {
    fn insert(&mut self, result: &AnalysisResult) -> Result<u64> {
        let mut documents = self.load_documents()?;
        let id = documents
            .iter()
            .filter_map(|d| d.id)
            .max()
            .map_or(1, |max| max + 1);

        let mut document = result.clone();
        document.id = Some(id);
        documents.push(document);

        let json = serde_json::to_string_pretty(&documents)
            .map_err(|e| AnalysisError::OutputWrite(e.to_string()))?;

        let temp = self.path.with_extension("json.tmp");
        std::fs::write(&temp, json)
            .map_err(|e| AnalysisError::OutputWrite(format!("write {}: {}", temp.display(), e)))?;
        std::fs::rename(&temp, &self.path).map_err(|e| {
            let _ = std::fs::remove_file(&temp);
            AnalysisError::OutputWrite(format!("rename {}: {}", self.path.display(), e))
        })?;

        Ok(id)
    }
}

/// テスト用インメモリストア
#[derive(Default)]
pub struct MemoryStore {
    pub documents: Vec<AnalysisResult>,
}

impl AnalysisStore for MemoryStore {
    fn insert(&mut self, result: &AnalysisResult) -> Result<u64> {
        let id = self.documents.len() as u64 + 1;
        let mut document = result.clone();
        document.id = Some(id);
        self.documents.push(document);
        Ok(id)
    }
}
