use std::sync::Arc;
use log::info;
use crate::analysis::analyzer::{Analyzer, TextAnalyzer};
use crate::core::config::Config;
use crate::core::error::Result;
use crate::query::ast::Query;
use crate::reader::index_reader::IndexReader;
use crate::search::results::TopDocs;
use crate::search::searcher::Searcher;
use crate::storage::directory::Directory;
use crate::storage::fs_directory::FsDirectory;
use crate::storage::ram_directory::RamDirectory;
use crate::writer::index_writer::IndexWriter;

/// Entry point tying one index location to its analyzer and settings.
///
/// The engine itself holds no index state: writers and readers are opened
/// from it on demand and follow their own lifetimes.
#[derive(Clone)]
pub struct Engine {
    config: Config,
    directory: Arc<dyn Directory>,
    analyzer: Arc<dyn Analyzer>,
}

impl Engine {
    /// Filesystem index at `config.storage_path`, standard analyzer.
    pub fn open(config: Config) -> Result<Self> {
        let directory = Arc::new(FsDirectory::open(config.storage_path.clone())?);
        info!("opened index at {}", config.storage_path.display());
        Ok(Self::with_directory(directory, Arc::new(TextAnalyzer::standard()), config))
    }

    pub fn in_memory() -> Self {
        Self::with_directory(
            Arc::new(RamDirectory::new()),
            Arc::new(TextAnalyzer::standard()),
            Config::default(),
        )
    }

    pub fn with_directory(directory: Arc<dyn Directory>, analyzer: Arc<dyn Analyzer>, config: Config) -> Self {
        Engine {
            config,
            directory,
            analyzer,
        }
    }

    /// Replace the analyzer. Must match whatever built the existing index.
    pub fn with_analyzer(mut self, analyzer: Arc<dyn Analyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn directory(&self) -> &Arc<dyn Directory> {
        &self.directory
    }

    pub fn analyzer(&self) -> &Arc<dyn Analyzer> {
        &self.analyzer
    }

    /// Fails with `LockHeld` while another writer is open.
    pub fn writer(&self) -> Result<IndexWriter> {
        IndexWriter::open(self.directory.clone(), self.analyzer.clone(), self.config.writer_config())
    }

    pub fn reader(&self) -> Result<IndexReader> {
        IndexReader::open(self.directory.clone())
    }

    pub fn searcher<'r>(&'r self, reader: &'r IndexReader) -> Searcher<'r> {
        Searcher::new(reader, self.analyzer.as_ref()).with_id_field(&self.config.id_field)
    }

    /// One-shot search on a fresh reader.
    pub fn search(&self, query: &Query, k: usize) -> Result<TopDocs> {
        let reader = self.reader()?;
        self.searcher(&reader).search(query, k)
    }
}
