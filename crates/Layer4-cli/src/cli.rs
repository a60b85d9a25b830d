//! Command implementations

use crate::output;
use anyhow::Context;
use linesmith_core::{
    payload_from_link, ChainSerializer, ChainStore, DecodeOutcome, SaveMode, ToolRegistry,
};
use linesmith_foundation::{DecodePolicy, LinesmithConfig, MemoryKv, SqliteKv};
use linesmith_workspace::{LoggingListener, Workspace};
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// 명령 실행 컨텍스트
pub struct App {
    config: LinesmithConfig,
    registry: Arc<ToolRegistry>,
}

impl App {
    pub fn new(data_dir: Option<PathBuf>, strict: bool) -> Self {
        let mut config = LinesmithConfig::load().unwrap_or_else(|e| {
            warn!("Failed to load config: {}", e);
            LinesmithConfig::default()
        });
        if let Some(dir) = data_dir {
            config = config.data_dir(dir);
        }
        if strict {
            config = config.decode_policy(DecodePolicy::Strict);
        }

        Self {
            config,
            registry: Arc::new(ToolRegistry::with_builtins()),
        }
    }

    fn serializer(&self) -> ChainSerializer {
        ChainSerializer::new(self.registry.clone()).with_policy(self.config.evaluation.decode_policy)
    }

    fn open_store(&self) -> anyhow::Result<ChainStore> {
        let dir = self.config.storage.resolve_data_dir();
        debug!("Opening chain store in {}", dir.display());
        let kv = SqliteKv::new(&dir)
            .with_context(|| format!("Failed to open chain store in {}", dir.display()))?;
        Ok(ChainStore::new(Arc::new(kv), self.serializer()))
    }

    fn workspace(&self, store: ChainStore) -> Workspace {
        Workspace::new(self.registry.clone(), store, &self.config).with_listener(LoggingListener)
    }

    /// `--chain` 인자 → 페이로드 텍스트 (`@file`, 링크, 페이로드, JSON)
    fn chain_arg(&self, arg: &str) -> anyhow::Result<String> {
        let text = match arg.strip_prefix('@') {
            Some(path) => read_input(Path::new(path))?,
            None => arg.to_string(),
        };
        Ok(payload_from_link(&text, &self.config.share.param).unwrap_or(text))
    }

    fn decode_chain(&self, arg: &str) -> anyhow::Result<DecodeOutcome> {
        let payload = self.chain_arg(arg)?;
        let outcome = self
            .serializer()
            .decode(&payload)
            .context("Failed to decode chain")?;
        report_skipped(&outcome);
        Ok(outcome)
    }

    // ========================================================================
    // Commands
    // ========================================================================

    pub fn tools(&self, json: bool) -> anyhow::Result<()> {
        if json {
            println!("{}", serde_json::to_string_pretty(self.registry.list())?);
        } else {
            print!("{}", output::format_tools(&self.registry));
        }
        Ok(())
    }

    pub fn run(
        &self,
        chain: &str,
        source: Option<&Path>,
        stages: bool,
        json: bool,
    ) -> anyhow::Result<()> {
        let payload = self.chain_arg(chain)?;
        let scratch = ChainStore::new(Arc::new(MemoryKv::new()), self.serializer());
        let mut ws = self.workspace(scratch);

        let outcome = ws.load_payload(&payload).context("Failed to load chain")?;
        report_skipped(&outcome);

        if let Some(path) = source {
            let text = read_input(path)?;
            ws.edit_source_at(strip_final_newline(text), Instant::now());
            ws.flush();
        }

        let result = ws.result();
        if json {
            println!("{}", serde_json::to_string_pretty(result)?);
        } else if stages {
            print!("{}", output::format_stages(result));
        } else {
            println!("{}", result.final_output);
            for (index, block) in result.blocks.iter().enumerate() {
                if let Some(error) = &block.error {
                    eprintln!("✗ [{}] {}: {}", index + 1, block.tool_id, error);
                }
            }
        }
        Ok(())
    }

    pub fn encode(&self, file: &Path) -> anyhow::Result<()> {
        let json = read_input(file)?;
        let outcome = self.decode_chain(&json)?;
        println!("{}", self.serializer().encode(&outcome.chain)?);
        Ok(())
    }

    pub fn decode(&self, payload: &str) -> anyhow::Result<()> {
        let outcome = self.decode_chain(payload)?;
        println!("{}", self.serializer().to_json(&outcome.chain)?);
        Ok(())
    }

    pub fn save(&self, name: &str, chain: &str, create_only: bool) -> anyhow::Result<()> {
        let outcome = self.decode_chain(chain)?;
        let mode = if create_only {
            SaveMode::CreateOnly
        } else {
            SaveMode::Upsert
        };
        let entry = self.open_store()?.save(name, &outcome.chain, mode)?;
        println!("✓ Saved '{}'", entry.name);
        Ok(())
    }

    pub fn list(&self) -> anyhow::Result<()> {
        let saved = self.open_store()?.list()?;
        print!("{}", output::format_saved(&saved));
        Ok(())
    }

    pub fn show(&self, name: &str) -> anyhow::Result<()> {
        let chain = self.open_store()?.load(name)?;
        println!("{}", self.serializer().to_json(&chain)?);
        Ok(())
    }

    pub fn rename(&self, old: &str, new: &str) -> anyhow::Result<()> {
        let entry = self.open_store()?.rename(old, new)?;
        println!("✓ Renamed '{}' -> '{}'", old.trim(), entry.name);
        Ok(())
    }

    pub fn delete(&self, name: &str) -> anyhow::Result<()> {
        self.open_store()?.delete(name)?;
        println!("✓ Deleted '{}'", name.trim());
        Ok(())
    }

    pub fn share(&self, name: &str) -> anyhow::Result<()> {
        let mut ws = self.workspace(self.open_store()?);
        ws.load_saved(name)?;
        println!("{}", ws.share_link()?);
        Ok(())
    }
}

fn report_skipped(outcome: &DecodeOutcome) {
    for tool_id in &outcome.skipped {
        eprintln!("warning: skipped unknown tool '{}'", tool_id);
    }
}

/// 파일 또는 stdin (`-`)
fn read_input(path: &Path) -> anyhow::Result<String> {
    if path.as_os_str() == "-" {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("Failed to read stdin")?;
        return Ok(text);
    }
    std::fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

/// 파일 끝의 개행 하나는 빈 줄로 취급하지 않음
fn strip_final_newline(mut text: String) -> String {
    if text.ends_with('\n') {
        text.pop();
        if text.ends_with('\r') {
            text.pop();
        }
    }
    text
}
