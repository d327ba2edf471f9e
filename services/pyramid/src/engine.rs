//! Dry-run execution engine.
//!
//! Logs what would be processed per zoom level and writes the job and its
//! resolved plan as JSON instead of rendering tiles.

use std::io::Write;
use std::sync::Mutex;

use anyhow::Context;
use process_config::{ExecutionEngine, JobDescription, ResolvedConfig, ZoomRange};
use serde::Serialize;
use tracing::{info, warn};

#[derive(Serialize)]
struct Plan<'a> {
    job: &'a JobDescription,
    config: &'a ResolvedConfig,
    zoom: ZoomRange,
}

pub struct DryRunEngine<W> {
    out: Mutex<W>,
    pretty: bool,
}

impl<W: Write> DryRunEngine<W> {
    pub fn new(out: W, pretty: bool) -> Self {
        Self {
            out: Mutex::new(out),
            pretty,
        }
    }

    pub fn into_inner(self) -> W {
        match self.out.into_inner() {
            Ok(out) => out,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<W: Write> ExecutionEngine for DryRunEngine<W> {
    fn batch_process(
        &self,
        job: &JobDescription,
        config: &ResolvedConfig,
        zoom: ZoomRange,
    ) -> anyhow::Result<()> {
        for level in zoom.levels() {
            match config.process_area(level) {
                Some(area) if !area.is_empty() => info!(
                    zoom = level,
                    kind = ?area.kind(),
                    bounds = ?area.bounds().map(|b| b.to_array()),
                    "Would process zoom level"
                ),
                _ => warn!(zoom = level, "Nothing to process at zoom level"),
            }
        }

        let plan = Plan { job, config, zoom };
        let mut out = self
            .out
            .lock()
            .map_err(|_| anyhow::anyhow!("output writer poisoned"))?;
        let written = if self.pretty {
            serde_json::to_writer_pretty(&mut *out, &plan)
        } else {
            serde_json::to_writer(&mut *out, &plan)
        };
        written.context("failed to write plan")?;
        writeln!(out)?;
        Ok(())
    }
}
