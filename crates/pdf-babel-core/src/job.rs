//! Background job execution and worker-to-frontend events.
//!
//! A run executes on a single spawned task; the interactive layer observes
//! it exclusively through a channel of [`JobEvent`]s; the worker never
//! touches presentation state. One job is in flight at a time and cannot be
//! cancelled once started.

use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

use crate::config::Lang;
use crate::error::{Error, Result};
use crate::flow::FlowPipeline;
use crate::layout::LayoutPipeline;
use crate::pdf::PdfDocument;

/// Progress and lifecycle events emitted by a running job.
#[derive(Debug, Clone)]
pub enum JobEvent {
    /// The run entered a new phase
    Phase(Phase),
    /// Source language resolved (detected or taken from configuration)
    SourceResolved(Lang),
    /// A chunk finished translating (flow pipeline)
    ChunkTranslated { done: usize, total: usize },
    /// A page finished translating and composing (layout pipeline)
    PageComposed { done: usize, total: usize },
    /// A non-Latin target fell back to the built-in font
    FontFallback { target: Lang },
    /// The run finished and the output was written
    Completed { output: PathBuf },
    /// The run failed; no valid output is guaranteed
    Failed { error: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Extracting,
    Detecting,
    Translating,
    Rendering,
    Saving,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Extracting => "extracting text",
            Self::Detecting => "detecting language",
            Self::Translating => "translating",
            Self::Rendering => "rendering output",
            Self::Saving => "saving",
        };
        write!(f, "{s}")
    }
}

/// Best-effort event publisher handed to pipelines.
///
/// Sends are fire-and-forget: a dropped receiver never fails the run.
#[derive(Clone, Default)]
pub struct EventSink(Option<UnboundedSender<JobEvent>>);

impl EventSink {
    pub fn new(tx: UnboundedSender<JobEvent>) -> Self {
        Self(Some(tx))
    }

    /// A sink that discards everything (for headless/library use)
    pub fn disabled() -> Self {
        Self(None)
    }

    pub fn send(&self, event: JobEvent) {
        if let Some(tx) = &self.0 {
            let _ = tx.send(event);
        }
    }
}

/// Spawn a flow-reconstruction run on a background task.
///
/// Returns the event receiver; the final event is always `Completed` or
/// `Failed`.
pub fn spawn_flow_job(
    pipeline: FlowPipeline,
    doc: PdfDocument,
    output: PathBuf,
) -> UnboundedReceiver<JobEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let sink = EventSink::new(tx.clone());
        let result = run_to_file(pipeline.run(&doc, &sink), &sink, &output).await;
        report(&tx, result, output);
    });
    rx
}

/// Spawn a layout-preservation run on a background task.
pub fn spawn_layout_job(
    pipeline: LayoutPipeline,
    doc: PdfDocument,
    output: PathBuf,
) -> UnboundedReceiver<JobEvent> {
    let (tx, rx) = mpsc::unbounded_channel();
    tokio::spawn(async move {
        let sink = EventSink::new(tx.clone());
        let result = run_to_file(pipeline.run(&doc, &sink), &sink, &output).await;
        report(&tx, result, output);
    });
    rx
}

async fn run_to_file(
    fut: impl Future<Output = Result<Vec<u8>>>,
    sink: &EventSink,
    output: &std::path::Path,
) -> Result<()> {
    let bytes = fut.await?;
    sink.send(JobEvent::Phase(Phase::Saving));
    std::fs::write(output, bytes)
        .map_err(|e| Error::PdfSave(format!("Failed to write {}: {}", output.display(), e)))?;
    Ok(())
}

fn report(tx: &UnboundedSender<JobEvent>, result: Result<()>, output: PathBuf) {
    let event = match result {
        Ok(()) => JobEvent::Completed { output },
        Err(e) => JobEvent::Failed {
            error: e.to_string(),
        },
    };
    let _ = tx.send(event);
}
