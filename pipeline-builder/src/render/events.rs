// Render Events
// Progress reporting for pipeline and workflow rendering

use tokio::sync::mpsc;

/// Sender for render progress events
pub type RenderEventSender = mpsc::UnboundedSender<RenderEvent>;

/// Receiver for render progress events
pub type RenderEventReceiver = mpsc::UnboundedReceiver<RenderEvent>;

/// Create a new render event channel
pub fn render_event_channel() -> (RenderEventSender, RenderEventReceiver) {
    mpsc::unbounded_channel()
}

/// Events emitted while a document is rendered
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderEvent {
    /// Pipeline render started
    PipelineStarted {
        pipeline_name: String,
        pipeline_id: String,
        total_stages: usize,
    },

    /// Jobs of a stage are about to be emitted
    StageStarted { stage_name: String, total_jobs: usize },

    /// One job block was emitted
    JobRendered { stage_name: String, job_name: String },

    /// Pipeline render finished successfully
    PipelineCompleted {
        pipeline_name: String,
        total_jobs: usize,
    },

    /// Workflow render started with a freshly stamped id
    WorkflowStarted {
        workflow_id: String,
        total_pipelines: usize,
    },

    /// Trigger job for a child pipeline was emitted
    TriggerRendered {
        pipeline_name: String,
        stage_name: String,
        artifact: String,
    },

    /// Workflow render finished successfully
    WorkflowCompleted { workflow_id: String },
}

impl RenderEvent {
    pub fn pipeline_started(
        name: impl Into<String>,
        id: impl Into<String>,
        total_stages: usize,
    ) -> Self {
        Self::PipelineStarted {
            pipeline_name: name.into(),
            pipeline_id: id.into(),
            total_stages,
        }
    }

    pub fn stage_started(name: impl Into<String>, total_jobs: usize) -> Self {
        Self::StageStarted {
            stage_name: name.into(),
            total_jobs,
        }
    }

    pub fn job_rendered(stage_name: impl Into<String>, job_name: impl Into<String>) -> Self {
        Self::JobRendered {
            stage_name: stage_name.into(),
            job_name: job_name.into(),
        }
    }

    pub fn pipeline_completed(name: impl Into<String>, total_jobs: usize) -> Self {
        Self::PipelineCompleted {
            pipeline_name: name.into(),
            total_jobs,
        }
    }

    pub fn workflow_started(id: impl Into<String>, total_pipelines: usize) -> Self {
        Self::WorkflowStarted {
            workflow_id: id.into(),
            total_pipelines,
        }
    }

    pub fn trigger_rendered(
        pipeline_name: impl Into<String>,
        stage_name: impl Into<String>,
        artifact: impl Into<String>,
    ) -> Self {
        Self::TriggerRendered {
            pipeline_name: pipeline_name.into(),
            stage_name: stage_name.into(),
            artifact: artifact.into(),
        }
    }

    pub fn workflow_completed(id: impl Into<String>) -> Self {
        Self::WorkflowCompleted {
            workflow_id: id.into(),
        }
    }
}

/// Receives render progress. Passed explicitly into render calls.
pub trait RenderReporter {
    fn report(&self, event: RenderEvent);
}

/// Discards every event
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReporter;

impl RenderReporter for NoopReporter {
    fn report(&self, _event: RenderEvent) {}
}

/// Forwards events to `tracing`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingReporter;

impl RenderReporter for TracingReporter {
    fn report(&self, event: RenderEvent) {
        match event {
            RenderEvent::PipelineStarted {
                pipeline_name,
                pipeline_id,
                total_stages,
            } => {
                tracing::info!(pipeline = %pipeline_name, id = %pipeline_id, stages = total_stages, "rendering pipeline");
            }
            RenderEvent::StageStarted {
                stage_name,
                total_jobs,
            } => {
                tracing::debug!(stage = %stage_name, jobs = total_jobs, "rendering jobs for stage");
            }
            RenderEvent::JobRendered {
                stage_name,
                job_name,
            } => {
                tracing::debug!(stage = %stage_name, job = %job_name, "rendered job");
            }
            RenderEvent::PipelineCompleted {
                pipeline_name,
                total_jobs,
            } => {
                tracing::info!(pipeline = %pipeline_name, jobs = total_jobs, "pipeline rendered");
            }
            RenderEvent::WorkflowStarted {
                workflow_id,
                total_pipelines,
            } => {
                tracing::info!(id = %workflow_id, pipelines = total_pipelines, "rendering workflow");
            }
            RenderEvent::TriggerRendered {
                pipeline_name,
                stage_name,
                artifact,
            } => {
                tracing::debug!(pipeline = %pipeline_name, stage = %stage_name, artifact = %artifact, "rendered trigger job");
            }
            RenderEvent::WorkflowCompleted { workflow_id } => {
                tracing::info!(id = %workflow_id, "workflow rendered");
            }
        }
    }
}

impl RenderReporter for RenderEventSender {
    fn report(&self, event: RenderEvent) {
        // A dropped receiver only means nobody is listening
        let _ = self.send(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_reporter_forwards_events() {
        let (tx, mut rx) = render_event_channel();
        tx.report(RenderEvent::stage_started("build", 3));
        tx.report(RenderEvent::job_rendered("build", "Build x"));

        assert_eq!(rx.try_recv().unwrap(), RenderEvent::stage_started("build", 3));
        assert_eq!(
            rx.try_recv().unwrap(),
            RenderEvent::job_rendered("build", "Build x")
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_channel_reporter_ignores_closed_receiver() {
        let (tx, rx) = render_event_channel();
        drop(rx);
        tx.report(RenderEvent::workflow_completed("abc"));
    }

    #[test]
    fn test_noop_and_tracing_reporters_accept_events() {
        NoopReporter.report(RenderEvent::pipeline_completed("build", 1));
        TracingReporter.report(RenderEvent::pipeline_completed("build", 1));
    }
}
