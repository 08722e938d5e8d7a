//! GPU queue abstraction.
//!
//! The rendering core records into command buffers and hands them to a
//! [`GpuQueue`] together with their synchronization wiring. This is the seam
//! a real backend implements against a native device queue; the in-tree
//! [`DummyQueue`] executes submissions eagerly on the CPU, signaling every
//! primitive at submit time, so the surrounding scheduling and lifetime
//! machinery can be exercised without a GPU.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::GraphicsError;
use crate::resources::{CommandBuffer, CommandBufferState};
use crate::sync::{Fence, Semaphore, TimelineSemaphore};

/// A point on a timeline semaphore a submission participates in.
#[derive(Debug, Clone)]
pub struct TimelinePoint {
    /// The timeline to wait on and signal.
    pub timeline: Arc<TimelineSemaphore>,
    /// Value the timeline must reach before the submission starts.
    pub wait_value: u64,
    /// Value the timeline is advanced to when the submission completes.
    pub signal_value: u64,
}

/// One unit of work handed to a queue.
pub struct Submission {
    /// The executable command buffer.
    pub command_buffer: Arc<CommandBuffer>,
    /// Semaphores that must be signaled before execution starts.
    pub wait_semaphores: Vec<Arc<Semaphore>>,
    /// Semaphores signaled when execution completes.
    pub signal_semaphores: Vec<Arc<Semaphore>>,
    /// Optional timeline participation.
    pub timeline: Option<TimelinePoint>,
    /// Fence signaled when execution completes.
    pub fence: Option<Arc<Fence>>,
}

/// Record of one submission, kept by queues that support introspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionRecord {
    /// Label of the submitted command buffer.
    pub command_buffer: String,
    /// Labels of the semaphores waited on.
    pub waits: Vec<String>,
    /// Labels of the semaphores signaled.
    pub signals: Vec<String>,
    /// Whether a fence was attached.
    pub fenced: bool,
}

/// A device queue accepting command buffer submissions.
pub trait GpuQueue: Send + Sync {
    /// Submit one unit of work.
    ///
    /// The command buffer must be in the executable state.
    fn submit(&self, submission: Submission) -> Result<(), GraphicsError>;

    /// Backend name for diagnostics.
    fn name(&self) -> &str;
}

/// CPU-resident queue that retires every submission immediately.
///
/// Wait semaphores are checked, signal semaphores, timeline points and fences
/// are signaled, and the submission is appended to an inspection log.
#[derive(Debug, Default)]
pub struct DummyQueue {
    submissions: Mutex<Vec<SubmissionRecord>>,
}

impl DummyQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// All submissions in order.
    pub fn submissions(&self) -> Vec<SubmissionRecord> {
        self.submissions.lock().clone()
    }

    /// Number of submissions so far.
    pub fn submission_count(&self) -> usize {
        self.submissions.lock().len()
    }

    /// Clear the submission log.
    pub fn clear(&self) {
        self.submissions.lock().clear();
    }
}

impl GpuQueue for DummyQueue {
    fn submit(&self, submission: Submission) -> Result<(), GraphicsError> {
        if submission.command_buffer.state() != CommandBufferState::Executable {
            return Err(GraphicsError::Configuration(format!(
                "command buffer `{}` submitted before end()",
                submission.command_buffer.label()
            )));
        }

        // Waits retire instantly: every prior submission has already been
        // executed by the time this one arrives.
        if let Some(point) = &submission.timeline {
            point.timeline.wait(point.wait_value);
        }

        let record = SubmissionRecord {
            command_buffer: submission.command_buffer.label().to_string(),
            waits: submission
                .wait_semaphores
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            signals: submission
                .signal_semaphores
                .iter()
                .map(|s| s.label().to_string())
                .collect(),
            fenced: submission.fence.is_some(),
        };

        log::trace!(
            "queue submit `{}`: {} commands, wait=[{}], signal=[{}]",
            record.command_buffer,
            submission.command_buffer.recorded_len(),
            record.waits.join(","),
            record.signals.join(","),
        );

        for semaphore in &submission.signal_semaphores {
            semaphore.signal();
        }
        if let Some(point) = &submission.timeline {
            point.timeline.signal(point.signal_value);
        }
        if let Some(fence) = &submission.fence {
            fence.signal();
        }

        self.submissions.lock().push(record);
        Ok(())
    }

    fn name(&self) -> &str {
        "Dummy"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executable_buffer(label: &str) -> Arc<CommandBuffer> {
        let cmd = Arc::new(CommandBuffer::new(label));
        cmd.begin();
        cmd.end();
        cmd
    }

    #[test]
    fn test_submit_signals_everything() {
        let queue = DummyQueue::new();
        let fence = Arc::new(Fence::new_unsignaled("pass.fence"));
        let semaphore = Arc::new(Semaphore::new("pass.semaphore"));
        let timeline = Arc::new(TimelineSemaphore::new("frame.timeline"));

        queue
            .submit(Submission {
                command_buffer: executable_buffer("pass.cmd"),
                wait_semaphores: vec![],
                signal_semaphores: vec![semaphore.clone()],
                timeline: Some(TimelinePoint {
                    timeline: timeline.clone(),
                    wait_value: 0,
                    signal_value: 1,
                }),
                fence: Some(fence.clone()),
            })
            .unwrap();

        assert!(fence.is_signaled());
        assert_eq!(semaphore.signal_count(), 1);
        assert_eq!(timeline.value(), 1);
        assert_eq!(queue.submission_count(), 1);
    }

    #[test]
    fn test_unfinished_buffer_rejected() {
        let queue = DummyQueue::new();
        let cmd = Arc::new(CommandBuffer::new("open.cmd"));
        cmd.begin();

        let result = queue.submit(Submission {
            command_buffer: cmd,
            wait_semaphores: vec![],
            signal_semaphores: vec![],
            timeline: None,
            fence: None,
        });
        assert!(result.is_err());
    }

    #[test]
    fn test_submission_record_wiring() {
        let queue = DummyQueue::new();
        let dep = Arc::new(Semaphore::new("geometry.semaphore"));
        let own = Arc::new(Semaphore::new("lighting.semaphore"));

        queue
            .submit(Submission {
                command_buffer: executable_buffer("lighting.cmd"),
                wait_semaphores: vec![dep],
                signal_semaphores: vec![own],
                timeline: None,
                fence: None,
            })
            .unwrap();

        let records = queue.submissions();
        assert_eq!(records[0].waits, vec!["geometry.semaphore"]);
        assert_eq!(records[0].signals, vec!["lighting.semaphore"]);
        assert!(!records[0].fenced);
    }
}
