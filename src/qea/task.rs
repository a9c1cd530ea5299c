//! The task boundary between the QEA engine and the group test
//!
//! The engine packs everything the group test needs into an owned
//! [`GroupTestRequest`]. A [`GroupTestExecutor`] turns it into a
//! [`GroupTestResponse`], either in the calling thread ([`InlineExecutor`])
//! or on a worker thread ([`BackgroundExecutor`]).
use std::thread::JoinHandle;

use nalgebra::DMatrix;
use smallvec::SmallVec;
use tracing::debug;

use crate::abundance::ClassLabels;
use crate::library::PathwayId;
use crate::qea::QeaMethod;
use crate::stats::group::{global_ancova, global_test, GroupTestOutcome};
use crate::{PseaError, PseaResult};

/// Column indices of the hits of one pathway
///
/// Most pathways are hit by few measured compounds, so the indices
/// are stored inline.
pub type HitColumns = SmallVec<[usize; 16]>;

/// One pathway of a [`GroupTestRequest`]
#[derive(Debug, Clone, PartialEq)]
pub struct PathwayTask {
    id: PathwayId,
    columns: HitColumns,
    set_size: usize,
    impact: Option<f64>,
}

impl PathwayTask {
    pub(crate) fn new(id: PathwayId, columns: HitColumns, set_size: usize, impact: Option<f64>) -> Self {
        Self {
            id,
            columns,
            set_size,
            impact,
        }
    }

    /// The pathway
    pub fn id(&self) -> &PathwayId {
        &self.id
    }

    /// The columns of the request's matrix that hit the pathway
    pub fn columns(&self) -> &[usize] {
        &self.columns
    }

    /// The number of (filtered) pathway members
    pub fn set_size(&self) -> usize {
        self.set_size
    }

    /// The precomputed impact of the hits
    pub fn impact(&self) -> Option<f64> {
        self.impact
    }
}

/// All input of the group tests of one QEA run
///
/// The request owns its data and can be sent to another thread.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTestRequest {
    method: QeaMethod,
    data: DMatrix<f64>,
    labels: ClassLabels,
    pathways: Vec<PathwayTask>,
}

impl GroupTestRequest {
    pub(crate) fn new(
        method: QeaMethod,
        data: DMatrix<f64>,
        labels: ClassLabels,
        pathways: Vec<PathwayTask>,
    ) -> Self {
        Self {
            method,
            data,
            labels,
            pathways,
        }
    }

    /// The group test to run
    pub fn method(&self) -> QeaMethod {
        self.method
    }

    /// The `samples x compounds` matrix of all mapped compounds
    pub fn data(&self) -> &DMatrix<f64> {
        &self.data
    }

    /// The class label of every sample
    pub fn labels(&self) -> &ClassLabels {
        &self.labels
    }

    /// The pathways to test, in result order
    pub fn pathways(&self) -> &[PathwayTask] {
        &self.pathways
    }

    /// Runs the group test of every pathway, in order
    ///
    /// # Errors
    ///
    /// [`PseaError::Computation`] if the test fails for any pathway
    pub fn run(&self) -> PseaResult<GroupTestResponse> {
        let codes = self.labels.codes();
        let mut outcomes = Vec::with_capacity(self.pathways.len());
        for task in &self.pathways {
            let subset = self.data.select_columns(task.columns.iter());
            let outcome = match self.method {
                QeaMethod::GlobalTest => global_test(&subset, &codes),
                QeaMethod::GlobalAncova => global_ancova(&subset, &self.labels),
            }
            .map_err(|err| {
                let reason = match err {
                    PseaError::Computation(reason) => reason,
                    other => other.to_string(),
                };
                PseaError::Computation(format!("{} failed for {}: {}", self.method, task.id, reason))
            })?;
            debug!(
                "Pathway:{}\tMatched: {}, Statistic: {}, P: {}",
                task.id, outcome.match_count, outcome.statistic, outcome.pvalue
            );
            outcomes.push((task.id.clone(), outcome));
        }
        Ok(GroupTestResponse { outcomes })
    }
}

/// The outcomes of a [`GroupTestRequest`], in request order
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTestResponse {
    outcomes: Vec<(PathwayId, GroupTestOutcome)>,
}

impl GroupTestResponse {
    /// Creates a response from outcomes computed elsewhere
    pub fn new(outcomes: Vec<(PathwayId, GroupTestOutcome)>) -> Self {
        Self { outcomes }
    }

    /// The outcome of every tested pathway
    pub fn outcomes(&self) -> &[(PathwayId, GroupTestOutcome)] {
        &self.outcomes
    }

    pub(crate) fn into_outcomes(self) -> Vec<(PathwayId, GroupTestOutcome)> {
        self.outcomes
    }
}

/// Runs the group tests of a [`GroupTestRequest`]
pub trait GroupTestExecutor {
    /// Runs `request` to completion
    ///
    /// # Errors
    ///
    /// [`PseaError::Computation`] if any group test fails
    fn execute(&self, request: GroupTestRequest) -> PseaResult<GroupTestResponse>;
}

/// Runs group tests in the calling thread
#[derive(Debug, Default, Clone, Copy)]
pub struct InlineExecutor;

impl GroupTestExecutor for InlineExecutor {
    fn execute(&self, request: GroupTestRequest) -> PseaResult<GroupTestResponse> {
        request.run()
    }
}

/// Runs group tests on a spawned worker thread
///
/// # Examples
///
/// ```
/// use psea::qea::task::{BackgroundExecutor, GroupTestExecutor, InlineExecutor};
/// # use psea::qea::task::GroupTestRequest;
/// # fn compare(a: GroupTestRequest, b: GroupTestRequest) -> psea::PseaResult<()> {
/// let background = BackgroundExecutor::new().submit(a)?;
/// // ... do other work ...
/// let inline = InlineExecutor.execute(b)?;
/// assert_eq!(background.wait()?, inline);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Default, Clone, Copy)]
pub struct BackgroundExecutor;

impl BackgroundExecutor {
    /// Constructs a new [`BackgroundExecutor`]
    pub fn new() -> Self {
        Self
    }

    /// Starts the group tests of `request` and returns immediately
    ///
    /// # Errors
    ///
    /// [`PseaError::Io`] if the worker thread cannot be spawned
    pub fn submit(&self, request: GroupTestRequest) -> PseaResult<PendingGroupTest> {
        let handle = std::thread::Builder::new()
            .name("psea-group-test".to_string())
            .spawn(move || request.run())?;
        Ok(PendingGroupTest { handle })
    }
}

impl GroupTestExecutor for BackgroundExecutor {
    fn execute(&self, request: GroupTestRequest) -> PseaResult<GroupTestResponse> {
        self.submit(request)?.wait()
    }
}

/// Group tests running on a worker thread
#[derive(Debug)]
pub struct PendingGroupTest {
    handle: JoinHandle<PseaResult<GroupTestResponse>>,
}

impl PendingGroupTest {
    /// Returns `true` once the worker has finished
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }

    /// Blocks until the worker has finished and returns its response
    ///
    /// # Errors
    ///
    /// [`PseaError::Computation`] if a group test failed or the worker panicked
    pub fn wait(self) -> PseaResult<GroupTestResponse> {
        self.handle
            .join()
            .map_err(|_| PseaError::Computation("group test worker panicked".to_string()))?
    }
}
