use std::{
    path::PathBuf,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use vidtrim_core::{FormError, JobForm, JobParameters, OutputBlob, OutputKind};

use crate::{
    engine::{EngineError, TranscodeEngine},
    save::{SaveError, SaveStep},
    source::{SourceError, SourceRef},
};


const ABANDONED_MSG: &str = "conversion was abandoned before it finished";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    /// No source selected
    Idle,
    /// Source selected, nothing running
    Ready,
    /// A conversion is in flight
    Busy,
    /// The last conversion failed, the source is kept for a retry
    Error,
}

/// Whether the submit affordance should be enabled, and if not, why.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitAvailability {
    Available,
    NoSource,
    EngineLoading,
    EngineFailed,
    InFlight,
}

impl SubmitAvailability {
    pub fn is_available(&self) -> bool {
        matches!(self, SubmitAvailability::Available)
    }

    pub fn label(&self, kind: OutputKind) -> String {
        match self {
            SubmitAvailability::Available => format!("Download and convert to {}", kind),
            SubmitAvailability::InFlight => "Downloading and converting...".to_owned(),
            SubmitAvailability::NoSource => "Select a video to convert".to_owned(),
            SubmitAvailability::EngineLoading => "Waiting for ffmpeg to load...".to_owned(),
            SubmitAvailability::EngineFailed => "ffmpeg could not be loaded".to_owned(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConversionFailure {
    #[error(transparent)]
    Source(#[from] SourceError),
    #[error(transparent)]
    Engine(#[from] EngineError),
}

#[derive(Debug, thiserror::Error)]
pub enum JobError {
    #[error("transcoding engine is still loading")]
    EngineNotReady,
    #[error("no source video selected")]
    NoSourceSelected,
    #[error("a conversion is already in progress")]
    JobInFlight,
    #[error("invalid job parameters")]
    InvalidForm(#[from] FormError),
    #[error("conversion failed")]
    ConversionFailed(#[source] ConversionFailure),
    #[error("{} was converted but could not be saved", filename)]
    SaveFailed {
        filename: String,
        #[source]
        source: SaveError,
    },
}

/// Result of a successful job.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedFile {
    pub filename: String,
    pub media_type: &'static str,
    pub size: usize,
    pub location: PathBuf,
}

#[derive(Debug, Clone)]
pub struct ControllerSettings {
    pub default_kind: OutputKind,
    pub cleanup_working_files: bool,
}

impl Default for ControllerSettings {
    fn default() -> Self {
        Self {
            default_kind: OutputKind::default(),
            cleanup_working_files: true,
        }
    }
}

#[derive(Debug)]
struct ControllerState {
    lifecycle: LifecycleState,
    source: Option<SourceRef>,
    kind: OutputKind,
    form: JobForm,
    last_error: Option<String>,
    engine_failure: Option<String>,
}

impl ControllerState {
    fn release_source(&mut self) {
        if let Some(src) = self.source.take() {
            src.release();
        }
    }
}

/// Holds the slot for the single job allowed in flight.
///
/// If a submission is dropped part way through, the slot is freed and the
/// controller lands in `Error` so the source can be retried.
struct InFlightGuard<'a> {
    flag: &'a AtomicBool,
    state: &'a Mutex<ControllerState>,
}

impl<'a> InFlightGuard<'a> {
    fn acquire(flag: &'a AtomicBool, state: &'a Mutex<ControllerState>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| InFlightGuard { flag, state })
    }
}

impl<'a> Drop for InFlightGuard<'a> {
    fn drop(&mut self) {
        let mut st = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if st.lifecycle == LifecycleState::Busy {
            log::warn!("{}", ABANDONED_MSG);
            st.lifecycle = LifecycleState::Error;
            st.last_error = Some(ABANDONED_MSG.to_owned());
        }
        self.flag.store(false, Ordering::Release);
    }
}

/// Arguments for one trim, in the order ffmpeg expects them.
///
/// Duration (`-t`) comes before the start offset (`-ss`).
pub fn transcode_args(
    input_name: &str,
    params: &JobParameters,
    kind: OutputKind,
) -> Vec<String> {
    vec![
        "-i".to_owned(),
        input_name.to_owned(),
        "-t".to_owned(),
        params.duration.to_string(),
        "-ss".to_owned(),
        params.start.to_string(),
        "-f".to_owned(),
        kind.format_code().to_owned(),
        params.output_name(kind),
    ]
}

fn working_input_name(source: &SourceRef) -> String {
    let id = rand::random::<u32>();
    match source.extension() {
        Some(ext) => format!("input-{:08x}.{}", id, ext),
        None => format!("input-{:08x}", id),
    }
}

/// Drives a single selected video through trim and export.
#[derive(Debug)]
pub struct JobController {
    engine: Arc<dyn TranscodeEngine>,
    saver: Arc<dyn SaveStep>,
    settings: ControllerSettings,
    in_flight: AtomicBool,
    state: Mutex<ControllerState>,
}

impl JobController {
    pub fn new(
        engine: Arc<dyn TranscodeEngine>,
        saver: Arc<dyn SaveStep>,
        settings: ControllerSettings,
    ) -> JobController {
        let state = ControllerState {
            lifecycle: LifecycleState::Idle,
            source: None,
            kind: settings.default_kind,
            form: JobForm::default(),
            last_error: None,
            engine_failure: None,
        };
        JobController {
            engine,
            saver,
            settings,
            in_flight: AtomicBool::new(false),
            state: Mutex::new(state),
        }
    }

    fn state(&self) -> MutexGuard<'_, ControllerState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Lock the state for an edit that must not overlap a running job.
    fn state_for_edit(&self) -> Result<MutexGuard<'_, ControllerState>, JobError> {
        let st = self.state();
        if st.lifecycle == LifecycleState::Busy {
            Err(JobError::JobInFlight)
        } else {
            Ok(st)
        }
    }

    pub fn lifecycle(&self) -> LifecycleState {
        self.state().lifecycle
    }

    pub fn engine_ready(&self) -> bool {
        self.engine.is_loaded()
    }

    pub fn kind(&self) -> OutputKind {
        self.state().kind
    }

    pub fn form(&self) -> JobForm {
        self.state().form.clone()
    }

    /// The form as it would be submitted right now
    pub fn parameters(&self) -> Result<JobParameters, FormError> {
        self.state().form.normalize()
    }

    pub fn source_name(&self) -> Option<String> {
        self.state()
            .source
            .as_ref()
            .map(|s| s.display_name().to_owned())
    }

    pub fn has_source(&self) -> bool {
        self.state().source.is_some()
    }

    pub fn last_error(&self) -> Option<String> {
        self.state().last_error.clone()
    }

    /// Remember that the background engine load gave up.
    pub fn engine_load_failed(&self, reason: impl std::fmt::Display) {
        self.state().engine_failure = Some(reason.to_string());
    }

    pub fn engine_failure(&self) -> Option<String> {
        self.state().engine_failure.clone()
    }

    pub fn submit_availability(&self) -> SubmitAvailability {
        if self.is_busy() {
            SubmitAvailability::InFlight
        } else if !self.has_source() {
            SubmitAvailability::NoSource
        } else if !self.engine_ready() {
            if self.state().engine_failure.is_some() {
                SubmitAvailability::EngineFailed
            } else {
                SubmitAvailability::EngineLoading
            }
        } else {
            SubmitAvailability::Available
        }
    }

    /// Select a new source, replacing and releasing any previous one.
    pub fn select(&self, source: SourceRef) -> Result<(), JobError> {
        let mut st = self.state_for_edit()?;
        log::debug!("select source {:?}", source.display_name());
        st.release_source();
        st.source = Some(source);
        st.lifecycle = LifecycleState::Ready;
        st.last_error = None;
        Ok(())
    }

    /// Dismiss the current source and reset the form.
    pub fn clear(&self) -> Result<(), JobError> {
        let mut st = self.state_for_edit()?;
        st.release_source();
        st.form.reset();
        st.lifecycle = LifecycleState::Idle;
        st.last_error = None;
        Ok(())
    }

    pub fn set_kind(&self, kind: OutputKind) -> Result<(), JobError> {
        self.state_for_edit()?.kind = kind;
        Ok(())
    }

    /// Edit the form. Rejected while a job is running so a failed job
    /// leaves behind the values it ran with.
    pub fn update_form(&self, f: impl FnOnce(&mut JobForm)) -> Result<(), JobError> {
        f(&mut self.state_for_edit()?.form);
        Ok(())
    }

    /// Convert the selected source with the current form and output kind.
    ///
    /// On success the output is handed to the save step, then the source is
    /// released and the form is reset. A failed conversion keeps both so the
    /// job can be resubmitted as-is.
    pub async fn submit(&self) -> Result<SavedFile, JobError> {
        let _guard = InFlightGuard::acquire(&self.in_flight, &self.state).ok_or_else(|| {
            log::debug!("submit ignored, a job is already in flight");
            JobError::JobInFlight
        })?;

        let (source, kind, params) = {
            let mut st = self.state();
            let source = st.source.clone().ok_or(JobError::NoSourceSelected)?;
            if !self.engine.is_loaded() {
                return Err(JobError::EngineNotReady);
            }
            let params = st.form.normalize()?;
            st.lifecycle = LifecycleState::Busy;
            st.last_error = None;
            (source, st.kind, params)
        };

        let filename = params.output_name(kind);
        log::info!(
            "converting {:?} to {} (start={}s, duration={}s)",
            source.display_name(),
            filename,
            params.start,
            params.duration
        );

        let blob = match self.convert(&source, kind, &params).await {
            Ok(blob) => blob,
            Err(e) => {
                log::error!("conversion of {:?} failed: {}", source.display_name(), e);
                let mut st = self.state();
                st.lifecycle = LifecycleState::Error;
                st.last_error = Some(e.to_string());
                return Err(JobError::ConversionFailed(e));
            }
        };

        let saved = self.saver.save(&blob, &filename);

        {
            let mut st = self.state();
            st.release_source();
            st.form.reset();
            st.lifecycle = LifecycleState::Idle;
        }

        match saved {
            Ok(location) => Ok(SavedFile {
                filename,
                media_type: blob.media_type,
                size: blob.len(),
                location,
            }),
            Err(e) => {
                log::warn!("{} was converted but not saved: {}", filename, e);
                Err(JobError::SaveFailed {
                    filename,
                    source: e,
                })
            }
        }
    }

    async fn convert(
        &self,
        source: &SourceRef,
        kind: OutputKind,
        params: &JobParameters,
    ) -> Result<OutputBlob, ConversionFailure> {
        let data = source.materialize().await?;
        let input_name = working_input_name(source);
        let output_name = params.output_name(kind);
        log::debug!("staging {} bytes as {}", data.len(), input_name);

        let args = transcode_args(&input_name, params, kind);
        let outcome = self
            .run_in_store(&input_name, data, &args, &output_name)
            .await;

        if self.settings.cleanup_working_files {
            for name in [input_name.as_str(), output_name.as_str()] {
                if let Err(e) = self.engine.remove(name).await {
                    log::warn!("could not remove working file {:?}: {}", name, e);
                }
            }
        }

        Ok(OutputBlob::new(outcome?, kind))
    }

    async fn run_in_store(
        &self,
        input_name: &str,
        data: Vec<u8>,
        args: &[String],
        output_name: &str,
    ) -> Result<Vec<u8>, EngineError> {
        self.engine.write_input(input_name, data).await?;
        log::trace!("{} {:?}", self.engine.name(), args);
        self.engine.run(args).await?;
        self.engine.read_output(output_name).await
    }
}
