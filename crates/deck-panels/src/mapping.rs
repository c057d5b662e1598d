use deck_proto::ops::FlagKind;
use deck_proto::survey::MappingReport;
use deck_sim::{DeviceBackend, OpError, Operation, OpsConfig, StartOutcome};

pub struct MappingPanel {
    op: Operation<MappingReport>,
}

impl MappingPanel {
    pub fn mount(ops: &OpsConfig) -> Self {
        Self { op: Operation::new(FlagKind::Mapping, ops.timeout()) }
    }

    pub fn start<B: DeviceBackend>(&mut self, backend: &B) -> StartOutcome {
        if self.op.is_active() {
            return StartOutcome::AlreadyRunning;
        }
        self.op.start(backend.survey_area())
    }

    pub fn is_mapping(&self) -> bool {
        self.op.is_active()
    }

    /// A report from an earlier run stays hidden while a new survey is in flight.
    pub fn is_complete(&self) -> bool {
        !self.is_mapping() && self.op.last_ok().is_some()
    }

    pub fn flags(&self) -> Vec<FlagKind> {
        if self.is_mapping() {
            vec![FlagKind::Mapping]
        } else {
            Vec::new()
        }
    }

    pub fn report(&self) -> Option<MappingReport> {
        if self.is_mapping() {
            return None;
        }
        self.op.last_ok()
    }

    pub fn last_error(&self) -> Option<OpError> {
        self.op.last_outcome().and_then(Result::err)
    }

    pub fn runs(&self) -> u64 {
        self.op.completions()
    }

    pub async fn wait(&mut self) {
        self.op.wait().await;
    }
}
