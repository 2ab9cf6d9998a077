use thiserror::Error;

pub const MISSING_DEPENDENCY_EXIT_CODE: i32 = 2;

#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("required tool `{tool}` is not available; {hint}")]
    MissingDependency {
        tool: &'static str,
        hint: &'static str,
    },

    #[error("stage `{stage}` failed")]
    StageFailure {
        stage: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
}

impl PipelineError {
    pub fn stage_failure(stage: &'static str, error: anyhow::Error) -> Self {
        Self::StageFailure {
            stage,
            source: error.into(),
        }
    }
}

pub fn exit_code_for(error: &anyhow::Error) -> i32 {
    let missing_dependency = error.chain().any(|cause| {
        matches!(
            cause.downcast_ref::<PipelineError>(),
            Some(PipelineError::MissingDependency { .. })
        )
    });

    if missing_dependency {
        MISSING_DEPENDENCY_EXIT_CODE
    } else {
        1
    }
}
