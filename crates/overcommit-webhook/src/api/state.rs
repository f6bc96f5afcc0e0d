use overcommit_evaluator::ReviewPipeline;

pub(crate) struct ApiServerState {
    pub(crate) pipeline: ReviewPipeline,
}
