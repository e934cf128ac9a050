use std::sync::Arc;

use crate::gateway::RecordGateway;
use crate::plan::SupplementPlan;

#[derive(Clone)]
pub struct AppState {
    pub gateway: RecordGateway,
    pub plan: Arc<SupplementPlan>,
}

impl AppState {
    pub fn new(gateway: RecordGateway, plan: SupplementPlan) -> Self {
        Self {
            gateway,
            plan: Arc::new(plan),
        }
    }
}
