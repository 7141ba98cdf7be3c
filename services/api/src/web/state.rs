//! services/api/src/web/state.rs
//!
//! Defines the application's shared state.

use crate::config::Config;
use std::sync::Arc;
use study_planner_core::{DatabaseService, Scheduler, StudyPlanner};

//=========================================================================================
// AppState (Shared Across All Requests)
//=========================================================================================

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub db: Arc<dyn DatabaseService>,
    pub config: Arc<Config>,
    pub planner: Arc<StudyPlanner>,
}

impl AppState {
    /// Wires the planner to the given store using the configured schedule horizon.
    pub fn new(db: Arc<dyn DatabaseService>, config: Arc<Config>) -> Self {
        let scheduler = Scheduler::new(config.schedule_horizon_days);
        let planner = Arc::new(StudyPlanner::new(db.clone(), scheduler));
        Self { db, config, planner }
    }
}
