pub mod calendar;
pub mod domain;
pub mod error;
pub mod materializer;
pub mod memory;
pub mod planner;
pub mod ports;
pub mod progress;
pub mod resolver;
pub mod scheduler;

pub use domain::{
    AuthSession, CatalogEntry, DayOfWeek, DifficultyLevel, NewQuizResult, NewStudyConfiguration,
    NewStudySession, QuizResult, StudyConfiguration, StudyDays, StudySession, Subtopic, Technology,
    User, UserCredentials,
};
pub use error::{PlannerError, PlannerResult};
pub use planner::{SessionUpdate, StudyConfigRequest, StudyPlanner};
pub use ports::{DatabaseService, PortError, PortResult};
pub use progress::{ProgressSummary, SubtopicProgress};
pub use scheduler::{Allocation, Scheduler, DEFAULT_HORIZON_DAYS};
