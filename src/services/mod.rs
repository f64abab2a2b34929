pub mod attempt_session_service;
pub mod grading_service;
pub mod results_service;
pub mod section_clock;
