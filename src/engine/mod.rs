pub mod dispatch;
pub mod lifecycle;
pub mod planner;
pub mod scoring;
