pub mod eligibility;
pub mod resize;
pub mod storage;
