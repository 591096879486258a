// src/types/mod.rs
pub mod activity;
pub mod analysis;

pub use activity::{ActivityUpdate, NewActivityRecord, PROCESSING_RESULT_TYPE};
pub use analysis::{
    AnalysisInput, AnalysisResult, BusinessAptitude, FileAttachment, PersonCommunity,
    PersonalityScores, MAX_SCORE,
};
