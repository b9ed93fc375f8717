//! Progress estimate for a running analysis job
//!
//! Each of the five major result sections is worth a fixed share. The value
//! is user feedback only; nothing depends on its accuracy.

use crate::client::TaskStatusResponse;

/// Points contributed by each present section
pub const SECTION_WEIGHT: u8 = 20;

/// Number of sections that count towards progress
pub const SECTION_COUNT: u8 = 5;

/// Progress of a completed job
pub const MAX_PROGRESS: u8 = 100;

/// Progress derived from which sections a status response carries
pub fn progress_for(response: &TaskStatusResponse) -> u8 {
    let analysis = response.analysis.as_ref();
    let present = [
        response.app_data.is_some(),
        response.has_competitor_data(),
        analysis.is_some_and(|a| a.app_analysis.is_some()),
        analysis.is_some_and(|a| a.competitor_analysis.is_some()),
        analysis.is_some_and(|a| a.market_trends.is_some()),
    ];

    let sections = present.iter().filter(|p| **p).count() as u8;
    debug_assert!(sections <= SECTION_COUNT);
    sections.saturating_mul(SECTION_WEIGHT).min(MAX_PROGRESS)
}

/// Human label for a progress value
pub fn stage_label(progress: u8) -> &'static str {
    match progress {
        0 => "Initializing analysis...",
        1..=19 => "Fetching app metadata...",
        20..=39 => "Analyzing competitor data...",
        40..=59 => "Generating insights...",
        60..=79 => "Optimizing recommendations...",
        80..=99 => "Finalizing analysis...",
        _ => "Analysis complete!",
    }
}
