use serde::{Deserialize, Serialize};

/// Statistics for one tryout section.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct SectionResults {
    pub section_index: u32,
    pub subtest_id: String,
    pub name: String,
    pub total_questions: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub blank_count: u32,
    /// Percentage 0-100, two decimals.
    pub accuracy: f64,
    pub total_time_seconds: i64,
    pub avg_time_per_question: i64,
}

/// Final outcome of an attempt. Written once at completion.
#[derive(Clone, Debug, PartialEq, Deserialize, Serialize)]
pub struct AttemptResults {
    pub total_questions: u32,
    pub correct_count: u32,
    pub wrong_count: u32,
    pub blank_count: u32,
    pub accuracy: f64,
    pub total_time_seconds: i64,
    pub avg_time_per_question: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub per_section: Option<Vec<SectionResults>>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn practice_results_omit_per_section() {
        let results = AttemptResults {
            total_questions: 2,
            correct_count: 1,
            wrong_count: 1,
            blank_count: 0,
            accuracy: 50.0,
            total_time_seconds: 40,
            avg_time_per_question: 20,
            per_section: None,
        };

        let json = serde_json::to_value(&results).expect("results should serialize");
        assert!(json.get("per_section").is_none());

        let parsed: AttemptResults =
            serde_json::from_value(json).expect("results should deserialize");
        assert_eq!(parsed, results);
    }
}
