use regex::RegexBuilder;

use crate::models::domain::answer::{AnswerKey, UserAnswer};

/// Result of grading one answer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct GradeOutcome {
    /// `None` for a blank or ungradable answer.
    pub is_correct: Option<bool>,
    /// 0-100, only for row-based questions.
    pub partial_score: Option<u8>,
}

impl GradeOutcome {
    pub const UNGRADED: GradeOutcome = GradeOutcome {
        is_correct: None,
        partial_score: None,
    };

    fn judged(is_correct: bool) -> Self {
        GradeOutcome {
            is_correct: Some(is_correct),
            partial_score: None,
        }
    }
}

pub struct GradingService;

impl GradingService {
    /// Grade a submitted answer against its key. Pure and deterministic.
    pub fn grade(key: &AnswerKey, answer: &UserAnswer) -> GradeOutcome {
        match (key, answer) {
            (AnswerKey::SingleChoice { correct }, UserAnswer::SingleChoice { selected }) => {
                Self::grade_single_choice(correct, selected.as_deref())
            }
            (AnswerKey::ComplexSelection { rows }, UserAnswer::ComplexSelection { selections }) => {
                Self::grade_complex_selection(rows, selections)
            }
            (
                AnswerKey::FillIn {
                    accepted,
                    case_sensitive,
                    pattern,
                },
                UserAnswer::FillIn { value },
            ) => Self::grade_fill_in(accepted, *case_sensitive, pattern.as_deref(), value.as_deref()),
            _ => {
                log::warn!(
                    "Answer type {:?} does not match key type {:?}; leaving ungraded",
                    answer.question_type(),
                    key.question_type()
                );
                GradeOutcome::UNGRADED
            }
        }
    }

    fn grade_single_choice(correct: &str, selected: Option<&str>) -> GradeOutcome {
        match selected {
            None => GradeOutcome::UNGRADED,
            Some(letter) if letter.trim().is_empty() => GradeOutcome::UNGRADED,
            Some(letter) => GradeOutcome::judged(letter.trim() == correct.trim()),
        }
    }

    fn grade_complex_selection(rows: &[String], selections: &[Option<String>]) -> GradeOutcome {
        let total_rows = rows.len();
        let mut selected_rows = 0usize;
        let mut correct_rows = 0usize;

        for (row_index, expected) in rows.iter().enumerate() {
            if let Some(Some(choice)) = selections.get(row_index) {
                selected_rows += 1;
                if choice == expected {
                    correct_rows += 1;
                }
            }
        }

        if selected_rows == 0 {
            return GradeOutcome::UNGRADED;
        }

        let partial_score = ((correct_rows as f64 / total_rows as f64) * 100.0).round() as u8;
        let is_correct = selected_rows == total_rows && correct_rows == total_rows;

        GradeOutcome {
            is_correct: Some(is_correct),
            partial_score: Some(partial_score),
        }
    }

    fn grade_fill_in(
        accepted: &[String],
        case_sensitive: bool,
        pattern: Option<&str>,
        value: Option<&str>,
    ) -> GradeOutcome {
        let raw = match value {
            Some(raw) if !raw.trim().is_empty() => raw,
            _ => return GradeOutcome::UNGRADED,
        };

        let normalize = |text: &str| {
            let trimmed = text.trim();
            if case_sensitive {
                trimmed.to_string()
            } else {
                trimmed.to_lowercase()
            }
        };

        let submitted = normalize(raw);
        if accepted.iter().any(|candidate| normalize(candidate) == submitted) {
            return GradeOutcome::judged(true);
        }

        let pattern_match = pattern
            .map(|pattern| Self::matches_pattern(pattern, raw, case_sensitive))
            .unwrap_or(false);

        GradeOutcome::judged(pattern_match)
    }

    /// A malformed pattern never matches.
    fn matches_pattern(pattern: &str, raw: &str, case_sensitive: bool) -> bool {
        match RegexBuilder::new(pattern)
            .case_insensitive(!case_sensitive)
            .build()
        {
            Ok(regex) => regex.is_match(raw),
            Err(err) => {
                log::debug!("Ignoring malformed fill-in pattern '{}': {}", pattern, err);
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rows(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn selections(values: &[Option<&str>]) -> Vec<Option<String>> {
        values.iter().map(|v| v.map(|s| s.to_string())).collect()
    }

    fn fill_in_key(accepted: &[&str], case_sensitive: bool, pattern: Option<&str>) -> AnswerKey {
        AnswerKey::FillIn {
            accepted: rows(accepted),
            case_sensitive,
            pattern: pattern.map(|p| p.to_string()),
        }
    }

    fn fill_in(value: &str) -> UserAnswer {
        UserAnswer::FillIn {
            value: Some(value.to_string()),
        }
    }

    #[test]
    fn single_choice_matches_exact_letter() {
        let key = AnswerKey::SingleChoice {
            correct: "C".to_string(),
        };

        let right = GradingService::grade(
            &key,
            &UserAnswer::SingleChoice {
                selected: Some("C".to_string()),
            },
        );
        let wrong = GradingService::grade(
            &key,
            &UserAnswer::SingleChoice {
                selected: Some("A".to_string()),
            },
        );

        assert_eq!(right, GradeOutcome::judged(true));
        assert_eq!(wrong, GradeOutcome::judged(false));
        assert!(right.partial_score.is_none());
    }

    #[test]
    fn single_choice_ignores_surrounding_whitespace() {
        let key = AnswerKey::SingleChoice {
            correct: "A ".to_string(),
        };
        let choose = |letter: &str| UserAnswer::SingleChoice {
            selected: Some(letter.to_string()),
        };

        assert_eq!(GradingService::grade(&key, &choose(" A")), GradeOutcome::judged(true));
        assert_eq!(GradingService::grade(&key, &choose("A")), GradeOutcome::judged(true));
        assert_eq!(GradingService::grade(&key, &choose(" B ")), GradeOutcome::judged(false));
    }

    #[test]
    fn blank_answers_are_ungraded_for_every_type() {
        let cases = [
            (
                AnswerKey::SingleChoice {
                    correct: "A".to_string(),
                },
                UserAnswer::SingleChoice { selected: None },
            ),
            (
                AnswerKey::ComplexSelection {
                    rows: rows(&["true", "false"]),
                },
                UserAnswer::ComplexSelection {
                    selections: selections(&[None, None]),
                },
            ),
            (
                AnswerKey::ComplexSelection {
                    rows: rows(&["true"]),
                },
                UserAnswer::ComplexSelection {
                    selections: Vec::new(),
                },
            ),
            (fill_in_key(&["x"], false, None), UserAnswer::FillIn { value: None }),
            (fill_in_key(&["x"], false, None), fill_in("   ")),
        ];

        for (key, answer) in cases {
            assert_eq!(GradingService::grade(&key, &answer), GradeOutcome::UNGRADED);
        }
    }

    #[test]
    fn complex_selection_awards_partial_credit() {
        let key = AnswerKey::ComplexSelection {
            rows: rows(&["true", "false", "true", "false"]),
        };
        let answer = UserAnswer::ComplexSelection {
            selections: selections(&[Some("true"), Some("false"), Some("true"), None]),
        };

        let outcome = GradingService::grade(&key, &answer);

        assert_eq!(outcome.partial_score, Some(75));
        assert_eq!(outcome.is_correct, Some(false));
    }

    #[test]
    fn complex_selection_requires_every_row_for_full_credit() {
        let key = AnswerKey::ComplexSelection {
            rows: rows(&["a", "b", "c"]),
        };

        let full = GradingService::grade(
            &key,
            &UserAnswer::ComplexSelection {
                selections: selections(&[Some("a"), Some("b"), Some("c")]),
            },
        );
        let one_wrong = GradingService::grade(
            &key,
            &UserAnswer::ComplexSelection {
                selections: selections(&[Some("a"), Some("x"), Some("c")]),
            },
        );
        let short = GradingService::grade(
            &key,
            &UserAnswer::ComplexSelection {
                selections: selections(&[Some("a")]),
            },
        );

        assert_eq!(full.is_correct, Some(true));
        assert_eq!(full.partial_score, Some(100));
        assert_eq!(one_wrong.is_correct, Some(false));
        assert_eq!(one_wrong.partial_score, Some(67));
        assert_eq!(short.is_correct, Some(false));
        assert_eq!(short.partial_score, Some(33));
    }

    #[test]
    fn fill_in_normalizes_case_and_whitespace() {
        let insensitive = fill_in_key(&["Jakarta"], false, None);
        let sensitive = fill_in_key(&["Jakarta"], true, None);

        assert_eq!(
            GradingService::grade(&insensitive, &fill_in("jakarta ")).is_correct,
            Some(true)
        );
        assert_eq!(
            GradingService::grade(&sensitive, &fill_in("jakarta ")).is_correct,
            Some(false)
        );
        assert_eq!(
            GradingService::grade(&sensitive, &fill_in(" Jakarta")).is_correct,
            Some(true)
        );
    }

    #[test]
    fn fill_in_falls_back_to_pattern_on_raw_value() {
        let key = fill_in_key(&["0.5"], false, Some(r"^\s*1\s*/\s*2\s*$"));

        assert_eq!(GradingService::grade(&key, &fill_in(" 1 / 2")).is_correct, Some(true));
        assert_eq!(GradingService::grade(&key, &fill_in("2/1")).is_correct, Some(false));
    }

    #[test]
    fn fill_in_pattern_honors_case_sensitivity() {
        let insensitive = fill_in_key(&[], false, Some("^abc$"));
        let sensitive = fill_in_key(&[], true, Some("^abc$"));

        assert_eq!(GradingService::grade(&insensitive, &fill_in("ABC")).is_correct, Some(true));
        assert_eq!(GradingService::grade(&sensitive, &fill_in("ABC")).is_correct, Some(false));
    }

    #[test]
    fn malformed_pattern_is_treated_as_no_match() {
        let key = fill_in_key(&["yes"], false, Some("(unclosed"));

        let outcome = GradingService::grade(&key, &fill_in("no"));

        assert_eq!(outcome, GradeOutcome::judged(false));
    }

    #[test]
    fn mismatched_types_are_ungraded() {
        let key = AnswerKey::SingleChoice {
            correct: "A".to_string(),
        };

        let outcome = GradingService::grade(&key, &fill_in("A"));

        assert_eq!(outcome, GradeOutcome::UNGRADED);
    }

    #[test]
    fn grading_is_deterministic() {
        let key = AnswerKey::ComplexSelection {
            rows: rows(&["1", "2", "3"]),
        };
        let answer = UserAnswer::ComplexSelection {
            selections: selections(&[Some("1"), None, Some("4")]),
        };

        let first = GradingService::grade(&key, &answer);
        let second = GradingService::grade(&key, &answer);

        assert_eq!(first, second);
    }
}
