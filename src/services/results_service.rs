use crate::models::domain::{
    attempt_item::AttemptItem,
    blueprint::BlueprintSection,
    results::{AttemptResults, SectionResults},
};

/// How items are grouped for aggregation.
#[derive(Clone, Copy, Debug)]
pub enum ResultGrouping<'a> {
    /// Practice: one group, optionally capped at the session time limit.
    Whole { time_cap_seconds: Option<i64> },
    /// Tryout: one group per blueprint section.
    Sections(&'a [BlueprintSection]),
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct Tally {
    total: u32,
    correct: u32,
    wrong: u32,
    blank: u32,
    time_seconds: i64,
}

impl Tally {
    fn record(&mut self, item: &AttemptItem) {
        self.total += 1;
        match item.is_correct {
            Some(true) => self.correct += 1,
            Some(false) => self.wrong += 1,
            None => self.blank += 1,
        }
        self.time_seconds += item.time_spent_seconds.unwrap_or(0).max(0);
    }

    fn cap_time(&mut self, cap_seconds: Option<i64>) {
        if let Some(cap) = cap_seconds {
            self.time_seconds = self.time_seconds.min(cap.max(0));
        }
    }

    fn add(&mut self, other: &Tally) {
        self.total += other.total;
        self.correct += other.correct;
        self.wrong += other.wrong;
        self.blank += other.blank;
        self.time_seconds += other.time_seconds;
    }

    fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        let percent = self.correct as f64 / self.total as f64 * 100.0;
        (percent * 100.0).round() / 100.0
    }

    fn avg_time_per_question(&self) -> i64 {
        if self.total == 0 {
            return 0;
        }
        (self.time_seconds as f64 / self.total as f64).round() as i64
    }
}

/// Computes final statistics from an attempt's graded items.
pub struct ResultsAggregator {
    cap_time_at_section_duration: bool,
}

impl ResultsAggregator {
    pub fn new(cap_time_at_section_duration: bool) -> Self {
        Self {
            cap_time_at_section_duration,
        }
    }

    pub fn aggregate(&self, items: &[AttemptItem], grouping: ResultGrouping<'_>) -> AttemptResults {
        match grouping {
            ResultGrouping::Whole { time_cap_seconds } => {
                let mut tally = Tally::default();
                items.iter().for_each(|item| tally.record(item));
                if self.cap_time_at_section_duration {
                    tally.cap_time(time_cap_seconds);
                }
                Self::build(&tally, None)
            }
            ResultGrouping::Sections(sections) => self.aggregate_sections(items, sections),
        }
    }

    fn aggregate_sections(&self, items: &[AttemptItem], sections: &[BlueprintSection]) -> AttemptResults {
        let mut tallies = vec![Tally::default(); sections.len()];

        for item in items {
            match item
                .section_index
                .and_then(|index| tallies.get_mut(index as usize))
            {
                Some(tally) => tally.record(item),
                None => log::warn!(
                    "Item '{}' of attempt '{}' has no valid section index ({:?}); excluded from results",
                    item.id,
                    item.attempt_id,
                    item.section_index
                ),
            }
        }

        let mut overall = Tally::default();
        let per_section = sections
            .iter()
            .zip(tallies.iter_mut())
            .enumerate()
            .map(|(index, (section, tally))| {
                if self.cap_time_at_section_duration {
                    tally.cap_time(Some(section.duration_seconds));
                }
                overall.add(tally);

                SectionResults {
                    section_index: index as u32,
                    subtest_id: section.subtest_id.clone(),
                    name: section.name.clone(),
                    total_questions: tally.total,
                    correct_count: tally.correct,
                    wrong_count: tally.wrong,
                    blank_count: tally.blank,
                    accuracy: tally.accuracy(),
                    total_time_seconds: tally.time_seconds,
                    avg_time_per_question: tally.avg_time_per_question(),
                }
            })
            .collect();

        Self::build(&overall, Some(per_section))
    }

    fn build(overall: &Tally, per_section: Option<Vec<SectionResults>>) -> AttemptResults {
        AttemptResults {
            total_questions: overall.total,
            correct_count: overall.correct,
            wrong_count: overall.wrong,
            blank_count: overall.blank,
            accuracy: overall.accuracy(),
            total_time_seconds: overall.time_seconds,
            avg_time_per_question: overall.avg_time_per_question(),
            per_section,
        }
    }
}
