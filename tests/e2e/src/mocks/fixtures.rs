//! Test Data Factory
//!
//! Provides utilities for generating realistic test data:
//! - Study items with and without topics
//! - Batch generation for stress testing
//! - Recorded performance for completion journeys

use chrono::{DateTime, Duration, NaiveDate, TimeZone, Utc};
use studyplan_core::{DateRange, PerformanceData, StudyItem};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let items = TestDataFactory::create_batch(ItemBatch { count: 20, ..Default::default() });
/// let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 2);
/// ```
pub struct TestDataFactory;

/// Configuration for batch item generation
#[derive(Debug, Clone)]
pub struct ItemBatch {
    /// Number of items to create
    pub count: usize,
    /// Smallest estimate
    pub min_minutes: u32,
    /// Largest estimate
    pub max_minutes: u32,
    /// Topic shared by every item
    pub topic: Option<String>,
    /// Id and title prefix
    pub prefix: String,
}

impl Default for ItemBatch {
    fn default() -> Self {
        Self {
            count: 10,
            min_minutes: 30,
            max_minutes: 180,
            topic: None,
            prefix: "item".to_string(),
        }
    }
}

/// How well a learner did in a session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PerformanceProfile {
    /// All sub-scores at 4
    Perfect,
    /// Middling scores, rated Good
    Steady,
    /// Low scores, rated Hard
    Shaky,
    /// Explicit Again
    Forgotten,
}

impl PerformanceProfile {
    pub fn data(&self) -> PerformanceData {
        let scores = |v: f64| PerformanceData {
            time_score: Some(v),
            flashcard_score: Some(v),
            question_score: Some(v),
            completion_score: Some(v),
            rating: None,
        };
        match self {
            PerformanceProfile::Perfect => scores(4.0),
            PerformanceProfile::Steady => scores(3.0),
            PerformanceProfile::Shaky => scores(2.0),
            PerformanceProfile::Forgotten => PerformanceData {
                rating: Some(1),
                ..scores(0.5)
            },
        }
    }
}

impl TestDataFactory {
    // ========================================================================
    // DATES
    // ========================================================================

    /// A fixed Monday so weekday/weekend rules are predictable
    pub fn monday() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, 3).expect("valid date")
    }

    /// `days` consecutive days starting at `start`
    pub fn days_from(start: NaiveDate, days: i64) -> DateRange {
        DateRange::new(start, start + Duration::days(days - 1)).expect("non-empty range")
    }

    pub fn weeks_from(start: NaiveDate, weeks: i64) -> DateRange {
        Self::days_from(start, weeks * 7)
    }

    /// Evening of `date`, when sessions get completed
    pub fn evening(date: NaiveDate) -> DateTime<Utc> {
        Utc.from_utc_datetime(&date.and_hms_opt(20, 0, 0).expect("valid time"))
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    pub fn item(id: &str, title: &str, minutes: u32) -> StudyItem {
        StudyItem::new(id, title, minutes)
    }

    pub fn topic_item(id: &str, title: &str, minutes: u32, topic: &str, subtopic: Option<&str>) -> StudyItem {
        StudyItem::new(id, title, minutes).with_topic(topic, subtopic.map(String::from))
    }

    /// A batch of items with estimates spread over the configured span
    pub fn create_batch(config: ItemBatch) -> Vec<StudyItem> {
        let span = config.max_minutes.saturating_sub(config.min_minutes).max(1);
        (0..config.count)
            .map(|i| {
                let minutes = config.min_minutes + (i as u32 * 37) % span;
                let item = StudyItem::new(
                    format!("{}-{}", config.prefix, i),
                    format!("{} {}", config.prefix, i),
                    minutes,
                );
                match &config.topic {
                    Some(topic) => item.with_topic(topic.clone(), None),
                    None => item,
                }
            })
            .collect()
    }

    /// A small exam syllabus across three topics
    pub fn syllabus() -> Vec<StudyItem> {
        vec![
            Self::topic_item("kinematics", "Kinematics", 90, "physics", Some("mechanics")),
            Self::topic_item("optics", "Geometric optics", 60, "physics", Some("optics")),
            Self::topic_item("genetics", "Mendelian genetics", 120, "biology", None),
            Self::topic_item("acids", "Acids and bases", 75, "chemistry", Some("acids")),
        ]
    }

    pub fn total_minutes(items: &[StudyItem]) -> u64 {
        items.iter().map(|i| u64::from(i.estimated_minutes)).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_batch_within_bounds() {
        let items = TestDataFactory::create_batch(ItemBatch {
            count: 50,
            min_minutes: 20,
            max_minutes: 100,
            ..Default::default()
        });
        assert_eq!(items.len(), 50);
        assert!(items.iter().all(|i| (20..100).contains(&i.estimated_minutes)));
    }

    #[test]
    fn test_weeks_from() {
        let range = TestDataFactory::weeks_from(TestDataFactory::monday(), 2);
        assert_eq!(range.len_days(), 14);
    }

    #[test]
    fn test_profiles() {
        assert_eq!(PerformanceProfile::Forgotten.data().rating, Some(1));
        assert_eq!(PerformanceProfile::Perfect.data().question_score, Some(4.0));
    }
}
