/// Contest totals shown in the stats overlay and the `stats` command
use std::collections::BTreeMap;

use crate::dataset::Dataset;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ContestStats {
    pub total_teams: usize,
    pub total_members: usize,
    pub total_photos: usize,
    /// Team numbers that submitted fewer photos than expected
    pub incomplete_teams: Vec<u32>,
    pub by_course: BTreeMap<String, usize>,
    pub by_batch: BTreeMap<String, usize>,
    pub by_semester: BTreeMap<u32, usize>,
}

impl ContestStats {
    pub fn from_dataset(dataset: &Dataset) -> Self {
        let mut stats = ContestStats {
            total_teams: dataset.len(),
            total_photos: dataset.total_photos(),
            ..Default::default()
        };

        for team in dataset.sorted_teams() {
            stats.total_members += team.members.len();
            if team.is_incomplete() {
                stats.incomplete_teams.push(team.team_number);
            }
            *stats.by_course.entry(team.course.clone()).or_insert(0) += 1;
            *stats.by_batch.entry(team.batch.clone()).or_insert(0) += 1;
            *stats.by_semester.entry(team.semester).or_insert(0) += 1;
        }

        stats
    }

    /// Number of distinct courses represented
    pub fn course_count(&self) -> usize {
        self.by_course.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::dataset_with;

    #[test]
    fn test_from_dataset() {
        let dataset = dataset_with(&[(1, 4), (2, 3), (3, 4), (4, 0)]);
        let stats = ContestStats::from_dataset(&dataset);

        assert_eq!(stats.total_teams, 4);
        assert_eq!(stats.total_members, 8);
        assert_eq!(stats.total_photos, 11);
        assert_eq!(stats.incomplete_teams, vec![2, 4]);
        assert_eq!(stats.course_count(), 3);
        assert_eq!(stats.by_course.get("BBA"), Some(&2));
        assert_eq!(stats.by_batch.get("2023-26"), Some(&4));
    }

    #[test]
    fn test_empty_dataset() {
        let stats = ContestStats::from_dataset(&Dataset::default());
        assert_eq!(stats, ContestStats::default());
    }
}
