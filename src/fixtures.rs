/// Fixture data for tests and benchmarks
///
/// Deterministic team records shaped like a real contest export: four photos
/// per team under `image/<team_number>/PhotoN.jpg`, a mix of courses and
/// semesters.
use crate::dataset::{Dataset, TeamRecord};

const COURSES: [&str; 3] = ["BCA", "BBA", "BCom"];

/// Build one team with `photos` images
pub fn team(team_number: u32, photos: usize) -> TeamRecord {
    TeamRecord {
        team_number,
        team_name: format!("Team {}", team_number),
        members: vec![
            format!("Member {}A", team_number),
            format!("Member {}B", team_number),
        ],
        course: COURSES[team_number as usize % COURSES.len()].to_string(),
        batch: "2023-26".to_string(),
        semester: (team_number % 6) + 1,
        contact: format!("90000 0000{}", team_number % 10),
        images: (1..=photos)
            .map(|i| format!("image/{}/Photo{}.jpg", team_number, i))
            .collect(),
        upload_time: "9/12/2025 10:00:00".to_string(),
        notes: None,
    }
}

/// Dataset with the given `(team_number, photo_count)` pairs, in that order
pub fn dataset_with(teams: &[(u32, usize)]) -> Dataset {
    let records = teams.iter().map(|&(n, photos)| team(n, photos)).collect();
    Dataset::from_teams(records).expect("fixture teams are valid")
}

/// Four complete teams numbered 1..=4
pub fn sample_dataset() -> Dataset {
    dataset_with(&[(1, 4), (2, 4), (3, 4), (4, 4)])
}

/// A larger dataset for benchmarks
pub fn large_dataset(team_count: u32) -> Dataset {
    let pairs: Vec<(u32, usize)> = (1..=team_count).map(|n| (n, 4)).collect();
    dataset_with(&pairs)
}
