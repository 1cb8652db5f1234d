use anyhow::Result;
use futures::future::join_all;
use std::path::Path;

use crate::dataset::{Dataset, PhotoRef};
use crate::loader::{FsImageLoader, ImageLoader};

/// Photos of a team that could not be read from disk
async fn missing_photos(loader: &FsImageLoader, dataset: &Dataset, team: u32) -> Vec<String> {
    let Some(record) = dataset.team(team) else {
        return Vec::new();
    };

    let checks = (1..=record.photo_count()).filter_map(|photo| {
        let url = dataset.photo_url(PhotoRef::new(team, photo))?.to_string();
        Some(async move {
            let result = loader.load(&url).await;
            (url, result)
        })
    });

    join_all(checks)
        .await
        .into_iter()
        .filter_map(|(url, result)| match result {
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("TEAMS: {} unreadable: {}", url, e);
                Some(url)
            }
        })
        .collect()
}

pub async fn run(dataset: &Dataset, images_dir: &Path, check: bool) -> Result<()> {
    println!("\nTeams");
    println!("=====\n");

    println!(
        "{:<5} {:<30} {:<8} {:<10} {:<4} {:<8} Photos",
        "#", "Team Name", "Course", "Batch", "Sem", "Members"
    );
    println!("{}", "─".repeat(80));

    let loader = FsImageLoader::new(images_dir);
    let mut unreadable = 0;

    for team in dataset.sorted_teams() {
        let flag = if team.is_incomplete() { " (incomplete)" } else { "" };
        println!(
            "{:<5} {:<30} {:<8} {:<10} {:<4} {:<8} {}{}",
            team.team_number,
            team.team_name,
            team.course,
            team.batch,
            team.semester,
            team.members.len(),
            team.photo_count(),
            flag
        );

        if check {
            let missing = missing_photos(&loader, dataset, team.team_number).await;
            for url in &missing {
                println!("      missing: {}", url);
            }
            unreadable += missing.len();
        }
    }

    println!();
    if check {
        println!("{} of {} photos unreadable", unreadable, dataset.total_photos());
        println!();
    }
    Ok(())
}
