use anyhow::Result;
use chrono::Local;

use crate::dataset::Dataset;
use crate::stats::ContestStats;

pub fn run(dataset: &Dataset) -> Result<()> {
    let stats = ContestStats::from_dataset(dataset);

    println!("\nContest Statistics");
    println!("==================\n");
    println!("Generated: {}", Local::now().format("%Y-%m-%d %H:%M:%S"));
    println!();

    println!("{:<20} {}", "Total teams", stats.total_teams);
    println!("{:<20} {}", "Total members", stats.total_members);
    println!("{:<20} {}", "Total photos", stats.total_photos);
    println!("{:<20} {}", "Courses", stats.course_count());

    println!("\n{:<20} Teams", "Course");
    println!("{}", "─".repeat(40));
    for (course, count) in &stats.by_course {
        println!("{:<20} {}", course, count);
    }

    println!("\n{:<20} Teams", "Batch");
    println!("{}", "─".repeat(40));
    for (batch, count) in &stats.by_batch {
        println!("{:<20} {}", batch, count);
    }

    println!("\n{:<20} Teams", "Semester");
    println!("{}", "─".repeat(40));
    for (semester, count) in &stats.by_semester {
        println!("{:<20} {}", semester, count);
    }

    if !stats.incomplete_teams.is_empty() {
        let teams: Vec<String> = stats.incomplete_teams.iter().map(|t| t.to_string()).collect();
        println!("\nIncomplete submissions: {}", teams.join(", "));
    }

    println!();
    Ok(())
}
