/// Terminal rendering of the grid and the viewer overlays
use phf::phf_map;
use ratatui::{
    layout::{Constraint, Flex, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Clear, Paragraph, Wrap},
    Frame,
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

use crate::dataset::PhotoRef;
use crate::stats::ContestStats;

use super::grid::{GridModel, ThumbRef, ThumbnailStatus, THUMB_COLUMNS};
use super::state::{AppState, Modal, PhotoStatus};
use super::surface::Hitbox;

/// Accent color per course code
static COURSE_COLORS: phf::Map<&'static str, Color> = phf_map! {
    "BCA" => Color::Cyan,
    "BBA" => Color::Yellow,
    "BCOM" => Color::Green,
    "MCA" => Color::LightBlue,
    "MBA" => Color::LightMagenta,
    "BSC" => Color::LightGreen,
    "BA" => Color::LightRed,
};

pub fn course_color(course: &str) -> Color {
    COURSE_COLORS
        .get(course.trim().to_uppercase().as_str())
        .copied()
        .unwrap_or(Color::Gray)
}

/// Cut `text` to at most `width` display columns, marking the cut with …
pub fn truncate(text: &str, width: usize) -> String {
    if text.width() <= width {
        return text.to_string();
    }
    let mut out = String::new();
    let mut used = 0;
    for c in text.chars() {
        let w = c.width().unwrap_or(0);
        if used + w + 1 > width {
            break;
        }
        out.push(c);
        used += w;
    }
    out.push('…');
    out
}

fn format_size(bytes: usize) -> String {
    if bytes >= 1024 * 1024 {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}

fn centered(area: Rect, percent_x: u16, percent_y: u16) -> Rect {
    let [area] = Layout::horizontal([Constraint::Percentage(percent_x)])
        .flex(Flex::Center)
        .areas(area);
    let [area] = Layout::vertical([Constraint::Percentage(percent_y)])
        .flex(Flex::Center)
        .areas(area);
    area
}

/// Draw everything; returns clickable thumbnail regions
pub fn draw(frame: &mut Frame, state: &AppState, grid: &GridModel) -> Vec<Hitbox> {
    let [header, body, footer] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(1),
    ])
    .areas(frame.area());

    draw_header(frame, header, state, grid);
    let hitboxes = draw_grid(frame, body, state, grid);
    draw_status(frame, footer, state);

    match state.viewer.active_modal {
        Modal::None => return hitboxes,
        Modal::Gallery => draw_viewer(frame, body, state),
        Modal::TeamDetails => {
            draw_viewer(frame, body, state);
            draw_team_details(frame, body, state);
        }
        Modal::Stats => draw_stats(frame, body, state),
    }
    // Overlays cover the grid
    Vec::new()
}

fn draw_header(frame: &mut Frame, area: Rect, state: &AppState, grid: &GridModel) {
    let line = Line::from(vec![
        Span::styled(" Team Photo Gallery ", Style::default().add_modifier(Modifier::BOLD)),
        Span::raw(format!(
            "| {} teams | {} photos",
            grid.len(),
            state.data.total_photos()
        )),
    ]);
    frame.render_widget(Paragraph::new(line), area);
}

fn draw_status(frame: &mut Frame, area: Rect, state: &AppState) {
    let system = &state.system;
    let text = system.status_message.as_deref().unwrap_or_default();
    let span = if system.status_is_error {
        Span::styled(format!(" ERROR: {}", text), Style::default().fg(Color::Red))
    } else {
        Span::styled(format!(" {}", text), Style::default().fg(Color::DarkGray))
    };
    frame.render_widget(Paragraph::new(Line::from(span)), area);
}

fn thumb_label(status: ThumbnailStatus, photo: usize) -> String {
    match status {
        ThumbnailStatus::Idle => format!("[{}] ·", photo),
        ThumbnailStatus::Loading => format!("[{}] loading…", photo),
        ThumbnailStatus::Loaded { bytes } => format!("[{}] ■ {}", photo, format_size(bytes)),
        ThumbnailStatus::Placeholder => format!("[{}] ✗ missing", photo),
    }
}

fn card_lines(state: &AppState, grid: &GridModel, card_index: usize, width: u16) -> Vec<Line<'static>> {
    let card = &grid.cards()[card_index];
    let cell_width = (width as usize / THUMB_COLUMNS).saturating_sub(1);
    let inner = (width as usize).saturating_sub(2);

    let mut lines = vec![
        Line::from(Span::styled(
            truncate(&format!(" #{} {}", card.team_number, card.team_name), inner),
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(vec![
            Span::styled(format!(" {}", card.course), Style::default().fg(course_color(&card.course))),
            Span::raw(format!(" | Sem {} | {} members", card.semester, card.member_count)),
        ]),
        Line::from(Span::styled(
            format!(" {}", "─".repeat(inner.saturating_sub(1))),
            Style::default().fg(Color::DarkGray),
        )),
    ];

    for row in 0..card.thumb_rows() as usize {
        let mut spans = vec![Span::raw(" ")];
        for col in 0..THUMB_COLUMNS {
            let photo = row * THUMB_COLUMNS + col + 1;
            if photo > card.photo_count {
                break;
            }
            let status = state
                .grid
                .thumbnail_status(PhotoRef::new(card.team_number, photo));
            let label = truncate(&thumb_label(status, photo), cell_width);
            let padded = format!("{:<width$}", label, width = cell_width);
            let selected = state.grid.selection == Some(ThumbRef { card: card_index, photo });
            let style = match (selected, status) {
                (true, _) => Style::default().add_modifier(Modifier::REVERSED),
                (false, ThumbnailStatus::Placeholder) => Style::default().fg(Color::DarkGray),
                (false, ThumbnailStatus::Loaded { .. }) => Style::default().fg(Color::White),
                _ => Style::default().fg(Color::Gray),
            };
            spans.push(Span::styled(padded, style));
        }
        lines.push(Line::from(spans));
        lines.push(Line::raw(""));
        lines.push(Line::raw(""));
    }
    lines
}

fn draw_grid(frame: &mut Frame, area: Rect, state: &AppState, grid: &GridModel) -> Vec<Hitbox> {
    let layout = &state.grid.layout;
    let per_row = layout.cards_per_row() as u16;
    let card_width = area.width / per_row.max(1);
    let scroll = state.grid.scroll_top;
    let view_end = scroll + area.height as u32;
    let mut hitboxes = Vec::new();

    if grid.is_empty() {
        frame.render_widget(Paragraph::new(" No teams in the dataset"), area);
        return hitboxes;
    }

    for (index, card) in grid.cards().iter().enumerate() {
        let Some(top) = layout.card_top(index) else {
            continue;
        };
        let bottom = top + card.height();
        let start = top.max(scroll);
        let end = bottom.min(view_end);
        if start >= end {
            continue;
        }

        let x = area.x + layout.card_column(index) as u16 * card_width;
        let rect = Rect::new(x, area.y + (start - scroll) as u16, card_width, (end - start) as u16);
        let lines = card_lines(state, grid, index, card_width);
        frame.render_widget(Paragraph::new(lines).scroll(((start - top) as u16, 0)), rect);

        for photo in 1..=card.photo_count {
            let thumb = ThumbRef { card: index, photo };
            let Some((t_top, t_bottom)) = layout.thumbnail_span(thumb) else {
                continue;
            };
            let (t_start, t_end) = (t_top.max(scroll), t_bottom.min(view_end));
            if t_start >= t_end {
                continue;
            }
            let half = card_width / THUMB_COLUMNS as u16;
            hitboxes.push(Hitbox {
                area: Rect::new(
                    x + ((photo - 1) % THUMB_COLUMNS) as u16 * half,
                    area.y + (t_start - scroll) as u16,
                    half,
                    (t_end - t_start) as u16,
                ),
                photo: PhotoRef::new(card.team_number, photo),
            });
        }
    }
    hitboxes
}

fn rotation_arrow(rotation: u16) -> &'static str {
    match rotation {
        0 => "↑",
        90 => "→",
        180 => "↓",
        270 => "←",
        _ => "↻",
    }
}

fn draw_viewer(frame: &mut Frame, area: Rect, state: &AppState) {
    let popup = centered(area, 90, 90);
    frame.render_widget(Clear, popup);

    let viewer = &state.viewer;
    let Some(current) = viewer.current else {
        return;
    };
    let team = state.data.team(current.team);
    let title = match team {
        Some(t) => format!(
            " Team {} | {} | Photo {}/{} ",
            t.team_number,
            t.team_name,
            current.photo,
            t.photo_count()
        ),
        None => format!(" Team {} ", current.team),
    };
    let block = Block::bordered().title(title);
    let inner = block.inner(popup);
    frame.render_widget(block, popup);

    let [info, canvas, hints] = Layout::vertical([
        Constraint::Length(3),
        Constraint::Min(3),
        Constraint::Length(1),
    ])
    .areas(inner);

    let status_line = match &viewer.photo {
        PhotoStatus::Idle => Line::raw(" "),
        PhotoStatus::Loading => Line::styled(" Loading…", Style::default().fg(Color::Yellow)),
        PhotoStatus::Ready(handle) => Line::raw(format!(
            " {} ({})",
            handle.url(),
            format_size(handle.len())
        )),
        PhotoStatus::Placeholder(reason) => Line::styled(
            format!(" Image unavailable: {}", reason),
            Style::default().fg(Color::Red),
        ),
    };
    let t = viewer.transform;
    let transform_line = Line::raw(format!(
        " Zoom {:.0}% | Rotation {}° | Pan ({:.0}, {:.0})",
        t.scale * 100.0,
        t.rotation,
        t.pan.0,
        t.pan.1
    ));
    let css_line = Line::styled(format!(" {}", t.css()), Style::default().fg(Color::DarkGray));
    frame.render_widget(Paragraph::new(vec![status_line, transform_line, css_line]), info);

    frame.render_widget(
        Paragraph::new(Line::styled(
            " ←→ photo  ↑↓ team  r/l rotate  +/-/0 zoom  i info  v vote  F5 reload  Esc close",
            Style::default().fg(Color::DarkGray),
        )),
        hints,
    );

    if canvas.width < 3 || canvas.height < 3 {
        return;
    }

    // Photo frame sized by zoom and shifted by pan
    let frame_width = ((canvas.width as f32 * 0.5 * t.scale) as u16).clamp(3, canvas.width);
    let frame_height = ((canvas.height as f32 * 0.5 * t.scale) as u16).clamp(3, canvas.height);
    let cx = canvas.x as f32 + (canvas.width.saturating_sub(frame_width)) as f32 / 2.0 + t.pan.0;
    let cy = canvas.y as f32 + (canvas.height.saturating_sub(frame_height)) as f32 / 2.0 + t.pan.1;
    let max_x = (canvas.x + canvas.width - frame_width) as f32;
    let max_y = (canvas.y + canvas.height - frame_height) as f32;
    let photo_rect = Rect::new(
        cx.clamp(canvas.x as f32, max_x) as u16,
        cy.clamp(canvas.y as f32, max_y) as u16,
        frame_width,
        frame_height,
    );
    let border = match viewer.photo {
        PhotoStatus::Ready(_) => Color::White,
        PhotoStatus::Placeholder(_) => Color::Red,
        _ => Color::DarkGray,
    };
    frame.render_widget(
        Block::bordered()
            .border_style(Style::default().fg(border))
            .title(format!(" {} ", rotation_arrow(t.rotation))),
        photo_rect,
    );
}

fn draw_team_details(frame: &mut Frame, area: Rect, state: &AppState) {
    let Some(team) = state
        .viewer
        .current
        .and_then(|p| state.data.team(p.team))
    else {
        return;
    };

    let popup = centered(area, 60, 70);
    frame.render_widget(Clear, popup);

    let label = Style::default().fg(Color::DarkGray);
    let mut lines = vec![
        Line::from(vec![Span::styled("Team      ", label), Span::raw(format!("#{} {}", team.team_number, team.team_name))]),
        Line::from(vec![
            Span::styled("Course    ", label),
            Span::styled(team.course.clone(), Style::default().fg(course_color(&team.course))),
        ]),
        Line::from(vec![Span::styled("Batch     ", label), Span::raw(team.batch.clone())]),
        Line::from(vec![Span::styled("Semester  ", label), Span::raw(team.semester.to_string())]),
        Line::from(vec![Span::styled("Contact   ", label), Span::raw(team.contact.clone())]),
        Line::from(vec![Span::styled("Uploaded  ", label), Span::raw(team.upload_time.clone())]),
        Line::from(vec![Span::styled("Photos    ", label), Span::raw(team.photo_count().to_string())]),
        Line::raw(""),
        Line::styled("Members", Style::default().add_modifier(Modifier::BOLD)),
    ];
    lines.extend(team.members.iter().map(|m| Line::raw(format!("  • {}", m))));
    if let Some(notes) = team.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        lines.push(Line::raw(""));
        lines.push(Line::styled("Notes", Style::default().add_modifier(Modifier::BOLD)));
        lines.push(Line::raw(format!("  {}", notes)));
    }
    if team.is_incomplete() {
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            "Submission is missing photos",
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::bordered().title(" Team details (i / Esc to close) "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}

fn breakdown<K: std::fmt::Display>(title: &str, items: impl Iterator<Item = (K, usize)>) -> Vec<Line<'static>> {
    let mut lines = vec![Line::styled(title.to_string(), Style::default().add_modifier(Modifier::BOLD))];
    lines.extend(items.map(|(k, n)| Line::raw(format!("  {:<12} {}", k.to_string(), n))));
    lines
}

fn draw_stats(frame: &mut Frame, area: Rect, state: &AppState) {
    let stats = ContestStats::from_dataset(&state.data);
    let popup = centered(area, 60, 80);
    frame.render_widget(Clear, popup);

    let mut lines = vec![
        Line::raw(format!("Total teams    {}", stats.total_teams)),
        Line::raw(format!("Total members  {}", stats.total_members)),
        Line::raw(format!("Total photos   {}", stats.total_photos)),
        Line::raw(format!("Courses        {}", stats.course_count())),
        Line::raw(""),
    ];

    lines.push(Line::styled("By course", Style::default().add_modifier(Modifier::BOLD)));
    lines.extend(stats.by_course.iter().map(|(course, n)| {
        Line::from(vec![
            Span::styled(format!("  {:<12}", course), Style::default().fg(course_color(course))),
            Span::raw(format!(" {}", n)),
        ])
    }));
    lines.push(Line::raw(""));
    lines.extend(breakdown("By batch", stats.by_batch.iter().map(|(b, n)| (b.clone(), *n))));
    lines.push(Line::raw(""));
    lines.extend(breakdown("By semester", stats.by_semester.iter().map(|(s, n)| (*s, *n))));

    if !stats.incomplete_teams.is_empty() {
        let teams: Vec<String> = stats.incomplete_teams.iter().map(|t| t.to_string()).collect();
        lines.push(Line::raw(""));
        lines.push(Line::styled(
            format!("Incomplete submissions: {}", teams.join(", ")),
            Style::default().fg(Color::Yellow),
        ));
    }

    let paragraph = Paragraph::new(lines)
        .block(Block::bordered().title(" Contest statistics (Esc to close) "))
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, popup);
}
