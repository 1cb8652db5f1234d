/// Gallery grid: team cards, thumbnail layout and lazy loading
///
/// Cards appear in dataset order, `cards_per_row` to a row. Each card has a
/// header followed by its thumbnails in two columns. Layout units are
/// terminal rows; the same units are used for the lazy-load margin.
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::config::DEFAULT_LAZY_MARGIN;
use crate::dataset::{Dataset, PhotoRef};

/// Thumbnails per card row
pub const THUMB_COLUMNS: usize = 2;

/// Rows taken by a card's title, course line and border
pub const CARD_HEADER_HEIGHT: u32 = 3;

/// Rows taken by one row of thumbnails
pub const THUMB_ROW_HEIGHT: u32 = 3;

/// Minimum card width including margin
pub const CARD_WIDTH: u16 = 36;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Card {
    pub team_number: u32,
    pub team_name: String,
    pub course: String,
    pub semester: u32,
    pub member_count: usize,
    pub photo_count: usize,
}

impl Card {
    pub fn thumb_rows(&self) -> u32 {
        self.photo_count.div_ceil(THUMB_COLUMNS) as u32
    }

    pub fn height(&self) -> u32 {
        CARD_HEADER_HEIGHT + self.thumb_rows() * THUMB_ROW_HEIGHT
    }
}

/// One thumbnail cell: card index plus 1-based photo index
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ThumbRef {
    pub card: usize,
    pub photo: usize,
}

/// Card list built once from the dataset
#[derive(Debug, Clone, Default)]
pub struct GridModel {
    cards: Arc<[Card]>,
}

impl GridModel {
    pub fn build(dataset: &Dataset) -> Self {
        let cards: Vec<Card> = dataset
            .teams()
            .iter()
            .map(|t| Card {
                team_number: t.team_number,
                team_name: t.team_name.clone(),
                course: t.course.clone(),
                semester: t.semester,
                member_count: t.members.len(),
                photo_count: t.photo_count(),
            })
            .collect();
        Self {
            cards: cards.into(),
        }
    }

    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn photo_ref(&self, thumb: ThumbRef) -> Option<PhotoRef> {
        let card = self.cards.get(thumb.card)?;
        (thumb.photo >= 1 && thumb.photo <= card.photo_count)
            .then(|| PhotoRef::new(card.team_number, thumb.photo))
    }

    /// All thumbnails in reading order
    pub fn thumbs(&self) -> impl Iterator<Item = ThumbRef> + '_ {
        self.cards.iter().enumerate().flat_map(|(card, c)| {
            (1..=c.photo_count).map(move |photo| ThumbRef { card, photo })
        })
    }
}

/// Vertical placement of cards for a given row width
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GridLayout {
    cards_per_row: usize,
    row_tops: Vec<u32>,
    total_height: u32,
}

impl Default for GridLayout {
    fn default() -> Self {
        Self::compute(&GridModel::default(), 1)
    }
}

impl GridLayout {
    pub fn compute(model: &GridModel, cards_per_row: usize) -> Self {
        let cards_per_row = cards_per_row.max(1);
        let mut row_tops = Vec::new();
        let mut top = 0;
        for row in model.cards().chunks(cards_per_row) {
            row_tops.push(top);
            top += row.iter().map(Card::height).max().unwrap_or(CARD_HEADER_HEIGHT);
        }
        Self {
            cards_per_row,
            row_tops,
            total_height: top,
        }
    }

    pub fn cards_per_row(&self) -> usize {
        self.cards_per_row
    }

    pub fn total_height(&self) -> u32 {
        self.total_height
    }

    pub fn card_top(&self, card: usize) -> Option<u32> {
        self.row_tops.get(card / self.cards_per_row).copied()
    }

    pub fn card_column(&self, card: usize) -> usize {
        card % self.cards_per_row
    }

    /// Rows `[top, bottom)` covered by a thumbnail
    pub fn thumbnail_span(&self, thumb: ThumbRef) -> Option<(u32, u32)> {
        let card_top = self.card_top(thumb.card)?;
        let thumb_row = (thumb.photo.checked_sub(1)? / THUMB_COLUMNS) as u32;
        let top = card_top + CARD_HEADER_HEIGHT + thumb_row * THUMB_ROW_HEIGHT;
        Some((top, top + THUMB_ROW_HEIGHT))
    }
}

/// Reports thumbnails entering the (margin-expanded) viewport, once each
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LazyObserver {
    margin: u32,
    observed: HashSet<ThumbRef>,
}

impl Default for LazyObserver {
    fn default() -> Self {
        Self::new(DEFAULT_LAZY_MARGIN)
    }
}

impl LazyObserver {
    pub fn new(margin: u32) -> Self {
        Self {
            margin,
            observed: HashSet::new(),
        }
    }

    pub fn is_observed(&self, thumb: ThumbRef) -> bool {
        self.observed.contains(&thumb)
    }

    pub fn observed_count(&self) -> usize {
        self.observed.len()
    }

    pub fn intersecting(
        &mut self,
        model: &GridModel,
        layout: &GridLayout,
        viewport_top: u32,
        viewport_height: u32,
    ) -> Vec<ThumbRef> {
        let lo = viewport_top.saturating_sub(self.margin);
        let hi = viewport_top
            .saturating_add(viewport_height)
            .saturating_add(self.margin);

        let hits: Vec<ThumbRef> = model
            .thumbs()
            .filter(|t| !self.observed.contains(t))
            .filter(|&t| {
                layout
                    .thumbnail_span(t)
                    .is_some_and(|(top, bottom)| bottom > lo && top < hi)
            })
            .collect();
        self.observed.extend(hits.iter().copied());
        hits
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailStatus {
    #[default]
    Idle,
    Loading,
    Loaded {
        bytes: usize,
    },
    Placeholder,
}

#[derive(Debug, Clone, Default)]
pub struct GridState {
    pub model: GridModel,
    pub layout: GridLayout,
    pub scroll_top: u32,
    pub viewport_height: u32,
    pub selection: Option<ThumbRef>,
    pub thumbnails: HashMap<PhotoRef, ThumbnailStatus>,
    pub observer: LazyObserver,
}

impl GridState {
    pub fn new(dataset: &Dataset, lazy_margin: u32) -> Self {
        let model = GridModel::build(dataset);
        let layout = GridLayout::compute(&model, 1);
        let selection = model.thumbs().next();
        Self {
            model,
            layout,
            selection,
            observer: LazyObserver::new(lazy_margin),
            ..Default::default()
        }
    }

    pub fn thumbnail_status(&self, photo: PhotoRef) -> ThumbnailStatus {
        self.thumbnails.get(&photo).copied().unwrap_or_default()
    }

    pub fn selected_photo(&self) -> Option<PhotoRef> {
        self.selection.and_then(|t| self.model.photo_ref(t))
    }

    fn max_scroll(&self) -> u32 {
        self.layout.total_height().saturating_sub(self.viewport_height)
    }

    pub fn set_viewport(&mut self, height: u32, cards_per_row: usize) {
        if cards_per_row.max(1) != self.layout.cards_per_row() {
            self.layout = GridLayout::compute(&self.model, cards_per_row);
        }
        self.viewport_height = height;
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    pub fn scroll_by(&mut self, delta: i32) {
        let target = (self.scroll_top as i64 + delta as i64).max(0) as u32;
        self.scroll_top = target.min(self.max_scroll());
    }

    /// Move the selection: `dx` steps through thumbnails in reading order,
    /// `dy` jumps whole card rows keeping the photo index where possible
    pub fn move_selection(&mut self, dx: i32, dy: i32) {
        let Some(current) = self.selection else {
            self.selection = self.model.thumbs().next();
            return;
        };

        let mut next = current;
        if dx != 0 {
            let thumbs: Vec<ThumbRef> = self.model.thumbs().collect();
            if let Some(pos) = thumbs.iter().position(|t| *t == current) {
                let target = (pos as i64 + dx as i64).clamp(0, thumbs.len() as i64 - 1);
                next = thumbs[target as usize];
            }
        }
        if dy != 0 {
            let step = dy as i64 * self.layout.cards_per_row() as i64;
            let card = next.card as i64 + step;
            // Skip cards without photos in the direction of travel
            let mut candidate = card;
            while (0..self.model.len() as i64).contains(&candidate) {
                let c = &self.model.cards()[candidate as usize];
                if c.photo_count > 0 {
                    next = ThumbRef {
                        card: candidate as usize,
                        photo: next.photo.min(c.photo_count),
                    };
                    break;
                }
                candidate += dy.signum() as i64;
            }
        }

        self.selection = Some(next);
        self.ensure_visible(next);
    }

    fn ensure_visible(&mut self, thumb: ThumbRef) {
        let Some((top, bottom)) = self.layout.thumbnail_span(thumb) else {
            return;
        };
        let card_top = self.layout.card_top(thumb.card).unwrap_or(top);
        if card_top < self.scroll_top || top < self.scroll_top {
            self.scroll_top = card_top.min(top);
        } else if bottom > self.scroll_top + self.viewport_height {
            self.scroll_top = bottom.saturating_sub(self.viewport_height);
        }
    }

    /// Photos that just came within lazy-load range
    pub fn observe(&mut self) -> Vec<PhotoRef> {
        let hits = self.observer.intersecting(
            &self.model,
            &self.layout,
            self.scroll_top,
            self.viewport_height,
        );
        hits.into_iter()
            .filter_map(|t| self.model.photo_ref(t))
            .collect()
    }
}
