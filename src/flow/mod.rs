mod sections;
mod wrap;

pub use wrap::wrap_text;

pub(crate) use sections::assemble;

use crate::fonts::{FontSet, FontWeight};
use crate::model::SectionKind;
use crate::options::{PageGeometry, Typography};
use crate::portrait::Portrait;

/// Where the next block goes. `y` is measured downward from the page top.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LayoutCursor {
    pub page_index: usize,
    pub y: f32,
}

impl LayoutCursor {
    pub fn new(geometry: &PageGeometry) -> Self {
        LayoutCursor {
            page_index: 0,
            y: geometry.top_margin,
        }
    }
}

/// Page-break controller: start a new page when `required_height` would cross the
/// bottom margin. A cursor already at the top of a page is never moved, since the
/// block cannot fit any better on a fresh page.
pub fn reserve(cursor: LayoutCursor, required_height: f32, geometry: &PageGeometry) -> LayoutCursor {
    let at_top = (cursor.y - geometry.top_margin).abs() < 0.01;
    if cursor.y + required_height > geometry.content_bottom() && !at_top {
        LayoutCursor {
            page_index: cursor.page_index + 1,
            y: geometry.top_margin,
        }
    } else {
        cursor
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Item {
    Text {
        weight: FontWeight,
        size: f32,
        x: f32,
        /// Baseline, measured from the page top.
        baseline: f32,
        text: String,
        color: Option<[u8; 3]>,
    },
    Rule {
        x1: f32,
        x2: f32,
        y: f32,
        thickness: f32,
        color: [u8; 3],
    },
    Image {
        x: f32,
        top: f32,
        width: f32,
        height: f32,
    },
}

#[derive(Clone, Debug, Default)]
pub struct Page {
    pub items: Vec<Item>,
}

impl Page {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.items.iter().filter_map(|item| match item {
            Item::Text { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    Header,
    Divider,
    Heading,
    Paragraph,
    EntryLabel,
    Bullet,
    SkillGroup,
    ProjectTitle,
    Certificate,
}

/// A placed block: always fully inside one page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedBlock {
    pub page: usize,
    pub top: f32,
    pub height: f32,
    pub kind: BlockKind,
    pub section: SectionKind,
}

impl PlacedBlock {
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }
}

pub struct LaidOutDocument {
    pub geometry: PageGeometry,
    pub pages: Vec<Page>,
    pub blocks: Vec<PlacedBlock>,
    pub(crate) portrait: Option<Portrait>,
    pub(crate) title: String,
    pub(crate) author: String,
}

impl LaidOutDocument {
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    pub fn has_portrait(&self) -> bool {
        self.portrait.is_some()
    }

    /// Page index of the first text item equal to `text`.
    pub fn find_text(&self, text: &str) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.texts().any(|t| t == text))
    }

    pub fn blocks_in(&self, section: SectionKind) -> impl Iterator<Item = &PlacedBlock> {
        self.blocks.iter().filter(move |b| b.section == section)
    }
}

/// Owns the cursor and the pages produced so far; every mutation of the
/// layout state goes through its methods.
pub(crate) struct Flow<'a> {
    pub(crate) geometry: &'a PageGeometry,
    pub(crate) typography: &'a Typography,
    pub(crate) fonts: &'a FontSet,
    cursor: LayoutCursor,
    pages: Vec<Page>,
    blocks: Vec<PlacedBlock>,
}

impl<'a> Flow<'a> {
    pub(crate) fn new(geometry: &'a PageGeometry, typography: &'a Typography, fonts: &'a FontSet) -> Self {
        Flow {
            geometry,
            typography,
            fonts,
            cursor: LayoutCursor::new(geometry),
            pages: vec![Page::default()],
            blocks: Vec::new(),
        }
    }

    pub(crate) fn cursor(&self) -> LayoutCursor {
        self.cursor
    }

    pub(crate) fn line_height(&self, size: f32) -> f32 {
        self.typography.line_height_for(self.geometry, size)
    }

    /// Break to a new page if `height` does not fit below the cursor.
    pub(crate) fn reserve(&mut self, height: f32) {
        let next = reserve(self.cursor, height, self.geometry);
        if next.page_index != self.cursor.page_index {
            log::debug!(
                "page break at y={:.1} for {:.1}pt block → page {}",
                self.cursor.y,
                height,
                next.page_index + 1
            );
        }
        self.cursor = next;
        while self.pages.len() <= self.cursor.page_index {
            self.pages.push(Page::default());
        }
    }

    /// Record a block occupying `height` at the cursor. Does not advance.
    pub(crate) fn record(&mut self, height: f32, kind: BlockKind, section: SectionKind) {
        self.blocks.push(PlacedBlock {
            page: self.cursor.page_index,
            top: self.cursor.y,
            height,
            kind,
            section,
        });
    }

    pub(crate) fn advance(&mut self, dy: f32) {
        self.cursor.y += dy;
    }

    pub(crate) fn push(&mut self, item: Item) {
        self.pages[self.cursor.page_index].items.push(item);
    }

    /// Baseline of a line whose box starts at `line_top`.
    pub(crate) fn baseline(&self, line_top: f32, weight: FontWeight, size: f32) -> f32 {
        let line_h = self.line_height(size);
        let ascent = size * self.fonts.get(weight).ascender_ratio();
        line_top + (line_h - size) / 2.0 + ascent
    }

    pub(crate) fn finish(self, portrait: Option<Portrait>, title: String, author: String) -> LaidOutDocument {
        LaidOutDocument {
            geometry: *self.geometry,
            pages: self.pages,
            blocks: self.blocks,
            portrait,
            title,
            author,
        }
    }
}
