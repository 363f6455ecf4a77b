#![allow(dead_code)]

use std::cell::Cell;
use std::fs;
use std::io::Cursor;
use std::path::PathBuf;

use cvpress::{
    ContactDetails, ExperienceEntry, ImageFetcher, Item, LaidOutDocument, PageGeometry,
    PortraitError, ProfileDocument, RenderOptions, SectionKind, Skill,
};

/// Output directory for a test case: tests/output/<case>/
pub fn output_dir(case: &str) -> PathBuf {
    let dir = PathBuf::from("tests/output").join(case);
    fs::create_dir_all(&dir).expect("create output dir");
    dir
}

/// 800pt tall page, margins left 40, right 40, top 60, bottom 50.
pub fn compact_geometry() -> PageGeometry {
    PageGeometry {
        page_height: 800.0,
        left_margin: 40.0,
        right_margin: 40.0,
        top_margin: 60.0,
        bottom_margin: 50.0,
        ..PageGeometry::a4()
    }
}

pub fn options_with(geometry: PageGeometry) -> RenderOptions {
    RenderOptions {
        geometry,
        ..RenderOptions::default()
    }
}

pub fn ada() -> ProfileDocument {
    ProfileDocument {
        identity: cvpress::Identity {
            full_name: "Ada Lovelace".into(),
            photo_url: None,
        },
        contact: ContactDetails {
            email: Some("ada@example.com".into()),
            phone: None,
            link: None,
            location: Some("London".into()),
        },
        experience: vec![ExperienceEntry {
            role: "Analyst".into(),
            organization: "Babbage & Co".into(),
            period: "1842 \u{2013} 1843".into(),
            bullets: vec![
                "Translated the Menabrea memoir".into(),
                "Wrote the Bernoulli program".into(),
                "Described general computation".into(),
            ],
        }],
        skills: vec![skill("C++", "Languages"), skill("Assembly", "Languages")],
        ..ProfileDocument::default()
    }
}

pub fn skill(name: &str, category: &str) -> Skill {
    Skill {
        display_name: name.into(),
        category: category.into(),
    }
}

/// Fetcher for profiles without a photo. Fails the test if it is ever asked.
pub struct NoImage;

impl ImageFetcher for NoImage {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, PortraitError> {
        panic!("unexpected fetch of {url}");
    }
}

/// Serves fixed bytes and counts calls.
pub struct StaticFetcher {
    pub bytes: Vec<u8>,
    pub calls: Cell<usize>,
}

impl StaticFetcher {
    pub fn new(bytes: Vec<u8>) -> Self {
        StaticFetcher {
            bytes,
            calls: Cell::new(0),
        }
    }
}

impl ImageFetcher for StaticFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, PortraitError> {
        self.calls.set(self.calls.get() + 1);
        Ok(self.bytes.clone())
    }
}

/// Answers every request like a server returning 404.
pub struct FailingFetcher {
    pub calls: Cell<usize>,
}

impl FailingFetcher {
    pub fn new() -> Self {
        FailingFetcher { calls: Cell::new(0) }
    }
}

impl ImageFetcher for FailingFetcher {
    fn fetch(&self, _url: &str) -> Result<Vec<u8>, PortraitError> {
        self.calls.set(self.calls.get() + 1);
        Err(PortraitError::Status(404))
    }
}

pub fn png_bytes(width: u32, height: u32, translucent: bool) -> Vec<u8> {
    let alpha = if translucent { 128 } else { 255 };
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 120, 40, alpha]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Png)
        .expect("encode png");
    out.into_inner()
}

pub fn jpeg_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([30, 90, 160]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, image::ImageFormat::Jpeg)
        .expect("encode jpeg");
    out.into_inner()
}

/// Every recorded block lies inside the content area of its page.
pub fn assert_no_straddle(doc: &LaidOutDocument) {
    let g = &doc.geometry;
    for block in &doc.blocks {
        assert!(
            block.top >= g.top_margin - 0.01 && block.bottom() <= g.content_bottom() + 0.01,
            "block {:?}/{:?} on page {} spans {:.1}..{:.1}, content area is {:.1}..{:.1}",
            block.section,
            block.kind,
            block.page,
            block.top,
            block.bottom(),
            g.top_margin,
            g.content_bottom(),
        );
        assert!(block.page < doc.page_count());
    }
}

pub fn headings(doc: &LaidOutDocument) -> Vec<SectionKind> {
    doc.blocks
        .iter()
        .filter(|b| b.kind == cvpress::BlockKind::Heading)
        .map(|b| b.section)
        .collect()
}

pub fn all_texts(doc: &LaidOutDocument) -> Vec<&str> {
    doc.pages.iter().flat_map(|p| p.texts()).collect()
}

pub fn images(doc: &LaidOutDocument) -> Vec<(usize, Item)> {
    doc.pages
        .iter()
        .enumerate()
        .flat_map(|(i, p)| {
            p.items
                .iter()
                .filter(|item| matches!(item, Item::Image { .. }))
                .map(move |item| (i, item.clone()))
        })
        .collect()
}

pub fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}
