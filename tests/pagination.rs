mod common;

use cvpress::{
    BlockKind, ExperienceEntry, LayoutCursor, PageGeometry, ProfileDocument, SectionKind, layout_cv,
    reserve,
};

fn long_experience(bullets: usize) -> ProfileDocument {
    ProfileDocument {
        experience: vec![ExperienceEntry {
            role: "Engineer".into(),
            organization: "Difference Engines Ltd".into(),
            period: "1830 \u{2013} 1860".into(),
            bullets: (0..bullets).map(|i| format!("Bullet point {i}")).collect(),
        }],
        ..common::ada()
    }
}

#[test]
fn reserve_keeps_cursor_when_block_fits() {
    let g = PageGeometry::a4();
    let cursor = LayoutCursor { page_index: 0, y: 300.0 };
    assert_eq!(reserve(cursor, 100.0, &g), cursor);
    let near_bottom = LayoutCursor {
        page_index: 2,
        y: g.content_bottom() - 40.0,
    };
    assert_eq!(reserve(near_bottom, 39.5, &g), near_bottom);
}

#[test]
fn reserve_breaks_when_block_overflows() {
    let g = PageGeometry::a4();
    let cursor = LayoutCursor {
        page_index: 1,
        y: g.content_bottom() - 10.0,
    };
    let next = reserve(cursor, 10.5, &g);
    assert_eq!(
        next,
        LayoutCursor {
            page_index: 2,
            y: g.top_margin
        }
    );
}

#[test]
fn reserve_at_page_top_never_breaks() {
    let g = PageGeometry::a4();
    let cursor = LayoutCursor::new(&g);
    assert_eq!(reserve(cursor, g.usable_height() * 3.0, &g), cursor);
}

#[test]
fn long_content_spans_pages_without_straddling() {
    common::init_logger();
    let profile = long_experience(120);
    let options = common::options_with(common::compact_geometry());
    let doc = layout_cv(&profile, &options, &common::NoImage).expect("layout");

    assert!(doc.page_count() >= 2, "expected several pages, got {}", doc.page_count());
    common::assert_no_straddle(&doc);
    assert!(doc.blocks.iter().any(|b| b.page == doc.page_count() - 1));
}

#[test]
fn overflowing_bullet_moves_to_next_page_intact() {
    let profile = long_experience(120);
    let options = common::options_with(common::compact_geometry());
    let doc = layout_cv(&profile, &options, &common::NoImage).expect("layout");
    let g = &doc.geometry;

    let idx = doc
        .blocks
        .iter()
        .position(|b| b.page == 1)
        .expect("a block on the second page");
    let moved = doc.blocks[idx];
    let last_on_first = doc.blocks[idx - 1];
    assert_eq!(moved.kind, BlockKind::Bullet);
    assert_eq!(last_on_first.kind, BlockKind::Bullet);
    assert_eq!(last_on_first.page, 0);
    assert!((moved.top - g.top_margin).abs() < 0.01);
    assert!(last_on_first.bottom() + moved.height > g.content_bottom());

    // Every bullet appears exactly once, whole.
    let texts = common::all_texts(&doc);
    for i in 0..120 {
        let text = format!("Bullet point {i}");
        assert_eq!(texts.iter().filter(|t| **t == text).count(), 1, "{text}");
    }
    assert!(doc.find_text("Bullet point 119").is_some_and(|p| p >= 1));
}

#[test]
fn oversized_paragraph_is_placed_line_by_line() {
    let words = "analytical engine operates on symbols as well as numbers ";
    let profile = ProfileDocument {
        summary: words.repeat(120),
        ..common::ada()
    };
    let options = common::options_with(common::compact_geometry());
    let doc = layout_cv(&profile, &options, &common::NoImage).expect("layout");

    let paragraph: Vec<_> = doc
        .blocks_in(SectionKind::Summary)
        .filter(|b| b.kind == BlockKind::Paragraph)
        .collect();
    assert!(paragraph.len() > 1);
    let line_h = options.geometry.line_height;
    assert!(paragraph.iter().all(|b| (b.height - line_h).abs() < 0.01));
    assert!(paragraph.last().is_some_and(|b| b.page >= 1));
    common::assert_no_straddle(&doc);
}

#[test]
fn heading_never_ends_a_page() {
    let mut profile = long_experience(0);
    profile.experience = (0..40)
        .map(|i| ExperienceEntry {
            role: format!("Role {i}"),
            organization: "Analytical Society".into(),
            period: format!("18{i:02}"),
            bullets: vec![
                format!("First achievement of role {i}"),
                format!("Second achievement of role {i}"),
            ],
        })
        .collect();
    profile.summary = "Mathematician. ".repeat(30);
    profile.education = (0..12)
        .map(|i| cvpress::EducationEntry {
            credential_name: format!("Course {i}"),
            institution: "University of London".into(),
            period: "1840".into(),
            details: "Private tuition in mathematics and logic with Augustus De Morgan.".into(),
        })
        .collect();

    for page_height in [500.0, 640.0, 800.0] {
        let geometry = PageGeometry {
            page_height,
            ..common::compact_geometry()
        };
        let doc = layout_cv(&profile, &common::options_with(geometry), &common::NoImage).expect("layout");
        common::assert_no_straddle(&doc);
        for (i, block) in doc.blocks.iter().enumerate() {
            if block.kind != BlockKind::Heading {
                continue;
            }
            let next = doc.blocks.get(i + 1).expect("heading followed by content");
            assert_eq!(next.page, block.page, "{:?} heading orphaned at {page_height}pt", block.section);
        }
    }
}

#[test]
fn blocks_are_recorded_in_reading_order() {
    let profile = long_experience(120);
    let doc = layout_cv(&profile, &common::options_with(common::compact_geometry()), &common::NoImage)
        .expect("layout");
    for pair in doc.blocks.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        assert!(
            b.page > a.page || (b.page == a.page && b.top >= a.bottom() - 0.01),
            "{a:?} then {b:?}"
        );
    }
}
