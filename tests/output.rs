mod common;

use std::path::PathBuf;

use cvpress::{FontSource, RenderOptions, render_cv, write_cv};

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[test]
fn output_is_a_pdf_with_standard_fonts() {
    let cv = render_cv(&common::ada(), &RenderOptions::default(), &common::NoImage).expect("render");
    assert!(cv.bytes.starts_with(b"%PDF-"));
    assert!(contains(&cv.bytes[cv.bytes.len().saturating_sub(32)..], b"%%EOF"));
    assert!(contains(&cv.bytes, b"/Helvetica-Bold"));
    assert!(contains(&cv.bytes, b"/WinAnsiEncoding"));
    assert!(contains(&cv.bytes, b"/FlateDecode"));
}

#[test]
fn identical_input_gives_identical_bytes() {
    let mut profile = common::ada();
    profile.identity.photo_url = Some("portrait.png".into());
    let png = common::png_bytes(24, 30, true);
    let options = common::options_with(common::compact_geometry());

    let first = render_cv(&profile, &options, &common::StaticFetcher::new(png.clone())).expect("render");
    let second = render_cv(&profile, &options, &common::StaticFetcher::new(png)).expect("render");
    assert_eq!(first.bytes, second.bytes);
    assert_eq!(first.filename, second.filename);
}

#[test]
fn multi_page_output_counts_its_pages() {
    let mut profile = common::ada();
    profile.experience[0].bullets = (0..150).map(|i| format!("Computed Bernoulli number {i}")).collect();
    let cv = render_cv(&profile, &common::options_with(common::compact_geometry()), &common::NoImage)
        .expect("render");
    assert!(cv.page_count >= 2);
    assert!(contains(&cv.bytes, format!("/Count {}", cv.page_count).as_bytes()));
}

#[test]
fn write_cv_names_the_file_after_the_profile() {
    common::init_logger();
    let dir = common::output_dir("write_cv");
    let path = write_cv(&common::ada(), &RenderOptions::default(), &common::NoImage, &dir).expect("write");
    assert_eq!(path, dir.join("Ada_Lovelace_CV.pdf"));
    let bytes = std::fs::read(&path).expect("read back");
    assert!(bytes.starts_with(b"%PDF-"));

    let explicit = dir.join("custom-name.pdf");
    let path = write_cv(&common::ada(), &RenderOptions::default(), &common::NoImage, &explicit)
        .expect("write");
    assert_eq!(path, explicit);
    assert!(explicit.exists());
}

#[test]
fn missing_font_file_is_an_error() {
    let options = RenderOptions {
        fonts: FontSource::TrueType {
            regular: PathBuf::from("tests/fixtures/does-not-exist.ttf"),
            bold: None,
        },
        ..RenderOptions::default()
    };
    let result = render_cv(&common::ada(), &options, &common::NoImage);
    assert!(matches!(result, Err(cvpress::Error::Io(_))));
}

#[test]
fn non_font_file_is_rejected() {
    let dir = common::output_dir("bad_font");
    let path = dir.join("not-a-font.ttf");
    std::fs::write(&path, b"this is not a font program").expect("write");
    let options = RenderOptions {
        fonts: FontSource::TrueType {
            regular: path,
            bold: None,
        },
        ..RenderOptions::default()
    };
    let result = render_cv(&common::ada(), &options, &common::NoImage);
    assert!(matches!(result, Err(cvpress::Error::Font(_))));
}

fn system_font(names: &[&str]) -> Option<PathBuf> {
    let dirs = [
        "/usr/share/fonts/truetype/dejavu",
        "/usr/share/fonts/dejavu",
        "/usr/share/fonts/TTF",
        "/Library/Fonts",
    ];
    dirs.iter()
        .flat_map(|dir| names.iter().map(move |name| PathBuf::from(dir).join(name)))
        .find(|path| path.is_file())
}

#[test]
fn truetype_fonts_are_subsetted_and_embedded() {
    common::init_logger();
    let (Some(regular), Some(bold)) = (
        system_font(&["DejaVuSans.ttf"]),
        system_font(&["DejaVuSans-Bold.ttf"]),
    ) else {
        println!("No DejaVu fonts installed, skipping.");
        return;
    };

    let metrics = cvpress::FontMetrics::from_truetype_file(&regular).expect("load font");
    assert!(metrics.is_embedded());
    assert!(metrics.char_width_1000('\u{141}') > 0.0);

    let mut profile = common::ada();
    profile.summary = "Worked in \u{141}\u{f3}d\u{17a} and Gy\u{151}r".into();
    let options = RenderOptions {
        fonts: FontSource::TrueType {
            regular,
            bold: Some(bold),
        },
        ..common::options_with(common::compact_geometry())
    };

    let doc = cvpress::layout_cv(&profile, &options, &common::NoImage).expect("layout");
    assert_eq!(doc.find_text("Worked in \u{141}\u{f3}d\u{17a} and Gy\u{151}r"), Some(0));

    let first = render_cv(&profile, &options, &common::NoImage).expect("render");
    let second = render_cv(&profile, &options, &common::NoImage).expect("render");
    assert_eq!(first.bytes, second.bytes);

    let bytes = &first.bytes;
    assert!(contains(bytes, b"/FontFile2"));
    assert!(contains(bytes, b"/ToUnicode"));
    assert!(contains(bytes, b"/Identity-H"));
    assert!(!contains(bytes, b"/WinAnsiEncoding"));
    // L with stroke and o with double acute keep their code points in the CMap.
    assert!(contains(bytes, b"0141>"));
    assert!(contains(bytes, b"0151>"));
}
