mod error;
mod flow;
mod fonts;
mod model;
mod options;
mod pdf;
mod portrait;

pub use error::Error;
pub use flow::{
    BlockKind, Item, LaidOutDocument, LayoutCursor, Page, PlacedBlock, reserve, wrap_text,
};
pub use fonts::{FontMetrics, FontSet, FontWeight};
pub use model::{
    Certificate, ContactDetails, ContentSnapshot, EducationEntry, ExperienceEntry, Identity,
    ProfileDocument, ProjectSummary, SectionKind, SectionVisibility, Skill,
};
pub use options::{FontSource, PageGeometry, PortraitOptions, RenderOptions, Typography};
pub use portrait::{
    ImageFetcher, MAX_PORTRAIT_BYTES, Portrait, PortraitError, UrlFetcher, decode_portrait,
};

use std::path::{Path, PathBuf};
use std::time::Instant;

pub struct RenderedCv {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub page_count: usize,
}

/// `Ada Lovelace` → `Ada_Lovelace_CV.pdf`. Every whitespace character becomes `_`.
pub fn cv_filename(full_name: &str) -> String {
    let name = full_name.trim();
    if name.is_empty() {
        return "CV.pdf".to_string();
    }
    let stem: String = name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}_CV.pdf")
}

/// Lay out the CV without serialising it.
pub fn layout_cv(
    profile: &ProfileDocument,
    options: &RenderOptions,
    fetcher: &dyn ImageFetcher,
) -> Result<LaidOutDocument, Error> {
    layout_with_fonts(profile, options, fetcher, &FontSet::load(&options.fonts)?)
}

fn layout_with_fonts(
    profile: &ProfileDocument,
    options: &RenderOptions,
    fetcher: &dyn ImageFetcher,
    fonts: &FontSet,
) -> Result<LaidOutDocument, Error> {
    options.validate()?;
    let portrait = if options.portrait.enabled {
        portrait::load_portrait(fetcher, profile.identity.photo_url.as_deref())
    } else {
        None
    };
    Ok(flow::assemble(profile, options, fonts, portrait))
}

pub fn render_cv(
    profile: &ProfileDocument,
    options: &RenderOptions,
    fetcher: &dyn ImageFetcher,
) -> Result<RenderedCv, Error> {
    let t0 = Instant::now();

    let fonts = FontSet::load(&options.fonts)?;
    let t_fonts = t0.elapsed();

    let doc = layout_with_fonts(profile, options, fetcher, &fonts)?;
    let t_layout = t0.elapsed();

    let bytes = pdf::render(&doc, &fonts)?;
    let t_total = t0.elapsed();

    log::info!(
        "Timing: fonts={:.1}ms, layout={:.1}ms, pdf={:.1}ms, total={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_layout - t_fonts).as_secs_f64() * 1000.0,
        (t_total - t_layout).as_secs_f64() * 1000.0,
        t_total.as_secs_f64() * 1000.0,
        doc.page_count(),
        bytes.len(),
    );

    Ok(RenderedCv {
        bytes,
        filename: cv_filename(&profile.identity.full_name),
        page_count: doc.page_count(),
    })
}

/// Render and write the CV. A directory `target` receives the file under its
/// derived name; any other path is used as the output file itself.
pub fn write_cv(
    profile: &ProfileDocument,
    options: &RenderOptions,
    fetcher: &dyn ImageFetcher,
    target: &Path,
) -> Result<PathBuf, Error> {
    let cv = render_cv(profile, options, fetcher)?;
    let path = if target.is_dir() {
        target.join(&cv.filename)
    } else {
        target.to_path_buf()
    };
    std::fs::write(&path, &cv.bytes).map_err(Error::Io)?;
    log::info!("Wrote {} ({} pages)", path.display(), cv.page_count);
    Ok(path)
}
