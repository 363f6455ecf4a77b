use std::collections::{BTreeMap, BTreeSet};

use pdf_writer::{Content, Filter, Name, Pdf, Rect, Ref, Str, TextStr};

use crate::error::Error;
use crate::flow::{Item, LaidOutDocument};
use crate::fonts::{FontEntry, FontSet, FontWeight, register_font};
use crate::portrait::{PixelData, Portrait};

const PORTRAIT_NAME: &[u8] = b"Im1";

fn pixel_dim(v: u32) -> Result<i32, Error> {
    i32::try_from(v).map_err(|_| Error::Pdf(format!("image dimension {v} out of range")))
}

fn embed_portrait(
    pdf: &mut Pdf,
    portrait: &Portrait,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<Ref, Error> {
    let xobj_ref = alloc();
    let w = pixel_dim(portrait.pixel_width)?;
    let h = pixel_dim(portrait.pixel_height)?;

    match &portrait.pixels {
        PixelData::Jpeg { data, gray } => {
            let mut xobj = pdf.image_xobject(xobj_ref, data);
            xobj.filter(Filter::DctDecode);
            xobj.width(w);
            xobj.height(h);
            if *gray {
                xobj.color_space().device_gray();
            } else {
                xobj.color_space().device_rgb();
            }
            xobj.bits_per_component(8);
        }
        PixelData::Raw { rgb, alpha } => {
            let compressed_rgb = miniz_oxide::deflate::compress_to_vec_zlib(rgb, 6);
            let smask_ref = alpha.as_ref().map(|alpha| {
                let compressed_alpha = miniz_oxide::deflate::compress_to_vec_zlib(alpha, 6);
                let mask_ref = alloc();
                let mut mask = pdf.image_xobject(mask_ref, &compressed_alpha);
                mask.filter(Filter::FlateDecode);
                mask.width(w);
                mask.height(h);
                mask.color_space().device_gray();
                mask.bits_per_component(8);
                mask_ref
            });

            let mut xobj = pdf.image_xobject(xobj_ref, &compressed_rgb);
            xobj.filter(Filter::FlateDecode);
            xobj.width(w);
            xobj.height(h);
            xobj.color_space().device_rgb();
            xobj.bits_per_component(8);
            if let Some(mask_ref) = smask_ref {
                xobj.s_mask(mask_ref);
            }
        }
    }
    Ok(xobj_ref)
}

fn set_fill(content: &mut Content, color: Option<[u8; 3]>) {
    match color {
        Some([r, g, b]) => {
            content.set_fill_rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0);
        }
        None => {
            content.set_fill_gray(0.0);
        }
    }
}

/// Content stream for one page. Item coordinates are top-down; PDF user space is bottom-up.
fn page_content(items: &[Item], page_height: f32, fonts: &BTreeMap<FontWeight, FontEntry>) -> Result<Content, Error> {
    let mut content = Content::new();
    let mut in_text = false;
    let mut td_x = 0.0f32;
    let mut td_y = 0.0f32;
    let mut cur_font: Option<(FontWeight, f32)> = None;
    let mut cur_color: Option<Option<[u8; 3]>> = None;

    for item in items {
        if !matches!(item, Item::Text { .. }) && in_text {
            content.end_text();
            in_text = false;
        }
        match item {
            Item::Text {
                weight,
                size,
                x,
                baseline,
                text,
                color,
            } => {
                let entry = fonts
                    .get(weight)
                    .ok_or_else(|| Error::Pdf(format!("font {weight:?} not registered")))?;
                if !in_text {
                    content.begin_text();
                    in_text = true;
                    td_x = 0.0;
                    td_y = 0.0;
                }
                if cur_color != Some(*color) {
                    set_fill(&mut content, *color);
                    cur_color = Some(*color);
                }
                if cur_font != Some((*weight, *size)) {
                    content.set_font(Name(entry.pdf_name.as_bytes()), *size);
                    cur_font = Some((*weight, *size));
                }
                let y = page_height - baseline;
                content.next_line(x - td_x, y - td_y);
                td_x = *x;
                td_y = y;
                content.show(Str(&entry.encode(text)));
            }
            Item::Rule {
                x1,
                x2,
                y,
                thickness,
                color: [r, g, b],
            } => {
                let y = page_height - y;
                content.save_state();
                content.set_stroke_rgb(*r as f32 / 255.0, *g as f32 / 255.0, *b as f32 / 255.0);
                content.set_line_width(*thickness);
                content.move_to(*x1, y);
                content.line_to(*x2, y);
                content.stroke();
                content.restore_state();
            }
            Item::Image {
                x,
                top,
                width,
                height,
            } => {
                content.save_state();
                content.transform([*width, 0.0, 0.0, *height, *x, page_height - top - height]);
                content.x_object(Name(PORTRAIT_NAME));
                content.restore_state();
            }
        }
    }
    if in_text {
        content.end_text();
    }
    Ok(content)
}

pub(crate) fn render(doc: &LaidOutDocument, fonts: &FontSet) -> Result<Vec<u8>, Error> {
    let t0 = std::time::Instant::now();
    let mut pdf = Pdf::new();
    let mut next_id = 1i32;
    let mut alloc = || {
        let r = Ref::new(next_id);
        next_id += 1;
        r
    };

    let catalog_id = alloc();
    let pages_id = alloc();
    let info_id = alloc();

    // Phase 1: register the faces that are drawn, subsetted to the chars they draw
    let mut used_chars: BTreeMap<FontWeight, BTreeSet<char>> = BTreeMap::new();
    for page in &doc.pages {
        for item in &page.items {
            if let Item::Text { weight, text, .. } = item {
                used_chars.entry(*weight).or_default().extend(text.chars());
            }
        }
    }
    let mut font_entries: BTreeMap<FontWeight, FontEntry> = BTreeMap::new();
    for (i, (weight, mut chars)) in used_chars.into_iter().enumerate() {
        chars.insert(' ');
        let entry = register_font(&mut pdf, fonts.get(weight), format!("F{}", i + 1), &mut alloc, &chars)?;
        font_entries.insert(weight, entry);
    }
    let t_fonts = t0.elapsed();

    // Phase 2: portrait
    let portrait_ref = match &doc.portrait {
        Some(p) => Some(embed_portrait(&mut pdf, p, &mut alloc)?),
        None => None,
    };
    let t_images = t0.elapsed();

    // Phase 3: content streams
    let n = doc.pages.len();
    let page_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    let content_ids: Vec<Ref> = (0..n).map(|_| alloc()).collect();
    for (i, page) in doc.pages.iter().enumerate() {
        let raw = page_content(&page.items, doc.geometry.page_height, &font_entries)?.finish();
        let compressed = miniz_oxide::deflate::compress_to_vec_zlib(raw.as_slice(), 6);
        pdf.stream(content_ids[i], &compressed).filter(Filter::FlateDecode);
    }
    let t_content = t0.elapsed();

    // Phase 4: document structure
    pdf.catalog(catalog_id).pages(pages_id);
    pdf.pages(pages_id)
        .kids(page_ids.iter().copied())
        .count(n as i32);
    {
        let mut info = pdf.document_info(info_id);
        info.title(TextStr(&doc.title)).creator(TextStr("cvpress"));
        if !doc.author.is_empty() {
            info.author(TextStr(&doc.author));
        }
    }

    let g = &doc.geometry;
    for (i, page_id) in page_ids.iter().enumerate() {
        let mut page = pdf.page(*page_id);
        page.media_box(Rect::new(0.0, 0.0, g.page_width, g.page_height))
            .parent(pages_id)
            .contents(content_ids[i]);
        let mut resources = page.resources();
        {
            let mut font_dict = resources.fonts();
            for entry in font_entries.values() {
                font_dict.pair(Name(entry.pdf_name.as_bytes()), entry.font_ref);
            }
        }
        if let Some(xobj_ref) = portrait_ref {
            resources.x_objects().pair(Name(PORTRAIT_NAME), xobj_ref);
        }
    }

    let bytes = pdf.finish();
    log::info!(
        "PDF phases: fonts={:.1}ms, images={:.1}ms, content={:.1}ms, assembly={:.1}ms ({} pages, {} bytes)",
        t_fonts.as_secs_f64() * 1000.0,
        (t_images - t_fonts).as_secs_f64() * 1000.0,
        (t_content - t_images).as_secs_f64() * 1000.0,
        (t0.elapsed() - t_content).as_secs_f64() * 1000.0,
        n,
        bytes.len(),
    );
    Ok(bytes)
}
