use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use memmap2::Mmap;
use pdf_writer::{Name, Pdf, Rect, Ref};
use ttf_parser::{Face, GlyphId};

use crate::error::Error;
use crate::options::FontSource;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FontWeight {
    Regular,
    Bold,
}

/// Font file bytes, either owned or mapped from disk for the life of the metrics.
enum FontData {
    Owned(Vec<u8>),
    Mapped(Mmap),
}

impl FontData {
    fn bytes(&self) -> &[u8] {
        match self {
            FontData::Owned(data) => data.as_slice(),
            FontData::Mapped(map) => &map[..],
        }
    }
}

#[derive(Clone)]
struct FontProgram {
    data: Arc<FontData>,
    face_index: u32,
}

/// Horizontal metrics of one face, used both for line breaking and for PDF output.
#[derive(Clone)]
pub struct FontMetrics {
    base_font: String,
    /// WinAnsi advances for bytes 32..=255 (standard fonts only).
    widths_1000: Vec<f32>,
    /// Unicode advances read from the cmap (embedded fonts only).
    char_widths_1000: Option<HashMap<char, f32>>,
    notdef_width_1000: f32,
    ascender_ratio: f32,
    program: Option<FontProgram>,
}

impl FontMetrics {
    pub fn helvetica(weight: FontWeight) -> Self {
        let (base_font, ascii) = match weight {
            FontWeight::Regular => ("Helvetica", &HELVETICA_ASCII),
            FontWeight::Bold => ("Helvetica-Bold", &HELVETICA_BOLD_ASCII),
        };
        let bold = weight == FontWeight::Bold;
        let widths_1000 = (32u8..=255u8)
            .map(|b| {
                if b <= 126 {
                    ascii[(b - 32) as usize]
                } else {
                    helvetica_upper_width(b, bold)
                }
            })
            .collect();
        FontMetrics {
            base_font: base_font.to_string(),
            widths_1000,
            char_widths_1000: None,
            notdef_width_1000: 0.0,
            ascender_ratio: 0.718,
            program: None,
        }
    }

    /// Loads a `.ttf`/`.otf` file, or the first usable face of a `.ttc` collection.
    pub fn from_truetype_file(path: &Path) -> Result<Self, Error> {
        let file = std::fs::File::open(path).map_err(|e| {
            Error::Io(std::io::Error::new(e.kind(), format!("{}: {}", e, path.display())))
        })?;
        let mapped = unsafe { Mmap::map(&file) }?;
        let face_count = if is_font_collection(path) {
            ttf_parser::fonts_in_collection(&mapped).unwrap_or(1)
        } else {
            1
        };
        let data = Arc::new(FontData::Mapped(mapped));
        let mut last_err = None;
        for face_index in 0..face_count {
            match Self::from_program(FontProgram {
                data: Arc::clone(&data),
                face_index,
            }) {
                Ok(metrics) => {
                    log::debug!("loaded {} face {face_index} of {face_count}", path.display());
                    return Ok(metrics);
                }
                Err(e) => last_err = Some(e),
            }
        }
        let reason = last_err.map_or_else(|| "no faces".to_string(), |e| e.to_string());
        Err(Error::Font(format!("{}: {reason}", path.display())))
    }

    pub fn from_truetype(data: Vec<u8>, face_index: u32) -> Result<Self, Error> {
        Self::from_program(FontProgram {
            data: Arc::new(FontData::Owned(data)),
            face_index,
        })
    }

    fn from_program(program: FontProgram) -> Result<Self, Error> {
        let face = Face::parse(program.data.bytes(), program.face_index)
            .map_err(|e| Error::Font(format!("cannot parse font: {e}")))?;
        let units = face.units_per_em() as f32;
        let family = font_family_name(&face).unwrap_or_else(|| "EmbeddedFont".to_string());
        let suffix = match (face.is_bold(), face.is_italic()) {
            (true, true) => "-BoldItalic",
            (true, false) => "-Bold",
            (false, true) => "-Italic",
            (false, false) => "",
        };
        let base_font = format!("{}{}", family.replace(' ', ""), suffix);

        let mut char_widths = HashMap::new();
        if let Some(cmap) = face.tables().cmap {
            for subtable in cmap.subtables {
                if !subtable.is_unicode() {
                    continue;
                }
                subtable.codepoints(|cp| {
                    if let Some(ch) = char::from_u32(cp)
                        && let Some(gid) = subtable.glyph_index(cp)
                        && let Some(adv) = face.glyph_hor_advance(gid)
                    {
                        char_widths.entry(ch).or_insert(adv as f32 / units * 1000.0);
                    }
                });
            }
        }
        if char_widths.is_empty() {
            return Err(Error::Font("font has no Unicode cmap".into()));
        }

        let notdef_width_1000 = face
            .glyph_hor_advance(GlyphId(0))
            .map(|adv| adv as f32 / units * 1000.0)
            .unwrap_or(0.0);
        let ascender_ratio = face.ascender() as f32 / units;

        Ok(FontMetrics {
            base_font,
            widths_1000: Vec::new(),
            char_widths_1000: Some(char_widths),
            notdef_width_1000,
            ascender_ratio,
            program: Some(program),
        })
    }

    pub fn base_font(&self) -> &str {
        &self.base_font
    }

    pub fn is_embedded(&self) -> bool {
        self.program.is_some()
    }

    pub fn ascender_ratio(&self) -> f32 {
        self.ascender_ratio
    }

    /// Width of a single character in 1000-units.
    pub fn char_width_1000(&self, ch: char) -> f32 {
        if let Some(ref map) = self.char_widths_1000 {
            return map.get(&ch).copied().unwrap_or(self.notdef_width_1000);
        }
        let byte = char_to_winansi(ch);
        if byte >= 32 {
            self.widths_1000[(byte - 32) as usize]
        } else {
            0.0
        }
    }

    pub fn text_width(&self, text: &str, font_size: f32) -> f32 {
        text.chars()
            .map(|ch| self.char_width_1000(ch) * font_size / 1000.0)
            .sum()
    }

    pub fn space_width(&self, font_size: f32) -> f32 {
        self.char_width_1000(' ') * font_size / 1000.0
    }
}

/// The regular and bold faces used for a render.
#[derive(Clone)]
pub struct FontSet {
    regular: FontMetrics,
    bold: FontMetrics,
}

impl FontSet {
    pub fn standard() -> Self {
        FontSet {
            regular: FontMetrics::helvetica(FontWeight::Regular),
            bold: FontMetrics::helvetica(FontWeight::Bold),
        }
    }

    pub fn load(source: &FontSource) -> Result<Self, Error> {
        match source {
            FontSource::Standard => Ok(Self::standard()),
            FontSource::TrueType { regular, bold } => {
                let regular = FontMetrics::from_truetype_file(regular)?;
                let bold = match bold {
                    Some(path) => FontMetrics::from_truetype_file(path)?,
                    None => {
                        log::warn!("no bold face configured, using {} for bold text", regular.base_font);
                        regular.clone()
                    }
                };
                Ok(FontSet { regular, bold })
            }
        }
    }

    pub fn get(&self, weight: FontWeight) -> &FontMetrics {
        match weight {
            FontWeight::Regular => &self.regular,
            FontWeight::Bold => &self.bold,
        }
    }
}

impl Default for FontSet {
    fn default() -> Self {
        Self::standard()
    }
}

pub(crate) struct FontEntry {
    pub(crate) pdf_name: String,
    pub(crate) font_ref: Ref,
    char_to_gid: Option<BTreeMap<char, u16>>,
}

impl FontEntry {
    /// Bytes for a `Tj` operand in this font's encoding.
    pub(crate) fn encode(&self, text: &str) -> Vec<u8> {
        match &self.char_to_gid {
            Some(map) => encode_as_gids(text, map),
            None => to_winansi_bytes(text),
        }
    }
}

pub(crate) fn register_font(
    pdf: &mut Pdf,
    metrics: &FontMetrics,
    pdf_name: String,
    alloc: &mut impl FnMut() -> Ref,
    used_chars: &BTreeSet<char>,
) -> Result<FontEntry, Error> {
    let t0 = std::time::Instant::now();
    let font_ref = alloc();

    let char_to_gid = match &metrics.program {
        None => {
            pdf.type1_font(font_ref)
                .base_font(Name(metrics.base_font.as_bytes()))
                .encoding_predefined(Name(b"WinAnsiEncoding"));
            None
        }
        Some(program) => Some(embed_truetype(
            pdf,
            font_ref,
            &metrics.base_font,
            program,
            used_chars,
            alloc,
        )?),
    };

    log::debug!(
        "register_font: {} ({} chars) → {:.1}ms",
        metrics.base_font,
        used_chars.len(),
        t0.elapsed().as_secs_f64() * 1000.0,
    );

    Ok(FontEntry {
        pdf_name,
        font_ref,
        char_to_gid,
    })
}

fn font_family_name(face: &Face) -> Option<String> {
    for name in face.names() {
        if name.name_id == ttf_parser::name_id::FAMILY
            && name.is_unicode()
            && let Some(s) = name.to_string()
        {
            return Some(s);
        }
    }
    None
}

fn is_font_collection(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("ttc"))
}

/// Embed a TrueType/OpenType font as a CIDFont (Type0 composite) with Identity-H encoding,
/// subsetted to the characters actually drawn.
fn embed_truetype(
    pdf: &mut Pdf,
    font_ref: Ref,
    ps_name: &str,
    program: &FontProgram,
    used_chars: &BTreeSet<char>,
    alloc: &mut impl FnMut() -> Ref,
) -> Result<BTreeMap<char, u16>, Error> {
    let data = program.data.bytes();
    let face = Face::parse(data, program.face_index)
        .map_err(|e| Error::Font(format!("{ps_name}: {e}")))?;

    let units = face.units_per_em() as f32;
    let ascent = face.ascender() as f32 / units * 1000.0;
    let descent = face.descender() as f32 / units * 1000.0;
    let cap_height = face
        .capital_height()
        .map(|h| h as f32 / units * 1000.0)
        .unwrap_or(700.0);
    let bb = face.global_bounding_box();
    let bbox = Rect::new(
        bb.x_min as f32 / units * 1000.0,
        bb.y_min as f32 / units * 1000.0,
        bb.x_max as f32 / units * 1000.0,
        bb.y_max as f32 / units * 1000.0,
    );

    // Iterating a BTreeSet keeps glyph numbering stable between runs.
    let mut remapper = subsetter::GlyphRemapper::new();
    let mut original_gids = BTreeMap::new();
    let mut char_to_gid = BTreeMap::new();
    for &ch in used_chars {
        if let Some(gid) = face.glyph_index(ch) {
            original_gids.insert(ch, gid);
            char_to_gid.insert(ch, remapper.remap(gid.0));
        }
    }

    let font_data = match subsetter::subset(data, program.face_index, &remapper) {
        Ok(subset) => subset,
        Err(e) => {
            log::warn!("Font subsetting failed for {ps_name}: {e}, embedding full font");
            char_to_gid = original_gids.iter().map(|(&ch, gid)| (ch, gid.0)).collect();
            data.to_vec()
        }
    };

    let data_ref = alloc();
    let descriptor_ref = alloc();
    let data_len = i32::try_from(font_data.len())
        .map_err(|_| Error::Font(format!("{ps_name}: font program too large")))?;
    pdf.stream(data_ref, &font_data)
        .pair(Name(b"Length1"), data_len);

    pdf.font_descriptor(descriptor_ref)
        .name(Name(ps_name.as_bytes()))
        .flags(pdf_writer::types::FontFlags::NON_SYMBOLIC)
        .bbox(bbox)
        .italic_angle(0.0)
        .ascent(ascent)
        .descent(descent)
        .cap_height(cap_height)
        .stem_v(80.0)
        .font_file2(data_ref);

    let cid_font_ref = alloc();
    let system_info = pdf_writer::types::SystemInfo {
        registry: pdf_writer::Str(b"Adobe"),
        ordering: pdf_writer::Str(b"Identity"),
        supplement: 0,
    };
    {
        let mut cid = pdf.cid_font(cid_font_ref);
        cid.subtype(pdf_writer::types::CidFontType::Type2);
        cid.base_font(Name(ps_name.as_bytes()));
        cid.system_info(system_info);
        cid.font_descriptor(descriptor_ref);
        cid.default_width(0.0);
        cid.cid_to_gid_map_predefined(Name(b"Identity"));
        let mut gid_widths: Vec<(u16, f32)> = char_to_gid
            .iter()
            .filter_map(|(ch, &new_gid)| {
                original_gids
                    .get(ch)
                    .and_then(|&gid| face.glyph_hor_advance(gid))
                    .map(|adv| (new_gid, adv as f32 / units * 1000.0))
            })
            .collect();
        gid_widths.sort_by_key(|&(gid, _)| gid);
        gid_widths.dedup_by_key(|&mut (gid, _)| gid);
        if !gid_widths.is_empty() {
            let mut w = cid.widths();
            for &(gid, width) in &gid_widths {
                w.consecutive(gid, [width]);
            }
        }
    }

    let tounicode_ref = alloc();
    let cmap_name = format!("{ps_name}-UTF16");
    let mut cmap = pdf_writer::types::UnicodeCmap::new(
        Name(cmap_name.as_bytes()),
        pdf_writer::types::SystemInfo {
            registry: pdf_writer::Str(b"Adobe"),
            ordering: pdf_writer::Str(b"Identity"),
            supplement: 0,
        },
    );
    for (&ch, &new_gid) in &char_to_gid {
        cmap.pair(new_gid, ch);
    }
    let cmap_data = cmap.finish();
    pdf.stream(tounicode_ref, cmap_data.as_slice());

    pdf.type0_font(font_ref)
        .base_font(Name(ps_name.as_bytes()))
        .encoding_predefined(Name(b"Identity-H"))
        .descendant_font(cid_font_ref)
        .to_unicode(tounicode_ref);

    Ok(char_to_gid)
}

/// Map a single Unicode char to its WinAnsi byte, or 0 if unmappable.
pub(crate) fn char_to_winansi(c: char) -> u8 {
    match c as u32 {
        0x0020..=0x007E => c as u8,
        0x00A0..=0x00FF => c as u8,
        0x20AC => 0x80,
        0x201A => 0x82,
        0x0192 => 0x83,
        0x201E => 0x84,
        0x2026 => 0x85,
        0x2020 => 0x86,
        0x2021 => 0x87,
        0x02C6 => 0x88,
        0x2030 => 0x89,
        0x0160 => 0x8A,
        0x2039 => 0x8B,
        0x0152 => 0x8C,
        0x017D => 0x8E,
        0x2018 => 0x91,
        0x2019 => 0x92,
        0x201C => 0x93,
        0x201D => 0x94,
        0x2022 => 0x95, // bullet
        0x2013 => 0x96,
        0x2014 => 0x97,
        0x02DC => 0x98,
        0x2122 => 0x99,
        0x0161 => 0x9A,
        0x203A => 0x9B,
        0x0153 => 0x9C,
        0x017E => 0x9E,
        0x0178 => 0x9F,
        _ => 0,
    }
}

/// Convert a UTF-8 string to WinAnsi (Windows-1252) bytes, dropping unmappable chars.
pub(crate) fn to_winansi_bytes(s: &str) -> Vec<u8> {
    s.chars()
        .map(char_to_winansi)
        .filter(|&b| b != 0)
        .collect()
}

/// Encode UTF-8 text as big-endian 2-byte glyph IDs for CIDFont content streams.
fn encode_as_gids(text: &str, char_to_gid: &BTreeMap<char, u16>) -> Vec<u8> {
    let mut out = Vec::with_capacity(text.len() * 2);
    for ch in text.chars() {
        let gid = char_to_gid.get(&ch).copied().unwrap_or(0);
        out.extend_from_slice(&gid.to_be_bytes());
    }
    out
}

// Adobe AFM advance widths for printable ASCII (32..=126).
#[rustfmt::skip]
const HELVETICA_ASCII: [f32; 95] = [
    278.0, 278.0, 355.0, 556.0, 556.0, 889.0, 667.0, 191.0, 333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0,
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0,
    278.0, 278.0, 584.0, 584.0, 584.0, 556.0, 1015.0,
    667.0, 667.0, 722.0, 722.0, 667.0, 611.0, 778.0, 722.0, 278.0, 500.0, 667.0, 556.0, 833.0,
    722.0, 778.0, 667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, 667.0, 667.0, 611.0,
    278.0, 278.0, 278.0, 469.0, 556.0, 333.0,
    556.0, 556.0, 500.0, 556.0, 556.0, 278.0, 556.0, 556.0, 222.0, 222.0, 500.0, 222.0, 833.0,
    556.0, 556.0, 556.0, 556.0, 333.0, 500.0, 278.0, 556.0, 500.0, 722.0, 500.0, 500.0, 500.0,
    334.0, 260.0, 334.0, 584.0,
];

#[rustfmt::skip]
const HELVETICA_BOLD_ASCII: [f32; 95] = [
    278.0, 333.0, 474.0, 556.0, 556.0, 889.0, 722.0, 238.0, 333.0, 333.0, 389.0, 584.0, 278.0, 333.0, 278.0, 278.0,
    556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0, 556.0,
    333.0, 333.0, 584.0, 584.0, 584.0, 611.0, 975.0,
    722.0, 722.0, 722.0, 722.0, 667.0, 611.0, 778.0, 722.0, 278.0, 556.0, 722.0, 611.0, 833.0,
    722.0, 778.0, 667.0, 778.0, 722.0, 667.0, 611.0, 722.0, 667.0, 944.0, 667.0, 667.0, 611.0,
    333.0, 278.0, 333.0, 584.0, 556.0, 333.0,
    556.0, 611.0, 556.0, 611.0, 556.0, 333.0, 611.0, 611.0, 278.0, 278.0, 556.0, 278.0, 889.0,
    611.0, 611.0, 611.0, 611.0, 389.0, 556.0, 333.0, 611.0, 556.0, 778.0, 556.0, 556.0, 500.0,
    389.0, 280.0, 389.0, 584.0,
];

/// Approximate Helvetica widths for WinAnsi bytes 127..=255.
fn helvetica_upper_width(b: u8, bold: bool) -> f32 {
    match b {
        0x85 | 0x89 | 0x8C | 0x97 | 0x99 => 1000.0, // … ‰ Œ — ™
        0x95 => 350.0,                              // bullet
        0x91 | 0x92 | 0x82 => if bold { 278.0 } else { 222.0 },
        0x93 | 0x94 | 0x84 => if bold { 500.0 } else { 333.0 },
        0x88 | 0x8B | 0x98 | 0x9B => 333.0,
        0x9C => 944.0,
        0xA0 => 278.0,
        0xC0..=0xD6 | 0xD8..=0xDE => if bold { 722.0 } else { 667.0 },
        0xDF..=0xF6 | 0xF8..=0xFF => if bold { 611.0 } else { 556.0 },
        _ => 556.0,
    }
}
