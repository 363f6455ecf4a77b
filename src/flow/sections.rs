use std::ops::Range;

use super::{BlockKind, Flow, Item, LaidOutDocument, wrap_text};
use crate::fonts::{FontSet, FontWeight};
use crate::model::{ProfileDocument, SectionKind, SectionVisibility};
use crate::options::RenderOptions;
use crate::portrait::Portrait;

/// Space kept between a label and its right-aligned metadata.
const META_GUTTER: f32 = 12.0;
const BULLET: &str = "\u{2022}";
const BULLET_INDENT: f32 = 6.0;
const PORTRAIT_GAP: f32 = 12.0;
const DIVIDER_THICKNESS: f32 = 1.0;

/// A wrapped line group in one style, plus optional regular-weight text on its
/// first line (a right-aligned period, a bullet marker).
struct Lines<'s> {
    lines: Vec<String>,
    x: f32,
    weight: FontWeight,
    size: f32,
    color: Option<[u8; 3]>,
    first_line_extra: Option<(&'s str, f32)>,
}

impl Lines<'_> {
    fn plain(lines: Vec<String>, x: f32, weight: FontWeight, size: f32) -> Self {
        Lines {
            lines,
            x,
            weight,
            size,
            color: None,
            first_line_extra: None,
        }
    }

    fn height(&self, flow: &Flow) -> f32 {
        self.lines.len() as f32 * flow.line_height(self.size)
    }

    /// Space this group needs directly below a block it is kept with: all of it,
    /// or its first line when it will be split anyway.
    fn lead(&self, flow: &Flow) -> f32 {
        let height = self.height(flow);
        if height <= flow.geometry.usable_height() {
            height
        } else {
            flow.line_height(self.size)
        }
    }
}

fn draw(flow: &mut Flow, group: &Lines, range: Range<usize>, top: f32) {
    let line_h = flow.line_height(group.size);
    let first = range.start;
    for i in range {
        let line_top = top + (i - first) as f32 * line_h;
        let line = &group.lines[i];
        if !line.is_empty() {
            let baseline = flow.baseline(line_top, group.weight, group.size);
            flow.push(Item::Text {
                weight: group.weight,
                size: group.size,
                x: group.x,
                baseline,
                text: line.clone(),
                color: group.color,
            });
        }
        if i == 0
            && let Some((extra, x)) = group.first_line_extra
        {
            let baseline = flow.baseline(line_top, FontWeight::Regular, group.size);
            flow.push(Item::Text {
                weight: FontWeight::Regular,
                size: group.size,
                x,
                baseline,
                text: extra.to_string(),
                color: None,
            });
        }
    }
}

/// Place a line group as one block, or line by line when it is taller than a page.
/// `keep_with` is extra height that must fit below the group on the same page.
fn place(flow: &mut Flow, group: &Lines, kind: BlockKind, section: SectionKind, keep_with: f32) {
    if group.lines.is_empty() {
        return;
    }
    let height = group.height(flow);
    if height <= flow.geometry.usable_height() {
        flow.reserve(height + keep_with);
        let top = flow.cursor().y;
        flow.record(height, kind, section);
        draw(flow, group, 0..group.lines.len(), top);
        flow.advance(height);
        return;
    }

    log::debug!(
        "{section:?}: {:.1}pt block exceeds the page, placing line by line",
        height
    );
    let line_h = flow.line_height(group.size);
    for i in 0..group.lines.len() {
        flow.reserve(line_h);
        let top = flow.cursor().y;
        flow.record(line_h, kind, section);
        draw(flow, group, i..i + 1, top);
        flow.advance(line_h);
    }
}

/// Place two groups as a single block (label + body), splitting only if together
/// they exceed a page.
fn place_together(flow: &mut Flow, first: &Lines, second: &Lines, kind: BlockKind, section: SectionKind) {
    let h1 = first.height(flow);
    let h2 = second.height(flow);
    if h1 + h2 <= flow.geometry.usable_height() {
        flow.reserve(h1 + h2);
        let top = flow.cursor().y;
        flow.record(h1 + h2, kind, section);
        draw(flow, first, 0..first.lines.len(), top);
        draw(flow, second, 0..second.lines.len(), top + h1);
        flow.advance(h1 + h2);
    } else {
        let keep = second.lead(flow);
        place(flow, first, kind, section, keep);
        place(flow, second, kind, section, 0.0);
    }
}

/// Section title. `keep_with` is the height of whatever opens the section body;
/// the title never ends a page on its own.
fn heading(flow: &mut Flow, section: SectionKind, keep_with: f32) {
    let g = *flow.geometry;
    let t = *flow.typography;
    let height = flow.line_height(t.heading_size);
    flow.reserve(height + g.paragraph_gap + keep_with);
    let top = flow.cursor().y;
    flow.record(height, BlockKind::Heading, section);
    let group = Lines {
        color: Some(t.accent),
        ..Lines::plain(vec![section.title().to_string()], g.left_margin, FontWeight::Bold, t.heading_size)
    };
    draw(flow, &group, 0..1, top);
    flow.advance(height + g.paragraph_gap);
}

/// Bold label wrapped beside right-aligned metadata drawn on its first line.
fn label_lines<'s>(flow: &Flow, label: &str, meta: &'s str) -> Option<Lines<'s>> {
    let g = flow.geometry;
    let size = flow.typography.body_size;
    let meta = meta.trim();
    let content_width = g.content_width();

    // Metadata too wide to leave the label half the column gets a line of its own.
    let (label_width, extra, meta_alone) = if meta.is_empty() {
        (content_width, None, false)
    } else {
        let meta_w = flow.fonts.get(FontWeight::Regular).text_width(meta, size);
        let x = (g.left_margin + content_width - meta_w).max(g.left_margin);
        let beside = content_width - meta_w - META_GUTTER;
        if beside >= content_width / 2.0 {
            (beside, Some((meta, x)), false)
        } else {
            (content_width, Some((meta, x)), true)
        }
    };

    let mut lines = wrap_text(label, flow.fonts.get(FontWeight::Bold), size, label_width);
    if lines.is_empty() {
        if extra.is_none() {
            return None;
        }
        lines.push(String::new());
    } else if meta_alone {
        lines.insert(0, String::new());
    }
    Some(Lines {
        first_line_extra: extra,
        ..Lines::plain(lines, g.left_margin, FontWeight::Bold, size)
    })
}

fn body_lines(flow: &Flow, text: &str) -> Lines<'static> {
    let g = flow.geometry;
    let size = flow.typography.body_size;
    let lines = wrap_text(text, flow.fonts.get(FontWeight::Regular), size, g.content_width());
    Lines::plain(lines, g.left_margin, FontWeight::Regular, size)
}

/// Bullet text with a hanging indent; the marker sits on the first line.
fn bullet_lines(flow: &Flow, text: &str) -> Lines<'static> {
    let g = flow.geometry;
    let size = flow.typography.body_size;
    let regular = flow.fonts.get(FontWeight::Regular);
    let hang = BULLET_INDENT + regular.text_width(BULLET, size) + regular.space_width(size);
    let lines = wrap_text(text, regular, size, g.content_width() - hang);
    Lines {
        first_line_extra: Some((BULLET, g.left_margin + BULLET_INDENT)),
        ..Lines::plain(lines, g.left_margin + hang, FontWeight::Regular, size)
    }
}

/// Height of a label and the lead of the group that follows it.
fn chain_height(flow: &Flow, label: Option<&Lines>, next: Option<&Lines>) -> f32 {
    label.map_or(0.0, |l| l.height(flow)) + next.map_or(0.0, |n| n.lead(flow))
}

fn gap_after(flow: &Flow, index: usize, count: usize, between: f32) -> f32 {
    if index + 1 == count {
        flow.geometry.section_gap
    } else {
        between
    }
}

fn header(flow: &mut Flow, profile: &ProfileDocument, portrait: Option<&Portrait>, box_size: f32) {
    let g = *flow.geometry;
    let t = *flow.typography;
    let mut text_width = g.content_width();
    let mut portrait_bottom = g.top_margin;

    if let Some(p) = portrait {
        let (w, h) = p.fit(box_size);
        flow.push(Item::Image {
            x: g.page_width - g.right_margin - w,
            top: g.top_margin,
            width: w,
            height: h,
        });
        text_width = (text_width - box_size - PORTRAIT_GAP).max(g.content_width() / 2.0);
        portrait_bottom = g.top_margin + h;
    }

    let name = wrap_text(
        &profile.identity.full_name,
        flow.fonts.get(FontWeight::Bold),
        t.name_size,
        text_width,
    );
    let name = Lines::plain(name, g.left_margin, FontWeight::Bold, t.name_size);
    place(flow, &name, BlockKind::Header, SectionKind::Header, 0.0);

    if let Some(contact) = profile.contact.line() {
        let lines = wrap_text(&contact, flow.fonts.get(FontWeight::Regular), t.contact_size, text_width);
        let contact = Lines::plain(lines, g.left_margin, FontWeight::Regular, t.contact_size);
        if !name.lines.is_empty() {
            flow.advance(g.paragraph_gap);
        }
        place(flow, &contact, BlockKind::Header, SectionKind::Header, 0.0);
    }

    let cursor = flow.cursor();
    if cursor.page_index == 0 && cursor.y < portrait_bottom {
        flow.advance(portrait_bottom - cursor.y);
    }
    flow.advance(g.paragraph_gap * 2.0);
}

fn divider(flow: &mut Flow) {
    let g = *flow.geometry;
    let accent = flow.typography.accent;
    flow.reserve(DIVIDER_THICKNESS);
    let y = flow.cursor().y + DIVIDER_THICKNESS / 2.0;
    flow.record(DIVIDER_THICKNESS, BlockKind::Divider, SectionKind::Header);
    flow.push(Item::Rule {
        x1: g.left_margin,
        x2: g.left_margin + g.content_width(),
        y,
        thickness: DIVIDER_THICKNESS,
        color: accent,
    });
    flow.advance(DIVIDER_THICKNESS + g.section_gap);
}

fn summary(flow: &mut Flow, profile: &ProfileDocument) {
    let group = body_lines(flow, &profile.summary);
    let keep = group.lead(flow);
    heading(flow, SectionKind::Summary, keep);
    place(flow, &group, BlockKind::Paragraph, SectionKind::Summary, 0.0);
    flow.advance(flow.geometry.section_gap);
}

fn experience(flow: &mut Flow, profile: &ProfileDocument) {
    let section = SectionKind::Experience;
    let entries: Vec<_> = profile
        .experience
        .iter()
        .filter(|e| !e.is_blank())
        .map(|entry| {
            let bullets: Vec<Lines> = entry
                .bullets
                .iter()
                .map(|b| b.trim())
                .filter(|b| !b.is_empty())
                .map(|b| bullet_lines(flow, b))
                .collect();
            (label_lines(flow, &entry.label(), &entry.period), bullets)
        })
        .collect();
    let keep = entries
        .first()
        .map_or(0.0, |(label, bullets)| chain_height(flow, label.as_ref(), bullets.first()));
    heading(flow, section, keep);
    for (i, (label, bullets)) in entries.iter().enumerate() {
        if let Some(label) = label {
            let keep = bullets.first().map_or(0.0, |b| b.lead(flow));
            place(flow, label, BlockKind::EntryLabel, section, keep);
        }
        for group in bullets {
            place(flow, group, BlockKind::Bullet, section, 0.0);
        }
        let gap = gap_after(flow, i, entries.len(), flow.geometry.entry_gap);
        flow.advance(gap);
    }
}

fn skills(flow: &mut Flow, profile: &ProfileDocument) {
    let section = SectionKind::Skills;
    let g = *flow.geometry;
    let size = flow.typography.body_size;
    let groups: Vec<(Option<Lines>, Lines)> = profile
        .skill_groups()
        .into_iter()
        .map(|(category, names)| {
            let names = body_lines(flow, &names.join(", "));
            let label = (!category.is_empty()).then(|| {
                let label = wrap_text(category, flow.fonts.get(FontWeight::Bold), size, g.content_width());
                Lines::plain(label, g.left_margin, FontWeight::Bold, size)
            });
            (label, names)
        })
        .collect();
    let keep = groups
        .first()
        .map_or(0.0, |(label, names)| chain_height(flow, label.as_ref(), Some(names)));
    heading(flow, section, keep);
    for (i, (label, names)) in groups.iter().enumerate() {
        match label {
            Some(label) => place_together(flow, label, names, BlockKind::SkillGroup, section),
            None => place(flow, names, BlockKind::SkillGroup, section, 0.0),
        }
        let gap = gap_after(flow, i, groups.len(), g.paragraph_gap);
        flow.advance(gap);
    }
}

fn projects(flow: &mut Flow, profile: &ProfileDocument, options: &RenderOptions) {
    let section = SectionKind::Projects;
    let g = *flow.geometry;
    let size = flow.typography.body_size;
    let projects: Vec<(Lines, Option<Lines>)> = profile
        .projects
        .iter()
        .filter(|p| !p.title.trim().is_empty())
        .take(options.max_projects)
        .map(|project| {
            let title = wrap_text(&project.title, flow.fonts.get(FontWeight::Bold), size, g.content_width());
            let title = Lines::plain(title, g.left_margin, FontWeight::Bold, size);
            let description = options
                .include_project_descriptions
                .then(|| body_lines(flow, &project.description))
                .filter(|d| !d.lines.is_empty());
            (title, description)
        })
        .collect();
    let Some((first_title, first_description)) = projects.first() else {
        log::debug!("{section:?}: project cap is 0, skipping");
        return;
    };
    let keep = chain_height(flow, Some(first_title), first_description.as_ref());
    heading(flow, section, keep);
    for (i, (title, description)) in projects.iter().enumerate() {
        let between = match description {
            Some(description) => {
                let keep = description.lead(flow);
                place(flow, title, BlockKind::ProjectTitle, section, keep);
                place(flow, description, BlockKind::Paragraph, section, 0.0);
                g.entry_gap
            }
            None => {
                place(flow, title, BlockKind::ProjectTitle, section, 0.0);
                g.paragraph_gap
            }
        };
        let gap = gap_after(flow, i, projects.len(), between);
        flow.advance(gap);
    }
}

fn education(flow: &mut Flow, profile: &ProfileDocument) {
    let section = SectionKind::Education;
    let entries: Vec<_> = profile
        .education
        .iter()
        .filter(|e| !e.is_blank())
        .map(|entry| (label_lines(flow, &entry.label(), &entry.period), body_lines(flow, &entry.details)))
        .collect();
    let keep = entries
        .first()
        .map_or(0.0, |(label, details)| chain_height(flow, label.as_ref(), Some(details)));
    heading(flow, section, keep);
    for (i, (label, details)) in entries.iter().enumerate() {
        if let Some(label) = label {
            let keep = details.lead(flow);
            place(flow, label, BlockKind::EntryLabel, section, keep);
        }
        place(flow, details, BlockKind::Paragraph, section, 0.0);
        let gap = gap_after(flow, i, entries.len(), flow.geometry.entry_gap);
        flow.advance(gap);
    }
}

fn certificates(flow: &mut Flow, profile: &ProfileDocument) {
    let section = SectionKind::Certificates;
    let entries: Vec<_> = profile
        .certificates
        .iter()
        .filter(|c| !c.is_blank())
        .map(|cert| (label_lines(flow, &cert.name, &cert.date), body_lines(flow, &cert.issuer)))
        .collect();
    let keep = entries
        .first()
        .map_or(0.0, |(label, issuer)| chain_height(flow, label.as_ref(), Some(issuer)));
    heading(flow, section, keep);
    for (i, (label, issuer)) in entries.iter().enumerate() {
        match label {
            Some(label) => place_together(flow, label, issuer, BlockKind::Certificate, section),
            None => place(flow, issuer, BlockKind::Certificate, section, 0.0),
        }
        let gap = gap_after(flow, i, entries.len(), flow.geometry.entry_gap);
        flow.advance(gap);
    }
}

fn enabled(profile: &ProfileDocument, visibility: &SectionVisibility, kind: SectionKind) -> bool {
    if !visibility.is_visible(kind) {
        log::debug!("{kind:?}: hidden");
        return false;
    }
    if profile.section_is_empty(kind) {
        log::debug!("{kind:?}: nothing to show");
        return false;
    }
    true
}

/// Lay the whole CV out: header, divider, then each visible, non-empty section.
pub(crate) fn assemble(
    profile: &ProfileDocument,
    options: &RenderOptions,
    fonts: &FontSet,
    portrait: Option<Portrait>,
) -> LaidOutDocument {
    let visibility = profile.section_visibility.merged_with(&options.visibility);
    let mut flow = Flow::new(&options.geometry, &options.typography, fonts);

    header(&mut flow, profile, portrait.as_ref(), options.portrait.box_size);
    divider(&mut flow);

    if enabled(profile, &visibility, SectionKind::Summary) {
        summary(&mut flow, profile);
    }
    if enabled(profile, &visibility, SectionKind::Experience) {
        experience(&mut flow, profile);
    }
    if enabled(profile, &visibility, SectionKind::Skills) {
        skills(&mut flow, profile);
    }
    if enabled(profile, &visibility, SectionKind::Projects) {
        projects(&mut flow, profile, options);
    }
    if enabled(profile, &visibility, SectionKind::Education) {
        education(&mut flow, profile);
    }
    if enabled(profile, &visibility, SectionKind::Certificates) {
        certificates(&mut flow, profile);
    }

    let name = profile.identity.full_name.trim();
    let title = if name.is_empty() { "CV".to_string() } else { format!("{name} CV") };
    flow.finish(portrait, title, name.to_string())
}
