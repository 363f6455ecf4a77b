use crate::fonts::FontMetrics;

/// Greedy line breaking at whitespace.
///
/// Every returned line measures at most `max_width`, except a line holding a single
/// word that is wider than `max_width` on its own. Runs of whitespace collapse to one
/// space. Empty or whitespace-only text yields no lines.
pub fn wrap_text(text: &str, font: &FontMetrics, font_size: f32, max_width: f32) -> Vec<String> {
    let space_w = font.space_width(font_size);
    let mut lines: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut current_w: f32 = 0.0;

    for word in text.split_whitespace() {
        let ww = font.text_width(word, font_size);
        if current.is_empty() {
            current.push_str(word);
            current_w = ww;
            continue;
        }
        let proposed_w = current_w + space_w + ww;
        if proposed_w > max_width {
            lines.push(std::mem::take(&mut current));
            current.push_str(word);
            current_w = ww;
        } else {
            current.push(' ');
            current.push_str(word);
            current_w = proposed_w;
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }
    lines
}
